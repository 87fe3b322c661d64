//! The end-to-end suites.
//!
//! Every scenario records what it creates in the ledger only after the panel
//! confirms the creation, and removes the record only after a confirmed
//! deletion, so the cleanup phase sees exactly what is left on the panel.

pub mod domains;
pub mod login;
pub mod params;
pub mod users;

use crate::console::View;
use crate::harness::{Scenario, ScenarioContext, ScenarioFuture};

/// Every suite, in execution order
#[must_use]
pub fn all() -> Vec<Scenario> {
    let mut scenarios = login::scenarios();
    scenarios.extend(domains::scenarios());
    scenarios.extend(params::scenarios());
    scenarios.extend(users::scenarios());
    scenarios
}

/// Suite names
pub const SUITES: [&str; 4] = [login::SUITE, domains::SUITE, params::SUITE, users::SUITE];

/// Fixture: log in and open the domains view
pub fn domains_view(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        ctx.login().await?;
        ctx.console.open(View::Domains).await
    })
}

async fn with_domain(ctx: &mut ScenarioContext, view: View) -> crate::ProbeResult<()> {
    ctx.login().await?;
    ctx.console.open(View::Domains).await?;
    let form = ctx.data.domain_data();
    let id = ctx.create_domain(&form).await?;
    ctx.domain_id = Some(id);
    ctx.console.open(view).await
}

/// Fixture: log in, create a domain and open the parameters view
pub fn params_view_with_domain(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(with_domain(ctx, View::ProfileParams))
}

/// Fixture: log in, create a domain and open the users view
pub fn users_view_with_domain(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(with_domain(ctx, View::Users))
}
