//! Authentication scenarios.

use crate::console::{Signal, View};
use crate::harness::{Scenario, ScenarioContext, ScenarioFuture};
use crate::page_object::{is_dashboard_landing, text};
use crate::verify::{check, check_eq};

/// Suite name
pub const SUITE: &str = "login";

/// Scenarios of this suite
#[must_use]
pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(SUITE, "valid_credentials_reach_dashboard", valid_credentials),
        Scenario::new(SUITE, "wrong_password_shows_error", wrong_password),
        Scenario::new(SUITE, "missing_password_keeps_focus", missing_password),
        Scenario::new(SUITE, "dashboard_requires_login", dashboard_requires_login),
        Scenario::new(SUITE, "logout_returns_to_login", logout),
    ]
}

fn valid_credentials(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        ctx.login().await?;
        let path = ctx.console.current_path().await?;
        check(
            is_dashboard_landing(&path),
            format!("expected dashboard after login, at {path}"),
        )
    })
}

fn wrong_password(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let email = ctx.env.login_email.clone();
        let signal = ctx.console.login(&email, "wrongpassword").await?;
        signal.expect_error(text::LOGIN_FAILED)?;
        check(
            ctx.console.has_text(text::LOGIN_FAILED).await?,
            "login error is not shown",
        )?;
        check_eq("path", "/", &ctx.console.current_path().await?)
    })
}

fn missing_password(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let email = ctx.env.login_email.clone();
        let signal = ctx.console.login(&email, "").await?;
        check(
            signal == Signal::Invalid("password".to_string()),
            format!("expected the password input to keep focus, got {signal:?}"),
        )?;
        check_eq("path", "/", &ctx.console.current_path().await?)
    })
}

fn dashboard_requires_login(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        ctx.console.visit(View::Domains.path()).await?;
        check_eq("path", "/", &ctx.console.current_path().await?)?;
        check(
            ctx.console.has_text(text::LOGIN_REQUIRED).await?,
            "login prompt is not shown",
        )
    })
}

fn logout(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        ctx.login().await?;
        ctx.console.logout().await?.expect_success("logout")?;
        check_eq("path", "/", &ctx.console.current_path().await?)?;
        check(
            ctx.console.has_text(text::LOGGED_OUT).await?,
            "logout message is not shown",
        )
    })
}
