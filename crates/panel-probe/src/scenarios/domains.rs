//! Domain scenarios: creation, validation, duplicates and guarded deletion.

use super::domains_view;
use crate::console::{DomainForm, ParamForm, ParamType, View};
use crate::harness::{Scenario, ScenarioContext, ScenarioFuture};
use crate::page_object::text;
use crate::verify::{check, expect_domain_row};
use crate::ProbeResult;

/// Suite name
pub const SUITE: &str = "domains";

/// Scenarios of this suite
#[must_use]
pub fn scenarios() -> Vec<Scenario> {
    [
        Scenario::new(SUITE, "create_with_valid_values", create_valid),
        Scenario::new(SUITE, "every_field_is_required", required_fields),
        Scenario::new(SUITE, "invalid_otp_email_is_rejected", invalid_otp_email),
        Scenario::new(SUITE, "invalid_otp_url_is_rejected", invalid_otp_url),
        Scenario::new(SUITE, "invalid_homepage_is_rejected", invalid_homepage),
        Scenario::new(SUITE, "duplicate_domain_is_rejected", duplicate),
        Scenario::new(SUITE, "delete_unreferenced_domain", delete_unreferenced),
        Scenario::new(SUITE, "delete_domain_with_user_fails", delete_with_user),
        Scenario::new(SUITE, "delete_domain_with_param_fails", delete_with_param),
    ]
    .into_iter()
    .map(|s| s.with_setup(domains_view))
    .collect()
}

async fn verify_row(ctx: &mut ScenarioContext, form: &DomainForm) -> ProbeResult<()> {
    ctx.console.open(View::Domains).await?;
    let row = ctx
        .console
        .find_row(View::Domains, &form.domain)
        .await?
        .ok_or_else(|| crate::ProbeError::assertion(format!("no row for {}", form.domain)))?;
    expect_domain_row(&row, form, &ctx.env.client_id)
}

async fn expect_no_row(ctx: &mut ScenarioContext, domain: &str) -> ProbeResult<()> {
    let rows = ctx.console.rows_containing(View::Domains, domain).await?;
    check(
        rows.is_empty(),
        format!("domain {domain} should not have been created"),
    )
}

fn create_valid(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let form = ctx.data.domain_data();
        ctx.create_domain(&form).await?;
        verify_row(ctx, &form).await
    })
}

fn required_fields(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        type Clear = fn(&mut DomainForm);
        let cases: [(&str, Clear, bool); 5] = [
            ("domain", |f| f.domain.clear(), false),
            ("otp_email", |f| f.otp_email.clear(), true),
            ("otp_url", |f| f.otp_url.clear(), true),
            ("team_name", |f| f.team_name.clear(), true),
            ("homepage", |f| f.homepage.clear(), false),
        ];
        for (field, clear, alert) in cases {
            let mut form = ctx.data.domain_data();
            let name = form.domain.clone();
            clear(&mut form);
            let signal = ctx.submit_domain(&form).await?;
            if alert {
                signal.expect_alert(text::REQUIRED_ALERT)?;
            } else {
                signal.expect_error(text::DOMAIN_CREATE_FAILED)?;
            }
            tracing::debug!(field, ?signal, "required field checked");
            expect_no_row(ctx, &name).await?;
        }
        Ok(())
    })
}

async fn rejected_with(ctx: &mut ScenarioContext, tamper: fn(&mut DomainForm)) -> ProbeResult<()> {
    let mut form = ctx.data.domain_data();
    tamper(&mut form);
    ctx.submit_domain(&form).await?;
    expect_no_row(ctx, &form.domain).await
}

fn invalid_otp_email(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(rejected_with(ctx, |f| {
        f.otp_email = crate::data::INVALID_EMAIL.to_string();
    }))
}

fn invalid_otp_url(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(rejected_with(ctx, |f| {
        f.otp_url = crate::data::INVALID_URL.to_string();
    }))
}

fn invalid_homepage(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(rejected_with(ctx, |f| {
        f.homepage = crate::data::INVALID_URL.to_string();
    }))
}

fn duplicate(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let form = ctx.data.domain_data();
        ctx.create_domain(&form).await?;
        verify_row(ctx, &form).await?;

        let upper = DomainForm {
            domain: form.domain.to_uppercase(),
            ..form.clone()
        };
        let signal = ctx.submit_domain(&upper).await?;
        signal.expect_error(text::DOMAIN_CREATE_FAILED)?;

        ctx.console.open(View::Domains).await?;
        let rows = ctx.console.rows_containing(View::Domains, &form.domain).await?;
        check(
            rows.len() == 1,
            format!("expected one row for {}, found {}", form.domain, rows.len()),
        )
    })
}

fn delete_unreferenced(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let form = ctx.data.domain_data();
        ctx.create_domain(&form).await?;
        verify_row(ctx, &form).await?;

        ctx.delete(View::Domains, &form.domain)
            .await?
            .expect_success("delete domain")?;
        let row = ctx.console.find_row(View::Domains, &form.domain).await?;
        check(row.is_none(), "deleted domain is still listed")
    })
}

async fn expect_guarded(ctx: &mut ScenarioContext, domain: &str) -> ProbeResult<()> {
    ctx.console.open(View::Domains).await?;
    let signal = ctx.delete(View::Domains, domain).await?;
    signal.expect_error(text::DELETE_FAILED)?;
    let row = ctx.console.find_row(View::Domains, domain).await?;
    check(row.is_some(), format!("referenced domain {domain} disappeared"))
}

fn delete_with_user(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let form = ctx.data.domain_data();
        let domain_id = ctx.create_domain(&form).await?;

        ctx.console.open(View::Users).await?;
        let user = ctx.data.user_data(&domain_id);
        ctx.create_user(&user).await?;
        check(
            ctx.console.find_row(View::Users, &user.nickname).await?.is_some(),
            "user row is missing",
        )?;

        expect_guarded(ctx, &form.domain).await
    })
}

fn delete_with_param(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let form = ctx.data.domain_data();
        let domain_id = ctx.create_domain(&form).await?;

        ctx.console.open(View::ProfileParams).await?;
        let name = ctx.data.unique_name("attached-field");
        ctx.create_param(&ParamForm::new(name, ParamType::Text, domain_id))
            .await?;

        expect_guarded(ctx, &form.domain).await
    })
}
