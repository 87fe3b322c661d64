//! Profile parameter scenarios.

use super::params_view_with_domain;
use crate::console::{ParamForm, ParamType, View};
use crate::harness::{Scenario, ScenarioContext, ScenarioFuture};
use crate::page_object::text;
use crate::verify::{check, expect_param_row};
use crate::{ProbeError, ProbeResult};

/// Suite name
pub const SUITE: &str = "profile_params";

/// Scenarios of this suite
#[must_use]
pub fn scenarios() -> Vec<Scenario> {
    [
        Scenario::new(SUITE, "create_with_valid_values", create_valid),
        Scenario::new(SUITE, "name_is_required", name_required),
        Scenario::new(SUITE, "type_is_required", type_required),
        Scenario::new(SUITE, "domain_is_required", domain_required),
        Scenario::new(SUITE, "several_params_for_one_domain", several),
        Scenario::new(SUITE, "delete_unused_param", delete_unused),
        Scenario::new(SUITE, "delete_used_param_removes_user_field", delete_used),
    ]
    .into_iter()
    .map(|s| s.with_setup(params_view_with_domain))
    .collect()
}

async fn verify_row(ctx: &mut ScenarioContext, form: &ParamForm) -> ProbeResult<()> {
    ctx.console.open(View::ProfileParams).await?;
    let row = ctx
        .console
        .find_row(View::ProfileParams, &form.name)
        .await?
        .ok_or_else(|| ProbeError::assertion(format!("no row for parameter {}", form.name)))?;
    expect_param_row(&row, form, &ctx.env.client_id)
}

fn create_valid(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let domain_id = ctx.domain_id()?;
        let form =
            ParamForm::new(ctx.data.unique_name("custom-field"), ParamType::Date, domain_id)
                .required();
        ctx.create_param(&form).await?;
        check(
            ctx.console.has_text(text::PARAM_CREATED).await?,
            "creation message is not shown",
        )?;
        verify_row(ctx, &form).await
    })
}

fn name_required(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let form = ParamForm::new("", ParamType::Number, ctx.domain_id()?).required();
        let signal = ctx.submit_param(&form).await?;
        signal.expect_error(text::PARAM_NAME_MISSING)
    })
}

fn type_required(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let form = ParamForm {
            name: ctx.data.unique_name("field-no-type"),
            kind: None,
            required: true,
            domain_id: Some(ctx.domain_id()?),
        };
        let signal = ctx.submit_param(&form).await?;
        signal.expect_error(text::PARAM_TYPE_MISSING)
    })
}

fn domain_required(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let form = ParamForm {
            name: ctx.data.unique_name("field-no-domain"),
            kind: Some(ParamType::Date),
            required: false,
            domain_id: None,
        };
        let signal = ctx.submit_param(&form).await?;
        signal.expect_error(text::PARAM_DOMAIN_MISSING)
    })
}

fn several(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let domain_id = ctx.domain_id()?;
        for prefix in ["param-a", "param-b"] {
            let form = ParamForm::new(ctx.data.unique_name(prefix), ParamType::Text, &domain_id);
            ctx.create_param(&form).await?;
            verify_row(ctx, &form).await?;
        }
        Ok(())
    })
}

fn delete_unused(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let name = ctx.data.unique_name("to-delete");
        let form = ParamForm::new(&name, ParamType::Bool, ctx.domain_id()?);
        ctx.create_param(&form).await?;
        ctx.delete(View::ProfileParams, &name)
            .await?
            .expect_success("delete parameter")?;
        let row = ctx.console.find_row(View::ProfileParams, &name).await?;
        check(row.is_none(), format!("parameter {name} is still listed"))
    })
}

fn delete_used(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let domain_id = ctx.domain_id()?;
        let name = ctx.data.unique_name("used-param");
        ctx.create_param(&ParamForm::new(&name, ParamType::Text, &domain_id))
            .await?;

        ctx.console.open(View::Users).await?;
        let mut user = ctx.data.user_data(&domain_id);
        user.dynamic_fields
            .insert(name.clone(), "some value".to_string());
        ctx.create_user(&user).await?;

        ctx.console.open(View::ProfileParams).await?;
        ctx.delete(View::ProfileParams, &name)
            .await?
            .expect_success("delete parameter")?;

        ctx.console.open(View::Users).await?;
        let editor = ctx.console.open_user_editor(&user.nickname).await?;
        check(
            !editor.has_field(&name),
            format!("field {name} should disappear after the parameter is deleted"),
        )
    })
}
