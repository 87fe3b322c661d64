//! User scenarios: creation, profile parameter fields, editing and deletion.

use super::users_view_with_domain;
use crate::console::{ParamForm, ParamType, UserEdit, UserForm, View};
use crate::harness::{Scenario, ScenarioContext, ScenarioFuture};
use crate::page_object::text;
use crate::verify::{check, check_eq, expect_user_row};
use crate::{ProbeError, ProbeResult};

/// Suite name
pub const SUITE: &str = "users";

/// Scenarios of this suite
#[must_use]
pub fn scenarios() -> Vec<Scenario> {
    [
        Scenario::new(SUITE, "create_with_required_fields", create_valid),
        Scenario::new(SUITE, "domain_selection_shows_fields", dynamic_fields),
        Scenario::new(SUITE, "empty_form_is_rejected", empty_form),
        Scenario::new(SUITE, "duplicate_email_is_rejected", duplicate_email),
        Scenario::new(SUITE, "delete_user", delete_user),
        Scenario::new(SUITE, "invalid_email_is_rejected", invalid_email),
        Scenario::new(SUITE, "edit_prefills_and_saves", edit_and_save),
        Scenario::new(SUITE, "new_required_param_blocks_save", required_blocks_save),
        Scenario::new(SUITE, "new_required_param_saved_when_filled", required_saved),
        Scenario::new(SUITE, "number_field_rejects_text", number_rejects_text),
        Scenario::new(SUITE, "missing_required_param_is_rejected", missing_required),
        Scenario::new(SUITE, "deleted_param_leaves_profile", deleted_param_leaves),
    ]
    .into_iter()
    .map(|s| s.with_setup(users_view_with_domain))
    .collect()
}

/// Create a parameter for the fixture domain and come back to the users view
async fn add_param(
    ctx: &mut ScenarioContext,
    prefix: &str,
    kind: ParamType,
    required: bool,
) -> ProbeResult<String> {
    let name = ctx.data.unique_name(prefix);
    let mut form = ParamForm::new(&name, kind, ctx.domain_id()?);
    form.required = required;
    ctx.console.open(View::ProfileParams).await?;
    ctx.create_param(&form).await?;
    ctx.console.open(View::Users).await?;
    Ok(name)
}

async fn new_user(ctx: &mut ScenarioContext) -> ProbeResult<UserForm> {
    let domain_id = ctx.domain_id()?;
    let user = ctx.data.user_data(&domain_id);
    ctx.create_user(&user).await?;
    Ok(user)
}

fn create_valid(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let user = new_user(ctx).await?;
        check(
            ctx.console.has_text(text::USER_CREATED).await?,
            "creation message is not shown",
        )?;
        let row = ctx
            .console
            .find_row(View::Users, &user.nickname)
            .await?
            .ok_or_else(|| ProbeError::assertion(format!("no row for user {}", user.nickname)))?;
        expect_user_row(&row, &user)
    })
}

fn dynamic_fields(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let first = add_param(ctx, "param1", ParamType::Text, false).await?;
        let second = add_param(ctx, "param2", ParamType::Text, false).await?;
        let domain_id = ctx.domain_id()?;
        let fields = ctx.console.dynamic_fields_for(&domain_id).await?;
        for name in [&first, &second] {
            check(
                fields.iter().any(|f| &f.name == name),
                format!("field {name} is not shown for the domain"),
            )?;
        }
        Ok(())
    })
}

fn empty_form(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let signal = ctx.submit_user(&UserForm::default()).await?;
        signal.expect_error(text::USER_CREATE_FAILED)
    })
}

fn duplicate_email(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let user = new_user(ctx).await?;
        let signal = ctx.submit_user(&user).await?;
        signal.expect_error(text::USER_CREATE_FAILED)
    })
}

fn delete_user(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let user = new_user(ctx).await?;
        ctx.delete(View::Users, &user.nickname)
            .await?
            .expect_success("delete user")?;
        let row = ctx.console.find_row(View::Users, &user.nickname).await?;
        check(row.is_none(), format!("user {} is still listed", user.nickname))
    })
}

fn invalid_email(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let domain_id = ctx.domain_id()?;
        let mut user = ctx.data.user_data(&domain_id);
        user.email = crate::data::INVALID_EMAIL.to_string();
        ctx.submit_user(&user).await?;
        let row = ctx.console.find_row(View::Users, &user.nickname).await?;
        check(row.is_none(), "user with an invalid email was created")
    })
}

fn edit_and_save(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let user = new_user(ctx).await?;
        let editor = ctx.console.open_user_editor(&user.nickname).await?;
        check_eq("nickname", &user.nickname, &editor.nickname)?;
        check_eq("email", &user.email, &editor.email)?;
        check_eq("full_name", &user.full_name, &editor.full_name)?;

        let renamed = format!("{}_upd", user.nickname);
        let edit = UserEdit {
            nickname: Some(renamed.clone()),
            full_name: Some("Updated Name".to_string()),
            ..UserEdit::default()
        };
        ctx.console
            .save_user_edit(&edit)
            .await?
            .expect_success("save user")?;
        ctx.ledger.untrack_user(&user.nickname)?;
        ctx.ledger.track_user(&renamed)?;

        let row = ctx.console.find_row(View::Users, &renamed).await?;
        check(row.is_some(), format!("renamed user {renamed} is not listed"))
    })
}

fn required_blocks_save(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let user = new_user(ctx).await?;
        let name = add_param(ctx, "new-required", ParamType::Text, true).await?;

        let editor = ctx.console.open_user_editor(&user.nickname).await?;
        check(editor.has_field(&name), format!("editor lacks field {name}"))?;
        let signal = ctx.console.save_user_edit(&UserEdit::default()).await?;
        signal.expect_error(&text::field_required(&name))
    })
}

fn required_saved(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let user = new_user(ctx).await?;
        let name = add_param(ctx, "new-required", ParamType::Text, true).await?;

        let editor = ctx.console.open_user_editor(&user.nickname).await?;
        check(editor.has_field(&name), format!("editor lacks field {name}"))?;
        let mut edit = UserEdit::default();
        edit.dynamic_fields.insert(name, "some value".to_string());
        let signal = ctx.console.save_user_edit(&edit).await?;
        check(
            signal.message() == Some(text::USER_UPDATED),
            format!("expected {:?}, got {signal:?}", text::USER_UPDATED),
        )
    })
}

fn number_rejects_text(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let name = add_param(ctx, "numeric", ParamType::Number, false).await?;
        let domain_id = ctx.domain_id()?;
        match ctx
            .console
            .try_fill_dynamic_field(&domain_id, &name, "abcdef")
            .await
        {
            Err(ProbeError::InputRejected { .. }) => Ok(()),
            Ok(()) => Err(ProbeError::assertion(format!(
                "number field {name} accepted text"
            ))),
            Err(other) => Err(other),
        }
    })
}

fn missing_required(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let name = add_param(ctx, "required-field", ParamType::Text, true).await?;
        let domain_id = ctx.domain_id()?;
        let user = ctx.data.user_data(&domain_id);
        let signal = ctx.submit_user(&user).await?;
        signal.expect_error(&text::field_required(&name))
    })
}

fn deleted_param_leaves(ctx: &mut ScenarioContext) -> ScenarioFuture<'_> {
    Box::pin(async move {
        let name = add_param(ctx, "used-param", ParamType::Text, false).await?;
        let domain_id = ctx.domain_id()?;
        let mut user = ctx.data.user_data(&domain_id);
        user.dynamic_fields
            .insert(name.clone(), "test-value".to_string());
        ctx.create_user(&user).await?;

        ctx.console.open(View::ProfileParams).await?;
        ctx.delete(View::ProfileParams, &name)
            .await?
            .expect_success("delete parameter")?;

        ctx.console.open(View::Users).await?;
        let editor = ctx.console.open_user_editor(&user.nickname).await?;
        check(
            !editor.has_field(&name),
            format!("field {name} is still in the profile"),
        )
    })
}
