//! Row assertions for the three tables.

use crate::console::{DomainForm, ParamForm, TableRow, UserForm};
use crate::result::{ProbeError, ProbeResult};

/// Fail with `message` unless `condition` holds
pub fn check(condition: bool, message: impl Into<String>) -> ProbeResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ProbeError::assertion(message))
    }
}

/// Fail unless `actual == expected`
pub fn check_eq(column: &str, expected: &str, actual: &str) -> ProbeResult<()> {
    check(
        expected == actual,
        format!("column {column}: expected {expected:?}, got {actual:?}"),
    )
}

fn check_numeric(column: &str, actual: &str) -> ProbeResult<()> {
    check(
        actual.trim().parse::<f64>().is_ok(),
        format!("column {column}: expected a number, got {actual:?}"),
    )
}

/// Domains row: `id, client_id, domain, team_name, otp_email, otp_url, homepage`
pub fn expect_domain_row(row: &TableRow, form: &DomainForm, client_id: &str) -> ProbeResult<()> {
    check_numeric("id", row.cell(0))?;
    check_eq("client_id", client_id, row.cell(1))?;
    check_eq("domain", &form.domain, row.cell(2))?;
    check_eq("team_name", &form.team_name, row.cell(3))?;
    check_eq("otp_email", &form.otp_email, row.cell(4))?;
    check_eq("otp_url", &form.otp_url, row.cell(5))?;
    check_eq("homepage", &form.homepage, row.cell(6))
}

/// Profile parameters row: `name, required, type, domain_id, client_id`
pub fn expect_param_row(row: &TableRow, form: &ParamForm, client_id: &str) -> ProbeResult<()> {
    check_eq("name", &form.name, row.cell(0))?;
    check_eq("required", if form.required { "Да" } else { "Нет" }, row.cell(1))?;
    if let Some(kind) = form.kind {
        check_eq("type", kind.label(), row.cell(2))?;
    }
    if let Some(domain_id) = &form.domain_id {
        check_eq("domain_id", domain_id, row.cell(3))?;
    }
    check_eq("client_id", client_id, row.cell(4))
}

/// Users row: `id, nickname, email, domain_id, full_name`
pub fn expect_user_row(row: &TableRow, form: &UserForm) -> ProbeResult<()> {
    check_numeric("id", row.cell(0))?;
    check_eq("nickname", &form.nickname, row.cell(1))?;
    check_eq("email", &form.email, row.cell(2))?;
    check_eq("domain_id", &form.domain_id, row.cell(3))?;
    check_eq("full_name", &form.full_name, row.cell(4))
}
