//! Page objects for the admin panel.
//!
//! Each page owns the locators for its view; [`text`] holds the accessible
//! names and notification texts the panel renders. The simulated backend
//! reuses the same texts so both backends report identical signals.

use crate::console::{ParamType, View};
use crate::locator::{Locator, Selector};
use regex::Regex;
use std::time::Duration;

/// Accessible names and messages rendered by the panel
pub mod text {
    /// Navigation link to domains
    pub const NAV_DOMAINS: &str = "Домены";
    /// Navigation link to profile parameters
    pub const NAV_PARAMS: &str = "Параметры профилей";
    /// Navigation link to users
    pub const NAV_USERS: &str = "Пользователи";
    /// Logout link
    pub const NAV_LOGOUT: &str = "Выход";

    /// Login email textbox
    pub const LOGIN_EMAIL: &str = "Введите ваш email";
    /// Login password textbox
    pub const LOGIN_PASSWORD: &str = "Введите ваш пароль";
    /// Login submit button
    pub const LOGIN_SUBMIT: &str = "Войти";
    /// Wrong credentials
    pub const LOGIN_FAILED: &str = "Попробуйте снова";
    /// Shown after an unauthenticated dashboard visit
    pub const LOGIN_REQUIRED: &str = "Пожалуйста, сначала войдите в систему";
    /// Shown after logout
    pub const LOGGED_OUT: &str = "Вы успешно вышли";

    pub const DOMAIN_NAME: &str = "Домен";
    pub const DOMAIN_OTP_EMAIL: &str = "OTP Email";
    pub const DOMAIN_OTP_URL: &str = "OTP URL";
    pub const DOMAIN_TEAM_NAME: &str = "Название команды";
    pub const DOMAIN_HOMEPAGE: &str = "Homepage URL";
    pub const DOMAIN_SUBMIT: &str = "Добавить домен";
    pub const DOMAIN_CREATED: &str = "Домен успешно добавлен";
    pub const DOMAIN_CREATE_FAILED: &str = "Ошибка при добавлении домена";
    /// Client-side alert for empty OTP or team fields
    pub const REQUIRED_ALERT: &str = "Заполните все обязательные поля";

    /// Row delete button on the domains and parameters tables
    pub const DELETE_ROW: &str = "Удаление";
    pub const DELETED: &str = "Успешно удалено";
    pub const DELETE_FAILED: &str = "Произошла ошибка при удалении";

    pub const PARAM_NAME: &str = "Введите название поля";
    /// react-select control opening the type options
    pub const PARAM_TYPE_CONTROL: &str = ".css-13cymwt-control";
    pub const PARAM_REQUIRED: &str = "Обязательное";
    pub const PARAM_DOMAIN_SELECT: &str = "select[name=\"domain_id\"]";
    pub const PARAM_SUBMIT: &str = "Добавить";
    pub const PARAM_CREATED: &str = "Вы успешно добавили параметр";
    pub const PARAM_CREATE_FAILED: &str = "Ошибка при добавлении параметра";
    pub const PARAM_NAME_MISSING: &str = "Введите название поля!";
    pub const PARAM_TYPE_MISSING: &str = "Выберите тип поля!";
    pub const PARAM_DOMAIN_MISSING: &str = "Выберите домен!";

    pub const USER_NICKNAME: &str = "Никнейм";
    pub const USER_EMAIL: &str = "Email";
    pub const USER_FULL_NAME: &str = "Полное имя";
    pub const USER_PASSWORD: &str = "Пароль";
    pub const USER_SUBMIT: &str = "Добавить пользователя";
    pub const USER_EDIT: &str = "Редактировать";
    pub const USER_DELETE: &str = "Удалить";
    pub const USER_SAVE: &str = "Изменение пользователя";
    pub const USER_CREATED: &str = "Пользователь успешно добавлен";
    pub const USER_CREATE_FAILED: &str = "Ошибка при добавлении пользователя";
    pub const USER_UPDATED: &str = "Успешно отредактировано";
    /// Tail of the per-field required message
    pub const FIELD_REQUIRED_TAIL: &str = "обязательно для заполнения";

    /// Message for an empty required profile parameter
    #[must_use]
    pub fn field_required(name: &str) -> String {
        format!("Поле \"{name}\" {FIELD_REQUIRED_TAIL}")
    }

    /// Placeholders of the fixed user form inputs
    pub const USER_BASE_FIELDS: [&str; 4] = [USER_NICKNAME, USER_EMAIL, USER_FULL_NAME, USER_PASSWORD];
}

/// Pattern matching the landing path after a successful login
pub const DASHBOARD_LANDING: &str = r"/dashboard(/domains)?$";

/// Whether `path` is where a successful login lands
#[must_use]
pub fn is_dashboard_landing(path: &str) -> bool {
    Regex::new(DASHBOARD_LANDING).is_ok_and(|re| re.is_match(path))
}

/// A page of the panel
pub trait PageObject {
    /// URL pattern that matches this page
    fn url_pattern(&self) -> &str;

    /// Optional wait time for page load (in milliseconds)
    fn load_timeout_ms(&self) -> u64 {
        30000
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether `path` belongs to this page
    fn matches_path(&self, path: &str) -> bool {
        path.trim_end_matches('/') == self.url_pattern().trim_end_matches('/')
    }
}

/// Settle times for the panel's asynchronous rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settle {
    /// Before clicking a navigation link
    pub before_navigation: Duration,
    /// After a view or form finished loading data
    pub after_load: Duration,
    /// After a submission, before reading signals
    pub after_submit: Duration,
}

impl Default for Settle {
    fn default() -> Self {
        Self {
            before_navigation: Duration::from_millis(1000),
            after_load: Duration::from_millis(3000),
            after_submit: Duration::from_millis(500),
        }
    }
}

impl Settle {
    /// No waiting, for mocked drivers
    #[must_use]
    pub const fn none() -> Self {
        Self {
            before_navigation: Duration::ZERO,
            after_load: Duration::ZERO,
            after_submit: Duration::ZERO,
        }
    }
}

/// Login form at `/`
#[derive(Debug, Clone, Default)]
pub struct LoginPage;

impl LoginPage {
    pub fn email_input(&self) -> Locator {
        Locator::role("textbox", text::LOGIN_EMAIL)
    }

    pub fn password_input(&self) -> Locator {
        Locator::role("textbox", text::LOGIN_PASSWORD)
    }

    pub fn submit_button(&self) -> Locator {
        Locator::role("button", text::LOGIN_SUBMIT)
    }

    pub fn logout_link(&self) -> Locator {
        Locator::role("link", text::NAV_LOGOUT)
    }
}

impl PageObject for LoginPage {
    fn url_pattern(&self) -> &str {
        "/"
    }

    fn page_name(&self) -> &str {
        "login"
    }
}

/// Navigation link for a dashboard view
#[must_use]
pub fn nav_link(view: View) -> Locator {
    let name = match view {
        View::Domains => text::NAV_DOMAINS,
        View::ProfileParams => text::NAV_PARAMS,
        View::Users => text::NAV_USERS,
    };
    Locator::role_exact("link", name)
}

/// Body rows of the view's table
#[must_use]
pub fn table_rows() -> Locator {
    Locator::css("table tbody tr")
}

/// Script returning every body row as an array of cell texts
#[must_use]
pub fn table_cells_script() -> String {
    Selector::css("table tbody tr").script(
        "return els.map((tr) => Array.from(tr.cells).map((td) => __pp.norm(td.innerText)));",
    )
}

/// Delete button of the row at `index`
#[must_use]
pub fn row_delete_button(view: View, index: usize) -> Locator {
    let name = match view {
        View::Users => text::USER_DELETE,
        View::Domains | View::ProfileParams => text::DELETE_ROW,
    };
    table_rows()
        .nth(index)
        .locate(Selector::role("button", name))
}

/// Domains view
#[derive(Debug, Clone, Default)]
pub struct DomainsPage;

impl DomainsPage {
    pub fn domain_input(&self) -> Locator {
        Locator::role_exact("textbox", text::DOMAIN_NAME)
    }

    pub fn otp_email_input(&self) -> Locator {
        Locator::role("textbox", text::DOMAIN_OTP_EMAIL)
    }

    pub fn otp_url_input(&self) -> Locator {
        Locator::role("textbox", text::DOMAIN_OTP_URL)
    }

    pub fn team_name_input(&self) -> Locator {
        Locator::role("textbox", text::DOMAIN_TEAM_NAME)
    }

    pub fn homepage_input(&self) -> Locator {
        Locator::role("textbox", text::DOMAIN_HOMEPAGE)
    }

    pub fn submit_button(&self) -> Locator {
        Locator::role("button", text::DOMAIN_SUBMIT)
    }
}

impl PageObject for DomainsPage {
    fn url_pattern(&self) -> &str {
        View::Domains.path()
    }

    fn page_name(&self) -> &str {
        "domains"
    }
}

/// Profile parameters view
#[derive(Debug, Clone, Default)]
pub struct ProfileParamsPage;

impl ProfileParamsPage {
    pub fn name_input(&self) -> Locator {
        Locator::role("textbox", text::PARAM_NAME)
    }

    pub fn type_dropdown(&self) -> Locator {
        Locator::css(text::PARAM_TYPE_CONTROL).first()
    }

    pub fn type_option(&self, kind: ParamType) -> Locator {
        Locator::role_exact("option", kind.label())
    }

    pub fn required_checkbox(&self) -> Locator {
        Locator::css("label")
            .has_text(text::PARAM_REQUIRED)
            .locate(Selector::css("input[type=checkbox]"))
    }

    pub fn domain_select(&self) -> Locator {
        Locator::css(text::PARAM_DOMAIN_SELECT)
    }

    pub fn submit_button(&self) -> Locator {
        Locator::role_exact("button", text::PARAM_SUBMIT)
    }
}

impl PageObject for ProfileParamsPage {
    fn url_pattern(&self) -> &str {
        View::ProfileParams.path()
    }

    fn page_name(&self) -> &str {
        "profile-params"
    }
}

/// Users view; the creation form doubles as the editor
#[derive(Debug, Clone, Default)]
pub struct UsersPage;

impl UsersPage {
    pub fn nickname_input(&self) -> Locator {
        Locator::role("textbox", text::USER_NICKNAME)
    }

    pub fn email_input(&self) -> Locator {
        Locator::role_exact("textbox", text::USER_EMAIL)
    }

    pub fn domain_select(&self) -> Locator {
        Locator::new(Selector::any_role("combobox")).first()
    }

    pub fn full_name_input(&self) -> Locator {
        Locator::role("textbox", text::USER_FULL_NAME)
    }

    pub fn password_input(&self) -> Locator {
        Locator::role("textbox", text::USER_PASSWORD)
    }

    pub fn submit_button(&self) -> Locator {
        Locator::role("button", text::USER_SUBMIT)
    }

    pub fn save_button(&self) -> Locator {
        Locator::role("button", text::USER_SAVE)
    }

    pub fn edit_button(&self, index: usize) -> Locator {
        table_rows()
            .nth(index)
            .locate(Selector::role("button", text::USER_EDIT))
    }

    /// Input rendered for a profile parameter
    pub fn dynamic_field(&self, name: &str) -> Locator {
        Locator::css(format!("input[placeholder={}]", crate::locator::js_string(name)))
    }

    /// Script listing the profile parameter inputs currently rendered
    pub fn dynamic_fields_script(&self) -> String {
        let base = serde_json::to_string(&text::USER_BASE_FIELDS).unwrap_or_else(|_| "[]".into());
        Selector::css("form input[placeholder]").script(&format!(
            "const base = {base}; \
             return els.filter(__pp.visible).filter((e) => !base.includes(e.placeholder)) \
               .map((e) => ({{ name: e.placeholder, type: e.type, required: e.required }}));"
        ))
    }
}

impl PageObject for UsersPage {
    fn url_pattern(&self) -> &str {
        View::Users.path()
    }

    fn page_name(&self) -> &str {
        "users"
    }
}

/// Map an input's `type` attribute to a parameter type
#[must_use]
pub fn param_type_of_input(input_type: &str) -> ParamType {
    match input_type {
        "number" => ParamType::Number,
        "checkbox" => ParamType::Bool,
        "date" | "datetime-local" => ParamType::Date,
        _ => ParamType::Text,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod landing_tests {
        use super::*;

        #[test]
        fn test_dashboard_landing() {
            assert!(is_dashboard_landing("/dashboard"));
            assert!(is_dashboard_landing("/dashboard/domains"));
            assert!(!is_dashboard_landing("/dashboard/users"));
            assert!(!is_dashboard_landing("/"));
        }
    }

    mod page_tests {
        use super::*;

        #[test]
        fn test_page_names_and_paths() {
            assert_eq!(LoginPage.page_name(), "login");
            assert!(DomainsPage.matches_path("/dashboard/domains/"));
            assert!(!UsersPage.matches_path("/dashboard/domains"));
            assert_eq!(ProfileParamsPage.load_timeout_ms(), 30000);
        }

        #[test]
        fn test_row_delete_buttons_per_view() {
            assert!(row_delete_button(View::Users, 0)
                .to_string()
                .contains("Удалить"));
            assert!(row_delete_button(View::Domains, 2)
                .to_string()
                .contains("nth=2 >> role=button[name=\"Удаление\"i]"));
        }

        #[test]
        fn test_dynamic_field_locator_quotes_name() {
            let locator = UsersPage.dynamic_field("numeric-1");
            assert_eq!(locator.to_string(), "css=input[placeholder=\"numeric-1\"]");
        }

        #[test]
        fn test_dynamic_fields_script_excludes_base_fields() {
            let script = UsersPage.dynamic_fields_script();
            assert!(script.contains("\"Никнейм\""));
            assert!(script.contains("required: e.required"));
        }

        #[test]
        fn test_field_required_message() {
            assert_eq!(
                text::field_required("age"),
                "Поле \"age\" обязательно для заполнения"
            );
        }

        #[test]
        fn test_input_type_mapping() {
            assert_eq!(param_type_of_input("number"), ParamType::Number);
            assert_eq!(param_type_of_input("text"), ParamType::Text);
            assert_eq!(param_type_of_input("checkbox"), ParamType::Bool);
        }
    }
}
