//! Element locators for the admin panel.
//!
//! Selectors compile to a JavaScript expression yielding the array of matching
//! elements, so the same locator works for counting, reading and acting.
//! Role selectors follow ARIA semantics: an element's accessible name comes
//! from `aria-label`, an associated `<label>`, its placeholder or its text.
//! Names match as a case-insensitive substring unless `exact` is set.

use std::fmt;
use std::time::Duration;

/// Default timeout for auto-waiting (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval for auto-waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Helper functions available to every generated query as `__pp`
pub const QUERY_HELPERS: &str = r#"const __pp = (() => {
  const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
  const roles = {
    textbox: 'input:not([type]),input[type=text],input[type=email],input[type=password],input[type=url],input[type=tel],input[type=search],textarea,[role=textbox]',
    spinbutton: 'input[type=number],[role=spinbutton]',
    button: 'button,input[type=submit],input[type=button],[role=button]',
    link: 'a[href],[role=link]',
    row: 'tr,[role=row]',
    cell: 'td,[role=cell],[role=gridcell]',
    combobox: 'select,[role=combobox]',
    option: 'option,[role=option]',
    checkbox: 'input[type=checkbox],[role=checkbox]',
    alert: '[role=alert]',
  };
  const name = (el) => {
    const aria = el.getAttribute('aria-label');
    if (aria) return aria;
    if (el.id) {
      const label = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
      if (label) return label.textContent;
    }
    const wrap = el.closest('label');
    if (wrap && wrap !== el) return wrap.textContent;
    if (el.placeholder) return el.placeholder;
    if (el.tagName === 'INPUT' && (el.type === 'submit' || el.type === 'button')) return el.value;
    return el.textContent;
  };
  const matches = (actual, expected, exact) => exact
    ? norm(actual) === norm(expected)
    : norm(actual).toLowerCase().includes(norm(expected).toLowerCase());
  const byRole = (root, role, expected, exact) => {
    const css = roles[role] || ('[role=' + role + ']');
    const all = Array.from(root.querySelectorAll(css));
    return expected === null ? all : all.filter((el) => matches(name(el), expected, exact));
  };
  const byText = (root, expected) => Array.from(root.querySelectorAll('*')).filter((el) =>
    matches(el.textContent, expected, false)
      && !Array.from(el.children).some((child) => matches(child.textContent, expected, false)));
  const hasText = (el, expected) => matches(el.textContent, expected, false);
  const visible = (el) => !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
  return { norm, byRole, byText, hasText, visible };
})();"#;

/// Encode a string as a JavaScript string literal
#[must_use]
pub fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| String::from("\"\""))
}

/// Selector for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g., "table tbody tr")
    Css(String),
    /// Smallest elements whose text contains the given string
    Text(String),
    /// ARIA role with optional accessible name
    Role {
        /// Role name (textbox, button, link, row, ...)
        role: String,
        /// Accessible name to match
        name: Option<String>,
        /// Require an exact name match
        exact: bool,
    },
    /// Base selector filtered by contained text
    HasText {
        /// Base selector
        base: Box<Selector>,
        /// Text to match (case-insensitive substring)
        text: String,
    },
    /// Child selector evaluated inside every match of the parent
    Within {
        /// Scope selector
        parent: Box<Selector>,
        /// Selector evaluated within each scope element
        child: Box<Selector>,
    },
    /// The n-th match of the base selector
    Nth {
        /// Base selector
        base: Box<Selector>,
        /// Zero-based index
        index: usize,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a role selector matching the name as a substring
    #[must_use]
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: false,
        }
    }

    /// Create a role selector requiring an exact name
    #[must_use]
    pub fn role_exact(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: true,
        }
    }

    /// Create a role selector matching any name
    #[must_use]
    pub fn any_role(role: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: None,
            exact: false,
        }
    }

    /// JavaScript expression yielding the matched elements as an array
    #[must_use]
    pub fn to_js(&self) -> String {
        self.js_from("document", 0)
    }

    fn js_from(&self, root: &str, depth: usize) -> String {
        match self {
            Self::Css(css) => format!("Array.from({root}.querySelectorAll({}))", js_string(css)),
            Self::Text(text) => format!("__pp.byText({root}, {})", js_string(text)),
            Self::Role { role, name, exact } => {
                let name = name.as_deref().map_or_else(|| String::from("null"), js_string);
                format!("__pp.byRole({root}, {}, {name}, {exact})", js_string(role))
            }
            Self::HasText { base, text } => format!(
                "{}.filter((e) => __pp.hasText(e, {}))",
                base.js_from(root, depth),
                js_string(text)
            ),
            Self::Within { parent, child } => {
                let scope = format!("s{depth}");
                format!(
                    "{}.flatMap(({scope}) => {})",
                    parent.js_from(root, depth + 1),
                    child.js_from(&scope, depth + 1)
                )
            }
            Self::Nth { base, index } => {
                format!("{}.slice({index}, {})", base.js_from(root, depth), index + 1)
            }
        }
    }

    /// Self-contained script: `els` holds the matches when `body` runs
    #[must_use]
    pub fn script(&self, body: &str) -> String {
        format!(
            "(() => {{ {QUERY_HELPERS} const els = {}; {body} }})()",
            self.to_js()
        )
    }

    /// Script returning the number of visible matches
    #[must_use]
    pub fn count_script(&self) -> String {
        self.script("return els.filter(__pp.visible).length;")
    }

    /// Script returning the normalized text of every visible match
    #[must_use]
    pub fn texts_script(&self) -> String {
        self.script("return els.filter(__pp.visible).map((e) => __pp.norm(e.innerText));")
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "css={css}"),
            Self::Text(text) => write!(f, "text={text:?}"),
            Self::Role { role, name, exact } => match name {
                Some(name) if *exact => write!(f, "role={role}[name={name:?}s]"),
                Some(name) => write!(f, "role={role}[name={name:?}i]"),
                None => write!(f, "role={role}"),
            },
            Self::HasText { base, text } => write!(f, "{base}:has-text({text:?})"),
            Self::Within { parent, child } => write!(f, "{parent} >> {child}"),
            Self::Nth { base, index } => write!(f, "{base} >> nth={index}"),
        }
    }
}

/// Options for locator behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting
    pub timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// A locator for finding and interacting with elements.
///
/// Locators are lazy: nothing is queried until a driver acts on them, and
/// drivers auto-wait up to the locator's timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// CSS locator
    #[must_use]
    pub fn css(css: impl Into<String>) -> Self {
        Self::new(Selector::css(css))
    }

    /// Text locator
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Selector::text(text))
    }

    /// Role locator with a substring name match
    #[must_use]
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(Selector::role(role, name))
    }

    /// Role locator with an exact name match
    #[must_use]
    pub fn role_exact(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(Selector::role_exact(role, name))
    }

    /// Keep only matches containing `text`
    #[must_use]
    pub fn has_text(self, text: impl Into<String>) -> Self {
        Self {
            selector: Selector::HasText {
                base: Box::new(self.selector),
                text: text.into(),
            },
            options: self.options,
        }
    }

    /// Locate `child` inside every match of this locator
    #[must_use]
    pub fn locate(self, child: Selector) -> Self {
        Self {
            selector: Selector::Within {
                parent: Box::new(self.selector),
                child: Box::new(child),
            },
            options: self.options,
        }
    }

    /// The n-th match (zero-based)
    #[must_use]
    pub fn nth(self, index: usize) -> Self {
        Self {
            selector: Selector::Nth {
                base: Box::new(self.selector),
                index,
            },
            options: self.options,
        }
    }

    /// The first match
    #[must_use]
    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Set the auto-wait timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// The underlying selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// The locator options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.selector.fmt(f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_query() {
            let js = Selector::css("table tbody tr").to_js();
            assert_eq!(js, "Array.from(document.querySelectorAll(\"table tbody tr\"))");
        }

        #[test]
        fn test_role_query_with_name() {
            let js = Selector::role("button", "Добавить домен").to_js();
            assert_eq!(
                js,
                "__pp.byRole(document, \"button\", \"Добавить домен\", false)"
            );
        }

        #[test]
        fn test_any_role_query_passes_null() {
            let js = Selector::any_role("combobox").to_js();
            assert!(js.contains("\"combobox\", null, false"));
        }

        #[test]
        fn test_js_string_escapes_quotes() {
            assert_eq!(js_string("Поле \"age\""), "\"Поле \\\"age\\\"\"");
        }

        #[test]
        fn test_nested_scopes_use_distinct_names() {
            let locator = Locator::css("table")
                .locate(Selector::css("tr"))
                .locate(Selector::role("button", "Удаление"));
            let js = locator.selector().to_js();
            assert!(js.contains("(s0) =>"));
            assert!(js.contains("(s1) =>"));
            assert!(js.contains("__pp.byRole(s0"));
        }

        #[test]
        fn test_nth_slices() {
            let js = Selector::Nth {
                base: Box::new(Selector::css("tr")),
                index: 2,
            }
            .to_js();
            assert!(js.ends_with(".slice(2, 3)"));
        }

        #[test]
        fn test_script_embeds_helpers() {
            let script = Selector::text("Успешно удалено").count_script();
            assert!(script.starts_with("(() => {"));
            assert!(script.contains("const __pp"));
            assert!(script.contains("__pp.byText(document, \"Успешно удалено\")"));
            assert!(script.contains("return els.filter(__pp.visible).length;"));
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn test_display_chain() {
            let locator = Locator::css("table tbody tr")
                .has_text("acme")
                .locate(Selector::role("button", "Удаление"));
            assert_eq!(
                locator.to_string(),
                "css=table tbody tr:has-text(\"acme\") >> role=button[name=\"Удаление\"i]"
            );
        }

        #[test]
        fn test_display_exact_and_nth() {
            let locator = Locator::role_exact("button", "Добавить").nth(1);
            assert_eq!(
                locator.to_string(),
                "role=button[name=\"Добавить\"s] >> nth=1"
            );
        }
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let opts = LocatorOptions::default();
            assert_eq!(opts.timeout, Duration::from_millis(5000));
            assert_eq!(opts.poll_interval, Duration::from_millis(50));
        }

        #[test]
        fn test_builders_survive_chaining() {
            let locator = Locator::css("form")
                .with_timeout(Duration::from_secs(1))
                .with_poll_interval(Duration::from_millis(10))
                .first();
            assert_eq!(locator.options().timeout, Duration::from_secs(1));
            assert_eq!(locator.options().poll_interval, Duration::from_millis(10));
        }
    }
}
