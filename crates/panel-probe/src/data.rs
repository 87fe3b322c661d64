//! Random test data.
//!
//! Names carry the current epoch milliseconds plus a random suffix so that
//! parallel scenarios and repeated runs never collide on the panel.

use crate::console::{DomainForm, UserForm};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Password every generated user gets
pub const DEFAULT_PASSWORD: &str = "Test1234!";
/// Malformed email for negative scenarios
pub const INVALID_EMAIL: &str = "invalid-email";
/// Malformed URL for negative scenarios
pub const INVALID_URL: &str = "not-a-url";
/// Mail provider for generated addresses
pub const EMAIL_PROVIDER: &str = "testsh.com";

const WORDS: &[&str] = &[
    "amber", "birch", "cobalt", "delta", "ember", "fjord", "granite", "harbor", "indigo", "juniper",
    "kestrel", "lumen", "meadow", "nimbus", "onyx", "prairie", "quartz", "raven", "sierra",
    "timber", "umber", "vertex", "willow", "zephyr",
];

const FIRST_NAMES: &[&str] = &[
    "Alice", "Boris", "Clara", "Dmitri", "Elena", "Felix", "Greta", "Hugo", "Irina", "Jonas",
    "Katya", "Leon", "Maria", "Nikolai", "Olga", "Pavel",
];

const LAST_NAMES: &[&str] = &[
    "Anders", "Baker", "Chen", "Dorn", "Evans", "Fischer", "Garcia", "Holm", "Ivanova", "Jensen",
    "Kovacs", "Lind", "Moreau", "Novak", "Orlov", "Petrov",
];

const COMPANY_SUFFIXES: &[&str] = &["Group", "Labs", "Systems", "Partners", "Holdings", "Works"];

const TLDS: &[&str] = &["com", "net", "org", "io"];

/// Milliseconds since the Unix epoch
#[must_use]
pub fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generator for form data
#[derive(Debug)]
pub struct DataGenerator {
    rng: StdRng,
}

impl Default for DataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DataGenerator {
    /// Generator seeded from the OS
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items.choose(&mut self.rng).copied().unwrap_or("x")
    }

    /// Lowercase dictionary word
    pub fn word(&mut self) -> String {
        self.pick(WORDS).to_string()
    }

    /// `prefix-<millis><4 random digits>`
    pub fn unique_name(&mut self, prefix: &str) -> String {
        let suffix: u16 = self.rng.gen_range(1000..10_000);
        format!("{prefix}-{}{suffix}", epoch_millis())
    }

    /// Domain name: word plus epoch millis and a random tail
    pub fn domain_name(&mut self) -> String {
        let tail: u16 = self.rng.gen_range(100..1000);
        format!("{}{}{tail}", self.word(), epoch_millis())
    }

    /// Address at the test mail provider
    pub fn email(&mut self) -> String {
        let first = self.pick(FIRST_NAMES).to_lowercase();
        let last = self.pick(LAST_NAMES).to_lowercase();
        let n: u32 = self.rng.gen_range(10..100_000);
        format!("{first}.{last}{n}@{EMAIL_PROVIDER}")
    }

    /// `https://` URL
    pub fn url(&mut self) -> String {
        let host = self.word();
        let tld = self.pick(TLDS);
        let n: u16 = self.rng.gen_range(1..1000);
        format!("https://{host}{n}.{tld}")
    }

    /// Company name
    pub fn company(&mut self) -> String {
        let name = self.pick(LAST_NAMES);
        let suffix = self.pick(COMPANY_SUFFIXES);
        format!("{name} {suffix}")
    }

    /// Person full name
    pub fn full_name(&mut self) -> String {
        format!("{} {}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES))
    }

    /// Lowercase nickname, unique per call
    pub fn nickname(&mut self) -> String {
        let first = self.pick(FIRST_NAMES).to_lowercase();
        let n: u32 = self.rng.gen_range(0..1_000_000);
        format!("{first}_{n}{}", epoch_millis() % 100_000)
    }

    /// Complete, valid domain form
    pub fn domain_data(&mut self) -> DomainForm {
        DomainForm {
            domain: self.domain_name(),
            otp_email: self.email(),
            otp_url: self.url(),
            team_name: self.company(),
            homepage: self.url(),
        }
    }

    /// Complete, valid user form for a domain
    pub fn user_data(&mut self, domain_id: &str) -> UserForm {
        UserForm {
            nickname: self.nickname(),
            email: self.email(),
            domain_id: domain_id.to_string(),
            full_name: self.full_name(),
            password: DEFAULT_PASSWORD.to_string(),
            dynamic_fields: BTreeMap::new(),
        }
    }

    /// Malformed email
    #[must_use]
    pub fn invalid_email(&self) -> String {
        INVALID_EMAIL.to_string()
    }

    /// Malformed URL
    #[must_use]
    pub fn invalid_url(&self) -> String {
        INVALID_URL.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod generator_tests {
        use super::*;

        #[test]
        fn test_domain_data_is_complete() {
            let mut data = DataGenerator::seeded(7);
            let form = data.domain_data();
            assert!(!form.domain.is_empty());
            assert!(form.domain.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(form.otp_email.ends_with("@testsh.com"));
            assert!(form.otp_url.starts_with("https://"));
            assert!(form.homepage.starts_with("https://"));
            assert!(form.team_name.contains(' '));
        }

        #[test]
        fn test_user_data() {
            let mut data = DataGenerator::seeded(1);
            let user = data.user_data("42");
            assert_eq!(user.domain_id, "42");
            assert_eq!(user.password, "Test1234!");
            assert_eq!(user.nickname, user.nickname.to_lowercase());
            assert!(user.dynamic_fields.is_empty());
        }

        #[test]
        fn test_unique_name_shape() {
            let mut data = DataGenerator::new();
            let name = data.unique_name("param");
            let digits = name.strip_prefix("param-").unwrap();
            assert!(digits.len() > 4);
            assert!(digits.chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn test_invalid_values() {
            let data = DataGenerator::seeded(0);
            assert_eq!(data.invalid_email(), "invalid-email");
            assert_eq!(data.invalid_url(), "not-a-url");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_generated_email_has_provider(seed in any::<u64>()) {
            let mut data = DataGenerator::seeded(seed);
            let email = data.email();
            prop_assert!(email.ends_with("@testsh.com"));
            prop_assert_eq!(email.matches('@').count(), 1);
        }
    }
}
