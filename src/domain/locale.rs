//! Supported locales and the single default every fallback terminates at.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_SUPPORTED_LOCALES: [&str; 2] = ["en", "th"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    #[error("invalid locale code `{0}`")]
    Invalid(String),
    #[error("default locale `{0}` is not one of the supported locales")]
    DefaultNotSupported(String),
    #[error("at least one supported locale is required")]
    Empty,
}

/// A locale code such as `en` or `pt-br`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn new(code: impl AsRef<str>) -> Result<Self, LocaleError> {
        let code = code.as_ref().trim();
        let valid = !code.is_empty()
            && code.len() <= 16
            && code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(LocaleError::Invalid(code.to_string()));
        }
        Ok(Self(code.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = LocaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Locale> for String {
    fn from(value: Locale) -> Self {
        value.0
    }
}

/// The configured locales, exactly one of which is the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSet {
    supported: Vec<Locale>,
    default: Locale,
}

impl LocaleSet {
    pub fn new(supported: Vec<Locale>, default: Locale) -> Result<Self, LocaleError> {
        if supported.is_empty() {
            return Err(LocaleError::Empty);
        }
        let mut deduped: Vec<Locale> = Vec::with_capacity(supported.len());
        for locale in supported {
            if !deduped.contains(&locale) {
                deduped.push(locale);
            }
        }
        if !deduped.contains(&default) {
            return Err(LocaleError::DefaultNotSupported(default.0));
        }
        Ok(Self {
            supported: deduped,
            default,
        })
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default
    }

    pub fn supported(&self) -> &[Locale] {
        &self.supported
    }

    pub fn is_default(&self, locale: &Locale) -> bool {
        *locale == self.default
    }

    /// Look up a supported locale by its code, case-sensitively as it appears in paths.
    pub fn resolve(&self, code: &str) -> Option<&Locale> {
        self.supported.iter().find(|locale| locale.as_str() == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.resolve(code).is_some()
    }

    /// The locale to retry with after `locale` came back empty. `None` for the default.
    pub fn fallback_for(&self, locale: &Locale) -> Option<&Locale> {
        (!self.is_default(locale)).then_some(&self.default)
    }
}

impl Default for LocaleSet {
    fn default() -> Self {
        Self {
            supported: DEFAULT_SUPPORTED_LOCALES
                .iter()
                .map(|code| Locale((*code).to_string()))
                .collect(),
            default: Locale(DEFAULT_LOCALE.to_string()),
        }
    }
}
