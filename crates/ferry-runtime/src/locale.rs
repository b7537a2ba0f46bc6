#![forbid(unsafe_code)]

//! Locale detection and idempotent translator installation.
//!
//! Translators must be installed before any UI surface is shown; the shell
//! enforces that ordering. Installation is idempotent: repeated calls
//! after the first are no-ops, so both the headless and interactive
//! constructions can request it unconditionally.

use std::env;
use std::fmt;

/// A normalized locale tag (`en-US`, `fr-FR`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(String);

impl Locale {
    /// Create a locale from a raw tag, normalizing codeset and modifier
    /// suffixes (`en_US.UTF-8@latin` becomes `en-US`).
    #[must_use]
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(normalize_tag(tag.as_ref()).unwrap_or_else(|| "en".to_string()))
    }

    /// The normalized tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Detect the system locale from `LC_ALL`, `LC_MESSAGES`, then `LANG`.
///
/// Falls back to `en` when none of them yields a usable tag.
#[must_use]
pub fn detect_system_locale() -> Locale {
    detect_system_locale_from(
        env::var("LC_ALL").ok().as_deref(),
        env::var("LC_MESSAGES").ok().as_deref(),
        env::var("LANG").ok().as_deref(),
    )
}

fn detect_system_locale_from(
    lc_all: Option<&str>,
    lc_messages: Option<&str>,
    lang: Option<&str>,
) -> Locale {
    for candidate in [lc_all, lc_messages, lang].into_iter().flatten() {
        if let Some(tag) = normalize_tag(candidate) {
            return Locale(tag);
        }
    }
    Locale("en".to_string())
}

fn normalize_tag(raw: &str) -> Option<String> {
    let raw = raw.split('@').next().unwrap_or(raw);
    let raw = raw.split('.').next().unwrap_or(raw);
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut normalized = raw.replace('_', "-");
    if normalized.eq_ignore_ascii_case("c") || normalized.eq_ignore_ascii_case("posix") {
        normalized.clear();
        normalized.push_str("en");
    }
    Some(normalized)
}

/// Locale resources installed once per shell.
#[derive(Debug, Default)]
pub struct TranslatorSet {
    locale: Option<Locale>,
    installed: bool,
}

impl TranslatorSet {
    /// Create an empty, not-yet-installed set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install translators for the requested locale, or the detected
    /// system locale when none is given.
    ///
    /// Returns `true` if this call performed the installation, `false` if
    /// it had already happened.
    pub fn install(&mut self, requested: Option<&Locale>) -> bool {
        if self.installed {
            return false;
        }
        let locale = requested.cloned().unwrap_or_else(detect_system_locale);
        tracing::debug!(locale = %locale, "translators installed");
        self.locale = Some(locale);
        self.installed = true;
        true
    }

    /// Whether installation has happened.
    #[must_use]
    pub fn installed(&self) -> bool {
        self.installed
    }

    /// The locale the set was installed with.
    #[must_use]
    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }
}
