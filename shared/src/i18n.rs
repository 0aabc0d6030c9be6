use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Locale every `Translatable` is guaranteed to carry.
pub const FALLBACK_LOCALE: &str = "en";

/// Multi-language field from the catalog API: locale code -> localized string.
///
/// Seed data always includes an `en` entry, so resolution falls back to it
/// for locales the catalog does not cover.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translatable(pub HashMap<String, String>);

impl Translatable {
    pub fn new(pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(locale, text)| (locale.into(), text.into()))
                .collect(),
        )
    }

    /// Best available string for `locale`: exact match, else the `en`
    /// fallback, else `None` (upstream data-contract violation).
    pub fn resolve(&self, locale: &str) -> Option<&str> {
        self.0
            .get(locale)
            .or_else(|| self.0.get(FALLBACK_LOCALE))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive substring match against any localized value.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.0
            .values()
            .any(|text| text.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::Translatable;

    fn field() -> Translatable {
        Translatable::new([("en", "Title"), ("fr", "Titre")])
    }

    #[test]
    fn resolves_exact_locale() {
        assert_eq!(field().resolve("fr"), Some("Titre"));
    }

    #[test]
    fn falls_back_to_english_for_unknown_locale() {
        assert_eq!(field().resolve("de"), Some("Title"));
    }

    #[test]
    fn missing_fallback_resolves_to_none() {
        let field = Translatable::new([("fr", "Titre seul")]);
        assert_eq!(field.resolve("de"), None);
        assert_eq!(field.resolve("fr"), Some("Titre seul"));
    }

    #[test]
    fn search_matches_any_locale_case_insensitively() {
        assert!(field().matches("titre"));
        assert!(field().matches("TIT"));
        assert!(!field().matches("atlas"));
    }
}
