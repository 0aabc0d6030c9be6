//! Locale handling. The active locale is the first URL path segment (`/en/...`,
//! `/fr/...`); anything else falls back to English. UI chrome strings come
//! from embedded JSON catalogs, API content from [`Translatable`] maps.

use std::sync::OnceLock;

use boreal_shared::{FALLBACK_LOCALE, Translatable};
use serde_json::Value;

pub const SUPPORTED_LOCALES: &[&str] = &["en", "fr"];

const EN_MESSAGES: &str = include_str!("../locales/en.json");
const FR_MESSAGES: &str = include_str!("../locales/fr.json");

fn catalog(locale: &str) -> &'static Value {
    static EN: OnceLock<Value> = OnceLock::new();
    static FR: OnceLock<Value> = OnceLock::new();
    match locale {
        "fr" => FR.get_or_init(|| serde_json::from_str(FR_MESSAGES).unwrap_or(Value::Null)),
        _ => EN.get_or_init(|| serde_json::from_str(EN_MESSAGES).unwrap_or(Value::Null)),
    }
}

/// Extract the locale from a URL path. Unknown or missing segments resolve to
/// the fallback so every path renders something.
pub fn locale_from_path(path: &str) -> &'static str {
    let first = path.trim_start_matches('/').split('/').next().unwrap_or("");
    SUPPORTED_LOCALES
        .iter()
        .find(|supported| **supported == first)
        .copied()
        .unwrap_or(FALLBACK_LOCALE)
}

pub fn current_locale() -> &'static str {
    let path = web_sys::window()
        .and_then(|window| window.location().pathname().ok())
        .unwrap_or_default();
    locale_from_path(&path)
}

fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a str> {
    let mut node = root;
    for segment in key.split('.') {
        node = node.get(segment)?;
    }
    node.as_str()
}

/// Resolve a dotted catalog key for the given locale, falling back to English,
/// then to the key itself so missing strings stay visible in the UI.
pub fn t(locale: &str, key: &str) -> String {
    if let Some(message) = lookup(catalog(locale), key) {
        return message.to_string();
    }
    if let Some(message) = lookup(catalog(FALLBACK_LOCALE), key) {
        return message.to_string();
    }
    warn_missing(&format!("missing catalog key: {key}"));
    key.to_string()
}

/// Resolve an API-provided translatable field. A field with no usable value
/// renders empty rather than breaking the surrounding view.
pub fn translate_field(locale: &str, field: &Translatable) -> String {
    match field.resolve(locale) {
        Some(value) => value.to_string(),
        None => {
            if !field.is_empty() {
                warn_missing(&format!("no translation for locale {locale}"));
            }
            String::new()
        }
    }
}

/// Path for the same page in another locale, preserving the query string.
pub fn path_for_locale(pathname: &str, query: &str, locale: &str) -> String {
    let rest = pathname
        .trim_start_matches('/')
        .split_once('/')
        .map(|(first, rest)| {
            if SUPPORTED_LOCALES.contains(&first) {
                rest
            } else {
                pathname.trim_start_matches('/')
            }
        })
        .unwrap_or_else(|| {
            let only = pathname.trim_start_matches('/');
            if SUPPORTED_LOCALES.contains(&only) {
                ""
            } else {
                only
            }
        });

    let mut out = format!("/{locale}");
    if !rest.is_empty() {
        out.push('/');
        out.push_str(rest);
    }
    out.push_str(query);
    out
}

#[cfg(target_arch = "wasm32")]
fn warn_missing(message: &str) {
    web_sys::console::warn_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
fn warn_missing(message: &str) {
    eprintln!("{message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_comes_from_first_path_segment() {
        assert_eq!(locale_from_path("/fr/map"), "fr");
        assert_eq!(locale_from_path("/en"), "en");
        assert_eq!(locale_from_path("/"), "en");
        assert_eq!(locale_from_path("/de/map"), "en");
    }

    #[test]
    fn catalog_lookup_resolves_dotted_keys() {
        assert_eq!(t("en", "map.analyze.button"), "Analyze area");
        assert_eq!(t("fr", "map.analyze.button"), "Analyser une zone");
    }

    #[test]
    fn missing_key_renders_the_key() {
        assert_eq!(t("en", "map.no.such.key"), "map.no.such.key");
    }

    #[test]
    fn unknown_locale_falls_back_to_english() {
        assert_eq!(t("de", "analysis.dialog.confirm"), "Clear & go back");
    }

    #[test]
    fn translatable_field_resolves_with_fallback() {
        let field = Translatable::new([("en", "Wildfire history")]);
        assert_eq!(translate_field("fr", &field), "Wildfire history");
        assert_eq!(translate_field("fr", &Translatable::default()), "");
    }

    #[test]
    fn locale_switch_preserves_path_and_query() {
        assert_eq!(
            path_for_locale("/en/map", "?mapStatus=upload", "fr"),
            "/fr/map?mapStatus=upload"
        );
        assert_eq!(path_for_locale("/fr", "", "en"), "/en");
        assert_eq!(path_for_locale("/", "", "fr"), "/fr");
    }
}
