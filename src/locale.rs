//! Locale normalisation for recognition requests
//!
//! Recognisers want a `language-REGION` tag. Callers frequently pass a bare language
//! (`"en"`) or an underscore form (`"en_GB"`), so both are folded into the hyphenated form
//! before a request is opened.

/// Bare languages that map to a preferred region
const DEFAULT_REGIONS: &[(&str, &str)] = &[
    ("id", "id-ID"), // Indonesian
    ("in", "id-ID"), // Indonesian (legacy code)
    ("ur", "ur-PK"),
    ("hi", "hi-IN"),
    ("en", "en-US"),
    ("ms", "ms-MY"),
    ("ar", "ar-SA"),
    ("bn", "bn-BD"),
];

/// Normalise `locale`, returning `None` when it is blank
pub fn normalize(locale: &str) -> Option<String> {
    let locale = locale.trim();
    if locale.is_empty() {
        return None;
    }

    let mut parts = locale.split(['-', '_']);
    let language = parts.next().unwrap_or_default().to_lowercase();

    if parts.next().is_some() {
        return Some(locale.replace('_', "-"));
    }

    let mapped = DEFAULT_REGIONS
        .iter()
        .find(|(lang, _)| *lang == language)
        .map(|(_, full)| (*full).to_string());

    Some(mapped.unwrap_or_else(|| locale.to_string()))
}

/// Normalise `locale`, falling back to `default` when it is blank
pub fn resolve(locale: &str, default: &str) -> String {
    normalize(locale)
        .or_else(|| normalize(default))
        .unwrap_or_else(|| "en-US".to_string())
}
