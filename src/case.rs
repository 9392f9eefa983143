//! Identifier case conversion between the engine's camelCase wire keys and
//! snake_case field names.
//!
//! Both functions are total: any input produces an output, nothing panics.

use once_cell::sync::Lazy;
use regex::Regex;

/// Converts a `snake_case` identifier to `camelCase`.
///
/// The first segment is kept verbatim; every following non-empty segment has its
/// first character upper-cased. Empty segments (from doubled or trailing
/// underscores) contribute nothing. A leading underscore therefore capitalizes
/// the first real segment: `_foo` becomes `Foo`.
///
/// # Examples
///
/// ```
/// use camrest::case::to_camel;
///
/// assert_eq!(to_camel("process_definition_key"), "processDefinitionKey");
/// assert_eq!(to_camel("foo__bar"), "fooBar");
/// assert_eq!(to_camel("foo_bar_"), "fooBar");
/// ```
pub fn to_camel(identifier: &str) -> String {
    let mut segments = identifier.split('_');
    let mut out = String::with_capacity(identifier.len());
    if let Some(head) = segments.next() {
        out.push_str(head);
    }
    for segment in segments {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Converts a `camelCase`, `PascalCase` or hyphenated identifier to `snake_case`.
///
/// Trailing colons are stripped and hyphens become underscores. An underscore is
/// inserted before a capitalized word (an uppercase letter followed by lowercase
/// letters) that follows any character, and before an uppercase letter that
/// directly follows a lowercase letter or digit. Acronym runs fold into a single
/// word.
///
/// # Examples
///
/// ```
/// use camrest::case::to_snake;
///
/// assert_eq!(to_snake("HTTPClient"), "http_client");
/// assert_eq!(to_snake("fooBar:"), "foo_bar");
/// assert_eq!(to_snake("foo-bar"), "foo_bar");
/// ```
pub fn to_snake(identifier: &str) -> String {
    let identifier = identifier.trim_end_matches(':').replace('-', "_");
    let words = CAPITALIZED_WORD.replace_all(&identifier, "${1}_${2}");
    LOWER_THEN_UPPER
        .replace_all(&words, "${1}_${2}")
        .to_lowercase()
}

// Any character followed by a capitalized word.
static CAPITALIZED_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(.)([A-Z][a-z]+)").expect("CAPITALIZED_WORD should compile - this is a bug")
});

// A lowercase letter or digit directly followed by an uppercase letter.
static LOWER_THEN_UPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([a-z0-9])([A-Z])").expect("LOWER_THEN_UPPER should compile - this is a bug")
});
