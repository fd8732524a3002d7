// src/schema/sanitize.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::error::SchemaError;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_]").expect("static regex"));

/// Map a raw header cell to a store identifier.
///
/// Steps, in order:
///  1) trim surrounding whitespace
///  2) collapse each internal whitespace run into one `_`
///  3) drop everything outside `[a-zA-Z0-9_]`
///  4) lowercase
///  5) prefix `_` when the result starts with a digit
///
/// Total: fully stripped input yields `""`, which callers must reject.
pub fn sanitize_column_name(raw: &str) -> String {
    let underscored = WHITESPACE.replace_all(raw.trim(), "_");
    let mut name = DISALLOWED.replace_all(&underscored, "").to_ascii_lowercase();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// True when `name` is non-empty, only uses `[a-z0-9_]` and does not start with a digit.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// An identifier that passed [`is_valid_identifier`]; the only kind of name
/// ever spliced into SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: impl Into<String>) -> Result<Self, SchemaError> {
        let name = name.into();
        if is_valid_identifier(&name) {
            Ok(Self(name))
        } else {
            Err(SchemaError::InvalidIdentifier(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form for statement text.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_mixed_headers() {
        assert_eq!(sanitize_column_name("Service lbs"), "service_lbs");
        assert_eq!(sanitize_column_name("  Rate A "), "rate_a");
        assert_eq!(sanitize_column_name("Rate\t\t  B"), "rate_b");
        assert_eq!(
            sanitize_column_name("Next day by 8:30 a.m. — FedEx First Overnight"),
            "next_day_by_830_am__fedex_first_overnight"
        );
        assert_eq!(
            sanitize_column_name("2-day by 5 p.m. — FedEx 2Day"),
            "_2day_by_5_pm__fedex_2day"
        );
    }

    #[test]
    fn fully_stripped_input_is_empty() {
        assert_eq!(sanitize_column_name(""), "");
        assert_eq!(sanitize_column_name("  —®. "), "");
    }

    #[test]
    fn sanitizing_is_idempotent() {
        let headers = [
            "Service lbs",
            "Rate A",
            "FedEx® Envelope up to 8 oz.",
            "3-day by 5 p.m. — FedEx Express Saver",
            "MiXeD   CaSe!!",
            "9 lives",
            "_already_clean",
        ];
        for h in headers {
            let once = sanitize_column_name(h);
            assert_eq!(sanitize_column_name(&once), once, "header {h:?}");
            assert!(is_valid_identifier(&once), "{once:?} from {h:?}");
        }
    }

    #[test]
    fn identifier_rules() {
        assert!(is_valid_identifier("rate_a"));
        assert!(is_valid_identifier("_2day"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2day"));
        assert!(!is_valid_identifier("Rate"));
        assert!(!is_valid_identifier("rate a"));
        assert!(!is_valid_identifier("x\";drop"));

        assert_eq!(Ident::new("rate_a").unwrap().quoted(), "\"rate_a\"");
        assert_eq!(
            Ident::new("bad name"),
            Err(SchemaError::InvalidIdentifier("bad name".into()))
        );
    }
}
