//! Dictionary input validation

use once_cell::sync::Lazy;
use regex::Regex;

use super::validation::{optional_text, required_text, ValidationError};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// Language tag such as `en`, `fra` or `en-US`
static LANGUAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2,3}(-[A-Z]{2})?$").expect("invalid language regex"));

/// Validated dictionary fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryInput {
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
}

impl DictionaryInput {
    pub fn new(
        name: &str,
        description: Option<&str>,
        language: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", name, MAX_NAME_LEN)?,
            description: optional_text("description", description, MAX_DESCRIPTION_LEN)?,
            language: language_tag(language)?,
        })
    }
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
}

impl DictionaryPatch {
    pub fn new(
        name: Option<&str>,
        description: Option<&str>,
        language: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            name: name
                .map(|n| required_text("name", n, MAX_NAME_LEN))
                .transpose()?,
            description: optional_text("description", description, MAX_DESCRIPTION_LEN)?,
            language: language_tag(language)?,
        })
    }
}

fn language_tag(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(tag) if LANGUAGE_RE.is_match(tag) => Ok(Some(tag.to_owned())),
        Some(_) => Err(ValidationError::invalid_format(
            "language",
            "must be a language tag like 'en' or 'en-US'",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_dictionary() {
        let input = DictionaryInput::new(" Core 3000 ", Some(""), Some("en-US")).unwrap();
        assert_eq!(input.name, "Core 3000");
        assert_eq!(input.description, None);
        assert_eq!(input.language.as_deref(), Some("en-US"));
    }

    #[test]
    fn rejects_bad_language() {
        let err = DictionaryInput::new("x", None, Some("English")).unwrap_err();
        assert_eq!(err.field(), "language");
    }

    #[test]
    fn rejects_long_name() {
        let err = DictionaryInput::new(&"a".repeat(101), None, None).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 100, .. }));
    }

    #[test]
    fn patch_keeps_absent_fields() {
        let patch = DictionaryPatch::new(None, Some("updated"), None).unwrap();
        assert_eq!(patch.name, None);
        assert_eq!(patch.description.as_deref(), Some("updated"));
    }
}
