//! Pronunciation rule validation
//!
//! A rule maps a spelling pattern (a letter group such as `ough` or `-tion`)
//! to a pronunciation in IPA.

use once_cell::sync::Lazy;
use regex::Regex;

use super::validation::{optional_text, required_text, ValidationError};

const MAX_PRONUNCIATION_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MAX_EXAMPLES: usize = 20;
const MAX_EXAMPLE_LEN: usize = 100;

/// Letters, optionally with leading/trailing hyphen for prefix/suffix patterns
static PATTERN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?[\p{L}']{1,16}-?$").expect("invalid pronunciation pattern regex")
});

/// Validated rule fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInput {
    pub pattern: String,
    pub pronunciation: String,
    pub description: Option<String>,
    pub examples: Vec<String>,
}

impl RuleInput {
    pub fn new(
        pattern: &str,
        pronunciation: &str,
        description: Option<&str>,
        examples: &[String],
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            pattern: rule_pattern(pattern)?,
            pronunciation: required_text("pronunciation", pronunciation, MAX_PRONUNCIATION_LEN)?,
            description: optional_text("description", description, MAX_DESCRIPTION_LEN)?,
            examples: example_words(examples)?,
        })
    }
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulePatch {
    pub pattern: Option<String>,
    pub pronunciation: Option<String>,
    pub description: Option<String>,
    pub examples: Option<Vec<String>>,
}

impl RulePatch {
    pub fn new(
        pattern: Option<&str>,
        pronunciation: Option<&str>,
        description: Option<&str>,
        examples: Option<&[String]>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            pattern: pattern.map(rule_pattern).transpose()?,
            pronunciation: pronunciation
                .map(|p| required_text("pronunciation", p, MAX_PRONUNCIATION_LEN))
                .transpose()?,
            description: optional_text("description", description, MAX_DESCRIPTION_LEN)?,
            examples: examples.map(example_words).transpose()?,
        })
    }
}

/// Normalized (lowercase) rule pattern.
pub fn rule_pattern(pattern: &str) -> Result<String, ValidationError> {
    let pattern = pattern.trim().to_lowercase();
    if pattern.is_empty() {
        return Err(ValidationError::Empty { field: "pattern" });
    }
    if !PATTERN_RE.is_match(&pattern) {
        return Err(ValidationError::invalid_format(
            "pattern",
            "must be 1-16 letters, optionally with a leading or trailing hyphen",
        ));
    }
    Ok(pattern)
}

fn example_words(examples: &[String]) -> Result<Vec<String>, ValidationError> {
    if examples.len() > MAX_EXAMPLES {
        return Err(ValidationError::OutOfRange {
            field: "examples",
            min: 0,
            max: MAX_EXAMPLES as i64,
        });
    }
    examples
        .iter()
        .map(|e| required_text("examples", e, MAX_EXAMPLE_LEN))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_rule() {
        let rule = RuleInput::new(
            " OUGH ",
            "ʌf",
            Some("as in rough"),
            &["rough".to_owned(), "tough".to_owned()],
        )
        .unwrap();
        assert_eq!(rule.pattern, "ough");
        assert_eq!(rule.examples.len(), 2);
    }

    #[test]
    fn suffix_pattern() {
        assert_eq!(rule_pattern("-tion").unwrap(), "-tion");
    }

    #[test]
    fn rejects_bad_pattern() {
        assert!(matches!(
            rule_pattern("o u"),
            Err(ValidationError::InvalidFormat { field: "pattern", .. })
        ));
        assert!(matches!(rule_pattern(""), Err(ValidationError::Empty { .. })));
    }

    #[test]
    fn rejects_blank_example() {
        let err = RuleInput::new("ph", "f", None, &["".to_owned()]).unwrap_err();
        assert_eq!(err.field(), "examples");
    }

    #[test]
    fn rejects_too_many_examples() {
        let examples = vec!["phone".to_owned(); 21];
        assert!(RuleInput::new("ph", "f", None, &examples).is_err());
    }
}
