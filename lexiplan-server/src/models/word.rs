//! Word input validation

use super::validation::{optional_text, required_text, ValidationError};

const MAX_WORD_LEN: usize = 100;
const MAX_PHONETIC_LEN: usize = 100;
const MAX_MEANING_LEN: usize = 2000;
const MAX_EXAMPLE_LEN: usize = 2000;

/// Accepted parts of speech
pub const PARTS_OF_SPEECH: &[&str] = &[
    "noun",
    "verb",
    "adjective",
    "adverb",
    "pronoun",
    "preposition",
    "conjunction",
    "interjection",
    "determiner",
    "numeral",
    "phrase",
    "other",
];

/// Validated word fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordInput {
    pub word: String,
    pub phonetic: Option<String>,
    pub part_of_speech: Option<String>,
    pub meaning: Option<String>,
    pub example: Option<String>,
}

/// Raw word fields as they arrive in a request
#[derive(Debug, Clone, Copy, Default)]
pub struct WordFields<'a> {
    pub word: Option<&'a str>,
    pub phonetic: Option<&'a str>,
    pub part_of_speech: Option<&'a str>,
    pub meaning: Option<&'a str>,
    pub example: Option<&'a str>,
}

impl WordInput {
    pub fn new(fields: WordFields<'_>) -> Result<Self, ValidationError> {
        let word = fields.word.ok_or(ValidationError::Empty { field: "word" })?;
        Ok(Self {
            word: required_text("word", word, MAX_WORD_LEN)?,
            phonetic: optional_text("phonetic", fields.phonetic, MAX_PHONETIC_LEN)?,
            part_of_speech: part_of_speech(fields.part_of_speech)?,
            meaning: optional_text("meaning", fields.meaning, MAX_MEANING_LEN)?,
            example: optional_text("example", fields.example, MAX_EXAMPLE_LEN)?,
        })
    }
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordPatch {
    pub word: Option<String>,
    pub phonetic: Option<String>,
    pub part_of_speech: Option<String>,
    pub meaning: Option<String>,
    pub example: Option<String>,
}

impl WordPatch {
    pub fn new(fields: WordFields<'_>) -> Result<Self, ValidationError> {
        Ok(Self {
            word: fields
                .word
                .map(|w| required_text("word", w, MAX_WORD_LEN))
                .transpose()?,
            phonetic: optional_text("phonetic", fields.phonetic, MAX_PHONETIC_LEN)?,
            part_of_speech: part_of_speech(fields.part_of_speech)?,
            meaning: optional_text("meaning", fields.meaning, MAX_MEANING_LEN)?,
            example: optional_text("example", fields.example, MAX_EXAMPLE_LEN)?,
        })
    }
}

fn part_of_speech(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    match value.map(|v| v.trim().to_lowercase()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) if PARTS_OF_SPEECH.contains(&v.as_str()) => Ok(Some(v)),
        Some(v) => Err(ValidationError::InvalidVariant {
            field: "part_of_speech",
            value: v,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_word() {
        let input = WordInput::new(WordFields {
            word: Some("serendipity"),
            phonetic: Some("/ˌser.ənˈdɪp.ə.ti/"),
            part_of_speech: Some("Noun"),
            ..WordFields::default()
        })
        .unwrap();
        assert_eq!(input.word, "serendipity");
        assert_eq!(input.part_of_speech.as_deref(), Some("noun"));
        assert_eq!(input.meaning, None);
    }

    #[test]
    fn phrases_are_words() {
        let input = WordInput::new(WordFields {
            word: Some("look up to"),
            part_of_speech: Some("phrase"),
            ..WordFields::default()
        })
        .unwrap();
        assert_eq!(input.word, "look up to");
    }

    #[test]
    fn missing_word() {
        let err = WordInput::new(WordFields::default()).unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "word" });
    }

    #[test]
    fn unknown_part_of_speech() {
        let err = WordInput::new(WordFields {
            word: Some("run"),
            part_of_speech: Some("gerundive"),
            ..WordFields::default()
        })
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidVariant { field: "part_of_speech", .. }));
    }

    #[test]
    fn patch_validates_present_fields_only() {
        assert!(WordPatch::new(WordFields::default()).is_ok());
        assert!(WordPatch::new(WordFields {
            word: Some(" "),
            ..WordFields::default()
        })
        .is_err());
    }
}
