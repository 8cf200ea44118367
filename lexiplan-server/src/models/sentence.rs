//! Sentence input validation
//!
//! Tokens either come from the tokenizer or from the client. Client tokens
//! are taken in order; positions are always reassigned as 0..N-1.

use lexiplan_core::{tokenize, TokenKind};

use super::validation::{positive_id, required_text, ValidationError};

/// Longest accepted sentence text
pub const MAX_SENTENCE_LEN: usize = 5000;
const MAX_TOKEN_LEN: usize = 200;

/// Validated sentence text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceText(String);

impl SentenceText {
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty { field: "text" });
        }
        if text.chars().count() > MAX_SENTENCE_LEN {
            return Err(ValidationError::TooLong {
                field: "text",
                max: MAX_SENTENCE_LEN,
            });
        }
        Ok(Self(text.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A token ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToken {
    pub position: i32,
    pub text: String,
    pub kind: TokenKind,
    pub word_id: Option<i64>,
}

/// Token as supplied by the client
#[derive(Debug, Clone)]
pub struct TokenDraft {
    pub text: String,
    pub kind: Option<TokenKind>,
    pub word_id: Option<i64>,
}

/// Tokens for `text`, produced by the tokenizer.
pub fn tokens_from_text(text: &SentenceText) -> Vec<NewToken> {
    tokenize(text.as_str())
        .into_iter()
        .zip(0..)
        .map(|(token, position)| NewToken {
            position,
            text: token.text,
            kind: token.kind,
            word_id: None,
        })
        .collect()
}

/// Validate client-supplied tokens.
pub fn tokens_from_drafts(drafts: Vec<TokenDraft>) -> Result<Vec<NewToken>, ValidationError> {
    if drafts.len() > MAX_SENTENCE_LEN {
        return Err(ValidationError::OutOfRange {
            field: "tokens",
            min: 0,
            max: MAX_SENTENCE_LEN as i64,
        });
    }

    drafts
        .into_iter()
        .zip(0..)
        .map(|(draft, position)| {
            if draft.text.is_empty() {
                return Err(ValidationError::Empty { field: "tokens.text" });
            }
            if draft.text.chars().count() > MAX_TOKEN_LEN {
                return Err(ValidationError::TooLong {
                    field: "tokens.text",
                    max: MAX_TOKEN_LEN,
                });
            }
            if draft.text.chars().any(char::is_whitespace) {
                return Err(ValidationError::invalid_format(
                    "tokens.text",
                    "must not contain whitespace",
                ));
            }
            let word_id = draft
                .word_id
                .map(|id| positive_id("tokens.word_id", id))
                .transpose()?;
            let kind = draft.kind.unwrap_or_else(|| TokenKind::classify(&draft.text));
            Ok(NewToken {
                position,
                text: draft.text,
                kind,
                word_id,
            })
        })
        .collect()
}
