//! Sentence tokenizer
//!
//! Text is split on whitespace first. Inside each chunk, leading and
//! trailing non-alphanumeric characters are peeled off as one-character
//! punctuation tokens; whatever lies between the first and last
//! alphanumeric character is a single word token, so inner punctuation
//! (`don't`, `e-mail`, `U.S.A`) stays with the word.
//!
//! ```
//! use lexiplan_core::{tokenize, TokenKind};
//!
//! let tokens = tokenize("Hello, world!");
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, ["Hello", ",", "world", "!"]);
//! assert_eq!(tokens[1].kind, TokenKind::Punctuation);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Word,
    Punctuation,
}

impl TokenKind {
    /// Storage/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Punctuation => "punctuation",
        }
    }

    /// Parse the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "word" => Some(Self::Word),
            "punctuation" => Some(Self::Punctuation),
            _ => None,
        }
    }

    /// Kind for an arbitrary token text: a word as soon as it contains an
    /// alphanumeric character.
    pub fn classify(text: &str) -> Self {
        if text.chars().any(is_word_char) {
            Self::Word
        } else {
            Self::Punctuation
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One token of a sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// 0-based, dense within the sentence
    pub position: usize,
    pub text: String,
    pub kind: TokenKind,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// Split `text` into tokens.
///
/// Total over all inputs: empty or whitespace-only text yields an empty
/// vec. Consecutive punctuation is never merged (`"..."` is three tokens).
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for chunk in text.split_whitespace() {
        push_chunk(chunk, &mut tokens);
    }
    tokens
}

fn push_chunk(chunk: &str, tokens: &mut Vec<Token>) {
    let Some(start) = chunk.find(is_word_char) else {
        push_punctuation(chunk, tokens);
        return;
    };
    // a word char exists, so the fallback is never taken
    let end = chunk
        .char_indices()
        .rev()
        .find(|(_, c)| is_word_char(*c))
        .map_or(chunk.len(), |(i, c)| i + c.len_utf8());

    push_punctuation(&chunk[..start], tokens);
    push(tokens, chunk[start..end].to_owned(), TokenKind::Word);
    push_punctuation(&chunk[end..], tokens);
}

fn push_punctuation(run: &str, tokens: &mut Vec<Token>) {
    for c in run.chars() {
        push(tokens, c.to_string(), TokenKind::Punctuation);
    }
}

fn push(tokens: &mut Vec<Token>, text: String, kind: TokenKind) {
    let position = tokens.len();
    tokens.push(Token {
        position,
        text,
        kind,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    fn token(position: usize, text: &str, kind: TokenKind) -> Token {
        Token {
            position,
            text: text.to_string(),
            kind,
        }
    }

    #[test]
    fn hello_world() {
        let tokens = tokenize("Hello, world!");
        assert_eq!(
            tokens,
            vec![
                token(0, "Hello", TokenKind::Word),
                token(1, ",", TokenKind::Punctuation),
                token(2, "world", TokenKind::Word),
                token(3, "!", TokenKind::Punctuation),
            ]
        );
    }

    #[test]
    fn empty_and_blank() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  \t\n ").is_empty());
    }

    #[test]
    fn inner_punctuation_stays_in_word() {
        let tokens = tokenize("don't e-mail U.S.A.");
        assert_eq!(texts(&tokens), ["don't", "e-mail", "U.S.A", "."]);
        assert_eq!(tokens[2].kind, TokenKind::Word);
    }

    #[test]
    fn consecutive_punctuation_is_split() {
        let tokens = tokenize("Wait... \"what?!\"");
        assert_eq!(
            texts(&tokens),
            ["Wait", ".", ".", ".", "\"", "what", "?", "!", "\""]
        );
    }

    #[test]
    fn punctuation_only_chunk() {
        let tokens = tokenize("a -- b");
        assert_eq!(texts(&tokens), ["a", "-", "-", "b"]);
        assert_eq!(tokens[1].kind, TokenKind::Punctuation);
    }

    #[test]
    fn unicode_words() {
        let tokens = tokenize("¿Qué tal? 你好。");
        assert_eq!(texts(&tokens), ["¿", "Qué", "tal", "?", "你好", "。"]);
    }

    #[test]
    fn positions_are_dense() {
        let tokens = tokenize("(one) two, three!");
        for (i, token) in tokens.iter().enumerate() {
            assert_eq!(token.position, i);
        }
    }

    #[test]
    fn classify_kind() {
        assert_eq!(TokenKind::classify("hello"), TokenKind::Word);
        assert_eq!(TokenKind::classify("x!"), TokenKind::Word);
        assert_eq!(TokenKind::classify("?!"), TokenKind::Punctuation);
        assert_eq!(TokenKind::classify(""), TokenKind::Punctuation);
    }

    #[test]
    fn kind_round_trips_through_storage_name() {
        for kind in [TokenKind::Word, TokenKind::Punctuation] {
            assert_eq!(TokenKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TokenKind::parse("symbol"), None);
    }
}
