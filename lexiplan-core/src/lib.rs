//! lexiplan-core: pure building blocks shared by the server and the CLI.
//!
//! - [`tokenizer`]: splits sentence text into word/punctuation tokens
//! - [`schedule`]: spaced-review intervals for word plans

pub mod schedule;
pub mod tokenizer;

pub use schedule::{next_review, ReviewOutcome, MASTERED_STAGE, REVIEW_INTERVALS_DAYS};
pub use tokenizer::{tokenize, Token, TokenKind};
