//! Domain input models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod dictionary;
pub mod pagination;
pub mod plan;
pub mod pronunciation;
pub mod sentence;
pub mod validation;
pub mod word;

pub use dictionary::{DictionaryInput, DictionaryPatch};
pub use pagination::{PageMeta, Paginated, Pagination, PaginationParams};
pub use plan::{PlanInput, PlanPatch};
pub use pronunciation::{RuleInput, RulePatch};
pub use sentence::{NewToken, SentenceText, TokenDraft};
pub use validation::ValidationError;
pub use word::{WordFields, WordInput, WordPatch};
