//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Every call is one executor operation (retried as a whole on transient errors)
//! - List operations use `COUNT(*) OVER()` and batch child loads (no N+1)
//! - Constraint violations become conflicts (no check-then-insert for uniqueness)
//! - Multi-step writes run in one transaction

pub mod associations;
pub mod dictionaries;
pub mod pronunciation_rules;
pub mod sentences;
pub mod word_plans;
pub mod words;

use sqlx::pool::PoolConnection;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, Postgres, Row};

use super::error::DbError;
use crate::models::{Paginated, Pagination};

pub use associations::{AssociationRepo, DictionaryWord, WordDictionary};
pub use dictionaries::{Dictionary, DictionaryRepo};
pub use pronunciation_rules::{PronunciationRule, RuleFilter, RuleRepo};
pub use sentences::{Sentence, SentenceRepo, SentenceToken, WordRef};
pub use word_plans::{PlanItem, WordPlan, WordPlanRepo};
pub use words::{Word, WordFilter, WordRepo};

/// Connection handed to repository operations by the executor
pub(crate) type Conn = PoolConnection<Postgres>;

/// `ILIKE` pattern matching `search` anywhere, with wildcards escaped.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Trimmed search term, `None` when blank.
pub(crate) fn search_term(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|s| !s.is_empty())
}

/// Build a page from rows carrying a `total` window column.
pub(crate) fn paginate<T>(rows: &[PgRow], page: Pagination) -> Result<Paginated<T>, DbError>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    let total = match rows.first() {
        Some(row) => row.try_get::<i64, _>("total")?,
        None => 0,
    };
    let items = rows.iter().map(T::from_row).collect::<Result<Vec<_>, _>>()?;
    Ok(page.wrap(items, total))
}

/// Fail with `NotFound` unless `table` has a row with `id`.
pub(crate) async fn ensure_exists(
    conn: &mut PgConnection,
    table: &'static str,
    resource: &'static str,
    id: i64,
) -> Result<(), DbError> {
    let query = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)");
    let exists: bool = sqlx::query_scalar(&query).bind(id).fetch_one(conn).await?;
    if exists {
        Ok(())
    } else {
        Err(DbError::not_found(resource, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("hello"), "%hello%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(search_term(Some("  ")), None);
        assert_eq!(search_term(Some(" cat ")), Some("cat"));
        assert_eq!(search_term(None), None);
    }
}
