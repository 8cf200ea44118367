//! Dictionary repository
//!
//! Every read returns the dictionary's word count, computed in the same query.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{like_pattern, paginate, search_term};
use crate::db::{Database, DbError};
use crate::models::{DictionaryInput, DictionaryPatch, Paginated, Pagination};

const DUPLICATE: &str = "a dictionary with this name already exists";
const IN_USE: &str = "dictionary still contains words";

/// Dictionary with its word count
#[derive(Debug, Clone, FromRow)]
pub struct Dictionary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub word_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dictionary repository
pub struct DictionaryRepo<'a> {
    db: &'a Database,
}

impl<'a> DictionaryRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: &DictionaryInput) -> Result<Dictionary, DbError> {
        self.db
            .run(move |mut conn| async move {
                let dictionary = sqlx::query_as::<_, Dictionary>(
                    r#"
                    INSERT INTO dictionaries (name, description, language)
                    VALUES ($1, $2, $3)
                    RETURNING id, name, description, language, 0::bigint AS word_count,
                              created_at, updated_at
                    "#,
                )
                .bind(&input.name)
                .bind(input.description.as_deref())
                .bind(input.language.as_deref())
                .fetch_one(&mut *conn)
                .await?;
                Ok(dictionary)
            })
            .await
            .map_err(|e| e.on_constraint(DUPLICATE, IN_USE))
    }

    /// List dictionaries, newest first, with word counts.
    ///
    /// Counts come from a correlated subquery in the same statement (no N+1).
    pub async fn list(
        &self,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<Paginated<Dictionary>, DbError> {
        let pattern = search_term(search).map(like_pattern);
        let pattern = pattern.as_deref();
        self.db
            .run(move |mut conn| async move {
                let rows = sqlx::query(
                    r#"
                    SELECT
                        d.id, d.name, d.description, d.language, d.created_at, d.updated_at,
                        (SELECT COUNT(*) FROM dictionary_words dw WHERE dw.dictionary_id = d.id)
                            AS word_count,
                        COUNT(*) OVER() AS total
                    FROM dictionaries d
                    WHERE ($1::text IS NULL OR d.name ILIKE $1 OR d.description ILIKE $1)
                    ORDER BY d.created_at DESC, d.id DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(pattern)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&mut *conn)
                .await?;
                paginate(&rows, page)
            })
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Dictionary, DbError> {
        self.db
            .run(move |mut conn| async move {
                sqlx::query_as::<_, Dictionary>(
                    r#"
                    SELECT
                        d.id, d.name, d.description, d.language, d.created_at, d.updated_at,
                        (SELECT COUNT(*) FROM dictionary_words dw WHERE dw.dictionary_id = d.id)
                            AS word_count
                    FROM dictionaries d
                    WHERE d.id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| DbError::not_found("dictionary", id))
            })
            .await
    }

    pub async fn update(&self, id: i64, patch: &DictionaryPatch) -> Result<Dictionary, DbError> {
        self.db
            .run(move |mut conn| async move {
                sqlx::query_as::<_, Dictionary>(
                    r#"
                    UPDATE dictionaries d SET
                        name = COALESCE($2, name),
                        description = COALESCE($3, description),
                        language = COALESCE($4, language),
                        updated_at = NOW()
                    WHERE d.id = $1
                    RETURNING
                        d.id, d.name, d.description, d.language, d.created_at, d.updated_at,
                        (SELECT COUNT(*) FROM dictionary_words dw WHERE dw.dictionary_id = d.id)
                            AS word_count
                    "#,
                )
                .bind(id)
                .bind(patch.name.as_deref())
                .bind(patch.description.as_deref())
                .bind(patch.language.as_deref())
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| DbError::not_found("dictionary", id))
            })
            .await
            .map_err(|e| e.on_constraint(DUPLICATE, IN_USE))
    }

    /// Delete an empty dictionary.
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        self.db
            .run(move |mut conn| async move {
                let result = sqlx::query("DELETE FROM dictionaries WHERE id = $1")
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(DbError::not_found("dictionary", id));
                }
                Ok(())
            })
            .await
            .map_err(|e| e.on_constraint(DUPLICATE, IN_USE))
    }
}
