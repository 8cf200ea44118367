//! Pronunciation rule repository

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{like_pattern, paginate, search_term};
use crate::db::{Database, DbError};
use crate::models::{Paginated, Pagination, RuleInput, RulePatch};

const DUPLICATE: &str = "a rule with this pattern and pronunciation already exists";

/// Pronunciation rule record
#[derive(Debug, Clone, FromRow)]
pub struct PronunciationRule {
    pub id: i64,
    pub pattern: String,
    pub pronunciation: String,
    pub description: Option<String>,
    pub examples: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List filter
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleFilter<'a> {
    /// Substring of the pattern, pronunciation or description
    pub search: Option<&'a str>,
    /// Only rules whose pattern (without hyphens) occurs in this word
    pub word: Option<&'a str>,
}

/// Pronunciation rule repository
pub struct RuleRepo<'a> {
    db: &'a Database,
}

impl<'a> RuleRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: &RuleInput) -> Result<PronunciationRule, DbError> {
        self.db
            .run(move |mut conn| async move {
                let rule = sqlx::query_as::<_, PronunciationRule>(
                    r#"
                    INSERT INTO pronunciation_rules (pattern, pronunciation, description, examples)
                    VALUES ($1, $2, $3, $4)
                    RETURNING *
                    "#,
                )
                .bind(&input.pattern)
                .bind(&input.pronunciation)
                .bind(input.description.as_deref())
                .bind(&input.examples)
                .fetch_one(&mut *conn)
                .await?;
                Ok(rule)
            })
            .await
            .map_err(|e| e.on_constraint(DUPLICATE, DUPLICATE))
    }

    /// List rules; longer patterns first so the most specific rule leads.
    pub async fn list(
        &self,
        filter: RuleFilter<'_>,
        page: Pagination,
    ) -> Result<Paginated<PronunciationRule>, DbError> {
        let pattern = search_term(filter.search).map(like_pattern);
        let pattern = pattern.as_deref();
        let word = search_term(filter.word).map(str::to_lowercase);
        let word = word.as_deref();
        self.db
            .run(move |mut conn| async move {
                let rows = sqlx::query(
                    r#"
                    SELECT r.*, COUNT(*) OVER() AS total
                    FROM pronunciation_rules r
                    WHERE ($1::text IS NULL
                           OR r.pattern ILIKE $1
                           OR r.pronunciation ILIKE $1
                           OR r.description ILIKE $1)
                      AND ($2::text IS NULL OR strpos($2, trim(BOTH '-' FROM r.pattern)) > 0)
                    ORDER BY length(r.pattern) DESC, r.pattern, r.id
                    LIMIT $3 OFFSET $4
                    "#,
                )
                .bind(pattern)
                .bind(word)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&mut *conn)
                .await?;
                paginate(&rows, page)
            })
            .await
    }

    pub async fn get(&self, id: i64) -> Result<PronunciationRule, DbError> {
        self.db
            .run(move |mut conn| async move {
                sqlx::query_as::<_, PronunciationRule>("SELECT * FROM pronunciation_rules WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?
                    .ok_or_else(|| DbError::not_found("pronunciation rule", id))
            })
            .await
    }

    pub async fn update(&self, id: i64, patch: &RulePatch) -> Result<PronunciationRule, DbError> {
        self.db
            .run(move |mut conn| async move {
                sqlx::query_as::<_, PronunciationRule>(
                    r#"
                    UPDATE pronunciation_rules SET
                        pattern = COALESCE($2, pattern),
                        pronunciation = COALESCE($3, pronunciation),
                        description = COALESCE($4, description),
                        examples = COALESCE($5, examples),
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(patch.pattern.as_deref())
                .bind(patch.pronunciation.as_deref())
                .bind(patch.description.as_deref())
                .bind(patch.examples.as_deref())
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| DbError::not_found("pronunciation rule", id))
            })
            .await
            .map_err(|e| e.on_constraint(DUPLICATE, DUPLICATE))
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        self.db
            .run(move |mut conn| async move {
                let result = sqlx::query("DELETE FROM pronunciation_rules WHERE id = $1")
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(DbError::not_found("pronunciation rule", id));
                }
                Ok(())
            })
            .await
    }
}
