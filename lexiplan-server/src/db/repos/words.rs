//! Word repository
//!
//! Words are unique on `(lower(word), part_of_speech)`; deleting a word that
//! is still referenced by a token, a dictionary or a plan is refused.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};

use super::{like_pattern, paginate, search_term};
use crate::db::{Database, DbError};
use crate::models::{Paginated, Pagination, WordInput, WordPatch};

const DUPLICATE: &str = "a word with this spelling and part of speech already exists";
const IN_USE: &str = "word is still used by a sentence, dictionary or plan";

pub(crate) const WORD_COLUMNS: &str =
    "w.id, w.word, w.phonetic, w.part_of_speech, w.meaning, w.example, w.created_at, w.updated_at";

/// Word record from database
#[derive(Debug, Clone, FromRow)]
pub struct Word {
    pub id: i64,
    pub word: String,
    pub phonetic: Option<String>,
    pub part_of_speech: Option<String>,
    pub meaning: Option<String>,
    pub example: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List filter
#[derive(Debug, Clone, Copy, Default)]
pub struct WordFilter<'a> {
    /// Substring of the word or its meaning
    pub search: Option<&'a str>,
    /// Only words in this dictionary
    pub dictionary_id: Option<i64>,
}

/// Word repository
pub struct WordRepo<'a> {
    db: &'a Database,
}

impl<'a> WordRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: &WordInput) -> Result<Word, DbError> {
        self.db
            .run(move |mut conn| async move { insert(&mut *conn, input).await })
            .await
            .map_err(|e| e.on_constraint(DUPLICATE, IN_USE))
    }

    /// List words alphabetically.
    pub async fn list(
        &self,
        filter: WordFilter<'_>,
        page: Pagination,
    ) -> Result<Paginated<Word>, DbError> {
        let pattern = search_term(filter.search).map(like_pattern);
        let pattern = pattern.as_deref();
        self.db
            .run(move |mut conn| async move {
                let rows = sqlx::query(&format!(
                    r#"
                    SELECT {WORD_COLUMNS}, COUNT(*) OVER() AS total
                    FROM words w
                    WHERE ($1::text IS NULL OR w.word ILIKE $1 OR w.meaning ILIKE $1)
                      AND ($2::bigint IS NULL OR EXISTS (
                          SELECT 1 FROM dictionary_words dw
                          WHERE dw.word_id = w.id AND dw.dictionary_id = $2))
                    ORDER BY lower(w.word), w.id
                    LIMIT $3 OFFSET $4
                    "#
                ))
                .bind(pattern)
                .bind(filter.dictionary_id)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&mut *conn)
                .await?;
                paginate(&rows, page)
            })
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Word, DbError> {
        self.db
            .run(move |mut conn| async move {
                sqlx::query_as::<_, Word>(&format!("SELECT {WORD_COLUMNS} FROM words w WHERE w.id = $1"))
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?
                    .ok_or_else(|| DbError::not_found("word", id))
            })
            .await
    }

    /// Apply a partial update; absent fields keep their stored value.
    pub async fn update(&self, id: i64, patch: &WordPatch) -> Result<Word, DbError> {
        self.db
            .run(move |mut conn| async move {
                sqlx::query_as::<_, Word>(
                    r#"
                    UPDATE words w SET
                        word = COALESCE($2, word),
                        phonetic = COALESCE($3, phonetic),
                        part_of_speech = COALESCE($4, part_of_speech),
                        meaning = COALESCE($5, meaning),
                        example = COALESCE($6, example),
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING w.*
                    "#,
                )
                .bind(id)
                .bind(patch.word.as_deref())
                .bind(patch.phonetic.as_deref())
                .bind(patch.part_of_speech.as_deref())
                .bind(patch.meaning.as_deref())
                .bind(patch.example.as_deref())
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| DbError::not_found("word", id))
            })
            .await
            .map_err(|e| e.on_constraint(DUPLICATE, IN_USE))
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        self.db
            .run(move |mut conn| async move {
                let result = sqlx::query("DELETE FROM words WHERE id = $1")
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(DbError::not_found("word", id));
                }
                Ok(())
            })
            .await
            .map_err(|e| e.on_constraint(DUPLICATE, IN_USE))
    }
}

/// Insert a word on an open connection or transaction.
pub(crate) async fn insert(conn: &mut PgConnection, input: &WordInput) -> Result<Word, DbError> {
    let word = sqlx::query_as::<_, Word>(
        r#"
        INSERT INTO words (word, phonetic, part_of_speech, meaning, example)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, word, phonetic, part_of_speech, meaning, example, created_at, updated_at
        "#,
    )
    .bind(&input.word)
    .bind(input.phonetic.as_deref())
    .bind(input.part_of_speech.as_deref())
    .bind(input.meaning.as_deref())
    .bind(input.example.as_deref())
    .fetch_one(conn)
    .await?;
    Ok(word)
}
