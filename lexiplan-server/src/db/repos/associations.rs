//! Dictionary/word associations
//!
//! Covers both the association resource and the dictionary-scoped word
//! listing, including creating a word directly inside a dictionary.

use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow};

use super::words::{self, Word, WORD_COLUMNS};
use super::{ensure_exists, like_pattern, paginate, search_term};
use crate::db::{Database, DbError};
use crate::models::{Paginated, Pagination, WordInput};

const DUPLICATE: &str = "word is already in this dictionary";
const DUPLICATE_WORD: &str = "a word with this spelling and part of speech already exists";

/// Association row
#[derive(Debug, Clone, FromRow)]
pub struct DictionaryWord {
    pub dictionary_id: i64,
    pub word_id: i64,
    pub added_at: DateTime<Utc>,
}

/// Dictionary containing a given word
#[derive(Debug, Clone, FromRow)]
pub struct WordDictionary {
    pub id: i64,
    pub name: String,
    pub language: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// Association repository
pub struct AssociationRepo<'a> {
    db: &'a Database,
}

impl<'a> AssociationRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Associate an existing word with an existing dictionary.
    pub async fn associate(&self, dictionary_id: i64, word_id: i64) -> Result<DictionaryWord, DbError> {
        self.db
            .run(move |mut conn| async move {
                ensure_exists(&mut *conn, "dictionaries", "dictionary", dictionary_id).await?;
                ensure_exists(&mut *conn, "words", "word", word_id).await?;
                let association = sqlx::query_as::<_, DictionaryWord>(
                    r#"
                    INSERT INTO dictionary_words (dictionary_id, word_id)
                    VALUES ($1, $2)
                    RETURNING dictionary_id, word_id, added_at
                    "#,
                )
                .bind(dictionary_id)
                .bind(word_id)
                .fetch_one(&mut *conn)
                .await?;
                Ok(association)
            })
            .await
            .map_err(|e| e.on_constraint(DUPLICATE, "dictionary or word no longer exists"))
    }

    pub async fn dissociate(&self, dictionary_id: i64, word_id: i64) -> Result<(), DbError> {
        self.db
            .run(move |mut conn| async move {
                let result = sqlx::query(
                    "DELETE FROM dictionary_words WHERE dictionary_id = $1 AND word_id = $2",
                )
                .bind(dictionary_id)
                .bind(word_id)
                .execute(&mut *conn)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(DbError::not_found(
                        "association",
                        format!("{dictionary_id}/{word_id}"),
                    ));
                }
                Ok(())
            })
            .await
    }

    /// Dictionaries containing `word_id`, by name.
    pub async fn dictionaries_for_word(&self, word_id: i64) -> Result<Vec<WordDictionary>, DbError> {
        self.db
            .run(move |mut conn| async move {
                ensure_exists(&mut *conn, "words", "word", word_id).await?;
                let dictionaries = sqlx::query_as::<_, WordDictionary>(
                    r#"
                    SELECT d.id, d.name, d.language, dw.added_at
                    FROM dictionary_words dw
                    JOIN dictionaries d ON d.id = dw.dictionary_id
                    WHERE dw.word_id = $1
                    ORDER BY d.name
                    "#,
                )
                .bind(word_id)
                .fetch_all(&mut *conn)
                .await?;
                Ok(dictionaries)
            })
            .await
    }

    /// Words of a dictionary, most recently added first.
    pub async fn words_in_dictionary(
        &self,
        dictionary_id: i64,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<Paginated<Word>, DbError> {
        let pattern = search_term(search).map(like_pattern);
        let pattern = pattern.as_deref();
        self.db
            .run(move |mut conn| async move {
                ensure_exists(&mut *conn, "dictionaries", "dictionary", dictionary_id).await?;
                let rows = sqlx::query(&format!(
                    r#"
                    SELECT {WORD_COLUMNS}, COUNT(*) OVER() AS total
                    FROM dictionary_words dw
                    JOIN words w ON w.id = dw.word_id
                    WHERE dw.dictionary_id = $1
                      AND ($2::text IS NULL OR w.word ILIKE $2 OR w.meaning ILIKE $2)
                    ORDER BY dw.added_at DESC, w.id DESC
                    LIMIT $3 OFFSET $4
                    "#
                ))
                .bind(dictionary_id)
                .bind(pattern)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&mut *conn)
                .await?;
                paginate(&rows, page)
            })
            .await
    }

    /// Create a word and add it to a dictionary (atomic).
    pub async fn create_word_in_dictionary(
        &self,
        dictionary_id: i64,
        input: &WordInput,
    ) -> Result<Word, DbError> {
        self.db
            .run(move |mut conn| async move {
                let mut tx = conn.begin().await?;
                ensure_exists(&mut *tx, "dictionaries", "dictionary", dictionary_id).await?;
                let word = words::insert(&mut *tx, input).await?;
                sqlx::query("INSERT INTO dictionary_words (dictionary_id, word_id) VALUES ($1, $2)")
                    .bind(dictionary_id)
                    .bind(word.id)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                tracing::debug!(dictionary_id, word_id = word.id, "word created in dictionary");
                Ok(word)
            })
            .await
            .map_err(|e| e.on_constraint(DUPLICATE_WORD, "dictionary no longer exists"))
    }
}
