//! Sentence/token store
//!
//! A sentence owns an ordered list of tokens with dense positions 0..N-1.
//! Each token may point at a word; that link is the only mutable part of a
//! stored sentence.
//!
//! Reads always come back with tokens and word summaries. Lists load all
//! tokens of a page with one extra query (no N+1).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use lexiplan_core::TokenKind;
use sqlx::postgres::PgRow;
use sqlx::{Connection, FromRow, PgConnection, Row};

use super::{ensure_exists, like_pattern, paginate, search_term, Conn};
use crate::db::{Database, DbError};
use crate::models::{NewToken, Paginated, Pagination, SentenceText};

/// Summary of the word a token points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRef {
    pub id: i64,
    pub word: String,
    pub phonetic: Option<String>,
    pub meaning: Option<String>,
}

/// Stored token with its resolved word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceToken {
    pub position: i32,
    pub text: String,
    pub kind: TokenKind,
    pub word_id: Option<i64>,
    pub word: Option<WordRef>,
}

/// Sentence with its tokens in position order
#[derive(Debug, Clone)]
pub struct Sentence {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub tokens: Vec<SentenceToken>,
}

#[derive(Debug, FromRow)]
struct SentenceRow {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
}

/// Sentence repository
pub struct SentenceRepo<'a> {
    db: &'a Database,
}

impl<'a> SentenceRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Store a sentence and its tokens (atomic).
    ///
    /// Every referenced word must exist.
    pub async fn create(&self, text: &SentenceText, tokens: &[NewToken]) -> Result<Sentence, DbError> {
        let sentence = self
            .db
            .run(move |conn| insert_sentence(conn, text, tokens))
            .await?;
        tracing::debug!(
            sentence_id = sentence.id,
            tokens = sentence.tokens.len(),
            "sentence created"
        );
        Ok(sentence)
    }

    /// List sentences, newest first.
    ///
    /// With `search`, only sentences containing it (case-insensitive), the
    /// earliest match first.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<Paginated<Sentence>, DbError> {
        let search = search_term(search);
        self.db
            .run(move |conn| list_sentences(conn, search, page))
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Sentence, DbError> {
        self.db
            .run(move |mut conn| async move {
                let row = sqlx::query_as::<_, SentenceRow>(
                    "SELECT id, text, created_at FROM sentences WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| DbError::not_found("sentence", id))?;
                let mut sentences = attach_tokens(&mut *conn, vec![row]).await?;
                sentences
                    .pop()
                    .ok_or_else(|| DbError::not_found("sentence", id))
            })
            .await
    }

    /// Delete a sentence and its tokens.
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        self.db
            .run(move |mut conn| async move {
                let result = sqlx::query("DELETE FROM sentences WHERE id = $1")
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(DbError::not_found("sentence", id));
                }
                Ok(())
            })
            .await
    }

    /// Point a token at a word, or clear the link with `None`.
    pub async fn update_token_word(
        &self,
        sentence_id: i64,
        position: i32,
        word_id: Option<i64>,
    ) -> Result<SentenceToken, DbError> {
        self.db
            .run(move |conn| set_token_word(conn, sentence_id, position, word_id))
            .await
            .map_err(|e| e.on_constraint("token already exists", "word no longer exists"))
    }

    /// Every sentence with a token linked to `word_id`, newest first.
    pub async fn sentences_for_word(&self, word_id: i64) -> Result<Vec<Sentence>, DbError> {
        self.db
            .run(move |mut conn| async move {
                ensure_exists(&mut *conn, "words", "word", word_id).await?;
                let rows = sqlx::query_as::<_, SentenceRow>(
                    r#"
                    SELECT s.id, s.text, s.created_at
                    FROM sentences s
                    WHERE EXISTS (
                        SELECT 1 FROM sentence_tokens t
                        WHERE t.sentence_id = s.id AND t.word_id = $1)
                    ORDER BY s.created_at DESC, s.id DESC
                    "#,
                )
                .bind(word_id)
                .fetch_all(&mut *conn)
                .await?;
                attach_tokens(&mut *conn, rows).await
            })
            .await
    }
}

async fn insert_sentence(
    mut conn: Conn,
    text: &SentenceText,
    tokens: &[NewToken],
) -> Result<Sentence, DbError> {
    let mut tx = conn.begin().await?;

    let word_ids: Vec<i64> = tokens
        .iter()
        .filter_map(|t| t.word_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if !word_ids.is_empty() {
        let found: HashSet<i64> =
            sqlx::query_scalar::<_, i64>("SELECT id FROM words WHERE id = ANY($1)")
                .bind(&word_ids)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();
        if let Some(missing) = word_ids.iter().copied().filter(|id| !found.contains(id)).min() {
            return Err(DbError::not_found("word", missing));
        }
    }

    let row = sqlx::query_as::<_, SentenceRow>(
        "INSERT INTO sentences (text) VALUES ($1) RETURNING id, text, created_at",
    )
    .bind(text.as_str())
    .fetch_one(&mut *tx)
    .await?;

    for token in tokens {
        sqlx::query(
            r#"
            INSERT INTO sentence_tokens (sentence_id, position, text, kind, word_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(row.id)
        .bind(token.position)
        .bind(&token.text)
        .bind(token.kind.as_str())
        .bind(token.word_id)
        .execute(&mut *tx)
        .await?;
    }

    let id = row.id;
    let mut sentences = attach_tokens(&mut *tx, vec![row]).await?;
    tx.commit().await?;
    sentences.pop().ok_or_else(|| DbError::not_found("sentence", id))
}

async fn list_sentences(
    mut conn: Conn,
    search: Option<&str>,
    page: Pagination,
) -> Result<Paginated<Sentence>, DbError> {
    let pattern = search.map(like_pattern);
    let rows = sqlx::query(
        r#"
        SELECT id, text, created_at, COUNT(*) OVER() AS total
        FROM sentences
        WHERE ($1::text IS NULL OR text ILIKE $2)
        ORDER BY
            CASE WHEN $1::text IS NULL THEN 0 ELSE strpos(lower(text), lower($1)) END,
            created_at DESC,
            id DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(search)
    .bind(pattern.as_deref())
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;

    let rows = paginate::<SentenceRow>(&rows, page)?;
    let sentences = attach_tokens(&mut *conn, rows.items).await?;
    Ok(page.wrap(sentences, rows.total))
}

async fn set_token_word(
    mut conn: Conn,
    sentence_id: i64,
    position: i32,
    word_id: Option<i64>,
) -> Result<SentenceToken, DbError> {
    if let Some(word_id) = word_id {
        ensure_exists(&mut *conn, "words", "word", word_id).await?;
    }

    let row = sqlx::query(
        r#"
        WITH updated AS (
            UPDATE sentence_tokens SET word_id = $3
            WHERE sentence_id = $1 AND position = $2
            RETURNING sentence_id, position, text, kind, word_id
        )
        SELECT u.sentence_id, u.position, u.text, u.kind, u.word_id,
               w.word, w.phonetic, w.meaning
        FROM updated u
        LEFT JOIN words w ON w.id = u.word_id
        "#,
    )
    .bind(sentence_id)
    .bind(position)
    .bind(word_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(token_from_row(&row)?.1),
        None => {
            ensure_exists(&mut *conn, "sentences", "sentence", sentence_id).await?;
            Err(DbError::not_found("token", format!("{sentence_id}/{position}")))
        }
    }
}

/// Load the tokens of `rows` with one query and assemble sentences.
async fn attach_tokens(
    conn: &mut PgConnection,
    rows: Vec<SentenceRow>,
) -> Result<Vec<Sentence>, DbError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let token_rows = sqlx::query(
        r#"
        SELECT t.sentence_id, t.position, t.text, t.kind, t.word_id,
               w.word, w.phonetic, w.meaning
        FROM sentence_tokens t
        LEFT JOIN words w ON w.id = t.word_id
        WHERE t.sentence_id = ANY($1)
        ORDER BY t.sentence_id, t.position
        "#,
    )
    .bind(&ids)
    .fetch_all(conn)
    .await?;

    let mut tokens: HashMap<i64, Vec<SentenceToken>> = HashMap::with_capacity(rows.len());
    for row in &token_rows {
        let (sentence_id, token) = token_from_row(row)?;
        tokens.entry(sentence_id).or_default().push(token);
    }

    Ok(rows
        .into_iter()
        .map(|row| Sentence {
            tokens: tokens.remove(&row.id).unwrap_or_default(),
            id: row.id,
            text: row.text,
            created_at: row.created_at,
        })
        .collect())
}

fn token_from_row(row: &PgRow) -> Result<(i64, SentenceToken), DbError> {
    let kind: String = row.try_get("kind")?;
    let kind = TokenKind::parse(&kind).ok_or_else(|| {
        DbError::Sqlx(sqlx::Error::Decode(
            format!("unknown token kind '{kind}'").into(),
        ))
    })?;
    let word_id: Option<i64> = row.try_get("word_id")?;
    let word = match (word_id, row.try_get::<Option<String>, _>("word")?) {
        (Some(id), Some(word)) => Some(WordRef {
            id,
            word,
            phonetic: row.try_get("phonetic")?,
            meaning: row.try_get("meaning")?,
        }),
        _ => None,
    };

    Ok((
        row.try_get("sentence_id")?,
        SentenceToken {
            position: row.try_get("position")?,
            text: row.try_get("text")?,
            kind,
            word_id,
            word,
        },
    ))
}
