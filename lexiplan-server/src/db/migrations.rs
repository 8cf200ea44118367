//! Schema migrations, run on startup
//!
//! Every statement is idempotent so the whole set can be re-run (and
//! retried by the executor) safely.

use super::error::DbError;
use super::Database;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS dictionaries (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        language TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS words (
        id BIGSERIAL PRIMARY KEY,
        word TEXT NOT NULL,
        phonetic TEXT,
        part_of_speech TEXT,
        meaning TEXT,
        example TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS dictionary_words (
        dictionary_id BIGINT NOT NULL REFERENCES dictionaries(id) ON DELETE RESTRICT,
        word_id BIGINT NOT NULL REFERENCES words(id) ON DELETE RESTRICT,
        added_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (dictionary_id, word_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pronunciation_rules (
        id BIGSERIAL PRIMARY KEY,
        pattern TEXT NOT NULL,
        pronunciation TEXT NOT NULL,
        description TEXT,
        examples TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (pattern, pronunciation)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sentences (
        id BIGSERIAL PRIMARY KEY,
        text TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sentence_tokens (
        sentence_id BIGINT NOT NULL REFERENCES sentences(id) ON DELETE CASCADE,
        position INTEGER NOT NULL CHECK (position >= 0),
        text TEXT NOT NULL,
        kind TEXT NOT NULL CHECK (kind IN ('word', 'punctuation')),
        word_id BIGINT REFERENCES words(id) ON DELETE RESTRICT,
        PRIMARY KEY (sentence_id, position)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS word_plans (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        daily_goal INTEGER NOT NULL DEFAULT 20 CHECK (daily_goal > 0),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS word_plan_items (
        plan_id BIGINT NOT NULL REFERENCES word_plans(id) ON DELETE CASCADE,
        word_id BIGINT NOT NULL REFERENCES words(id) ON DELETE RESTRICT,
        stage INTEGER NOT NULL DEFAULT 0,
        review_count INTEGER NOT NULL DEFAULT 0,
        next_review_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        last_reviewed_at TIMESTAMPTZ,
        added_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (plan_id, word_id)
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_words_word_pos ON words (lower(word), COALESCE(part_of_speech, ''))",
    "CREATE INDEX IF NOT EXISTS idx_dictionary_words_word ON dictionary_words(word_id)",
    "CREATE INDEX IF NOT EXISTS idx_sentences_created ON sentences(created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_sentence_tokens_word ON sentence_tokens(word_id) WHERE word_id IS NOT NULL",
    "CREATE INDEX IF NOT EXISTS idx_word_plan_items_due ON word_plan_items(plan_id, next_review_at)",
    "CREATE INDEX IF NOT EXISTS idx_word_plan_items_word ON word_plan_items(word_id)",
];

/// Create all tables and indexes.
pub async fn run(db: &Database) -> Result<(), DbError> {
    tracing::info!("Running migrations...");

    db.run(|mut conn| async move {
        for statement in TABLES.iter().chain(INDEXES) {
            sqlx::query(statement).execute(&mut *conn).await?;
        }
        Ok::<_, DbError>(())
    })
    .await?;

    tracing::info!(
        tables = TABLES.len(),
        indexes = INDEXES.len(),
        "Migrations complete"
    );
    Ok(())
}
