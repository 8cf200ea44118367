//! Word plan repository
//!
//! A plan is a set of words with a per-word review stage. Reviews follow
//! [`lexiplan_core::next_review`]; "due" items are those whose
//! `next_review_at` has passed.

use chrono::{DateTime, Utc};
use lexiplan_core::next_review;
use sqlx::{Connection, FromRow, PgConnection};

use super::{ensure_exists, like_pattern, paginate, search_term};
use crate::db::{Database, DbError};
use crate::models::plan::due_limit;
use crate::models::{Paginated, Pagination, PlanInput, PlanPatch};

const PLAN_COLUMNS: &str = r#"
    p.id, p.name, p.description, p.daily_goal, p.created_at, p.updated_at,
    (SELECT COUNT(*) FROM word_plan_items i WHERE i.plan_id = p.id) AS word_count,
    (SELECT COUNT(*) FROM word_plan_items i
        WHERE i.plan_id = p.id AND i.next_review_at <= NOW()) AS due_count
"#;

const ITEM_COLUMNS: &str = r#"
    i.plan_id, i.word_id, w.word, w.phonetic, w.meaning,
    i.stage, i.review_count, i.next_review_at, i.last_reviewed_at, i.added_at
"#;

/// Word plan with item counts
#[derive(Debug, Clone, FromRow)]
pub struct WordPlan {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub daily_goal: i32,
    pub word_count: i64,
    pub due_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Word inside a plan, with its review state
#[derive(Debug, Clone, FromRow)]
pub struct PlanItem {
    pub plan_id: i64,
    pub word_id: i64,
    pub word: String,
    pub phonetic: Option<String>,
    pub meaning: Option<String>,
    pub stage: i32,
    pub review_count: i32,
    pub next_review_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub added_at: DateTime<Utc>,
}

/// Word plan repository
pub struct WordPlanRepo<'a> {
    db: &'a Database,
}

impl<'a> WordPlanRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: &PlanInput) -> Result<WordPlan, DbError> {
        self.db
            .run(move |mut conn| async move {
                let id: i64 = sqlx::query_scalar(
                    "INSERT INTO word_plans (name, description, daily_goal) VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(&input.name)
                .bind(input.description.as_deref())
                .bind(input.daily_goal)
                .fetch_one(&mut *conn)
                .await?;
                fetch_plan(&mut *conn, id).await
            })
            .await
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<Paginated<WordPlan>, DbError> {
        let pattern = search_term(search).map(like_pattern);
        let pattern = pattern.as_deref();
        self.db
            .run(move |mut conn| async move {
                let rows = sqlx::query(&format!(
                    r#"
                    SELECT {PLAN_COLUMNS}, COUNT(*) OVER() AS total
                    FROM word_plans p
                    WHERE ($1::text IS NULL OR p.name ILIKE $1 OR p.description ILIKE $1)
                    ORDER BY p.created_at DESC, p.id DESC
                    LIMIT $2 OFFSET $3
                    "#
                ))
                .bind(pattern)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&mut *conn)
                .await?;
                paginate(&rows, page)
            })
            .await
    }

    pub async fn get(&self, id: i64) -> Result<WordPlan, DbError> {
        self.db
            .run(move |mut conn| async move { fetch_plan(&mut *conn, id).await })
            .await
    }

    pub async fn update(&self, id: i64, patch: &PlanPatch) -> Result<WordPlan, DbError> {
        self.db
            .run(move |mut conn| async move {
                let result = sqlx::query(
                    r#"
                    UPDATE word_plans SET
                        name = COALESCE($2, name),
                        description = COALESCE($3, description),
                        daily_goal = COALESCE($4, daily_goal),
                        updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(patch.name.as_deref())
                .bind(patch.description.as_deref())
                .bind(patch.daily_goal)
                .execute(&mut *conn)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(DbError::not_found("word plan", id));
                }
                fetch_plan(&mut *conn, id).await
            })
            .await
    }

    /// Delete a plan together with its items.
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        self.db
            .run(move |mut conn| async move {
                let result = sqlx::query("DELETE FROM word_plans WHERE id = $1")
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(DbError::not_found("word plan", id));
                }
                Ok(())
            })
            .await
    }

    pub async fn add_word(&self, plan_id: i64, word_id: i64) -> Result<PlanItem, DbError> {
        self.db
            .run(move |mut conn| async move {
                ensure_exists(&mut *conn, "word_plans", "word plan", plan_id).await?;
                ensure_exists(&mut *conn, "words", "word", word_id).await?;
                sqlx::query("INSERT INTO word_plan_items (plan_id, word_id) VALUES ($1, $2)")
                    .bind(plan_id)
                    .bind(word_id)
                    .execute(&mut *conn)
                    .await?;
                fetch_item(&mut *conn, plan_id, word_id).await
            })
            .await
            .map_err(|e| e.on_constraint("word is already in this plan", "plan or word no longer exists"))
    }

    /// Add every word of a dictionary, skipping words already in the plan.
    ///
    /// Returns the number of words added.
    pub async fn add_dictionary(&self, plan_id: i64, dictionary_id: i64) -> Result<u64, DbError> {
        self.db
            .run(move |mut conn| async move {
                ensure_exists(&mut *conn, "word_plans", "word plan", plan_id).await?;
                ensure_exists(&mut *conn, "dictionaries", "dictionary", dictionary_id).await?;
                let result = sqlx::query(
                    r#"
                    INSERT INTO word_plan_items (plan_id, word_id)
                    SELECT $1, dw.word_id FROM dictionary_words dw WHERE dw.dictionary_id = $2
                    ON CONFLICT (plan_id, word_id) DO NOTHING
                    "#,
                )
                .bind(plan_id)
                .bind(dictionary_id)
                .execute(&mut *conn)
                .await?;
                Ok(result.rows_affected())
            })
            .await
    }

    pub async fn remove_word(&self, plan_id: i64, word_id: i64) -> Result<(), DbError> {
        self.db
            .run(move |mut conn| async move {
                let result =
                    sqlx::query("DELETE FROM word_plan_items WHERE plan_id = $1 AND word_id = $2")
                        .bind(plan_id)
                        .bind(word_id)
                        .execute(&mut *conn)
                        .await?;
                if result.rows_affected() == 0 {
                    return Err(DbError::not_found("plan word", format!("{plan_id}/{word_id}")));
                }
                Ok(())
            })
            .await
    }

    /// Words of a plan, most recently added first.
    pub async fn words(&self, plan_id: i64, page: Pagination) -> Result<Paginated<PlanItem>, DbError> {
        self.db
            .run(move |mut conn| async move {
                ensure_exists(&mut *conn, "word_plans", "word plan", plan_id).await?;
                let rows = sqlx::query(&format!(
                    r#"
                    SELECT {ITEM_COLUMNS}, COUNT(*) OVER() AS total
                    FROM word_plan_items i
                    JOIN words w ON w.id = i.word_id
                    WHERE i.plan_id = $1
                    ORDER BY i.added_at DESC, i.word_id DESC
                    LIMIT $2 OFFSET $3
                    "#
                ))
                .bind(plan_id)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&mut *conn)
                .await?;
                paginate(&rows, page)
            })
            .await
    }

    /// Items due for review, oldest due first.
    ///
    /// `limit` defaults to the plan's daily goal.
    pub async fn due(&self, plan_id: i64, limit: Option<u32>) -> Result<Vec<PlanItem>, DbError> {
        self.db
            .run(move |mut conn| async move {
                let plan = fetch_plan(&mut *conn, plan_id).await?;
                let items = sqlx::query_as::<_, PlanItem>(&format!(
                    r#"
                    SELECT {ITEM_COLUMNS}
                    FROM word_plan_items i
                    JOIN words w ON w.id = i.word_id
                    WHERE i.plan_id = $1 AND i.next_review_at <= NOW()
                    ORDER BY i.next_review_at, i.word_id
                    LIMIT $2
                    "#
                ))
                .bind(plan_id)
                .bind(due_limit(limit, plan.daily_goal))
                .fetch_all(&mut *conn)
                .await?;
                Ok(items)
            })
            .await
    }

    /// Record a review and schedule the next one.
    pub async fn review(
        &self,
        plan_id: i64,
        word_id: i64,
        remembered: bool,
    ) -> Result<PlanItem, DbError> {
        self.db
            .run(move |mut conn| async move {
                let mut tx = conn.begin().await?;
                let stage: i32 = sqlx::query_scalar(
                    "SELECT stage FROM word_plan_items WHERE plan_id = $1 AND word_id = $2 FOR UPDATE",
                )
                .bind(plan_id)
                .bind(word_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("plan word", format!("{plan_id}/{word_id}")))?;

                let now = Utc::now();
                let outcome = next_review(u32::try_from(stage).unwrap_or(0), remembered, now);
                sqlx::query(
                    r#"
                    UPDATE word_plan_items SET
                        stage = $3,
                        review_count = review_count + 1,
                        next_review_at = $4,
                        last_reviewed_at = $5
                    WHERE plan_id = $1 AND word_id = $2
                    "#,
                )
                .bind(plan_id)
                .bind(word_id)
                .bind(outcome.stage as i32)
                .bind(outcome.next_review_at)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                let item = fetch_item(&mut *tx, plan_id, word_id).await?;
                tx.commit().await?;

                tracing::debug!(
                    plan_id,
                    word_id,
                    remembered,
                    stage = outcome.stage,
                    mastered = outcome.mastered,
                    "review recorded"
                );
                Ok(item)
            })
            .await
    }
}

async fn fetch_plan(conn: &mut PgConnection, id: i64) -> Result<WordPlan, DbError> {
    sqlx::query_as::<_, WordPlan>(&format!("SELECT {PLAN_COLUMNS} FROM word_plans p WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::not_found("word plan", id))
}

async fn fetch_item(conn: &mut PgConnection, plan_id: i64, word_id: i64) -> Result<PlanItem, DbError> {
    sqlx::query_as::<_, PlanItem>(&format!(
        r#"
        SELECT {ITEM_COLUMNS}
        FROM word_plan_items i
        JOIN words w ON w.id = i.word_id
        WHERE i.plan_id = $1 AND i.word_id = $2
        "#
    ))
    .bind(plan_id)
    .bind(word_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| DbError::not_found("plan word", format!("{plan_id}/{word_id}")))
}
