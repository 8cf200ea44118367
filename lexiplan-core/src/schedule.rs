//! Spaced-review schedule for word plans
//!
//! A plan item's `stage` counts consecutive successful reviews. Each stage
//! maps to the wait before the next review; reaching [`MASTERED_STAGE`]
//! marks the word as mastered (it keeps the longest interval).

use chrono::{DateTime, Duration, Utc};

/// Days to wait after reaching stage `i + 1`.
pub const REVIEW_INTERVALS_DAYS: [i64; 6] = [1, 2, 4, 7, 15, 30];

/// Stage at which a word counts as mastered.
pub const MASTERED_STAGE: u32 = REVIEW_INTERVALS_DAYS.len() as u32;

/// Result of applying one review to a plan item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub stage: u32,
    pub next_review_at: DateTime<Utc>,
    pub mastered: bool,
}

/// Apply a review at `now`.
///
/// Remembering moves one stage up (capped at [`MASTERED_STAGE`]);
/// forgetting resets to stage 0 and brings the word back the next day.
pub fn next_review(stage: u32, remembered: bool, now: DateTime<Utc>) -> ReviewOutcome {
    let stage = if remembered {
        stage.saturating_add(1).min(MASTERED_STAGE)
    } else {
        0
    };

    ReviewOutcome {
        stage,
        next_review_at: now + Duration::days(interval_days(stage)),
        mastered: stage == MASTERED_STAGE,
    }
}

fn interval_days(stage: u32) -> i64 {
    let index = stage.saturating_sub(1) as usize;
    REVIEW_INTERVALS_DAYS[index.min(REVIEW_INTERVALS_DAYS.len() - 1)]
}
