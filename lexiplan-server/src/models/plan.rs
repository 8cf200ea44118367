//! Word plan input validation

use super::validation::{optional_text, required_text, ValidationError};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 1000;
/// Default number of reviews offered per day
pub const DEFAULT_DAILY_GOAL: i32 = 20;
const MAX_DAILY_GOAL: i32 = 500;

/// Validated plan fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanInput {
    pub name: String,
    pub description: Option<String>,
    pub daily_goal: i32,
}

impl PlanInput {
    pub fn new(
        name: &str,
        description: Option<&str>,
        daily_goal: Option<i32>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", name, MAX_NAME_LEN)?,
            description: optional_text("description", description, MAX_DESCRIPTION_LEN)?,
            daily_goal: daily_goal_in_range(daily_goal.unwrap_or(DEFAULT_DAILY_GOAL))?,
        })
    }
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub daily_goal: Option<i32>,
}

impl PlanPatch {
    pub fn new(
        name: Option<&str>,
        description: Option<&str>,
        daily_goal: Option<i32>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            name: name
                .map(|n| required_text("name", n, MAX_NAME_LEN))
                .transpose()?,
            description: optional_text("description", description, MAX_DESCRIPTION_LEN)?,
            daily_goal: daily_goal.map(daily_goal_in_range).transpose()?,
        })
    }
}

/// Number of due items to return; defaults to the plan's daily goal.
pub fn due_limit(limit: Option<u32>, daily_goal: i32) -> i64 {
    match limit {
        Some(limit) => i64::from(limit.clamp(1, MAX_DAILY_GOAL as u32)),
        None => i64::from(daily_goal.max(1)),
    }
}

fn daily_goal_in_range(goal: i32) -> Result<i32, ValidationError> {
    if !(1..=MAX_DAILY_GOAL).contains(&goal) {
        return Err(ValidationError::OutOfRange {
            field: "daily_goal",
            min: 1,
            max: i64::from(MAX_DAILY_GOAL),
        });
    }
    Ok(goal)
}
