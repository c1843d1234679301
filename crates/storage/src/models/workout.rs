use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Workout {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub workout_date: chrono::NaiveDate,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

/// One row of the recent-history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WorkoutSummary {
    pub id: i64,
    pub name: String,
    pub date: chrono::NaiveDate,
    pub exercise_count: i64,
}
