use chrono::NaiveDate;
use sqlx::{Connection, PgConnection, Postgres, Transaction};

use crate::dto::workout::{
    ExerciseDraft, ExerciseResponse, MAX_RECENT_WORKOUTS, WorkoutDetail, WorkoutDraft,
};
use crate::error::Result;
use crate::models::{Exercise, Workout, WorkoutSummary};

/// Repository for Workout and Exercise database operations
pub struct WorkoutRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> WorkoutRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Find the workout a user logged on `date`
    pub async fn find_by_date(&mut self, user_id: i64, date: NaiveDate) -> Result<Option<Workout>> {
        let workout = sqlx::query_as::<_, Workout>(
            r#"
            SELECT id, user_id, name, workout_date, created_at, updated_at
            FROM workouts
            WHERE user_id = $1 AND workout_date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(workout)
    }

    /// Exercises of a workout in display order. Ties on position fall back
    /// to insertion order.
    pub async fn exercises(&mut self, workout_id: i64) -> Result<Vec<Exercise>> {
        let exercises = sqlx::query_as::<_, Exercise>(
            r#"
            SELECT id, workout_id, name, sets, reps, weight, notes, position
            FROM exercises
            WHERE workout_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(workout_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(exercises)
    }

    /// Get a day's workout together with its ordered exercises
    pub async fn find_detailed_by_date(
        &mut self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<WorkoutDetail>> {
        let Some(workout) = self.find_by_date(user_id, date).await? else {
            return Ok(None);
        };

        let exercises = self.exercises(workout.id).await?;

        Ok(Some(WorkoutDetail {
            id: workout.id,
            name: workout.name,
            date: workout.workout_date,
            exercises: exercises.into_iter().map(ExerciseResponse::from).collect(),
        }))
    }

    /// Most recent workouts first, with their exercise counts
    pub async fn list_recent(&mut self, user_id: i64) -> Result<Vec<WorkoutSummary>> {
        let workouts = sqlx::query_as::<_, WorkoutSummary>(
            r#"
            SELECT w.id, w.name, w.workout_date AS date,
                   COUNT(e.id) AS exercise_count
            FROM workouts w
            LEFT JOIN exercises e ON e.workout_id = w.id
            WHERE w.user_id = $1
            GROUP BY w.id, w.name, w.workout_date
            ORDER BY w.workout_date DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(MAX_RECENT_WORKOUTS)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(workouts)
    }

    /// Replace the workout of `draft.date` and its whole exercise list.
    ///
    /// Upsert, delete and inserts share one transaction; nothing is visible
    /// unless every step succeeds.
    pub async fn replace(&mut self, user_id: i64, draft: &WorkoutDraft) -> Result<i64> {
        let mut tx = self.conn.begin().await?;

        match Self::write_replacement(&mut tx, user_id, draft).await {
            Ok(workout_id) => {
                tx.commit().await?;
                Ok(workout_id)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback of workout replace failed");
                }
                Err(e)
            }
        }
    }

    async fn write_replacement(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        draft: &WorkoutDraft,
    ) -> Result<i64> {
        let workout_id = Self::upsert_workout(tx, user_id, &draft.name, draft.date).await?;

        let deleted = sqlx::query("DELETE FROM exercises WHERE workout_id = $1")
            .bind(workout_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        for (position, exercise) in draft.exercises.iter().enumerate() {
            Self::insert_exercise(tx, workout_id, exercise, position as i32).await?;
        }

        tracing::debug!(
            workout_id,
            deleted,
            inserted = draft.exercises.len(),
            "Replaced workout exercises"
        );

        Ok(workout_id)
    }

    async fn upsert_workout(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        name: &str,
        date: NaiveDate,
    ) -> Result<i64> {
        let workout_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO workouts (user_id, name, workout_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, workout_date)
            DO UPDATE SET name = EXCLUDED.name, updated_at = CURRENT_TIMESTAMP
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(date)
        .fetch_one(&mut **tx)
        .await?;

        Ok(workout_id)
    }

    async fn insert_exercise(
        tx: &mut Transaction<'_, Postgres>,
        workout_id: i64,
        exercise: &ExerciseDraft,
        position: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO exercises (workout_id, name, sets, reps, weight, notes, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(workout_id)
        .bind(&exercise.name)
        .bind(exercise.sets)
        .bind(exercise.reps)
        .bind(exercise.weight)
        .bind(&exercise.notes)
        .bind(position)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
