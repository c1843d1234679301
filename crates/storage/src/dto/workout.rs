use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{Exercise, WorkoutSummary};

/// Name given to workouts submitted without one.
pub const DEFAULT_WORKOUT_NAME: &str = "Новая тренировка";

/// Wire format of workout dates.
pub const WORKOUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Upper bound on the recent-history list. There is no continuation.
pub const MAX_RECENT_WORKOUTS: i64 = 50;

/// Query string of the read endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct WorkoutQuery {
    /// Date in `YYYY-MM-DD`; omit to list recent workouts
    pub date: Option<String>,
}

/// Request payload for creating or replacing the workout of a given date.
///
/// Every field may be omitted except `date`; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct WorkoutPayload {
    /// Falls back to [`DEFAULT_WORKOUT_NAME`] when absent or empty.
    pub name: Option<String>,

    #[validate(
        required(message = "Workout date is required"),
        custom(function = "validate_workout_date")
    )]
    #[schema(example = "2024-01-10")]
    pub date: Option<String>,

    /// Full replacement list; absent means no exercises.
    pub exercises: Option<Vec<ExercisePayload>>,
}

/// One submitted exercise. Absent (or null) fields default to an empty
/// string for text and zero for numbers.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ExercisePayload {
    pub name: Option<String>,
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    #[schema(value_type = Option<f64>)]
    pub weight: Option<Decimal>,
    pub notes: Option<String>,
}

/// A validated write, ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutDraft {
    pub name: String,
    pub date: NaiveDate,
    pub exercises: Vec<ExerciseDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseDraft {
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    pub weight: Decimal,
    pub notes: String,
}

impl WorkoutPayload {
    /// Validates the payload and applies the documented defaults.
    pub fn into_draft(self) -> Result<WorkoutDraft, ValidationErrors> {
        self.validate()?;

        let Some(date) = self.date.as_deref().and_then(|d| parse_workout_date(d).ok()) else {
            let mut errors = ValidationErrors::new();
            errors.add("date", missing_date_error());
            return Err(errors);
        };

        let name = self
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_WORKOUT_NAME.to_string());

        let exercises = self
            .exercises
            .unwrap_or_default()
            .into_iter()
            .map(ExerciseDraft::from)
            .collect();

        Ok(WorkoutDraft {
            name,
            date,
            exercises,
        })
    }
}

impl From<ExercisePayload> for ExerciseDraft {
    fn from(payload: ExercisePayload) -> Self {
        Self {
            name: payload.name.unwrap_or_default(),
            sets: payload.sets.unwrap_or(0),
            reps: payload.reps.unwrap_or(0),
            weight: payload.weight.unwrap_or(Decimal::ZERO),
            notes: payload.notes.unwrap_or_default(),
        }
    }
}

pub fn parse_workout_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, WORKOUT_DATE_FORMAT)
}

fn missing_date_error() -> ValidationError {
    let mut error = ValidationError::new("required");
    error.message = Some("Workout date is required".into());
    error
}

fn validate_workout_date(date: &str) -> Result<(), ValidationError> {
    if date.is_empty() {
        return Err(missing_date_error());
    }

    if parse_workout_date(date).is_err() {
        let mut error = ValidationError::new("invalid_date");
        error.message = Some("Workout date must be formatted as YYYY-MM-DD".into());
        return Err(error);
    }

    Ok(())
}

/// Exercise as returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExerciseResponse {
    pub id: i64,
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub weight: Decimal,
    pub notes: String,
    pub position: i32,
}

impl From<Exercise> for ExerciseResponse {
    fn from(exercise: Exercise) -> Self {
        Self {
            id: exercise.id,
            name: exercise.name,
            sets: exercise.sets,
            reps: exercise.reps,
            weight: exercise.weight,
            notes: exercise.notes,
            position: exercise.position,
        }
    }
}

/// A single day's workout with its exercises in display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkoutDetail {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub exercises: Vec<ExerciseResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkoutByDateResponse {
    pub workout: Option<WorkoutDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkoutListResponse {
    pub workouts: Vec<WorkoutSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaveWorkoutResponse {
    pub success: bool,
    pub workout_id: i64,
}

impl SaveWorkoutResponse {
    pub fn saved(workout_id: i64) -> Self {
        Self {
            success: true,
            workout_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> WorkoutPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let draft = payload(r#"{"date": "2024-01-10", "exercises": [{}]}"#)
            .into_draft()
            .unwrap();

        assert_eq!(draft.name, DEFAULT_WORKOUT_NAME);
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(
            draft.exercises,
            vec![ExerciseDraft {
                name: String::new(),
                sets: 0,
                reps: 0,
                weight: Decimal::ZERO,
                notes: String::new(),
            }]
        );
    }

    #[test]
    fn test_empty_name_uses_placeholder() {
        let draft = payload(r#"{"name": "", "date": "2024-01-10"}"#)
            .into_draft()
            .unwrap();
        assert_eq!(draft.name, DEFAULT_WORKOUT_NAME);
        assert!(draft.exercises.is_empty());
    }

    #[test]
    fn test_null_fields_default() {
        let draft = payload(
            r#"{"name": null, "date": "2024-01-10", "exercises": [{"name": "Squat", "notes": null, "weight": 62.5}]}"#,
        )
        .into_draft()
        .unwrap();

        let exercise = &draft.exercises[0];
        assert_eq!(exercise.name, "Squat");
        assert_eq!(exercise.notes, "");
        assert_eq!(exercise.weight, Decimal::new(625, 1));
    }

    #[test]
    fn test_client_ids_are_ignored() {
        let draft = payload(
            r#"{"id": "abc", "date": "2024-01-10", "exercises": [{"id": "x1", "name": "Row", "sets": 4, "reps": 8}]}"#,
        )
        .into_draft()
        .unwrap();
        assert_eq!(draft.exercises[0].sets, 4);
        assert_eq!(draft.exercises[0].reps, 8);
    }

    #[test]
    fn test_missing_date_rejected() {
        let errors = payload(r#"{"name": "Legs"}"#).into_draft().unwrap_err();
        assert!(errors.field_errors().contains_key("date"));
    }

    #[test]
    fn test_empty_date_rejected() {
        let errors = payload(r#"{"date": ""}"#).into_draft().unwrap_err();
        let field_errors = errors.field_errors();
        assert_eq!(field_errors["date"][0].code, "required");
    }

    #[test]
    fn test_malformed_date_rejected() {
        let errors = payload(r#"{"date": "10.01.2024"}"#).into_draft().unwrap_err();
        let field_errors = errors.field_errors();
        assert_eq!(field_errors["date"][0].code, "invalid_date");
    }

    #[test]
    fn test_weight_serialized_as_number() {
        let response = ExerciseResponse {
            id: 1,
            name: "Bench".into(),
            sets: 4,
            reps: 8,
            weight: Decimal::new(425, 1),
            notes: String::new(),
            position: 0,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["weight"], serde_json::json!(42.5));
    }
}
