//! In-memory stand-in for the PostgreSQL store.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use handler::{Config, Dispatcher};
use storage::dto::user::{Profile, parse_profile};
use storage::dto::workout::{
    ExerciseResponse, MAX_RECENT_WORKOUTS, WorkoutDetail, WorkoutDraft,
};
use storage::error::{Result, StorageError};
use storage::models::{Exercise, WorkoutSummary};
use storage::store::{Connector, WorkoutStore};

#[derive(Debug, Clone)]
pub struct StoredUser {
    pub id: i64,
    pub vk_user_id: i64,
    pub profile: Profile,
}

#[derive(Debug, Clone)]
pub struct StoredWorkout {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDb {
    pub users: Vec<StoredUser>,
    pub workouts: Vec<StoredWorkout>,
    pub exercises: Vec<Exercise>,
    pub connections_opened: usize,
    pub connections_closed: usize,
    pub fail_next_replace: bool,
    next_id: i64,
}

impl MemoryDb {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn apply_replacement(&mut self, user_id: i64, draft: &WorkoutDraft) -> i64 {
        let existing = self
            .workouts
            .iter_mut()
            .find(|w| w.user_id == user_id && w.date == draft.date);

        let workout_id = match existing {
            Some(workout) => {
                workout.name = draft.name.clone();
                workout.id
            }
            None => {
                let id = self.next_id();
                self.workouts.push(StoredWorkout {
                    id,
                    user_id,
                    name: draft.name.clone(),
                    date: draft.date,
                });
                id
            }
        };

        self.exercises.retain(|e| e.workout_id != workout_id);

        for (position, exercise) in draft.exercises.iter().enumerate() {
            let id = self.next_id();
            self.exercises.push(Exercise {
                id,
                workout_id,
                name: exercise.name.clone(),
                sets: exercise.sets,
                reps: exercise.reps,
                weight: exercise.weight,
                notes: exercise.notes.clone(),
                position: position as i32,
            });
        }

        workout_id
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    db: Arc<Mutex<MemoryDb>>,
}

impl MemoryConnector {
    pub fn db(&self) -> MutexGuard<'_, MemoryDb> {
        self.db.lock().unwrap()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Store = MemoryStore;

    async fn connect(&self, _database_url: &str) -> Result<MemoryStore> {
        self.db().connections_opened += 1;
        Ok(MemoryStore {
            db: Arc::clone(&self.db),
        })
    }
}

pub struct MemoryStore {
    db: Arc<Mutex<MemoryDb>>,
}

impl MemoryStore {
    fn db(&self) -> MutexGuard<'_, MemoryDb> {
        self.db.lock().unwrap()
    }
}

#[async_trait]
impl WorkoutStore for MemoryStore {
    async fn resolve_user(
        &mut self,
        vk_user_id: i64,
        profile_payload: Option<&str>,
    ) -> Result<i64> {
        let mut db = self.db();
        if let Some(user) = db.users.iter().find(|u| u.vk_user_id == vk_user_id) {
            return Ok(user.id);
        }

        let id = db.next_id();
        db.users.push(StoredUser {
            id,
            vk_user_id,
            profile: parse_profile(profile_payload),
        });
        Ok(id)
    }

    async fn workout_by_date(
        &mut self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<WorkoutDetail>> {
        let db = self.db();
        let Some(workout) = db
            .workouts
            .iter()
            .find(|w| w.user_id == user_id && w.date == date)
        else {
            return Ok(None);
        };

        let mut exercises: Vec<Exercise> = db
            .exercises
            .iter()
            .filter(|e| e.workout_id == workout.id)
            .cloned()
            .collect();
        exercises.sort_by_key(|e| (e.position, e.id));

        Ok(Some(WorkoutDetail {
            id: workout.id,
            name: workout.name.clone(),
            date: workout.date,
            exercises: exercises.into_iter().map(ExerciseResponse::from).collect(),
        }))
    }

    async fn recent_workouts(&mut self, user_id: i64) -> Result<Vec<WorkoutSummary>> {
        let db = self.db();
        let mut summaries: Vec<WorkoutSummary> = db
            .workouts
            .iter()
            .filter(|w| w.user_id == user_id)
            .map(|w| WorkoutSummary {
                id: w.id,
                name: w.name.clone(),
                date: w.date,
                exercise_count: db.exercises.iter().filter(|e| e.workout_id == w.id).count()
                    as i64,
            })
            .collect();
        summaries.sort_by(|a, b| b.date.cmp(&a.date));
        summaries.truncate(MAX_RECENT_WORKOUTS as usize);
        Ok(summaries)
    }

    async fn replace_workout(&mut self, user_id: i64, draft: &WorkoutDraft) -> Result<i64> {
        let mut db = self.db();
        if db.fail_next_replace {
            db.fail_next_replace = false;
            return Err(StorageError::ConstraintViolation(
                "exercises_sets_check".to_string(),
            ));
        }
        Ok(db.apply_replacement(user_id, draft))
    }

    async fn close(self) -> Result<()> {
        self.db().connections_closed += 1;
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: Some("memory://workouts".to_string()),
        fallback_user_id: handler::FALLBACK_EXTERNAL_USER_ID,
    }
}

pub fn dispatcher() -> (Dispatcher<MemoryConnector>, MemoryConnector) {
    let connector = MemoryConnector::default();
    (Dispatcher::new(test_config(), connector.clone()), connector)
}
