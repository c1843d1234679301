use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Connection, PgConnection};

use crate::dto::workout::{WorkoutDetail, WorkoutDraft};
use crate::error::Result;
use crate::models::WorkoutSummary;
use crate::repository::{user::UserRepository, workout::WorkoutRepository};

/// The per-request view of the store: every operation of one request runs
/// sequentially on the same connection.
#[async_trait]
pub trait WorkoutStore: Send + Sized {
    /// Internal id for an external user id, creating the user on first sight.
    async fn resolve_user(
        &mut self,
        vk_user_id: i64,
        profile_payload: Option<&str>,
    ) -> Result<i64>;

    async fn workout_by_date(
        &mut self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<WorkoutDetail>>;

    async fn recent_workouts(&mut self, user_id: i64) -> Result<Vec<WorkoutSummary>>;

    /// Atomically upsert the workout of `draft.date` and replace its exercises.
    async fn replace_workout(&mut self, user_id: i64, draft: &WorkoutDraft) -> Result<i64>;

    /// Release the underlying connection.
    async fn close(self) -> Result<()>;
}

/// Opens one [`WorkoutStore`] per request.
#[async_trait]
pub trait Connector: Send + Sync {
    type Store: WorkoutStore;

    async fn connect(&self, database_url: &str) -> Result<Self::Store>;
}

/// PostgreSQL-backed store holding a single, unpooled connection.
pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let conn = PgConnection::connect(database_url).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl WorkoutStore for PgStore {
    async fn resolve_user(
        &mut self,
        vk_user_id: i64,
        profile_payload: Option<&str>,
    ) -> Result<i64> {
        UserRepository::new(&mut self.conn)
            .resolve(vk_user_id, profile_payload)
            .await
    }

    async fn workout_by_date(
        &mut self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<WorkoutDetail>> {
        WorkoutRepository::new(&mut self.conn)
            .find_detailed_by_date(user_id, date)
            .await
    }

    async fn recent_workouts(&mut self, user_id: i64) -> Result<Vec<WorkoutSummary>> {
        WorkoutRepository::new(&mut self.conn)
            .list_recent(user_id)
            .await
    }

    async fn replace_workout(&mut self, user_id: i64, draft: &WorkoutDraft) -> Result<i64> {
        WorkoutRepository::new(&mut self.conn)
            .replace(user_id, draft)
            .await
    }

    async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

#[async_trait]
impl Connector for PgConnector {
    type Store = PgStore;

    async fn connect(&self, database_url: &str) -> Result<PgStore> {
        PgStore::connect(database_url).await
    }
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(database_url: &str) -> Result<()> {
    let mut conn = PgConnection::connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&mut conn).await?;
    conn.close().await?;
    Ok(())
}
