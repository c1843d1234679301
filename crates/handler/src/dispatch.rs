use async_trait::async_trait;
use chrono::NaiveDate;
use storage::dto::workout::{
    SaveWorkoutResponse, WorkoutByDateResponse, WorkoutDraft, WorkoutListResponse,
    WorkoutPayload, parse_workout_date,
};
use storage::store::{Connector, WorkoutStore};

use crate::config::Config;
use crate::error::{HandlerError, HandlerResult};
use crate::identity::Identity;
use crate::invocation::{Invocation, InvocationResponse};

/// Anything that can answer a platform invocation.
#[async_trait]
pub trait InvocationHandler: Send + Sync {
    async fn handle(&self, invocation: Invocation) -> InvocationResponse;
}

/// What a request asks the store to do, decided before a connection is opened.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    WorkoutByDate(NaiveDate),
    RecentWorkouts,
    /// POST and PUT alike: a full replace of the day's workout.
    Replace(WorkoutDraft),
}

impl Operation {
    pub fn from_invocation(invocation: &Invocation) -> HandlerResult<Self> {
        match invocation.method() {
            "GET" => match invocation.query("date") {
                Some(date) => parse_workout_date(date)
                    .map(Self::WorkoutByDate)
                    .map_err(|_| {
                        HandlerError::BadRequest(format!(
                            "Invalid date {date:?}, expected YYYY-MM-DD"
                        ))
                    }),
                None => Ok(Self::RecentWorkouts),
            },
            "POST" | "PUT" => {
                let body = invocation.body_text()?;
                let payload: WorkoutPayload = serde_json::from_str(&body)?;
                Ok(Self::Replace(payload.into_draft()?))
            }
            other => Err(HandlerError::BadRequest(format!(
                "Unsupported method {other}"
            ))),
        }
    }
}

/// Routes invocations to the identity resolver and the workout reader/writer.
///
/// Holds no per-request state: every invocation opens its own store
/// connection and closes it before replying.
pub struct Dispatcher<C> {
    config: Config,
    connector: C,
}

impl<C: Connector> Dispatcher<C> {
    pub fn new(config: Config, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn process(&self, invocation: &Invocation) -> HandlerResult<InvocationResponse> {
        let identity = Identity::from_invocation(invocation, self.config.fallback_user_id)?;
        tracing::info!(
            method = invocation.method(),
            vk_user_id = identity.external_id,
            fallback = identity.is_fallback,
            "Handling request"
        );
        tracing::debug!(headers = ?invocation.headers, body = ?invocation.body, "Request details");

        let database_url = self.config.database_url()?;
        let operation = Operation::from_invocation(invocation)?;

        let mut store = self.connector.connect(database_url).await?;
        let outcome = execute(&mut store, &identity, operation).await;

        if let Err(e) = store.close().await {
            tracing::warn!("Failed to close store connection: {}", e);
        }

        outcome
    }
}

async fn execute<S: WorkoutStore>(
    store: &mut S,
    identity: &Identity,
    operation: Operation,
) -> HandlerResult<InvocationResponse> {
    let user_id = store
        .resolve_user(identity.external_id, identity.profile_payload.as_deref())
        .await?;

    let response = match operation {
        Operation::WorkoutByDate(date) => {
            let workout = store.workout_by_date(user_id, date).await?;
            InvocationResponse::json(200, &WorkoutByDateResponse { workout })
        }
        Operation::RecentWorkouts => {
            let workouts = store.recent_workouts(user_id).await?;
            InvocationResponse::json(200, &WorkoutListResponse { workouts })
        }
        Operation::Replace(draft) => {
            let workout_id = store.replace_workout(user_id, &draft).await?;
            tracing::info!(user_id, workout_id, date = %draft.date, "Saved workout");
            InvocationResponse::json(200, &SaveWorkoutResponse::saved(workout_id))
        }
    };

    Ok(response)
}

#[async_trait]
impl<C: Connector> InvocationHandler for Dispatcher<C> {
    async fn handle(&self, invocation: Invocation) -> InvocationResponse {
        match invocation.method() {
            "OPTIONS" => return InvocationResponse::preflight(),
            "GET" | "POST" | "PUT" => {}
            other => {
                tracing::info!(method = other, "Rejecting unsupported method");
                return InvocationResponse::method_not_allowed();
            }
        }

        match self.process(&invocation).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }
}
