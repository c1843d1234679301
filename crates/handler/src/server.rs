//! Local development server: replays HTTP requests as platform invocations.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use storage::dto::common::ErrorResponse;
use storage::dto::workout::{
    SaveWorkoutResponse, WorkoutByDateResponse, WorkoutListResponse, WorkoutPayload,
    WorkoutQuery,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::dispatch::InvocationHandler;
use crate::invocation::{Invocation, InvocationResponse};
use crate::openapi::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    handler: Arc<dyn InvocationHandler>,
}

impl AppState {
    pub fn new(handler: Arc<dyn InvocationHandler>) -> Self {
        Self { handler }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(get_workouts)
                .post(create_workout)
                .put(update_workout)
                .fallback(forward_any),
        )
        .fallback(forward_any)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

#[utoipa::path(
    get,
    path = "/",
    params(WorkoutQuery),
    responses(
        (status = 200, description = "The workout of the requested date (or null), or the 50 most recent workouts when no date is given", body = WorkoutByDateResponse),
        (status = 400, description = "Malformed date or user id", body = ErrorResponse),
        (status = 500, description = "Configuration or store failure", body = ErrorResponse)
    ),
    security(("vk_user_id" = [])),
    tag = "workouts"
)]
pub async fn get_workouts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    forward(&state, Method::GET, &headers, query, String::new()).await
}

#[utoipa::path(
    post,
    path = "/",
    request_body = WorkoutPayload,
    responses(
        (status = 200, description = "Workout saved, exercises replaced", body = SaveWorkoutResponse),
        (status = 400, description = "Missing or malformed date", body = ErrorResponse),
        (status = 500, description = "Malformed body, configuration or store failure", body = ErrorResponse)
    ),
    security(("vk_user_id" = [])),
    tag = "workouts"
)]
pub async fn create_workout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    forward(&state, Method::POST, &headers, query, body).await
}

/// Same full-replace semantics as the POST endpoint
#[utoipa::path(
    put,
    path = "/",
    request_body = WorkoutPayload,
    responses(
        (status = 200, description = "Workout saved, exercises replaced", body = SaveWorkoutResponse),
        (status = 400, description = "Missing or malformed date", body = ErrorResponse),
        (status = 500, description = "Malformed body, configuration or store failure", body = ErrorResponse)
    ),
    security(("vk_user_id" = [])),
    tag = "workouts"
)]
pub async fn update_workout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    forward(&state, Method::PUT, &headers, query, body).await
}

// Preflight, unsupported methods and any other path
async fn forward_any(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    forward(&state, method, &headers, query, body).await
}

async fn forward(
    state: &AppState,
    method: Method,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    body: String,
) -> Response {
    let invocation = to_invocation(method, headers, query, body);
    let reply = state.handler.handle(invocation).await;
    into_http(reply)
}

fn to_invocation(
    method: Method,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    body: String,
) -> Invocation {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    Invocation {
        http_method: Some(method.as_str().to_string()),
        headers,
        query_string_parameters: query,
        body: (!body.is_empty()).then_some(body),
        is_base64_encoded: false,
    }
}

fn into_http(reply: InvocationResponse) -> Response {
    let status = StatusCode::from_u16(reply.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Body::from(reply.body)).into_response();

    for (name, value) in reply.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping invalid response header"),
        }
    }

    response
}
