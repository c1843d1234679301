use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::server::get_workouts,
        crate::server::create_workout,
        crate::server::update_workout,
    ),
    components(
        schemas(
            storage::dto::common::ErrorResponse,
            storage::dto::workout::WorkoutPayload,
            storage::dto::workout::ExercisePayload,
            storage::dto::workout::WorkoutByDateResponse,
            storage::dto::workout::WorkoutListResponse,
            storage::dto::workout::WorkoutDetail,
            storage::dto::workout::ExerciseResponse,
            storage::dto::workout::SaveWorkoutResponse,
            storage::models::WorkoutSummary,
        )
    ),
    tags(
        (name = "workouts", description = "Per-user workout log"),
    ),
    modifiers(&IdentityAddon)
)]
pub struct ApiDoc;

/// Documents the proxied identity headers. They are trusted, not verified.
struct IdentityAddon;

impl utoipa::Modify for IdentityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "vk_user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-VK-User-ID",
                    "Numeric platform user id; a fallback user is used when absent",
                ))),
            );
            components.add_security_scheme(
                "vk_user_data",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-VK-User-Data",
                    "JSON profile (first_name, last_name, photo_100), read on first request",
                ))),
            );
        }
    }
}
