use crate::error::HandlerError;
use crate::invocation::Invocation;

/// Spellings of the user id header, in lookup order.
pub const USER_ID_HEADERS: [&str; 4] = [
    "X-VK-User-ID",
    "x-vk-user-id",
    "X-Vk-User-Id",
    "HTTP_X_VK_USER_ID",
];

/// Spellings of the JSON profile header, in lookup order.
pub const USER_DATA_HEADERS: [&str; 4] = [
    "X-VK-User-Data",
    "x-vk-user-data",
    "X-Vk-User-Data",
    "HTTP_X_VK_USER_DATA",
];

/// Caller identity as proxied by the platform. The headers are trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub external_id: i64,
    pub profile_payload: Option<String>,
    pub is_fallback: bool,
}

impl Identity {
    /// Read the identity headers, substituting `fallback_id` when the user id
    /// header is missing.
    pub fn from_invocation(invocation: &Invocation, fallback_id: i64) -> Result<Self, HandlerError> {
        let profile_payload = invocation.header(&USER_DATA_HEADERS).map(String::from);

        let Some(raw_id) = invocation.header(&USER_ID_HEADERS) else {
            tracing::warn!(fallback_id, "No user id header, using fallback identity");
            return Ok(Self {
                external_id: fallback_id,
                profile_payload,
                is_fallback: true,
            });
        };

        let external_id = raw_id
            .trim()
            .parse()
            .map_err(|_| HandlerError::BadRequest(format!("Invalid user id: {raw_id:?}")))?;

        Ok(Self {
            external_id,
            profile_payload,
            is_fallback: false,
        })
    }
}
