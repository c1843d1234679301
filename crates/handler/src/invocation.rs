//! The serverless platform's HTTP event and reply envelopes.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize};
use storage::dto::common::ErrorResponse;

use crate::error::HandlerError;

const PREFLIGHT_MAX_AGE_SECS: u32 = 86_400;
const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str =
    "Content-Type, X-VK-User-ID, X-VK-User-Data, x-vk-user-id, x-vk-user-data";

/// One inbound HTTP request as delivered by the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_base64_encoded: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Invocation {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            http_method: Some(method.into()),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters
            .insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// HTTP method, `GET` when the platform omitted it
    pub fn method(&self) -> &str {
        self.http_method.as_deref().unwrap_or("GET")
    }

    /// First non-empty value among the given header spellings, tried in order.
    pub fn header(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.headers.get(*name))
            .map(String::as_str)
            .find(|value| !value.is_empty())
    }

    /// Non-empty query parameter
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_string_parameters
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// The request body as text, decoded when the platform base64-encoded it.
    /// An absent body reads as an empty JSON object.
    pub fn body_text(&self) -> Result<Cow<'_, str>, HandlerError> {
        let Some(body) = self.body.as_deref() else {
            return Ok(Cow::Borrowed("{}"));
        };

        if !self.is_base64_encoded {
            return Ok(Cow::Borrowed(body));
        }

        let bytes = STANDARD
            .decode(body)
            .map_err(|e| HandlerError::MalformedBody(format!("Invalid base64 body: {e}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| HandlerError::MalformedBody(format!("Body is not UTF-8: {e}")))?;

        Ok(Cow::Owned(text))
    }
}

/// Reply returned to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl InvocationResponse {
    /// Answer to a CORS preflight request
    pub fn preflight() -> Self {
        let headers = BTreeMap::from([
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
            (
                "Access-Control-Allow-Methods".to_string(),
                ALLOWED_METHODS.to_string(),
            ),
            (
                "Access-Control-Allow-Headers".to_string(),
                ALLOWED_HEADERS.to_string(),
            ),
            (
                "Access-Control-Max-Age".to_string(),
                PREFLIGHT_MAX_AGE_SECS.to_string(),
            ),
        ]);

        Self {
            status_code: 200,
            headers,
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    pub fn json<T: Serialize>(status_code: u16, payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self::with_json_body(status_code, body),
            Err(e) => {
                tracing::error!("Failed to serialize response: {:?}", e);
                Self::with_json_body(
                    500,
                    r#"{"error":"Failed to serialize response"}"#.to_string(),
                )
            }
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self::json(status_code, &ErrorResponse::new(message))
    }

    pub fn method_not_allowed() -> Self {
        Self::error(405, "Method not allowed")
    }

    fn with_json_body(status_code: u16, body: String) -> Self {
        let headers = BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        ]);

        Self {
            status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_platform_event() {
        let event: Invocation = serde_json::from_str(
            r#"{
                "httpMethod": "POST",
                "headers": {"X-VK-User-ID": "42"},
                "queryStringParameters": null,
                "body": "{\"date\": \"2024-01-10\"}",
                "isBase64Encoded": false,
                "requestContext": {"requestId": "abc"}
            }"#,
        )
        .unwrap();

        assert_eq!(event.method(), "POST");
        assert_eq!(event.header(&["X-VK-User-ID"]), Some("42"));
        assert!(event.query_string_parameters.is_empty());
        assert_eq!(event.body_text().unwrap(), r#"{"date": "2024-01-10"}"#);
    }

    #[test]
    fn test_missing_fields_default() {
        let event: Invocation = serde_json::from_str("{}").unwrap();
        assert_eq!(event.method(), "GET");
        assert!(event.headers.is_empty());
        assert_eq!(event.body_text().unwrap(), "{}");
    }

    #[test]
    fn test_base64_body_decoded() {
        let event = Invocation {
            body: Some(STANDARD.encode(r#"{"date":"2024-01-10"}"#)),
            is_base64_encoded: true,
            ..Invocation::new("PUT")
        };
        assert_eq!(event.body_text().unwrap(), r#"{"date":"2024-01-10"}"#);
    }

    #[test]
    fn test_invalid_base64_is_malformed_body() {
        let event = Invocation {
            body: Some("***".to_string()),
            is_base64_encoded: true,
            ..Invocation::new("POST")
        };
        assert!(matches!(
            event.body_text(),
            Err(HandlerError::MalformedBody(_))
        ));
    }

    #[test]
    fn test_header_skips_empty_values() {
        let event = Invocation::new("GET")
            .with_header("X-VK-User-ID", "")
            .with_header("x-vk-user-id", "77");
        assert_eq!(event.header(&["X-VK-User-ID", "x-vk-user-id"]), Some("77"));
    }

    #[test]
    fn test_empty_query_value_is_absent() {
        let event = Invocation::new("GET").with_query("date", "");
        assert_eq!(event.query("date"), None);
    }

    #[test]
    fn test_preflight_headers() {
        let response = InvocationResponse::preflight();
        assert_eq!(response.status_code, 200);
        assert!(response.body.is_empty());
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(
            response.headers["Access-Control-Allow-Methods"],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(
            response.headers["Access-Control-Allow-Headers"],
            "Content-Type, X-VK-User-ID, X-VK-User-Data, x-vk-user-id, x-vk-user-data"
        );
        assert_eq!(response.headers["Access-Control-Max-Age"], "86400");
    }

    #[test]
    fn test_error_response_shape() {
        let response = InvocationResponse::method_not_allowed();
        assert_eq!(response.status_code, 405);
        assert_eq!(response.headers["Content-Type"], "application/json");
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(response.body, r#"{"error":"Method not allowed"}"#);
    }

    #[test]
    fn test_response_uses_platform_field_names() {
        let json = serde_json::to_value(InvocationResponse::error(500, "boom")).unwrap();
        assert_eq!(json["statusCode"], 500);
        assert_eq!(json["isBase64Encoded"], false);
        assert_eq!(json["headers"]["Content-Type"], "application/json");
    }
}
