use serde_json::Value;

/// Profile fields the platform forwards alongside the user id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Parses the profile header payload.
///
/// Never fails: a missing, malformed or non-object payload yields an empty
/// profile, and fields of the wrong type are treated as absent.
pub fn parse_profile(raw: Option<&str>) -> Profile {
    let Some(raw) = raw else {
        return Profile::default();
    };

    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed profile payload");
            return Profile::default();
        }
    };

    let field = |key: &str| value.get(key).and_then(Value::as_str).map(String::from);

    Profile {
        first_name: field("first_name"),
        last_name: field("last_name"),
        avatar_url: field("photo_100"),
    }
}
