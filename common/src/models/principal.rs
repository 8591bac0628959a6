//! Authenticated principal model.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The authenticated actor behind a request.
///
/// Built by the gateway after token verification and forwarded in the
/// `x-principal` header. Field names follow the portal's document schema.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Unique member identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Chapter role (e.g., "member", "highboard").
    pub role: String,
    /// Department the member belongs to.
    #[serde(default)]
    pub department: Option<String>,
    /// Whether this account is demo/seed data.
    #[serde(default)]
    pub is_test: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_gateway_header_json() {
        let json = r#"{"id":"u1","name":"Sara","role":"highboard","department":"HR","isTest":false}"#;
        let principal: Principal = serde_json::from_str(json).unwrap();
        assert_eq!(principal.role, "highboard");
        assert_eq!(principal.department.as_deref(), Some("HR"));
        assert!(!principal.is_test);
    }

    #[test]
    fn test_department_and_flag_optional() {
        let json = r#"{"id":"u2","name":"Omar","role":"member"}"#;
        let principal: Principal = serde_json::from_str(json).unwrap();
        assert!(principal.department.is_none());
        assert!(!principal.is_test);
    }
}
