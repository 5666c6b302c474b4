use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    pub username: String,
    /// Role tag (`admin`, `manager`, `teacher`, `student`, `parent`), absent until assigned
    #[serde(default)]
    pub role: Option<String>,
    /// Expiration, Unix seconds
    pub exp: usize,
    /// Issued-at, Unix seconds
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_without_role_deserialize() {
        let json = r#"{"sub":"u-1","username":"aida","exp":9999999999,"iat":1}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.role, None);
        assert_eq!(claims.username, "aida");
    }

    #[test]
    fn test_claims_serialize_role() {
        let claims = Claims {
            sub: "u-2".to_string(),
            username: "teacher1".to_string(),
            role: Some("teacher".to_string()),
            exp: 2,
            iat: 1,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""role":"teacher""#));
    }
}
