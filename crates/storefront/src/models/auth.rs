//! Authentication wire types.

use serde::{Deserialize, Serialize};

use super::User;

/// Request body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/register`.
///
/// The password-confirmation check happens client-side before this body is
/// built; only the accepted password crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response body for login, register, and refresh: the user plus a fresh
/// token pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub refresh_token: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_request_wire_format() {
        let body = RefreshRequest {
            refresh_token: "r-1".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["refreshToken"], "r-1");
    }

    #[test]
    fn test_auth_response_deserializes() {
        let json = r#"{
            "user": {
                "id": 1,
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com",
                "role": "customer",
                "createdAt": "2025-01-15T10:00:00Z"
            },
            "token": "access-1",
            "refreshToken": "refresh-1"
        }"#;

        let response: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.token, "access-1");
        assert_eq!(response.refresh_token, "refresh-1");
        assert_eq!(response.user.first_name, "Ada");
    }
}
