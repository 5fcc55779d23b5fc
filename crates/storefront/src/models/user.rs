//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sartoria_core::{Email, UserId, UserRole};

/// A storefront user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// User's email address.
    pub email: Email,
    /// Storefront role.
    pub role: UserRole,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name, "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether this user may access the admin dashboard.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserializes_from_backend_shape() {
        let json = r#"{
            "id": 7,
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "role": "customer",
            "createdAt": "2025-01-15T10:00:00Z"
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new(7));
        assert_eq!(user.full_name(), "Ada Lovelace");
        assert!(!user.is_admin());
    }
}
