// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_COMUM: &str = "comum";

/// Column list matching `User`'s `FromRow` layout.
pub const USER_COLUMNS: &str = "id, username, email, password, is_active, role, created_at";

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// `comum` accounts stay inactive until an admin approves them.
    pub is_active: bool,

    /// User role: 'comum' or 'admin'.
    pub role: String,

    pub created_at: DateTime<Utc>,
}

/// DTO for creating a new user (Registration).
/// Any role sent by the client is ignored; self-registered accounts are always `comum`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// Form body for `/api/token`. `username` may also hold the email.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, max = 254))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            username: "ana".into(),
            email: "ana@example.com".into(),
            password: "$argon2id$secret".into(),
            is_active: false,
            role: ROLE_COMUM.into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "comum");
    }

    #[test]
    fn registration_requires_valid_email() {
        let req = CreateUserRequest {
            email: "not-an-email".into(),
            username: "ana".into(),
            password: "1234".into(),
        };
        assert!(req.validate().is_err());

        let ok = CreateUserRequest {
            email: "ana@example.com".into(),
            ..req
        };
        assert!(ok.validate().is_ok());
    }
}
