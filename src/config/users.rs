//! Demo account definitions.
//!
//! These accounts are created on start-up when they do not exist yet, so a fresh
//! database can be explored without registering first. They can be replaced with
//! `[[users]]` entries in `config.toml`.

use serde::Deserialize;

/// Role name for ordinary accounts.
pub const ROLE_USER: &str = "USER";
/// Role name for administrators.
pub const ROLE_ADMIN: &str = "ADMIN";

/// One account to create at start-up
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SeedUser {
    /// Login name
    pub username: String,
    /// Contact address
    pub email: String,
    /// Plain-text password, hashed before it is stored
    pub password: String,
    /// `"USER"` or `"ADMIN"`
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    ROLE_USER.to_string()
}

/// The built-in demo accounts: one ordinary user and one administrator.
#[must_use]
pub fn default_seed_users() -> Vec<SeedUser> {
    vec![
        SeedUser {
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password: "password".to_string(),
            role: ROLE_USER.to_string(),
        },
        SeedUser {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: "admin123".to_string(),
            role: ROLE_ADMIN.to_string(),
        },
    ]
}
