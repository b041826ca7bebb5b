use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,  // We store hashed passwords, not plain text
    pub role: Role,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// Outward-facing user record. The password hash never leaves the store.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            profile_image_url: user.profile_image_url.clone(),
            created_at: user.created_at,
        }
    }
}

// Normalize an email the same way on registration, login and profile update
// so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email("bob@site.org"), "bob@site.org");
    }

    #[test]
    fn user_view_omits_password_hash() {
        let user = User {
            id: "u1".into(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$2b$10$secret".into(),
            role: Role::Member,
            profile_image_url: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(UserView::from(&user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["role"], "member");
    }
}
