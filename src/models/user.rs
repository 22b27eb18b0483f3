use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::format_datetime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Recruiter,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Recruiter
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Recruiter => "recruiter",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored user account. `password` always holds a bcrypt hash.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub last_login: Option<BsonDateTime>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

fn default_is_active() -> bool {
    true
}

impl User {
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

/// Public view of a user, without the password hash
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub last_login: Option<String>,
    pub created_at: String,
}

impl From<User> for UserInfo {
    fn from(u: User) -> Self {
        UserInfo {
            id: u.id_hex(),
            username: u.username,
            email: u.email,
            role: u.role,
            is_active: u.is_active,
            full_name: u.full_name,
            phone: u.phone,
            last_login: u.last_login.as_ref().map(format_datetime),
            created_at: format_datetime(&u.created_at),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub role: Option<UserRole>,
    pub active: Option<bool>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Some(ObjectId::new()),
            username: "priya".into(),
            email: "priya@agency.io".into(),
            password: "$2b$12$hash".into(),
            role: UserRole::Recruiter,
            is_active: true,
            full_name: Some("Priya Nair".into()),
            phone: None,
            last_login: None,
            created_at: BsonDateTime::now(),
            updated_at: BsonDateTime::now(),
        }
    }

    #[test]
    fn test_user_info_hides_password() {
        let info = UserInfo::from(sample_user());
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "recruiter");
        assert_eq!(json["isActive"], true);
        assert_eq!(json["fullName"], "Priya Nair");
    }

    #[test]
    fn test_role_defaults_to_recruiter_when_missing() {
        let raw = mongodb::bson::doc! {
            "username": "sam",
            "email": "sam@agency.io",
            "password": "x",
            "full_name": null,
            "phone": null,
            "last_login": null,
            "created_at": BsonDateTime::now(),
            "updated_at": BsonDateTime::now(),
        };
        let user: User = mongodb::bson::from_document(raw).unwrap();
        assert_eq!(user.role, UserRole::Recruiter);
        assert!(user.is_active);
    }
}
