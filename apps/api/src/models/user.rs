use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Frontend,
    Backend,
    Fullstack,
    Devops,
    Qa,
    Designer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Frontend => "frontend",
            UserRole::Backend => "backend",
            UserRole::Fullstack => "fullstack",
            UserRole::Devops => "devops",
            UserRole::Qa => "qa",
            UserRole::Designer => "designer",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub notes: Option<String>,
    pub role: UserRole,
    pub resume_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /v1/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub notes: Option<String>,
    pub role: UserRole,
    pub resume_id: Uuid,
}

/// Body of `PUT /v1/users/:id`. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub role: Option<UserRole>,
    pub resume_id: Option<Uuid>,
}
