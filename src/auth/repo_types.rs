use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account role carried on the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Seeker,
    CompanyRecruiter,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Seeker => "seeker",
            Role::CompanyRecruiter => "company_recruiter",
            Role::Admin => "admin",
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String, // Argon2 hash
    pub role: Role,
    pub company_name: Option<String>,
    pub bio: String,
    pub skills: Vec<String>,
    pub resume_key: String, // object-storage key, empty when no resume
    pub resume_file_name: String,
    pub linkedin_url: String,
    pub portfolio_url: String,
    pub password_reset_hash: Option<String>, // sha256 hex of the emailed token
    pub password_reset_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn has_resume(&self) -> bool {
        !self.resume_key.trim().is_empty() && !self.resume_file_name.trim().is_empty()
    }
}

/// Fields needed to insert a new account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub company_name: Option<&'a str>,
}

/// Seeker-editable profile fields, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub linkedin_url: String,
    pub portfolio_url: String,
}
