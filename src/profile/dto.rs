use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{Role, User};

/// The seeker's own profile; credentials and reset-token fields never leave the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekerProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub bio: String,
    pub skills: Vec<String>,
    pub resume_url: Option<String>,
    pub resume_file_name: String,
    #[serde(rename = "linkedInUrl")]
    pub linkedin_url: String,
    pub portfolio_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SeekerProfile {
    pub fn new(u: &User, resume_url: Option<String>) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name.clone(),
            email: u.email.clone(),
            role: u.role,
            bio: u.bio.clone(),
            skills: u.skills.clone(),
            resume_url,
            resume_file_name: u.resume_file_name.clone(),
            linkedin_url: u.linkedin_url.clone(),
            portfolio_url: u.portfolio_url.clone(),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    One(String),
}

impl SkillsInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            SkillsInput::List(v) => v,
            SkillsInput::One(s) => vec![s],
        }
    }
}

/// Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<SkillsInput>,
    #[serde(rename = "linkedInUrl")]
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeUploadResponse {
    pub message: String,
    pub resume_url: Option<String>,
    pub resume_file_name: String,
}
