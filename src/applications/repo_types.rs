use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::repo_types::{JobStatus, JobType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Viewed,
    Shortlisted,
    Interviewing,
    Offered,
    Rejected,
    Hired,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 8] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Viewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Offered,
        ApplicationStatus::Rejected,
        ApplicationStatus::Hired,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Viewed => "viewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interviewing => "interviewing",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|st| st.as_str()).collect();
                AppError::validation(format!(
                    "Invalid status value. Allowed statuses are: {}",
                    allowed.join(", ")
                ))
            })
    }
}

/// Application row. Company, job and seeker fields are copies taken when the
/// seeker applied and are never refreshed from their sources.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub job_id: Uuid,
    pub seeker_id: Uuid,
    pub recruiter_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub seeker_name: String,
    pub seeker_email: String,
    #[serde(skip)]
    pub resume_key: String,
    pub resume_file_name: String,
    pub status: ApplicationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub applied_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub seeker_id: Uuid,
    pub recruiter_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub seeker_name: String,
    pub seeker_email: String,
    pub resume_key: String,
    pub resume_file_name: String,
}

/// A seeker's application with the current state of the job, if it still exists.
#[derive(Debug, Clone, FromRow)]
pub struct SeekerApplicationRow {
    #[sqlx(flatten)]
    pub application: Application,
    pub job_current_title: Option<String>,
    pub job_company_name: Option<String>,
    pub job_location: Option<String>,
    pub job_type: Option<JobType>,
    pub job_status: Option<JobStatus>,
}

/// An application with the applicant's current profile.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicantRow {
    #[sqlx(flatten)]
    pub application: Application,
    pub seeker_full_name: Option<String>,
    pub seeker_current_email: Option<String>,
    pub seeker_skills: Option<Vec<String>>,
    pub seeker_bio: Option<String>,
    pub seeker_resume_key: Option<String>,
    pub seeker_resume_file_name: Option<String>,
    pub seeker_linkedin_url: Option<String>,
    pub seeker_portfolio_url: Option<String>,
}
