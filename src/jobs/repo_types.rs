use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_type")]
pub enum JobType {
    #[sqlx(rename = "Full-time")]
    #[serde(rename = "Full-time")]
    FullTime,
    #[sqlx(rename = "Part-time")]
    #[serde(rename = "Part-time")]
    PartTime,
    Internship,
    Contract,
    Temporary,
    Remote,
}

impl FromStr for JobType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Full-time" => JobType::FullTime,
            "Part-time" => JobType::PartTime,
            "Internship" => JobType::Internship,
            "Contract" => JobType::Contract,
            "Temporary" => JobType::Temporary,
            "Remote" => JobType::Remote,
            other => {
                return Err(AppError::validation(format!(
                    "`{other}` is not a valid job type"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "experience_level")]
pub enum ExperienceLevel {
    #[sqlx(rename = "Entry-level")]
    #[serde(rename = "Entry-level")]
    EntryLevel,
    #[sqlx(rename = "Mid-level")]
    #[serde(rename = "Mid-level")]
    MidLevel,
    #[sqlx(rename = "Senior-level")]
    #[serde(rename = "Senior-level")]
    SeniorLevel,
    Lead,
    Manager,
    Executive,
    #[default]
    #[sqlx(rename = "Not Specified")]
    #[serde(rename = "Not Specified")]
    NotSpecified,
}

impl FromStr for ExperienceLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Entry-level" => ExperienceLevel::EntryLevel,
            "Mid-level" => ExperienceLevel::MidLevel,
            "Senior-level" => ExperienceLevel::SeniorLevel,
            "Lead" => ExperienceLevel::Lead,
            "Manager" => ExperienceLevel::Manager,
            "Executive" => ExperienceLevel::Executive,
            "Not Specified" => ExperienceLevel::NotSpecified,
            other => {
                return Err(AppError::validation(format!(
                    "`{other}` is not a valid experience level"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Open,
    Closed,
    Archived,
}

impl FromStr for JobStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "open" => Ok(JobStatus::Open),
            "closed" => Ok(JobStatus::Closed),
            "archived" => Ok(JobStatus::Archived),
            other => Err(AppError::validation(format!(
                "`{other}` is not a valid job status"
            ))),
        }
    }
}

/// Job posting row; serialized as-is to clients.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub posted_by: Uuid,
    pub location: String,
    pub salary: Option<String>,
    pub job_type: JobType,
    pub experience_level: ExperienceLevel,
    pub category: String,
    pub skills_required: Vec<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub application_deadline: Option<OffsetDateTime>,
    pub application_instructions: Option<String>,
    pub status: JobStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated fields for a new posting.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub posted_by: Uuid,
    pub location: String,
    pub salary: Option<String>,
    pub job_type: JobType,
    pub experience_level: ExperienceLevel,
    pub category: String,
    pub skills_required: Vec<String>,
    pub application_deadline: Option<OffsetDateTime>,
    pub application_instructions: Option<String>,
}
