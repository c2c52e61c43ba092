use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::applications::repo_types::Application;
use crate::jobs::repo_types::{JobStatus, JobType};

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

/// An application plus a short-lived download link for the resume snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub resume_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationEnvelope {
    pub message: String,
    pub application: ApplicationView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub job_type: JobType,
    pub status: JobStatus,
}

#[derive(Debug, Serialize)]
pub struct SeekerApplicationView {
    #[serde(flatten)]
    pub application: Application,
    /// `null` once the job has been deleted.
    pub job: Option<JobSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub skills: Vec<String>,
    pub bio: String,
    pub resume_url: Option<String>,
    pub resume_file_name: String,
    #[serde(rename = "linkedInUrl")]
    pub linkedin_url: String,
    pub portfolio_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantView {
    #[serde(flatten)]
    pub application: Application,
    pub resume_url: Option<String>,
    pub seeker: Option<ApplicantProfile>,
}
