use tracing::warn;
use uuid::Uuid;

use crate::{
    applications::{
        dto::{ApplicantProfile, ApplicantView, JobSummary, SeekerApplicationView},
        repo_types::{
            ApplicantRow, Application, ApplicationStatus, NewApplication, SeekerApplicationRow,
        },
    },
    auth::repo_types::User,
    errors::{AppError, AppResult},
    jobs::repo_types::{Job, JobStatus},
};

pub const ALREADY_APPLIED: &str = "You have already applied for this job.";

/// Preconditions for a new application, checked in order.
pub fn check_can_apply<'a>(
    job: Option<&'a Job>,
    seeker: &User,
    already_applied: bool,
) -> AppResult<&'a Job> {
    let job = job.ok_or_else(|| AppError::not_found("Job not found."))?;
    if job.status != JobStatus::Open {
        return Err(AppError::InvalidState(
            "This job is no longer open for applications.".into(),
        ));
    }
    if !seeker.has_resume() {
        warn!(user_id = %seeker.id, "apply without resume");
        return Err(AppError::PreconditionFailed(
            "Please upload your resume to your profile before applying.".into(),
        ));
    }
    if already_applied {
        return Err(AppError::Conflict(ALREADY_APPLIED.into()));
    }
    Ok(job)
}

/// Point-in-time copy of the job and seeker details.
pub fn snapshot(job: &Job, seeker: &User) -> NewApplication {
    NewApplication {
        job_id: job.id,
        seeker_id: seeker.id,
        recruiter_id: job.posted_by,
        company_name: job.company_name.clone(),
        job_title: job.title.clone(),
        seeker_name: seeker.full_name.clone(),
        seeker_email: seeker.email.clone(),
        resume_key: seeker.resume_key.clone(),
        resume_file_name: seeker.resume_file_name.clone(),
    }
}

pub fn ensure_job_owner(job: &Job, user_id: Uuid) -> AppResult<()> {
    if job.posted_by != user_id {
        warn!(job_id = %job.id, %user_id, "applicant listing denied");
        return Err(AppError::forbidden(
            "Forbidden. You are not authorized to view applicants for this job.",
        ));
    }
    Ok(())
}

pub fn ensure_application_recruiter(app: &Application, user_id: Uuid) -> AppResult<()> {
    if app.recruiter_id != user_id {
        warn!(application_id = %app.id, %user_id, "status update denied");
        return Err(AppError::forbidden(
            "Forbidden. You are not authorized to update this application.",
        ));
    }
    Ok(())
}

/// Ownership is checked before the requested status is parsed, so a recruiter
/// who does not own the application gets a 403 whatever they send.
pub fn status_change(app: &Application, user_id: Uuid, raw: &str) -> AppResult<ApplicationStatus> {
    ensure_application_recruiter(app, user_id)?;
    raw.parse()
}

pub fn seeker_view(row: SeekerApplicationRow) -> SeekerApplicationView {
    let job = match (
        row.job_current_title,
        row.job_company_name,
        row.job_location,
        row.job_type,
        row.job_status,
    ) {
        (Some(title), Some(company_name), Some(location), Some(job_type), Some(status)) => {
            Some(JobSummary {
                title,
                company_name,
                location,
                job_type,
                status,
            })
        }
        _ => None,
    };
    SeekerApplicationView {
        application: row.application,
        job,
    }
}

/// Links are presigned by the caller: one for the snapshot resume, one for the current profile resume.
pub fn applicant_view(
    row: ApplicantRow,
    snapshot_url: Option<String>,
    profile_resume_url: Option<String>,
) -> ApplicantView {
    let seeker = match (row.seeker_full_name, row.seeker_current_email) {
        (Some(full_name), Some(email)) => Some(ApplicantProfile {
            id: row.application.seeker_id,
            full_name,
            email,
            skills: row.seeker_skills.unwrap_or_default(),
            bio: row.seeker_bio.unwrap_or_default(),
            resume_url: profile_resume_url,
            resume_file_name: row.seeker_resume_file_name.unwrap_or_default(),
            linkedin_url: row.seeker_linkedin_url.unwrap_or_default(),
            portfolio_url: row.seeker_portfolio_url.unwrap_or_default(),
        }),
        _ => None,
    };
    ApplicantView {
        application: row.application,
        resume_url: snapshot_url,
        seeker,
    }
}
