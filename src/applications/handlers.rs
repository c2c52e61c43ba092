use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    applications::{
        dto::{
            ApplicantView, ApplicationEnvelope, ApplicationView, SeekerApplicationView,
            UpdateStatusRequest,
        },
        repo,
        repo_types::Application,
        services::{
            applicant_view, check_can_apply, ensure_job_owner, seeker_view, snapshot, status_change,
            ALREADY_APPLIED,
        },
    },
    auth::{extractors::CurrentUser, repo_types::Role, services::authorize},
    errors::{is_unique_violation, AppError, AppResult},
    jobs,
    state::AppState,
    storage::{presign_many, presign_optional, PRESIGN_TTL_SECS},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/applications/job/:job_id/apply", post(apply_for_job))
        .route("/applications/my-applications", get(my_applications))
        .route("/applications/job/:job_id/applicants", get(job_applicants))
        .route("/applications/:id/status", put(update_status))
}

async fn with_resume_url(state: &AppState, application: Application) -> AppResult<ApplicationView> {
    let resume_url =
        presign_optional(state.storage.as_ref(), &application.resume_key, PRESIGN_TTL_SECS).await?;
    Ok(ApplicationView {
        application,
        resume_url,
    })
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn apply_for_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<ApplicationEnvelope>)> {
    authorize(&user, &[Role::Seeker])?;

    let job = jobs::repo::find_by_id(&state.db, job_id).await?;
    let already_applied = match &job {
        Some(_) => repo::exists_for(&state.db, job_id, user.id).await?,
        None => false,
    };
    let job = check_can_apply(job.as_ref(), &user, already_applied)?;

    let application = repo::insert(&state.db, &snapshot(job, &user))
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!(%job_id, "duplicate application caught by constraint");
                AppError::Conflict(ALREADY_APPLIED.into())
            } else {
                AppError::from(e)
            }
        })?;

    info!(application_id = %application.id, %job_id, "application submitted");
    Ok((
        StatusCode::CREATED,
        Json(ApplicationEnvelope {
            message: "Application submitted successfully!".into(),
            application: with_resume_url(&state, application).await?,
        }),
    ))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_applications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<SeekerApplicationView>>> {
    authorize(&user, &[Role::Seeker])?;
    let rows = repo::list_for_seeker(&state.db, user.id).await?;
    Ok(Json(rows.into_iter().map(seeker_view).collect()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn job_applicants(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<Vec<ApplicantView>>> {
    authorize(&user, &[Role::CompanyRecruiter])?;
    let job = jobs::repo::find_by_id(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::not_found("Job not found."))?;
    ensure_job_owner(&job, user.id)?;

    let rows = repo::list_for_job(&state.db, job_id).await?;
    let snapshot_keys: Vec<&str> = rows.iter().map(|r| r.application.resume_key.as_str()).collect();
    let profile_keys: Vec<&str> = rows
        .iter()
        .map(|r| r.seeker_resume_key.as_deref().unwrap_or_default())
        .collect();
    let snapshot_urls = presign_many(state.storage.as_ref(), &snapshot_keys, PRESIGN_TTL_SECS).await?;
    let profile_urls = presign_many(state.storage.as_ref(), &profile_keys, PRESIGN_TTL_SECS).await?;

    let applicants = rows
        .into_iter()
        .zip(snapshot_urls.into_iter().zip(profile_urls))
        .map(|(row, (snap, prof))| applicant_view(row, snap, prof))
        .collect();
    Ok(Json(applicants))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApplicationEnvelope>> {
    authorize(&user, &[Role::CompanyRecruiter])?;

    let application = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Application not found."))?;
    let status = status_change(&application, user.id, &payload.status)?;

    let application = repo::set_status(&state.db, id, status).await?;
    info!(application_id = %id, status = status.as_str(), "application status updated");
    Ok(Json(ApplicationEnvelope {
        message: "Application status updated successfully!".into(),
        application: with_resume_url(&state, application).await?,
    }))
}
