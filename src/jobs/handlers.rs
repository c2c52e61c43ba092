use axum::{
    extract::{Path, Query, State},
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::MessageResponse, extractors::CurrentUser, repo_types::Role, services::authorize,
    },
    errors::{AppError, AppResult},
    jobs::{
        dto::{CreateJobRequest, JobListQuery, JobsPage, UpdateJobRequest},
        repo,
        repo_types::Job,
        services::{apply_update, ensure_owner, new_job, page_of, JobFilters},
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/my-jobs", get(list_my_jobs))
        .route("/jobs/:id", get(get_job))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/:id", put(update_job).delete(delete_job))
}

fn job_not_found() -> AppError {
    AppError::not_found("Job not found")
}

#[instrument(skip(state, q))]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(q): Query<JobListQuery>,
) -> AppResult<Json<JobsPage>> {
    let (filters, window) = JobFilters::from_query(&q)?;
    let (jobs, total) = repo::list_open(&state.db, &filters, window).await?;
    Ok(Json(page_of(jobs, total, window)))
}

#[instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Job>> {
    let job = repo::find_by_id(&state.db, id).await?.ok_or_else(job_not_found)?;
    Ok(Json(job))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_my_jobs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<Job>>> {
    authorize(&user, &[Role::CompanyRecruiter])?;
    Ok(Json(repo::list_by_recruiter(&state.db, user.id).await?))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateJobRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<Job>)> {
    authorize(&user, &[Role::CompanyRecruiter])?;
    let new = new_job(&payload, &user)?;
    let job = repo::insert(&state.db, &new).await?;
    info!(job_id = %job.id, "job created");

    let mut headers = HeaderMap::new();
    if let Ok(loc) = HeaderValue::from_str(&format!("/api/v1/jobs/{}", job.id)) {
        headers.insert(LOCATION, loc);
    }
    Ok((StatusCode::CREATED, headers, Json(job)))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobRequest>,
) -> AppResult<Json<Job>> {
    authorize(&user, &[Role::CompanyRecruiter])?;
    let mut job = repo::find_by_id(&state.db, id).await?.ok_or_else(job_not_found)?;
    ensure_owner(&job, user.id, "update")?;
    apply_update(&mut job, &payload)?;
    let job = repo::save(&state.db, &job).await?;
    info!(job_id = %job.id, "job updated");
    Ok(Json(job))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    authorize(&user, &[Role::CompanyRecruiter])?;
    let job = repo::find_by_id(&state.db, id).await?.ok_or_else(job_not_found)?;
    ensure_owner(&job, user.id, "delete")?;
    if !repo::delete(&state.db, id).await? {
        warn!(job_id = %id, "job vanished before delete");
        return Err(job_not_found());
    }
    info!(job_id = %id, "job deleted");
    Ok(Json(MessageResponse::new("Job posting deleted successfully")))
}
