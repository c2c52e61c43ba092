use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::{
    auth::{extractors::CurrentUser, repo_types::{Role, User}, services::authorize},
    errors::{AppError, AppResult},
    profile::{
        dto::{ResumeUploadResponse, SeekerProfile, UpdateProfileRequest},
        services::{merge_profile, resume_extension, resume_key},
    },
    state::AppState,
    storage::{presign_optional, PRESIGN_TTL_SECS},
};

pub const RESUME_FIELD: &str = "resumeFile";

// Room for multipart boundaries and headers around the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn routes(resume_max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/profile/seeker/me", get(get_profile).put(update_profile))
        .route(
            "/profile/seeker/me/resume",
            post(upload_resume).layer(DefaultBodyLimit::max(resume_max_bytes + MULTIPART_OVERHEAD)),
        )
}

fn too_large(max: usize) -> AppError {
    AppError::validation(format!(
        "File upload failed: resume exceeds the {} MB limit.",
        max / (1024 * 1024)
    ))
}

fn multipart_error(e: MultipartError, max: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max)
    } else {
        AppError::validation(e.body_text())
    }
}

async fn profile_view(state: &AppState, user: &User) -> AppResult<SeekerProfile> {
    let resume_url =
        presign_optional(state.storage.as_ref(), &user.resume_key, PRESIGN_TTL_SECS).await?;
    Ok(SeekerProfile::new(user, resume_url))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<SeekerProfile>> {
    authorize(&user, &[Role::Seeker])?;
    Ok(Json(profile_view(&state, &user).await?))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<SeekerProfile>> {
    authorize(&user, &[Role::Seeker])?;
    let update = merge_profile(&user, payload)?;
    let user = User::update_profile(&state.db, user.id, &update).await?;
    info!("profile updated");
    Ok(Json(profile_view(&state, &user).await?))
}

struct ResumeFile {
    file_name: String,
    content_type: String,
    body: Bytes,
}

async fn read_resume_field(mut mp: Multipart, max: usize) -> AppResult<Option<ResumeFile>> {
    while let Some(field) = mp.next_field().await.map_err(|e| multipart_error(e, max))? {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = field.bytes().await.map_err(|e| multipart_error(e, max))?;
        return Ok(Some(ResumeFile {
            file_name,
            content_type,
            body,
        }));
    }
    Ok(None)
}

#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn upload_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mp: Multipart,
) -> AppResult<Json<ResumeUploadResponse>> {
    authorize(&user, &[Role::Seeker])?;
    let max = state.config.resume_max_bytes;

    let file = read_resume_field(mp, max)
        .await?
        .filter(|f| !f.body.is_empty())
        .ok_or_else(|| AppError::validation("No resume file uploaded. Please select a file."))?;
    if file.body.len() > max {
        warn!(size = file.body.len(), "resume too large");
        return Err(too_large(max));
    }
    let ext = resume_extension(&file.content_type, &file.file_name)?;

    let key = resume_key(user.id, ext);
    state
        .storage
        .put_object(&key, file.body, &file.content_type)
        .await
        .map_err(|e| AppError::Upstream(format!("resume upload failed: {e}")))?;

    let user = User::set_resume(&state.db, user.id, &key, &file.file_name).await?;
    info!(%key, "resume uploaded");

    let resume_url = presign_optional(state.storage.as_ref(), &user.resume_key, PRESIGN_TTL_SECS).await?;
    Ok(Json(ResumeUploadResponse {
        message: "Resume uploaded successfully!".into(),
        resume_url,
        resume_file_name: user.resume_file_name,
    }))
}
