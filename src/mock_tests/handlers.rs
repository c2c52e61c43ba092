use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{extractors::CurrentUser, repo_types::Role, services::authorize},
    errors::{is_unique_violation, AppError, AppResult},
    mock_tests::{
        dto::{
            CreateMockTestRequest, MockTestListQuery, MockTestView, SubmitAttemptRequest,
            SubmitAttemptResponse, TestForAttempt,
        },
        repo,
        repo_types::{AttemptSummary, MockTestSummary, TestAttempt, TestDifficulty},
        services::{
            ensure_attempt_owner, for_attempt, new_mock_test, score_answers, view, AttemptDraft,
        },
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/mock-tests", get(list_tests).post(create_test))
        .route("/mock-tests/my-attempts", get(my_attempts))
        .route("/mock-tests/attempts/:id", get(attempt_result))
        .route("/mock-tests/:id/attempt", get(test_for_attempt))
        .route("/mock-tests/:id/submit", post(submit_attempt))
}

#[instrument(skip(state, q))]
pub async fn list_tests(
    State(state): State<AppState>,
    Query(q): Query<MockTestListQuery>,
) -> AppResult<Json<Vec<MockTestSummary>>> {
    let category = q
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let difficulty = q
        .difficulty
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::parse::<TestDifficulty>)
        .transpose()?;
    Ok(Json(repo::list_published(&state.db, category, difficulty).await?))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_test(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateMockTestRequest>,
) -> AppResult<(StatusCode, Json<MockTestView>)> {
    authorize(&user, &[Role::Admin, Role::CompanyRecruiter])?;
    let new = new_mock_test(&payload, user.id)?;
    let test = repo::insert_test(&state.db, &new).await.map_err(|e| {
        if is_unique_violation(&e) {
            warn!(title = %new.title, "duplicate mock test title");
            AppError::Conflict("A mock test with this title already exists.".into())
        } else {
            AppError::from(e)
        }
    })?;
    info!(test_id = %test.id, questions = new.questions.len(), "mock test created");
    Ok((StatusCode::CREATED, Json(view(test))))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn test_for_attempt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TestForAttempt>> {
    authorize(&user, &[Role::Seeker])?;
    let test = repo::find_test(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Mock test not found or not available."))?;
    Ok(Json(for_attempt(&test)?))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn submit_attempt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> AppResult<(StatusCode, Json<SubmitAttemptResponse>)> {
    authorize(&user, &[Role::Seeker])?;
    let test = repo::find_test(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Mock test not found."))?;

    let now = OffsetDateTime::now_utc();
    let scored = score_answers(&test.questions.0, &payload.answers);
    let draft = AttemptDraft::start(user.id, &test, payload.start_time.unwrap_or(now))
        .complete(scored, now)?;
    let attempt = repo::insert_attempt(&state.db, &draft).await?;

    info!(
        attempt_id = %attempt.id,
        test_id = %id,
        score = attempt.score,
        total = attempt.total_marks_possible,
        "mock test submitted"
    );
    Ok((
        StatusCode::CREATED,
        Json(SubmitAttemptResponse {
            message: "Test submitted successfully!".into(),
            attempt_id: attempt.id,
            score: attempt.score,
            total_marks_possible: attempt.total_marks_possible,
            percentage: attempt.percentage,
        }),
    ))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn attempt_result(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TestAttempt>> {
    authorize(&user, &[Role::Seeker])?;
    let attempt = repo::find_attempt(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Test attempt not found."))?;
    ensure_attempt_owner(&attempt, user.id)?;
    Ok(Json(attempt))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_attempts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<AttemptSummary>>> {
    authorize(&user, &[Role::Seeker])?;
    Ok(Json(repo::list_attempts(&state.db, user.id).await?))
}

#[cfg(test)]
mod handler_tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn bad_difficulty_filter_is_rejected() {
        let res = routes()
            .with_state(AppState::fake())
            .oneshot(
                Request::get("/mock-tests?difficulty=Insane")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn seeker_routes_require_session() {
        let id = Uuid::new_v4();
        for uri in [
            "/mock-tests/my-attempts".to_string(),
            format!("/mock-tests/attempts/{id}"),
            format!("/mock-tests/{id}/attempt"),
        ] {
            let res = routes()
                .with_state(AppState::fake())
                .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }
}
