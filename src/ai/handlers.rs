use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    ai::{
        dto::{
            CareerRoadmapRequest, CareerRoadmapResponse, GenerateQuestionsRequest,
            GenerateQuestionsResponse, ResumeFeedbackResponse,
        },
        services::{career_roadmap, generate_questions, resume_feedback},
    },
    auth::{extractors::CurrentUser, repo_types::Role, services::authorize},
    errors::AppResult,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ai/resume-feedback", post(get_resume_feedback))
        .route("/ai/generate-test-questions", post(generate_test_questions))
        .route("/ai/career-roadmap", post(get_career_roadmap))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_resume_feedback(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ResumeFeedbackResponse>> {
    authorize(&user, &[Role::Seeker])?;
    let suggestions = resume_feedback(
        state.llm.as_ref(),
        state.extractor.as_ref(),
        state.storage.as_ref(),
        &user,
    )
    .await?;
    info!("resume feedback generated");
    Ok(Json(ResumeFeedbackResponse { suggestions }))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn generate_test_questions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<GenerateQuestionsRequest>,
) -> AppResult<Json<GenerateQuestionsResponse>> {
    let questions = generate_questions(state.llm.as_ref(), &payload).await?;
    Ok(Json(GenerateQuestionsResponse {
        message: format!("{} questions generated successfully.", questions.len()),
        questions,
    }))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn get_career_roadmap(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CareerRoadmapRequest>,
) -> AppResult<Json<CareerRoadmapResponse>> {
    authorize(&user, &[Role::Seeker])?;
    let roadmap = career_roadmap(state.llm.as_ref(), payload).await?;
    Ok(Json(CareerRoadmapResponse { roadmap }))
}

#[cfg(test)]
mod handler_tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn ai_routes_require_session() {
        for uri in [
            "/ai/resume-feedback",
            "/ai/generate-test-questions",
            "/ai/career-roadmap",
        ] {
            let res = routes()
                .with_state(AppState::fake())
                .oneshot(
                    Request::post(uri)
                        .header("content-type", "application/json")
                        .body(Body::from("{}"))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }
}
