use tracing::{info, warn};

use crate::{
    ai::{
        client::{ChatRole, Generation, GenerationRequest, LlmClient},
        dto::{CareerRoadmapRequest, GenerateQuestionsRequest, QuestionCount},
        extract::ResumeTextExtractor,
        parse::{parse_generated_questions, GeneratedQuestion},
        prompts,
    },
    auth::repo_types::User,
    errors::{AppError, AppResult},
    storage::StorageClient,
};

pub const RESUME_TEXT_MIN_CHARS: usize = 50;
pub const RESUME_TEXT_MAX_CHARS: usize = 30_000;
pub const RESUME_FEEDBACK_TEMPERATURE: f32 = 0.6;
pub const CREATIVE_TEMPERATURE: f32 = 0.7;

pub const DEFAULT_QUESTION_COUNT: i64 = 5;
pub const MAX_QUESTION_COUNT: i64 = 20;
pub const DEFAULT_QUESTION_DIFFICULTY: &str = "Intermediate";

fn blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// The generated text, or `UpstreamEmpty` when nothing usable came back.
fn usable_text(generation: Generation) -> AppResult<String> {
    match generation.text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => {
            let reason = match generation.block_reason {
                Some(reason) => format!("blocked ({reason})"),
                None => "the response was empty".to_string(),
            };
            warn!(%reason, "empty generation");
            Err(AppError::UpstreamEmpty(reason))
        }
    }
}

async fn call(llm: &dyn LlmClient, req: GenerationRequest) -> AppResult<String> {
    let generation = llm
        .generate(req)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    usable_text(generation)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Markdown review of the seeker's current resume.
pub async fn resume_feedback(
    llm: &dyn LlmClient,
    extractor: &dyn ResumeTextExtractor,
    storage: &dyn StorageClient,
    seeker: &User,
) -> AppResult<String> {
    if !seeker.has_resume() {
        return Err(AppError::PreconditionFailed(
            "No resume uploaded. Please upload your resume first.".into(),
        ));
    }

    let bytes = storage
        .get_object(&seeker.resume_key)
        .await
        .map_err(|e| AppError::Extraction(e.to_string()))?;
    let text = extractor
        .extract_text(bytes, &seeker.resume_file_name)
        .await
        .map_err(|e| AppError::Extraction(e.to_string()))?;

    let text = text.trim();
    if text.chars().count() < RESUME_TEXT_MIN_CHARS {
        warn!(user_id = %seeker.id, chars = text.chars().count(), "resume text too short");
        return Err(AppError::InsufficientContent(
            "Could not extract sufficient text from the resume. Please ensure it is a text-based PDF and has enough content.".into(),
        ));
    }

    let prompt = prompts::resume_feedback(truncate_chars(text, RESUME_TEXT_MAX_CHARS));
    call(llm, GenerationRequest::single(prompt, RESUME_FEEDBACK_TEMPERATURE)).await
}

/// Validated parameters for a question-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionParams {
    pub category: String,
    pub topic: String,
    pub difficulty: String,
    pub count: u32,
}

impl QuestionParams {
    pub fn from_request(req: &GenerateQuestionsRequest) -> AppResult<Self> {
        let (Some(category), Some(topic)) = (blank(&req.category), blank(&req.topic)) else {
            return Err(AppError::validation(
                "Category and topic are required to generate questions.",
            ));
        };

        let count = match &req.number_of_questions {
            None => Some(DEFAULT_QUESTION_COUNT),
            Some(QuestionCount::Number(n)) => Some(*n),
            Some(QuestionCount::Text(s)) => s.trim().parse::<i64>().ok(),
        }
        .filter(|n| (1..=MAX_QUESTION_COUNT).contains(n))
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| AppError::validation("Number of questions must be between 1 and 20."))?;

        Ok(Self {
            category: category.to_string(),
            topic: topic.to_string(),
            difficulty: blank(&req.difficulty_level)
                .unwrap_or(DEFAULT_QUESTION_DIFFICULTY)
                .to_string(),
            count,
        })
    }
}

/// Validates the request, then asks the model. Bad input never reaches upstream.
pub async fn generate_questions(
    llm: &dyn LlmClient,
    req: &GenerateQuestionsRequest,
) -> AppResult<Vec<GeneratedQuestion>> {
    let params = QuestionParams::from_request(req)?;
    info!(
        category = %params.category,
        topic = %params.topic,
        count = params.count,
        "generating test questions"
    );
    let prompt = prompts::test_questions(params.count, &params.category, &params.topic, &params.difficulty);
    let raw = call(llm, GenerationRequest::single(prompt, CREATIVE_TEMPERATURE)).await?;
    parse_generated_questions(&raw)
}

/// First turn of a new topic gets the full roadmap template; later turns
/// forward the raw message with the client's history.
pub fn roadmap_request(req: CareerRoadmapRequest) -> AppResult<GenerationRequest> {
    let message = blank(&req.current_message)
        .ok_or_else(|| AppError::validation("A current message from the user is required."))?
        .to_string();
    let history = req.conversation_history.unwrap_or_default();

    if let Some(role) = blank(&req.role) {
        if history.is_empty() {
            return Ok(GenerationRequest::single(
                prompts::career_roadmap(role, &message),
                CREATIVE_TEMPERATURE,
            ));
        }
    }

    if history.first().is_some_and(|t| t.role != ChatRole::User) {
        warn!(turns = history.len(), "conversation history does not start with a user turn");
    }
    Ok(GenerationRequest {
        history,
        prompt: message,
        temperature: CREATIVE_TEMPERATURE,
    })
}

pub async fn career_roadmap(llm: &dyn LlmClient, req: CareerRoadmapRequest) -> AppResult<String> {
    let request = roadmap_request(req)?;
    call(llm, request).await
}

#[cfg(test)]
mod ai_service_tests {
    use super::*;
    use crate::ai::client::ChatTurn;
    use crate::auth::{repo_types::Role, services::auth_tests::user_with_role};
    use crate::state::test_support::{FakeExtractor, FakeLlm, FakeStorage};

    fn seeker_with_resume() -> User {
        let mut u = user_with_role(Role::Seeker);
        u.resume_key = "resumes/u/cv.pdf".into();
        u.resume_file_name = "cv.pdf".into();
        u
    }

    fn long_text() -> String {
        "Senior Rust engineer with eight years building distributed systems. ".repeat(3)
    }

    fn questions_req(count: Option<QuestionCount>) -> GenerateQuestionsRequest {
        GenerateQuestionsRequest {
            category: Some("JavaScript".into()),
            topic: Some("Closures".into()),
            difficulty_level: None,
            number_of_questions: count,
        }
    }

    #[tokio::test]
    async fn feedback_returns_markdown_verbatim() {
        let llm = FakeLlm::replying("## Summary\n- Strong");
        let extractor = FakeExtractor(Ok(long_text()));
        let out = resume_feedback(&llm, &extractor, &FakeStorage, &seeker_with_resume())
            .await
            .unwrap();
        assert_eq!(out, "## Summary\n- Strong");

        let sent = llm.requests.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!((sent[0].temperature - RESUME_FEEDBACK_TEMPERATURE).abs() < f32::EPSILON);
        assert!(sent[0].prompt.contains("Senior Rust engineer"));
    }

    #[tokio::test]
    async fn feedback_requires_resume() {
        let llm = FakeLlm::replying("x");
        let extractor = FakeExtractor(Ok(long_text()));
        let err = resume_feedback(&llm, &extractor, &FakeStorage, &user_with_role(Role::Seeker))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(_)));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn short_or_failed_extraction_stops_before_upstream() {
        let llm = FakeLlm::replying("x");
        let short = FakeExtractor(Ok("Jane Doe\nEngineer".into()));
        let err = resume_feedback(&llm, &short, &FakeStorage, &seeker_with_resume())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientContent(_)));

        let broken = FakeExtractor(Err("bad xref table".into()));
        let err = resume_feedback(&llm, &broken, &FakeStorage, &seeker_with_resume())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn long_resumes_are_truncated() {
        let llm = FakeLlm::replying("ok");
        let extractor = FakeExtractor(Ok("é".repeat(RESUME_TEXT_MAX_CHARS + 500)));
        resume_feedback(&llm, &extractor, &FakeStorage, &seeker_with_resume())
            .await
            .unwrap();
        let sent = llm.requests.lock().unwrap();
        let marks = sent[0].prompt.matches('é').count();
        assert_eq!(marks, RESUME_TEXT_MAX_CHARS);
    }

    #[tokio::test]
    async fn blocked_generation_is_upstream_empty() {
        let llm = FakeLlm::blocked("SAFETY");
        let extractor = FakeExtractor(Ok(long_text()));
        let err = resume_feedback(&llm, &extractor, &FakeStorage, &seeker_with_resume())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamEmpty(ref r) if r.contains("SAFETY")));

        let llm = FakeLlm::replying("   ");
        let err = resume_feedback(&llm, &extractor, &FakeStorage, &seeker_with_resume())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamEmpty(_)));
    }

    #[test]
    fn question_params_defaults_and_bounds() {
        let params = QuestionParams::from_request(&questions_req(None)).unwrap();
        assert_eq!(params.count, 5);
        assert_eq!(params.difficulty, "Intermediate");

        let params = QuestionParams::from_request(&questions_req(Some(QuestionCount::Text("12".into()))))
            .unwrap();
        assert_eq!(params.count, 12);

        for bad in [
            QuestionCount::Number(0),
            QuestionCount::Number(21),
            QuestionCount::Text("many".into()),
        ] {
            assert!(matches!(
                QuestionParams::from_request(&questions_req(Some(bad))),
                Err(AppError::Validation(_))
            ));
        }

        let mut missing_topic = questions_req(None);
        missing_topic.topic = Some("  ".into());
        assert!(QuestionParams::from_request(&missing_topic).is_err());
    }

    #[tokio::test]
    async fn too_many_questions_never_reach_upstream() {
        let llm = FakeLlm::replying("[]");
        let result = generate_questions(&llm, &questions_req(Some(QuestionCount::Number(25)))).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn generated_questions_are_validated() {
        let req = questions_req(Some(QuestionCount::Number(1)));

        let llm = FakeLlm::replying(
            "```json\n[{\"questionText\":\"Q\",\"options\":[\"a\",\"b\",\"c\",\"d\"],\"correctOptionIndex\":2,\"explanation\":\"e\"}]\n```",
        );
        let qs = generate_questions(&llm, &req).await.unwrap();
        assert_eq!(qs.len(), 1);
        assert!(llm.requests.lock().unwrap()[0].prompt.contains("\"Closures\""));

        let llm = FakeLlm::replying("[{\"questionText\":\"Q\",\"options\":[\"a\"]}]");
        assert!(matches!(
            generate_questions(&llm, &req).await,
            Err(AppError::MalformedAiResponse(_))
        ));
    }

    #[test]
    fn first_roadmap_turn_uses_template() {
        let req = roadmap_request(CareerRoadmapRequest {
            role: Some("DevOps Engineer".into()),
            current_message: Some("How do I start?".into()),
            conversation_history: None,
        })
        .unwrap();
        assert!(req.history.is_empty());
        assert!(req.prompt.contains("become a \"DevOps Engineer\""));
        assert!(req.prompt.contains("How do I start?"));
    }

    #[test]
    fn follow_up_forwards_message_with_history() {
        let history = vec![
            ChatTurn::user("roadmap please"),
            ChatTurn {
                role: ChatRole::Model,
                parts: vec![crate::ai::client::Part {
                    text: "## Roadmap".into(),
                }],
            },
        ];
        let req = roadmap_request(CareerRoadmapRequest {
            role: Some("DevOps Engineer".into()),
            current_message: Some("What about Kubernetes?".into()),
            conversation_history: Some(history.clone()),
        })
        .unwrap();
        assert_eq!(req.prompt, "What about Kubernetes?");
        assert_eq!(req.history, history);
    }

    #[test]
    fn roadmap_requires_message() {
        let err = roadmap_request(CareerRoadmapRequest {
            role: Some("QA".into()),
            current_message: Some(" ".into()),
            conversation_history: None,
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
