use serde::{Deserialize, Serialize};

use crate::ai::{client::ChatTurn, parse::GeneratedQuestion};

#[derive(Debug, Serialize)]
pub struct ResumeFeedbackResponse {
    pub suggestions: String,
}

/// Accepts `5` as well as `"5"` from form-driven clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuestionCount {
    Number(i64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    pub category: Option<String>,
    pub topic: Option<String>,
    pub difficulty_level: Option<String>,
    pub number_of_questions: Option<QuestionCount>,
}

#[derive(Debug, Serialize)]
pub struct GenerateQuestionsResponse {
    pub message: String,
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerRoadmapRequest {
    pub role: Option<String>,
    pub current_message: Option<String>,
    pub conversation_history: Option<Vec<ChatTurn>>,
}

#[derive(Debug, Serialize)]
pub struct CareerRoadmapResponse {
    pub roadmap: String,
}
