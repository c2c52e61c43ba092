use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::mock_tests::repo_types::{MockTest, QuestionDifficulty, TestDifficulty};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_option_index: Option<i64>,
    pub explanation: Option<String>,
    pub marks: Option<i32>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMockTestRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    pub topic: Option<String>,
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MockTestListQuery {
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockTestView {
    #[serde(flatten)]
    pub test: MockTest,
    pub question_count: usize,
}

/// Question as shown while the attempt is open: no answer, no explanation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptQuestion {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub question_text: String,
    pub options: Vec<String>,
    pub marks: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<QuestionDifficulty>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestForAttempt {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub topic: Option<String>,
    pub difficulty_level: TestDifficulty,
    pub questions: Vec<AttemptQuestion>,
    pub total_marks: i32,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    #[serde(default)]
    pub question_id: String,
    pub selected_option_index: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptResponse {
    pub message: String,
    pub attempt_id: Uuid,
    pub score: i32,
    pub total_marks_possible: i32,
    pub percentage: f64,
}
