use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "test_difficulty")]
pub enum TestDifficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Mixed,
}

/// Per-question difficulty; stored inside the questions document only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionDifficulty {
    Easy,
    Medium,
    Hard,
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "test_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attempt_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    #[default]
    InProgress,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
    #[serde(default)]
    pub explanation: String,
    pub marks: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<QuestionDifficulty>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MockTest {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub topic: Option<String>,
    pub difficulty_level: TestDifficulty,
    pub questions: Json<Vec<Question>>,
    /// Cached sum of question marks; may be missing on imported rows.
    pub total_marks: Option<i32>,
    pub duration_minutes: i32,
    pub status: TestStatus,
    pub created_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMockTest {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub topic: Option<String>,
    pub difficulty_level: TestDifficulty,
    pub questions: Vec<Question>,
    pub total_marks: i32,
    pub duration_minutes: i32,
    pub status: TestStatus,
    pub created_by: Uuid,
}

/// Listing projection of a published test.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MockTestSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub topic: Option<String>,
    pub difficulty_level: TestDifficulty,
    pub total_marks: Option<i32>,
    pub duration_minutes: i32,
    pub question_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Reviewed answer, frozen at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: Uuid,
    pub question_text: String,
    pub options_provided: Vec<String>,
    pub selected_option_index: Option<i64>,
    pub correct_option_index: usize,
    pub is_correct: bool,
    pub marks_awarded: i32,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TestAttempt {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub seeker_id: Uuid,
    pub mock_test_id: Uuid,
    pub mock_test_title: String,
    pub category: String,
    pub topic: Option<String>,
    pub answers: Json<Vec<Answer>>,
    pub score: i32,
    pub total_marks_possible: i32,
    pub percentage: f64,
    pub status: AttemptStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub time_taken_seconds: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub mock_test_id: Uuid,
    pub mock_test_title: String,
    pub category: String,
    pub score: i32,
    pub total_marks_possible: i32,
    pub percentage: f64,
    pub status: AttemptStatus,
    pub time_taken_seconds: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl std::str::FromStr for TestDifficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Beginner" => Ok(TestDifficulty::Beginner),
            "Intermediate" => Ok(TestDifficulty::Intermediate),
            "Advanced" => Ok(TestDifficulty::Advanced),
            "Mixed" => Ok(TestDifficulty::Mixed),
            other => Err(AppError::validation(format!(
                "`{other}` is not a valid test difficulty"
            ))),
        }
    }
}

impl std::str::FromStr for QuestionDifficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Easy" => Ok(QuestionDifficulty::Easy),
            "Medium" => Ok(QuestionDifficulty::Medium),
            "Hard" => Ok(QuestionDifficulty::Hard),
            "Beginner" => Ok(QuestionDifficulty::Beginner),
            "Intermediate" => Ok(QuestionDifficulty::Intermediate),
            "Advanced" => Ok(QuestionDifficulty::Advanced),
            other => Err(AppError::validation(format!(
                "`{other}` is not a valid question difficulty"
            ))),
        }
    }
}
