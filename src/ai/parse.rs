//! Validation of model output for generated test questions.
//!
//! The upstream text is untrusted: it is parsed once, every question is
//! checked against a strict shape, and any deviation becomes
//! `AppError::MalformedAiResponse`.
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::{AppError, AppResult};
use crate::mock_tests::repo_types::QuestionDifficulty;

pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
    pub explanation: String,
    pub marks: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<QuestionDifficulty>,
}

/// Strips ```json ... ``` or ``` ... ``` fences around model output.
fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(rest) => rest
            .trim_start()
            .strip_suffix("```")
            .unwrap_or(rest)
            .trim(),
        None => text,
    }
}

/// The outermost `[ ... ]` span, ignoring any chatter around it.
fn array_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (start < end).then(|| &text[start..=end])
}

fn malformed(msg: impl Into<String>) -> AppError {
    AppError::MalformedAiResponse(msg.into())
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn validate_question(n: usize, value: &Value) -> AppResult<GeneratedQuestion> {
    let invalid = |what: &str| {
        malformed(format!(
            "generated question {n} has an invalid structure ({what})"
        ))
    };
    let obj = value.as_object().ok_or_else(|| invalid("not an object"))?;

    let question_text = non_empty_str(obj, "questionText").ok_or_else(|| invalid("questionText"))?;

    let options = obj
        .get("options")
        .and_then(Value::as_array)
        .filter(|opts| opts.len() == OPTIONS_PER_QUESTION)
        .ok_or_else(|| invalid("options"))?
        .iter()
        .map(|o| o.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| invalid("options"))?;

    let correct_option_index = obj
        .get("correctOptionIndex")
        .and_then(Value::as_u64)
        .map(|i| i as usize)
        .filter(|i| *i < options.len())
        .ok_or_else(|| invalid("correctOptionIndex"))?;

    let explanation = non_empty_str(obj, "explanation").ok_or_else(|| invalid("explanation"))?;

    let marks = obj
        .get("marks")
        .and_then(Value::as_i64)
        .and_then(|m| i32::try_from(m).ok())
        .filter(|m| *m >= 0)
        .unwrap_or(1);

    let difficulty = obj
        .get("difficulty")
        .cloned()
        .and_then(|d| serde_json::from_value::<QuestionDifficulty>(d).ok());

    Ok(GeneratedQuestion {
        question_text: question_text.to_string(),
        options,
        correct_option_index,
        explanation: explanation.to_string(),
        marks,
        difficulty,
    })
}

pub fn parse_generated_questions(raw: &str) -> AppResult<Vec<GeneratedQuestion>> {
    let body = strip_fences(raw);
    let body = array_span(body).ok_or_else(|| {
        warn!(preview = %raw.chars().take(200).collect::<String>(), "no JSON array in model output");
        malformed("expected a JSON array of questions")
    })?;

    let items: Vec<Value> = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "model output is not valid JSON");
        malformed("could not parse questions")
    })?;
    if items.is_empty() {
        return Err(malformed("the array of questions was empty"));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, v)| validate_question(i + 1, v))
        .collect()
}
