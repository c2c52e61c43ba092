use serde::{Deserialize, Deserializer, Serialize};

use crate::jobs::repo_types::Job;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub salary: Option<String>,
    #[serde(default)]
    pub job_type: String,
    pub experience_level: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub skills_required: Vec<String>,
    pub application_deadline: Option<String>,
    pub application_instructions: Option<String>,
}

/// Partial update. For the nullable fields, an explicit `null` clears the value
/// while an absent key leaves it untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub salary: Option<Option<String>>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub category: Option<String>,
    pub skills_required: Option<Vec<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub application_deadline: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub application_instructions: Option<Option<String>>,
    pub status: Option<String>,
}

fn explicit<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Query string of `GET /jobs`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListQuery {
    pub search: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsPage {
    pub jobs: Vec<Job>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_jobs: i64,
}

#[cfg(test)]
mod dto_tests {
    use super::*;

    #[test]
    fn update_distinguishes_null_from_absent() {
        let req: UpdateJobRequest =
            serde_json::from_str(r#"{"salary": null, "title": "New"}"#).unwrap();
        assert_eq!(req.salary, Some(None));
        assert_eq!(req.application_instructions, None);
        assert_eq!(req.title.as_deref(), Some("New"));
    }
}
