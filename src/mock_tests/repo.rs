use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::mock_tests::repo_types::{
    AttemptSummary, MockTest, MockTestSummary, NewMockTest, TestAttempt, TestDifficulty,
    TestStatus,
};
use crate::mock_tests::services::AttemptDraft;

const TEST_COLUMNS: &str = r#"
    id, title, description, category, topic, difficulty_level, questions, total_marks,
    duration_minutes, status, created_by, created_at, updated_at
"#;

const ATTEMPT_COLUMNS: &str = r#"
    id, seeker_id, mock_test_id, mock_test_title, category, topic, answers, score,
    total_marks_possible, percentage, status, start_time, end_time, time_taken_seconds,
    created_at
"#;

pub async fn insert_test(db: &PgPool, new: &NewMockTest) -> sqlx::Result<MockTest> {
    sqlx::query_as::<_, MockTest>(&format!(
        r#"
        INSERT INTO mock_tests (title, description, category, topic, difficulty_level,
                                questions, total_marks, duration_minutes, status, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {TEST_COLUMNS}
        "#
    ))
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.category)
    .bind(&new.topic)
    .bind(new.difficulty_level)
    .bind(Json(&new.questions))
    .bind(new.total_marks)
    .bind(new.duration_minutes)
    .bind(new.status)
    .bind(new.created_by)
    .fetch_one(db)
    .await
}

pub async fn find_test(db: &PgPool, id: Uuid) -> sqlx::Result<Option<MockTest>> {
    sqlx::query_as::<_, MockTest>(&format!("SELECT {TEST_COLUMNS} FROM mock_tests WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub(crate) fn published_query(
    category: Option<String>,
    difficulty: Option<TestDifficulty>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        r#"SELECT id, title, description, category, topic, difficulty_level, total_marks,
                  duration_minutes, jsonb_array_length(questions) AS question_count, created_at
             FROM mock_tests WHERE status = "#,
    );
    qb.push_bind(TestStatus::Published);
    if let Some(category) = category {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(difficulty) = difficulty {
        qb.push(" AND difficulty_level = ").push_bind(difficulty);
    }
    qb.push(" ORDER BY created_at DESC");
    qb
}

pub async fn list_published(
    db: &PgPool,
    category: Option<String>,
    difficulty: Option<TestDifficulty>,
) -> sqlx::Result<Vec<MockTestSummary>> {
    published_query(category, difficulty)
        .build_query_as::<MockTestSummary>()
        .fetch_all(db)
        .await
}

pub async fn insert_attempt(db: &PgPool, a: &AttemptDraft) -> sqlx::Result<TestAttempt> {
    sqlx::query_as::<_, TestAttempt>(&format!(
        r#"
        INSERT INTO test_attempts (seeker_id, mock_test_id, mock_test_title, category, topic,
                                   answers, score, total_marks_possible, percentage, status,
                                   start_time, end_time, time_taken_seconds)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {ATTEMPT_COLUMNS}
        "#
    ))
    .bind(a.seeker_id)
    .bind(a.mock_test_id)
    .bind(&a.mock_test_title)
    .bind(&a.category)
    .bind(&a.topic)
    .bind(Json(&a.answers))
    .bind(a.score)
    .bind(a.total_marks_possible)
    .bind(a.percentage)
    .bind(a.status)
    .bind(a.start_time)
    .bind(a.end_time)
    .bind(a.time_taken_seconds)
    .fetch_one(db)
    .await
}

pub async fn find_attempt(db: &PgPool, id: Uuid) -> sqlx::Result<Option<TestAttempt>> {
    sqlx::query_as::<_, TestAttempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM test_attempts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn list_attempts(db: &PgPool, seeker_id: Uuid) -> sqlx::Result<Vec<AttemptSummary>> {
    sqlx::query_as::<_, AttemptSummary>(
        r#"
        SELECT id, mock_test_id, mock_test_title, category, score, total_marks_possible,
               percentage, status, time_taken_seconds, created_at
          FROM test_attempts
         WHERE seeker_id = $1
         ORDER BY created_at DESC
        "#,
    )
    .bind(seeker_id)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod repo_tests {
    use super::*;

    #[test]
    fn published_query_binds_filters_in_order() {
        let qb = published_query(Some("Design".into()), Some(TestDifficulty::Mixed));
        let sql = qb.sql();
        assert!(sql.contains("WHERE status = $1"));
        assert!(sql.contains("AND category = $2"));
        assert!(sql.contains("AND difficulty_level = $3"));
        assert!(sql.ends_with("ORDER BY created_at DESC"));

        let plain = published_query(None, None);
        assert!(!plain.sql().contains("$2"));
    }
}
