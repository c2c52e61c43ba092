use std::collections::HashSet;

use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    mock_tests::{
        dto::{
            AttemptQuestion, CreateMockTestRequest, MockTestView, QuestionInput, SubmittedAnswer,
            TestForAttempt,
        },
        repo_types::{
            Answer, AttemptStatus, MockTest, NewMockTest, Question, TestAttempt, TestStatus,
        },
    },
};

pub const DEFAULT_MARKS: i32 = 1;
pub const MAX_MARKS: i32 = 1000;
pub const MAX_QUESTIONS: usize = 500;

pub fn total_marks(questions: &[Question]) -> i32 {
    questions.iter().fold(0i32, |acc, q| acc.saturating_add(q.marks))
}

fn trimmed(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn build_question(n: usize, input: &QuestionInput) -> AppResult<Question> {
    let text = input.question_text.trim();
    if text.is_empty() {
        return Err(AppError::validation(format!(
            "Question {n}: question text is required."
        )));
    }
    let options: Vec<String> = input.options.iter().map(|o| o.trim().to_string()).collect();
    if options.len() < 2 || options.iter().any(String::is_empty) {
        return Err(AppError::validation(format!(
            "Question {n}: at least two non-empty options are required."
        )));
    }
    let correct = input
        .correct_option_index
        .filter(|i| *i >= 0 && (*i as usize) < options.len())
        .ok_or_else(|| {
            AppError::validation(format!(
                "Question {n}: correct option index is out of bounds."
            ))
        })? as usize;
    let marks = input.marks.unwrap_or(DEFAULT_MARKS);
    if marks < 0 {
        return Err(AppError::validation(format!(
            "Question {n}: marks cannot be negative."
        )));
    }
    if marks > MAX_MARKS {
        return Err(AppError::validation(format!(
            "Question {n}: marks cannot be more than {MAX_MARKS}."
        )));
    }

    Ok(Question {
        id: Uuid::new_v4(),
        question_text: text.to_string(),
        options,
        correct_option_index: correct,
        explanation: trimmed(&input.explanation).unwrap_or_default(),
        marks,
        difficulty: trimmed(&input.difficulty).map(|d| d.parse()).transpose()?,
    })
}

/// Validates a new test and gives every question a stable id. Tests created
/// through the API are published immediately.
pub fn new_mock_test(req: &CreateMockTestRequest, created_by: Uuid) -> AppResult<NewMockTest> {
    let title = req.title.trim();
    let category = req.category.trim();
    let duration = req.duration_minutes;
    if title.is_empty() || category.is_empty() || req.questions.is_empty() || duration.is_none() {
        return Err(AppError::validation(
            "Title, category, questions, and duration are required.",
        ));
    }
    let duration_minutes = duration.unwrap_or_default();
    if duration_minutes < 1 {
        return Err(AppError::validation("Duration must be at least 1 minute."));
    }
    if req.questions.len() > MAX_QUESTIONS {
        return Err(AppError::validation(format!(
            "A test cannot have more than {MAX_QUESTIONS} questions."
        )));
    }

    let questions = req
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| build_question(i + 1, q))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(NewMockTest {
        title: title.to_string(),
        description: trimmed(&req.description),
        category: category.to_string(),
        topic: trimmed(&req.topic),
        difficulty_level: trimmed(&req.difficulty_level)
            .map(|d| d.parse())
            .transpose()?
            .unwrap_or_default(),
        total_marks: total_marks(&questions),
        questions,
        duration_minutes,
        status: TestStatus::Published,
        created_by,
    })
}

pub fn view(test: MockTest) -> MockTestView {
    let question_count = test.questions.0.len();
    MockTestView {
        test,
        question_count,
    }
}

/// Marks available in an attempt. The cached total wins unless it is missing
/// or disagrees with a nonzero sum over the questions.
pub fn marks_possible(test: &MockTest) -> i32 {
    let recomputed = total_marks(&test.questions.0);
    match test.total_marks {
        Some(stored) if recomputed == 0 || stored == recomputed => stored,
        stored => {
            warn!(test_id = %test.id, ?stored, recomputed, "recomputing total marks");
            recomputed
        }
    }
}

/// Published test with answers and explanations removed.
pub fn for_attempt(test: &MockTest) -> AppResult<TestForAttempt> {
    if test.status != TestStatus::Published {
        return Err(AppError::not_found("Mock test not found or not available."));
    }
    Ok(TestForAttempt {
        id: test.id,
        title: test.title.clone(),
        description: test.description.clone(),
        category: test.category.clone(),
        topic: test.topic.clone(),
        difficulty_level: test.difficulty_level,
        questions: test
            .questions
            .0
            .iter()
            .map(|q| AttemptQuestion {
                id: q.id,
                question_text: q.question_text.clone(),
                options: q.options.clone(),
                marks: q.marks,
                difficulty: q.difficulty,
            })
            .collect(),
        total_marks: marks_possible(test),
        duration_minutes: test.duration_minutes,
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scored {
    pub answers: Vec<Answer>,
    pub score: i32,
}

/// Grades submitted answers against the test's questions. Answers naming an
/// unknown question are skipped, and only the first answer per question counts.
pub fn score_answers(questions: &[Question], submitted: &[SubmittedAnswer]) -> Scored {
    let mut seen = HashSet::new();
    let mut scored = Scored::default();

    for sub in submitted {
        let Some(question) = Uuid::parse_str(sub.question_id.trim())
            .ok()
            .and_then(|id| questions.iter().find(|q| q.id == id))
        else {
            debug!(question_id = %sub.question_id, "answer for unknown question skipped");
            continue;
        };
        if !seen.insert(question.id) {
            continue;
        }

        let is_correct = sub
            .selected_option_index
            .is_some_and(|i| i >= 0 && i as usize == question.correct_option_index);
        let marks_awarded = if is_correct { question.marks } else { 0 };
        scored.score = scored.score.saturating_add(marks_awarded);
        scored.answers.push(Answer {
            question_id: question.id,
            question_text: question.question_text.clone(),
            options_provided: question.options.clone(),
            selected_option_index: sub.selected_option_index,
            correct_option_index: question.correct_option_index,
            is_correct,
            marks_awarded,
            explanation: question.explanation.clone(),
        });
    }
    scored
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn percentage(score: i32, total_marks_possible: i32) -> f64 {
    if total_marks_possible > 0 {
        round2(f64::from(score) / f64::from(total_marks_possible) * 100.0)
    } else {
        0.0
    }
}

impl AttemptStatus {
    /// `inprogress` may finish as `completed` or `abandoned`; both are terminal.
    pub fn transition(self, next: AttemptStatus) -> AppResult<AttemptStatus> {
        match (self, next) {
            (AttemptStatus::InProgress, AttemptStatus::Completed)
            | (AttemptStatus::InProgress, AttemptStatus::Abandoned) => Ok(next),
            (from, to) => Err(AppError::InvalidState(format!(
                "Attempt cannot move from {from:?} to {to:?}."
            ))),
        }
    }
}

/// Attempt being assembled before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptDraft {
    pub seeker_id: Uuid,
    pub mock_test_id: Uuid,
    pub mock_test_title: String,
    pub category: String,
    pub topic: Option<String>,
    pub answers: Vec<Answer>,
    pub score: i32,
    pub total_marks_possible: i32,
    pub percentage: f64,
    pub status: AttemptStatus,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub time_taken_seconds: Option<i64>,
}

impl AttemptDraft {
    pub fn start(seeker_id: Uuid, test: &MockTest, start_time: OffsetDateTime) -> Self {
        Self {
            seeker_id,
            mock_test_id: test.id,
            mock_test_title: test.title.clone(),
            category: test.category.clone(),
            topic: test.topic.clone(),
            answers: Vec::new(),
            score: 0,
            total_marks_possible: marks_possible(test),
            percentage: 0.0,
            status: AttemptStatus::InProgress,
            start_time,
            end_time: None,
            time_taken_seconds: None,
        }
    }

    /// Records the graded answers and closes the attempt. Percentage and elapsed
    /// time are derived here and nowhere else.
    pub fn complete(mut self, scored: Scored, end_time: OffsetDateTime) -> AppResult<Self> {
        self.status = self.status.transition(AttemptStatus::Completed)?;
        self.answers = scored.answers;
        self.score = scored.score;
        self.percentage = percentage(self.score, self.total_marks_possible);
        self.end_time = Some(end_time);
        let elapsed = (end_time - self.start_time).as_seconds_f64().round() as i64;
        self.time_taken_seconds = Some(elapsed.max(0));
        Ok(self)
    }
}

pub fn ensure_attempt_owner(attempt: &TestAttempt, user_id: Uuid) -> AppResult<()> {
    if attempt.seeker_id != user_id {
        warn!(attempt_id = %attempt.id, %user_id, "attempt belongs to another seeker");
        return Err(AppError::forbidden("Not authorized to view this attempt."));
    }
    Ok(())
}

#[cfg(test)]
mod mock_test_tests {
    use super::*;
    use crate::mock_tests::repo_types::TestDifficulty;
    use sqlx::types::Json;
    use time::Duration;

    fn question(marks: i32, correct: usize) -> Question {
        Question {
            id: Uuid::new_v4(),
            question_text: "Q?".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_option_index: correct,
            explanation: "because".into(),
            marks,
            difficulty: None,
        }
    }

    fn test_with(questions: Vec<Question>, total: Option<i32>) -> MockTest {
        let now = OffsetDateTime::now_utc();
        MockTest {
            id: Uuid::new_v4(),
            title: "Rust basics".into(),
            description: None,
            category: "Software Development".into(),
            topic: Some("Rust".into()),
            difficulty_level: TestDifficulty::Intermediate,
            questions: Json(questions),
            total_marks: total,
            duration_minutes: 30,
            status: TestStatus::Published,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn answer(q: &Question, selected: Option<i64>) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: q.id.to_string(),
            selected_option_index: selected,
        }
    }

    #[test]
    fn three_question_scenario() {
        let q1 = question(2, 1);
        let q2 = question(1, 0);
        let q3 = question(1, 3);
        let test = test_with(vec![q1.clone(), q2.clone(), q3], Some(4));

        let start = OffsetDateTime::now_utc() - Duration::seconds(90);
        let scored = score_answers(
            &test.questions.0,
            &[answer(&q1, Some(1)), answer(&q2, Some(2))],
        );
        let attempt = AttemptDraft::start(Uuid::new_v4(), &test, start)
            .complete(scored, start + Duration::seconds(90))
            .unwrap();

        assert_eq!(attempt.score, 2);
        assert_eq!(attempt.total_marks_possible, 4);
        assert_eq!(attempt.percentage, 50.0);
        assert_eq!(attempt.status, AttemptStatus::Completed);
        assert_eq!(attempt.time_taken_seconds, Some(90));
        assert_eq!(attempt.answers.len(), 2);
        assert!(attempt.answers[0].is_correct);
        assert_eq!(attempt.answers[0].marks_awarded, 2);
        assert!(!attempt.answers[1].is_correct);
        assert_eq!(attempt.answers[1].marks_awarded, 0);
        assert_eq!(attempt.answers[1].explanation, "because");
    }

    #[test]
    fn unknown_and_duplicate_answers_are_ignored() {
        let q1 = question(3, 0);
        let questions = vec![q1.clone()];
        let scored = score_answers(
            &questions,
            &[
                SubmittedAnswer {
                    question_id: Uuid::new_v4().to_string(),
                    selected_option_index: Some(0),
                },
                SubmittedAnswer {
                    question_id: "not-a-uuid".into(),
                    selected_option_index: Some(0),
                },
                answer(&q1, Some(0)),
                answer(&q1, Some(0)),
            ],
        );
        assert_eq!(scored.answers.len(), 1);
        assert_eq!(scored.score, 3);
    }

    #[test]
    fn empty_submission_scores_zero() {
        let test = test_with(vec![question(1, 0)], Some(1));
        let scored = score_answers(&test.questions.0, &[]);
        let now = OffsetDateTime::now_utc();
        let attempt = AttemptDraft::start(Uuid::new_v4(), &test, now)
            .complete(scored, now)
            .unwrap();
        assert_eq!(attempt.score, 0);
        assert_eq!(attempt.percentage, 0.0);
        assert!(attempt.answers.is_empty());
    }

    #[test]
    fn null_or_negative_selection_is_wrong() {
        let q = question(1, 0);
        let scored = score_answers(
            std::slice::from_ref(&q),
            &[answer(&q, None)],
        );
        assert_eq!(scored.score, 0);
        assert_eq!(scored.answers[0].selected_option_index, None);

        let scored = score_answers(std::slice::from_ref(&q), &[answer(&q, Some(-1))]);
        assert!(!scored.answers[0].is_correct);
    }

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 5), 100.0);
    }

    #[test]
    fn marks_possible_prefers_consistent_cache() {
        let qs = vec![question(2, 0), question(3, 0)];
        assert_eq!(marks_possible(&test_with(qs.clone(), Some(5))), 5);
        assert_eq!(marks_possible(&test_with(qs.clone(), None)), 5);
        assert_eq!(marks_possible(&test_with(qs.clone(), Some(0))), 5);
        assert_eq!(marks_possible(&test_with(qs, Some(9))), 5);

        let zero = vec![question(0, 0)];
        assert_eq!(marks_possible(&test_with(zero, Some(0))), 0);
    }

    #[test]
    fn client_clock_ahead_is_clamped() {
        let test = test_with(vec![question(1, 0)], Some(1));
        let now = OffsetDateTime::now_utc();
        let attempt = AttemptDraft::start(Uuid::new_v4(), &test, now + Duration::minutes(5))
            .complete(Scored::default(), now)
            .unwrap();
        assert_eq!(attempt.time_taken_seconds, Some(0));
    }

    #[test]
    fn attempt_state_machine() {
        assert_eq!(
            AttemptStatus::InProgress
                .transition(AttemptStatus::Abandoned)
                .unwrap(),
            AttemptStatus::Abandoned
        );
        assert!(AttemptStatus::Completed
            .transition(AttemptStatus::InProgress)
            .is_err());
        assert!(AttemptStatus::Abandoned
            .transition(AttemptStatus::Completed)
            .is_err());

        let test = test_with(vec![question(1, 0)], Some(1));
        let now = OffsetDateTime::now_utc();
        let done = AttemptDraft::start(Uuid::new_v4(), &test, now)
            .complete(Scored::default(), now)
            .unwrap();
        assert!(matches!(
            done.complete(Scored::default(), now),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn attempt_view_hides_answers() {
        let test = test_with(vec![question(2, 3)], Some(2));
        let view = for_attempt(&test).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        let q = &json["questions"][0];
        assert!(q.get("correctOptionIndex").is_none());
        assert!(q.get("explanation").is_none());
        assert_eq!(q["marks"], 2);
        assert_eq!(json["totalMarks"], 2);

        let mut draft = test.clone();
        draft.status = TestStatus::Draft;
        assert!(matches!(for_attempt(&draft), Err(AppError::NotFound(_))));
    }

    fn create_req() -> CreateMockTestRequest {
        CreateMockTestRequest {
            title: "Rust 101".into(),
            category: "Software Development".into(),
            duration_minutes: Some(20),
            questions: vec![
                QuestionInput {
                    question_text: "Which keyword declares a binding?".into(),
                    options: vec!["let".into(), "var".into()],
                    correct_option_index: Some(0),
                    marks: Some(3),
                    difficulty: Some("Easy".into()),
                    ..Default::default()
                },
                QuestionInput {
                    question_text: "Ownership moves on assignment?".into(),
                    options: vec!["yes".into(), "no".into()],
                    correct_option_index: Some(0),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn new_test_totals_marks_and_publishes() {
        let creator = Uuid::new_v4();
        let t = new_mock_test(&create_req(), creator).unwrap();
        assert_eq!(t.total_marks, 4);
        assert_eq!(t.questions[1].marks, DEFAULT_MARKS);
        assert_eq!(t.status, TestStatus::Published);
        assert_eq!(t.difficulty_level, TestDifficulty::Intermediate);
        assert_ne!(t.questions[0].id, t.questions[1].id);
        assert_eq!(t.created_by, creator);
    }

    #[test]
    fn new_test_validation() {
        let mut req = create_req();
        req.questions[0].correct_option_index = Some(2);
        assert!(matches!(
            new_mock_test(&req, Uuid::new_v4()),
            Err(AppError::Validation(_))
        ));

        let mut req = create_req();
        req.questions[1].options = vec!["only".into()];
        assert!(new_mock_test(&req, Uuid::new_v4()).is_err());

        let mut req = create_req();
        req.duration_minutes = Some(0);
        assert!(new_mock_test(&req, Uuid::new_v4()).is_err());

        let mut req = create_req();
        req.questions.clear();
        assert!(new_mock_test(&req, Uuid::new_v4()).is_err());

        let mut req = create_req();
        req.difficulty_level = Some("Impossible".into());
        assert!(new_mock_test(&req, Uuid::new_v4()).is_err());

        let mut req = create_req();
        req.questions[0].marks = Some(-1);
        assert!(new_mock_test(&req, Uuid::new_v4()).is_err());

        let mut req = create_req();
        for q in req.questions.iter_mut() {
            q.marks = Some(i32::MAX);
        }
        assert!(matches!(
            new_mock_test(&req, Uuid::new_v4()),
            Err(AppError::Validation(_))
        ));

        let mut req = create_req();
        req.questions[0].marks = Some(MAX_MARKS);
        req.questions[1].marks = Some(MAX_MARKS);
        let created = new_mock_test(&req, Uuid::new_v4()).unwrap();
        assert_eq!(created.total_marks, total_marks(&created.questions));
    }
}
