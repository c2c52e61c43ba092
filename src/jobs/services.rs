use sqlx::{Postgres, QueryBuilder};
use time::{macros::format_description, Date, OffsetDateTime, Time};
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    db::PageWindow,
    errors::{AppError, AppResult},
    jobs::{
        dto::{CreateJobRequest, JobListQuery, JobsPage, UpdateJobRequest},
        repo_types::{ExperienceLevel, Job, JobStatus, JobType, NewJob},
    },
};

pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 2000;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

pub(crate) const JOB_COLUMNS: &str = r#"
    id, title, description, company_name, posted_by, location, salary, job_type,
    experience_level, category, skills_required, application_deadline,
    application_instructions, status, created_at, updated_at
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    fn sql(self) -> &'static str {
        match self {
            SortOrder::Newest => " ORDER BY created_at DESC",
            SortOrder::Oldest => " ORDER BY created_at ASC",
        }
    }
}

/// Filters for the public listing; every field is optional and they combine with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilters {
    pub search: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub job_type: Option<JobType>,
    pub experience_level: Option<ExperienceLevel>,
    pub sort: SortOrder,
}

fn non_empty(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

impl JobFilters {
    pub fn from_query(q: &JobListQuery) -> AppResult<(Self, PageWindow)> {
        let filters = Self {
            search: non_empty(&q.search),
            location: non_empty(&q.location),
            category: non_empty(&q.category),
            job_type: non_empty(&q.job_type).map(|s| s.parse()).transpose()?,
            experience_level: non_empty(&q.experience_level)
                .map(|s| s.parse())
                .transpose()?,
            sort: match q.sort_by.as_deref() {
                Some("oldest") => SortOrder::Oldest,
                _ => SortOrder::Newest,
            },
        };
        Ok((filters, PageWindow::new(q.page, q.limit, DEFAULT_PAGE_SIZE)))
    }
}

/// `%term%` with LIKE wildcards in the term escaped.
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn push_open_job_filters(qb: &mut QueryBuilder<'_, Postgres>, f: &JobFilters) {
    qb.push(" WHERE status = ").push_bind(JobStatus::Open);

    if let Some(search) = &f.search {
        let pat = like_pattern(search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pat.clone())
            .push(" OR description ILIKE ")
            .push_bind(pat.clone())
            .push(" OR company_name ILIKE ")
            .push_bind(pat.clone())
            .push(" OR category ILIKE ")
            .push_bind(pat.clone())
            .push(" OR array_to_string(skills_required, ' ') ILIKE ")
            .push_bind(pat)
            .push(")");
    }
    if let Some(location) = &f.location {
        qb.push(" AND location ILIKE ").push_bind(like_pattern(location));
    }
    if let Some(category) = &f.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(job_type) = f.job_type {
        qb.push(" AND job_type = ").push_bind(job_type);
    }
    if let Some(level) = f.experience_level {
        qb.push(" AND experience_level = ").push_bind(level);
    }
}

pub fn open_jobs_count_query(f: &JobFilters) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM jobs");
    push_open_job_filters(&mut qb, f);
    qb
}

pub fn open_jobs_page_query(f: &JobFilters, window: PageWindow) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs"));
    push_open_job_filters(&mut qb, f);
    qb.push(f.sort.sql());
    qb.push(" LIMIT ")
        .push_bind(window.limit)
        .push(" OFFSET ")
        .push_bind(window.offset());
    qb
}

pub fn page_of(jobs: Vec<Job>, total: i64, window: PageWindow) -> JobsPage {
    JobsPage {
        jobs,
        current_page: window.page,
        total_pages: window.total_pages(total),
        total_jobs: total,
    }
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_deadline(raw: &str) -> AppResult<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339) {
        return Ok(ts);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(|d| d.with_time(Time::MIDNIGHT).assume_utc())
        .map_err(|_| AppError::validation("Invalid application deadline"))
}

fn optional_deadline(raw: Option<&str>) -> AppResult<Option<OffsetDateTime>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_deadline(s).map(Some),
        None => Ok(None),
    }
}

fn check_lengths(title: &str, description: &str) -> AppResult<()> {
    if title.chars().count() > TITLE_MAX {
        return Err(AppError::validation(format!(
            "Job title cannot be more than {TITLE_MAX} characters"
        )));
    }
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(AppError::validation(format!(
            "Job description cannot be more than {DESCRIPTION_MAX} characters"
        )));
    }
    Ok(())
}

fn clean_skills(skills: &[String]) -> Vec<String> {
    skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Builds a posting owned by `recruiter`, stamped with the recruiter's company.
pub fn new_job(req: &CreateJobRequest, recruiter: &User) -> AppResult<NewJob> {
    let title = req.title.trim();
    let description = req.description.trim();
    let location = req.location.trim();
    let category = req.category.trim();
    if title.is_empty()
        || description.is_empty()
        || location.is_empty()
        || req.job_type.trim().is_empty()
        || category.is_empty()
    {
        return Err(AppError::validation(
            "Please provide all required job fields: title, description, location, jobType, category",
        ));
    }

    let company_name = recruiter
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            warn!(user_id = %recruiter.id, "recruiter has no company name");
            AppError::validation(
                "Company name not found for recruiter. Please update your profile.",
            )
        })?;

    check_lengths(title, description)?;

    Ok(NewJob {
        title: title.to_string(),
        description: description.to_string(),
        company_name: company_name.to_string(),
        posted_by: recruiter.id,
        location: location.to_string(),
        salary: non_empty(&req.salary),
        job_type: req.job_type.parse()?,
        experience_level: non_empty(&req.experience_level)
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or_default(),
        category: category.to_string(),
        skills_required: clean_skills(&req.skills_required),
        application_deadline: optional_deadline(req.application_deadline.as_deref())?,
        application_instructions: non_empty(&req.application_instructions),
    })
}

/// Applies a partial update in place. Company and owner never change.
pub fn apply_update(job: &mut Job, req: &UpdateJobRequest) -> AppResult<()> {
    if let Some(v) = non_empty(&req.title) {
        job.title = v;
    }
    if let Some(v) = non_empty(&req.description) {
        job.description = v;
    }
    if let Some(v) = non_empty(&req.location) {
        job.location = v;
    }
    if let Some(v) = non_empty(&req.category) {
        job.category = v;
    }
    if let Some(v) = non_empty(&req.job_type) {
        job.job_type = v.parse()?;
    }
    if let Some(v) = non_empty(&req.experience_level) {
        job.experience_level = v.parse()?;
    }
    if let Some(v) = non_empty(&req.status) {
        job.status = v.parse()?;
    }
    if let Some(skills) = &req.skills_required {
        job.skills_required = clean_skills(skills);
    }
    if let Some(salary) = &req.salary {
        job.salary = non_empty(salary);
    }
    if let Some(deadline) = &req.application_deadline {
        job.application_deadline = optional_deadline(deadline.as_deref())?;
    }
    if let Some(instructions) = &req.application_instructions {
        job.application_instructions = non_empty(instructions);
    }
    check_lengths(&job.title, &job.description)
}

/// Only the recruiter who posted a job may change or remove it.
pub fn ensure_owner(job: &Job, user_id: Uuid, action: &str) -> AppResult<()> {
    if job.posted_by != user_id {
        warn!(job_id = %job.id, %user_id, "job ownership check failed");
        return Err(AppError::forbidden(format!(
            "User not authorized to {action} this job"
        )));
    }
    Ok(())
}
