use sqlx::PgPool;
use uuid::Uuid;

use crate::db::PageWindow;
use crate::jobs::repo_types::{Job, NewJob};
use crate::jobs::services::{open_jobs_count_query, open_jobs_page_query, JobFilters, JOB_COLUMNS};

pub async fn insert(db: &PgPool, new: &NewJob) -> sqlx::Result<Job> {
    sqlx::query_as::<_, Job>(&format!(
        r#"
        INSERT INTO jobs (title, description, company_name, posted_by, location, salary,
                          job_type, experience_level, category, skills_required,
                          application_deadline, application_instructions)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {JOB_COLUMNS}
        "#
    ))
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.company_name)
    .bind(new.posted_by)
    .bind(&new.location)
    .bind(&new.salary)
    .bind(new.job_type)
    .bind(new.experience_level)
    .bind(&new.category)
    .bind(&new.skills_required)
    .bind(new.application_deadline)
    .bind(&new.application_instructions)
    .fetch_one(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Job>> {
    sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Writes back every mutable column; `company_name` and `posted_by` are left alone.
pub async fn save(db: &PgPool, job: &Job) -> sqlx::Result<Job> {
    sqlx::query_as::<_, Job>(&format!(
        r#"
        UPDATE jobs
           SET title = $2, description = $3, location = $4, salary = $5, job_type = $6,
               experience_level = $7, category = $8, skills_required = $9,
               application_deadline = $10, application_instructions = $11, status = $12,
               updated_at = now()
         WHERE id = $1
        RETURNING {JOB_COLUMNS}
        "#
    ))
    .bind(job.id)
    .bind(&job.title)
    .bind(&job.description)
    .bind(&job.location)
    .bind(&job.salary)
    .bind(job.job_type)
    .bind(job.experience_level)
    .bind(&job.category)
    .bind(&job.skills_required)
    .bind(job.application_deadline)
    .bind(&job.application_instructions)
    .bind(job.status)
    .fetch_one(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn list_by_recruiter(db: &PgPool, recruiter_id: Uuid) -> sqlx::Result<Vec<Job>> {
    sqlx::query_as::<_, Job>(&format!(
        "SELECT {JOB_COLUMNS} FROM jobs WHERE posted_by = $1 ORDER BY created_at DESC"
    ))
    .bind(recruiter_id)
    .fetch_all(db)
    .await
}

/// One page of open jobs plus the total number of matches.
pub async fn list_open(
    db: &PgPool,
    filters: &JobFilters,
    window: PageWindow,
) -> sqlx::Result<(Vec<Job>, i64)> {
    let total: i64 = open_jobs_count_query(filters)
        .build_query_scalar()
        .fetch_one(db)
        .await?;
    let jobs = open_jobs_page_query(filters, window)
        .build_query_as::<Job>()
        .fetch_all(db)
        .await?;
    Ok((jobs, total))
}
