use sqlx::PgPool;
use uuid::Uuid;

use crate::applications::repo_types::{
    ApplicantRow, Application, ApplicationStatus, NewApplication, SeekerApplicationRow,
};

const APPLICATION_COLUMNS: &str = r#"
    a.id, a.job_id, a.seeker_id, a.recruiter_id, a.company_name, a.job_title,
    a.seeker_name, a.seeker_email, a.resume_key, a.resume_file_name, a.status,
    a.applied_at, a.updated_at
"#;

pub async fn insert(db: &PgPool, new: &NewApplication) -> sqlx::Result<Application> {
    sqlx::query_as::<_, Application>(&format!(
        r#"
        INSERT INTO applications AS a (job_id, seeker_id, recruiter_id, company_name, job_title,
                                       seeker_name, seeker_email, resume_key, resume_file_name)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {APPLICATION_COLUMNS}
        "#
    ))
    .bind(new.job_id)
    .bind(new.seeker_id)
    .bind(new.recruiter_id)
    .bind(&new.company_name)
    .bind(&new.job_title)
    .bind(&new.seeker_name)
    .bind(&new.seeker_email)
    .bind(&new.resume_key)
    .bind(&new.resume_file_name)
    .fetch_one(db)
    .await
}

pub async fn exists_for(db: &PgPool, job_id: Uuid, seeker_id: Uuid) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM applications WHERE job_id = $1 AND seeker_id = $2)",
    )
    .bind(job_id)
    .bind(seeker_id)
    .fetch_one(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Application>> {
    sqlx::query_as::<_, Application>(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications a WHERE a.id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn list_for_seeker(db: &PgPool, seeker_id: Uuid) -> sqlx::Result<Vec<SeekerApplicationRow>> {
    sqlx::query_as::<_, SeekerApplicationRow>(&format!(
        r#"
        SELECT {APPLICATION_COLUMNS},
               j.title AS job_current_title, j.company_name AS job_company_name,
               j.location AS job_location, j.job_type, j.status AS job_status
          FROM applications a
          LEFT JOIN jobs j ON j.id = a.job_id
         WHERE a.seeker_id = $1
         ORDER BY a.applied_at DESC
        "#
    ))
    .bind(seeker_id)
    .fetch_all(db)
    .await
}

pub async fn list_for_job(db: &PgPool, job_id: Uuid) -> sqlx::Result<Vec<ApplicantRow>> {
    sqlx::query_as::<_, ApplicantRow>(&format!(
        r#"
        SELECT {APPLICATION_COLUMNS},
               u.full_name AS seeker_full_name, u.email AS seeker_current_email,
               u.skills AS seeker_skills, u.bio AS seeker_bio,
               u.resume_key AS seeker_resume_key, u.resume_file_name AS seeker_resume_file_name,
               u.linkedin_url AS seeker_linkedin_url, u.portfolio_url AS seeker_portfolio_url
          FROM applications a
          LEFT JOIN users u ON u.id = a.seeker_id
         WHERE a.job_id = $1
         ORDER BY a.applied_at DESC
        "#
    ))
    .bind(job_id)
    .fetch_all(db)
    .await
}

pub async fn set_status(
    db: &PgPool,
    id: Uuid,
    status: ApplicationStatus,
) -> sqlx::Result<Application> {
    sqlx::query_as::<_, Application>(&format!(
        r#"
        UPDATE applications AS a
           SET status = $2, updated_at = now()
         WHERE a.id = $1
        RETURNING {APPLICATION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .fetch_one(db)
    .await
}
