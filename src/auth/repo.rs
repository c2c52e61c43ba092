use crate::auth::repo_types::{NewUser, ProfileUpdate, User};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

pub(crate) const USER_COLUMNS: &str = r#"
    id, full_name, email, password_hash, role, company_name, bio, skills,
    resume_key, resume_file_name, linkedin_url, portfolio_url,
    password_reset_hash, password_reset_expires, created_at, updated_at
"#;

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Create a new user with hashed password.
    pub async fn create(db: &PgPool, new: &NewUser<'_>) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (full_name, email, password_hash, role, company_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.full_name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.role)
        .bind(new.company_name)
        .fetch_one(db)
        .await
    }

    /// Store a reset-token digest, replacing any earlier one.
    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token_hash: &str,
        expires: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET password_reset_hash = $2, password_reset_expires = $3, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn clear_reset_token(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET password_reset_hash = NULL, password_reset_expires = NULL, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn find_by_reset_hash(db: &PgPool, token_hash: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE password_reset_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(db)
        .await
    }

    /// Swap the password and burn the reset token in one statement.
    /// Returns false when the token was consumed or expired in the meantime.
    pub async fn complete_password_reset(
        db: &PgPool,
        id: Uuid,
        token_hash: &str,
        new_password_hash: &str,
    ) -> sqlx::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $3,
                   password_reset_hash = NULL,
                   password_reset_expires = NULL,
                   updated_at = now()
             WHERE id = $1
               AND password_reset_hash = $2
               AND password_reset_expires > now()
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(new_password_hash)
        .execute(db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Overwrite the seeker-editable profile fields.
    pub async fn update_profile(db: &PgPool, id: Uuid, p: &ProfileUpdate) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET full_name = $2, bio = $3, skills = $4, linkedin_url = $5, portfolio_url = $6,
                   updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&p.full_name)
        .bind(&p.bio)
        .bind(&p.skills)
        .bind(&p.linkedin_url)
        .bind(&p.portfolio_url)
        .fetch_one(db)
        .await
    }

    pub async fn set_resume(
        db: &PgPool,
        id: Uuid,
        resume_key: &str,
        resume_file_name: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET resume_key = $2, resume_file_name = $3, updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(resume_key)
        .bind(resume_file_name)
        .fetch_one(db)
        .await
    }
}
