use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use tracing::warn;

use crate::auth::password::MIN_PASSWORD_LEN;
use crate::auth::repo_types::{Role, User};
use crate::errors::{AppError, AppResult};

pub const RESET_TOKEN_TTL: Duration = Duration::minutes(10);

pub const FORGOT_PASSWORD_ACK: &str =
    "If an account with that email exists, a password reset link has been sent.";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validated registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub company_name: Option<String>,
}

impl Registration {
    pub fn seeker(full_name: &str, email: &str, password: &str) -> AppResult<Self> {
        Self::build(full_name, email, password, Role::Seeker, None)
    }

    pub fn recruiter(
        full_name: &str,
        email: &str,
        password: &str,
        company_name: &str,
    ) -> AppResult<Self> {
        if company_name.trim().is_empty() {
            return Err(AppError::validation(
                "Please provide full name, email, password, and company name",
            ));
        }
        Self::build(
            full_name,
            email,
            password,
            Role::CompanyRecruiter,
            Some(company_name.trim().to_string()),
        )
    }

    fn build(
        full_name: &str,
        email: &str,
        password: &str,
        role: Role,
        company_name: Option<String>,
    ) -> AppResult<Self> {
        let full_name = full_name.trim();
        let email = normalize_email(email);
        if full_name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Please provide all required fields"));
        }
        if !is_valid_email(&email) {
            warn!(%email, "invalid email");
            return Err(AppError::validation("Please provide a valid email"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(Self {
            full_name: full_name.to_string(),
            email,
            password: password.to_string(),
            role,
            company_name,
        })
    }
}

/// Fails with `Forbidden` unless the user's role is in `allowed`.
pub fn authorize(user: &User, allowed: &[Role]) -> AppResult<()> {
    if allowed.contains(&user.role) {
        return Ok(());
    }
    let allowed: Vec<&str> = allowed.iter().map(Role::as_str).collect();
    warn!(user_id = %user.id, role = user.role.as_str(), "role not permitted");
    Err(AppError::forbidden(format!(
        "Forbidden: User role '{}' is not authorized to access this route. Allowed roles: {}",
        user.role.as_str(),
        allowed.join(", ")
    )))
}

/// A fresh single-use reset token: the raw value for the link and its stored digest.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub raw: String,
    pub hash: String,
    pub expires: OffsetDateTime,
}

pub fn generate_reset_token(now: OffsetDateTime) -> ResetToken {
    let mut buf = [0u8; 32];
    OsRng.fill_bytes(&mut buf);
    let raw = hex::encode(buf);
    let hash = hash_reset_token(&raw);
    ResetToken {
        raw,
        hash,
        expires: now + RESET_TOKEN_TTL,
    }
}

pub fn hash_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

pub fn reset_link(frontend_url: &str, raw_token: &str) -> String {
    format!("{}/reset-password/{}", frontend_url.trim_end_matches('/'), raw_token)
}

/// The stored digest must match and not be past its expiry.
pub fn check_reset_token(user: &User, presented_hash: &str, now: OffsetDateTime) -> AppResult<()> {
    match (&user.password_reset_hash, user.password_reset_expires) {
        (Some(stored), Some(expires)) if stored == presented_hash && expires > now => Ok(()),
        _ => Err(AppError::InvalidOrExpiredToken),
    }
}

pub fn validate_new_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Please provide a new password with at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod auth_tests {
    use super::*;
    use uuid::Uuid;

    pub(crate) fn user_with_role(role: Role) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            password_hash: "x".into(),
            role,
            company_name: None,
            bio: String::new(),
            skills: vec![],
            resume_key: String::new(),
            resume_file_name: String::new(),
            linkedin_url: String::new(),
            portfolio_url: String::new(),
            password_reset_hash: None,
            password_reset_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn seeker_registration_requires_fields() {
        assert!(matches!(
            Registration::seeker("", "a@b.co", "secret1"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Registration::seeker("Ada", "a@b.co", "12345"),
            Err(AppError::Validation(_))
        ));
        let reg = Registration::seeker(" Ada ", " A@B.co ", "secret1").unwrap();
        assert_eq!(reg.full_name, "Ada");
        assert_eq!(reg.email, "a@b.co");
        assert_eq!(reg.role, Role::Seeker);
        assert_eq!(reg.company_name, None);
    }

    #[test]
    fn recruiter_registration_requires_company() {
        assert!(matches!(
            Registration::recruiter("Ada", "a@b.co", "secret1", "  "),
            Err(AppError::Validation(_))
        ));
        let reg = Registration::recruiter("Ada", "a@b.co", "secret1", "Acme").unwrap();
        assert_eq!(reg.role, Role::CompanyRecruiter);
        assert_eq!(reg.company_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn authorize_checks_role_set() {
        let seeker = user_with_role(Role::Seeker);
        assert!(authorize(&seeker, &[Role::Seeker]).is_ok());
        let err = authorize(&seeker, &[Role::CompanyRecruiter, Role::Admin]).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(err.to_string().contains("company_recruiter, admin"));
    }

    #[test]
    fn reset_token_digest_is_stable_and_not_the_raw_value() {
        let now = OffsetDateTime::now_utc();
        let token = generate_reset_token(now);
        assert_eq!(token.raw.len(), 64);
        assert_ne!(token.raw, token.hash);
        assert_eq!(hash_reset_token(&token.raw), token.hash);
        assert_eq!(token.expires - now, RESET_TOKEN_TTL);
        assert_ne!(generate_reset_token(now).raw, token.raw);
    }

    #[test]
    fn reset_token_liveness() {
        let now = OffsetDateTime::now_utc();
        let token = generate_reset_token(now);
        let mut user = user_with_role(Role::Seeker);

        assert!(matches!(
            check_reset_token(&user, &token.hash, now),
            Err(AppError::InvalidOrExpiredToken)
        ));

        user.password_reset_hash = Some(token.hash.clone());
        user.password_reset_expires = Some(token.expires);
        assert!(check_reset_token(&user, &token.hash, now).is_ok());
        assert!(check_reset_token(&user, &hash_reset_token("other"), now).is_err());
        assert!(check_reset_token(&user, &token.hash, now + Duration::minutes(11)).is_err());
    }

    #[test]
    fn reset_link_joins_cleanly() {
        assert_eq!(
            reset_link("http://localhost:5173/", "abc"),
            "http://localhost:5173/reset-password/abc"
        );
    }

    #[test]
    fn new_password_length() {
        assert!(validate_new_password("12345").is_err());
        assert!(validate_new_password("123456").is_ok());
    }
}
