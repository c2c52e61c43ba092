use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;

use crate::{
    auth::{jwt::JwtKeys, repo_types::User},
    config::CookieConfig,
    errors::AppError,
    state::AppState,
};

/// The signed-in user, reloaded from the database on every request.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.config.cookie.name).ok_or_else(|| {
            AppError::Unauthenticated("Not authorized, no token".into())
        })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|e| {
            warn!(error = %e, "session token rejected");
            AppError::Unauthenticated("Not authorized, token failed".into())
        })?;

        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or(AppError::IdentityNotFound)?;

        Ok(CurrentUser(user))
    }
}

/// Session token from the cookie, falling back to `Authorization: Bearer`.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(c) = jar.get(cookie_name) {
        if !c.value().is_empty() {
            return Some(c.value().to_owned());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

pub fn session_cookie(cfg: &CookieConfig, token: String, ttl_minutes: i64) -> Cookie<'static> {
    Cookie::build((cfg.name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(cfg.secure)
        .same_site(if cfg.secure { SameSite::None } else { SameSite::Lax })
        .max_age(time::Duration::minutes(ttl_minutes.max(1)))
        .build()
}

pub fn expired_session_cookie(cfg: &CookieConfig) -> Cookie<'static> {
    Cookie::build((cfg.name.clone(), String::new()))
        .path("/")
        .http_only(true)
        .secure(cfg.secure)
        .build()
}

#[cfg(test)]
mod extractor_tests {
    use super::*;
    use axum::http::HeaderValue;

    fn cfg(secure: bool) -> CookieConfig {
        CookieConfig {
            name: "token".into(),
            secure,
        }
    }

    #[test]
    fn token_is_read_from_cookie_first() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("theme=dark; token=abc.def.ghi"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer other"));
        assert_eq!(session_token(&headers, "token").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_header_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers, "token").as_deref(), Some("xyz"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(session_token(&headers, "token"), None);
        assert_eq!(session_token(&HeaderMap::new(), "token"), None);
    }

    #[test]
    fn session_cookie_attributes() {
        let c = session_cookie(&cfg(false), "t".into(), 60);
        assert_eq!(c.name(), "token");
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.path(), Some("/"));
        assert_eq!(c.same_site(), Some(SameSite::Lax));
        assert_eq!(c.max_age(), Some(time::Duration::hours(1)));

        let c = session_cookie(&cfg(true), "t".into(), 60);
        assert_eq!(c.secure(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::None));
    }

    #[tokio::test]
    async fn missing_token_is_unauthenticated() {
        let state = AppState::fake();
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .expect("rejected");
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn forged_token_is_unauthenticated() {
        let state = AppState::fake();
        let (mut parts, _) = axum::http::Request::builder()
            .header(AUTHORIZATION, "Bearer not.a.jwt")
            .body(())
            .unwrap()
            .into_parts();
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .expect("rejected");
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }
}
