use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, PublicUser,
            RegisterRecruiterRequest, RegisterRequest, ResetPasswordRequest,
        },
        extractors::{expired_session_cookie, session_cookie, CurrentUser},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::{NewUser, User},
        services::{
            check_reset_token, generate_reset_token, hash_reset_token, normalize_email,
            reset_link, validate_new_password, Registration, FORGOT_PASSWORD_ACK,
        },
    },
    errors::{is_unique_violation, AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/register-recruiter", post(register_recruiter))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(get_me))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password/:token", put(reset_password))
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let reg = Registration::seeker(&payload.full_name, &payload.email, &payload.password)?;
    create_account(&state, jar, reg, "Seeker registered successfully").await
}

#[instrument(skip(state, jar, payload))]
pub async fn register_recruiter(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRecruiterRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let reg = Registration::recruiter(
        &payload.full_name,
        &payload.email,
        &payload.password,
        &payload.company_name,
    )?;
    create_account(&state, jar, reg, "Recruiter registered successfully").await
}

async fn create_account(
    state: &AppState,
    jar: CookieJar,
    reg: Registration,
    message: &str,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    if User::find_by_email(&state.db, &reg.email).await?.is_some() {
        warn!(email = %reg.email, "email already registered");
        return Err(AppError::DuplicateIdentity);
    }

    let hash = hash_password(&reg.password)?;
    let user = User::create(
        &state.db,
        &NewUser {
            full_name: &reg.full_name,
            email: &reg.email,
            password_hash: &hash,
            role: reg.role,
            company_name: reg.company_name.as_deref(),
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            warn!(email = %reg.email, "email registered concurrently");
            AppError::DuplicateIdentity
        } else {
            AppError::from(e)
        }
    })?;

    let jar = sign_in(state, jar, &user)?;
    info!(user_id = %user.id, role = user.role.as_str(), "user registered");
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            user: PublicUser::from(&user),
            message: message.to_string(),
        }),
    ))
}

fn sign_in(state: &AppState, jar: CookieJar, user: &User) -> AppResult<CookieJar> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user.id, user.role)?;
    Ok(jar.add(session_cookie(
        &state.config.cookie,
        token,
        state.config.jwt.ttl_minutes,
    )))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Please provide email and password"));
    }

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let jar = sign_in(&state, jar, &user)?;
    info!(user_id = %user.id, "user logged in");
    Ok((
        jar,
        Json(AuthResponse {
            user: PublicUser::from(&user),
            message: "Logged in successfully".into(),
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.remove(expired_session_cookie(&state.config.cookie));
    (jar, Json(MessageResponse::new("Logged out successfully")))
}

#[instrument(skip(user))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() {
        return Err(AppError::validation("Please provide an email address."));
    }

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        info!(%email, "password reset requested for unknown email");
        return Ok(Json(MessageResponse::new(FORGOT_PASSWORD_ACK)));
    };

    let token = generate_reset_token(OffsetDateTime::now_utc());
    User::set_reset_token(&state.db, user.id, &token.hash, token.expires).await?;

    let link = reset_link(&state.config.frontend_url, &token.raw);
    if let Err(e) = state.mailer.send_reset_link(&user.email, &link).await {
        error!(error = %e, user_id = %user.id, "reset link delivery failed");
        User::clear_reset_token(&state.db, user.id).await?;
        return Err(AppError::Internal(
            e.context("Error sending password reset email. Please try again later."),
        ));
    }

    info!(user_id = %user.id, "password reset token issued");
    Ok(Json(MessageResponse::new(FORGOT_PASSWORD_ACK)))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    validate_new_password(&payload.password)?;

    let token_hash = hash_reset_token(&token);
    let user = User::find_by_reset_hash(&state.db, &token_hash)
        .await?
        .ok_or(AppError::InvalidOrExpiredToken)?;
    check_reset_token(&user, &token_hash, OffsetDateTime::now_utc())?;

    let new_hash = hash_password(&payload.password)?;
    if !User::complete_password_reset(&state.db, user.id, &token_hash, &new_hash).await? {
        warn!(user_id = %user.id, "reset token consumed concurrently");
        return Err(AppError::InvalidOrExpiredToken);
    }

    info!(user_id = %user.id, "password reset");
    Ok(Json(MessageResponse::new(
        "Password reset successful. You can now log in with your new password.",
    )))
}

#[cfg(test)]
mod handler_tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn app() -> Router {
        auth_routes().with_state(AppState::fake())
    }

    #[tokio::test]
    async fn logout_expires_session_cookie() {
        let res = app()
            .oneshot(
                Request::post("/auth/logout")
                    .header("cookie", "token=abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let set_cookie = res
            .headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(set_cookie.starts_with("token="));
        assert!(set_cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn me_requires_session() {
        let res = app()
            .oneshot(Request::get("/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_rejects_short_password_before_touching_db() {
        let res = app()
            .oneshot(
                Request::post("/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"fullName":"Ada","email":"ada@example.com","password":"123"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_rejects_short_password_before_lookup() {
        let res = app()
            .oneshot(
                Request::put("/auth/reset-password/abc")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"password":"123"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
