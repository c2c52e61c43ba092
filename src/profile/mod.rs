pub mod dto;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router(resume_max_bytes: usize) -> Router<AppState> {
    handlers::routes(resume_max_bytes)
}
