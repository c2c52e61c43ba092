pub mod client;
pub mod dto;
pub mod extract;
pub mod handlers;
pub mod parse;
pub mod prompts;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
