pub mod dto;
pub mod handlers;
pub mod repo;

use axum::Router;

use crate::state::AppState;

/// Log, meal, water and stats routes. Everything here sits behind the bearer
/// token gate; handlers extract `AuthUser` before touching the store.
pub fn router() -> Router<AppState> {
    handlers::router()
}
