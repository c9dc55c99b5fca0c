//! Web layer for the stop planner.
//!
//! Provides a health check and the plan endpoint.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
