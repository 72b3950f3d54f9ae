//! Liveness and status HTTP surface:
//! - GET /health - liveness probe
//! - GET /status - pipeline counters

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
