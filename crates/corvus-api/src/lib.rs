//! Thin axum HTTP layer over `corvus-core`'s `Orchestrator`: the route
//! table in spec.md §6, a bearer-auth gate, and nothing else — no tools
//! registry, no session manager, no broader auth middleware. Exposed as a
//! library (not just a binary) so integration tests can build a router
//! against an in-memory `AppState` the way `riptide-api::lib.rs` does.

pub mod dto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
