//! HTTP/WebSocket protocol surface (spec §6): state, request dispatch,
//! and route wiring, modeled on the teacher's `AppState` + axum router in
//! `main.rs`.

pub mod routes;
pub mod state;
pub mod ws;

pub use routes::build_router;
pub use state::AppState;
