//! Ambient HTTP middleware (request logging), adapted from the teacher's
//! `middleware/logging.rs`.

pub mod logging;

pub use logging::request_logging;
