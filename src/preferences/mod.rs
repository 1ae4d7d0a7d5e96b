//! Persisted user preferences: per-product prune overrides (spec §4.5,
//! §4.6 diff warnings). Backed by SQLite via [`store::PreferenceStore`].

pub mod store;

pub use store::PreferenceStore;
