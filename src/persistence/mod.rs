//! Run-state checkpoint persistence (spec §4.7, §5). Backed by SQLite via
//! [`db::RunStateStore`] — a separate database/connection from
//! [`crate::preferences::PreferenceStore`], since the two have unrelated
//! lifecycles and failure domains (a corrupt preference row is a shrug; a
//! corrupt run checkpoint is the crash-recovery path itself failing).

pub mod db;

pub use db::RunStateStore;
