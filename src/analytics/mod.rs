//! Analytics Engine (spec §4.4): the StockPruner's statistical substrate.
//! Pure functions over `PurchaseRecord` history — no `Page`, no I/O.

pub mod copurchase;
pub mod engine;
pub mod identity;
pub mod interval_stats;
pub mod quantity_stats;
pub mod seasonality;
pub mod trend;

pub use engine::{compute_analytics, AnalyticsConfig};
