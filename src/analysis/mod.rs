//! Analysis modules.
//!
//! Pure aggregation lives in [`aggregator`] and [`trends`]; [`service`]
//! and [`workspace`] load the collections they work on.

pub mod aggregator;
pub mod service;
pub mod trends;
pub mod workspace;

pub use aggregator::*;
pub use service::AnalyticsService;
pub use trends::{monthly_series, weekly_breakdown};
pub use workspace::Workspace;
