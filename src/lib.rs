//! EduTrack - data layer for a study-abroad consultancy dashboard.
//!
//! Entity repositories over a hosted record store (or in-memory fixtures),
//! a filter engine for the applications table, performance and trend
//! aggregation, and the session and user administration pieces the
//! dashboard needs around them.

pub mod analysis;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod report;
pub mod store;
pub mod users;

pub use error::{Result, StoreError};
