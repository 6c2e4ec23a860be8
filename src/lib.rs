//! Holiday and event occupancy reporting over a hotel booking dataset.
//!
//! The flow for one query is [`loader`] → [`filter`] → [`aggregate`] /
//! [`metrics`] → [`insight`] → [`reports`], tied together by [`pipeline::run`].
pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod insight;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod types;
pub mod util;
