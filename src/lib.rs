//! Fixed-window load generator for a remote document conversion service.
//!
//! A [`dispatcher::BatchDispatcher`] sends a fixed number of identical requests
//! through a [`converter::RemoteConverter`], never exceeding the configured
//! concurrency, and collects one [`outcome::RequestOutcome`] per request. The
//! [`aggregator`] turns the resulting [`outcome::ResultSet`] into a summary for
//! the [`export`] and [`report`] modules.

pub mod aggregator;
pub mod client;
pub mod config;
pub mod converter;
pub mod dispatcher;
pub mod errors;
pub mod export;
pub mod metrics;
pub mod outcome;
pub mod percentiles;
pub mod report;
pub mod runner;
pub mod utils;
pub mod yaml_config;
