//! job-herald library crate.
//!
//! Polls a job-listing feed, keeps every posting it has seen in a durable
//! store and announces each unseen posting to a notification channel once.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod feed;
pub mod logging;
pub mod normalizer;
pub mod notification;
pub mod pipeline;
pub mod store;
pub mod utils;

pub use error::{Error, NormalizationError, Result};
