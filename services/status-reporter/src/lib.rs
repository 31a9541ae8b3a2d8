//! Endpoint status file reporter.
//!
//! Mirrors which endpoints have had their policy programmed onto a
//! directory of empty marker files, so that other processes can wait on
//! an endpoint by watching for its file.
//!
//! ## Architecture
//!
//! - **Feed**: decodes the upstream feed onto an in-sync channel and an
//!   endpoint update channel
//! - **Reporter**: tracks desired vs on-disk markers and reconciles them,
//!   retrying failed passes with backoff
//! - **Status directory**: the `<root>/policy` marker files themselves

pub mod config;
pub mod error;
pub mod feed;
pub mod reporter;
pub mod status_dir;

pub use error::StatusError;
pub use reporter::{EndpointStatusFileReporter, PassOutcome};
pub use status_dir::{StatusDir, StatusFiles, POLICY_DIR};
