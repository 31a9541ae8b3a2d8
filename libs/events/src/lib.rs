//! # statusrep-events
//!
//! Messages the status reporter consumes from its upstream.
//!
//! ## Design Principles
//!
//! - Endpoint updates form a closed set of variants with an explicit
//!   `Unknown` arm, so newer upstreams never break older reporters
//! - The in-sync signal travels separately from endpoint updates
//! - The feed is newline-delimited JSON, one message per line
//!
//! ## Feed Messages
//!
//! - `in_sync`: upstream has delivered a complete snapshot
//! - `workload_endpoint_status_update`: an endpoint's policy is programmed
//! - `workload_endpoint_status_remove`: an endpoint has gone away

mod error;
mod types;

pub use error::EventError;
pub use types::*;
