//! # statusrep-id
//!
//! Endpoint identifiers for the status reporter.
//!
//! ## Design Principles
//!
//! - An endpoint is named by the orchestrator, the workload and the
//!   interface within that workload
//! - Identifiers are plain values: equality, ordering and hashing are
//!   structural
//! - Every identifier has exactly one status filename, and every status
//!   filename decodes back to the identifier it came from
//!
//! ## Filename Format
//!
//! Each component is percent-escaped and the three components are joined
//! by a single space:
//!
//! - `k8s default%2Fnginx-6d4cf56db6-2mlbx eth0`
//! - `openstack vm%201 tap0`
//!
//! Spaces, slashes and percent signs never appear raw inside a component,
//! so the name is safe to use as a single path segment.

mod error;
mod types;

pub use error::IdError;
pub use types::*;
