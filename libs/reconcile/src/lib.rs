//! Reconciliation loop primitives.
//!
//! This library provides helpers for implementing reconciliation loops
//! that converge desired state to dataplane state. Key concepts:
//!
//! - **Desired state**: What the system should look like (from upstream).
//! - **Dataplane state**: What the loop believes has actually been applied.
//! - **Pending work**: The difference between the two, recomputed on demand.
//!
//! # Invariants
//!
//! - Dataplane state only changes to record an operation that succeeded
//! - Pending work is never cached; it always reflects the current sets
//! - Retry delays never shrink until the backoff is reset

mod backoff;
mod delta;

pub use backoff::{
    Backoff, BackoffFactory, BackoffManager, ExponentialBackoff, SequenceBackoff,
};
pub use delta::{IterAction, PendingAdditions, PendingDeletions, SetDeltaTracker, SetView};
