//! # Synchronization for Parallel Spline Writes
//!
//! No locks on the write path.
//!
//! ## The Problem
//!
//! ```text
//! Worker 1:  WRITE spline 3 ──┐
//! Worker 2:  WRITE spline 7 ──┼──► the same batch buffer
//! Worker 3:  WRITE spline 9 ──┘
//!
//! With &mut per batch:  workers serialize on the batch
//! With Mutex per batch: LOCK CONTENTION
//! ```
//!
//! ## The Solution: Disjoint Ranges
//!
//! ```text
//! Open:   registry borrowed exclusively, zeroed dirty scratch
//! Phase:  each worker writes only its spline's range, sets scratch flag
//! Close:  batch.dirty |= scratch (single thread)
//! ```

mod mutation;

pub use mutation::{BatchSplineInput, MutationContext, MutationStats};
