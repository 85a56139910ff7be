//! # Memory Management
//!
//! Allocators behind the spline registry.
//!
//! ## Design Philosophy
//!
//! Batch buffers are allocated once. After that:
//! - Control-point ranges are carved out of them by index, never by pointer
//! - Released ranges go on a free list for reuse
//! - Spline handles carry a generation so stale handles are caught

mod pool;
mod range;

pub(crate) use pool::EntityPool;
pub use range::RangeAllocator;
