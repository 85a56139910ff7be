//! # Filament Core
//!
//! Batched GPU spline storage with lock-free parallel mutation:
//! - Many splines packed into a few fixed-size control-point buffers
//! - Concurrent writers updating different splines without locks
//! - One dirty flag per buffer so only changed batches are re-uploaded
//!
//! ## Architecture Rules
//!
//! 1. **No reallocation after creation** - Batch buffers are allocated once
//! 2. **Data-oriented design** - Control points are `#[repr(C)]` and GPU-ready
//! 3. **Structural changes are single-threaded** - Add, remove and resize
//!    borrow the registry exclusively
//!
//! ## Example
//!
//! ```rust,ignore
//! use filament_core::{SplineConfig, SplineRegistry, Vec3};
//!
//! let mut registry = SplineRegistry::new(SplineConfig::default())?;
//! let spline = registry.add(5)?; // 3 user points + 2 extension points
//!
//! let ctx = registry.begin_mutation();
//! ctx.modify(spline, &points)?; // extension points per `insert_extension_points`
//! ctx.close();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod math;
pub mod memory;
pub mod spline;
pub mod sync;
pub mod transform;

pub use config::{SplineConfig, MIN_CONTROL_POINTS, MIN_VERTICES_PER_SEGMENT};
pub use error::{CapacityLimit, InvariantViolation, SplineError, SplineResult};
pub use math::{ControlPoint, Vec3};
pub use memory::RangeAllocator;
pub use spline::{SplineBatch, SplineComponent, SplineEntity, SplineRegistry};
pub use sync::{BatchSplineInput, MutationContext, MutationStats};
pub use transform::{copy_transform_positions, TransformSource};
