//! # Spline Storage
//!
//! Batched control-point storage for many Catmull-Rom splines.
//!
//! ## Layout
//!
//! ```text
//! batch 0: [ e p p p e | e p p p p e | free ... ]
//!            spline #0    spline #4
//! batch 1: [ e p p p p p e | ... ]
//!            spline #1
//! ```
//!
//! `e` marks an extension point, `p` a user point.

mod batch;
mod entity;
mod registry;

pub(crate) use batch::write_spline;
pub use batch::SplineBatch;
pub use entity::{SplineComponent, SplineEntity};
pub use registry::SplineRegistry;
