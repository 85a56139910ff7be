//! Bounds for culling spline batches.
//!
//! The renderer tests these boxes against its view frustum; nothing here
//! depends on a camera.

mod bounds;

pub use bounds::{compute_bounds, registry_bounds, spline_bounds, total_bounds, Aabb};
