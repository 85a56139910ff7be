//! # Transform Positions
//!
//! Bulk copy of per-object positions into control points, one task per
//! element, for splines whose points follow scene objects.

use rayon::prelude::*;

use crate::error::{InvariantViolation, SplineResult};
use crate::math::Vec3;

/// Anything that exposes indexed world positions to worker threads.
pub trait TransformSource: Sync {
    /// Number of positions.
    fn len(&self) -> usize;

    /// World position of element `index`. Called only with `index < len()`.
    fn position(&self, index: usize) -> Vec3;

    /// Returns true if there are no positions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransformSource for [Vec3] {
    #[inline]
    fn len(&self) -> usize {
        <[Vec3]>::len(self)
    }

    #[inline]
    fn position(&self, index: usize) -> Vec3 {
        self[index]
    }
}

impl TransformSource for Vec<Vec3> {
    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    fn position(&self, index: usize) -> Vec3 {
        self[index]
    }
}

/// Copies every source position into `destination`, in parallel.
///
/// # Errors
///
/// Returns [`InvariantViolation::LengthMismatch`] if the lengths differ.
/// Nothing is written in that case.
pub fn copy_transform_positions<S>(source: &S, destination: &mut [Vec3]) -> SplineResult<()>
where
    S: TransformSource + ?Sized,
{
    if source.len() != destination.len() {
        return Err(InvariantViolation::LengthMismatch {
            source_len: source.len(),
            destination_len: destination.len(),
        }
        .into());
    }

    destination
        .par_iter_mut()
        .enumerate()
        .for_each(|(index, dst)| *dst = source.position(index));
    Ok(())
}
