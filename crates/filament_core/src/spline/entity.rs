//! # Spline Identity
//!
//! Splines are addressed by lightweight handles consisting of:
//! - A slot index into the registry's component table
//! - A generation counter for safe reuse

use std::fmt;
use std::ops::Range;

use crate::error::{InvariantViolation, SplineResult};

/// Stable identifier for one spline.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Slot index into the component table
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SplineEntity(u64);

impl SplineEntity {
    /// Creates a new spline ID from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the ID.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the ID.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Display for SplineEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index(), self.generation())
    }
}

/// Where a spline lives and how it is sampled.
///
/// All indices are local to the owning batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SplineComponent {
    /// Owning batch.
    pub index_batch: usize,
    /// First control point (inclusive).
    pub start_index_control_point: usize,
    /// Last control point (exclusive).
    pub end_index_control_point: usize,
    /// Control points in the range, extension points included.
    pub num_control_points: usize,
    /// First vertex (pair) of this spline in the batch's vertex layout.
    pub start_index_vertices: usize,
    /// Vertex pairs emitted for this spline.
    pub num_vertices: usize,
    /// Samples per segment.
    pub num_vertices_per_segment: usize,
}

impl SplineComponent {
    /// Builds a component for `num_control_points` at `start` in `index_batch`.
    /// The vertex start is filled in by the batch layout pass.
    #[must_use]
    pub const fn new(
        index_batch: usize,
        start: usize,
        num_control_points: usize,
        num_vertices_per_segment: usize,
    ) -> Self {
        Self {
            index_batch,
            start_index_control_point: start,
            end_index_control_point: start + num_control_points,
            num_control_points,
            start_index_vertices: 0,
            num_vertices: line_count(num_control_points) * num_vertices_per_segment,
            num_vertices_per_segment,
        }
    }

    /// Renderable segments: each needs a four point window, so the first
    /// and last two points only serve as neighbours.
    #[inline]
    #[must_use]
    pub const fn line_count(&self) -> usize {
        line_count(self.num_control_points)
    }

    /// The control-point range in the batch buffer.
    #[inline]
    #[must_use]
    pub const fn control_point_range(&self) -> Range<usize> {
        self.start_index_control_point..self.end_index_control_point
    }

    /// The vertex-pair range in the batch's vertex layout.
    #[inline]
    #[must_use]
    pub const fn vertex_range(&self) -> Range<usize> {
        self.start_index_vertices..self.start_index_vertices + self.num_vertices
    }
}

impl SplineComponent {
    /// Checks that `real_points` user points (plus two extension points
    /// when enabled) fill this spline's range exactly.
    pub(crate) fn check_point_count(
        &self,
        entity: SplineEntity,
        real_points: usize,
        insert_extension: bool,
    ) -> SplineResult<()> {
        let actual = real_points + if insert_extension { 2 } else { 0 };
        if actual == self.num_control_points {
            Ok(())
        } else {
            Err(InvariantViolation::ControlPointCountMismatch {
                entity,
                expected: self.num_control_points,
                actual,
            }
            .into())
        }
    }
}

#[inline]
const fn line_count(num_control_points: usize) -> usize {
    num_control_points.saturating_sub(3)
}
