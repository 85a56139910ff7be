//! # Spline Batch
//!
//! A fixed-capacity control-point buffer shared by many splines.
//!
//! The batch is the unit of GPU upload:
//! - The buffer is allocated once and never reallocated
//! - Splines own disjoint index ranges inside it
//! - One dirty flag says "re-upload the whole buffer"

use crate::math::{ControlPoint, Vec3};
use crate::memory::RangeAllocator;

use super::entity::SplineEntity;

/// Control points of a group of splines, packed contiguously.
///
/// # Example
///
/// ```rust,ignore
/// for batch in registry.batches() {
///     if batch.is_dirty() {
///         queue.write_buffer(&gpu_buffer, 0, batch.as_bytes());
///     }
/// }
/// ```
pub struct SplineBatch {
    /// The control-point buffer (length == capacity).
    control_points: Box<[ControlPoint]>,
    /// Range bookkeeping for the buffer.
    ranges: RangeAllocator,
    /// Member splines in slot order (vertex packing order).
    members: Vec<SplineEntity>,
    /// Vertex pairs across all members.
    vertex_count: usize,
    /// Control points changed since the last upload.
    dirty_control_points: bool,
    /// Membership or vertex layout changed since geometry was last built.
    dirty_geometry: bool,
}

impl SplineBatch {
    /// Creates a batch holding `capacity` control points.
    ///
    /// The whole buffer is allocated here, zeroed.
    #[must_use]
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            control_points: vec![ControlPoint::ZERO; capacity].into_boxed_slice(),
            ranges: RangeAllocator::new(capacity),
            members: Vec::new(),
            vertex_count: 0,
            dirty_control_points: false,
            dirty_geometry: false,
        }
    }

    /// Returns the capacity in control points.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.control_points.len()
    }

    /// Returns the range bookkeeping.
    #[inline]
    #[must_use]
    pub const fn ranges(&self) -> &RangeAllocator {
        &self.ranges
    }

    #[inline]
    pub(crate) fn ranges_mut(&mut self) -> &mut RangeAllocator {
        &mut self.ranges
    }

    /// Returns the member splines in slot order.
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[SplineEntity] {
        &self.members
    }

    #[inline]
    pub(crate) fn members_mut(&mut self) -> &mut Vec<SplineEntity> {
        &mut self.members
    }

    /// Returns the number of splines in this batch.
    #[inline]
    #[must_use]
    pub fn spline_count(&self) -> usize {
        self.members.len()
    }

    /// Returns the vertex pairs needed for all members.
    #[inline]
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[inline]
    pub(crate) fn set_vertex_count(&mut self, count: usize) {
        self.vertex_count = count;
    }

    /// Returns the full control-point buffer, unused slots included.
    #[inline]
    #[must_use]
    pub fn control_points(&self) -> &[ControlPoint] {
        &self.control_points
    }

    #[inline]
    pub(crate) fn control_points_mut(&mut self) -> &mut [ControlPoint] {
        &mut self.control_points
    }

    /// Returns the control-point buffer as bytes for GPU upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.control_points)
    }

    /// Returns true if control points changed since the last upload.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty_control_points
    }

    /// Marks the buffer as changed.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty_control_points = true;
    }

    /// Clears the dirty flag. Called once the renderer has uploaded the buffer.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty_control_points = false;
    }

    /// Returns true if vertex or segment buffers must be regenerated.
    #[inline]
    #[must_use]
    pub const fn is_geometry_dirty(&self) -> bool {
        self.dirty_geometry
    }

    #[inline]
    pub(crate) fn mark_geometry_dirty(&mut self) {
        self.dirty_geometry = true;
    }

    /// Clears the geometry flag. Called once generated buffers were rebuilt.
    #[inline]
    pub fn clear_geometry_dirty(&mut self) {
        self.dirty_geometry = false;
    }
}

/// Writes a spline's real control points into its buffer region and, if
/// enabled, recomputes the two extension points.
///
/// `region` is the spline's full range. With `keep_payload` each point's
/// existing `w` survives; otherwise `w` is reset to zero.
pub(crate) fn write_spline(
    region: &mut [ControlPoint],
    points: &[Vec3],
    insert_extension: bool,
    keep_payload: bool,
) {
    let offset = usize::from(insert_extension);
    for (dst, src) in region[offset..].iter_mut().zip(points) {
        let w = if keep_payload { dst.w } else { 0.0 };
        *dst = ControlPoint::from_position(*src, w);
    }

    if insert_extension {
        extend_ends(region);
    }
}

/// `cp[first] = 2*cp[first+1] - cp[first+2]`,
/// `cp[last] = 2*cp[last-1] - cp[last-2]`.
#[inline]
pub(crate) fn extend_ends(region: &mut [ControlPoint]) {
    let n = region.len();
    if n < 3 {
        return;
    }
    region[0] = region[1].extrapolate(region[2]);
    region[n - 1] = region[n - 2].extrapolate(region[n - 3]);
}
