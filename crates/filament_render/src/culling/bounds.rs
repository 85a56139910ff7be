//! Axis-aligned bounds over spline control points.
//!
//! Extension points are left out: they steer the curve's ends but the
//! curve never passes through them.

use rayon::prelude::*;

use filament_core::{
    ControlPoint, InvariantViolation, SplineComponent, SplineEntity, SplineError, SplineRegistry,
    SplineResult, Vec3,
};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// The fold identity: contains nothing, absorbed by any union.
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Creates a box from two corners.
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Returns true if no point was ever folded in.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grows the box to contain `point`.
    #[inline]
    #[must_use]
    pub fn include(self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Smallest box containing both.
    #[inline]
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Center point. Meaningless for an empty box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns true if `point` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}

/// Bounds of one spline's control points, first and last skipped.
#[must_use]
pub fn spline_bounds(control_points: &[ControlPoint]) -> Aabb {
    match control_points.len() {
        0..=2 => Aabb::EMPTY,
        n => control_points[1..n - 1]
            .iter()
            .fold(Aabb::EMPTY, |aabb, cp| aabb.include(cp.position())),
    }
}

/// Bounds of several splines sharing one control-point buffer.
///
/// # Errors
///
/// Returns [`InvariantViolation::InputOutOfRange`] if a component's range
/// runs past `control_points`.
pub fn compute_bounds(
    control_points: &[ControlPoint],
    components: &[SplineComponent],
) -> SplineResult<Aabb> {
    components
        .par_iter()
        .map(|comp| {
            let range = comp.control_point_range();
            control_points
                .get(range.clone())
                .map(spline_bounds)
                .ok_or_else(|| {
                    SplineError::from(InvariantViolation::InputOutOfRange {
                        start: range.start,
                        end: range.end,
                        len: control_points.len(),
                    })
                })
        })
        .try_reduce(|| Aabb::EMPTY, |a, b| Ok(a.union(b)))
}

/// Bounds of the given splines, wherever they live.
///
/// # Errors
///
/// Returns [`InvariantViolation::UnknownEntity`] for removed or foreign handles.
pub fn registry_bounds(registry: &SplineRegistry, splines: &[SplineEntity]) -> SplineResult<Aabb> {
    splines
        .par_iter()
        .map(|&entity| registry.control_points(entity).map(spline_bounds))
        .try_reduce(|| Aabb::EMPTY, |a, b| Ok(a.union(b)))
}

/// Bounds of every live spline in the registry.
#[must_use]
pub fn total_bounds(registry: &SplineRegistry) -> Aabb {
    registry
        .batches()
        .par_iter()
        .enumerate()
        .map(|(index, batch)| {
            registry
                .batch_components(index)
                .iter()
                .filter_map(|comp| batch.control_points().get(comp.control_point_range()))
                .fold(Aabb::EMPTY, |aabb, cps| aabb.union(spline_bounds(cps)))
        })
        .reduce(|| Aabb::EMPTY, Aabb::union)
}
