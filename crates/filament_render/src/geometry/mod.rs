//! Geometry generation for spline batches.
//!
//! Two output flavours, both derived from the same per-sample iteration:
//! - Mesh strips: two vertices per sample, triangulated into a ribbon
//! - Procedural segments: one compact record per sample for indirect draws
//!
//! Every job runs one rayon task per spline. Output buffers are split into
//! disjoint per-spline slices before dispatch, so tasks never share memory.

mod mesh_strip;
mod procedural;

use std::ops::Range;

use filament_core::{InvariantViolation, SplineComponent, SplineResult, MIN_VERTICES_PER_SEGMENT};

pub use mesh_strip::{generate_mesh_strips, Color32, MeshStripBuffers, StripVertex};
pub use procedural::{generate_procedural_segments, ProceduralSegment};

/// Splits `buffer` into one slice per range.
///
/// Ranges must be in non-decreasing order and must not overlap. Gaps
/// between them are skipped.
pub(crate) fn carve<'a, T>(
    buffer: &'a mut [T],
    ranges: &[Range<usize>],
) -> SplineResult<Vec<&'a mut [T]>> {
    let total = buffer.len();
    let mut rest = buffer;
    let mut cursor = 0;
    let mut slices = Vec::with_capacity(ranges.len());

    for (slot, range) in ranges.iter().enumerate() {
        if range.start < cursor || range.end < range.start {
            return Err(InvariantViolation::OverlappingOutput {
                slot,
                start: range.start,
                previous_end: cursor,
            }
            .into());
        }
        if range.end > total {
            return Err(InvariantViolation::InputOutOfRange {
                start: range.start,
                end: range.end,
                len: total,
            }
            .into());
        }

        let (_, tail) = std::mem::take(&mut rest).split_at_mut(range.start - cursor);
        let (slice, tail) = tail.split_at_mut(range.len());
        slices.push(slice);
        rest = tail;
        cursor = range.end;
    }

    Ok(slices)
}

/// Rejects components whose sampling would divide by zero.
pub(crate) fn check_resolution(components: &[SplineComponent]) -> SplineResult<()> {
    match components
        .iter()
        .find(|comp| comp.num_vertices_per_segment < MIN_VERTICES_PER_SEGMENT)
    {
        Some(comp) => Err(InvariantViolation::TooFewVerticesPerSegment {
            requested: comp.num_vertices_per_segment,
            minimum: MIN_VERTICES_PER_SEGMENT,
        }
        .into()),
        None => Ok(()),
    }
}

/// One sample of a spline: which segment, where along it, where along
/// the whole spline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Sample {
    /// Control-point index of the segment's first window point.
    pub index: usize,
    /// Position inside the segment, `0.0..=1.0`.
    pub t: f32,
    /// Position along the whole spline, `0.0..1.0`.
    pub norm: f32,
    /// False only for the final sample of the spline.
    pub is_not_end: bool,
}

/// Sample `k` of `comp` in segment-major order.
#[inline]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn sample(comp: &SplineComponent, k: usize) -> Sample {
    let vps = comp.num_vertices_per_segment;
    let line = k / vps;
    let i = k % vps;
    Sample {
        index: comp.start_index_control_point + line,
        t: i as f32 / (vps - 1) as f32,
        norm: k as f32 * (1.0 / comp.num_vertices as f32),
        is_not_end: k + 1 < comp.num_vertices,
    }
}
