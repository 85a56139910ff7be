//! Procedural segments: one record per sample for indirect draws.

use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;

use filament_core::{SplineComponent, SplineResult};

use super::{carve, check_resolution, sample};

/// Per-sample draw record, uploaded as a structured buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ProceduralSegment {
    /// Batch-local control-point index of the segment window.
    pub index: u32,
    /// Position inside the segment, `0.0..=1.0`.
    pub t: f32,
    /// Position along the whole spline, `0.0..1.0`.
    pub tex_v: f32,
    /// `0.0` for the final sample of a spline, `1.0` otherwise.
    pub is_not_end: f32,
}

impl ProceduralSegment {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Builds procedural segments for a batch's splines, in parallel.
///
/// Spline `s` writes `num_vertices` records starting at its
/// `start_index_vertices`. `segments` is resized to fit.
///
/// # Errors
///
/// Same as [`generate_mesh_strips`](super::generate_mesh_strips).
pub fn generate_procedural_segments(
    components: &[SplineComponent],
    segments: &mut Vec<ProceduralSegment>,
) -> SplineResult<()> {
    check_resolution(components)?;

    let ranges: Vec<_> = components
        .iter()
        .map(SplineComponent::vertex_range)
        .collect();
    let len = ranges.iter().map(|r| r.end).max().unwrap_or(0);
    segments.clear();
    segments.resize(len, ProceduralSegment::default());

    let slices = carve(segments.as_mut_slice(), &ranges)?;
    components
        .par_iter()
        .zip(slices)
        .for_each(|(comp, out)| write_segments(comp, out));

    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn write_segments(comp: &SplineComponent, out: &mut [ProceduralSegment]) {
    for (k, segment) in out.iter_mut().enumerate() {
        let s = sample(comp, k);
        *segment = ProceduralSegment {
            index: s.index as u32,
            t: s.t,
            tex_v: s.norm,
            is_not_end: if s.is_not_end { 1.0 } else { 0.0 },
        };
    }
}
