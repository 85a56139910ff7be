//! Mesh-strip generation: a two-vertex-wide ribbon per spline.
//!
//! The vertex shader evaluates the spline itself. Vertices only carry
//! where to sample, and the color channel tells left edge from right edge.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;

use filament_core::{InvariantViolation, SplineComponent, SplineResult};

use super::{carve, check_resolution, sample};

/// One ribbon vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct StripVertex {
    /// Position along the whole spline, `0.0..1.0`.
    pub tex_u: f32,
    /// Position inside the current segment, `0.0..=1.0`.
    pub t: f32,
    /// Batch-local control-point index of the segment window.
    pub index: f32,
}

impl StripVertex {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a vertex.
    #[must_use]
    pub const fn new(tex_u: f32, t: f32, index: f32) -> Self {
        Self { tex_u, t, index }
    }
}

/// 8-bit RGBA color.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Color32 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color32 {
    /// Marks the left edge of the ribbon.
    pub const LEFT: Self = Self::new(0, 0, 0, 0);
    /// Marks the right edge of the ribbon.
    pub const RIGHT: Self = Self::new(255, 0, 0, 0);

    /// Creates a color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Generated ribbon geometry for one batch.
///
/// Reused across frames: regeneration resizes in place.
#[derive(Debug, Clone, Default)]
pub struct MeshStripBuffers {
    /// Two vertices per sample, left then right.
    pub vertices: Vec<StripVertex>,
    /// One color per vertex.
    pub colors: Vec<Color32>,
    /// Triangle list, six indices per quad.
    pub triangles: Vec<u32>,
}

impl MeshStripBuffers {
    /// Creates empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the vertex buffer as bytes for GPU upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Returns the color buffer as bytes for GPU upload.
    #[must_use]
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Returns the index buffer as bytes for GPU upload.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }

    fn reset(&mut self, vertex_len: usize, index_len: usize) {
        self.vertices.clear();
        self.vertices.resize(vertex_len, StripVertex::default());
        self.colors.clear();
        self.colors.resize(vertex_len, Color32::default());
        self.triangles.clear();
        self.triangles.resize(index_len, 0);
    }
}

/// Where one spline's output lands.
struct StripLayout {
    vertices: Range<usize>,
    triangles: Range<usize>,
}

/// Output ranges per slot. Triangles of slot `s` start at
/// `(start_index_vertices - s) * 6`.
fn layout(components: &[SplineComponent]) -> SplineResult<Vec<StripLayout>> {
    components
        .iter()
        .enumerate()
        .map(|(slot, comp)| {
            let quads = comp
                .start_index_vertices
                .checked_sub(slot)
                .ok_or(InvariantViolation::OverlappingOutput {
                    slot,
                    start: comp.start_index_vertices,
                    previous_end: slot,
                })?;
            let first_index = quads * 6;
            Ok(StripLayout {
                vertices: comp.start_index_vertices * 2
                    ..(comp.start_index_vertices + comp.num_vertices) * 2,
                triangles: first_index..first_index + comp.num_vertices.saturating_sub(1) * 6,
            })
        })
        .collect()
}

/// Builds ribbon geometry for a batch's splines, in parallel.
///
/// `components` must be in slot order (as returned by
/// `SplineRegistry::batch_components`). The buffers are resized to fit.
///
/// # Errors
///
/// - [`InvariantViolation::OverlappingOutput`] if vertex or triangle
///   ranges are out of order or overlap.
/// - [`InvariantViolation::TooFewVerticesPerSegment`] for components
///   sampled fewer than two times per segment.
pub fn generate_mesh_strips(
    components: &[SplineComponent],
    buffers: &mut MeshStripBuffers,
) -> SplineResult<()> {
    check_resolution(components)?;
    let layouts = layout(components)?;

    let vertex_len = layouts.iter().map(|l| l.vertices.end).max().unwrap_or(0);
    let index_len = layouts.iter().map(|l| l.triangles.end).max().unwrap_or(0);
    buffers.reset(vertex_len, index_len);

    let vertex_ranges: Vec<_> = layouts.iter().map(|l| l.vertices.clone()).collect();
    let triangle_ranges: Vec<_> = layouts.iter().map(|l| l.triangles.clone()).collect();
    let vertices = carve(buffers.vertices.as_mut_slice(), &vertex_ranges)?;
    let colors = carve(buffers.colors.as_mut_slice(), &vertex_ranges)?;
    let triangles = carve(buffers.triangles.as_mut_slice(), &triangle_ranges)?;

    components
        .par_iter()
        .zip(vertices)
        .zip(colors)
        .zip(triangles)
        .for_each(|(((comp, vertices), colors), triangles)| {
            write_mesh_strip(comp, vertices, colors, triangles);
        });

    Ok(())
}

/// Writes one spline's vertices, colors and triangles into its slices.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn write_mesh_strip(
    comp: &SplineComponent,
    vertices: &mut [StripVertex],
    colors: &mut [Color32],
    triangles: &mut [u32],
) {
    for (k, (pair, edge)) in vertices
        .chunks_exact_mut(2)
        .zip(colors.chunks_exact_mut(2))
        .enumerate()
    {
        let s = sample(comp, k);
        let vertex = StripVertex::new(s.norm, s.t, s.index as f32);
        pair[0] = vertex;
        pair[1] = vertex;
        edge[0] = Color32::LEFT;
        edge[1] = Color32::RIGHT;
    }

    let base = (comp.start_index_vertices * 2) as u32;
    for (i, quad) in triangles.chunks_exact_mut(6).enumerate() {
        let v = base + (i * 2) as u32;
        quad.copy_from_slice(&[v, v + 2, v + 1, v + 1, v + 2, v + 3]);
    }
}
