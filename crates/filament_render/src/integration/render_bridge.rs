//! Render Bridge - Hands spline batches to the GPU renderer
//!
//! This is the ONLY place that clears batch dirty flags.
//! It runs after the mutation phase has closed.

use std::time::Instant;

use tracing::debug;

use filament_core::{ControlPoint, SplineRegistry, SplineResult};

use crate::culling::{total_bounds, Aabb};
use crate::geometry::{
    generate_mesh_strips, generate_procedural_segments, MeshStripBuffers, ProceduralSegment,
};

/// The GPU side of the bridge.
///
/// Implemented by the application's renderer. Every call receives
/// borrowed data that is only valid for the duration of the call.
pub trait SplineRenderer {
    /// Uploads a batch's whole control-point buffer.
    fn upload_control_points(&mut self, batch: usize, control_points: &[ControlPoint]);

    /// Uploads a batch's regenerated ribbon geometry.
    fn upload_mesh_strips(&mut self, batch: usize, buffers: &MeshStripBuffers);

    /// Uploads a batch's regenerated procedural segments.
    fn upload_procedural_segments(&mut self, batch: usize, segments: &[ProceduralSegment]);

    /// Receives bounds covering every live spline.
    fn update_bounds(&mut self, bounds: Aabb);
}

/// Which geometry the renderer draws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeometryMode {
    /// Vertex and index buffers, one ribbon per spline.
    #[default]
    MeshStrip,
    /// One record per sample, expanded on the GPU.
    Procedural,
}

/// Configuration for the render bridge
#[derive(Debug, Clone)]
pub struct RenderBridgeConfig {
    /// Geometry generated for geometry-dirty batches
    pub geometry_mode: GeometryMode,
    /// Recompute bounds whenever anything was uploaded
    pub compute_bounds: bool,
}

impl Default for RenderBridgeConfig {
    fn default() -> Self {
        Self {
            geometry_mode: GeometryMode::MeshStrip,
            compute_bounds: true,
        }
    }
}

/// Statistics from one sync
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderBridgeStats {
    /// Batches whose control points were uploaded
    pub batches_uploaded: u32,
    /// Batches whose geometry was regenerated
    pub geometry_rebuilt: u32,
    /// Bounds sent to the renderer, if recomputed
    pub bounds: Option<Aabb>,
    /// Time spent in sync (microseconds)
    pub sync_time_us: u32,
}

/// The bridge between the spline registry and the renderer
///
/// Owns scratch buffers for generated geometry so regeneration reuses
/// their allocations frame to frame.
///
/// ## Usage
///
/// ```rust,ignore
/// let mut bridge = RenderBridge::new(RenderBridgeConfig::default());
///
/// // Each frame, after the mutation phase closed
/// let stats = bridge.sync(&mut registry, &mut gpu)?;
/// ```
pub struct RenderBridge {
    /// Configuration
    config: RenderBridgeConfig,
    /// Statistics from last sync
    stats: RenderBridgeStats,
    /// Reused ribbon output
    mesh: MeshStripBuffers,
    /// Reused procedural output
    segments: Vec<ProceduralSegment>,
}

impl RenderBridge {
    /// Creates a new render bridge
    #[must_use]
    pub fn new(config: RenderBridgeConfig) -> Self {
        Self {
            config,
            stats: RenderBridgeStats::default(),
            mesh: MeshStripBuffers::new(),
            segments: Vec::new(),
        }
    }

    /// Returns the configuration
    #[must_use]
    pub const fn config(&self) -> &RenderBridgeConfig {
        &self.config
    }

    /// Returns statistics from the last sync
    #[must_use]
    pub const fn stats(&self) -> RenderBridgeStats {
        self.stats
    }

    /// Pushes every change since the last sync to `renderer`.
    ///
    /// For each batch: regenerates geometry if its layout changed, uploads
    /// control points if they changed, then clears both flags. Bounds are
    /// recomputed once if anything was uploaded.
    ///
    /// # Errors
    ///
    /// Propagates geometry generation errors. Batches handled before the
    /// failing one keep their cleared flags; the rest stay dirty.
    #[allow(clippy::cast_possible_truncation)]
    pub fn sync<R: SplineRenderer>(
        &mut self,
        registry: &mut SplineRegistry,
        renderer: &mut R,
    ) -> SplineResult<RenderBridgeStats> {
        let start = Instant::now();
        let mut stats = RenderBridgeStats::default();

        for index in 0..registry.batch_count() {
            let Some(batch) = registry.batch(index) else {
                continue;
            };
            let (dirty, geometry_dirty) = (batch.is_dirty(), batch.is_geometry_dirty());

            if geometry_dirty {
                let components = registry.batch_components(index);
                match self.config.geometry_mode {
                    GeometryMode::MeshStrip => {
                        generate_mesh_strips(&components, &mut self.mesh)?;
                        renderer.upload_mesh_strips(index, &self.mesh);
                    }
                    GeometryMode::Procedural => {
                        generate_procedural_segments(&components, &mut self.segments)?;
                        renderer.upload_procedural_segments(index, &self.segments);
                    }
                }
                stats.geometry_rebuilt += 1;
            }

            if dirty {
                renderer.upload_control_points(index, batch.control_points());
                stats.batches_uploaded += 1;
            }

            if let Some(batch) = registry.batch_mut(index) {
                batch.clear_dirty();
                batch.clear_geometry_dirty();
            }
        }

        let changed = stats.batches_uploaded > 0 || stats.geometry_rebuilt > 0;
        if changed && self.config.compute_bounds {
            let bounds = total_bounds(registry);
            renderer.update_bounds(bounds);
            stats.bounds = Some(bounds);
        }

        stats.sync_time_us = start.elapsed().as_micros() as u32;
        self.stats = stats;

        debug!(
            "Render sync: {} batches uploaded, {} geometry rebuilds in {}us",
            stats.batches_uploaded, stats.geometry_rebuilt, stats.sync_time_us
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filament_core::{SplineConfig, Vec3};

    /// Records every call instead of talking to a GPU.
    #[derive(Default)]
    struct RecordingRenderer {
        control_points: Vec<(usize, usize)>,
        strips: Vec<(usize, usize, usize)>,
        segments: Vec<(usize, usize)>,
        bounds: Vec<Aabb>,
    }

    impl SplineRenderer for RecordingRenderer {
        fn upload_control_points(&mut self, batch: usize, control_points: &[ControlPoint]) {
            self.control_points.push((batch, control_points.len()));
        }

        fn upload_mesh_strips(&mut self, batch: usize, buffers: &MeshStripBuffers) {
            self.strips
                .push((batch, buffers.vertices.len(), buffers.triangles.len()));
        }

        fn upload_procedural_segments(&mut self, batch: usize, segments: &[ProceduralSegment]) {
            self.segments.push((batch, segments.len()));
        }

        fn update_bounds(&mut self, bounds: Aabb) {
            self.bounds.push(bounds);
        }
    }

    fn registry() -> SplineRegistry {
        SplineRegistry::new(SplineConfig {
            batch_capacity: 64,
            max_batches: 4,
            max_splines: 32,
            vertices_per_segment: 4,
            insert_extension_points: true,
        })
        .unwrap()
    }

    #[test]
    fn test_sync_uploads_and_clears() {
        let mut registry = registry();
        let spline = registry.add(6).unwrap();
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(5.0, 5.0, 5.0),
        ];
        let ctx = registry.begin_mutation();
        ctx.modify_control_points(spline, &points, true).unwrap();
        ctx.close();

        let mut bridge = RenderBridge::new(RenderBridgeConfig::default());
        let mut renderer = RecordingRenderer::default();
        let stats = bridge.sync(&mut registry, &mut renderer).unwrap();

        assert_eq!(stats.batches_uploaded, 1);
        assert_eq!(stats.geometry_rebuilt, 1);
        assert_eq!(renderer.control_points, vec![(0, 64)]);
        assert_eq!(renderer.strips, vec![(0, 24, 66)]);
        assert_eq!(
            stats.bounds,
            Some(Aabb::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 5.0)))
        );
        assert!(!registry.batch(0).unwrap().is_dirty());
        assert!(!registry.batch(0).unwrap().is_geometry_dirty());

        // Nothing changed: nothing to send.
        let stats = bridge.sync(&mut registry, &mut renderer).unwrap();
        assert_eq!(stats.batches_uploaded, 0);
        assert_eq!(stats.bounds, None);
        assert_eq!(renderer.bounds.len(), 1);
    }

    #[test]
    fn test_procedural_mode() {
        let mut registry = registry();
        registry.add(6).unwrap();
        registry.add_with_resolution(5, 2).unwrap();

        let mut bridge = RenderBridge::new(RenderBridgeConfig {
            geometry_mode: GeometryMode::Procedural,
            compute_bounds: false,
        });
        let mut renderer = RecordingRenderer::default();
        let stats = bridge.sync(&mut registry, &mut renderer).unwrap();

        assert_eq!(stats.geometry_rebuilt, 1);
        assert_eq!(renderer.segments, vec![(0, 12 + 4)]);
        assert!(renderer.strips.is_empty());
        assert!(renderer.bounds.is_empty());
    }
}
