//! Integration test for a full frame: mutate, generate, bound, upload.

use filament_core::{
    BatchSplineInput, ControlPoint, SplineConfig, SplineEntity, SplineRegistry, Vec3,
};
use filament_render::{
    generate_mesh_strips, generate_procedural_segments, registry_bounds, Aabb, GeometryMode,
    MeshStripBuffers, ProceduralSegment, RenderBridge, RenderBridgeConfig, SplineRenderer,
};

#[derive(Default)]
struct CountingRenderer {
    uploads: usize,
    strip_batches: Vec<usize>,
    last_bounds: Option<Aabb>,
}

impl SplineRenderer for CountingRenderer {
    fn upload_control_points(&mut self, _batch: usize, _control_points: &[ControlPoint]) {
        self.uploads += 1;
    }

    fn upload_mesh_strips(&mut self, batch: usize, _buffers: &MeshStripBuffers) {
        self.strip_batches.push(batch);
    }

    fn upload_procedural_segments(&mut self, _batch: usize, _segments: &[ProceduralSegment]) {}

    fn update_bounds(&mut self, bounds: Aabb) {
        self.last_bounds = Some(bounds);
    }
}

fn config() -> SplineConfig {
    SplineConfig {
        batch_capacity: 24,
        max_batches: 8,
        max_splines: 64,
        vertices_per_segment: 4,
        insert_extension_points: true,
    }
}

/// Three user points per spline, offset along x by spline number.
fn write_frame(registry: &mut SplineRegistry, splines: &[SplineEntity], lift: f32) {
    let points: Vec<Vec3> = (0..splines.len() * 3)
        .map(|i| Vec3::new((i / 3) as f32 * 10.0, (i % 3) as f32, lift))
        .collect();
    let inputs: Vec<BatchSplineInput> = splines
        .iter()
        .enumerate()
        .map(|(i, &entity)| BatchSplineInput {
            entity,
            start_index: i * 3,
            num_control_points: 3,
        })
        .collect();

    let ctx = registry.begin_mutation();
    ctx.apply(&inputs, &points, true).unwrap();
    ctx.close();
}

#[test]
fn test_frame_across_batches() {
    let mut registry = SplineRegistry::new(config()).unwrap();
    let splines: Vec<SplineEntity> = (0..10).map(|_| registry.add(5).unwrap()).collect();
    assert_eq!(registry.batch_count(), 3);

    write_frame(&mut registry, &splines, 2.0);

    let mut bridge = RenderBridge::new(RenderBridgeConfig::default());
    let mut renderer = CountingRenderer::default();
    let stats = bridge.sync(&mut registry, &mut renderer).unwrap();

    assert_eq!(stats.batches_uploaded, 3);
    assert_eq!(renderer.strip_batches, vec![0, 1, 2]);
    let bounds = renderer.last_bounds.unwrap();
    assert_eq!(bounds.min, Vec3::new(0.0, 0.0, 2.0));
    assert_eq!(bounds.max, Vec3::new(90.0, 2.0, 2.0));
    assert_eq!(
        registry_bounds(&registry, &splines).unwrap(),
        bounds
    );
}

#[test]
fn test_removal_rebuilds_only_that_batch() {
    let mut registry = SplineRegistry::new(config()).unwrap();
    let splines: Vec<SplineEntity> = (0..8).map(|_| registry.add(5).unwrap()).collect();
    write_frame(&mut registry, &splines, 0.0);

    let mut bridge = RenderBridge::new(RenderBridgeConfig::default());
    let mut renderer = CountingRenderer::default();
    bridge.sync(&mut registry, &mut renderer).unwrap();

    // The sixth spline lives in batch 1 (four per batch).
    registry.remove(splines[5]).unwrap();
    let mut renderer = CountingRenderer::default();
    let stats = bridge.sync(&mut registry, &mut renderer).unwrap();

    assert_eq!(stats.geometry_rebuilt, 1);
    assert_eq!(stats.batches_uploaded, 0);
    assert_eq!(renderer.strip_batches, vec![1]);

    let mut buffers = MeshStripBuffers::new();
    generate_mesh_strips(&registry.batch_components(1), &mut buffers).unwrap();
    // Three splines of two segments at four samples each.
    assert_eq!(buffers.vertices.len(), 3 * 8 * 2);
    assert_eq!(buffers.triangles.len(), 3 * 7 * 6);
}

#[test]
fn test_geometry_modes_agree_on_layout() {
    let mut registry = SplineRegistry::new(config()).unwrap();
    registry.add(6).unwrap();
    registry.add_with_resolution(4, 3).unwrap();
    registry.add(5).unwrap();

    let components = registry.batch_components(0);
    let mut buffers = MeshStripBuffers::new();
    let mut segments = Vec::new();
    generate_mesh_strips(&components, &mut buffers).unwrap();
    generate_procedural_segments(&components, &mut segments).unwrap();

    assert_eq!(segments.len() * 2, buffers.vertices.len());
    for (segment, pair) in segments.iter().zip(buffers.vertices.chunks_exact(2)) {
        assert_eq!(segment.tex_v, pair[0].tex_u);
        assert_eq!(segment.t, pair[0].t);
        assert_eq!(segment.index as f32, pair[0].index);
    }
    assert_eq!(segments.iter().filter(|s| s.is_not_end == 0.0).count(), 3);

    let bridge = RenderBridge::new(RenderBridgeConfig {
        geometry_mode: GeometryMode::Procedural,
        compute_bounds: true,
    });
    assert_eq!(bridge.config().geometry_mode, GeometryMode::Procedural);
}
