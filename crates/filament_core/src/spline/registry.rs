//! # Spline Registry
//!
//! Maps spline handles to their batch and control-point range.
//! Allocates, frees and resizes ranges; creates batches on demand.

use std::ops::Range;

use tracing::{debug, trace};

use crate::config::{SplineConfig, MIN_CONTROL_POINTS, MIN_VERTICES_PER_SEGMENT};
use crate::error::{CapacityLimit, InvariantViolation, SplineError, SplineResult};
use crate::math::{ControlPoint, Vec3};
use crate::memory::EntityPool;
use crate::sync::MutationContext;

use super::batch::{write_spline, SplineBatch};
use super::entity::{SplineComponent, SplineEntity};

/// The spline registry - owner of every batch and spline record.
///
/// Batches are created when no existing batch has room, up to the
/// configured ceiling. Every operation here takes `&mut self`, so none of
/// them can overlap an open [`MutationContext`] or a running generation job.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = SplineRegistry::new(SplineConfig::default())?;
///
/// let spline = registry.add(5)?; // 3 user points + 2 extension points
/// registry.assign_control_points(spline, &points, true)?;
/// ```
pub struct SplineRegistry {
    /// Sizing and ceilings.
    config: SplineConfig,
    /// All batches, in creation order. Never removed.
    batches: Vec<SplineBatch>,
    /// Spline records addressed by handle.
    entities: EntityPool<SplineComponent>,
}

impl SplineRegistry {
    /// Creates an empty registry. No batch is allocated until the first add.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: SplineConfig) -> SplineResult<Self> {
        config.validate()?;
        let entities = EntityPool::new(config.max_splines);
        Ok(Self {
            config,
            batches: Vec::new(),
            entities,
        })
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &SplineConfig {
        &self.config
    }

    /// Returns the number of live splines.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entities.allocated_count()
    }

    /// Returns true if no spline is alive.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of batches created so far.
    #[inline]
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Returns all batches.
    #[inline]
    #[must_use]
    pub fn batches(&self) -> &[SplineBatch] {
        &self.batches
    }

    /// Returns one batch.
    #[inline]
    #[must_use]
    pub fn batch(&self, index: usize) -> Option<&SplineBatch> {
        self.batches.get(index)
    }

    /// Returns one batch mutably, for clearing its flags after upload.
    #[inline]
    pub fn batch_mut(&mut self, index: usize) -> Option<&mut SplineBatch> {
        self.batches.get_mut(index)
    }

    /// Returns true if `entity` is alive.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: SplineEntity) -> bool {
        self.entities.get(entity).is_some()
    }

    /// Returns a spline's record.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::UnknownEntity`] for removed or foreign handles.
    pub fn component(&self, entity: SplineEntity) -> SplineResult<&SplineComponent> {
        self.entities
            .get(entity)
            .ok_or_else(|| InvariantViolation::UnknownEntity(entity).into())
    }

    /// Returns a spline's control points, extension points included.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::UnknownEntity`] for removed or foreign handles.
    pub fn control_points(&self, entity: SplineEntity) -> SplineResult<&[ControlPoint]> {
        let comp = self.component(entity)?;
        let batch = &self.batches[comp.index_batch];
        Ok(&batch.control_points()[comp.control_point_range()])
    }

    /// Iterates over all live splines.
    pub fn splines(&self) -> impl Iterator<Item = (SplineEntity, &SplineComponent)> {
        self.entities.iter()
    }

    /// Returns the records of a batch's members in slot order, the order
    /// the geometry generators pack vertices in.
    #[must_use]
    pub fn batch_components(&self, index: usize) -> Vec<SplineComponent> {
        self.batches.get(index).map_or_else(Vec::new, |batch| {
            batch
                .members()
                .iter()
                .filter_map(|&e| self.entities.get(e).copied())
                .collect()
        })
    }

    /// Adds a spline of `num_control_points` (extension points included)
    /// sampled at the configured vertices per segment.
    ///
    /// # Errors
    ///
    /// See [`add_with_resolution`](Self::add_with_resolution).
    pub fn add(&mut self, num_control_points: usize) -> SplineResult<SplineEntity> {
        self.add_with_resolution(num_control_points, self.config.vertices_per_segment)
    }

    /// Adds a spline of `num_control_points` (extension points included)
    /// sampled at `vertices_per_segment`.
    ///
    /// The range comes from the first batch with room, reusing released
    /// ranges where they fit. A new batch is created if none has room.
    ///
    /// # Errors
    ///
    /// - [`SplineError::CapacityExceeded`] if the spline ceiling or batch
    ///   ceiling is reached, or the spline is larger than a whole batch.
    /// - [`InvariantViolation`] if fewer than 4 control points or fewer than
    ///   2 vertices per segment are requested.
    pub fn add_with_resolution(
        &mut self,
        num_control_points: usize,
        vertices_per_segment: usize,
    ) -> SplineResult<SplineEntity> {
        validate_shape(num_control_points, vertices_per_segment)?;
        if !self.entities.has_room() {
            return Err(SplineError::CapacityExceeded {
                limit: CapacityLimit::Splines,
                requested: self.len() + 1,
                max: self.config.max_splines,
            });
        }

        let (index_batch, range) = self.allocate_range(num_control_points)?;
        let comp = SplineComponent::new(
            index_batch,
            range.start,
            num_control_points,
            vertices_per_segment,
        );
        let Some(entity) = self.entities.allocate(comp) else {
            self.batches[index_batch].ranges_mut().free(range);
            return Err(SplineError::CapacityExceeded {
                limit: CapacityLimit::Splines,
                requested: self.len() + 1,
                max: self.config.max_splines,
            });
        };

        let batch = &mut self.batches[index_batch];
        batch.members_mut().push(entity);
        relayout_vertices(batch, &mut self.entities);

        trace!(
            "Added spline {} to batch {} at {}..{}",
            entity,
            index_batch,
            range.start,
            range.end
        );
        Ok(entity)
    }

    /// Removes a spline, returning its last record. The range goes on the
    /// batch's free list; nothing is compacted.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::UnknownEntity`] for removed or foreign handles.
    pub fn remove(&mut self, entity: SplineEntity) -> SplineResult<SplineComponent> {
        let comp = self
            .entities
            .free(entity)
            .ok_or(InvariantViolation::UnknownEntity(entity))?;

        let batch = &mut self.batches[comp.index_batch];
        batch.ranges_mut().free(comp.control_point_range());
        batch.members_mut().retain(|&e| e != entity);
        relayout_vertices(batch, &mut self.entities);

        trace!("Removed spline {} from batch {}", entity, comp.index_batch);
        Ok(comp)
    }

    /// Changes a spline's control-point count (extension points included).
    ///
    /// Shrinking and growth into adjacent free space happen in place.
    /// Otherwise the old range is released and a new one allocated, which
    /// may overlap the old one or live in another batch. As many leading
    /// control points as fit are kept. On failure the old range is kept.
    ///
    /// # Errors
    ///
    /// - [`InvariantViolation`] for unknown handles or fewer than 4 points.
    /// - [`SplineError::CapacityExceeded`] if no batch can take the new size.
    pub fn resize(&mut self, entity: SplineEntity, num_control_points: usize) -> SplineResult<()> {
        let comp = *self.component(entity)?;
        validate_shape(num_control_points, comp.num_vertices_per_segment)?;

        let old_range = comp.control_point_range();
        let old_batch = comp.index_batch;

        if num_control_points == comp.num_control_points {
            return Ok(());
        }

        let in_place = if num_control_points < comp.num_control_points {
            self.batches[old_batch]
                .ranges_mut()
                .shrink_in_place(&old_range, num_control_points);
            true
        } else {
            self.batches[old_batch]
                .ranges_mut()
                .grow_in_place(&old_range, num_control_points)
        };

        if in_place {
            self.set_range(
                entity,
                old_batch,
                old_range.start,
                num_control_points,
                &comp,
            );
            relayout_vertices(&mut self.batches[old_batch], &mut self.entities);
            return Ok(());
        }

        // The old range goes back first so it can merge with free
        // neighbours. Its contents stay in the buffer until overwritten.
        self.batches[old_batch].ranges_mut().free(old_range.clone());
        let (new_batch, new_range) = match self.allocate_range(num_control_points) {
            Ok(found) => found,
            Err(err) => {
                let restored = self.batches[old_batch].ranges_mut().reserve(old_range);
                debug_assert!(restored, "Old range reused by a failed allocation");
                return Err(err);
            }
        };

        let kept = comp.num_control_points.min(num_control_points);
        let src_range = old_range.start..old_range.start + kept;
        let new_start = new_range.start;
        if new_batch == old_batch {
            self.batches[old_batch]
                .control_points_mut()
                .copy_within(src_range, new_start);
        } else {
            let (src, dst) = two_batches_mut(&mut self.batches, old_batch, new_batch);
            dst.control_points_mut()[new_start..new_start + kept]
                .copy_from_slice(&src.control_points()[src_range]);
        }
        self.set_range(entity, new_batch, new_start, num_control_points, &comp);

        if new_batch != old_batch {
            self.batches[old_batch]
                .members_mut()
                .retain(|&e| e != entity);
            self.batches[new_batch].members_mut().push(entity);
            relayout_vertices(&mut self.batches[old_batch], &mut self.entities);
        }
        let batch = &mut self.batches[new_batch];
        batch.mark_dirty();
        relayout_vertices(batch, &mut self.entities);

        trace!(
            "Moved spline {} to batch {} at {}..{}",
            entity,
            new_batch,
            new_range.start,
            new_range.end
        );
        Ok(())
    }

    /// Writes a spline's user points single-threaded. Payloads are reset to
    /// zero; extension points are recomputed when `insert_extension` is set.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] for unknown handles or if `points`
    /// does not fill the spline's range.
    pub fn assign_control_points(
        &mut self,
        entity: SplineEntity,
        points: &[Vec3],
        insert_extension: bool,
    ) -> SplineResult<()> {
        let comp = *self.component(entity)?;
        comp.check_point_count(entity, points.len(), insert_extension)?;

        let batch = &mut self.batches[comp.index_batch];
        write_spline(
            &mut batch.control_points_mut()[comp.control_point_range()],
            points,
            insert_extension,
            false,
        );
        batch.mark_dirty();
        Ok(())
    }

    /// [`assign_control_points`](Self::assign_control_points) with the
    /// configured extension-point setting.
    ///
    /// # Errors
    ///
    /// Same as [`assign_control_points`](Self::assign_control_points).
    pub fn assign(&mut self, entity: SplineEntity, points: &[Vec3]) -> SplineResult<()> {
        self.assign_control_points(entity, points, self.config.insert_extension_points)
    }

    /// Opens a parallel mutation phase over every batch.
    ///
    /// Its [`modify`](MutationContext::modify) and
    /// [`apply_configured`](MutationContext::apply_configured) follow the
    /// configured extension-point setting. The context holds the registry's
    /// exclusive borrow until it is closed or dropped.
    pub fn begin_mutation(&mut self) -> MutationContext<'_> {
        MutationContext::open(
            &self.entities,
            &mut self.batches,
            self.config.insert_extension_points,
        )
    }

    /// Finds room for `len` control points, creating a batch if needed.
    fn allocate_range(&mut self, len: usize) -> SplineResult<(usize, Range<usize>)> {
        if len > self.config.batch_capacity {
            return Err(SplineError::CapacityExceeded {
                limit: CapacityLimit::BatchSize,
                requested: len,
                max: self.config.batch_capacity,
            });
        }

        for (index, batch) in self.batches.iter_mut().enumerate() {
            if let Some(range) = batch.ranges_mut().allocate(len) {
                return Ok((index, range));
            }
        }

        if self.batches.len() >= self.config.max_batches {
            return Err(SplineError::CapacityExceeded {
                limit: CapacityLimit::Batches,
                requested: self.batches.len() + 1,
                max: self.config.max_batches,
            });
        }

        let mut batch = SplineBatch::new(self.config.batch_capacity);
        let range = batch
            .ranges_mut()
            .allocate(len)
            .ok_or(SplineError::CapacityExceeded {
                limit: CapacityLimit::BatchSize,
                requested: len,
                max: self.config.batch_capacity,
            })?;
        self.batches.push(batch);

        let index = self.batches.len() - 1;
        debug!(
            "Created spline batch {} ({} control points)",
            index, self.config.batch_capacity
        );
        Ok((index, range))
    }

    /// Rewrites a record's placement, keeping its sampling resolution.
    fn set_range(
        &mut self,
        entity: SplineEntity,
        index_batch: usize,
        start: usize,
        num_control_points: usize,
        old: &SplineComponent,
    ) {
        if let Some(comp) = self.entities.get_mut(entity) {
            *comp = SplineComponent::new(
                index_batch,
                start,
                num_control_points,
                old.num_vertices_per_segment,
            );
        }
    }
}

/// Recomputes `start_index_vertices` for every member of `batch` as a
/// prefix sum in slot order.
fn relayout_vertices(batch: &mut SplineBatch, entities: &mut EntityPool<SplineComponent>) {
    let mut next = 0;
    for &entity in batch.members() {
        if let Some(comp) = entities.get_mut(entity) {
            comp.start_index_vertices = next;
            next += comp.num_vertices;
        }
    }
    batch.set_vertex_count(next);
    batch.mark_geometry_dirty();
}

fn validate_shape(num_control_points: usize, vertices_per_segment: usize) -> SplineResult<()> {
    if num_control_points < MIN_CONTROL_POINTS {
        return Err(InvariantViolation::TooFewControlPoints {
            requested: num_control_points,
            minimum: MIN_CONTROL_POINTS,
        }
        .into());
    }
    if vertices_per_segment < MIN_VERTICES_PER_SEGMENT {
        return Err(InvariantViolation::TooFewVerticesPerSegment {
            requested: vertices_per_segment,
            minimum: MIN_VERTICES_PER_SEGMENT,
        }
        .into());
    }
    Ok(())
}

/// Borrows two distinct batches mutably. `a != b`.
fn two_batches_mut(
    batches: &mut [SplineBatch],
    a: usize,
    b: usize,
) -> (&mut SplineBatch, &mut SplineBatch) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = batches.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = batches.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SplineConfig {
        SplineConfig {
            batch_capacity: 16,
            max_batches: 2,
            max_splines: 8,
            vertices_per_segment: 4,
            insert_extension_points: true,
        }
    }

    #[test]
    fn test_add_and_lookup() {
        let mut registry = SplineRegistry::new(small_config()).unwrap();
        let a = registry.add(6).unwrap();
        let b = registry.add(5).unwrap();

        let ca = *registry.component(a).unwrap();
        let cb = *registry.component(b).unwrap();
        assert_eq!(ca.control_point_range(), 0..6);
        assert_eq!(cb.control_point_range(), 6..11);
        assert_eq!(ca.start_index_vertices, 0);
        assert_eq!(cb.start_index_vertices, ca.num_vertices);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.batch_count(), 1);
        assert_eq!(registry.batch(0).unwrap().vertex_count(), 12 + 8);
    }

    #[test]
    fn test_rejects_degenerate_shapes() {
        let mut registry = SplineRegistry::new(small_config()).unwrap();
        assert!(matches!(
            registry.add(3),
            Err(SplineError::InvariantViolation(
                InvariantViolation::TooFewControlPoints { .. }
            ))
        ));
        assert!(matches!(
            registry.add_with_resolution(4, 1),
            Err(SplineError::InvariantViolation(
                InvariantViolation::TooFewVerticesPerSegment { .. }
            ))
        ));
    }

    #[test]
    fn test_spill_into_new_batch_then_fail() {
        let mut registry = SplineRegistry::new(small_config()).unwrap();
        let a = registry.add(10).unwrap();
        let b = registry.add(10).unwrap();
        assert_eq!(registry.component(a).unwrap().index_batch, 0);
        assert_eq!(registry.component(b).unwrap().index_batch, 1);

        let err = registry.add(10).unwrap_err();
        assert_eq!(
            err,
            SplineError::CapacityExceeded {
                limit: CapacityLimit::Batches,
                requested: 3,
                max: 2,
            }
        );

        // Smaller splines still fit in the leftovers.
        assert!(registry.add(6).is_ok());
    }

    #[test]
    fn test_oversized_spline_fails() {
        let mut registry = SplineRegistry::new(small_config()).unwrap();
        assert!(matches!(
            registry.add(17),
            Err(SplineError::CapacityExceeded {
                limit: CapacityLimit::BatchSize,
                ..
            })
        ));
    }

    #[test]
    fn test_spline_ceiling() {
        let config = SplineConfig {
            max_splines: 2,
            ..small_config()
        };
        let mut registry = SplineRegistry::new(config).unwrap();
        registry.add(4).unwrap();
        registry.add(4).unwrap();
        assert!(matches!(
            registry.add(4),
            Err(SplineError::CapacityExceeded {
                limit: CapacityLimit::Splines,
                ..
            })
        ));
    }

    #[test]
    fn test_remove_reuses_range_and_relayouts() {
        let mut registry = SplineRegistry::new(small_config()).unwrap();
        let a = registry.add(6).unwrap();
        let b = registry.add(5).unwrap();

        registry.remove(a).unwrap();
        assert!(!registry.contains(a));
        assert!(registry.remove(a).is_err());
        assert_eq!(registry.component(b).unwrap().start_index_vertices, 0);
        assert!(registry.batch(0).unwrap().is_geometry_dirty());

        let c = registry.add(4).unwrap();
        assert_eq!(registry.component(c).unwrap().control_point_range(), 0..4);
        assert_eq!(registry.batch(0).unwrap().members(), &[b, c]);
    }

    #[test]
    fn test_resize_in_place_and_moving() {
        let config = SplineConfig {
            batch_capacity: 32,
            ..small_config()
        };
        let mut registry = SplineRegistry::new(config).unwrap();
        let a = registry.add(5).unwrap();
        let points = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
        ];
        registry.assign_control_points(a, &points, true).unwrap();
        let b = registry.add(5).unwrap();

        // Shrink in place, then grow back into the freed tail.
        registry.resize(a, 4).unwrap();
        assert_eq!(registry.component(a).unwrap().control_point_range(), 0..4);
        registry.resize(a, 5).unwrap();
        assert_eq!(registry.component(a).unwrap().control_point_range(), 0..5);

        // Growth past the live neighbour moves the spline within the batch.
        registry.resize(a, 8).unwrap();
        let comp = *registry.component(a).unwrap();
        assert_eq!(comp.index_batch, 0);
        assert_eq!(comp.control_point_range(), 10..18);
        assert_eq!(registry.control_points(a).unwrap()[1].x, 1.0);
        assert_eq!(registry.control_points(a).unwrap()[3].x, 3.0);

        // Slot order is unchanged, so `b` still follows `a`.
        assert_eq!(registry.batch(0).unwrap().members(), &[a, b]);
        assert_eq!(registry.component(b).unwrap().start_index_vertices, 20);
        assert_eq!(registry.batch(0).unwrap().ranges().free_ranges(), &[0..5]);
    }

    #[test]
    fn test_resize_moves_to_other_batch() {
        let mut registry = SplineRegistry::new(small_config()).unwrap();
        let a = registry.add(8).unwrap();
        let _b = registry.add(8).unwrap();

        registry.resize(a, 12).unwrap();
        let comp = *registry.component(a).unwrap();
        assert_eq!(comp.index_batch, 1);
        assert!(registry.batch(1).unwrap().is_dirty());
        assert_eq!(registry.batch(0).unwrap().spline_count(), 1);
    }

    #[test]
    fn test_assign_checks_count() {
        let mut registry = SplineRegistry::new(small_config()).unwrap();
        let a = registry.add(5).unwrap();
        let err = registry
            .assign_control_points(a, &[Vec3::ZERO; 5], true)
            .unwrap_err();
        assert!(matches!(
            err,
            SplineError::InvariantViolation(InvariantViolation::ControlPointCountMismatch {
                expected: 5,
                actual: 7,
                ..
            })
        ));
    }

    #[test]
    fn test_assign_follows_config() {
        let mut registry = SplineRegistry::new(small_config()).unwrap();
        let a = registry.add(4).unwrap();
        let user = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)];
        registry.assign(a, &user).unwrap();
        assert_eq!(registry.control_points(a).unwrap()[0].x, 0.0);
        assert_eq!(registry.control_points(a).unwrap()[3].x, 3.0);

        let config = SplineConfig {
            insert_extension_points: false,
            ..small_config()
        };
        let mut registry = SplineRegistry::new(config).unwrap();
        let a = registry.add(4).unwrap();
        assert!(registry.assign(a, &user).is_err());
        registry.assign(a, &[Vec3::new(9.0, 0.0, 0.0); 4]).unwrap();
        assert!(registry
            .control_points(a)
            .unwrap()
            .iter()
            .all(|cp| cp.x == 9.0));
    }

    /// Writes `x = tag`, `y = point index` into every point of `entity`.
    fn tag_points(registry: &mut SplineRegistry, entity: SplineEntity, tag: f32) {
        let len = registry.component(entity).unwrap().num_control_points;
        let points: Vec<Vec3> = (0..len).map(|i| Vec3::new(tag, i as f32, 0.0)).collect();
        registry
            .assign_control_points(entity, &points, false)
            .unwrap();
    }

    #[test]
    fn test_resize_merges_with_own_range() {
        let config = SplineConfig {
            max_batches: 1,
            ..small_config()
        };
        let mut registry = SplineRegistry::new(config).unwrap();
        let head = registry.add(4).unwrap();
        let a = registry.add(6).unwrap();
        let b = registry.add(6).unwrap();
        assert_eq!(registry.component(a).unwrap().control_point_range(), 4..10);
        assert_eq!(registry.component(b).unwrap().control_point_range(), 10..16);
        tag_points(&mut registry, a, 7.0);

        // Only 0..10 is free, and only once `a` gives its own range back.
        registry.remove(head).unwrap();
        registry.resize(a, 10).unwrap();

        let comp = *registry.component(a).unwrap();
        assert_eq!(comp.index_batch, 0);
        assert_eq!(comp.control_point_range(), 0..10);
        let cps = registry.control_points(a).unwrap();
        for (i, cp) in cps[..6].iter().enumerate() {
            assert_eq!((cp.x, cp.y), (7.0, i as f32));
        }
        let ranges = registry.batch(0).unwrap().ranges();
        assert!(ranges.free_ranges().is_empty());
        assert_eq!(ranges.used(), 16);
        assert_eq!(registry.component(b).unwrap().control_point_range(), 10..16);
    }

    #[test]
    fn test_failed_resize_keeps_spline() {
        let config = SplineConfig {
            max_batches: 1,
            ..small_config()
        };
        let mut registry = SplineRegistry::new(config).unwrap();
        let a = registry.add(6).unwrap();
        let _b = registry.add(6).unwrap();
        tag_points(&mut registry, a, 3.0);
        let before = *registry.component(a).unwrap();
        let points_before = registry.control_points(a).unwrap().to_vec();

        assert!(matches!(
            registry.resize(a, 12),
            Err(SplineError::CapacityExceeded {
                limit: CapacityLimit::Batches,
                ..
            })
        ));
        assert_eq!(*registry.component(a).unwrap(), before);
        assert_eq!(
            registry.control_points(a).unwrap(),
            points_before.as_slice()
        );
        let ranges = registry.batch(0).unwrap().ranges();
        assert_eq!(ranges.used(), 12);
        assert_eq!(ranges.high_water(), 12);
        assert!(ranges.free_ranges().is_empty());

        // The kept range is still owned: a new spline cannot land on it.
        let c = registry.add(4).unwrap();
        assert_eq!(registry.component(c).unwrap().control_point_range(), 12..16);
    }

    /// Checks every structural invariant of `registry` against `live`.
    fn check_invariants(registry: &SplineRegistry, live: &[SplineEntity]) {
        assert_eq!(registry.len(), live.len());

        for (index, batch) in registry.batches().iter().enumerate() {
            let mut ranges: Vec<_> = batch
                .members()
                .iter()
                .map(|&e| registry.component(e).unwrap().control_point_range())
                .collect();
            ranges.sort_by_key(|r| r.start);
            for pair in ranges.windows(2) {
                assert!(pair[0].end <= pair[1].start, "overlap in batch {index}");
            }
            if let Some(last) = ranges.last() {
                assert!(last.end <= batch.capacity());
            }
            let used: usize = ranges.iter().map(ExactSizeIterator::len).sum();
            assert_eq!(batch.ranges().used(), used);

            let mut next = 0;
            for &entity in batch.members() {
                let comp = registry.component(entity).unwrap();
                assert_eq!(comp.index_batch, index);
                assert_eq!(comp.start_index_vertices, next);
                next += comp.num_vertices;
            }
            assert_eq!(batch.vertex_count(), next);
        }

        for &entity in live {
            let comp = registry.component(entity).unwrap();
            let range = comp.control_point_range();
            assert_eq!(range.end - range.start, comp.num_control_points);
            let members = registry.batch(comp.index_batch).unwrap().members();
            assert_eq!(members.iter().filter(|&&e| e == entity).count(), 1);
        }
        let total_members: usize = registry.batches().iter().map(|b| b.members().len()).sum();
        assert_eq!(total_members, live.len());
    }

    #[test]
    fn test_seeded_churn_keeps_invariants() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let config = SplineConfig {
            batch_capacity: 64,
            max_batches: 3,
            max_splines: 32,
            vertices_per_segment: 3,
            insert_extension_points: true,
        };
        let mut registry = SplineRegistry::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut live: Vec<(SplineEntity, f32)> = Vec::new();
        let mut next_tag = 0.0;

        for _ in 0..2000 {
            match rng.gen_range(0..3) {
                0 => match registry.add(rng.gen_range(4..20)) {
                    Ok(entity) => {
                        next_tag += 1.0;
                        tag_points(&mut registry, entity, next_tag);
                        live.push((entity, next_tag));
                    }
                    Err(err) => assert!(matches!(err, SplineError::CapacityExceeded { .. })),
                },
                1 if !live.is_empty() => {
                    let (entity, _) = live.swap_remove(rng.gen_range(0..live.len()));
                    registry.remove(entity).unwrap();
                    assert!(!registry.contains(entity));
                }
                _ if !live.is_empty() => {
                    let (entity, tag) = live[rng.gen_range(0..live.len())];
                    let before = *registry.component(entity).unwrap();
                    let len = rng.gen_range(4..24);
                    match registry.resize(entity, len) {
                        Ok(()) => {
                            let kept = before.num_control_points.min(len);
                            let cps = registry.control_points(entity).unwrap();
                            assert_eq!(cps.len(), len);
                            for (i, cp) in cps[..kept].iter().enumerate() {
                                assert_eq!((cp.x, cp.y), (tag, i as f32));
                            }
                            // Refill so the whole range carries the tag again.
                            tag_points(&mut registry, entity, tag);
                        }
                        Err(err) => {
                            assert!(matches!(err, SplineError::CapacityExceeded { .. }));
                            assert_eq!(*registry.component(entity).unwrap(), before);
                        }
                    }
                }
                _ => {}
            }

            let entities: Vec<_> = live.iter().map(|&(e, _)| e).collect();
            check_invariants(&registry, &entities);
            for &(entity, tag) in &live {
                let cps = registry.control_points(entity).unwrap();
                for (i, cp) in cps.iter().enumerate() {
                    assert_eq!((cp.x, cp.y), (tag, i as f32));
                }
            }
        }
    }
}
