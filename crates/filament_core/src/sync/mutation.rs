//! # Parallel Mutation Context
//!
//! Lock-free concurrent control-point writes into shared batch buffers.
//!
//! ## Lifecycle
//!
//! ```text
//!   registry.begin_mutation()          (single thread)
//!          │
//!          ▼
//!   ┌─────────────────────────────┐
//!   │ worker A: spline 3 ──► batch 0 [12..19)   dirty[0] = true
//!   │ worker B: spline 7 ──► batch 0 [40..46)   dirty[0] = true
//!   │ worker C: spline 9 ──► batch 2 [0..5)     dirty[2] = true
//!   └─────────────────────────────┘
//!          │
//!          ▼
//!   context.close()                    (single thread)
//!   batch[i].dirty |= dirty[i]
//! ```
//!
//! ## Safety Note
//!
//! This module requires unsafe code to hand out write access to disjoint
//! ranges of one buffer from a shared reference. All unsafe blocks are
//! documented.

#![allow(unsafe_code)]

use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{InvariantViolation, SplineResult};
use crate::math::{ControlPoint, Vec3};
use crate::memory::EntityPool;
use crate::spline::{write_spline, SplineBatch, SplineComponent, SplineEntity};

/// One spline update inside a flat, shared input array.
///
/// `num_control_points` counts user points only, not extension points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchSplineInput {
    /// The spline to write.
    pub entity: SplineEntity,
    /// First input point for this spline.
    pub start_index: usize,
    /// Number of input points for this spline.
    pub num_control_points: usize,
}

/// What a mutation phase changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationStats {
    /// Successful `modify_control_points` calls.
    pub splines_modified: usize,
    /// Batches whose persistent dirty flag was set on close.
    pub batches_dirtied: usize,
}

/// Raw write view over one batch buffer.
#[derive(Clone, Copy)]
struct BatchView {
    ptr: NonNull<ControlPoint>,
    len: usize,
}

/// Releases a spline's write claim when the write finishes.
struct Claim<'c> {
    flag: &'c AtomicBool,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A transient view that lets many threads write control points at once.
///
/// Obtained from [`SplineRegistry::begin_mutation`](crate::SplineRegistry::begin_mutation).
/// It borrows the registry exclusively, so no spline can be added, removed
/// or resized, and no generation job can read the buffers, until it closes.
///
/// ## Thread Safety
///
/// - Different splines own disjoint buffer ranges, so writes to them never
///   alias, whichever batch they live in.
/// - Each spline carries a claim bit. A second writer that arrives while
///   the first is still writing gets
///   [`InvariantViolation::ConcurrentWrite`] instead of racing. Nobody waits.
/// - Dirty scratch flags are only ever stored `true`; nobody reads them
///   until [`close`](Self::close).
///
/// ## Usage
///
/// ```rust,ignore
/// let ctx = registry.begin_mutation();
/// ctx.apply(&inputs, &positions, true)?; // rayon, one task per spline
/// let stats = ctx.close();
/// ```
pub struct MutationContext<'a> {
    /// Read-only spline records.
    entities: &'a EntityPool<SplineComponent>,
    /// The batches whose persistent flags are updated on close.
    batches: &'a mut [SplineBatch],
    /// Per batch write views, captured on open.
    views: Box<[BatchView]>,
    /// Per batch dirty scratch, zero-initialized.
    scratch_dirty: Box<[AtomicBool]>,
    /// Per spline slot write claims.
    claims: Box<[AtomicBool]>,
    /// Successful writes.
    modified: AtomicUsize,
    /// Extension-point default for [`modify`](Self::modify).
    insert_extension: bool,
    /// Set once the scratch flags were flushed.
    closed: bool,
}

// SAFETY: The raw views point into buffers exclusively borrowed for 'a.
// Every write goes through `modify_control_points`, which confines it to
// the target spline's range and holds that spline's claim bit for the
// duration, so no two threads ever touch the same element.
unsafe impl Send for MutationContext<'_> {}
// SAFETY: See above. All other shared state is atomic or read-only.
unsafe impl Sync for MutationContext<'_> {}

impl<'a> MutationContext<'a> {
    /// Captures write views and allocates zeroed scratch flags.
    pub(crate) fn open(
        entities: &'a EntityPool<SplineComponent>,
        batches: &'a mut [SplineBatch],
        insert_extension: bool,
    ) -> Self {
        let views: Box<[BatchView]> = batches
            .iter_mut()
            .map(|batch| {
                let buffer = batch.control_points_mut();
                BatchView {
                    len: buffer.len(),
                    ptr: NonNull::from(buffer).cast::<ControlPoint>(),
                }
            })
            .collect();
        let scratch_dirty = (0..batches.len()).map(|_| AtomicBool::new(false)).collect();
        let claims = (0..entities.slot_count())
            .map(|_| AtomicBool::new(false))
            .collect();

        Self {
            entities,
            batches,
            views,
            scratch_dirty,
            claims,
            modified: AtomicUsize::new(0),
            insert_extension,
            closed: false,
        }
    }

    /// Returns the number of batches this context covers.
    #[inline]
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.views.len()
    }

    /// Returns whether [`modify`](Self::modify) inserts extension points.
    #[inline]
    #[must_use]
    pub const fn inserts_extension_points(&self) -> bool {
        self.insert_extension
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

    /// Writes a spline's user points and marks its batch dirty.
    ///
    /// Safe to call from many threads at once for different splines.
    /// Points land at the start of the spline's range, or one past it when
    /// `insert_extension` is set, in which case both extension points are
    /// then recomputed. Each point keeps its existing `w` payload.
    ///
    /// # Errors
    ///
    /// - [`InvariantViolation::UnknownEntity`] for removed or foreign handles.
    /// - [`InvariantViolation::ControlPointCountMismatch`] if `points` does
    ///   not fill the range.
    /// - [`InvariantViolation::ConcurrentWrite`] if another thread is
    ///   writing the same spline right now.
    pub fn modify_control_points(
        &self,
        entity: SplineEntity,
        points: &[Vec3],
        insert_extension: bool,
    ) -> SplineResult<()> {
        let comp = self.component(entity)?;
        comp.check_point_count(entity, points.len(), insert_extension)?;

        let view = self
            .views
            .get(comp.index_batch)
            .copied()
            .ok_or(InvariantViolation::UnknownEntity(entity))?;
        let range = comp.control_point_range();
        if range.end > view.len {
            return Err(InvariantViolation::InputOutOfRange {
                start: range.start,
                end: range.end,
                len: view.len,
            }
            .into());
        }

        let _claim = self.claim(entity)?;

        // SAFETY: `range` lies inside the buffer (checked above), the buffer
        // is exclusively borrowed for the context's lifetime and never
        // reallocated, live splines own disjoint ranges, and the claim
        // guarantees no other thread holds this spline's range.
        let region = unsafe {
            std::slice::from_raw_parts_mut(view.ptr.as_ptr().add(range.start), range.len())
        };
        write_spline(region, points, insert_extension, true);

        // Write only, never read by workers.
        self.scratch_dirty[comp.index_batch].store(true, Ordering::Relaxed);
        self.modified.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// [`modify_control_points`](Self::modify_control_points) with the
    /// registry's configured extension-point setting.
    ///
    /// # Errors
    ///
    /// Same as [`modify_control_points`](Self::modify_control_points).
    pub fn modify(&self, entity: SplineEntity, points: &[Vec3]) -> SplineResult<()> {
        self.modify_control_points(entity, points, self.insert_extension)
    }

    /// Applies many spline updates in parallel.
    ///
    /// Each input slices its points out of `points`. Stops at the first
    /// error; updates already applied stay applied.
    ///
    /// # Errors
    ///
    /// [`InvariantViolation::InputOutOfRange`] for inputs that slice past
    /// `points`, plus anything [`modify_control_points`](Self::modify_control_points)
    /// returns.
    pub fn apply(
        &self,
        inputs: &[BatchSplineInput],
        points: &[Vec3],
        insert_extension: bool,
    ) -> SplineResult<()> {
        inputs.par_iter().try_for_each(|input| {
            let start = input.start_index;
            let end = start.saturating_add(input.num_control_points);
            let source = points
                .get(start..end)
                .ok_or(InvariantViolation::InputOutOfRange {
                    start,
                    end,
                    len: points.len(),
                })?;
            self.modify_control_points(input.entity, source, insert_extension)
        })
    }

    /// [`apply`](Self::apply) with the registry's configured
    /// extension-point setting.
    ///
    /// # Errors
    ///
    /// Same as [`apply`](Self::apply).
    pub fn apply_configured(
        &self,
        inputs: &[BatchSplineInput],
        points: &[Vec3],
    ) -> SplineResult<()> {
        self.apply(inputs, points, self.insert_extension)
    }

    /// Ends the phase: ORs every scratch flag into its batch's persistent
    /// dirty flag and releases the scratch buffers.
    pub fn close(mut self) -> MutationStats {
        self.flush()
    }

    fn claim(&self, entity: SplineEntity) -> SplineResult<Claim<'_>> {
        let flag = self
            .claims
            .get(entity.index() as usize)
            .ok_or(InvariantViolation::UnknownEntity(entity))?;
        if flag.swap(true, Ordering::Acquire) {
            return Err(InvariantViolation::ConcurrentWrite(entity).into());
        }
        Ok(Claim { flag })
    }

    fn flush(&mut self) -> MutationStats {
        let mut stats = MutationStats {
            splines_modified: *self.modified.get_mut(),
            batches_dirtied: 0,
        };
        if self.closed {
            return stats;
        }

        for (batch, flag) in self.batches.iter_mut().zip(self.scratch_dirty.iter_mut()) {
            if *flag.get_mut() {
                batch.mark_dirty();
                stats.batches_dirtied += 1;
            }
        }
        self.closed = true;

        debug!(
            "Mutation phase closed: {} splines written, {} batches dirtied",
            stats.splines_modified, stats.batches_dirtied
        );
        stats
    }
}

impl Drop for MutationContext<'_> {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Mutation context dropped without close; flushing dirty flags");
            self.flush();
        }
    }
}
