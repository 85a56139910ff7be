//! # Entity Pool
//!
//! Generational slot allocator backing spline identifiers.

use crate::spline::SplineEntity;

/// One slot of the pool.
#[derive(Clone, Debug)]
struct Slot<T> {
    /// Bumped every time the slot is freed.
    generation: u32,
    /// The stored value, if the slot is alive.
    value: Option<T>,
}

/// A pool of values addressed by [`SplineEntity`] handles.
///
/// Slots are reused through a free list, but every reuse bumps the slot's
/// generation so handles to removed values stay detectably stale.
///
/// # Thread Safety
///
/// Not thread-safe for mutation. Shared reads are fine.
#[derive(Clone, Debug)]
pub(crate) struct EntityPool<T> {
    /// The storage array. Grows on demand up to `capacity`.
    slots: Vec<Slot<T>>,
    /// Free list - indices of released slots.
    free_list: Vec<u32>,
    /// Number of live values.
    allocated_count: usize,
    /// Maximum number of live values.
    capacity: usize,
}

impl<T> EntityPool<T> {
    /// Creates an empty pool that will hold at most `capacity` values.
    #[must_use]
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            allocated_count: 0,
            capacity,
        }
    }

    /// Returns the number of live values.
    #[inline]
    #[must_use]
    pub(crate) const fn allocated_count(&self) -> usize {
        self.allocated_count
    }

    /// Returns the number of slots ever created (live or free).
    #[inline]
    #[must_use]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if another value fits.
    #[inline]
    #[must_use]
    pub(crate) const fn has_room(&self) -> bool {
        self.allocated_count < self.capacity
    }

    /// Stores a value. O(1).
    ///
    /// # Returns
    ///
    /// A handle to the stored value, or None if the pool is full.
    pub(crate) fn allocate(&mut self, value: T) -> Option<SplineEntity> {
        if !self.has_room() {
            return None;
        }

        let entity = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            SplineEntity::new(index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len()).ok()?;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            SplineEntity::new(index, 0)
        };

        self.allocated_count += 1;
        Some(entity)
    }

    /// Frees a value. O(1).
    ///
    /// # Returns
    ///
    /// The freed value, or None if the handle was stale or unknown.
    pub(crate) fn free(&mut self, entity: SplineEntity) -> Option<T> {
        let slot = self.slots.get_mut(entity.index() as usize)?;
        if slot.generation != entity.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(entity.index());
        self.allocated_count -= 1;
        Some(value)
    }

    /// Gets a reference to a live value.
    #[inline]
    #[must_use]
    pub(crate) fn get(&self, entity: SplineEntity) -> Option<&T> {
        let slot = self.slots.get(entity.index() as usize)?;
        if slot.generation != entity.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Gets a mutable reference to a live value.
    #[inline]
    pub(crate) fn get_mut(&mut self, entity: SplineEntity) -> Option<&mut T> {
        let slot = self.slots.get_mut(entity.index() as usize)?;
        if slot.generation != entity.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    /// Iterates over all live values.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (SplineEntity, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let entity = SplineEntity::new(u32::try_from(index).ok()?, slot.generation);
            slot.value.as_ref().map(|v| (entity, v))
        })
    }
}
