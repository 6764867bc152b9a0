//! Fixed-capacity slot arenas with generation-checked handles.
//!
//! Every slot carries a generation counter that is bumped when the slot is
//! freed, so a handle kept past its entity's lifetime stops resolving instead
//! of silently aliasing whatever reuses the slot.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::error::StoreError;

/// A slot index paired with the generation it was allocated in.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Builds a handle from raw parts. Only useful to tooling that needs to
    /// point at a slot it did not allocate.
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.index, self.generation).cmp(&(other.index, other.generation))
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

#[derive(Default)]
struct Slot<T> {
    generation: u32,
    occupied: bool,
    value: T,
}

/// Array-backed pool of `N` slots. Storage is allocated once and never grows.
pub struct SlotArena<T, const N: usize> {
    name: &'static str,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T: Default, const N: usize> SlotArena<T, N> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: (0..N).map(|_| Slot::default()).collect(),
            // popped from the back, so low indices are handed out first
            free: (0..N as u32).rev().collect(),
            live: 0,
        }
    }

    pub fn allocate(&mut self) -> Result<Handle<T>, StoreError> {
        let index = self.free.pop().ok_or(StoreError::OutOfCapacity {
            arena: self.name,
            capacity: N,
        })?;
        let slot = &mut self.slots[index as usize];
        debug_assert!(!slot.occupied, "free list handed out a live slot");
        slot.occupied = true;
        self.live += 1;
        Ok(Handle::from_raw(index, slot.generation))
    }

    /// Releases a slot and returns its payload. Freeing a slot that is not
    /// allocated under this handle is a logic error and panics.
    pub fn free(&mut self, handle: Handle<T>) -> T {
        let name = self.name;
        let slot = self.slot_mut(handle.index);
        assert!(
            slot.occupied,
            "{name}: free of unallocated slot {}",
            handle.index
        );
        assert_eq!(
            slot.generation, handle.generation,
            "{name}: free through stale handle {handle:?}"
        );
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        let value = std::mem::take(&mut slot.value);
        self.free.push(handle.index);
        self.live -= 1;
        value
    }

    /// Frees every live slot.
    pub fn clear(&mut self) {
        for handle in self.handles() {
            self.free(handle);
        }
    }
}

impl<T, const N: usize> SlotArena<T, N> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Whether the handle's index falls inside the arena at all. Handles
    /// read out of corrupted state may not.
    pub fn in_range(&self, handle: Handle<T>) -> bool {
        (handle.index as usize) < N
    }

    pub fn is_live(&self, handle: Handle<T>) -> bool {
        let slot = self.slot(handle.index);
        slot.occupied && slot.generation == handle.generation
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        let slot = self.slot(handle.index);
        (slot.occupied && slot.generation == handle.generation).then_some(&slot.value)
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let slot = self.slot_mut(handle.index);
        (slot.occupied && slot.generation == handle.generation).then_some(&mut slot.value)
    }

    /// Like [`get`](Self::get) but turns a stale handle into an error.
    pub fn require(&self, handle: Handle<T>) -> Result<&T, StoreError> {
        let name = self.name;
        self.get(handle).ok_or(StoreError::StaleHandle {
            arena: name,
            index: handle.index,
            generation: handle.generation,
        })
    }

    pub fn require_mut(&mut self, handle: Handle<T>) -> Result<&mut T, StoreError> {
        let name = self.name;
        self.get_mut(handle).ok_or(StoreError::StaleHandle {
            arena: name,
            index: handle.index,
            generation: handle.generation,
        })
    }

    /// The live handle for a slot index, if the slot is allocated.
    pub fn handle_at(&self, index: usize) -> Option<Handle<T>> {
        let slot = self.slot(index as u32);
        slot.occupied
            .then(|| Handle::from_raw(index as u32, slot.generation))
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.slot(index as u32).occupied
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.occupied)
            .map(|(index, slot)| (Handle::from_raw(index as u32, slot.generation), &slot.value))
    }

    /// Snapshot of the live handles, for callers that mutate while walking.
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    fn slot(&self, index: u32) -> &Slot<T> {
        assert!(
            (index as usize) < N,
            "{}: slot index {index} out of range (capacity {N})",
            self.name
        );
        &self.slots[index as usize]
    }

    fn slot_mut(&mut self, index: u32) -> &mut Slot<T> {
        assert!(
            (index as usize) < N,
            "{}: slot index {index} out of range (capacity {N})",
            self.name
        );
        &mut self.slots[index as usize]
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let occupied = self.slots.iter().filter(|slot| slot.occupied).count();
        assert_eq!(self.live, occupied);
        assert_eq!(self.free.len() + self.live, N);

        let mut seen = vec![false; N];
        for &index in &self.free {
            let index = index as usize;
            assert!(!self.slots[index].occupied, "live slot {index} on free list");
            assert!(!seen[index], "slot {index} on free list twice");
            seen[index] = true;
        }
    }
}
