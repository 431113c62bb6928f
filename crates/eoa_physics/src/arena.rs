//! Generational arena for bodies and colliders
//!
//! Values live in a contiguous slot vector and are addressed by an index
//! plus a generation. Removing a value bumps the slot's generation and
//! pushes the slot on a free list, so stale indices are detected instead of
//! aliasing whatever reuses the slot.

use rayon::prelude::*;

/// Index into an [`Arena`]: slot position plus the generation it was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaIndex {
    slot: u32,
    generation: u32,
}

impl ArenaIndex {
    /// Build an index from raw parts
    #[inline]
    pub const fn from_raw_parts(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Slot position
    #[inline]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Generation the index was issued for
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage with free-list reuse
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Insert a value, reusing a freed slot when one is available
    pub fn insert(&mut self, value: T) -> ArenaIndex {
        self.len += 1;
        if let Some(slot) = self.free_list.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.value = Some(value);
            ArenaIndex::from_raw_parts(slot, entry.generation)
        } else {
            let slot = self.slots.len() as u32;
            if slot == u32::MAX {
                panic!("Arena exhausted");
            }
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            ArenaIndex::from_raw_parts(slot, 0)
        }
    }

    /// Remove a value; returns `None` for stale or unknown indices
    pub fn remove(&mut self, index: ArenaIndex) -> Option<T> {
        let entry = self.slots.get_mut(index.slot as usize)?;
        if entry.generation != index.generation {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free_list.push(index.slot);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, index: ArenaIndex) -> Option<&T> {
        let entry = self.slots.get(index.slot as usize)?;
        if entry.generation != index.generation {
            return None;
        }
        entry.value.as_ref()
    }

    pub fn get_mut(&mut self, index: ArenaIndex) -> Option<&mut T> {
        let entry = self.slots.get_mut(index.slot as usize)?;
        if entry.generation != index.generation {
            return None;
        }
        entry.value.as_mut()
    }

    /// Borrow two distinct values mutably at once.
    ///
    /// Returns `None` if either index is invalid or both refer to the same slot.
    pub fn get2_mut(&mut self, a: ArenaIndex, b: ArenaIndex) -> Option<(&mut T, &mut T)> {
        if a.slot == b.slot || !self.contains(a) || !self.contains(b) {
            return None;
        }

        let (lo, hi, swapped) = if a.slot < b.slot {
            (a.slot as usize, b.slot as usize, false)
        } else {
            (b.slot as usize, a.slot as usize, true)
        };

        let (head, tail) = self.slots.split_at_mut(hi);
        let first = head[lo].value.as_mut()?;
        let second = tail[0].value.as_mut()?;

        if swapped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }

    pub fn contains(&self, index: ArenaIndex) -> bool {
        self.get(index).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over live values with their indices, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ArenaIndex, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, entry)| {
            entry
                .value
                .as_ref()
                .map(|v| (ArenaIndex::from_raw_parts(i as u32, entry.generation), v))
        })
    }
}

impl<T: Send> Arena<T> {
    /// Parallel mutable iteration over live values on the rayon pool
    pub fn par_values_mut(&mut self) -> impl ParallelIterator<Item = &mut T> {
        self.slots
            .par_iter_mut()
            .filter_map(|entry| entry.value.as_mut())
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
