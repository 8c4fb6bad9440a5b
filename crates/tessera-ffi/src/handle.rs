//! Generic slot+generation handle table for FFI lifetime management.
//!
//! Released handles carry a stale generation and resolve to `None` instead
//! of reaching freed state. Generations start at 1, so the handle `0` never
//! resolves and can serve as the absent sentinel.

/// Handle encoding: upper 32 bits = slot index, lower 32 bits = generation.
fn encode(slot: u32, generation: u32) -> u64 {
    ((slot as u64) << 32) | (generation as u64)
}

fn decode(handle: u64) -> (u32, u32) {
    let slot = (handle >> 32) as u32;
    let generation = handle as u32;
    (slot, generation)
}

const FIRST_GENERATION: u32 = 1;

struct Slot<T> {
    generation: u32,
    data: Option<T>,
}

/// A slot+generation handle table mapping `u64` handles to owned values.
///
/// Slots are recycled through a free list; each removal bumps the slot's
/// generation so earlier handles to it go stale.
pub(crate) struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
}

impl<T> HandleTable<T> {
    /// Create an empty handle table.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Insert a value and return its (never zero) handle.
    pub fn insert(&mut self, value: T) -> u64 {
        if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            slot.data = Some(value);
            encode(slot_idx, slot.generation)
        } else {
            let slot_idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: FIRST_GENERATION,
                data: Some(value),
            });
            encode(slot_idx, FIRST_GENERATION)
        }
    }

    /// The value behind a handle, or `None` if it is stale or never existed.
    pub fn get(&self, handle: u64) -> Option<&T> {
        let (slot_idx, generation) = decode(handle);
        let slot = self.slots.get(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.data.as_ref()
    }

    /// Mutable access to the value behind a handle.
    pub fn get_mut(&mut self, handle: u64) -> Option<&mut T> {
        let (slot_idx, generation) = decode(handle);
        let slot = self.slots.get_mut(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.data.as_mut()
    }

    /// Remove the value behind a handle, returning it.
    ///
    /// A slot whose generation wraps back to 0 is retired rather than
    /// recycled, so a wrapped handle can never resolve again.
    pub fn remove(&mut self, handle: u64) -> Option<T> {
        let (slot_idx, generation) = decode(handle);
        let slot = self.slots.get_mut(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.data.take()?;
        Self::retire_or_recycle(slot, slot_idx, &mut self.free_list);
        Some(value)
    }

    /// Remove every value matching `pred`, returning how many went.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let mut removed = 0;
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.data.as_ref().is_some_and(&mut pred) {
                slot.data = None;
                Self::retire_or_recycle(slot, idx as u32, &mut self.free_list);
                removed += 1;
            }
        }
        removed
    }

    /// Number of live values.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.data.is_some()).count()
    }

    fn retire_or_recycle(slot: &mut Slot<T>, slot_idx: u32, free_list: &mut Vec<u32>) {
        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation != 0 {
            free_list.push(slot_idx);
        }
    }
}
