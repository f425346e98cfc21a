//! Generation-checked slot storage for native sink resources.
//!
//! A removed slot bumps its generation, so a handle that outlived its
//! resource resolves to nothing instead of to whatever reused the slot.

use crate::NativeSinkHandle;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub struct SinkArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for SinkArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SinkArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, value: T) -> NativeSinkHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return NativeSinkHandle::from_parts(index, slot.generation);
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 1,
            value: Some(value),
        });
        NativeSinkHandle::from_parts(index, 1)
    }

    fn slot(&self, handle: NativeSinkHandle) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
    }

    pub fn get(&self, handle: NativeSinkHandle) -> Option<&T> {
        self.slot(handle).and_then(|slot| slot.value.as_ref())
    }

    pub fn contains(&self, handle: NativeSinkHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn remove(&mut self, handle: NativeSinkHandle) -> Option<T> {
        let index = handle.index();
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = match slot.generation.wrapping_add(1) {
            0 => 1,
            g => g,
        };
        self.free.push(index);
        self.len -= 1;
        Some(value)
    }

    /// Remove every value, invalidating all outstanding handles.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);
        for index in 0..self.slots.len() {
            let generation = self.slots[index].generation;
            if let Some(value) = self.remove(NativeSinkHandle::from_parts(index as u32, generation))
            {
                values.push(value);
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handle_does_not_resolve_after_reuse() {
        let mut arena = SinkArena::new();
        let first = arena.insert("a");
        assert_eq!(arena.remove(first), Some("a"));

        let second = arena.insert("b");
        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.remove(first), None);
        assert_eq!(arena.get(second), Some(&"b"));
    }

    #[test]
    fn remove_twice_frees_once() {
        let mut arena = SinkArena::new();
        let h = arena.insert(1);
        arena.insert(2);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.remove(h), Some(1));
        assert_eq!(arena.remove(h), None);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn drain_invalidates_everything() {
        let mut arena = SinkArena::new();
        let handles: Vec<_> = (0..4).map(|i| arena.insert(i)).collect();
        arena.remove(handles[1]);
        let mut drained = arena.drain();
        drained.sort();
        assert_eq!(drained, vec![0, 2, 3]);
        assert!(arena.is_empty());
        assert!(handles.iter().all(|&h| !arena.contains(h)));
    }
}
