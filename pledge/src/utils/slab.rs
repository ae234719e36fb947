/// A key into a [`Slab`].
///
/// Keys carry the generation of the slot they were issued for. Once the
/// value is removed the slot's generation moves on, so a stale key can
/// never observe a value inserted later into the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Key {
    index: usize,
    generation: u64,
}

/// A single slot of the slab.
struct Entry<T> {
    generation: u64,
    value: Option<T>,
}

/// A simple slab allocator.
///
/// A `Slab` stores values in a contiguous vector and hands out keys that
/// stay valid until the value is removed. Freed slots are reused, so the
/// vector only grows to the peak number of live values.
pub(crate) struct Slab<T> {
    /// Storage for items; `None` marks a free slot.
    entries: Vec<Entry<T>>,
    /// Stack of free indices that can be reused.
    free: Vec<usize>,
    /// Number of occupied slots.
    len: usize,
}

impl<T> Slab<T> {
    /// Creates an empty slab with room for `capacity` values.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Inserts a value and returns its key.
    ///
    /// A free slot is reused when available; otherwise the slab grows
    /// by one slot.
    pub(crate) fn insert(&mut self, value: T) -> Key {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index];
            entry.value = Some(value);

            return Key {
                index,
                generation: entry.generation,
            };
        }

        self.entries.push(Entry {
            generation: 0,
            value: Some(value),
        });

        Key {
            index: self.entries.len() - 1,
            generation: 0,
        }
    }

    /// Removes and returns the value stored under `key`.
    ///
    /// Returns `None` if the key is stale or was never issued by this slab.
    pub(crate) fn remove(&mut self, key: Key) -> Option<T> {
        let entry = self.entries.get_mut(key.index)?;

        if entry.generation != key.generation {
            return None;
        }

        let value = entry.value.take()?;
        entry.generation += 1;

        self.free.push(key.index);
        self.len -= 1;

        Some(value)
    }

    /// Returns the number of stored values.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the slab holds no values.
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every value, invalidating all outstanding keys.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);

        for (index, entry) in self.entries.iter_mut().enumerate() {
            if let Some(value) = entry.value.take() {
                entry.generation += 1;
                self.free.push(index);
                values.push(value);
            }
        }

        self.len = 0;
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_remove() {
        let mut slab = Slab::with_capacity(2);
        let a = slab.insert("a");
        let b = slab.insert("b");

        assert_eq!(slab.len(), 2);
        assert_eq!(slab.remove(b), Some("b"));
        assert_eq!(slab.remove(a), Some("a"));
        assert!(slab.is_empty());
    }

    #[test]
    fn stale_key_misses_reused_slot() {
        let mut slab = Slab::with_capacity(1);
        let first = slab.insert(1);
        assert_eq!(slab.remove(first), Some(1));

        let second = slab.insert(2);
        assert_eq!(slab.remove(first), None);
        assert_eq!(slab.remove(second), Some(2));
    }

    #[test]
    fn double_remove_is_none() {
        let mut slab = Slab::with_capacity(1);
        let key = slab.insert(7);

        assert_eq!(slab.remove(key), Some(7));
        assert_eq!(slab.remove(key), None);
        assert_eq!(slab.len(), 0);
    }

    #[test]
    fn drain_invalidates_keys() {
        let mut slab = Slab::with_capacity(4);
        let keys: Vec<_> = (0..3).map(|n| slab.insert(n)).collect();

        let mut drained = slab.drain();
        drained.sort();
        assert_eq!(drained, vec![0, 1, 2]);

        for key in keys {
            assert_eq!(slab.remove(key), None);
        }
        assert!(slab.is_empty());
    }
}
