use std::num::NonZeroU32;

/// Untyped handle for a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    pub index: u32,
    pub generation: NonZeroU32,
}

/// Generic pool implementation. Allocates values of type `T`, and allows accessing them via
/// dedicated handles. The handles include 32-bit index and generation counts, the latter
/// being used as a simple use-after-free test.
///
/// Stale handles never alias a newer entry, which is what makes them safe to keep around in
/// long lived lookup tables: a handle to a deallocated slot simply stops being valid.
///
/// Note, this implementation isn't panic-proof. There are some conditions that can cause panics:
///  * overflowing the 32-bit index counter
///  * overflowing the 32-bit generation counter
///  * improper handle accesses in `get` or `get_mut` (`try_*` variants exist)
///
/// ## Example
/// ```
/// # use tether_utils::Pool;
///
/// let mut pool: Pool<&str> = Pool::new();
///
/// let handle = pool.allocate("Level01");
/// assert_eq!(*pool.get(handle), "Level01");
///
/// // Deallocate it - the handle becomes invalid
/// pool.deallocate(handle);
/// assert!(pool.try_get(handle).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool<T> {
    top_generation: NonZeroU32,
    free_indices: Vec<u32>,
    generations: Vec<Option<NonZeroU32>>,
    values: Vec<Option<T>>,

    /// The amount of entries internal vectors should grow by.
    /// The default from [`Pool::new`] is 8.
    pub growth_amount: NonZeroU32,
}

impl<T> Pool<T> {
    /// Creates a new pool.
    pub fn new() -> Self {
        Self {
            top_generation: NonZeroU32::MIN,
            free_indices: vec![],
            generations: vec![],
            values: vec![],
            growth_amount: NonZeroU32::new(8).unwrap(),
        }
    }

    /// Allocates a new pool entry, fills it with `value`, and returns its handle.
    ///
    /// ## Panics
    ///  * On 32-bit index overflow
    ///  * On 32-bit generation overflow
    pub fn allocate(&mut self, value: T) -> PoolHandle {
        let index = match self.free_indices.pop() {
            Some(index) => index,
            None => {
                let low_index = self.generations.len() as u32;
                let high_index = low_index
                    .checked_add(self.growth_amount.get())
                    .expect("pool index overflow");
                let growth_range = low_index..high_index;

                // Reverse index range, so that pop gets lowest entries
                self.free_indices.extend(growth_range.clone().rev());
                self.generations.extend(growth_range.clone().map(|_| None));
                self.values.extend(growth_range.map(|_| None));

                self.free_indices.pop().unwrap()
            }
        };

        let generation = self.top_generation;
        self.top_generation = generation.checked_add(1).expect("pool generation overflow");

        self.values[index as usize] = Some(value);
        self.generations[index as usize] = Some(generation);

        PoolHandle { index, generation }
    }

    /// Deallocates a specified pool entry, returning the held value. Invalid handles are ignored
    /// and yield [`None`].
    pub fn deallocate(&mut self, handle: PoolHandle) -> Option<T> {
        if !self.is_valid(handle) {
            return None;
        }

        self.free_indices.push(handle.index);
        self.generations[handle.index as usize] = None;
        self.values[handle.index as usize].take()
    }

    /// Returns an immutable reference to a specified pool entry.
    ///
    /// ## Panics
    /// Panics if the handle is invalid.
    pub fn get(&self, handle: PoolHandle) -> &T {
        self.try_get(handle).expect("invalid pool handle")
    }

    /// Returns an immutable reference to a specified pool entry. If the handle is invalid, [`None`]
    /// is returned.
    pub fn try_get(&self, handle: PoolHandle) -> Option<&T> {
        if self.is_valid(handle) {
            self.values[handle.index as usize].as_ref()
        } else {
            None
        }
    }

    /// Returns a mutable reference to a specified pool entry.
    ///
    /// ## Panics
    /// Panics if the handle is invalid.
    pub fn get_mut(&mut self, handle: PoolHandle) -> &mut T {
        self.try_get_mut(handle).expect("invalid pool handle")
    }

    /// Returns a mutable reference to a specified pool entry. If the handle is invalid, [`None`]
    /// is returned.
    pub fn try_get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        if self.is_valid(handle) {
            self.values[handle.index as usize].as_mut()
        } else {
            None
        }
    }

    /// Verifies the validity of the specified handle.
    #[inline]
    pub fn is_valid(&self, handle: PoolHandle) -> bool {
        self.generations
            .get(handle.index as usize)
            .map(|&generation| generation == Some(handle.generation))
            .unwrap_or(false)
    }

    /// Iterates over all occupied entries, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.generations
            .iter()
            .zip(self.values.iter())
            .zip(0u32..)
            .filter_map(|((generation, value), index)| {
                Some((
                    PoolHandle {
                        index,
                        generation: (*generation)?,
                    },
                    value.as_ref()?,
                ))
            })
    }

    /// Counts how many pool entries are occupied.
    ///
    /// This is a fairly expensive operation, as it linearly scans all entries.
    pub fn count_allocated(&self) -> u32 {
        self.generations
            .iter()
            .filter(|gen| gen.is_some())
            .count()
            .try_into()
            .unwrap()
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::Pool;

    #[test]
    pub fn generic_pool_test() {
        let mut pool = Pool::new();
        let a = pool.allocate("a");
        let b = pool.allocate("b");
        let c = pool.allocate("c");

        assert_eq!(pool.count_allocated(), 3);
        assert_eq!(*pool.get(b), "b");

        assert_eq!(pool.deallocate(b), Some("b"));
        assert!(pool.try_get(b).is_none());
        assert_eq!(pool.deallocate(b), None);

        assert_eq!(pool.count_allocated(), 2);
        assert_eq!(*pool.get(a), "a");
        assert_eq!(*pool.get(c), "c");

        // The freed slot gets reused, but the old handle must not see the new value
        let d = pool.allocate("d");
        assert_eq!(d.index, b.index);
        assert_ne!(d.generation, b.generation);
        assert!(pool.try_get(b).is_none());
        assert_eq!(*pool.get(d), "d");
    }

    #[test]
    pub fn pool_iteration_skips_free_slots() {
        let mut pool = Pool::new();
        let a = pool.allocate(1);
        let b = pool.allocate(2);
        let c = pool.allocate(3);
        pool.deallocate(b);

        let seen: Vec<_> = pool.iter().map(|(handle, &value)| (handle, value)).collect();
        assert_eq!(seen, vec![(a, 1), (c, 3)]);
    }
}
