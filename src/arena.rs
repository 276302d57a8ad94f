//! Generational slot allocator used to store tree nodes.

use std::collections::TryReserveError;
use std::mem;
use std::ops::{Index, IndexMut};
use std::vec::Vec;

/// A handle to an object stored in a `TypedArena<T>`.
///
/// An entry remembers the generation of the slot it was issued for, so an entry that outlived
/// its object never resolves to whatever object is later stored in the same slot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Entry {
    index: usize,
    generation: u64,
}

enum Block<T> {
    Occupied(T),
    Vacant(Option<usize>),
}

struct Slot<T> {
    generation: u64,
    block: Block<T>,
}

/// A slot allocator that only stores a single type of object.
///
/// Freed slots are threaded onto an intrusive free list and reused by later allocations. Each
/// slot carries a generation counter that is bumped when its object is freed, which invalidates
/// every outstanding `Entry` for that slot. When the arena is full it grows by a fixed number
/// of slots, and a failure to obtain that memory is reported instead of aborting.
///
/// # Examples
///
/// ```
/// use rb_set::arena::TypedArena;
///
/// let mut arena = TypedArena::new(1024);
///
/// let x = arena.allocate(1).unwrap();
/// assert_eq!(arena[x], 1);
///
/// arena[x] += 1;
/// assert_eq!(arena[x], 2);
///
/// assert_eq!(arena.free(&x), Some(2));
/// assert_eq!(arena.get(&x), None);
/// ```
pub struct TypedArena<T> {
    head: Option<usize>,
    slots: Vec<Slot<T>>,
    chunk_size: usize,
    size: usize,
}

impl<T> TypedArena<T> {
    fn slot(&self, entry: &Entry) -> Option<&Slot<T>> {
        self.slots
            .get(entry.index)
            .filter(|slot| slot.generation == entry.generation)
    }

    /// Constructs a new, empty `TypedArena<T>` that grows by `chunk_size` slots at a time. No
    /// memory is allocated until the first object is stored.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::arena::TypedArena;
    ///
    /// let arena: TypedArena<u32> = TypedArena::new(1024);
    /// assert!(arena.is_empty());
    /// ```
    pub fn new(chunk_size: usize) -> Self {
        TypedArena {
            head: None,
            slots: Vec::new(),
            chunk_size: chunk_size.max(1),
            size: 0,
        }
    }

    /// Constructs a new, empty `TypedArena<T>` with room for at least `capacity` objects.
    /// Returns an error if the memory could not be reserved.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::arena::TypedArena;
    ///
    /// let arena: TypedArena<u32> = TypedArena::with_capacity(64, 128).unwrap();
    /// assert!(arena.capacity() >= 128);
    /// ```
    pub fn with_capacity(chunk_size: usize, capacity: usize) -> Result<Self, TryReserveError> {
        let mut arena = TypedArena::new(chunk_size);
        arena.slots.try_reserve_exact(capacity)?;
        Ok(arena)
    }

    /// Stores an object in the arena and returns an `Entry` that can later be used to access
    /// and free it. Returns an error if the arena needed to grow and the memory could not be
    /// reserved; in that case the arena is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0).unwrap();
    /// assert_eq!(arena.get(&x), Some(&0));
    /// ```
    pub fn allocate(&mut self, value: T) -> Result<Entry, TryReserveError> {
        match self.head.take() {
            None => {
                if self.slots.len() == self.slots.capacity() {
                    self.slots.try_reserve_exact(self.chunk_size)?;
                }
                self.slots.push(Slot {
                    generation: 0,
                    block: Block::Occupied(value),
                });
                self.size += 1;
                Ok(Entry {
                    index: self.slots.len() - 1,
                    generation: 0,
                })
            },
            Some(index) => {
                let slot = &mut self.slots[index];
                let vacant_block = mem::replace(&mut slot.block, Block::Occupied(value));
                match vacant_block {
                    Block::Vacant(next_index) => self.head = next_index,
                    Block::Occupied(_) => panic!("Expected a vacant block on the free list."),
                }
                self.size += 1;
                Ok(Entry {
                    index,
                    generation: slot.generation,
                })
            },
        }
    }

    /// Frees an object in the arena and returns it. Returns `None` if the entry does not
    /// correspond to a live object.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0).unwrap();
    /// assert_eq!(arena.free(&x), Some(0));
    /// assert_eq!(arena.free(&x), None);
    /// ```
    pub fn free(&mut self, entry: &Entry) -> Option<T> {
        if !self.contains(entry) {
            return None;
        }
        let head = self.head.take();
        let slot = &mut self.slots[entry.index];
        let old_block = mem::replace(&mut slot.block, Block::Vacant(head));
        slot.generation = slot.generation.wrapping_add(1);
        self.head = Some(entry.index);
        self.size -= 1;
        match old_block {
            Block::Occupied(value) => Some(value),
            Block::Vacant(_) => panic!("Expected an occupied block."),
        }
    }

    /// Returns `true` if the entry corresponds to a live object.
    pub fn contains(&self, entry: &Entry) -> bool {
        match self.slot(entry) {
            Some(Slot {
                block: Block::Occupied(_),
                ..
            }) => true,
            _ => false,
        }
    }

    /// Returns an immutable reference to an object in the arena. Returns `None` if the entry
    /// does not correspond to a live object.
    pub fn get(&self, entry: &Entry) -> Option<&T> {
        match self.slot(entry) {
            Some(Slot {
                block: Block::Occupied(value),
                ..
            }) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to an object in the arena. Returns `None` if the entry
    /// does not correspond to a live object.
    pub fn get_mut(&mut self, entry: &Entry) -> Option<&mut T> {
        match self.slots.get_mut(entry.index) {
            Some(Slot {
                generation,
                block: Block::Occupied(value),
            }) if *generation == entry.generation => Some(value),
            _ => None,
        }
    }

    /// Returns the number of live objects in the arena.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the arena holds no live objects.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of slots the arena can hold without growing.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}

impl<T> Index<Entry> for TypedArena<T> {
    type Output = T;

    fn index(&self, entry: Entry) -> &Self::Output {
        self.get(&entry).expect("Error: entry does not refer to a live object.")
    }
}

impl<T> IndexMut<Entry> for TypedArena<T> {
    fn index_mut(&mut self, entry: Entry) -> &mut Self::Output {
        self.get_mut(&entry).expect("Error: entry does not refer to a live object.")
    }
}

#[cfg(test)]
mod tests {
    use super::{Entry, TypedArena};

    #[test]
    fn test_free_invalid_block() {
        let mut arena: TypedArena<u32> = TypedArena::new(1024);
        assert_eq!(
            arena.free(&Entry {
                index: 0,
                generation: 0,
            }),
            None,
        );
    }

    #[test]
    fn test_free_vacant_block() {
        let mut arena = TypedArena::new(1024);
        let entry = arena.allocate(0).unwrap();
        assert_eq!(arena.free(&entry), Some(0));
        assert_eq!(arena.free(&entry), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_allocate() {
        let mut arena = TypedArena::new(1024);
        for index in 0..3 {
            assert_eq!(
                arena.allocate(0).unwrap(),
                Entry {
                    index,
                    generation: 0,
                },
            );
        }
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_allocate_grows_by_chunk() {
        let mut arena = TypedArena::new(2);
        arena.allocate(0).unwrap();
        arena.allocate(1).unwrap();
        assert!(arena.capacity() >= 2);
        let entry = arena.allocate(2).unwrap();
        assert!(arena.capacity() >= 3);
        assert_eq!(arena[entry], 2);
    }

    #[test]
    fn test_free_reuses_slot_with_new_generation() {
        let mut arena = TypedArena::new(1024);
        let old = arena.allocate(0).unwrap();
        assert_eq!(arena.free(&old), Some(0));

        let new = arena.allocate(1).unwrap();
        assert_eq!(
            new,
            Entry {
                index: 0,
                generation: 1,
            },
        );
        assert_eq!(arena.get(&old), None);
        assert_eq!(arena.get(&new), Some(&1));
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut arena = TypedArena::new(1024);
        let a = arena.allocate('a').unwrap();
        let b = arena.allocate('b').unwrap();
        arena.free(&a);
        arena.free(&b);
        assert_eq!(arena.allocate('c').unwrap().index, b.index);
        assert_eq!(arena.allocate('d').unwrap().index, a.index);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_get_mut() {
        let mut arena = TypedArena::new(1024);
        let entry = arena.allocate(0).unwrap();
        *arena.get_mut(&entry).unwrap() = 1;
        assert_eq!(arena.get(&entry), Some(&1));
    }

    #[test]
    fn test_get_mut_stale_entry() {
        let mut arena = TypedArena::new(1024);
        let entry = arena.allocate(0).unwrap();
        arena.free(&entry);
        arena.allocate(1).unwrap();
        assert_eq!(arena.get_mut(&entry), None);
    }

    #[test]
    fn test_with_capacity() {
        let arena: TypedArena<u64> = TypedArena::with_capacity(4, 32).unwrap();
        assert!(arena.capacity() >= 32);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_with_capacity_overflow() {
        let arena = TypedArena::<u64>::with_capacity(4, usize::MAX);
        assert!(arena.is_err());
    }

    #[test]
    fn test_allocate_error_leaves_arena_unchanged() {
        let mut arena: TypedArena<u64> = TypedArena::new(usize::MAX);
        assert!(arena.allocate(1).is_err());
        assert!(arena.is_empty());
        assert_eq!(arena.capacity(), 0);
        assert_eq!(
            arena.get(&Entry {
                index: 0,
                generation: 0,
            }),
            None,
        );
    }

    #[test]
    #[should_panic]
    fn test_index_stale_entry() {
        let mut arena = TypedArena::new(1024);
        let entry = arena.allocate(0).unwrap();
        arena.free(&entry);
        let _ = arena[entry];
    }
}
