//! Generational arena with stable handles.
//!
//! Slots are reused after removal, but every reuse bumps the slot's
//! generation, so a handle to a removed element can never alias the element
//! that later takes its slot. Lookups through a stale handle return `None`.

use std::fmt;

/// Stable handle into an [`Arena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Returns the slot index. Only unique among live handles.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<u32> },
}

/// Generational arena.
///
/// # Example
///
/// ```
/// use solverforge_core::arena::Arena;
///
/// let mut arena = Arena::new();
/// let a = arena.insert("a");
/// assert_eq!(arena.get(a), Some(&"a"));
///
/// assert_eq!(arena.remove(a), Some("a"));
/// let b = arena.insert("b");
///
/// // The slot is reused, the old handle is not.
/// assert_eq!(a.index(), b.index());
/// assert_eq!(arena.get(a), None);
/// assert_eq!(arena.get(b), Some(&"b"));
/// ```
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Arena<T> {
    /// Creates a new empty arena.
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Creates a new arena with pre-allocated capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
        }
    }

    /// Inserts a value and returns its handle.
    pub fn insert(&mut self, value: T) -> Handle {
        self.len += 1;
        // The free list only ever links vacant slots.
        if let Some(index) = self.free_head {
            if let Some(Slot::Vacant {
                generation,
                next_free,
            }) = self.slots.get(index as usize)
            {
                let (generation, next_free) = (*generation, *next_free);
                self.slots[index as usize] = Slot::Occupied { generation, value };
                self.free_head = next_free;
                return Handle { index, generation };
            }
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot::Occupied {
            generation: 0,
            value,
        });
        Handle {
            index,
            generation: 0,
        }
    }

    /// Removes the value behind `handle`, or returns `None` if the handle is stale.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == handle.generation => {
                let vacant = Slot::Vacant {
                    generation: handle.generation.wrapping_add(1),
                    next_free: self.free_head,
                };
                let old = std::mem::replace(slot, vacant);
                self.free_head = Some(handle.index);
                self.len -= 1;
                match old {
                    Slot::Occupied { value, .. } => Some(value),
                    Slot::Vacant { .. } => None,
                }
            }
            _ => None,
        }
    }

    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        match self.slots.get(handle.index as usize)? {
            Slot::Occupied { generation, value } if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match self.slots.get_mut(handle.index as usize)? {
            Slot::Occupied { generation, value } if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Returns the number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes all elements. Outstanding handles become stale.
    pub fn clear(&mut self) {
        let handles: Vec<Handle> = self.iter().map(|(handle, _)| handle).collect();
        for handle in handles {
            self.remove(handle);
        }
    }

    /// Iterates over live elements in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, value } => Some((
                    Handle {
                        index: index as u32,
                        generation: *generation,
                    },
                    value,
                )),
                Slot::Vacant { .. } => None,
            })
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .finish()
    }
}
