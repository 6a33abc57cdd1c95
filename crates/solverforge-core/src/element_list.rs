//! Arena-backed doubly linked lists with O(1) entry removal.
//!
//! Joins and if-exists nodes keep, per input tuple, a list of the output
//! tuples (or filtering trackers) that tuple currently participates in.
//! Each list and each entry is addressed through a generational handle, so
//! an entry can be removed without scanning its list and a handle kept in a
//! stale store slot fails loudly instead of touching unrelated data.
//!
//! All lists of one node share one [`ElementAwareLists`] instance.

use crate::arena::{Arena, Handle};
use crate::error::{Result, SolverForgeError};

/// Identifies one list inside an [`ElementAwareLists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListId(Handle);

/// Identifies one entry inside an [`ElementAwareLists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(Handle);

#[derive(Debug, Default)]
struct ListHead {
    first: Option<EntryId>,
    last: Option<EntryId>,
    len: usize,
}

struct Entry<T> {
    list: ListId,
    prev: Option<EntryId>,
    next: Option<EntryId>,
    value: T,
}

/// A family of linked lists sharing one entry arena.
///
/// # Example
///
/// ```
/// use solverforge_core::element_list::ElementAwareLists;
///
/// let mut lists = ElementAwareLists::new();
/// let list = lists.new_list();
/// let a = lists.add(list, 'a').unwrap();
/// let _b = lists.add(list, 'b').unwrap();
/// let _c = lists.add(list, 'c').unwrap();
///
/// assert_eq!(lists.remove(a).unwrap(), 'a');
/// assert_eq!(lists.iter(list).copied().collect::<String>(), "bc");
/// ```
pub struct ElementAwareLists<T> {
    lists: Arena<ListHead>,
    entries: Arena<Entry<T>>,
}

impl<T> ElementAwareLists<T> {
    pub fn new() -> Self {
        Self {
            lists: Arena::new(),
            entries: Arena::new(),
        }
    }

    /// Creates a new empty list.
    pub fn new_list(&mut self) -> ListId {
        ListId(self.lists.insert(ListHead::default()))
    }

    /// Appends `value` to the end of `list`.
    pub fn add(&mut self, list: ListId, value: T) -> Result<EntryId> {
        let last = self
            .lists
            .get(list.0)
            .ok_or(SolverForgeError::StaleHandle)?
            .last;
        let entry = EntryId(self.entries.insert(Entry {
            list,
            prev: last,
            next: None,
            value,
        }));
        if let Some(last) = last {
            if let Some(last_entry) = self.entries.get_mut(last.0) {
                last_entry.next = Some(entry);
            }
        }
        let head = self
            .lists
            .get_mut(list.0)
            .ok_or(SolverForgeError::StaleHandle)?;
        if head.first.is_none() {
            head.first = Some(entry);
        }
        head.last = Some(entry);
        head.len += 1;
        Ok(entry)
    }

    /// Unlinks and returns the entry's value.
    pub fn remove(&mut self, entry: EntryId) -> Result<T> {
        let removed = self
            .entries
            .remove(entry.0)
            .ok_or(SolverForgeError::StaleHandle)?;
        match removed.prev {
            Some(prev) => {
                if let Some(prev_entry) = self.entries.get_mut(prev.0) {
                    prev_entry.next = removed.next;
                }
            }
            None => {
                if let Some(head) = self.lists.get_mut(removed.list.0) {
                    head.first = removed.next;
                }
            }
        }
        match removed.next {
            Some(next) => {
                if let Some(next_entry) = self.entries.get_mut(next.0) {
                    next_entry.prev = removed.prev;
                }
            }
            None => {
                if let Some(head) = self.lists.get_mut(removed.list.0) {
                    head.last = removed.prev;
                }
            }
        }
        if let Some(head) = self.lists.get_mut(removed.list.0) {
            head.len -= 1;
        }
        Ok(removed.value)
    }

    /// Removes the list and every entry still in it, returning their values
    /// in list order.
    pub fn remove_list(&mut self, list: ListId) -> Result<Vec<T>> {
        let head = self
            .lists
            .remove(list.0)
            .ok_or(SolverForgeError::StaleHandle)?;
        let mut values = Vec::with_capacity(head.len);
        let mut cursor = head.first;
        while let Some(entry) = cursor {
            let removed = self
                .entries
                .remove(entry.0)
                .ok_or(SolverForgeError::StaleHandle)?;
            cursor = removed.next;
            values.push(removed.value);
        }
        Ok(values)
    }

    /// Returns the list an entry belongs to.
    #[inline]
    pub fn list_of(&self, entry: EntryId) -> Result<ListId> {
        self.entries
            .get(entry.0)
            .map(|e| e.list)
            .ok_or(SolverForgeError::StaleHandle)
    }

    #[inline]
    pub fn get(&self, entry: EntryId) -> Option<&T> {
        self.entries.get(entry.0).map(|e| &e.value)
    }

    #[inline]
    pub fn contains_list(&self, list: ListId) -> bool {
        self.lists.contains(list.0)
    }

    /// Number of entries in `list`, zero if the list no longer exists.
    #[inline]
    pub fn len(&self, list: ListId) -> usize {
        self.lists.get(list.0).map_or(0, |head| head.len)
    }

    #[inline]
    pub fn is_empty(&self, list: ListId) -> bool {
        self.len(list) == 0
    }

    /// Total number of entries across all lists.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of lists alive.
    #[inline]
    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    /// Iterates over the values of `list` from first to last.
    pub fn iter(&self, list: ListId) -> Iter<'_, T> {
        Iter {
            lists: self,
            cursor: self.lists.get(list.0).and_then(|head| head.first),
        }
    }

    /// Iterates over the entry handles of `list` from first to last.
    pub fn entries(&self, list: ListId) -> impl Iterator<Item = EntryId> + '_ {
        let mut cursor = self.lists.get(list.0).and_then(|head| head.first);
        std::iter::from_fn(move || {
            let current = cursor?;
            cursor = self.entries.get(current.0).and_then(|e| e.next);
            Some(current)
        })
    }
}

impl<T: Clone> ElementAwareLists<T> {
    /// Snapshot of the values of `list`, for callers that need to mutate the
    /// lists while walking them.
    pub fn to_vec(&self, list: ListId) -> Vec<T> {
        self.iter(list).cloned().collect()
    }
}

impl<T> Default for ElementAwareLists<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ElementAwareLists<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementAwareLists")
            .field("lists", &self.lists.len())
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Iterator over one list of an [`ElementAwareLists`].
pub struct Iter<'a, T> {
    lists: &'a ElementAwareLists<T>,
    cursor: Option<EntryId>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let entry = self.lists.entries.get(self.cursor?.0)?;
        self.cursor = entry.next;
        Some(&entry.value)
    }
}
