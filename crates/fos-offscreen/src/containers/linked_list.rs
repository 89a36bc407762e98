//! Doubly linked list
//!
//! Nodes live in a slot table; links are slot indices, the same way the DOM
//! arena threads `prev_sibling`/`next_sibling` through node ids. Freed slots
//! are recycled through a free list and carry a generation so a stale
//! [`NodeKey`] never reaches a recycled node.
//!
//! Slots are addressed by `u32`, so a list holds at most `u32::MAX` nodes.
//! Growing past its limit fails with [`DomError::CapacityOverflow`] and
//! leaves the list unchanged.

use super::{check_splice, Identity, Sequence};
use crate::{DomError, DomResult};

/// Stable address of a list node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    index: u32,
    generation: u32,
}

/// Node-based ordered sequence
#[derive(Debug, Clone)]
pub struct DoublyLinkedList<T> {
    items: Vec<Option<T>>,
    prev: Vec<Option<u32>>,
    next: Vec<Option<u32>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    count: usize,
    max_slots: u32,
}

impl<T> DoublyLinkedList<T> {
    pub fn new() -> Self {
        Self::with_limit(u32::MAX)
    }

    /// Create a list holding at most `limit` nodes
    pub fn with_limit(limit: u32) -> Self {
        Self {
            items: Vec::new(),
            prev: Vec::new(),
            next: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            head: None,
            tail: None,
            count: 0,
            max_slots: limit,
        }
    }

    /// Most nodes the list can hold
    pub fn limit(&self) -> usize {
        self.max_slots as usize
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Append at the tail, O(1)
    pub fn push(&mut self, item: T) -> DomResult<NodeKey> {
        let slot = self.alloc(item)?;
        self.link_before(slot, None);
        Ok(self.key_of(slot))
    }

    pub fn first(&self) -> Option<&T> {
        self.head.and_then(|slot| self.item(slot))
    }

    pub fn last(&self) -> Option<&T> {
        self.tail.and_then(|slot| self.item(slot))
    }

    /// Item at `index`, walking from whichever end is nearer
    pub fn get_at(&self, index: usize) -> Option<&T> {
        self.slot_at(index).and_then(|slot| self.item(slot))
    }

    /// Key of the node at `index`
    pub fn key_at(&self, index: usize) -> Option<NodeKey> {
        self.slot_at(index).map(|slot| self.key_of(slot))
    }

    /// Item behind `key`, if the node is still linked
    pub fn get(&self, key: NodeKey) -> Option<&T> {
        self.live_slot(key).and_then(|slot| self.item(slot))
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.count,
        }
    }

    /// Index of `item` by identity, O(n)
    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: Identity,
    {
        self.iter().position(|candidate| candidate.same(item))
    }

    /// Find `item` by identity and unlink it
    pub fn remove_item(&mut self, item: &T) -> Option<T>
    where
        T: Identity,
    {
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            if self.item(slot).is_some_and(|candidate| candidate.same(item)) {
                return self.unlink_slot(slot);
            }
            cursor = self.next[slot as usize];
        }
        None
    }

    /// Unlink the node behind `key`, O(1)
    pub fn unlink(&mut self, key: NodeKey) -> Option<T> {
        let slot = self.live_slot(key)?;
        self.unlink_slot(slot)
    }

    /// Unlink `remove_len` nodes starting at `index`, then link `insert`
    /// before the first surviving successor (or at the tail).
    ///
    /// Removed items are handed back in order.
    pub fn splice<I>(&mut self, index: usize, remove_len: usize, insert: I) -> DomResult<Vec<T>>
    where
        I: IntoIterator<Item = T>,
    {
        check_splice(index, remove_len, self.count)?;
        let insert: Vec<T> = insert.into_iter().collect();
        let free_after_removal = self.free_slots().saturating_add(remove_len);
        if insert.len() > free_after_removal {
            return Err(self.overflow());
        }

        let mut cursor = self.slot_at(index);
        let mut removed = Vec::with_capacity(remove_len);
        for _ in 0..remove_len {
            let Some(slot) = cursor else { break };
            cursor = self.next[slot as usize];
            if let Some(item) = self.unlink_slot(slot) {
                removed.push(item);
            }
        }

        for item in insert {
            let slot = self.alloc(item)?;
            self.link_before(slot, cursor);
        }
        Ok(removed)
    }

    /// Unlink every node, returning the items in order
    pub fn clear(&mut self) -> Vec<T> {
        let mut drained = Vec::with_capacity(self.count);
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            cursor = self.next[slot as usize];
            if let Some(item) = self.items[slot as usize].take() {
                drained.push(item);
            }
        }
        *self = Self::with_limit(self.max_slots);
        drained
    }

    fn item(&self, slot: u32) -> Option<&T> {
        self.items.get(slot as usize).and_then(Option::as_ref)
    }

    fn key_of(&self, slot: u32) -> NodeKey {
        NodeKey {
            index: slot,
            generation: self.generations[slot as usize],
        }
    }

    fn live_slot(&self, key: NodeKey) -> Option<u32> {
        let occupied = self.items.get(key.index as usize)?.is_some();
        (occupied && self.generations[key.index as usize] == key.generation).then_some(key.index)
    }

    fn slot_at(&self, index: usize) -> Option<u32> {
        if index >= self.count {
            return None;
        }
        if index < self.count / 2 {
            let mut cursor = self.head;
            for _ in 0..index {
                cursor = cursor.and_then(|slot| self.next[slot as usize]);
            }
            cursor
        } else {
            let mut cursor = self.tail;
            for _ in 0..(self.count - 1 - index) {
                cursor = cursor.and_then(|slot| self.prev[slot as usize]);
            }
            cursor
        }
    }

    /// Slots that can still be handed out, recycled or fresh
    fn free_slots(&self) -> usize {
        let fresh = (self.max_slots as usize).saturating_sub(self.items.len());
        self.free_list.len().saturating_add(fresh)
    }

    fn overflow(&self) -> DomError {
        DomError::CapacityOverflow {
            limit: self.limit(),
        }
    }

    fn alloc(&mut self, item: T) -> DomResult<u32> {
        if let Some(slot) = self.free_list.pop() {
            self.items[slot as usize] = Some(item);
            return Ok(slot);
        }
        let slot = u32::try_from(self.items.len())
            .ok()
            .filter(|&slot| slot < self.max_slots)
            .ok_or_else(|| self.overflow())?;
        self.items.push(Some(item));
        self.prev.push(None);
        self.next.push(None);
        self.generations.push(0);
        Ok(slot)
    }

    fn link_before(&mut self, slot: u32, successor: Option<u32>) {
        let predecessor = match successor {
            Some(next) => self.prev[next as usize],
            None => self.tail,
        };
        self.prev[slot as usize] = predecessor;
        self.next[slot as usize] = successor;
        match predecessor {
            Some(prev) => self.next[prev as usize] = Some(slot),
            None => self.head = Some(slot),
        }
        match successor {
            Some(next) => self.prev[next as usize] = Some(slot),
            None => self.tail = Some(slot),
        }
        self.count += 1;
    }

    fn unlink_slot(&mut self, slot: u32) -> Option<T> {
        let item = self.items[slot as usize].take()?;
        let predecessor = self.prev[slot as usize].take();
        let successor = self.next[slot as usize].take();
        match predecessor {
            Some(prev) => self.next[prev as usize] = successor,
            None => self.head = successor,
        }
        match successor {
            Some(next) => self.prev[next as usize] = predecessor,
            None => self.tail = predecessor,
        }
        self.generations[slot as usize] = self.generations[slot as usize].wrapping_add(1);
        self.free_list.push(slot);
        self.count -= 1;
        Some(item)
    }
}

impl<T> Default for DoublyLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator over list items
pub struct Iter<'a, T> {
    list: &'a DoublyLinkedList<T>,
    cursor: Option<u32>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        self.cursor = self.list.next[slot as usize];
        self.remaining = self.remaining.saturating_sub(1);
        self.list.item(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> Sequence<T> for DoublyLinkedList<T> {
    fn len(&self) -> usize {
        self.count
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.get_at(index)
    }

    fn first(&self) -> Option<&T> {
        DoublyLinkedList::first(self)
    }

    fn last(&self) -> Option<&T> {
        DoublyLinkedList::last(self)
    }

    fn position<P>(&self, pred: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        DoublyLinkedList::iter(self).position(pred)
    }

    fn push_item(&mut self, item: T) -> DomResult<()> {
        self.push(item).map(|_| ())
    }

    fn splice_items(
        &mut self,
        index: usize,
        delete_count: usize,
        items: Vec<T>,
        on_removed: &mut dyn FnMut(T, usize),
    ) -> DomResult<()> {
        for (offset, removed) in self.splice(index, delete_count, items)?.into_iter().enumerate() {
            on_removed(removed, offset);
        }
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> DomResult<T> {
        let len = self.count;
        self.slot_at(index)
            .and_then(|slot| self.unlink_slot(slot))
            .ok_or(DomError::SpliceOutOfBounds {
                index,
                delete_count: 1,
                len,
            })
    }

    fn drain_all(&mut self) -> Vec<T> {
        self.clear()
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
    {
        DoublyLinkedList::iter(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Tagged(u32);

    impl Identity for Tagged {
        fn same(&self, other: &Self) -> bool {
            self.0 == other.0
        }
    }

    fn list_of(values: &[u32]) -> DoublyLinkedList<u32> {
        let mut list = DoublyLinkedList::new();
        for &value in values {
            list.push(value).unwrap();
        }
        list
    }

    fn contents(list: &DoublyLinkedList<u32>) -> Vec<u32> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_push_preserves_order() {
        let list = list_of(&[1, 2, 3]);
        assert_eq!(contents(&list), vec![1, 2, 3]);
        assert_eq!(list.first(), Some(&1));
        assert_eq!(list.last(), Some(&3));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_get_at_from_both_ends() {
        let list = list_of(&[10, 11, 12, 13, 14, 15, 16]);
        for index in 0..7 {
            assert_eq!(list.get_at(index), Some(&(10 + index as u32)));
        }
        assert_eq!(list.get_at(7), None);
    }

    #[test]
    fn test_remove_item_by_identity() {
        let mut list = DoublyLinkedList::new();
        list.push(Tagged(1)).unwrap();
        list.push(Tagged(2)).unwrap();
        list.push(Tagged(3)).unwrap();

        assert_eq!(list.index_of(&Tagged(2)), Some(1));
        assert_eq!(list.remove_item(&Tagged(2)), Some(Tagged(2)));
        assert_eq!(list.index_of(&Tagged(3)), Some(1));
        assert_eq!(list.remove_item(&Tagged(9)), None);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_unlink_by_key_and_stale_key() {
        let mut list = DoublyLinkedList::new();
        let first = list.push(1u32).unwrap();
        let second = list.push(2u32).unwrap();

        assert_eq!(list.unlink(first), Some(1));
        assert_eq!(list.unlink(first), None);

        // The recycled slot must not answer to the old key
        let third = list.push(3u32).unwrap();
        assert_eq!(list.get(first), None);
        assert_eq!(list.get(third), Some(&3));
        assert_eq!(list.get(second), Some(&2));
        assert_eq!(contents(&list), vec![2, 3]);
    }

    #[test]
    fn test_splice_middle() {
        let mut list = list_of(&[0, 1, 2, 3, 4]);
        let removed = list.splice(1, 2, [7, 8, 9]).unwrap();
        assert_eq!(removed, vec![1, 2]);
        assert_eq!(contents(&list), vec![0, 7, 8, 9, 3, 4]);
    }

    #[test]
    fn test_splice_at_tail_appends() {
        let mut list = list_of(&[0, 1]);
        let removed = list.splice(2, 0, [2, 3]).unwrap();
        assert!(removed.is_empty());
        assert_eq!(contents(&list), vec![0, 1, 2, 3]);
        assert_eq!(list.last(), Some(&3));
    }

    #[test]
    fn test_splice_head_and_bounds() {
        let mut list = list_of(&[0, 1, 2]);
        assert_eq!(list.splice(0, 3, [5]).unwrap(), vec![0, 1, 2]);
        assert_eq!(contents(&list), vec![5]);
        assert!(list.splice(2, 0, [1]).is_err());
        assert!(list.splice(0, 2, []).is_err());
        assert_eq!(contents(&list), vec![5]);
    }

    #[test]
    fn test_sequence_remove_at() {
        let mut list = list_of(&[4, 5, 6]);
        assert_eq!(Sequence::remove_at(&mut list, 2).unwrap(), 6);
        assert!(Sequence::remove_at(&mut list, 2).is_err());
        assert_eq!(contents(&list), vec![4, 5]);
    }

    #[test]
    fn test_clear_returns_items() {
        let mut list = list_of(&[1, 2, 3]);
        list.unlink(list.key_at(0).unwrap());
        assert_eq!(list.clear(), vec![2, 3]);
        assert!(list.is_empty());
        assert_eq!(list.first(), None);
    }

    #[test]
    fn test_limit_rejects_growth() {
        let mut list: DoublyLinkedList<u32> = DoublyLinkedList::with_limit(2);
        list.push(1).unwrap();
        list.push(2).unwrap();

        assert_eq!(list.push(3), Err(DomError::CapacityOverflow { limit: 2 }));
        assert_eq!(
            list.splice(1, 0, [9]),
            Err(DomError::CapacityOverflow { limit: 2 })
        );
        assert_eq!(
            list.splice(0, 1, [7, 8]),
            Err(DomError::CapacityOverflow { limit: 2 })
        );
        assert_eq!(contents(&list), vec![1, 2]);
    }

    #[test]
    fn test_limit_reuses_freed_slots() {
        let mut list: DoublyLinkedList<u32> = DoublyLinkedList::with_limit(2);
        list.push(1).unwrap();
        list.push(2).unwrap();

        assert_eq!(list.splice(0, 1, [5]).unwrap(), vec![1]);
        assert_eq!(contents(&list), vec![5, 2]);
        list.unlink(list.key_at(1).unwrap());
        list.push(6).unwrap();
        assert_eq!(contents(&list), vec![5, 6]);
        assert_eq!(list.clear().len(), 2);
        assert_eq!(list.limit(), 2);
    }
}
