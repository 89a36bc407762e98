//! Growable array
//!
//! Contiguous, dense, order preserving. Capacity grows to the next power of
//! two so repeated pushes stay amortized O(1).

use super::{check_splice, Identity, Sequence};
use crate::{DomError, DomResult};

/// Contiguous resizable sequence
#[derive(Debug, Clone)]
pub struct GrowableArray<T> {
    items: Vec<T>,
}

impl<T> GrowableArray<T> {
    /// Create an empty array (no allocation until the first push)
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of slots currently allocated
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Index of `item` by identity (first match)
    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: Identity,
    {
        self.items.iter().position(|candidate| candidate.same(item))
    }

    /// Make room for `additional` more items.
    ///
    /// Capacity becomes the next power of two at or above `len + additional`.
    pub fn ensure_capacity(&mut self, additional: usize) -> DomResult<()> {
        let required = self.items.len().saturating_add(additional);
        if required <= self.items.capacity() {
            return Ok(());
        }
        let target = required.checked_next_power_of_two().unwrap_or(required);
        self.items.try_reserve_exact(target - self.items.len())?;
        Ok(())
    }

    /// Append items in order, skipping `None` entries.
    pub fn push<I>(&mut self, items: I) -> DomResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Option<T>>,
    {
        let present: Vec<T> = items.into_iter().filter_map(Into::into).collect();
        self.ensure_capacity(present.len())?;
        self.items.extend(present);
        Ok(())
    }

    /// Replace `[index, index + delete_count)` with `insert`.
    ///
    /// `on_removed` takes ownership of every removed item together with its
    /// offset from `index`. Out-of-range arguments leave the array untouched.
    pub fn splice<I, F>(
        &mut self,
        index: usize,
        delete_count: usize,
        insert: I,
        mut on_removed: F,
    ) -> DomResult<()>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T, usize),
    {
        check_splice(index, delete_count, self.items.len())?;
        let insert: Vec<T> = insert.into_iter().collect();
        if insert.len() > delete_count {
            self.ensure_capacity(insert.len() - delete_count)?;
        }
        for (offset, removed) in self
            .items
            .splice(index..index + delete_count, insert)
            .enumerate()
        {
            on_removed(removed, offset);
        }
        Ok(())
    }

    /// Remove the item at `index`, shifting the tail down
    pub fn remove_at(&mut self, index: usize) -> DomResult<T> {
        if index >= self.items.len() {
            return Err(DomError::SpliceOutOfBounds {
                index,
                delete_count: 1,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Take every item out, releasing the backing storage
    pub fn drain_all(&mut self) -> Vec<T> {
        std::mem::take(&mut self.items)
    }

    /// Drop every item, keeping the allocation
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Consume the array, handing its items back to the caller
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for GrowableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sequence<T> for GrowableArray<T> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    fn first(&self) -> Option<&T> {
        self.items.first()
    }

    fn last(&self) -> Option<&T> {
        self.items.last()
    }

    fn position<P>(&self, pred: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().position(pred)
    }

    fn push_item(&mut self, item: T) -> DomResult<()> {
        self.push([item])
    }

    fn splice_items(
        &mut self,
        index: usize,
        delete_count: usize,
        items: Vec<T>,
        on_removed: &mut dyn FnMut(T, usize),
    ) -> DomResult<()> {
        self.splice(index, delete_count, items, on_removed)
    }

    fn remove_at(&mut self, index: usize) -> DomResult<T> {
        GrowableArray::remove_at(self, index)
    }

    fn drain_all(&mut self) -> Vec<T> {
        GrowableArray::drain_all(self)
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
    {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Tagged(u32);

    impl Identity for Tagged {
        fn same(&self, other: &Self) -> bool {
            self.0 == other.0
        }
    }

    fn array_of(values: &[u32]) -> GrowableArray<u32> {
        let mut array: GrowableArray<u32> = GrowableArray::new();
        array.push(values.iter().copied()).unwrap();
        array
    }

    #[test]
    fn test_capacity_grows_to_power_of_two() {
        let mut array: GrowableArray<u32> = GrowableArray::new();
        array.ensure_capacity(5).unwrap();
        assert!(array.capacity() >= 8);

        array.push([1u32, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        assert!(array.capacity() >= 16);
        assert!(array.capacity() >= array.len());
    }

    #[test]
    fn test_push_skips_none() {
        let mut array: GrowableArray<u32> = GrowableArray::new();
        array.push([Some(1u32), None, Some(3u32)]).unwrap();
        assert_eq!(array.as_slice(), &[1, 3]);
    }

    #[test]
    fn test_index_of_first_match() {
        let mut array: GrowableArray<Tagged> = GrowableArray::new();
        array.push([Tagged(4), Tagged(7), Tagged(4)]).unwrap();
        assert_eq!(array.index_of(&Tagged(4)), Some(0));
        assert_eq!(array.index_of(&Tagged(7)), Some(1));
        assert_eq!(array.index_of(&Tagged(9)), None);
    }

    #[test]
    fn test_splice_replaces_run() {
        let mut array = array_of(&[0, 1, 2, 3, 4]);
        let mut removed = Vec::new();
        array
            .splice(1, 2, [10, 11, 12], |item, offset| removed.push((item, offset)))
            .unwrap();

        assert_eq!(array.as_slice(), &[0, 10, 11, 12, 3, 4]);
        assert_eq!(removed, vec![(1, 0), (2, 1)]);
    }

    #[test]
    fn test_splice_insert_at_end() {
        let mut array = array_of(&[0, 1]);
        array.splice(2, 0, [2], |_, _| {}).unwrap();
        assert_eq!(array.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_splice_out_of_bounds_leaves_array() {
        let mut array = array_of(&[0, 1, 2]);

        let err = array.splice(4, 0, [9], |_, _| {}).unwrap_err();
        assert_eq!(
            err,
            DomError::SpliceOutOfBounds { index: 4, delete_count: 0, len: 3 }
        );

        assert!(array.splice(2, 2, [], |_, _| {}).is_err());
        assert_eq!(array.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_remove_at_compacts() {
        let mut array = array_of(&[5, 6, 7]);
        assert_eq!(array.remove_at(1).unwrap(), 6);
        assert_eq!(array.as_slice(), &[5, 7]);
        assert!(array.remove_at(2).is_err());
    }

    #[test]
    fn test_drain_all_releases_storage() {
        let mut array = array_of(&[1, 2, 3]);
        assert_eq!(array.drain_all(), vec![1, 2, 3]);
        assert!(array.is_empty());
        assert_eq!(array.capacity(), 0);
    }
}
