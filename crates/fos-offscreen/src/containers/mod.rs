//! Backing stores for element child lists and attribute tables
//!
//! Both stores hold their items by value and never look inside them: an
//! element stored here is kept alive by the strong reference the slot owns,
//! not by the container.

pub mod array;
pub mod linked_list;

pub use array::GrowableArray;
pub use linked_list::{DoublyLinkedList, NodeKey};

use crate::DomResult;

/// Identity comparison for items that are handles to something else.
///
/// Container lookups compare handles, never the values behind them.
pub trait Identity {
    fn same(&self, other: &Self) -> bool;
}

/// Ordered sequence operations shared by both backing stores.
pub trait Sequence<T> {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item at `index` in sequence order
    fn get(&self, index: usize) -> Option<&T>;

    fn first(&self) -> Option<&T>;

    fn last(&self) -> Option<&T>;

    /// Index of the first item matching `pred`
    fn position<P>(&self, pred: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool;

    /// Index of `item` by identity
    fn index_of(&self, item: &T) -> Option<usize>
    where
        T: Identity,
    {
        self.position(|candidate| candidate.same(item))
    }

    fn push_item(&mut self, item: T) -> DomResult<()>;

    /// Replace `delete_count` items starting at `index` with `items`.
    ///
    /// `on_removed` receives each removed item with its offset from `index`.
    fn splice_items(
        &mut self,
        index: usize,
        delete_count: usize,
        items: Vec<T>,
        on_removed: &mut dyn FnMut(T, usize),
    ) -> DomResult<()>;

    /// Remove the item at `index`, closing the gap
    fn remove_at(&mut self, index: usize) -> DomResult<T>;

    /// Remove every item, in order
    fn drain_all(&mut self) -> Vec<T>;

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a;
}

/// Bounds check shared by every splice implementation
pub(crate) fn check_splice(index: usize, delete_count: usize, len: usize) -> DomResult<()> {
    if index > len || delete_count > len - index {
        return Err(crate::DomError::SpliceOutOfBounds {
            index,
            delete_count,
            len,
        });
    }
    Ok(())
}
