//! Tree Mutation Engine
//!
//! append, insertBefore, replaceWith, removeChild, remove, plus navigation.
//!
//! Adoption is a move: an element that already has a parent is detached
//! first, and the strong reference its old parent held is handed to the new
//! parent. Every precondition is checked before the tree is touched, so a
//! failed call changes nothing.

use crate::containers::Sequence;
use crate::{DomError, DomResult, Element};

impl Element {
    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Parent element, if attached.
    ///
    /// A link to a parent that has since been finalized is cleared here.
    pub fn parent_element(&self) -> Option<Element> {
        let link = self.data().parent.as_ref().map(|parent| parent.upgrade());
        match link {
            None => None,
            Some(Some(parent)) => Some(Element(parent)),
            Some(None) => {
                tracing::trace!(id = self.id(), "cleared stale parent link");
                self.clear_parent_link();
                None
            }
        }
    }

    pub fn first_element_child(&self) -> Option<Element> {
        self.data().children.first().cloned()
    }

    pub fn last_element_child(&self) -> Option<Element> {
        self.data().children.last().cloned()
    }

    pub fn next_element_sibling(&self) -> Option<Element> {
        let parent = self.parent_element()?;
        let data = parent.data();
        let index = data.children.index_of(self)?;
        Sequence::get(&data.children, index + 1).cloned()
    }

    pub fn previous_element_sibling(&self) -> Option<Element> {
        let parent = self.parent_element()?;
        let data = parent.data();
        let index = data.children.index_of(self)?;
        let previous = index.checked_sub(1)?;
        Sequence::get(&data.children, previous).cloned()
    }

    /// Snapshot of the child list
    pub fn children(&self) -> Vec<Element> {
        self.data().children.iter().cloned().collect()
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    /// Is `other` this element or one of its descendants?
    pub fn contains(&self, other: &Element) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(node) = cursor {
            if node.ptr_eq(self) {
                return true;
            }
            cursor = node.parent_element();
        }
        false
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Append `children` in order, moving each out of its current parent.
    ///
    /// Appending any child clears this element's text content.
    pub fn append(&self, children: &[Element]) -> DomResult<()> {
        for child in children {
            self.ensure_can_adopt(child)?;
        }
        if children.is_empty() {
            return Ok(());
        }

        self.data_mut().text = None;
        for child in children {
            let held = child.take_for_adoption()?;
            self.data_mut().children.push_item(held)?;
            child.set_parent_link(self);
        }
        tracing::trace!(parent = self.id(), count = children.len(), "appended children");
        Ok(())
    }

    /// Insert `new_child` before `ref_child`, or at the end when `ref_child`
    /// is `None`.
    pub fn insert_before(&self, new_child: &Element, ref_child: Option<&Element>) -> DomResult<()> {
        self.ensure_can_adopt(new_child)?;
        if let Some(reference) = ref_child {
            if !reference.parent_is(self) {
                return Err(DomError::NotAChild);
            }
            if reference.ptr_eq(new_child) {
                // Already in place
                return Ok(());
            }
        }

        let held = new_child.take_for_adoption()?;
        {
            let mut data = self.data_mut();
            data.text = None;
            let index = match ref_child {
                Some(reference) => data.children.index_of(reference).ok_or(DomError::NotAChild)?,
                None => data.children.len(),
            };
            data.children
                .splice_items(index, 0, vec![held], &mut |_: Element, _: usize| {})?;
        }
        new_child.set_parent_link(self);
        tracing::trace!(parent = self.id(), child = new_child.id(), "inserted child");
        Ok(())
    }

    /// Replace this element, in its parent, with `replacements`.
    ///
    /// Each replacement is moved out of its current parent first. When an
    /// element is listed more than once, its last occurrence decides its
    /// position.
    pub fn replace_with(&self, replacements: &[Element]) -> DomResult<()> {
        let parent = self.parent_element().ok_or(DomError::Detached)?;
        for replacement in replacements {
            if replacement.ptr_eq(self) {
                return Err(DomError::HierarchyRequest);
            }
            parent.ensure_can_adopt(replacement)?;
        }

        let unique: Vec<&Element> = replacements
            .iter()
            .enumerate()
            .filter(|(position, element)| {
                !replacements[position + 1..]
                    .iter()
                    .any(|later| later.ptr_eq(element))
            })
            .map(|(_, element)| element)
            .collect();

        let mut adopted = Vec::with_capacity(unique.len());
        for replacement in &unique {
            adopted.push(replacement.take_for_adoption()?);
        }

        let mut released = Vec::with_capacity(1);
        {
            let mut data = parent.data_mut();
            let index = data.children.index_of(self).ok_or(DomError::NotAChild)?;
            data.children
                .splice_items(index, 1, adopted, &mut |old: Element, _: usize| {
                    released.push(old)
                })?;
        }
        for replacement in &unique {
            replacement.set_parent_link(&parent);
        }
        self.clear_parent_link();
        tracing::trace!(
            parent = parent.id(),
            old = self.id(),
            count = unique.len(),
            "replaced child"
        );
        drop(released);
        Ok(())
    }

    /// Detach `child` from this element.
    ///
    /// Returns the reference this element held; dropping it releases the
    /// parent's ownership.
    pub fn remove_child(&self, child: &Element) -> DomResult<Element> {
        if !child.parent_is(self) {
            return Err(DomError::NotAChild);
        }
        let held = child.take_from_parent()?.ok_or(DomError::NotAChild)?;
        tracing::trace!(parent = self.id(), child = child.id(), "removed child");
        Ok(held)
    }

    /// Detach this element from its parent
    pub fn remove(&self) -> DomResult<()> {
        let parent = self.parent_element().ok_or(DomError::Detached)?;
        parent.remove_child(self).map(drop)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Adopting `child` must not make an element its own ancestor
    fn ensure_can_adopt(&self, child: &Element) -> DomResult<()> {
        if child.contains(self) {
            return Err(DomError::HierarchyRequest);
        }
        Ok(())
    }

    /// Detach from the current parent, returning the strong reference the
    /// parent held. `None` when already detached.
    fn take_from_parent(&self) -> DomResult<Option<Element>> {
        let Some(parent) = self.parent_element() else {
            return Ok(None);
        };
        let held = {
            let mut data = parent.data_mut();
            let index = data.children.index_of(self).ok_or(DomError::NotAChild)?;
            Sequence::remove_at(&mut data.children, index)?
        };
        self.clear_parent_link();
        Ok(Some(held))
    }

    /// Strong reference for a new parent: the old parent's, or a fresh one
    fn take_for_adoption(&self) -> DomResult<Element> {
        Ok(match self.take_from_parent()? {
            Some(held) => held,
            None => self.clone(),
        })
    }
}
