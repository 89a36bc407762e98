//! Host bridge - handle-based element API
//!
//! A host runtime never holds [`Element`]s directly. It holds
//! [`ElementHandle`]s, and every handle the bridge returns carries one host
//! reference: a strong reference kept in the bridge's handle table. The host
//! releases each with [`HostBridge::dec_ref`]. Once all of a handle's host
//! references are released the handle is unknown to the bridge, even if the
//! element itself lives on as some parent's child.

use std::collections::HashMap;
use std::fmt;

use crate::config::BridgeConfig;
use crate::{DomError, DomResult, Element};

/// Opaque element handle; the element's unique id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(pub u32);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle table plus the element API expressed over handles
#[derive(Default)]
pub struct HostBridge {
    config: BridgeConfig,
    /// One strong reference per outstanding host reference
    entries: HashMap<ElementHandle, Vec<Element>>,
}

impl HostBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Handle lifecycle
    // ------------------------------------------------------------------

    /// Create a detached element; the handle carries one host reference
    pub fn create(&mut self, tag: &str) -> ElementHandle {
        self.issue(Element::create(tag))
    }

    /// Take another host reference, returning the handle's host count.
    ///
    /// The result counts host references only. The element's strong count
    /// ([`Element::strong_count`]) is higher by one while it is attached,
    /// since the parent's link to it is strong as well.
    pub fn inc_ref(&mut self, handle: ElementHandle) -> DomResult<u32> {
        let element = self.element(handle)?.clone();
        self.issue(element);
        Ok(self.host_refs(handle))
    }

    /// Release one host reference, returning the handle's remaining count.
    ///
    /// Releasing the last reference to a detached element finalizes it.
    pub fn dec_ref(&mut self, handle: ElementHandle) -> DomResult<u32> {
        let refs = self
            .entries
            .get_mut(&handle)
            .ok_or(DomError::UnknownHandle(handle.0))?;
        let released = refs.pop();
        let remaining = refs.len() as u32;
        if remaining == 0 {
            self.entries.remove(&handle);
        }
        tracing::debug!(%handle, remaining, "host reference released");
        drop(released);
        Ok(remaining)
    }

    /// Element behind a live handle
    pub fn element(&self, handle: ElementHandle) -> DomResult<&Element> {
        self.entries
            .get(&handle)
            .and_then(|refs| refs.first())
            .ok_or(DomError::UnknownHandle(handle.0))
    }

    /// Outstanding host references for `handle`; zero when unknown
    pub fn host_refs(&self, handle: ElementHandle) -> u32 {
        self.entries.get(&handle).map_or(0, |refs| refs.len() as u32)
    }

    /// Number of distinct handles with at least one host reference
    pub fn live_handles(&self) -> usize {
        self.entries.len()
    }

    fn issue(&mut self, element: Element) -> ElementHandle {
        let handle = ElementHandle(element.id());
        let refs = self.entries.entry(handle).or_default();
        refs.push(element);
        tracing::debug!(%handle, refs = refs.len(), "host reference issued");
        handle
    }

    fn issue_optional(&mut self, element: Option<Element>) -> Option<ElementHandle> {
        element.map(|element| self.issue(element))
    }

    fn resolve_all(&self, handles: &[ElementHandle]) -> DomResult<Vec<Element>> {
        handles
            .iter()
            .map(|&handle| self.element(handle).cloned())
            .collect()
    }

    // ------------------------------------------------------------------
    // Tree mutation
    // ------------------------------------------------------------------

    pub fn append(&self, parent: ElementHandle, children: &[ElementHandle]) -> DomResult<()> {
        let children = self.resolve_all(children)?;
        self.element(parent)?.append(&children)
    }

    pub fn insert_before(
        &self,
        parent: ElementHandle,
        new_child: ElementHandle,
        ref_child: Option<ElementHandle>,
    ) -> DomResult<()> {
        let reference = ref_child.map(|handle| self.element(handle)).transpose()?;
        self.element(parent)?
            .insert_before(self.element(new_child)?, reference)
    }

    pub fn replace_with(&self, old: ElementHandle, replacements: &[ElementHandle]) -> DomResult<()> {
        let replacements = self.resolve_all(replacements)?;
        self.element(old)?.replace_with(&replacements)
    }

    pub fn remove_child(&self, parent: ElementHandle, child: ElementHandle) -> DomResult<()> {
        let held = self.element(parent)?.remove_child(self.element(child)?)?;
        drop(held);
        Ok(())
    }

    pub fn remove(&self, handle: ElementHandle) -> DomResult<()> {
        self.element(handle)?.remove()
    }

    // ------------------------------------------------------------------
    // Navigation (each returned handle carries a host reference)
    // ------------------------------------------------------------------

    pub fn get_parent(&mut self, handle: ElementHandle) -> DomResult<Option<ElementHandle>> {
        let parent = self.element(handle)?.parent_element();
        Ok(self.issue_optional(parent))
    }

    pub fn get_first_child(&mut self, handle: ElementHandle) -> DomResult<Option<ElementHandle>> {
        let child = self.element(handle)?.first_element_child();
        Ok(self.issue_optional(child))
    }

    pub fn get_last_child(&mut self, handle: ElementHandle) -> DomResult<Option<ElementHandle>> {
        let child = self.element(handle)?.last_element_child();
        Ok(self.issue_optional(child))
    }

    pub fn get_next_sibling(&mut self, handle: ElementHandle) -> DomResult<Option<ElementHandle>> {
        let sibling = self.element(handle)?.next_element_sibling();
        Ok(self.issue_optional(sibling))
    }

    pub fn get_children(&mut self, handle: ElementHandle) -> DomResult<Vec<ElementHandle>> {
        let children = self.element(handle)?.children();
        Ok(children.into_iter().map(|child| self.issue(child)).collect())
    }

    // ------------------------------------------------------------------
    // Attributes, style, content
    // ------------------------------------------------------------------

    pub fn unique_id(&self, handle: ElementHandle) -> DomResult<u32> {
        Ok(self.element(handle)?.id())
    }

    pub fn set_attribute(&self, handle: ElementHandle, name: &str, value: &str) -> DomResult<()> {
        self.element(handle)?.set_attribute(name, value)
    }

    pub fn remove_attribute(&self, handle: ElementHandle, name: &str) -> DomResult<Option<String>> {
        self.element(handle)?.remove_attribute(name)
    }

    pub fn get_attribute(&self, handle: ElementHandle, name: &str) -> DomResult<Option<String>> {
        Ok(self.element(handle)?.get_attribute(name))
    }

    pub fn get_attribute_names(&self, handle: ElementHandle) -> DomResult<Vec<String>> {
        let names = self.element(handle)?.get_attribute_names();
        Ok(names.iter().map(|name| name.as_str().to_owned()).collect())
    }

    pub fn set_style_property(
        &self,
        handle: ElementHandle,
        property: &str,
        value: &str,
        important: bool,
    ) -> DomResult<()> {
        self.element(handle)?
            .set_style_property(property, value, important)
    }

    pub fn remove_style_property(
        &self,
        handle: ElementHandle,
        property: &str,
    ) -> DomResult<Option<String>> {
        self.element(handle)?.remove_style_property(property)
    }

    pub fn set_text_content(&self, handle: ElementHandle, text: &str) -> DomResult<()> {
        self.element(handle)?.set_text_content(text);
        Ok(())
    }

    /// Bounded render into a host buffer; returns bytes written
    pub fn get_serialized_html(&self, handle: ElementHandle, buffer: &mut [u8]) -> DomResult<usize> {
        Ok(self.element(handle)?.get_serialized_html(buffer))
    }

    /// Full render, growing the buffer as configured
    pub fn outer_html(&self, handle: ElementHandle) -> DomResult<String> {
        self.element(handle)?.outer_html(&self.config.serializer)
    }
}

impl fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBridge")
            .field("live_handles", &self.entries.len())
            .finish()
    }
}
