//! Element - reference-counted tree node
//!
//! Every element lives in a counted block ([`Strong`]). Ownership edges:
//!
//! - host handles and parent→child links are strong
//! - the child→parent link is weak
//!
//! so a parent and child never keep each other alive. When the last strong
//! reference goes away the element is finalized: surviving children lose
//! their parent link and the element's own strong references to them are
//! released, which cascades down the subtree.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::attributes::{Attributes, StyleDeclarations};
use crate::containers::{Identity, Sequence};
use crate::refcount::{Strong, WeakRef};
use crate::{DomResult, Name};

#[cfg(not(feature = "linked-children"))]
pub(crate) type ChildStore = crate::containers::GrowableArray<Element>;
#[cfg(feature = "linked-children")]
pub(crate) type ChildStore = crate::containers::DoublyLinkedList<Element>;

/// Process-wide id source. Ids start at 1 and are never reused.
static NEXT_ELEMENT_ID: AtomicU32 = AtomicU32::new(1);

/// Element payload stored in the counted block
pub struct ElementData {
    pub(crate) id: u32,
    pub(crate) tag: Name,
    pub(crate) parent: Option<WeakRef<ElementData>>,
    pub(crate) children: ChildStore,
    pub(crate) attributes: Attributes,
    pub(crate) style: StyleDeclarations,
    pub(crate) text: Option<String>,
}

/// Owning handle to an element
///
/// Cloning takes another strong reference; dropping releases one.
/// Equality is identity: two handles are equal when they refer to the same
/// element.
#[derive(Clone)]
pub struct Element(pub(crate) Strong<ElementData>);

/// Non-owning handle to an element
#[derive(Clone)]
pub struct WeakElement(WeakRef<ElementData>);

impl Element {
    /// Create a detached element. An empty tag creates a fragment.
    pub fn create(tag: &str) -> Self {
        Self::with_tag(Name::new(tag))
    }

    /// Create a detached element from an interned tag name
    pub fn with_tag(tag: Name) -> Self {
        let id = NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(id, tag = tag.as_str(), "element created");
        let data = ElementData {
            id,
            tag,
            parent: None,
            children: ChildStore::default(),
            attributes: Attributes::new(),
            style: StyleDeclarations::new(),
            text: None,
        };
        Self(Strong::create(data, finalize_element))
    }

    pub(crate) fn data(&self) -> Ref<'_, ElementData> {
        self.0.borrow()
    }

    pub(crate) fn data_mut(&self) -> RefMut<'_, ElementData> {
        self.0.borrow_mut()
    }

    /// Unique id, assigned at creation
    pub fn id(&self) -> u32 {
        self.data().id
    }

    pub fn tag_name(&self) -> Name {
        self.data().tag.clone()
    }

    /// Fragments render only their content
    pub fn is_fragment(&self) -> bool {
        self.data().tag.is_empty()
    }

    /// Same element?
    pub fn ptr_eq(&self, other: &Element) -> bool {
        self.0.ptr_eq(&other.0)
    }

    /// Strong references: host handles plus the parent link, if attached
    pub fn strong_count(&self) -> u32 {
        self.0.strong_count()
    }

    /// Weak references, including the implicit one of every strong reference
    pub fn weak_count(&self) -> u32 {
        self.0.weak_count()
    }

    pub fn downgrade(&self) -> WeakElement {
        WeakElement(self.0.downgrade())
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Set an attribute; an existing value is replaced in place
    pub fn set_attribute(&self, name: &str, value: impl Into<String>) -> DomResult<()> {
        let name = Name::new(name);
        self.data_mut().attributes.set(name, value.into())?;
        Ok(())
    }

    /// Remove an attribute, returning its value
    pub fn remove_attribute(&self, name: &str) -> DomResult<Option<String>> {
        let Some(name) = Name::lookup(name) else {
            return Ok(None);
        };
        self.data_mut().attributes.remove(&name)
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let name = Name::lookup(name)?;
        self.data().attributes.get(&name).map(str::to_owned)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        Name::lookup(name).is_some_and(|name| self.data().attributes.contains(&name))
    }

    /// Attribute names in insertion order
    pub fn get_attribute_names(&self) -> Vec<Name> {
        self.data().attributes.names().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Inline style
    // ------------------------------------------------------------------

    pub fn set_style_property(
        &self,
        property: &str,
        value: impl Into<String>,
        important: bool,
    ) -> DomResult<()> {
        let property = Name::new(property);
        self.data_mut().style.set(property, value.into(), important)?;
        Ok(())
    }

    /// Remove a style declaration, returning its value
    pub fn remove_style_property(&self, property: &str) -> DomResult<Option<String>> {
        let Some(property) = Name::lookup(property) else {
            return Ok(None);
        };
        self.data_mut().style.remove(&property)
    }

    /// Value and importance of a style declaration
    pub fn get_style_property(&self, property: &str) -> Option<(String, bool)> {
        let property = Name::lookup(property)?;
        self.data()
            .style
            .get(&property)
            .map(|(value, important)| (value.to_owned(), important))
    }

    pub fn style_property_names(&self) -> Vec<Name> {
        self.data().style.properties().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Text content
    // ------------------------------------------------------------------

    /// Replace the content with literal text.
    ///
    /// Every current child is detached and released; text and children are
    /// mutually exclusive.
    pub fn set_text_content(&self, text: impl Into<String>) {
        let released = {
            let mut data = self.data_mut();
            data.text = Some(text.into());
            Sequence::drain_all(&mut data.children)
        };
        for child in &released {
            child.clear_parent_link();
        }
        if !released.is_empty() {
            tracing::trace!(id = self.id(), released = released.len(), "children replaced by text");
        }
    }

    pub fn text_content(&self) -> Option<String> {
        self.data().text.clone()
    }

    // ------------------------------------------------------------------
    // Parent link
    // ------------------------------------------------------------------

    /// Is `parent` the element this one links back to?
    pub(crate) fn parent_is(&self, parent: &Element) -> bool {
        self.data()
            .parent
            .as_ref()
            .is_some_and(|link| link.points_to(&parent.0))
    }

    pub(crate) fn set_parent_link(&self, parent: &Element) {
        let link = parent.0.downgrade();
        self.data_mut().parent = Some(link);
    }

    pub(crate) fn clear_parent_link(&self) {
        let stale = self.data_mut().parent.take();
        drop(stale);
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Element {}

impl Identity for Element {
    fn same(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Some(data) => f
                .debug_struct("Element")
                .field("id", &data.id)
                .field("tag", &data.tag)
                .field("children", &data.children.len())
                .finish(),
            None => f.debug_struct("Element").finish_non_exhaustive(),
        }
    }
}

impl WeakElement {
    /// Owning handle, unless the element has been finalized
    pub fn upgrade(&self) -> Option<Element> {
        self.0.upgrade().map(Element)
    }

    /// Has the element been finalized?
    pub fn is_finalized(&self) -> bool {
        self.0.is_finalized()
    }

    pub fn strong_count(&self) -> u32 {
        self.0.strong_count()
    }
}

impl fmt::Debug for WeakElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakElement")
            .field("finalized", &self.is_finalized())
            .finish()
    }
}

thread_local! {
    /// Child references waiting to be released by the outermost finalizer
    static RELEASE_QUEUE: RefCell<Vec<Element>> = const { RefCell::new(Vec::new()) };
    static RELEASING: Cell<bool> = const { Cell::new(false) };
}

/// Clears `RELEASING` even if a release panics
struct ReleaseGuard;

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        let _ = RELEASING.try_with(|flag| flag.set(false));
    }
}

/// Runs once, when the last strong reference to an element is released.
///
/// Child references are queued instead of dropped here, and only the
/// outermost finalizer on the thread drains the queue, so releasing a deep
/// subtree never nests finalizers.
fn finalize_element(mut data: ElementData) {
    tracing::trace!(id = data.id, tag = data.tag.as_str(), "element finalized");
    data.parent = None;
    let mut children = Sequence::drain_all(&mut data.children);
    for child in &children {
        // A child still held elsewhere must not keep pointing at us
        if let Some(mut child_data) = child.0.try_borrow_mut() {
            child_data.parent = None;
        }
    }

    let queued = RELEASE_QUEUE
        .try_with(|queue| queue.borrow_mut().append(&mut children))
        .is_ok();
    if !queued {
        // Thread teardown: no queue left, release in place
        drop(children);
        return;
    }
    if RELEASING.with(|flag| flag.replace(true)) {
        return;
    }

    let _guard = ReleaseGuard;
    while let Some(next) = RELEASE_QUEUE.with(|queue| queue.borrow_mut().pop()) {
        drop(next);
    }
}
