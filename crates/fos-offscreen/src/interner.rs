//! Name interner - tag, attribute and style property names
//!
//! Each distinct name is stored once per thread and shared by every element
//! using it. Two [`Name`]s are equal exactly when they share the same
//! interned string, which makes name lookups identity comparisons.
//!
//! The table holds one reference to each name. Names no element refers to
//! any more are purged whenever the table has doubled since the last purge,
//! so hosts that invent many unique names do not grow it without bound.
//!
//! A `Name` cannot leave the thread that interned it.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::containers::Identity;

/// Table size below which no purge happens
const MIN_PURGE_THRESHOLD: usize = 256;

/// Interned name
#[derive(Clone)]
pub struct Name(Rc<str>);

struct NameTable {
    names: HashSet<Rc<str>>,
    /// Pre-interned names, kept alive for the life of the thread
    pinned: Vec<Rc<str>>,
    purge_at: usize,
}

thread_local! {
    static NAMES: RefCell<NameTable> = RefCell::new(NameTable::new());
}

impl NameTable {
    fn new() -> Self {
        let mut table = Self {
            names: HashSet::with_capacity(64),
            pinned: Vec::new(),
            purge_at: MIN_PURGE_THRESHOLD,
        };

        // Empty tag names mark fragment elements
        const COMMON_NAMES: &[&str] = &[
            "", "div", "span", "p", "a", "img", "ul", "li", "button", "input",
            "id", "class", "style", "href", "src", "name", "value",
        ];
        for name in COMMON_NAMES {
            let interned = table.intern(name);
            table.pinned.push(interned);
        }

        table
    }

    fn intern(&mut self, text: &str) -> Rc<str> {
        if let Some(existing) = self.names.get(text) {
            return Rc::clone(existing);
        }
        if self.names.len() >= self.purge_at {
            self.purge();
        }
        let name: Rc<str> = Rc::from(text);
        self.names.insert(Rc::clone(&name));
        name
    }

    fn lookup(&self, text: &str) -> Option<Rc<str>> {
        self.names.get(text).map(Rc::clone)
    }

    /// Drop every name only the table still refers to
    fn purge(&mut self) {
        let before = self.names.len();
        self.names.retain(|name| Rc::strong_count(name) > 1);
        self.purge_at = (self.names.len() * 2).max(MIN_PURGE_THRESHOLD);
        tracing::trace!(before, after = self.names.len(), "purged unused names");
    }
}

impl Name {
    /// Intern `text`, returning the existing name when already present
    pub fn new(text: &str) -> Self {
        Self(NAMES.with(|table| table.borrow_mut().intern(text)))
    }

    /// Look a name up without interning it.
    ///
    /// A name that is not interned cannot be stored on any element, so
    /// queries use this instead of growing the table.
    pub fn lookup(text: &str) -> Option<Self> {
        NAMES.with(|table| table.borrow().lookup(text)).map(Self)
    }

    /// Names currently held by this thread's table
    pub fn interned_count() -> usize {
        NAMES.with(|table| table.borrow().names.len())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0).cast::<u8>(), state);
    }
}

impl Identity for Name {
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
