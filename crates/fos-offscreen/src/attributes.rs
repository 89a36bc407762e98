//! Element Attributes and Inline Style
//!
//! Both tables are kept as parallel sequences: names (interned, shared with
//! every other use of the name) alongside owned values. Every mutation touches all sequences of a
//! table together, so they always have the same length.

use crate::containers::GrowableArray;
use crate::{DomResult, Name};

/// Attribute table
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    names: GrowableArray<Name>,
    values: GrowableArray<String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get attribute value
    pub fn get(&self, name: &Name) -> Option<&str> {
        let index = self.names.index_of(name)?;
        self.values.get(index).map(String::as_str)
    }

    /// Set attribute, returning the value it replaced
    pub fn set(&mut self, name: Name, value: String) -> DomResult<Option<String>> {
        if let Some(index) = self.names.index_of(&name) {
            if let Some(slot) = self.values.get_mut(index) {
                return Ok(Some(std::mem::replace(slot, value)));
            }
        }
        self.names.ensure_capacity(1)?;
        self.values.ensure_capacity(1)?;
        self.names.push([name])?;
        self.values.push([value])?;
        Ok(None)
    }

    /// Remove attribute by name, returning its value
    pub fn remove(&mut self, name: &Name) -> DomResult<Option<String>> {
        let Some(index) = self.names.index_of(name) else {
            return Ok(None);
        };
        self.names.remove_at(index)?;
        self.values.remove_at(index).map(Some)
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.names.index_of(name).is_some()
    }

    /// Attribute names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.names.iter()
    }

    /// Iterate over (name, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&Name, &str)> {
        self.names
            .iter()
            .zip(self.values.iter().map(String::as_str))
    }
}

/// Inline style declarations
#[derive(Debug, Clone, Default)]
pub struct StyleDeclarations {
    properties: GrowableArray<Name>,
    values: GrowableArray<String>,
    important: GrowableArray<bool>,
}

impl StyleDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Value and importance of a property
    pub fn get(&self, property: &Name) -> Option<(&str, bool)> {
        let index = self.properties.index_of(property)?;
        let value = self.values.get(index)?;
        let important = self.important.get(index).copied().unwrap_or(false);
        Some((value.as_str(), important))
    }

    /// Set a declaration, returning the value it replaced
    pub fn set(&mut self, property: Name, value: String, important: bool) -> DomResult<Option<String>> {
        if let Some(index) = self.properties.index_of(&property) {
            if let (Some(value_slot), Some(flag)) =
                (self.values.get_mut(index), self.important.get_mut(index))
            {
                *flag = important;
                return Ok(Some(std::mem::replace(value_slot, value)));
            }
        }
        self.properties.ensure_capacity(1)?;
        self.values.ensure_capacity(1)?;
        self.important.ensure_capacity(1)?;
        self.properties.push([property])?;
        self.values.push([value])?;
        self.important.push([important])?;
        Ok(None)
    }

    /// Remove a declaration, returning its value
    pub fn remove(&mut self, property: &Name) -> DomResult<Option<String>> {
        let Some(index) = self.properties.index_of(property) else {
            return Ok(None);
        };
        self.properties.remove_at(index)?;
        self.important.remove_at(index)?;
        self.values.remove_at(index).map(Some)
    }

    /// Property names in declaration order
    pub fn properties(&self) -> impl Iterator<Item = &Name> {
        self.properties.iter()
    }

    /// Iterate over (property, value, important) triples
    pub fn iter(&self) -> impl Iterator<Item = (&Name, &str, bool)> {
        self.properties
            .iter()
            .zip(self.values.iter())
            .zip(self.important.iter())
            .map(|((property, value), important)| (property, value.as_str(), *important))
    }
}
