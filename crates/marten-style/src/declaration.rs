//! The Declaration Store.
//!
//! A [`StyleMap`] holds at most one [`Declaration`] per property. Keys are
//! kept sorted so that two resolutions of the same input compare and
//! serialize identically.

use std::collections::BTreeMap;

use serde::Serialize;

pub use marten_css::Declaration;

/// Property name to declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StyleMap {
    declarations: BTreeMap<String, Declaration>,
}

impl StyleMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The declaration for `property`, if any.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&Declaration> {
        self.declarations.get(property)
    }

    /// The value for `property`, if any.
    #[must_use]
    pub fn value(&self, property: &str) -> Option<&str> {
        self.get(property).map(|d| d.value.as_str())
    }

    /// The value for `property`, or `""` when absent.
    #[must_use]
    pub fn css(&self, property: &str) -> &str {
        self.value(property).unwrap_or_default()
    }

    /// Returns `true` if `property` is declared.
    #[must_use]
    pub fn contains(&self, property: &str) -> bool {
        self.declarations.contains_key(property)
    }

    /// Store `declaration`, replacing any previous one for the same property.
    pub fn insert(&mut self, declaration: Declaration) {
        let _ = self
            .declarations
            .insert(declaration.property.clone(), declaration);
    }

    /// Set `property` to `value` as a normal (not important) declaration.
    pub fn set_css(&mut self, property: &str, value: &str) {
        self.insert(Declaration::new(property, value, false));
    }

    /// Remove the declaration for `property`.
    pub fn remove(&mut self, property: &str) -> Option<Declaration> {
        self.declarations.remove(property)
    }

    /// Number of declared properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Returns `true` if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Declarations ordered by property name.
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values()
    }
}

impl FromIterator<Declaration> for StyleMap {
    /// Later declarations for a property replace earlier ones.
    fn from_iter<I: IntoIterator<Item = Declaration>>(iter: I) -> Self {
        let mut map = Self::new();
        for declaration in iter {
            map.insert(declaration);
        }
        map
    }
}

impl<'a> IntoIterator for &'a StyleMap {
    type Item = &'a Declaration;
    type IntoIter = std::collections::btree_map::Values<'a, String, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.declarations.values()
    }
}
