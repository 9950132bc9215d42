use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::error::{DirectoryError, Result};
use crate::name::DistinguishedName;

/// A named attribute of a directory entry with its values.
#[derive(Debug, Clone)]
pub struct Attribute {
    id: String,
    values: Vec<String>,
}

impl Attribute {
    #[must_use]
    pub fn new<I, V>(id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            id: id.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// An attribute with no values, used to remove an attribute entirely.
    #[must_use]
    pub fn named(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    fn folded_id(&self) -> String {
        self.id.to_lowercase()
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.folded_id() == other.folded_id() && self.values == other.values
    }
}

impl Eq for Attribute {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationOp {
    Add,
    Replace,
    Remove,
}

/// One change in a `modify_attributes` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModificationItem {
    pub op: ModificationOp,
    pub attribute: Attribute,
}

impl ModificationItem {
    #[must_use]
    pub fn add(attribute: Attribute) -> Self {
        Self {
            op: ModificationOp::Add,
            attribute,
        }
    }

    #[must_use]
    pub fn replace(attribute: Attribute) -> Self {
        Self {
            op: ModificationOp::Replace,
            attribute,
        }
    }

    #[must_use]
    pub fn remove(attribute: Attribute) -> Self {
        Self {
            op: ModificationOp::Remove,
            attribute,
        }
    }
}

/// The attribute set of an entry. Attribute ids are matched
/// case-insensitively; equality ignores the order attributes were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    inner: IndexMap<String, Attribute>,
}

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<I, V>(mut self, id: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.put(Attribute::new(id, values));
        self
    }

    /// Insert or replace an attribute, returning the previous one.
    pub fn put(&mut self, attribute: Attribute) -> Option<Attribute> {
        self.inner.insert(attribute.folded_id(), attribute)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Attribute> {
        self.inner.get(&id.to_lowercase())
    }

    pub fn remove(&mut self, id: &str) -> Option<Attribute> {
        self.inner.shift_remove(&id.to_lowercase())
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains_key(&id.to_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.inner.values()
    }

    /// Apply `items` in order. Either every item applies or, on error,
    /// `self` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NoSuchAttribute` when an item removes an
    /// attribute or value that `name` does not have.
    pub fn apply_modifications(
        &mut self,
        name: &DistinguishedName,
        items: &[ModificationItem],
    ) -> Result<()> {
        let mut updated = self.clone();
        for item in items {
            updated.apply(name, item)?;
        }
        *self = updated;
        Ok(())
    }

    fn apply(&mut self, name: &DistinguishedName, item: &ModificationItem) -> Result<()> {
        let attribute = &item.attribute;
        match item.op {
            ModificationOp::Add => match self.inner.entry(attribute.folded_id()) {
                Entry::Occupied(mut existing) => {
                    let existing = existing.get_mut();
                    for value in attribute.values() {
                        if !existing.contains(value) {
                            existing.values.push(value.clone());
                        }
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(attribute.clone());
                }
            },
            ModificationOp::Replace => {
                if attribute.is_empty() {
                    self.remove(attribute.id());
                } else {
                    self.put(attribute.clone());
                }
            }
            ModificationOp::Remove => {
                let no_such_attribute = || DirectoryError::NoSuchAttribute {
                    name: name.clone(),
                    attribute: attribute.id().to_string(),
                };
                if attribute.is_empty() {
                    self.remove(attribute.id()).ok_or_else(no_such_attribute)?;
                    return Ok(());
                }
                let existing = self
                    .inner
                    .get_mut(&attribute.folded_id())
                    .ok_or_else(no_such_attribute)?;
                for value in attribute.values() {
                    if !existing.contains(value) {
                        return Err(no_such_attribute());
                    }
                    existing.values.retain(|v| v != value);
                }
                if existing.is_empty() {
                    self.remove(attribute.id());
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<T: IntoIterator<Item = Attribute>>(iter: T) -> Self {
        let mut attributes = Self::new();
        for attribute in iter {
            attributes.put(attribute);
        }
        attributes
    }
}
