use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::attributes::{Attributes, ModificationItem};
use crate::directory::DirectoryOperations;
use crate::error::{DirectoryError, Result};
use crate::name::DistinguishedName;

type Entries = BTreeMap<DistinguishedName, Attributes>;

/// A directory held in memory, following the same naming rules as a server:
/// entries need an existing parent (root-level entries excepted) and only
/// leaf entries can be unbound.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    entries: RwLock<Entries>,
    read_only: bool,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An anonymous, read-only view. Writes are still accepted; only
    /// `is_anonymous_read_only` changes.
    #[must_use]
    pub fn anonymous_read_only() -> Self {
        Self {
            entries: RwLock::default(),
            read_only: true,
        }
    }

    /// Seed an entry without any parent checks.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a valid distinguished name.
    #[must_use]
    pub fn with_entry(self, name: &str, attributes: Attributes) -> Self {
        match DistinguishedName::parse(name) {
            Ok(name) => {
                self.write().insert(name, attributes);
            }
            Err(err) => panic!("invalid seed entry name: {err}"),
        }
        self
    }

    #[must_use]
    pub fn contains(&self, name: &DistinguishedName) -> bool {
        self.read().contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<DistinguishedName> {
        self.read().keys().cloned().collect()
    }

    /// A copy of every entry, for comparing directory state over time.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<DistinguishedName, Attributes> {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ensure_parent(entries: &Entries, name: &DistinguishedName) -> Result<()> {
    match name.parent() {
        Some(parent) if !parent.is_empty() && !entries.contains_key(&parent) => {
            Err(DirectoryError::NameNotFound(parent))
        }
        Some(_) => Ok(()),
        None => Err(DirectoryError::InvalidName {
            input: String::new(),
            reason: "the root cannot be bound",
        }),
    }
}

impl DirectoryOperations for InMemoryDirectory {
    fn bind(&self, name: &DistinguishedName, attributes: &Attributes) -> Result<()> {
        let mut entries = self.write();
        if entries.contains_key(name) {
            return Err(DirectoryError::NameAlreadyBound(name.clone()));
        }
        ensure_parent(&entries, name)?;
        entries.insert(name.clone(), attributes.clone());
        Ok(())
    }

    fn lookup(&self, name: &DistinguishedName) -> Result<Attributes> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| DirectoryError::NameNotFound(name.clone()))
    }

    fn rebind(&self, name: &DistinguishedName, attributes: &Attributes) -> Result<()> {
        let mut entries = self.write();
        ensure_parent(&entries, name)?;
        entries.insert(name.clone(), attributes.clone());
        Ok(())
    }

    fn rename(&self, old_name: &DistinguishedName, new_name: &DistinguishedName) -> Result<()> {
        let mut entries = self.write();
        if !entries.contains_key(old_name) {
            return Err(DirectoryError::NameNotFound(old_name.clone()));
        }
        if entries.contains_key(new_name) {
            return Err(DirectoryError::NameAlreadyBound(new_name.clone()));
        }
        if new_name.is_descendant_of(old_name) {
            return Err(DirectoryError::InvalidName {
                input: new_name.to_string(),
                reason: "an entry cannot be moved below itself",
            });
        }
        ensure_parent(&entries, new_name)?;

        let moved: Vec<DistinguishedName> = entries
            .keys()
            .filter(|name| *name == old_name || name.is_descendant_of(old_name))
            .cloned()
            .collect();
        for name in moved {
            if let (Some(attributes), Some(target)) = (
                entries.remove(&name),
                name.replace_base(old_name, new_name),
            ) {
                entries.insert(target, attributes);
            }
        }
        Ok(())
    }

    fn has_children(&self, name: &DistinguishedName) -> Result<bool> {
        let entries = self.read();
        if !entries.contains_key(name) {
            return Err(DirectoryError::NameNotFound(name.clone()));
        }
        Ok(entries.keys().any(|other| other.is_descendant_of(name)))
    }

    fn unbind(&self, name: &DistinguishedName) -> Result<()> {
        let mut entries = self.write();
        if !entries.contains_key(name) {
            return Err(DirectoryError::NameNotFound(name.clone()));
        }
        if entries.keys().any(|other| other.is_descendant_of(name)) {
            return Err(DirectoryError::NotEmpty(name.clone()));
        }
        entries.remove(name);
        Ok(())
    }

    fn modify_attributes(
        &self,
        name: &DistinguishedName,
        items: &[ModificationItem],
    ) -> Result<()> {
        let mut entries = self.write();
        let attributes = entries
            .get_mut(name)
            .ok_or_else(|| DirectoryError::NameNotFound(name.clone()))?;
        attributes.apply_modifications(name, items)
    }

    fn is_anonymous_read_only(&self) -> bool {
        self.read_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attribute;

    fn dn(s: &str) -> DistinguishedName {
        DistinguishedName::parse(s).expect("valid name")
    }

    fn org() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_entry("c=SE", Attributes::new().with("c", ["SE"]))
            .with_entry(
                "ou=company, c=SE",
                Attributes::new().with("ou", ["company"]),
            )
    }

    #[test]
    fn bind_then_lookup_returns_attributes() -> anyhow::Result<()> {
        let directory = org();
        let attrs = Attributes::new().with("cn", ["john doe"]);
        directory.bind(&dn("cn=john doe, ou=company, c=SE"), &attrs)?;

        assert_eq!(directory.lookup(&dn("cn=john doe, ou=company, c=SE"))?, attrs);
        Ok(())
    }

    #[test]
    fn bind_requires_parent() {
        let directory = org();
        let result = directory.bind(&dn("cn=x, ou=missing, c=SE"), &Attributes::new());

        assert!(matches!(result, Err(DirectoryError::NameNotFound(parent)) if parent == dn("ou=missing, c=SE")));
    }

    #[test]
    fn bind_rejects_existing_name() {
        let directory = org();
        let result = directory.bind(&dn("ou=company, c=SE"), &Attributes::new());
        assert!(matches!(result, Err(DirectoryError::NameAlreadyBound(_))));
    }

    #[test]
    fn rename_moves_whole_subtree() -> anyhow::Result<()> {
        let directory = org().with_entry(
            "cn=john doe, ou=company, c=SE",
            Attributes::new().with("cn", ["john doe"]),
        );
        directory.rename(&dn("ou=company, c=SE"), &dn("ou=corp, c=SE"))?;

        assert!(!directory.contains(&dn("ou=company, c=SE")));
        assert!(!directory.contains(&dn("cn=john doe, ou=company, c=SE")));
        assert!(directory.contains(&dn("ou=corp, c=SE")));
        assert!(directory.contains(&dn("cn=john doe, ou=corp, c=SE")));
        Ok(())
    }

    #[test]
    fn rename_to_missing_parent_fails() {
        let directory = org();
        let result = directory.rename(&dn("ou=company, c=SE"), &dn("ou=company, ou=temp"));
        assert!(matches!(result, Err(DirectoryError::NameNotFound(_))));
        assert!(directory.contains(&dn("ou=company, c=SE")));
    }

    #[test]
    fn unbind_refuses_non_leaf() {
        let directory = org();
        let result = directory.unbind(&dn("c=SE"));
        assert!(matches!(result, Err(DirectoryError::NotEmpty(_))));
    }

    #[test]
    fn has_children_distinguishes_leaves() -> anyhow::Result<()> {
        let directory = org();

        assert!(directory.has_children(&dn("c=SE"))?);
        assert!(!directory.has_children(&dn("ou=company, c=SE"))?);
        assert!(matches!(
            directory.has_children(&dn("cn=nobody, c=SE")),
            Err(DirectoryError::NameNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn modify_attributes_is_all_or_nothing() {
        let directory = org();
        let before = directory.snapshot();
        let result = directory.modify_attributes(
            &dn("ou=company, c=SE"),
            &[
                ModificationItem::add(Attribute::new("description", ["x"])),
                ModificationItem::remove(Attribute::named("missing")),
            ],
        );

        assert!(result.is_err());
        assert_eq!(directory.snapshot(), before);
    }
}
