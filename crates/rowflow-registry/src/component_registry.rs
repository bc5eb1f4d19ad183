//! Component Registry
use crate::compat::{role_for, Role};
use crate::RegistryError;
use once_cell::sync::Lazy;
use regex::Regex;
use rowflow_core::{ClassRef, Context};
use std::collections::BTreeMap;
use tracing::debug;

/// `Name` or `Module::Name`
static CLASS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub class: ClassRef,
    pub role: Role,
}

/// Name → class lookup used to resolve job specs.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `class` under its own name.
    pub fn register(&mut self, role: Role, class: ClassRef) -> Result<(), RegistryError> {
        let name = class.name().to_string();
        if !CLASS_NAME.is_match(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        if self.entries.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        debug!(class = %name, %role, "registered");
        self.entries.insert(name, RegistryEntry { class, role });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names with the given role, sorted.
    pub fn names(&self, role: Role) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.role == role)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `name` for use in `context`.
    pub fn resolve(&self, context: Context, name: &str) -> Result<&ClassRef, RegistryError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| RegistryError::UnknownClass {
                name: name.to_string(),
                context,
            })?;
        if !entry.role.is_compatible_with(context) {
            return Err(RegistryError::IncompatibleRole {
                name: name.to_string(),
                context,
                role: entry.role,
                expected: role_for(context),
            });
        }
        Ok(&entry.class)
    }
}
