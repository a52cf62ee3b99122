//! Interface registry.
//!
//! Maps the externally visible `InterfaceId` of every known interface to a
//! dense numeric `InterfaceKind`. Class descriptors index their tables by
//! kind, so lookups on the hot path never hash a UUID twice.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::InterfaceId;

/// Dense numeric identifier of a registered interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterfaceKind(u32);

impl InterfaceKind {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
struct RegistryEntry {
    id: InterfaceId,
    name: String,
}

/// Registry of all interfaces known to the process.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct InterfaceRegistry {
    by_id: HashMap<InterfaceId, InterfaceKind>,
    entries: Vec<RegistryEntry>,
}

impl InterfaceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the name-derived ids of `names`.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.register_name(name.as_ref());
        }
        registry
    }

    /// Register an interface. Registering the same id twice returns the
    /// kind assigned the first time.
    pub fn register(&mut self, name: impl Into<String>, id: InterfaceId) -> InterfaceKind {
        if let Some(kind) = self.by_id.get(&id) {
            return *kind;
        }

        let kind = InterfaceKind(self.entries.len() as u32);
        self.entries.push(RegistryEntry {
            id,
            name: name.into(),
        });
        self.by_id.insert(id, kind);
        kind
    }

    /// Register an interface under its name-derived id.
    pub fn register_name(&mut self, name: &str) -> (InterfaceId, InterfaceKind) {
        let id = InterfaceId::from_name(name);
        (id, self.register(name, id))
    }

    /// Resolve an interface id to its kind.
    pub fn resolve(&self, id: &InterfaceId) -> Option<InterfaceKind> {
        self.by_id.get(id).copied()
    }

    /// Look up an id by registered name.
    pub fn lookup_name(&self, name: &str) -> Option<InterfaceId> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.id)
    }

    /// The id registered for a kind.
    pub fn interface_id(&self, kind: InterfaceKind) -> Option<InterfaceId> {
        self.entries.get(kind.as_usize()).map(|entry| entry.id)
    }

    /// The name registered for a kind.
    pub fn name(&self, kind: InterfaceKind) -> Option<&str> {
        self.entries.get(kind.as_usize()).map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
