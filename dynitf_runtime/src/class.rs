//! Class descriptors.
//!
//! A class descriptor lists the interfaces a class of objects may expose,
//! where each one lives in the object layout, and which hooks run when it
//! changes state. Descriptors are built once and shared read-only.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use dynitf_core::{ClassError, InterfaceId, InterfaceKind, InterfaceRegistry};

use crate::hooks::{InterfaceHooks, NoHooks};

/// Maximum number of interfaces per class, bounded by the acquisition mask.
pub const MAX_INTERFACES: usize = 64;

/// One interface declared by a class.
#[derive(Clone)]
pub struct InterfaceEntry {
    interface: InterfaceId,
    kind: InterfaceKind,
    offset: usize,
    hooks: Arc<dyn InterfaceHooks>,
}

impl InterfaceEntry {
    pub fn interface(&self) -> InterfaceId {
        self.interface
    }

    pub fn kind(&self) -> InterfaceKind {
        self.kind
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn hooks(&self) -> &Arc<dyn InterfaceHooks> {
        &self.hooks
    }
}

impl fmt::Debug for InterfaceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceEntry")
            .field("interface", &self.interface)
            .field("kind", &self.kind)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

/// Immutable description of a class of component objects.
pub struct ClassDescriptor {
    name: String,
    size: usize,
    entries: Vec<InterfaceEntry>,
    kind_to_index: HashMap<InterfaceKind, usize>,
    registry: Arc<InterfaceRegistry>,
}

impl ClassDescriptor {
    /// Start describing a class whose objects span `size` bytes.
    pub fn builder(
        name: impl Into<String>,
        size: usize,
        registry: Arc<InterfaceRegistry>,
    ) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            size,
            registry,
            declared: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total object size the layout is laid out in.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn interface_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[InterfaceEntry] {
        &self.entries
    }

    pub fn registry(&self) -> &Arc<InterfaceRegistry> {
        &self.registry
    }

    /// Resolve an interface id to its kind and slot index in this class.
    pub fn resolve(&self, interface: &InterfaceId) -> Option<(InterfaceKind, usize)> {
        let kind = self.registry.resolve(interface)?;
        self.index_of(kind).map(|index| (kind, index))
    }

    /// Slot index of an interface kind in this class.
    pub fn index_of(&self, kind: InterfaceKind) -> Option<usize> {
        self.kind_to_index.get(&kind).copied()
    }

    /// Byte range of a slot's region: from its offset to the next entry's
    /// offset, or to the object size for the last entry.
    pub fn region(&self, index: usize) -> Option<Range<usize>> {
        let entry = self.entries.get(index)?;
        let end = self
            .entries
            .get(index + 1)
            .map_or(self.size, |next| next.offset);
        Some(entry.offset..end)
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("entries", &self.entries)
            .finish()
    }
}

/// Builder for `ClassDescriptor`.
pub struct ClassBuilder {
    name: String,
    size: usize,
    registry: Arc<InterfaceRegistry>,
    declared: Vec<(InterfaceId, usize, Arc<dyn InterfaceHooks>)>,
}

impl ClassBuilder {
    /// Declare an interface without lifecycle hooks.
    pub fn interface(self, interface: InterfaceId, offset: usize) -> Self {
        self.interface_with_hooks(interface, offset, Arc::new(NoHooks))
    }

    /// Declare an interface with lifecycle hooks.
    pub fn interface_with_hooks(
        mut self,
        interface: InterfaceId,
        offset: usize,
        hooks: Arc<dyn InterfaceHooks>,
    ) -> Self {
        self.declared.push((interface, offset, hooks));
        self
    }

    /// Validate the layout and build the descriptor.
    ///
    /// Interfaces must be declared in strictly increasing offset order, all
    /// inside the object, each registered and declared once.
    pub fn build(self) -> Result<ClassDescriptor, ClassError> {
        if self.declared.is_empty() {
            return Err(ClassError::Empty(self.name));
        }
        if self.declared.len() > MAX_INTERFACES {
            return Err(ClassError::TooManyInterfaces {
                class: self.name,
                count: self.declared.len(),
                limit: MAX_INTERFACES,
            });
        }

        let mut entries = Vec::with_capacity(self.declared.len());
        let mut kind_to_index = HashMap::new();
        let mut seen = HashSet::new();
        let mut previous: Option<usize> = None;

        for (interface, offset, hooks) in self.declared {
            let kind = self
                .registry
                .resolve(&interface)
                .ok_or(ClassError::Unregistered(interface))?;
            if !seen.insert(kind) {
                return Err(ClassError::Duplicate(interface));
            }
            if offset >= self.size {
                return Err(ClassError::OutOfBounds {
                    offset,
                    size: self.size,
                });
            }
            if let Some(previous) = previous {
                if offset <= previous {
                    return Err(ClassError::Unordered { offset, previous });
                }
            }
            previous = Some(offset);

            kind_to_index.insert(kind, entries.len());
            entries.push(InterfaceEntry {
                interface,
                kind,
                offset,
                hooks,
            });
        }

        Ok(ClassDescriptor {
            name: self.name,
            size: self.size,
            entries,
            kind_to_index,
            registry: self.registry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<InterfaceRegistry> {
        Arc::new(InterfaceRegistry::from_names(["a", "b", "c", "d"]))
    }

    #[test]
    fn test_regions_follow_offsets() {
        let class = ClassDescriptor::builder("three", 64, registry())
            .interface(InterfaceId::from_name("a"), 0)
            .interface(InterfaceId::from_name("b"), 16)
            .interface(InterfaceId::from_name("c"), 40)
            .build()
            .unwrap();

        assert_eq!(class.region(0), Some(0..16));
        assert_eq!(class.region(1), Some(16..40));
        assert_eq!(class.region(2), Some(40..64));
        assert_eq!(class.region(3), None);

        let sizes: Vec<usize> = (0..3).map(|i| class.region(i).unwrap().len()).collect();
        assert_eq!(sizes, vec![16, 24, 24]);
    }

    #[test]
    fn test_resolve() {
        let class = ClassDescriptor::builder("two", 32, registry())
            .interface(InterfaceId::from_name("b"), 0)
            .interface(InterfaceId::from_name("d"), 8)
            .build()
            .unwrap();

        let (kind, index) = class.resolve(&InterfaceId::from_name("d")).unwrap();
        assert_eq!(index, 1);
        assert_eq!(class.index_of(kind), Some(1));
        // Registered, but not declared by this class
        assert_eq!(class.resolve(&InterfaceId::from_name("a")), None);
        // Not registered at all
        assert_eq!(class.resolve(&InterfaceId::from_name("zzz")), None);
    }

    #[test]
    fn test_invalid_layouts() {
        let a = InterfaceId::from_name("a");
        let b = InterfaceId::from_name("b");

        let err = ClassDescriptor::builder("empty", 8, registry()).build().unwrap_err();
        assert_eq!(err, ClassError::Empty("empty".to_string()));

        let err = ClassDescriptor::builder("unordered", 64, registry())
            .interface(a, 16)
            .interface(b, 8)
            .build()
            .unwrap_err();
        assert_eq!(err, ClassError::Unordered { offset: 8, previous: 16 });

        let err = ClassDescriptor::builder("bounds", 16, registry())
            .interface(a, 16)
            .build()
            .unwrap_err();
        assert_eq!(err, ClassError::OutOfBounds { offset: 16, size: 16 });

        let err = ClassDescriptor::builder("dup", 64, registry())
            .interface(a, 0)
            .interface(a, 8)
            .build()
            .unwrap_err();
        assert_eq!(err, ClassError::Duplicate(a));

        let unknown = InterfaceId::from_name("unknown");
        let err = ClassDescriptor::builder("unregistered", 64, registry())
            .interface(unknown, 0)
            .build()
            .unwrap_err();
        assert_eq!(err, ClassError::Unregistered(unknown));
    }
}
