//! Per-interface storage cells.
//!
//! Each slot of an object owns one cell sized to the slot's region in the
//! class layout. The byte buffer is allocated on first activation and
//! reset to zero on every activation before the activate hook runs. The
//! back-reference to the owning object is fixed when the object is built.

use std::any::Any;
use std::fmt;
use std::ops::Range;
use std::sync::Weak;

use crate::object::{ComponentObject, ObjectInner};

/// Fill pattern written over removed interfaces when poisoning is enabled.
pub const REMOVED_FILL: u8 = 0x55;

/// Storage backing one interface of one object.
pub struct InterfaceStorage {
    index: usize,
    region: Range<usize>,
    data: Option<Box<[u8]>>,
    extension: Option<Box<dyn Any + Send>>,
    owner: Weak<ObjectInner>,
}

impl InterfaceStorage {
    pub(crate) fn new(index: usize, region: Range<usize>, owner: Weak<ObjectInner>) -> Self {
        Self {
            index,
            region,
            data: None,
            extension: None,
            owner,
        }
    }

    /// Slot index within the class.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Bounds of this cell within the class layout.
    pub fn region(&self) -> Range<usize> {
        self.region.clone()
    }

    pub fn len(&self) -> usize {
        self.region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// Whether the byte buffer has been allocated.
    pub fn is_allocated(&self) -> bool {
        self.data.is_some()
    }

    /// Current contents. Empty until the interface is first activated.
    pub fn bytes(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// Mutable contents, allocating a zeroed buffer if needed.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let len = self.len();
        self.data
            .get_or_insert_with(|| vec![0; len].into_boxed_slice())
    }

    /// The object this storage belongs to, if it is still alive.
    pub fn owner(&self) -> Option<ComponentObject> {
        self.owner.upgrade().map(ComponentObject::from_inner)
    }

    /// Typed state attached by the interface's hooks.
    pub fn extension<T: Any>(&self) -> Option<&T> {
        self.extension.as_deref()?.downcast_ref::<T>()
    }

    pub fn extension_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.extension.as_deref_mut()?.downcast_mut::<T>()
    }

    /// Attach typed state, replacing any previous value.
    pub fn set_extension<T: Any + Send>(&mut self, value: T) {
        self.extension = Some(Box::new(value));
    }

    /// Detach typed state of type `T`. A value of another type is kept.
    pub fn take_extension<T: Any + Send>(&mut self) -> Option<T> {
        let boxed = self.extension.take()?;
        match boxed.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                self.extension = Some(other);
                None
            }
        }
    }

    /// Zero the cell and drop typed state.
    pub(crate) fn reset(&mut self) {
        self.fill(0);
    }

    /// Overwrite the cell with `byte` and drop typed state.
    pub(crate) fn fill(&mut self, byte: u8) {
        self.bytes_mut().fill(byte);
        self.extension = None;
    }
}

impl fmt::Debug for InterfaceStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceStorage")
            .field("index", &self.index)
            .field("region", &self.region)
            .field("allocated", &self.is_allocated())
            .field("extension", &self.extension.is_some())
            .finish()
    }
}
