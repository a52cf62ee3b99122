#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use dynitf_runtime::{
    callback, ClassDescriptor, InterfaceCallback, InterfaceEvent, InterfaceHooks, InterfaceId,
    InterfaceRegistry, InterfaceStorage,
};

pub fn volume() -> InterfaceId {
    InterfaceId::from_name("volume")
}

pub fn equalizer() -> InterfaceId {
    InterfaceId::from_name("equalizer")
}

pub fn seek() -> InterfaceId {
    InterfaceId::from_name("seek")
}

/// Registered, but declared by no class.
pub fn unused() -> InterfaceId {
    InterfaceId::from_name("unused")
}

pub fn registry() -> Arc<InterfaceRegistry> {
    Arc::new(InterfaceRegistry::from_names([
        "volume",
        "equalizer",
        "seek",
        "unused",
    ]))
}

/// Three interfaces at offsets 0, 16 and 40 of a 64-byte object.
pub fn player_class(hooks: Arc<CountingHooks>) -> Arc<ClassDescriptor> {
    Arc::new(
        ClassDescriptor::builder("player", 64, registry())
            .interface_with_hooks(volume(), 0, hooks.clone())
            .interface_with_hooks(equalizer(), 16, hooks.clone())
            .interface_with_hooks(seek(), 40, hooks)
            .build()
            .unwrap(),
    )
}

/// Hooks that count invocations and detect overlapping runs.
#[derive(Default)]
pub struct CountingHooks {
    pub activated: AtomicUsize,
    pub deactivated: AtomicUsize,
    pub resumed: AtomicUsize,
    running: AtomicBool,
    pub overlapped: AtomicBool,
    /// Byte written into storage by the activate hook.
    pub marker: Option<u8>,
}

impl CountingHooks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_marker(marker: u8) -> Arc<Self> {
        Arc::new(Self {
            marker: Some(marker),
            ..Self::default()
        })
    }

    pub fn activated(&self) -> usize {
        self.activated.load(Ordering::SeqCst)
    }

    pub fn deactivated(&self) -> usize {
        self.deactivated.load(Ordering::SeqCst)
    }

    pub fn resumed(&self) -> usize {
        self.resumed.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
    }

    fn exit(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl InterfaceHooks for CountingHooks {
    fn on_activate(&self, storage: &mut InterfaceStorage) {
        self.enter();
        self.activated.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = self.marker {
            storage.bytes_mut().fill(marker);
        }
        std::thread::yield_now();
        self.exit();
    }

    fn on_deactivate(&self, _storage: &mut InterfaceStorage) {
        self.enter();
        self.deactivated.fetch_add(1, Ordering::SeqCst);
        std::thread::yield_now();
        self.exit();
    }

    fn on_resume(&self, _storage: &mut InterfaceStorage) {
        self.enter();
        self.resumed.fetch_add(1, Ordering::SeqCst);
        self.exit();
    }
}

/// Collects delivered events.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<InterfaceEvent>>,
    arrived: Condvar,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn callback(self: &Arc<Self>) -> InterfaceCallback {
        let log = Arc::clone(self);
        callback(move |_dim, event| {
            log.events.lock().push(event.clone());
            log.arrived.notify_all();
        })
    }

    pub fn events(&self) -> Vec<InterfaceEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Wait until at least `count` events arrived. Returns whether they did.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut events = self.events.lock();
        while events.len() < count {
            if self.arrived.wait_until(&mut events, deadline).timed_out() {
                return events.len() >= count;
            }
        }
        true
    }
}
