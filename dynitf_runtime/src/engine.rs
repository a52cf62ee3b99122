//! Engine facade.
//!
//! Ties a configuration to a live executor and a set of class
//! descriptors, and creates objects from them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use dynitf_concurrency::ThreadPool;
use dynitf_core::{Error, InterfaceRegistry, Result};

use crate::class::ClassDescriptor;
use crate::config::RuntimeConfig;
use crate::hooks::{InterfaceHooks, NoHooks};
use crate::object::ComponentObject;

/// A running engine: registry, classes and worker pool.
pub struct Engine {
    config: RuntimeConfig,
    registry: Arc<InterfaceRegistry>,
    classes: HashMap<String, Arc<ClassDescriptor>>,
    pool: Arc<ThreadPool>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Start an engine whose interfaces have no hooks.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        Self::with_hooks(config, |_| Arc::new(NoHooks))
    }

    /// Start an engine, asking `hooks` for the hooks of each interface name.
    pub fn with_hooks<F>(config: RuntimeConfig, hooks: F) -> Result<Self>
    where
        F: Fn(&str) -> Arc<dyn InterfaceHooks>,
    {
        let registry = Arc::new(config.registry());

        let mut classes = HashMap::new();
        for class in &config.classes {
            let descriptor = class.build(&registry, &hooks)?;
            classes.insert(class.name.clone(), Arc::new(descriptor));
        }

        let pool = Arc::new(ThreadPool::new(config.pool_config())?);

        info!(
            classes = classes.len(),
            interfaces = registry.len(),
            workers = pool.worker_count(),
            "Engine started"
        );

        Ok(Self {
            config,
            registry,
            classes,
            pool,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<InterfaceRegistry> {
        &self.registry
    }

    pub fn class(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(name).cloned()
    }

    /// Class names, sorted.
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Create an object of a configured class.
    pub fn create_object(&self, class: &str) -> Result<ComponentObject> {
        let descriptor = self
            .class(class)
            .ok_or_else(|| Error::Config(format!("Unknown class: {}", class)))?;
        Ok(self.create_object_of(descriptor))
    }

    /// Create an object of any class, running on this engine's pool.
    pub fn create_object_of(&self, class: Arc<ClassDescriptor>) -> ComponentObject {
        ComponentObject::with_options(class, self.pool.clone(), self.config.object_options())
    }

    pub fn teardown_timeout(&self) -> Duration {
        Duration::from_millis(self.config.teardown_timeout_ms)
    }

    /// Stop the worker pool after draining queued work.
    pub fn shutdown(&self) {
        self.pool.shutdown();
        info!("Engine shut down");
    }
}
