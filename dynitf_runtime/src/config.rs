//! Configuration for the runtime.
//!
//! This module provides configuration management for the runtime,
//! including loading and saving configuration from files and turning
//! declared class layouts into class descriptors.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use dynitf_concurrency::PoolConfig;
use dynitf_core::{ClassError, Error, InterfaceRegistry, Result};

use crate::class::ClassDescriptor;
use crate::hooks::InterfaceHooks;
use crate::object::ObjectOptions;

/// Configuration for the runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Executor worker threads. Zero means one per CPU.
    #[serde(default)]
    pub worker_threads: usize,

    /// Maximum queued asynchronous requests before submissions fail.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Whether removed interface storage is overwritten with a fill pattern.
    #[serde(default = "default_poison_removed")]
    pub poison_removed: bool,

    /// How long object teardown waits for in-flight operations.
    #[serde(default = "default_teardown_timeout_ms")]
    pub teardown_timeout_ms: u64,

    /// Log level for tracing.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Class layouts known to the runtime.
    #[serde(default)]
    pub classes: Vec<ClassConfig>,
}

fn default_queue_capacity() -> usize {
    64
}

fn default_poison_removed() -> bool {
    cfg!(debug_assertions)
}

fn default_teardown_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            queue_capacity: default_queue_capacity(),
            poison_removed: default_poison_removed(),
            teardown_timeout_ms: default_teardown_timeout_ms(),
            log_level: default_log_level(),
            classes: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Default configuration plus a small player class with three interfaces.
    pub fn sample() -> Self {
        Self {
            classes: vec![ClassConfig {
                name: "demo_player".to_string(),
                size: 64,
                interfaces: vec![
                    InterfaceConfig::new("volume", 0),
                    InterfaceConfig::new("equalizer", 16),
                    InterfaceConfig::new("seek", 40),
                ],
            }],
            ..Self::default()
        }
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.worker_threads,
            queue_capacity: self.queue_capacity,
            ..PoolConfig::default()
        }
    }

    pub fn object_options(&self) -> ObjectOptions {
        ObjectOptions {
            poison_removed: self.poison_removed,
        }
    }

    /// Registry holding every interface named by any class.
    pub fn registry(&self) -> InterfaceRegistry {
        InterfaceRegistry::from_names(
            self.classes
                .iter()
                .flat_map(|class| class.interfaces.iter().map(|itf| itf.name.as_str())),
        )
    }
}

/// Layout of one class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassConfig {
    pub name: String,

    /// Object size in bytes.
    pub size: usize,

    /// Interfaces in increasing offset order.
    pub interfaces: Vec<InterfaceConfig>,
}

/// One interface of a class layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    pub name: String,
    pub offset: usize,
}

impl InterfaceConfig {
    pub fn new(name: impl Into<String>, offset: usize) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }
}

impl ClassConfig {
    /// Build a descriptor, asking `hooks` for the hooks of each interface name.
    pub fn build<F>(
        &self,
        registry: &Arc<InterfaceRegistry>,
        hooks: F,
    ) -> std::result::Result<ClassDescriptor, ClassError>
    where
        F: Fn(&str) -> Arc<dyn InterfaceHooks>,
    {
        let mut builder = ClassDescriptor::builder(&self.name, self.size, Arc::clone(registry));
        for itf in &self.interfaces {
            let id = registry
                .lookup_name(&itf.name)
                .ok_or_else(|| ClassError::UnknownName(itf.name.clone()))?;
            builder = builder.interface_with_hooks(id, itf.offset, hooks(&itf.name));
        }
        builder.build()
    }
}

/// Load configuration from a file.
pub fn load_config(path: &Path) -> Result<RuntimeConfig> {
    // Check file extension
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

    match ext {
        "toml" => toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML config: {}", e))),
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse YAML config: {}", e))),
        "json" => serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse JSON config: {}", e))),
        _ => Err(Error::Config(format!("Unsupported config file format: {}", ext))),
    }
}

/// Save configuration to a file.
pub fn save_config(config: &RuntimeConfig, path: &Path) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    let content = match ext {
        "toml" => toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize TOML config: {}", e)))?,
        "yaml" | "yml" => serde_yaml::to_string(config)
            .map_err(|e| Error::Config(format!("Failed to serialize YAML config: {}", e)))?,
        "json" => serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize JSON config: {}", e)))?,
        _ => return Err(Error::Config(format!("Unsupported config file format: {}", ext))),
    };

    std::fs::write(path, content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

    Ok(())
}
