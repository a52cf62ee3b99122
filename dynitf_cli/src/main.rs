//! Dynitf CLI - Command-line interface for the dynamic interface runtime
//!
//! This provides a command-line interface for inspecting class layouts,
//! writing configuration files and walking an object through the full
//! add, suspend, resume and remove cycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dynitf_runtime::{
    callback, load_config, save_config, ClassDescriptor, ComponentObject, Dispatch, Engine,
    InterfaceEvent, InterfaceHooks, InterfaceId, InterfaceStorage, RuntimeConfig,
};

#[derive(Debug, Parser)]
#[command(name = "dynitf", author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the interface layout of a class
    Layout {
        /// Class name
        #[arg(long, default_value = "demo_player")]
        class: String,
    },

    /// Create an object and cycle every interface through its states
    Demo {
        /// Class name
        #[arg(long, default_value = "demo_player")]
        class: String,

        /// Add and resume through the worker pool
        #[arg(long = "async")]
        asynchronous: bool,
    },

    /// Initialize a new configuration file
    Init {
        /// Path to the configuration file
        #[arg(value_name = "FILE")]
        config: PathBuf,
    },
}

/// Hooks that only log what happens to an interface.
struct TracingHooks {
    name: String,
}

impl InterfaceHooks for TracingHooks {
    fn on_activate(&self, storage: &mut InterfaceStorage) {
        info!(interface = %self.name, slot = storage.index(), bytes = storage.len(), "Activating");
    }

    fn on_deactivate(&self, storage: &mut InterfaceStorage) {
        info!(interface = %self.name, slot = storage.index(), "Deactivating");
    }

    fn on_resume(&self, storage: &mut InterfaceStorage) {
        info!(interface = %self.name, slot = storage.index(), "Resuming");
    }
}

fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => RuntimeConfig::sample(),
    };

    init_tracing(&config.log_level);

    match cli.command {
        Commands::Layout { class } => {
            let engine = Engine::new(config)?;
            let descriptor = find_class(&engine, &class)?;
            print_layout(&descriptor);
            engine.shutdown();
        }
        Commands::Demo {
            class,
            asynchronous,
        } => {
            let engine = Engine::with_hooks(config, |name| -> Arc<dyn InterfaceHooks> {
                Arc::new(TracingHooks {
                    name: name.to_string(),
                })
            })?;
            let result = run_demo(&engine, &class, Dispatch::from(asynchronous));
            engine.shutdown();
            result?;
        }
        Commands::Init { config: path } => init_config(&path)?,
    }

    Ok(())
}

/// Install the fmt subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn find_class(engine: &Engine, name: &str) -> Result<Arc<ClassDescriptor>> {
    engine.class(name).ok_or_else(|| {
        anyhow!(
            "Unknown class '{}'. Known classes: {}",
            name,
            engine.class_names().join(", ")
        )
    })
}

fn interface_name(class: &ClassDescriptor, interface: &InterfaceId) -> String {
    class
        .resolve(interface)
        .and_then(|(kind, _)| class.registry().name(kind))
        .map(str::to_string)
        .unwrap_or_else(|| interface.to_string())
}

fn print_layout(class: &ClassDescriptor) {
    println!("Class {} ({} bytes)", class.name(), class.size());
    for (index, entry) in class.entries().iter().enumerate() {
        let region = class.region(index).unwrap_or_default();
        println!(
            "  [{}] {:<12} {} offset={:<4} bytes={:<4} id={}",
            index,
            interface_name(class, &entry.interface()),
            entry.kind(),
            entry.offset(),
            region.len(),
            entry.interface()
        );
    }
}

fn print_states(object: &ComponentObject) {
    let class = object.class();
    for (entry, state) in class.entries().iter().zip(object.interface_states()) {
        println!("  {:<12} {}", interface_name(class, &entry.interface()), state);
    }
}

/// Wait for `count` events and print them.
fn drain(
    class: &ClassDescriptor,
    events: &Receiver<InterfaceEvent>,
    count: usize,
    timeout: Duration,
) -> Result<()> {
    for _ in 0..count {
        let event = events
            .recv_timeout(timeout)
            .context("Timed out waiting for an interface event")?;
        println!(
            "  event {:?} {} -> {}",
            event.kind,
            interface_name(class, &event.interface),
            event.code()
        );
        event.result?;
    }
    Ok(())
}

fn run_demo(engine: &Engine, class: &str, dispatch: Dispatch) -> Result<()> {
    let object = engine.create_object(class)?;
    let class = Arc::clone(object.class());
    let dim = object.dynamic_interface_management();
    let timeout = engine.teardown_timeout();
    let pending = if dispatch.is_async() { 1 } else { 0 };

    let (sender, events) = crossbeam_channel::unbounded();
    dim.register_callback(
        Some(callback(move |_dim, event| {
            // The receiver outlives every delivery
            let _ = sender.send(event.clone());
        })),
        None,
    );

    println!("Object {} of class {}", object.id(), class.name());

    println!("Adding interfaces ({:?})", dispatch);
    for entry in class.entries() {
        dim.add_interface(&entry.interface(), dispatch)?;
    }
    drain(&class, &events, pending * class.interface_count(), timeout)?;
    print_states(&object);

    if let Some(first) = class.entries().first().map(|entry| entry.interface()) {
        let handle = object.get_interface(&first)?;
        println!(
            "Acquired {} ({} bytes)",
            interface_name(&class, &first),
            handle.with_storage(|storage| storage.len()).unwrap_or_default()
        );

        println!("Suspending {}", interface_name(&class, &first));
        object.suspend_interface(&first)?;
        object.signal_resources_available(&first)?;
        drain(&class, &events, 2, timeout)?;

        dim.resume_interface(&first, dispatch)?;
        drain(&class, &events, pending, timeout)?;
        print_states(&object);
    }

    println!("Removing interfaces");
    for entry in class.entries() {
        dim.remove_interface(&entry.interface())?;
    }
    print_states(&object);

    object.teardown(timeout)?;
    println!("Object {} torn down", object.id());
    Ok(())
}

/// Write the sample configuration.
fn init_config(path: &Path) -> Result<()> {
    let config = RuntimeConfig::sample();
    save_config(&config, path)?;

    println!("Configuration initialized at: {}", path.display());
    Ok(())
}
