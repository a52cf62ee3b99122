use std::sync::Arc;

use assert_matches::assert_matches;
use dynitf_runtime::{
    load_config, save_config, ClassConfig, Dispatch, Engine, Error, InterfaceConfig,
    InterfaceId, InterfaceState, RuntimeConfig,
};
use tempfile::tempdir;

#[test]
fn test_config_files_round_trip() {
    let dir = tempdir().unwrap();
    let config = RuntimeConfig {
        worker_threads: 3,
        teardown_timeout_ms: 250,
        ..RuntimeConfig::sample()
    };

    for name in ["runtime.toml", "runtime.yaml", "runtime.json"] {
        let path = dir.path().join(name);
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }
}

#[test]
fn test_unsupported_config_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("runtime.ini");

    assert_matches!(
        save_config(&RuntimeConfig::default(), &path),
        Err(Error::Config(_))
    );
    std::fs::write(&path, "worker_threads = 1").unwrap();
    assert_matches!(load_config(&path), Err(Error::Config(_)));
}

#[test]
fn test_engine_creates_objects() {
    let engine = Engine::new(RuntimeConfig::sample()).unwrap();
    assert_eq!(engine.class_names(), vec!["demo_player"]);
    assert_matches!(engine.create_object("missing"), Err(Error::Config(_)));

    let object = engine.create_object("demo_player").unwrap();
    let dim = object.dynamic_interface_management();
    let equalizer = InterfaceId::from_name("equalizer");

    dim.add_interface(&equalizer, Dispatch::Synchronous).unwrap();
    assert_eq!(object.interface_state(&equalizer), Some(InterfaceState::Added));
    assert_eq!(object.with_storage(&equalizer, |s| s.len()), Some(24));

    object.teardown(engine.teardown_timeout()).unwrap();
    engine.shutdown();
}

#[test]
fn test_engine_unbounded_teardown_timeout() {
    let config = RuntimeConfig {
        teardown_timeout_ms: u64::MAX,
        ..RuntimeConfig::sample()
    };
    let engine = Engine::new(config).unwrap();
    let object = engine.create_object("demo_player").unwrap();
    let volume = InterfaceId::from_name("volume");

    object
        .dynamic_interface_management()
        .add_interface(&volume, Dispatch::Synchronous)
        .unwrap();
    object.teardown(engine.teardown_timeout()).unwrap();
    assert!(object.is_destroying());
    engine.shutdown();
}

#[test]
fn test_engine_rejects_bad_layout() {
    let config = RuntimeConfig {
        classes: vec![ClassConfig {
            name: "overlapping".to_string(),
            size: 32,
            interfaces: vec![InterfaceConfig::new("a", 16), InterfaceConfig::new("b", 8)],
        }],
        ..RuntimeConfig::default()
    };

    assert_matches!(Engine::new(config), Err(Error::Class(_)));
}

#[test]
fn test_engine_shared_hooks() {
    struct Named;
    impl dynitf_runtime::InterfaceHooks for Named {
        fn on_activate(&self, storage: &mut dynitf_runtime::InterfaceStorage) {
            storage.set_extension(storage.index());
        }
    }

    let engine = Engine::with_hooks(RuntimeConfig::sample(), |_| Arc::new(Named)).unwrap();
    let object = engine.create_object("demo_player").unwrap();
    let seek = InterfaceId::from_name("seek");

    object
        .dynamic_interface_management()
        .add_interface(&seek, Dispatch::Synchronous)
        .unwrap();
    assert_eq!(
        object.with_storage(&seek, |s| s.extension::<usize>().copied()),
        Some(Some(2))
    );
}
