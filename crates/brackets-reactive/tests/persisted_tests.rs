//! Persisted values and storage backends.

use brackets_reactive::{
    persisted, JsonFileStorage, MemoryStorage, PersistedValue, ReactiveState, RecordingSink,
    Runtime, RuntimeConfig, StateNode, Storage, StorageError,
};
use serde_json::{json, Value};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn settings(rt: &Runtime, default: Value) -> ReactiveState {
    rt.reactive(StateNode::object([
        ("theme", persisted(default).into()),
        ("other", StateNode::from(json!(0))),
    ]))
    .unwrap()
}

// ══════════════════════════════════════════════════════════════════════════════
// Hydration
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_default_until_hydrated_and_when_nothing_stored() {
    let rt = Runtime::new();
    let state = settings(&rt, json!("light"));
    assert_eq!(state.get("theme").unwrap(), json!("light"));
    assert!(rt.has_pending(), "hydration is deferred");

    rt.run_until_idle().unwrap();
    assert_eq!(state.get("theme").unwrap(), json!("light"));
}

#[test]
fn test_set_then_fresh_hydration_yields_value() {
    let storage = MemoryStorage::new();

    let first = Runtime::new().with_storage(storage.clone());
    let state = settings(&first, json!("light"));
    first.run_until_idle().unwrap();
    state.set("theme", "dark").unwrap();
    assert_eq!(state.get("theme").unwrap(), json!("dark"));
    assert_eq!(
        storage.get("brackets:default.theme").unwrap(),
        Some(json!("dark"))
    );

    let sink = RecordingSink::new();
    let second = Runtime::new()
        .with_storage(storage.clone())
        .with_sink(sink.clone());
    let state = settings(&second, json!("light"));
    let id = second.attach_element("default", 0, "{{ theme }}").unwrap();
    assert_eq!(sink.last_text(id).as_deref(), Some("light "));

    second.run_until_idle().unwrap();
    assert_eq!(state.get("theme").unwrap(), json!("dark"));
    assert_eq!(sink.last_text(id).as_deref(), Some("dark "));
}

#[test]
fn test_write_before_hydration_wins() {
    let storage = MemoryStorage::new();
    storage.set("brackets:default.theme", &json!("dark")).unwrap();

    let rt = Runtime::new().with_storage(storage.clone());
    let state = settings(&rt, json!("light"));
    state.set("theme", "blue").unwrap();
    rt.run_until_idle().unwrap();

    assert_eq!(state.get("theme").unwrap(), json!("blue"));
    assert_eq!(
        storage.get("brackets:default.theme").unwrap(),
        Some(json!("blue"))
    );
}

#[test]
fn test_direct_set_persists_and_notifies() {
    let storage = MemoryStorage::new();
    let sink = RecordingSink::new();
    let rt = Runtime::new()
        .with_storage(storage.clone())
        .with_sink(sink.clone());
    let volume = PersistedValue::new(5);
    let state = rt
        .reactive(StateNode::object([("volume", volume.clone().into())]))
        .unwrap();
    rt.run_until_idle().unwrap();
    let id = rt.attach_element("default", 0, "{{ volume }}").unwrap();

    volume.set(7).unwrap();
    assert!(volume.is_hydrated());
    rt.run_until_idle().unwrap();

    assert_eq!(state.get("volume").unwrap(), json!(7));
    assert_eq!(sink.last_text(id).as_deref(), Some("7 "));
    assert_eq!(storage.keys(), vec!["brackets:default.volume"]);
}

#[test]
fn test_nested_write_goes_through_persisted_setter() {
    let storage = MemoryStorage::new();
    let rt = Runtime::new().with_storage(storage.clone());
    let state = rt
        .reactive(StateNode::object([(
            "prefs",
            persisted(json!({"font": 12, "tags": []})).into(),
        )]))
        .unwrap();
    rt.run_until_idle().unwrap();

    state.set("prefs.font", json!(14)).unwrap();
    state.push("prefs.tags", "bold").unwrap();

    let expected = json!({"font": 14, "tags": ["bold"]});
    assert_eq!(state.get("prefs").unwrap(), expected);
    assert_eq!(state.get("prefs.font").unwrap(), json!(14));
    assert_eq!(storage.get("brackets:default.prefs").unwrap(), Some(expected));
}

#[test]
fn test_storage_namespace_and_state_name_form_the_key() {
    let storage = MemoryStorage::new();
    let config = RuntimeConfig::from_json_str(r#"{"storage_namespace": "app/"}"#).unwrap();
    let rt = Runtime::with_config(config).with_storage(storage.clone());
    let state = rt
        .reactive_named("user", StateNode::object([("name", persisted("anon").into())]))
        .unwrap();
    state.set("name", "Ada").unwrap();
    assert_eq!(storage.keys(), vec!["app/user.name"]);
}

#[test]
fn test_persisted_value_cannot_be_attached_twice() {
    let rt = Runtime::new();
    let value = persisted(1);
    let state = rt
        .reactive(StateNode::object([("a", value.clone().into())]))
        .unwrap();
    assert_eq!(value.location().as_deref(), Some("default.a"));
    assert!(state.set("b", value).is_err());
}

// ══════════════════════════════════════════════════════════════════════════════
// Storage backends
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_memory_storage_clones_share_entries() {
    let storage = MemoryStorage::new();
    let clone = storage.clone();
    clone.set("k", &json!([1])).unwrap();
    assert_eq!(storage.get("k").unwrap(), Some(json!([1])));
    storage.remove("k").unwrap();
    assert!(clone.is_empty());
}

#[test]
fn test_json_file_storage_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("state.json");
    let storage = JsonFileStorage::new(&file);

    assert_eq!(storage.get("missing").unwrap(), None);
    storage.set("a", &json!({"x": 1})).unwrap();
    storage.set("b", &json!("two")).unwrap();
    storage.remove("b").unwrap();

    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(on_disk, json!({"a": {"x": 1}}));
    assert_eq!(JsonFileStorage::new(&file).get("a").unwrap(), Some(json!({"x": 1})));
}

#[test]
fn test_json_file_storage_rehydrates_a_new_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("prefs.json");

    let first = Runtime::new().with_storage(JsonFileStorage::new(&file));
    settings(&first, json!("light")).set("theme", "dark").unwrap();

    let second = Runtime::new().with_storage(JsonFileStorage::new(&file));
    let state = settings(&second, json!("light"));
    second.run_until_idle().unwrap();
    assert_eq!(state.get("theme").unwrap(), json!("dark"));
}

#[test]
fn test_json_file_storage_rejects_non_object_documents() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "[1, 2]").unwrap();
    let storage = JsonFileStorage::new(file.path());
    assert!(matches!(
        storage.get("a"),
        Err(StorageError::NotAnObject(_))
    ));
}

#[test]
fn test_unreadable_storage_keeps_default() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "not json").unwrap();

    let rt = Runtime::new().with_storage(JsonFileStorage::new(file.path()));
    let state = settings(&rt, json!("light"));
    rt.run_until_idle().unwrap();
    assert_eq!(state.get("theme").unwrap(), json!("light"));
}
