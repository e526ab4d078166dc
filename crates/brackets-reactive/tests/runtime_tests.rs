//! Runtime tests: state access, dependency tracking, batched flushes,
//! render isolation, bindings, observers and reset.

use brackets_reactive::{
    computed, ComputedValue, ReactiveError, Read, RecordingSink, Runtime, RuntimeConfig,
    SinkEvent, StateNode, TemplateId,
};
use brackets_types::program::{Fragment, Instr};
use serde_json::{json, Value};
use std::cell::Cell;
use std::rc::Rc;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn runtime() -> (Runtime, RecordingSink) {
    let sink = RecordingSink::new();
    (Runtime::new().with_sink(sink.clone()), sink)
}

/// Ids of element templates rendered since the last `clear`, in order.
fn rendered(sink: &RecordingSink) -> Vec<TemplateId> {
    sink.events()
        .into_iter()
        .filter_map(|event| match event {
            SinkEvent::Rendered { id, .. } => Some(id),
            _ => None,
        })
        .collect()
}

fn counter() -> (Rc<Cell<usize>>, impl Fn(&Runtime) + 'static) {
    let calls = Rc::new(Cell::new(0));
    let inner = calls.clone();
    (calls, move |_: &Runtime| inner.set(inner.get() + 1))
}

fn watch(key: &'static str) -> impl Fn(&Runtime) -> Vec<Value> + 'static {
    move |rt: &Runtime| vec![rt.plain_state("default").unwrap()[key].clone()]
}

// ══════════════════════════════════════════════════════════════════════════════
// Dependency tracking and flushes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_attach_renders_immediately() {
    let (rt, sink) = runtime();
    rt.reactive(json!({"count": 0})).unwrap();
    let id = rt.attach_element("default", 0, "<b>{{ count }}</b>").unwrap();
    assert_eq!(sink.last_text(id).as_deref(), Some("<b>0 </b>"));
}

#[test]
fn test_scenario_write_renders_only_subscribers() {
    let (rt, sink) = runtime();
    let state = rt.reactive(json!({"count": 0, "name": "x"})).unwrap();
    let count = rt.attach_element("default", 0, "{{ count }}").unwrap();
    let _name = rt.attach_element("default", 0, "{{ name }}").unwrap();
    sink.clear();

    state.set("count", json!(5)).unwrap();
    assert!(sink.events().is_empty(), "writes are deferred until a tick");
    assert!(rt.has_pending());

    rt.run_until_idle().unwrap();
    assert_eq!(rendered(&sink), vec![count]);
    assert_eq!(sink.last_text(count).as_deref(), Some("5 "));
}

#[test]
fn test_subscribers_follow_template_variables() {
    let (rt, _) = runtime();
    rt.reactive(json!({"a": {"b": 1}, "c": 2})).unwrap();
    let id = rt.attach_element("default", 0, "{{ a.b }}{{ c }}").unwrap();

    assert_eq!(rt.subscribers("default", "a"), vec![id]);
    assert_eq!(rt.subscribers("default", "c"), vec![id]);
    assert!(rt.subscribers("default", "b").is_empty());
    assert_eq!(rt.template(id).unwrap().dependencies(), vec!["a", "c"]);
}

#[test]
fn test_renders_deepest_first() {
    let (rt, sink) = runtime();
    let state = rt.reactive(json!({"count": 0})).unwrap();
    let outer = rt.attach_element("default", 0, "{{ count }}").unwrap();
    let inner = rt.attach_element("default", 2, "{{ count }}").unwrap();
    let middle = rt.attach_element("default", 1, "{{ count }}").unwrap();
    sink.clear();

    state.set("count", json!(1)).unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(rendered(&sink), vec![inner, middle, outer]);
}

#[test]
fn test_equal_depths_keep_subscription_order() {
    let (rt, sink) = runtime();
    let state = rt.reactive(json!({"a": 0, "b": 0})).unwrap();
    let first = rt.attach_element("default", 1, "{{ b }}").unwrap();
    let second = rt.attach_element("default", 1, "{{ a }}").unwrap();
    sink.clear();

    state.set("a", json!(1)).unwrap();
    state.set("b", json!(1)).unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(rendered(&sink), vec![second, first]);
}

#[test]
fn test_writes_in_one_tick_render_each_template_once() {
    let (rt, sink) = runtime();
    let state = rt
        .reactive(json!({"user": {"first": "a", "last": "b"}, "count": 0}))
        .unwrap();
    let both = rt
        .attach_element("default", 0, "{{ user.first }} {{ count }}")
        .unwrap();
    let user = rt.attach_element("default", 1, "{{ user.last }}").unwrap();
    sink.clear();

    state.set("user.first", "x").unwrap();
    state.set("user.last", "y").unwrap();
    state.set("count", json!(3)).unwrap();
    state.set("count", json!(4)).unwrap();

    assert_eq!(rt.tick(), 1, "one flush task for every write");
    assert_eq!(rendered(&sink), vec![user, both]);
    assert_eq!(sink.last_text(both).as_deref(), Some("x  4 "));
    assert!(!rt.has_pending());
}

#[test]
fn test_nested_write_coarsens_to_root_key() {
    let (rt, sink) = runtime();
    let state = rt.reactive(json!({"todos": [{"title": "a"}]})).unwrap();
    let id = rt.attach_element("default", 0, "{{ todos.length }}").unwrap();
    sink.clear();

    state.set("todos[0].title", "b").unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(rendered(&sink), vec![id]);
    assert_eq!(state.get("todos[0].title").unwrap(), json!("b"));
}

#[test]
fn test_loop_item_named_like_its_state_key_still_subscribes() {
    let (rt, sink) = runtime();
    let state = rt.reactive(json!({"item": {"list": [1, 2]}})).unwrap();
    let id = rt
        .attach_element("default", 0, "{{#for item of item.list}}{{ item }}{{/for}}")
        .unwrap();
    assert_eq!(rt.subscribers("default", "item"), vec![id]);
    assert_eq!(sink.last_text(id).as_deref(), Some("1 2 "));

    state.push("item.list", json!(3)).unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(sink.last_text(id).as_deref(), Some("1 2 3 "));
}

#[test]
fn test_write_far_past_array_end_is_an_invalid_path() {
    let (rt, _sink) = runtime();
    let state = rt.reactive(json!({"xs": [1]})).unwrap();

    let err = state.set("xs[18446744073709551615]", json!(1)).unwrap_err();
    assert!(matches!(err, ReactiveError::InvalidPath { .. }), "{err}");
    assert!(state.set("xs[100000000000]", json!(1)).is_err());
    assert_eq!(state.get("xs").unwrap(), json!([1]));
    assert!(!rt.has_pending());

    state.set("xs[3]", json!(4)).unwrap();
    assert_eq!(state.get("xs").unwrap(), json!([1, null, null, 4]));
}

#[test]
fn test_push_and_update() {
    let (rt, sink) = runtime();
    let state = rt.reactive(json!({"todos": [], "count": 1})).unwrap();
    let id = rt
        .attach_element("default", 0, "{{#for t of todos}}{{ t }}{{/for}}")
        .unwrap();

    state.push("todos", "milk").unwrap();
    state.push("todos", "eggs").unwrap();
    state.update("count", |n| json!(n.as_i64().unwrap_or(0) + 1)).unwrap();
    rt.run_until_idle().unwrap();

    assert_eq!(sink.last_text(id).as_deref(), Some("milk eggs "));
    assert_eq!(state.get("count").unwrap(), json!(2));
    assert!(matches!(
        state.push("count", json!(1)),
        Err(ReactiveError::InvalidPath { .. })
    ));
}

#[test]
fn test_template_attached_before_state_renders_on_creation() {
    let (rt, sink) = runtime();
    let id = rt.attach_element("later", 0, "{{ x }}").unwrap();
    assert!(sink.events().is_empty());

    rt.reactive_named("later", json!({"x": 7})).unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(sink.last_text(id).as_deref(), Some("7 "));
}

#[test]
fn test_compile_error_registers_nothing() {
    let (rt, _) = runtime();
    rt.reactive(json!({"a": 1})).unwrap();
    let err = rt.attach_element("default", 0, "{{#if a}}open").unwrap_err();
    assert!(matches!(err, ReactiveError::Compile(_)));
    assert!(rt.subscribers("default", "a").is_empty());
}

#[test]
fn test_render_error_does_not_block_siblings() {
    let (rt, sink) = runtime();
    let state = rt.reactive(json!({"count": 0})).unwrap();
    let broken = rt
        .attach_element("default", 1, "{{ count }}{{ nope }}")
        .unwrap();
    let ok = rt.attach_element("default", 0, "{{ count }}").unwrap();
    sink.clear();

    state.set("count", json!(1)).unwrap();
    rt.run_until_idle().unwrap();

    let events = sink.events();
    assert!(matches!(&events[0], SinkEvent::Failed { id, .. } if *id == broken));
    assert_eq!(sink.last_text(ok).as_deref(), Some("1 "));
}

#[test]
fn test_detach_removes_subscriptions() {
    let (rt, sink) = runtime();
    let state = rt.reactive(json!({"count": 0})).unwrap();
    let id = rt.attach_element("default", 0, "{{ count }}").unwrap();

    assert!(rt.detach(id));
    assert!(!rt.detach(id));
    assert!(rt.subscribers("default", "count").is_empty());
    assert!(matches!(rt.render(id), Err(ReactiveError::UnknownTemplate(_))));

    sink.clear();
    state.set("count", json!(1)).unwrap();
    rt.run_until_idle().unwrap();
    assert!(sink.events().is_empty());
}

#[test]
fn test_compiled_templates_are_cached_by_source() {
    let (rt, _) = runtime();
    rt.reactive(json!({"a": 1})).unwrap();
    let first = rt.attach_element("default", 0, "{{ a }}").unwrap();
    let second = rt.attach_element("default", 0, "{{ a }}").unwrap();

    let program = |id| match rt.template(id).unwrap().kind {
        brackets_reactive::TemplateKind::Element(template) => template,
        other => panic!("expected element, got {other:?}"),
    };
    assert!(Rc::ptr_eq(&program(first), &program(second)));
}

#[test]
fn test_custom_command_through_runtime() {
    let (rt, sink) = runtime();
    rt.command(
        "shout",
        |_, block, generator, _| {
            let mut fragment = Fragment::new();
            fragment.push(Instr::Text("!".into()));
            fragment.append(generator.generate(&block.children)?);
            Ok(fragment)
        },
        Vec::<String>::new(),
    )
    .unwrap();
    rt.reactive(json!({"a": "hi"})).unwrap();
    let id = rt
        .attach_element("default", 0, "{{#shout}}{{ a }}{{/shout}}")
        .unwrap();
    assert_eq!(sink.last_text(id).as_deref(), Some("!hi "));

    let err = rt
        .command("if", |_, _, _, _| Ok(Fragment::new()), Vec::<String>::new())
        .unwrap_err();
    assert!(matches!(err, ReactiveError::Registration(_)));
}

// ══════════════════════════════════════════════════════════════════════════════
// State access
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_reactive_is_idempotent_by_name() {
    let (rt, _) = runtime();
    rt.reactive_named("s", json!({"a": 1})).unwrap();
    let again = rt.reactive_named("s", json!({"a": 2})).unwrap();
    assert_eq!(again.get("a").unwrap(), json!(1));
    assert_eq!(rt.state("s").unwrap().get("a").unwrap(), json!(1));
}

#[test]
fn test_initial_state_must_be_an_object() {
    let (rt, _) = runtime();
    assert!(matches!(
        rt.reactive(json!([1, 2])),
        Err(ReactiveError::InvalidInitialState(_))
    ));
}

#[test]
fn test_plain_state_of_unknown_name() {
    let (rt, _) = runtime();
    let err = rt.plain_state("ghost").unwrap_err();
    assert!(matches!(err, ReactiveError::InvalidStateReference(ref name) if name == "ghost"));
    assert_eq!(err.to_string(), "Invalid state: ghost");
}

#[test]
fn test_meta_keys() {
    let (rt, _) = runtime();
    let state = rt.reactive_named("app", json!({"a": 1})).unwrap();
    assert_eq!(state.get("$stateName").unwrap(), json!("app"));
    assert_eq!(state.get("$raw").unwrap(), json!({"a": 1}));
    assert!(matches!(
        state.set("$raw", json!({})),
        Err(ReactiveError::ReservedKey(_))
    ));
}

#[test]
fn test_read_classifies_slots() {
    let (rt, _) = runtime();
    let state = rt
        .reactive(StateNode::object([
            ("user", StateNode::from(json!({"name": "Ada"}))),
            ("n", StateNode::from(json!(2))),
            ("twice", computed(|s| json!(s["n"].as_i64().unwrap_or(0) * 2)).into()),
        ]))
        .unwrap();

    let Read::Nested(user) = state.read("user").unwrap() else {
        panic!("expected a nested handle");
    };
    assert_eq!(user.key("name").get().unwrap(), json!("Ada"));
    assert!(matches!(state.read("twice").unwrap(), Read::Smart(v) if v == json!(4)));
    assert!(matches!(state.read("n").unwrap(), Read::Raw(v) if v == json!(2)));
    assert!(matches!(state.read("missing").unwrap(), Read::Raw(Value::Null)));
    assert!(matches!(state.read("$stateName").unwrap(), Read::Meta(_)));
}

#[test]
fn test_state_ref_writes_nested_values() {
    let (rt, sink) = runtime();
    let state = rt.reactive(json!({"user": {"name": "a"}})).unwrap();
    let id = rt.attach_element("default", 0, "{{ user.name }}").unwrap();

    let user = state.entry("user").unwrap();
    user.key("name").set("b").unwrap();
    user.at("tags").unwrap().set(json!([])).unwrap();
    user.key("tags").push("x").unwrap();
    rt.run_until_idle().unwrap();

    assert_eq!(sink.last_text(id).as_deref(), Some("b "));
    assert_eq!(
        state.unwrap().unwrap(),
        json!({"user": {"name": "b", "tags": ["x"]}})
    );
    assert_eq!(user.path().to_string(), "user");
}

#[test]
fn test_writes_into_missing_parents_fail() {
    let (rt, _) = runtime();
    let state = rt.reactive(json!({"n": 1})).unwrap();
    assert!(matches!(
        state.set("missing.x", json!(1)),
        Err(ReactiveError::InvalidPath { .. })
    ));
    assert!(matches!(
        state.set("n.x", json!(1)),
        Err(ReactiveError::InvalidPath { .. })
    ));
    assert!(matches!(
        rt.state("nope").unwrap().set("a..b", json!(1)),
        Err(ReactiveError::InvalidPath { .. })
    ));
}

// ══════════════════════════════════════════════════════════════════════════════
// Computed values
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_scenario_computed_double() {
    let (rt, sink) = runtime();
    let state = rt
        .reactive(StateNode::object([
            ("count", StateNode::from(json!(0))),
            ("double", computed(|s| json!(s["count"].as_i64().unwrap_or(0) * 2)).into()),
        ]))
        .unwrap();
    assert_eq!(state.get("double").unwrap(), json!(0));

    let id = rt.attach_element("default", 0, "{{ double }}").unwrap();
    state.set("count", json!(10)).unwrap();
    rt.run_until_idle().unwrap();

    assert_eq!(state.get("double").unwrap(), json!(20));
    assert_eq!(sink.last_text(id).as_deref(), Some("20 "));
}

#[test]
fn test_computed_slot_rejects_writes() {
    let (rt, _) = runtime();
    let state = rt
        .reactive(StateNode::object([
            ("n", StateNode::from(json!(1))),
            ("derived", computed(|s| json!({"n": s["n"].clone()})).into()),
        ]))
        .unwrap();

    let err = state.set("derived", json!(5)).unwrap_err();
    assert!(matches!(err, ReactiveError::ComputedWrite { .. }));
    assert!(err.to_string().starts_with("Cannot change the value of a computed state"));
    assert!(matches!(
        state.set("derived.n", json!(5)),
        Err(ReactiveError::ComputedWrite { .. })
    ));
    assert!(matches!(
        state.set("derived", computed(|_| Value::Null)),
        Err(ReactiveError::ComputedWrite { .. })
    ));
}

#[test]
fn test_computed_from_expression() {
    let (rt, _) = runtime();
    let state = rt
        .reactive(StateNode::object([
            ("todos", StateNode::from(json!(["a"]))),
            (
                "summary",
                ComputedValue::from_expression("`${todos.length} left`")
                    .unwrap()
                    .into(),
            ),
        ]))
        .unwrap();
    assert_eq!(state.get("summary").unwrap(), json!("1 left"));

    state.push("todos", "b").unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(state.get("summary").unwrap(), json!("2 left"));
}

#[test]
fn test_computed_assigned_after_creation() {
    let (rt, _) = runtime();
    let state = rt.reactive(json!({"n": 3})).unwrap();
    let square = computed(|s| {
        let n = s["n"].as_i64().unwrap_or(0);
        json!(n * n)
    });
    state.set("square", square.clone()).unwrap();
    assert_eq!(state.get("square").unwrap(), json!(9));
    assert_eq!(square.location().as_deref(), Some("default.square"));

    assert!(matches!(
        state.set("again", square),
        Err(ReactiveError::AlreadyBound(_))
    ));
}

#[test]
fn test_computed_chain_settles() {
    let (rt, _) = runtime();
    let state = rt
        .reactive(StateNode::object([
            ("n", StateNode::from(json!(1))),
            ("plus_one", computed(|s| json!(s["n"].as_i64().unwrap_or(0) + 1)).into()),
            (
                "doubled",
                computed(|s| json!(s["plus_one"].as_i64().unwrap_or(0) * 2)).into(),
            ),
        ]))
        .unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(state.get("doubled").unwrap(), json!(4));

    state.set("n", json!(5)).unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(state.get("plus_one").unwrap(), json!(6));
    assert_eq!(state.get("doubled").unwrap(), json!(12));
}

#[test]
fn test_failing_computed_keeps_last_value() {
    let (rt, _) = runtime();
    let state = rt
        .reactive(StateNode::object([
            ("n", StateNode::from(json!(1))),
            (
                "checked",
                ComputedValue::try_new(|s| match s["n"].as_i64() {
                    Some(n) if n >= 0 => Ok(json!(n)),
                    _ => Err(ReactiveError::InvalidStateReference("negative".into())),
                })
                .into(),
            ),
            ("copy", computed(|s| s["n"].clone()).into()),
        ]))
        .unwrap();

    state.set("n", json!(-1)).unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(state.get("checked").unwrap(), json!(1));
    assert_eq!(state.get("copy").unwrap(), json!(-1));
}

// ══════════════════════════════════════════════════════════════════════════════
// Bindings
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_binding_mirrors_and_writes_back() {
    let (rt, sink) = runtime();
    let state = rt.reactive(json!({"form": {"email": ""}})).unwrap();
    let label = rt.attach_element("default", 0, "{{ form.email }}").unwrap();
    let input = rt.attach_binding("default", 1, "form.email").unwrap();
    assert_eq!(
        sink.events().last(),
        Some(&SinkEvent::Binding {
            id: input,
            value: json!("")
        })
    );
    sink.clear();

    rt.input(input, json!("a@b.c")).unwrap();
    assert_eq!(state.get("form.email").unwrap(), json!("a@b.c"));
    rt.run_until_idle().unwrap();

    assert_eq!(
        sink.events(),
        vec![
            SinkEvent::Binding {
                id: input,
                value: json!("a@b.c")
            },
            SinkEvent::Rendered {
                id: label,
                text: "a@b.c ".to_string()
            },
        ]
    );
    assert!(rt.template(input).unwrap().is_binding());
}

#[test]
fn test_input_errors() {
    let (rt, _) = runtime();
    rt.reactive(json!({"a": 1})).unwrap();
    let element = rt.attach_element("default", 0, "{{ a }}").unwrap();
    assert!(matches!(
        rt.input(element, json!(2)),
        Err(ReactiveError::NotABinding(_))
    ));
    rt.detach(element);
    assert!(matches!(
        rt.input(element, json!(2)),
        Err(ReactiveError::UnknownTemplate(_))
    ));
}

// ══════════════════════════════════════════════════════════════════════════════
// Observers
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_observer_with_initial_call() {
    let (rt, _) = runtime();
    let state = rt.reactive(json!({"count": 0, "other": 0})).unwrap();
    let (calls, callback) = counter();
    rt.observe(callback, watch("count"), true);
    assert_eq!(calls.get(), 1);

    state.set("other", json!(1)).unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(calls.get(), 1, "unchanged values do not fire");

    state.set("count", json!(1)).unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_observer_without_initial_call_fires_on_first_flush() {
    let (rt, _) = runtime();
    let state = rt.reactive(json!({"count": 0, "other": 0})).unwrap();
    let (calls, callback) = counter();
    rt.observe(callback, watch("count"), false);
    assert_eq!(calls.get(), 0);

    state.set("other", json!(1)).unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(calls.get(), 1);

    state.set("other", json!(2)).unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_observer_compares_containers_structurally() {
    let (rt, _) = runtime();
    let state = rt.reactive(json!({"list": [1, 2]})).unwrap();
    let (calls, callback) = counter();
    rt.observe(callback, watch("list"), true);

    state.set("list", json!([1, 2])).unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(calls.get(), 1);

    state.push("list", json!(3)).unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_observer_writes_cascade_into_next_flush() {
    let (rt, _) = runtime();
    let state = rt.reactive(json!({"count": 0, "log": []})).unwrap();
    rt.observe(
        |rt: &Runtime| {
            let count = rt.plain_state("default").unwrap()["count"].clone();
            rt.state("default").unwrap().push("log", count).unwrap();
        },
        watch("count"),
        false,
    );

    state.set("count", json!(1)).unwrap();
    let rounds = rt.run_until_idle().unwrap();
    assert!(rounds >= 2);
    assert_eq!(state.get("log").unwrap(), json!([1]));
}

#[test]
fn test_runaway_cascade_is_bounded() {
    let rt = Runtime::with_config(RuntimeConfig {
        max_cascade: 5,
        ..RuntimeConfig::default()
    });
    let state = rt.reactive(json!({"n": 0})).unwrap();
    rt.observe(
        |rt: &Runtime| {
            rt.state("default")
                .unwrap()
                .update("n", |n| json!(n.as_i64().unwrap_or(0) + 1))
                .unwrap();
        },
        watch("n"),
        false,
    );

    state.set("n", json!(1)).unwrap();
    assert!(matches!(
        rt.run_until_idle(),
        Err(ReactiveError::CascadeLimit(5))
    ));
}

// ══════════════════════════════════════════════════════════════════════════════
// Reset
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_reset_clears_registries_but_keeps_commands() {
    let (rt, sink) = runtime();
    rt.command(
        "raw",
        |_, block, generator, _| generator.generate(&block.children),
        Vec::<String>::new(),
    )
    .unwrap();
    let state = rt.reactive(json!({"a": 1})).unwrap();
    rt.attach_element("default", 0, "{{ a }}").unwrap();
    let (calls, callback) = counter();
    rt.observe(callback, |_: &Runtime| vec![Value::Null], false);
    state.set("a", json!(2)).unwrap();

    rt.reset();
    assert!(!rt.has_pending());
    assert!(!rt.has_state("default"));
    assert!(rt.subscribers("default", "a").is_empty());
    assert!(matches!(
        rt.plain_state("default"),
        Err(ReactiveError::InvalidStateReference(_))
    ));

    rt.reactive(json!({"a": 3})).unwrap();
    sink.clear();
    let id = rt
        .attach_element("default", 0, "{{#raw}}{{ a }}{{/raw}}")
        .unwrap();
    rt.run_until_idle().unwrap();
    assert_eq!(sink.last_text(id).as_deref(), Some("3 "));
    assert_eq!(calls.get(), 0);
}
