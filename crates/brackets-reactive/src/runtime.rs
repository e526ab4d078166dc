//! The runtime context: every registry, the scheduler and the flush.

use crate::computed::ComputedValue;
use crate::config::RuntimeConfig;
use crate::error::{ReactiveError, ReactiveResult};
use crate::graph::DependencyGraph;
use crate::node::{write_value, StateNode};
use crate::observer::Observer;
use crate::path::Path;
use crate::persisted::PersistedValue;
use crate::scheduler::{Scheduler, Task};
use crate::sink::{NullSink, RenderSink};
use crate::smart::{Binding, SmartValue};
use crate::state::ReactiveState;
use crate::storage::{MemoryStorage, Storage};
use crate::template::{TemplateId, TemplateKind, TemplateRecord};
use brackets_codegen::{CodegenResult, Command, Generator};
use brackets_compiler::{source_hash, CompiledTemplate, Compiler};
use brackets_types::ast::BlockNode;
use brackets_types::program::Fragment;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Reactive runtime handle. Clones share the same registries.
///
/// Single-threaded. Writes are batched: they only record which root keys
/// changed, and the work happens when [`tick`](Self::tick) or
/// [`run_until_idle`](Self::run_until_idle) runs the queued tasks.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RefCell<Inner>>,
}

pub(crate) struct Inner {
    config: RuntimeConfig,
    compiler: Compiler,
    storage: Rc<dyn Storage>,
    sink: Rc<dyn RenderSink>,
    states: IndexMap<String, StateNode>,
    templates: IndexMap<TemplateId, TemplateRecord>,
    graph: DependencyGraph,
    scheduler: Scheduler,
    computed: Vec<ComputedValue>,
    observers: Vec<Rc<Observer>>,
    compile_cache: HashMap<String, Rc<CompiledTemplate>>,
    next_template_id: u64,
}

/// What a path currently holds, for the state accessors.
pub(crate) enum Slot {
    Smart(Value),
    Container(Value),
    Plain(Value),
}

enum RenderJob {
    Element(Rc<CompiledTemplate>, Value),
    Binding(Value),
}

enum WritePlan {
    /// The path runs through a persisted value; update it via its setter.
    Forward(PersistedValue, Path, Value),
    Stored(Vec<ComputedValue>),
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let compiler = Compiler::with_options(config.compile.clone());
        Self {
            inner: Rc::new(RefCell::new(Inner {
                config,
                compiler,
                storage: Rc::new(MemoryStorage::new()),
                sink: Rc::new(NullSink),
                states: IndexMap::new(),
                templates: IndexMap::new(),
                graph: DependencyGraph::default(),
                scheduler: Scheduler::default(),
                computed: Vec::new(),
                observers: Vec::new(),
                compile_cache: HashMap::new(),
                next_template_id: 0,
            })),
        }
    }

    pub fn with_storage(self, storage: impl Storage + 'static) -> Self {
        self.inner.borrow_mut().storage = Rc::new(storage);
        self
    }

    pub fn with_sink(self, sink: impl RenderSink + 'static) -> Self {
        self.inner.borrow_mut().sink = Rc::new(sink);
        self
    }

    pub fn config(&self) -> RuntimeConfig {
        self.inner.borrow().config.clone()
    }

    pub(crate) fn from_weak(weak: &Weak<RefCell<Inner>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn storage(&self) -> Rc<dyn Storage> {
        self.inner.borrow().storage.clone()
    }

    pub(crate) fn storage_key(&self, state: &str, path: &Path) -> String {
        format!("{}{state}.{path}", self.inner.borrow().config.storage_namespace)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Commands
    // ══════════════════════════════════════════════════════════════════════

    /// Register a block command with the runtime's compiler.
    pub fn command<F, I, S>(&self, name: &str, handler: F, chain_names: I) -> ReactiveResult<()>
    where
        F: Fn(&str, &BlockNode, &mut Generator<'_>, &[BlockNode]) -> CodegenResult<Fragment>
            + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner
            .borrow_mut()
            .compiler
            .command(name, handler, chain_names)?;
        Ok(())
    }

    pub fn register(&self, command: Command) -> ReactiveResult<()> {
        self.inner.borrow_mut().compiler.register(command)?;
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // States
    // ══════════════════════════════════════════════════════════════════════

    /// The default state, created from `initial` on first use.
    pub fn reactive(&self, initial: impl Into<StateNode>) -> ReactiveResult<ReactiveState> {
        let name = self.inner.borrow().config.default_state_name.clone();
        self.reactive_named(&name, initial)
    }

    /// The state called `name`, created from `initial` on first use. An
    /// existing state is returned as is and `initial` is ignored.
    pub fn reactive_named(
        &self,
        name: &str,
        initial: impl Into<StateNode>,
    ) -> ReactiveResult<ReactiveState> {
        if self.has_state(name) {
            tracing::debug!(state = name, "state already registered");
            return Ok(ReactiveState::new(self.clone(), name));
        }

        let root = initial.into().normalized();
        if !matches!(root, StateNode::Object(_)) {
            return Err(ReactiveError::InvalidInitialState(name.to_string()));
        }
        let smart = root.smart_values();
        reject_bound(&smart)?;

        let weak = Rc::downgrade(&self.inner);
        let new_computed = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let mut new_computed = Vec::new();
            for (path, value) in smart {
                inner.attach_smart(&weak, name, path, value, &mut new_computed)?;
            }
            inner.states.insert(name.to_string(), root);
            // Templates attached before the state existed render now.
            for key in inner.graph.keys(name) {
                inner.scheduler.enqueue(name, &key);
            }
            new_computed
        };
        self.compute_attached(&new_computed);

        tracing::debug!(state = name, "state registered");
        Ok(ReactiveState::new(self.clone(), name))
    }

    /// The state called `name`, created empty if missing.
    pub fn state(&self, name: &str) -> ReactiveResult<ReactiveState> {
        self.reactive_named(name, StateNode::Object(IndexMap::new()))
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.inner.borrow().states.contains_key(name)
    }

    /// Unwrapped snapshot of a registered state.
    pub fn plain_state(&self, name: &str) -> ReactiveResult<Value> {
        self.inner
            .borrow()
            .states
            .get(name)
            .map(StateNode::to_value)
            .ok_or_else(|| ReactiveError::InvalidStateReference(name.to_string()))
    }

    pub(crate) fn slot(&self, state: &str, path: &Path) -> ReactiveResult<Slot> {
        let inner = self.inner.borrow();
        let root = inner
            .states
            .get(state)
            .ok_or_else(|| ReactiveError::InvalidStateReference(state.to_string()))?;
        Ok(match root.get(path.segments()) {
            Some(node @ (StateNode::Computed(_) | StateNode::Persisted(_))) => {
                Slot::Smart(node.to_value())
            }
            Some(node @ (StateNode::Object(_) | StateNode::Array(_))) => {
                Slot::Container(node.to_value())
            }
            Some(StateNode::Value(value)) => Slot::Plain(value.clone()),
            None => Slot::Plain(root.read(path.segments()).unwrap_or(Value::Null)),
        })
    }

    /// Store `node` at `path` and raise a change for its root key.
    pub(crate) fn write(&self, state: &str, path: &Path, node: StateNode) -> ReactiveResult<()> {
        let root_key = path
            .root_key()
            .ok_or_else(|| ReactiveError::invalid_path(path.to_string(), "path must start with a key"))?
            .to_string();
        let node = node.normalized();
        let incoming = node.smart_values();
        reject_bound(&incoming)?;

        let weak = Rc::downgrade(&self.inner);
        let plan = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let root = inner
                .states
                .get_mut(state)
                .ok_or_else(|| ReactiveError::InvalidStateReference(state.to_string()))?;

            match root.smart_on_path(path.segments()) {
                Some((_, SmartValue::Computed(_))) => {
                    return Err(ReactiveError::ComputedWrite {
                        state: state.to_string(),
                        path: path.to_string(),
                    });
                }
                Some((consumed, SmartValue::Persisted(target)))
                    if consumed < path.len() || !node.is_smart() =>
                {
                    let rest = Path::from(path.segments()[consumed..].to_vec());
                    WritePlan::Forward(target, rest, node.to_value())
                }
                _ => {
                    let replaced = root
                        .insert(path.segments(), node)
                        .map_err(|reason| ReactiveError::invalid_path(path.to_string(), reason))?;
                    if let Some(old) = replaced {
                        inner.forget_smart(&old);
                    }
                    let mut new_computed = Vec::new();
                    for (relative, value) in incoming {
                        inner.attach_smart(&weak, state, path.join(&relative), value, &mut new_computed)?;
                    }
                    inner.scheduler.enqueue(state, &root_key);
                    WritePlan::Stored(new_computed)
                }
            }
        };

        match plan {
            WritePlan::Forward(target, rest, value) => {
                if rest.is_empty() {
                    target.set(value)
                } else {
                    let mut whole = target.get();
                    write_value(&mut whole, rest.segments(), value)
                        .map_err(|reason| ReactiveError::invalid_path(path.to_string(), reason))?;
                    target.set(whole)
                }
            }
            WritePlan::Stored(new_computed) => {
                self.compute_attached(&new_computed);
                Ok(())
            }
        }
    }

    /// Raise a change for the root key of `path`.
    pub(crate) fn notify(&self, state: &str, path: &Path) {
        let Some(key) = path.root_key() else {
            return;
        };
        if self.inner.borrow_mut().scheduler.enqueue(state, key) {
            tracing::debug!(state, key, "flush scheduled");
        }
    }

    /// First computation of newly attached computed values, once the tree
    /// holding them is in place.
    fn compute_attached(&self, values: &[ComputedValue]) {
        for value in values {
            if let Err(err) = value.refresh(self) {
                tracing::error!(slot = ?value.location(), error = %err, "computed value failed");
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Templates
    // ══════════════════════════════════════════════════════════════════════

    /// Compile `text`, subscribe it to every root variable it reads in
    /// `state`, and render it once. A template that fails to compile is not
    /// registered.
    pub fn attach_element(&self, state: &str, depth: u32, text: &str) -> ReactiveResult<TemplateId> {
        let template = self.compile_cached(text)?;
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.allocate_id();
            for key in template.variables() {
                inner.graph.subscribe(state, key, id);
            }
            inner.templates.insert(
                id,
                TemplateRecord {
                    kind: TemplateKind::Element(template),
                    state: state.to_string(),
                    depth,
                },
            );
            id
        };
        tracing::debug!(template = %id, state, depth, "element attached");
        self.render_isolated(id);
        Ok(id)
    }

    /// Bind the value at `path` to an input: the sink receives the value on
    /// every change, and [`input`](Self::input) writes back to it.
    pub fn attach_binding(&self, state: &str, depth: u32, path: &str) -> ReactiveResult<TemplateId> {
        let path = Path::parse(path)?;
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.allocate_id();
            if let Some(key) = path.root_key() {
                inner.graph.subscribe(state, key, id);
            }
            inner.templates.insert(
                id,
                TemplateRecord {
                    kind: TemplateKind::Binding(path),
                    state: state.to_string(),
                    depth,
                },
            );
            id
        };
        tracing::debug!(template = %id, state, "binding attached");
        self.render_isolated(id);
        Ok(id)
    }

    /// Write an input's new value back to its bound path.
    pub fn input(&self, id: TemplateId, value: Value) -> ReactiveResult<()> {
        let (state, path) = {
            let inner = self.inner.borrow();
            let record = inner
                .templates
                .get(&id)
                .ok_or(ReactiveError::UnknownTemplate(id))?;
            match &record.kind {
                TemplateKind::Binding(path) => (record.state.clone(), path.clone()),
                TemplateKind::Element(_) => return Err(ReactiveError::NotABinding(id)),
            }
        };
        self.write(&state, &path, StateNode::from(value))
    }

    /// Render one template now.
    pub fn render(&self, id: TemplateId) -> ReactiveResult<()> {
        if self.render_isolated(id) {
            Ok(())
        } else {
            Err(ReactiveError::UnknownTemplate(id))
        }
    }

    /// Unregister a template and all of its subscriptions.
    pub fn detach(&self, id: TemplateId) -> bool {
        let mut inner = self.inner.borrow_mut();
        inner.graph.remove(id);
        inner.templates.shift_remove(&id).is_some()
    }

    pub fn template(&self, id: TemplateId) -> Option<TemplateRecord> {
        self.inner.borrow().templates.get(&id).cloned()
    }

    /// Templates subscribed to `state.key`, in subscription order.
    pub fn subscribers(&self, state: &str, key: &str) -> Vec<TemplateId> {
        self.inner.borrow().graph.subscribers(state, key).collect()
    }

    fn compile_cached(&self, text: &str) -> ReactiveResult<Rc<CompiledTemplate>> {
        let hash = source_hash(text);
        let cached = self.inner.borrow().compile_cache.get(&hash).cloned();
        if let Some(template) = cached {
            return Ok(template);
        }
        let compiled = Rc::new(self.inner.borrow().compiler.compile(text)?);
        self.inner
            .borrow_mut()
            .compile_cache
            .insert(hash, compiled.clone());
        Ok(compiled)
    }

    /// Render `id` and hand the result to the sink. A render error is
    /// logged and reported to the sink, never returned. Returns `false`
    /// for an unknown template.
    fn render_isolated(&self, id: TemplateId) -> bool {
        let (job, sink) = {
            let inner = self.inner.borrow();
            let Some(record) = inner.templates.get(&id) else {
                return false;
            };
            let Some(root) = inner.states.get(&record.state) else {
                tracing::debug!(template = %id, state = %record.state, "state not registered, render deferred");
                return true;
            };
            let job = match &record.kind {
                TemplateKind::Element(template) => RenderJob::Element(template.clone(), root.to_value()),
                TemplateKind::Binding(path) => {
                    RenderJob::Binding(root.read(path.segments()).unwrap_or(Value::Null))
                }
            };
            (job, inner.sink.clone())
        };

        match job {
            RenderJob::Element(template, snapshot) => match template.render(&snapshot) {
                Ok(text) => sink.element_rendered(id, &text),
                Err(err) => {
                    tracing::error!(template = %id, error = %err, "template render failed");
                    sink.render_failed(id, &err);
                }
            },
            RenderJob::Binding(value) => sink.binding_updated(id, &value),
        }
        true
    }

    // ══════════════════════════════════════════════════════════════════════
    // Observers
    // ══════════════════════════════════════════════════════════════════════

    /// Run `callback` whenever the tuple returned by `values` changes,
    /// checked after every flush. With `initial_call` the callback runs
    /// immediately and the tuple after it becomes the baseline; otherwise
    /// the first flush fires it.
    ///
    /// Both closures receive the runtime. Capturing a `Runtime` or
    /// `ReactiveState` in them keeps the runtime alive until [`reset`](Self::reset).
    pub fn observe<C, V>(&self, callback: C, values: V, initial_call: bool)
    where
        C: Fn(&Runtime) + 'static,
        V: Fn(&Runtime) -> Vec<Value> + 'static,
    {
        let observer = Rc::new(Observer::new(callback, values));
        self.inner.borrow_mut().observers.push(observer.clone());
        if initial_call {
            observer.fire(self);
            observer.record(self);
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Scheduling
    // ══════════════════════════════════════════════════════════════════════

    /// Run the tasks queued before this call. Returns how many ran.
    pub fn tick(&self) -> usize {
        let tasks = self.inner.borrow_mut().scheduler.take_round();
        let count = tasks.len();
        for task in tasks {
            match task {
                Task::Flush => self.flush(),
                Task::Recompute(value) => {
                    if self.is_registered(&value) {
                        if let Err(err) = value.update() {
                            tracing::error!(slot = ?value.location(), error = %err, "computed value failed");
                        }
                    }
                }
                Task::Hydrate(value) => {
                    if let Err(err) = value.hydrate(self) {
                        tracing::error!(slot = ?value.location(), error = %err, "hydration failed");
                    }
                }
            }
        }
        count
    }

    /// Tick until nothing is queued. Fails with
    /// [`ReactiveError::CascadeLimit`] if work is still queued after
    /// `max_cascade` ticks.
    pub fn run_until_idle(&self) -> ReactiveResult<usize> {
        let limit = self.inner.borrow().config.max_cascade;
        let mut rounds = 0;
        while self.has_pending() {
            if rounds == limit {
                tracing::warn!(limit, "reactivity did not settle");
                return Err(ReactiveError::CascadeLimit(limit));
            }
            self.tick();
            rounds += 1;
        }
        Ok(rounds)
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().scheduler.is_idle()
    }

    /// Drop every state, template, subscription, observer and queued task.
    /// Registered commands and configuration are kept.
    pub fn reset(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.states.clear();
        inner.templates.clear();
        inner.graph.clear();
        inner.scheduler.clear();
        inner.computed.clear();
        inner.observers.clear();
        inner.compile_cache.clear();
        tracing::debug!("runtime reset");
    }

    fn flush(&self) {
        let order = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let pending = inner.scheduler.take_pending();
            let mut ids = IndexSet::new();
            for (state, key) in &pending {
                ids.extend(inner.graph.subscribers(state, key));
            }
            let mut order: Vec<(TemplateId, u32)> = ids
                .into_iter()
                .filter_map(|id| inner.templates.get(&id).map(|record| (id, record.depth)))
                .collect();
            order.sort_by_key(|&(_, depth)| Reverse(depth));
            tracing::debug!(writes = pending.len(), templates = order.len(), "flush");
            order
        };

        for (id, _) in order {
            self.render_isolated(id);
        }

        let computed = self.inner.borrow().computed.clone();
        for value in computed {
            if let Err(err) = value.update() {
                tracing::error!(slot = ?value.location(), error = %err, "computed value failed");
            }
        }

        let observers = self.inner.borrow().observers.clone();
        for observer in observers {
            observer.check(self);
        }
    }

    fn is_registered(&self, value: &ComputedValue) -> bool {
        self.inner
            .borrow()
            .computed
            .iter()
            .any(|registered| registered.ptr_eq(value))
    }
}

impl Inner {
    fn allocate_id(&mut self) -> TemplateId {
        self.next_template_id += 1;
        TemplateId::new(self.next_template_id)
    }

    /// Bind a smart value to `state.path` and queue its deferred setup.
    ///
    /// A computed value is also pushed onto `new_computed` so the caller
    /// evaluates it once right away, giving synchronous readers a real value
    /// before the queued recompute runs. That recompute repeats the
    /// evaluation and notifies only if the result changed.
    fn attach_smart(
        &mut self,
        runtime: &Weak<RefCell<Inner>>,
        state: &str,
        path: Path,
        value: SmartValue,
        new_computed: &mut Vec<ComputedValue>,
    ) -> ReactiveResult<()> {
        value.bind(Binding::new(runtime.clone(), state, path))?;
        match value {
            SmartValue::Computed(computed) => {
                self.computed.push(computed.clone());
                self.scheduler.schedule(Task::Recompute(computed.clone()));
                new_computed.push(computed);
            }
            SmartValue::Persisted(persisted) => {
                self.scheduler.schedule(Task::Hydrate(persisted));
            }
        }
        Ok(())
    }

    /// Stop recomputing computed values that were overwritten.
    fn forget_smart(&mut self, node: &StateNode) {
        for (_, value) in node.smart_values() {
            if let SmartValue::Computed(old) = value {
                self.computed.retain(|registered| !registered.ptr_eq(&old));
            }
        }
    }
}

fn reject_bound(values: &[(Path, SmartValue)]) -> ReactiveResult<()> {
    match values.iter().find(|(_, value)| value.is_bound()) {
        Some((_, value)) => Err(ReactiveError::AlreadyBound(
            value.location().unwrap_or_default(),
        )),
        None => Ok(()),
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Runtime")
                .field("states", &inner.states.keys().collect::<Vec<_>>())
                .field("templates", &inner.templates.len())
                .field("observers", &inner.observers.len())
                .field("idle", &inner.scheduler.is_idle())
                .finish(),
            Err(_) => f.write_str("Runtime { <busy> }"),
        }
    }
}
