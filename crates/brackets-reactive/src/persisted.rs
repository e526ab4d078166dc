//! Durable state slots backed by the runtime's [`Storage`](crate::Storage).

use crate::error::{ReactiveError, ReactiveResult};
use crate::runtime::Runtime;
use crate::smart::Binding;
use serde_json::Value;
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

/// A slot whose value survives the runtime through a storage backend.
///
/// Until hydration runs (one tick after attachment) the slot reads as its
/// default. Hydration loads the stored value for `state.path`, falling back
/// to the default when nothing is stored. Writes through the state or
/// [`set`](Self::set) persist first, then notify subscribers.
#[derive(Clone)]
pub struct PersistedValue {
    inner: Rc<PersistedInner>,
}

struct PersistedInner {
    default: Value,
    value: RefCell<Value>,
    hydrated: Cell<bool>,
    binding: OnceCell<Binding>,
}

impl PersistedValue {
    pub fn new(default: impl Into<Value>) -> Self {
        let default = default.into();
        Self {
            inner: Rc::new(PersistedInner {
                value: RefCell::new(default.clone()),
                default,
                hydrated: Cell::new(false),
                binding: OnceCell::new(),
            }),
        }
    }

    pub fn get(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    pub fn default_value(&self) -> &Value {
        &self.inner.default
    }

    pub fn is_hydrated(&self) -> bool {
        self.inner.hydrated.get()
    }

    pub fn is_bound(&self) -> bool {
        self.inner.binding.get().is_some()
    }

    pub fn location(&self) -> Option<String> {
        self.inner.binding.get().map(ToString::to_string)
    }

    /// Store `value`, persist it and notify subscribers of its slot.
    ///
    /// An unattached value only updates itself. A later hydration does not
    /// overwrite a value set this way.
    pub fn set(&self, value: impl Into<Value>) -> ReactiveResult<()> {
        let value = value.into();
        if let Some(binding) = self.inner.binding.get() {
            if let Some(runtime) = binding.runtime() {
                runtime
                    .storage()
                    .set(&runtime.storage_key(binding.state(), binding.path()), &value)?;
                self.store(value);
                runtime.notify(binding.state(), binding.path());
                return Ok(());
            }
        }
        self.store(value);
        Ok(())
    }

    fn store(&self, value: Value) {
        self.inner.hydrated.set(true);
        *self.inner.value.borrow_mut() = value;
    }

    /// Load the stored value once. Returns whether the slot changed.
    pub(crate) fn hydrate(&self, runtime: &Runtime) -> ReactiveResult<bool> {
        if self.inner.hydrated.replace(true) {
            return Ok(false);
        }
        let Some(binding) = self.inner.binding.get() else {
            return Ok(false);
        };
        let stored = runtime
            .storage()
            .get(&runtime.storage_key(binding.state(), binding.path()))?;
        let next = stored.unwrap_or_else(|| self.inner.default.clone());
        let changed = *self.inner.value.borrow() != next;
        if changed {
            *self.inner.value.borrow_mut() = next;
            runtime.notify(binding.state(), binding.path());
        }
        tracing::debug!(slot = %binding, changed, "persisted value hydrated");
        Ok(changed)
    }

    pub(crate) fn bind(&self, binding: Binding) -> ReactiveResult<()> {
        let location = binding.to_string();
        self.inner
            .binding
            .set(binding)
            .map_err(|_| ReactiveError::AlreadyBound(self.location().unwrap_or(location)))
    }
}

impl fmt::Debug for PersistedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedValue")
            .field("value", &*self.inner.value.borrow())
            .field("default", &self.inner.default)
            .field("hydrated", &self.inner.hydrated.get())
            .field("binding", &self.inner.binding.get())
            .finish()
    }
}
