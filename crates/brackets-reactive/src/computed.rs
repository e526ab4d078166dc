//! Derived state slots.

use crate::error::{ReactiveError, ReactiveResult};
use crate::path::Path;
use crate::runtime::Runtime;
use crate::smart::Binding;
use brackets_eval::{Environment, Evaluator};
use brackets_parser::parse_expression;
use serde_json::Value;
use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

type ComputeFn = dyn Fn(&Value) -> ReactiveResult<Value>;

/// A read-only slot whose value is a function of its state.
///
/// The function receives the unwrapped state the value is attached to. It
/// runs once when the value is attached, again one tick later, and after
/// every flush; a change notifies the slot's subscribers. Clones share the
/// same value.
#[derive(Clone)]
pub struct ComputedValue {
    inner: Rc<ComputedInner>,
}

struct ComputedInner {
    compute: Box<ComputeFn>,
    value: RefCell<Value>,
    binding: OnceCell<Binding>,
}

impl ComputedValue {
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn(&Value) -> Value + 'static,
    {
        Self::try_new(move |state| Ok(compute(state)))
    }

    pub fn try_new<F>(compute: F) -> Self
    where
        F: Fn(&Value) -> ReactiveResult<Value> + 'static,
    {
        Self {
            inner: Rc::new(ComputedInner {
                compute: Box::new(compute),
                value: RefCell::new(Value::Null),
                binding: OnceCell::new(),
            }),
        }
    }

    /// Derive the value from a template expression over the state's keys,
    /// e.g. `count * 2` or `todos.length`.
    pub fn from_expression(source: &str) -> ReactiveResult<Self> {
        let expr = parse_expression(source)?;
        Ok(Self::try_new(move |state| {
            let env = match state.as_object() {
                Some(keys) => Environment::from_snapshot(keys),
                None => Environment::new(),
            };
            Ok(Evaluator::new(&env).eval(&expr)?)
        }))
    }

    /// Last computed value; null before the first computation.
    pub fn get(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    pub fn is_bound(&self) -> bool {
        self.inner.binding.get().is_some()
    }

    pub fn location(&self) -> Option<String> {
        self.inner.binding.get().map(ToString::to_string)
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.binding.get().map(Binding::path)
    }

    /// Recompute now, notifying subscribers if the value changed.
    /// Unattached values are left alone.
    pub fn update(&self) -> ReactiveResult<bool> {
        let Some(binding) = self.inner.binding.get() else {
            return Ok(false);
        };
        let Some(runtime) = binding.runtime() else {
            return Ok(false);
        };
        let changed = self.refresh(&runtime)?;
        if changed {
            runtime.notify(binding.state(), binding.path());
        }
        Ok(changed)
    }

    /// Raise a change for the slot without recomputing.
    pub fn notify(&self) {
        if let Some(binding) = self.inner.binding.get() {
            if let Some(runtime) = binding.runtime() {
                runtime.notify(binding.state(), binding.path());
            }
        }
    }

    /// Recompute and store. Returns whether the value changed.
    pub(crate) fn refresh(&self, runtime: &Runtime) -> ReactiveResult<bool> {
        let Some(binding) = self.inner.binding.get() else {
            return Ok(false);
        };
        let state = runtime.plain_state(binding.state())?;
        let next = (self.inner.compute)(&state)?;
        let changed = *self.inner.value.borrow() != next;
        if changed {
            *self.inner.value.borrow_mut() = next;
        }
        Ok(changed)
    }

    pub(crate) fn bind(&self, binding: Binding) -> ReactiveResult<()> {
        let location = binding.to_string();
        self.inner
            .binding
            .set(binding)
            .map_err(|_| ReactiveError::AlreadyBound(self.location().unwrap_or(location)))
    }

    pub(crate) fn ptr_eq(&self, other: &ComputedValue) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ComputedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedValue")
            .field("value", &*self.inner.value.borrow())
            .field("binding", &self.inner.binding.get())
            .finish()
    }
}
