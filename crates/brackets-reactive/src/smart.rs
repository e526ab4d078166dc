//! Attachment of smart values to the slot that holds them.

use crate::computed::ComputedValue;
use crate::error::ReactiveResult;
use crate::path::Path;
use crate::persisted::PersistedValue;
use crate::runtime::{Inner, Runtime};
use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

/// Where a smart value lives: its runtime, owning state and slot path.
#[derive(Clone)]
pub(crate) struct Binding {
    runtime: Weak<RefCell<Inner>>,
    state: String,
    path: Path,
}

impl Binding {
    pub(crate) fn new(runtime: Weak<RefCell<Inner>>, state: &str, path: Path) -> Self {
        Self {
            runtime,
            state: state.to_string(),
            path,
        }
    }

    /// `None` once the runtime has been dropped.
    pub(crate) fn runtime(&self) -> Option<Runtime> {
        Runtime::from_weak(&self.runtime)
    }

    pub(crate) fn state(&self) -> &str {
        &self.state
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.state, self.path)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binding({self})")
    }
}

/// A value that resolves itself when read: derived or durable.
#[derive(Debug, Clone)]
pub enum SmartValue {
    Computed(ComputedValue),
    Persisted(PersistedValue),
}

impl SmartValue {
    pub fn is_bound(&self) -> bool {
        match self {
            SmartValue::Computed(value) => value.is_bound(),
            SmartValue::Persisted(value) => value.is_bound(),
        }
    }

    /// `state.path` of the slot this value is attached to.
    pub fn location(&self) -> Option<String> {
        match self {
            SmartValue::Computed(value) => value.location(),
            SmartValue::Persisted(value) => value.location(),
        }
    }

    pub(crate) fn bind(&self, binding: Binding) -> ReactiveResult<()> {
        match self {
            SmartValue::Computed(value) => value.bind(binding),
            SmartValue::Persisted(value) => value.bind(binding),
        }
    }
}
