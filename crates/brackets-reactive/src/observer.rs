//! Observers: callbacks fired when a watched tuple of values changes.

use crate::runtime::Runtime;
use serde_json::Value;
use std::cell::RefCell;

type Callback = Box<dyn Fn(&Runtime)>;
type ValuesFn = Box<dyn Fn(&Runtime) -> Vec<Value>>;

/// Comparison key for one watched value. Containers compare by their
/// serialized form, primitives by value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fingerprint {
    Primitive(Value),
    Structural(String),
}

impl Fingerprint {
    pub(crate) fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) | Value::Array(_) => Fingerprint::Structural(value.to_string()),
            primitive => Fingerprint::Primitive(primitive.clone()),
        }
    }
}

pub(crate) struct Observer {
    callback: Callback,
    values: ValuesFn,
    last: RefCell<Option<Vec<Fingerprint>>>,
}

impl Observer {
    pub(crate) fn new<C, V>(callback: C, values: V) -> Self
    where
        C: Fn(&Runtime) + 'static,
        V: Fn(&Runtime) -> Vec<Value> + 'static,
    {
        Self {
            callback: Box::new(callback),
            values: Box::new(values),
            last: RefCell::new(None),
        }
    }

    fn fingerprints(&self, runtime: &Runtime) -> Vec<Fingerprint> {
        (self.values)(runtime).iter().map(Fingerprint::of).collect()
    }

    /// Store the current tuple as the baseline.
    pub(crate) fn record(&self, runtime: &Runtime) {
        let now = self.fingerprints(runtime);
        *self.last.borrow_mut() = Some(now);
    }

    /// Re-evaluate the tuple; on change (or with no baseline yet) store it
    /// and run the callback. Returns whether the callback ran.
    pub(crate) fn check(&self, runtime: &Runtime) -> bool {
        let now = self.fingerprints(runtime);
        let changed = self.last.borrow().as_ref() != Some(&now);
        if changed {
            *self.last.borrow_mut() = Some(now);
            self.fire(runtime);
        }
        changed
    }

    pub(crate) fn fire(&self, runtime: &Runtime) {
        (self.callback)(runtime);
    }
}
