//! Path accessors for one named state.
//!
//! Reads classify what they find (meta value, smart value, nested container
//! or plain value); writes record a change for the path's root key.

use crate::error::{ReactiveError, ReactiveResult};
use crate::node::StateNode;
use crate::path::Path;
use crate::runtime::{Runtime, Slot};
use serde_json::Value;
use std::fmt;

/// Meta key resolving to the whole unwrapped state.
pub const RAW_KEY: &str = "$raw";
/// Meta key resolving to the state's name.
pub const STATE_NAME_KEY: &str = "$stateName";

/// Outcome of reading a path.
#[derive(Debug, Clone)]
pub enum Read {
    /// A reserved `$` key.
    Meta(Value),
    /// The current value of a computed or persisted slot.
    Smart(Value),
    /// An object or array, accessed further through the returned handle.
    Nested(StateRef),
    /// Anything else, null when missing.
    Raw(Value),
}

impl Read {
    pub fn into_value(self) -> ReactiveResult<Value> {
        match self {
            Read::Meta(value) | Read::Smart(value) | Read::Raw(value) => Ok(value),
            Read::Nested(entry) => entry.get(),
        }
    }
}

/// Handle to one registered state.
#[derive(Clone)]
pub struct ReactiveState {
    runtime: Runtime,
    name: String,
}

impl ReactiveState {
    pub(crate) fn new(runtime: Runtime, name: &str) -> Self {
        Self {
            runtime,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn read(&self, path: &str) -> ReactiveResult<Read> {
        self.read_path(&Path::parse(path)?)
    }

    /// The unwrapped value at `path`; null when nothing is stored there.
    pub fn get(&self, path: &str) -> ReactiveResult<Value> {
        self.read(path)?.into_value()
    }

    /// Store `value` at `path`.
    ///
    /// Fails on a computed slot. On a persisted slot the value goes through
    /// the slot's setter. Assigning a computed or persisted value attaches
    /// it here.
    pub fn set(&self, path: &str, value: impl Into<StateNode>) -> ReactiveResult<()> {
        self.set_path(&Path::parse(path)?, value.into())
    }

    /// Replace the value at `path` with `f` of its current value.
    pub fn update<F>(&self, path: &str, f: F) -> ReactiveResult<()>
    where
        F: FnOnce(&Value) -> Value,
    {
        self.update_path(&Path::parse(path)?, f)
    }

    /// Append to the array at `path`.
    pub fn push(&self, path: &str, value: impl Into<StateNode>) -> ReactiveResult<()> {
        self.push_path(&Path::parse(path)?, value.into())
    }

    /// A handle to `path` for further nested access.
    pub fn entry(&self, path: &str) -> ReactiveResult<StateRef> {
        Ok(StateRef {
            state: self.clone(),
            path: Path::parse(path)?,
        })
    }

    /// The whole state as plain JSON.
    pub fn unwrap(&self) -> ReactiveResult<Value> {
        self.runtime.plain_state(&self.name)
    }

    fn read_path(&self, path: &Path) -> ReactiveResult<Read> {
        if path.len() == 1 {
            match path.root_key() {
                Some(RAW_KEY) => return Ok(Read::Meta(self.unwrap()?)),
                Some(STATE_NAME_KEY) => return Ok(Read::Meta(Value::String(self.name.clone()))),
                _ => {}
            }
        }
        Ok(match self.runtime.slot(&self.name, path)? {
            Slot::Smart(value) => Read::Smart(value),
            Slot::Container(_) => Read::Nested(StateRef {
                state: self.clone(),
                path: path.clone(),
            }),
            Slot::Plain(value) => Read::Raw(value),
        })
    }

    fn set_path(&self, path: &Path, node: StateNode) -> ReactiveResult<()> {
        if let Some(key @ (RAW_KEY | STATE_NAME_KEY)) = path.root_key() {
            return Err(ReactiveError::ReservedKey(key.to_string()));
        }
        self.runtime.write(&self.name, path, node)
    }

    fn update_path<F>(&self, path: &Path, f: F) -> ReactiveResult<()>
    where
        F: FnOnce(&Value) -> Value,
    {
        let current = self.read_path(path)?.into_value()?;
        self.set_path(path, StateNode::from(f(&current)))
    }

    fn push_path(&self, path: &Path, node: StateNode) -> ReactiveResult<()> {
        match self.read_path(path)?.into_value()? {
            Value::Array(items) => self.set_path(&path.clone().index(items.len()), node),
            _ => Err(ReactiveError::invalid_path(path.to_string(), "not an array")),
        }
    }
}

impl fmt::Debug for ReactiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveState").field("name", &self.name).finish()
    }
}

/// A path inside a state, for nested access without re-parsing.
#[derive(Clone)]
pub struct StateRef {
    state: ReactiveState,
    path: Path,
}

impl StateRef {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &ReactiveState {
        &self.state
    }

    pub fn key(&self, key: impl Into<String>) -> StateRef {
        StateRef {
            state: self.state.clone(),
            path: self.path.clone().key(key),
        }
    }

    pub fn index(&self, i: usize) -> StateRef {
        StateRef {
            state: self.state.clone(),
            path: self.path.clone().index(i),
        }
    }

    /// Descend by a relative path such as `items[0].name`.
    pub fn at(&self, relative: &str) -> ReactiveResult<StateRef> {
        Ok(StateRef {
            state: self.state.clone(),
            path: self.path.join(&Path::parse(relative)?),
        })
    }

    pub fn read(&self) -> ReactiveResult<Read> {
        self.state.read_path(&self.path)
    }

    pub fn get(&self) -> ReactiveResult<Value> {
        Ok(match self.state.runtime.slot(&self.state.name, &self.path)? {
            Slot::Smart(value) | Slot::Container(value) | Slot::Plain(value) => value,
        })
    }

    pub fn set(&self, value: impl Into<StateNode>) -> ReactiveResult<()> {
        self.state.set_path(&self.path, value.into())
    }

    pub fn update<F>(&self, f: F) -> ReactiveResult<()>
    where
        F: FnOnce(&Value) -> Value,
    {
        self.state.update_path(&self.path, f)
    }

    pub fn push(&self, value: impl Into<StateNode>) -> ReactiveResult<()> {
        self.state.push_path(&self.path, value.into())
    }
}

impl fmt::Debug for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateRef({}.{})", self.state.name, self.path)
    }
}
