//! brackets reactive runtime.
//!
//! A [`Runtime`] owns named states, the templates attached to them, and the
//! dependency graph between the two:
//!
//! ```text
//! state.set("count", 5) → pending (state, root key) → flush
//!     → subscribers, deepest first → render → computed values → observers
//! ```
//!
//! Writes only record which root keys changed. Work runs cooperatively when
//! the host calls [`Runtime::tick`] or [`Runtime::run_until_idle`], so every
//! write made in between is coalesced into one flush that renders each
//! affected template once.

mod computed;
mod config;
mod error;
mod graph;
pub mod logging;
mod node;
mod observer;
pub mod path;
mod persisted;
mod runtime;
mod scheduler;
mod sink;
mod smart;
mod state;
mod storage;
mod template;

pub use computed::ComputedValue;
pub use config::RuntimeConfig;
pub use error::{ReactiveError, ReactiveResult, StorageError};
pub use node::StateNode;
pub use path::{Path, Seg};
pub use persisted::PersistedValue;
pub use runtime::Runtime;
pub use sink::{NullSink, RecordingSink, RenderSink, SinkEvent};
pub use smart::SmartValue;
pub use state::{ReactiveState, Read, StateRef, RAW_KEY, STATE_NAME_KEY};
pub use storage::{JsonFileStorage, MemoryStorage, Storage};
pub use template::{TemplateId, TemplateKind, TemplateRecord};

use serde_json::Value;

/// A derived slot computed from its state by `compute`.
pub fn computed<F>(compute: F) -> ComputedValue
where
    F: Fn(&Value) -> Value + 'static,
{
    ComputedValue::new(compute)
}

/// A durable slot starting from `default`.
pub fn persisted(default: impl Into<Value>) -> PersistedValue {
    PersistedValue::new(default)
}
