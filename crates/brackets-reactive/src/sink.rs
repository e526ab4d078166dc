//! Where render output goes.

use crate::template::TemplateId;
use brackets_eval::EvalError;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Receives the output of template renders.
pub trait RenderSink {
    /// An element template produced new text.
    fn element_rendered(&self, id: TemplateId, text: &str);

    /// A binding's path has a new value to show.
    fn binding_updated(&self, id: TemplateId, value: &Value);

    /// A render failed. The failure is already logged and does not affect
    /// other templates.
    fn render_failed(&self, _id: TemplateId, _error: &EvalError) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn element_rendered(&self, _id: TemplateId, _text: &str) {}

    fn binding_updated(&self, _id: TemplateId, _value: &Value) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Rendered { id: TemplateId, text: String },
    Binding { id: TemplateId, value: Value },
    Failed { id: TemplateId, message: String },
}

impl SinkEvent {
    pub fn id(&self) -> TemplateId {
        match self {
            SinkEvent::Rendered { id, .. }
            | SinkEvent::Binding { id, .. }
            | SinkEvent::Failed { id, .. } => *id,
        }
    }
}

/// Keeps every event in order. Clones share one log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.borrow().clone()
    }

    /// Template ids in the order they produced an event.
    pub fn ids(&self) -> Vec<TemplateId> {
        self.events.borrow().iter().map(SinkEvent::id).collect()
    }

    /// Latest text rendered for `id`.
    pub fn last_text(&self, id: TemplateId) -> Option<String> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            SinkEvent::Rendered { id: rendered, text } if *rendered == id => Some(text.clone()),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: SinkEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl RenderSink for RecordingSink {
    fn element_rendered(&self, id: TemplateId, text: &str) {
        self.push(SinkEvent::Rendered {
            id,
            text: text.to_string(),
        });
    }

    fn binding_updated(&self, id: TemplateId, value: &Value) {
        self.push(SinkEvent::Binding {
            id,
            value: value.clone(),
        });
    }

    fn render_failed(&self, id: TemplateId, error: &EvalError) {
        self.push(SinkEvent::Failed {
            id,
            message: error.to_string(),
        });
    }
}
