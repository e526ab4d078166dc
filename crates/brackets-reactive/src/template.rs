//! Attached templates: element templates and two-way bindings.

use crate::path::Path;
use brackets_compiler::CompiledTemplate;
use std::fmt;
use std::rc::Rc;

/// Identifies an attached template within one runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(u64);

impl TemplateId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum TemplateKind {
    /// Renders text for an element from a compiled template.
    Element(Rc<CompiledTemplate>),
    /// Mirrors one state path into an input, and writes input back to it.
    Binding(Path),
}

/// Registry entry for an attached template.
#[derive(Debug, Clone)]
pub struct TemplateRecord {
    pub kind: TemplateKind,
    /// State the template reads.
    pub state: String,
    /// Nesting depth at attach time. Deeper templates render first.
    pub depth: u32,
}

impl TemplateRecord {
    /// Root keys the template is subscribed to.
    pub fn dependencies(&self) -> Vec<String> {
        match &self.kind {
            TemplateKind::Element(template) => template.variables().iter().cloned().collect(),
            TemplateKind::Binding(path) => path.root_key().map(str::to_string).into_iter().collect(),
        }
    }

    pub fn is_binding(&self) -> bool {
        matches!(self.kind, TemplateKind::Binding(_))
    }
}
