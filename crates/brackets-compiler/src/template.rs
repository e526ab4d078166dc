use brackets_eval::EvalResult;
use brackets_types::program::Program;
use indexmap::IndexSet;
use serde_json::Value;

/// A compiled template: a render program plus the root variables it reads.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    program: Program,
    variables: IndexSet<String>,
    source_hash: String,
}

impl CompiledTemplate {
    pub(crate) fn new(program: Program, variables: IndexSet<String>, source_hash: String) -> Self {
        Self {
            program,
            variables,
            source_hash,
        }
    }

    /// Render against a plain (unwrapped) state snapshot.
    pub fn render(&self, snapshot: &Value) -> EvalResult<String> {
        brackets_eval::render(&self.program, snapshot)
    }

    /// Root-level state keys the template reads, in first-use order.
    pub fn variables(&self) -> &IndexSet<String> {
        &self.variables
    }

    pub fn reads(&self, name: &str) -> bool {
        self.variables.contains(name)
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Hex SHA-256 of the template source.
    pub fn source_hash(&self) -> &str {
        &self.source_hash
    }
}
