use serde::{Deserialize, Serialize};

/// Code generation settings shared by every template a compiler builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Appended after each statement's value.
    pub statement_separator: String,
    /// Instruction budget for a single render.
    pub gas_limit: u64,
}

impl CompileOptions {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            statement_separator: " ".to_string(),
            gas_limit: 1_000_000,
        }
    }
}
