use brackets_compiler::CompileOptions;
use serde::{Deserialize, Serialize};

/// Runtime-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Name used by [`Runtime::reactive`](crate::Runtime::reactive).
    pub default_state_name: String,
    /// Upper bound on ticks run by `run_until_idle`.
    pub max_cascade: usize,
    /// Prefix of every key handed to the storage backend.
    pub storage_namespace: String,
    /// Options for the runtime's template compiler.
    pub compile: CompileOptions,
}

impl RuntimeConfig {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_state_name: "default".to_string(),
            max_cascade: 100,
            storage_namespace: "brackets:".to_string(),
            compile: CompileOptions::default(),
        }
    }
}
