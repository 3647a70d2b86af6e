//! Engine configuration

use serde::{Deserialize, Serialize};

/// Limits and switches applied by [`crate::FunctionEngine`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Abort compilation at the first rejected function reference
    pub fail_fast: bool,
    /// Refuse series longer than this
    pub max_input_points: Option<usize>,
    /// Query names removed from the registry
    pub disabled_functions: Vec<String>,
}
