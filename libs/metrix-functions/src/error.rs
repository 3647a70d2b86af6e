//! Error types for metrix-functions

use thiserror::Error;

/// Function construction and lookup errors
///
/// Execution itself never fails: numeric edge cases (NaN, empty buckets,
/// series too short) are defined no-ops or propagate NaN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    #[error("Invalid argument {position} for '{function}' ({}): {reason}", display_raw(.value))]
    ArgumentParse {
        function: String,
        position: usize,
        value: Option<String>,
        reason: String,
    },

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("Malformed function reference '{text}': {reason}")]
    Syntax { text: String, reason: String },

    #[error("Series has {points} points, limit is {limit}")]
    InputTooLarge { points: usize, limit: usize },
}

fn display_raw(value: &Option<String>) -> String {
    match value {
        Some(raw) => format!("got '{}'", raw),
        None => "missing".to_string(),
    }
}

impl FunctionError {
    pub fn argument(
        function: impl Into<String>,
        position: usize,
        value: Option<&str>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ArgumentParse {
            function: function.into(),
            position,
            value: value.map(str::to_string),
            reason: reason.into(),
        }
    }

    pub fn unknown_function(name: impl Into<String>) -> Self {
        Self::UnknownFunction { name: name.into() }
    }

    pub fn syntax(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Syntax {
            text: text.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FunctionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_error_names_position_and_raw_value() {
        let err = FunctionError::argument("savgint", 0, Some("abc"), "expected an integer");
        assert_eq!(
            err.to_string(),
            "Invalid argument 0 for 'savgint' (got 'abc'): expected an integer"
        );

        let missing = FunctionError::argument("savgbckt", 0, None, "bucketSize is required");
        assert!(missing.to_string().contains("(missing)"));
    }
}
