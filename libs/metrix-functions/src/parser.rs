//! Function reference mini-format
//!
//! A reference is `name` or `name(arg0,arg1,...)`; a query is a `;`-separated
//! list of references. Separators nested inside parentheses do not split.

use crate::error::{FunctionError, Result};
use regex::Regex;
use std::sync::LazyLock;

static REFERENCE_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_]*)\s*(?:\((.*)\))?\s*$"));

fn reference_pattern() -> std::result::Result<&'static Regex, &'static regex::Error> {
    REFERENCE_PATTERN.as_ref()
}

/// A parsed but not yet resolved function reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<String>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parse one reference
    pub fn parse(text: &str) -> Result<Self> {
        let re = reference_pattern()
            .map_err(|e| FunctionError::syntax(text, format!("Regex error: {}", e)))?;

        let captures = re
            .captures(text)
            .ok_or_else(|| FunctionError::syntax(text, "expected name or name(args)"))?;
        let name = captures
            .get(1)
            .ok_or_else(|| FunctionError::syntax(text, "missing function name"))?
            .as_str();

        let args = match captures.get(2) {
            Some(inner) if !inner.as_str().trim().is_empty() => {
                let inner = inner.as_str();
                if !balanced(inner) {
                    return Err(FunctionError::syntax(text, "unbalanced parentheses"));
                }
                split_top_level(inner, ',')
            },
            _ => Vec::new(),
        };

        Ok(Self::new(name, args))
    }
}

/// Split a query into trimmed, non-empty reference texts
pub fn split_query(query: &str) -> Vec<String> {
    split_top_level(query, ';')
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect()
}

fn split_top_level(text: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {},
        }
        if c == separator && depth == 0 {
            parts.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }
    parts.push(current.trim().to_string());
    parts
}

fn balanced(text: &str) -> bool {
    let mut depth = 0i64;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            },
            _ => {},
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_pattern_compiled_once() {
        let first = reference_pattern().unwrap();
        FunctionCall::parse("savgint(60000, 100)").unwrap();
        let second = reference_pattern().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_parse_plain_name() {
        let call = FunctionCall::parse("  avg ").unwrap();
        assert_eq!(call, FunctionCall::new("avg", vec![]));
        assert_eq!(FunctionCall::parse("max()").unwrap().args.len(), 0);
    }

    #[test]
    fn test_parse_trims_arguments() {
        let call = FunctionCall::parse("savgint( 60000 , 100 )").unwrap();
        assert_eq!(call.name, "savgint");
        assert_eq!(call.args, vec!["60000", "100"]);
    }

    #[test]
    fn test_parse_keeps_nested_commas() {
        let call = FunctionCall::parse("fastdtw(metric:load(a,b),5,0.8)").unwrap();
        assert_eq!(call.args, vec!["metric:load(a,b)", "5", "0.8"]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in ["", "1avg", "avg(", "avg(1))", "p(0.5) x", "a(b))(c"] {
            let err = FunctionCall::parse(text).unwrap_err();
            assert!(matches!(err, FunctionError::Syntax { .. }), "{:?}", text);
        }
    }

    #[test]
    fn test_split_query() {
        assert_eq!(
            split_query("savgint(60000); avg ;;p(0.5)"),
            vec!["savgint(60000)", "avg", "p(0.5)"]
        );
        assert!(split_query("  ").is_empty());
    }
}
