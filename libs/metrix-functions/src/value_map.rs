//! Result collector
//!
//! [`FunctionValueMap`] keys named outputs by function identity, in the order
//! functions first reported. Entries are never removed; a value reported
//! twice under the same name keeps the latest result.

use crate::function::{FunctionCategory, FunctionIdentity, MetricFunction};
use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};

/// One output produced by a function execution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum OutputValue {
    /// Aggregation result; NaN serializes as `null`
    Scalar(f64),
    /// Analysis verdict
    Flag(bool),
    /// Free-form label, e.g. the partner series of a pair analysis
    Label(String),
    /// Provenance record of a transformation
    Applied,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionValue {
    pub name: String,
    #[serde(flatten)]
    pub value: OutputValue,
}

#[derive(Debug, Clone)]
struct FunctionEntry {
    function: MetricFunction,
    values: Vec<FunctionValue>,
}

/// Insertion-ordered map from function identity to its named outputs
#[derive(Debug, Clone, Default)]
pub struct FunctionValueMap {
    entries: Vec<FunctionEntry>,
    index: FxHashMap<MetricFunction, usize>,
}

impl FunctionValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a named value for `function`
    pub fn add(&mut self, function: &MetricFunction, value: FunctionValue) {
        let position = match self.index.get(function) {
            Some(&position) => position,
            None => {
                self.entries.push(FunctionEntry {
                    function: function.clone(),
                    values: Vec::new(),
                });
                let position = self.entries.len() - 1;
                self.index.insert(function.clone(), position);
                position
            },
        };

        let values = &mut self.entries[position].values;
        match values.iter_mut().find(|v| v.name == value.name) {
            Some(existing) => *existing = value,
            None => values.push(value),
        }
    }

    pub fn add_scalar(&mut self, function: &MetricFunction, value: f64) {
        self.add(
            function,
            FunctionValue {
                name: function.query_name().to_string(),
                value: OutputValue::Scalar(value),
            },
        );
    }

    pub fn add_flag(&mut self, function: &MetricFunction, flag: bool) {
        self.add(
            function,
            FunctionValue {
                name: function.query_name().to_string(),
                value: OutputValue::Flag(flag),
            },
        );
    }

    pub fn add_label(&mut self, function: &MetricFunction, name: &str, label: &str) {
        self.add(
            function,
            FunctionValue {
                name: name.to_string(),
                value: OutputValue::Label(label.to_string()),
            },
        );
    }

    /// Record that a transformation ran
    pub fn add_applied(&mut self, function: &MetricFunction) {
        self.add(
            function,
            FunctionValue {
                name: function.query_name().to_string(),
                value: OutputValue::Applied,
            },
        );
    }

    /// All outputs of `function`
    pub fn get(&self, function: &MetricFunction) -> Option<&[FunctionValue]> {
        self.index
            .get(function)
            .map(|&position| self.entries[position].values.as_slice())
    }

    /// The scalar recorded by an aggregation
    pub fn scalar(&self, function: &MetricFunction) -> Option<f64> {
        self.get(function)?.iter().find_map(|v| match v.value {
            OutputValue::Scalar(value) => Some(value),
            _ => None,
        })
    }

    /// The verdict recorded by an analysis
    pub fn flag(&self, function: &MetricFunction) -> Option<bool> {
        self.get(function)?.iter().find_map(|v| match v.value {
            OutputValue::Flag(flag) => Some(flag),
            _ => None,
        })
    }

    pub fn label(&self, function: &MetricFunction, name: &str) -> Option<&str> {
        self.get(function)?
            .iter()
            .find_map(|v| match &v.value {
                OutputValue::Label(label) if v.name == name => Some(label.as_str()),
                _ => None,
            })
    }

    pub fn contains(&self, function: &MetricFunction) -> bool {
        self.index.contains_key(function)
    }

    /// Entries in first-report order
    pub fn iter(&self) -> impl Iterator<Item = (&MetricFunction, &[FunctionValue])> {
        self.entries
            .iter()
            .map(|entry| (&entry.function, entry.values.as_slice()))
    }

    /// Entries of one category, in first-report order
    pub fn by_category(
        &self,
        category: FunctionCategory,
    ) -> impl Iterator<Item = (&MetricFunction, &[FunctionValue])> {
        self.iter()
            .filter(move |(function, _)| function.category() == category)
    }

    /// Number of distinct functions that reported
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Serialize)]
struct EntryView<'a> {
    function: &'static str,
    #[serde(rename = "type")]
    series_type: &'static str,
    category: FunctionCategory,
    arguments: Vec<String>,
    values: &'a [FunctionValue],
}

impl Serialize for FunctionValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter().map(|entry| EntryView {
            function: entry.function.query_name(),
            series_type: entry.function.time_series_type(),
            category: entry.function.category(),
            arguments: entry.function.arguments(),
            values: &entry.values,
        }))
    }
}
