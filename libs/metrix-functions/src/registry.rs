//! Function registry
//!
//! Maps query names to constructors. The catalog is fixed when the registry is
//! built and read-only afterwards; share it behind an `Arc`.

use crate::aggregation::{self, Aggregation};
use crate::analysis::{self, Analysis};
use crate::error::{FunctionError, Result};
use crate::function::{FunctionCategory, FunctionSpec, MetricFunction};
use crate::parser::{split_query, FunctionCall};
use crate::transformation::{self, Transformation};
use rustc_hash::FxHashMap;
use tracing::trace;

type Constructor = fn(&'static str, &[String]) -> Result<MetricFunction>;

#[derive(Debug, Clone, Copy)]
struct RegistryEntry {
    spec: FunctionSpec,
    constructor: Constructor,
}

fn construct_aggregation(name: &'static str, raw: &[String]) -> Result<MetricFunction> {
    Aggregation::parse(name, raw).map(MetricFunction::from)
}

fn construct_analysis(name: &'static str, raw: &[String]) -> Result<MetricFunction> {
    Analysis::parse(name, raw).map(MetricFunction::from)
}

fn construct_transformation(name: &'static str, raw: &[String]) -> Result<MetricFunction> {
    Transformation::parse(name, raw).map(MetricFunction::from)
}

/// Immutable catalog of constructible functions
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    entries: FxHashMap<&'static str, RegistryEntry>,
    /// Names in catalog order
    order: Vec<&'static str>,
}

impl FunctionRegistry {
    /// The full metric catalog
    pub fn metric() -> Self {
        let groups: [(&[FunctionSpec], Constructor); 3] = [
            (aggregation::SPECS, construct_aggregation),
            (analysis::SPECS, construct_analysis),
            (transformation::SPECS, construct_transformation),
        ];

        let mut entries = FxHashMap::default();
        let mut order = Vec::new();
        for (specs, constructor) in groups {
            for spec in specs {
                entries.insert(
                    spec.name,
                    RegistryEntry {
                        spec: *spec,
                        constructor,
                    },
                );
                order.push(spec.name);
            }
        }
        Self { entries, order }
    }

    /// A copy of this registry without the given names
    ///
    /// Unknown names are ignored.
    pub fn without<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let mut restricted = self.clone();
        for name in names {
            restricted.entries.remove(name.as_ref());
        }
        restricted
            .order
            .retain(|name| restricted.entries.contains_key(name));
        restricted
    }

    /// Construct the function registered under `name`
    pub fn resolve(&self, name: &str, args: &[String]) -> Result<MetricFunction> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| FunctionError::unknown_function(name))?;
        let function = (entry.constructor)(entry.spec.name, args)?;
        trace!(function = %function, "resolved function reference");
        Ok(function)
    }

    /// Parse and construct one `name(args)` reference
    pub fn parse_call(&self, text: &str) -> Result<MetricFunction> {
        let call = FunctionCall::parse(text)?;
        self.resolve(&call.name, &call.args)
    }

    /// Parse a `;`-separated query, one result per reference in query order
    pub fn parse_query(&self, query: &str) -> Vec<Result<MetricFunction>> {
        split_query(query)
            .iter()
            .map(|text| self.parse_call(text))
            .collect()
    }

    /// Registered names in catalog order
    pub fn names(&self) -> &[&'static str] {
        &self.order
    }

    /// Catalog entries in catalog order
    pub fn specs(&self) -> impl Iterator<Item = &FunctionSpec> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).map(|entry| &entry.spec))
    }

    pub fn category(&self, name: &str) -> Option<FunctionCategory> {
        self.describe(name).map(|spec| spec.category)
    }

    pub fn describe(&self, name: &str) -> Option<&FunctionSpec> {
        self.entries.get(name).map(|entry| &entry.spec)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::metric()
    }
}
