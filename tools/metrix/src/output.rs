//! Rendering of query results

use std::fmt::Write as _;

use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use metrix_functions::{
    FunctionCategory, FunctionIdentity, FunctionSpec, FunctionValueMap, OutputValue, QueryOutcome,
};
use metrix_series::MetricTimeSeries;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// JSON document printed by `metrix run --format json`
#[derive(Serialize)]
pub struct RunReport<'a> {
    pub series: &'a MetricTimeSeries,
    pub values: &'a FunctionValueMap,
    pub rejected: Vec<String>,
}

impl<'a> RunReport<'a> {
    pub fn new(series: &'a MetricTimeSeries, outcome: &'a QueryOutcome) -> Self {
        Self {
            series,
            values: &outcome.values,
            rejected: outcome.rejected.iter().map(|e| e.to_string()).collect(),
        }
    }
}

pub fn render_run(
    format: OutputFormat,
    series: &MetricTimeSeries,
    outcome: &QueryOutcome,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&RunReport::new(
            series, outcome,
        ))?),
        OutputFormat::Table => Ok(render_table(series, outcome)),
    }
}

fn format_output(value: &OutputValue) -> String {
    match value {
        OutputValue::Scalar(v) if v.is_nan() => "NaN".dimmed().to_string(),
        OutputValue::Scalar(v) => v.to_string(),
        OutputValue::Flag(true) => "true".green().to_string(),
        OutputValue::Flag(false) => "false".yellow().to_string(),
        OutputValue::Label(label) => label.clone(),
        OutputValue::Applied => "applied".cyan().to_string(),
    }
}

fn category_label(category: FunctionCategory) -> ColoredString {
    match category {
        FunctionCategory::Aggregation => category.as_str().blue(),
        FunctionCategory::Analysis => category.as_str().magenta(),
        FunctionCategory::Transformation => category.as_str().cyan(),
    }
}

fn render_table(series: &MetricTimeSeries, outcome: &QueryOutcome) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {} ({} points)",
        "Series:".bright_cyan(),
        series.name().bold(),
        series.len()
    );
    if let (Some(start), Some(end)) = (series.start(), series.end()) {
        let _ = writeln!(out, "  range: {} .. {}", start, end);
    }

    let _ = writeln!(out, "\n{}", "Functions:".bright_cyan());
    if outcome.values.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (function, values) in outcome.values.iter() {
        let _ = writeln!(
            out,
            "  {:<40} {}",
            function.to_string().bold(),
            category_label(function.category())
        );
        for value in values {
            let _ = writeln!(out, "    {:<12} {}", value.name, format_output(&value.value));
        }
    }

    if !outcome.rejected.is_empty() {
        let _ = writeln!(out, "\n{}", "Rejected:".red());
        for error in &outcome.rejected {
            let _ = writeln!(out, "  {} {}", "x".red(), error);
        }
    }

    out
}

/// One line per catalog entry, grouped in catalog order
pub fn render_catalog<'a>(specs: impl Iterator<Item = &'a FunctionSpec>) -> String {
    let mut out = String::new();
    for spec in specs {
        let _ = writeln!(
            out,
            "{:<10} {:<16} {}",
            spec.name.bold(),
            category_label(spec.category),
            spec.signature
        );
    }
    out
}

pub fn render_spec(spec: &FunctionSpec) -> String {
    format!(
        "{}\n  category:  {}\n  signature: {}\n  type:      metric\n\n  {}\n",
        spec.name.bold(),
        category_label(spec.category),
        spec.signature,
        spec.description
    )
}

/// Applied transformations in execution order, for the summary line
pub fn applied_transformations(values: &FunctionValueMap) -> Vec<String> {
    values
        .by_category(FunctionCategory::Transformation)
        .map(|(function, _)| function.query_name().to_string())
        .collect()
}
