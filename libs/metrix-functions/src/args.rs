//! Function argument parsing
//!
//! Raw arguments arrive as a flat ordered list of strings. Every constructor
//! goes through [`Args`] so malformed input is rejected at construction time
//! with the offending position and raw text.

use crate::error::{FunctionError, Result};
use chrono::Duration;
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Float constructor parameter with structural equality
///
/// Compares and hashes by bit pattern so functions holding floats can be
/// used as map keys. Renders with `ryu` (`2.0`, `0.25`, `1e-7`).
#[derive(Debug, Clone, Copy)]
pub struct FloatArg(f64);

impl FloatArg {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for FloatArg {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatArg {}

impl Hash for FloatArg {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for FloatArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = ryu::Buffer::new();
        f.write_str(buffer.format(self.0))
    }
}

impl Serialize for FloatArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

/// Calendar unit for window and shift arguments
///
/// Unit-bearing functions assume millisecond timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeUnit {
    Millis,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Millis => "MILLIS",
            Self::Seconds => "SECONDS",
            Self::Minutes => "MINUTES",
            Self::Hours => "HOURS",
            Self::Days => "DAYS",
        }
    }

    /// `amount` of this unit as a duration, `None` on overflow
    pub fn duration(&self, amount: i64) -> Option<Duration> {
        match self {
            Self::Millis => Duration::try_milliseconds(amount),
            Self::Seconds => Duration::try_seconds(amount),
            Self::Minutes => Duration::try_minutes(amount),
            Self::Hours => Duration::try_hours(amount),
            Self::Days => Duration::try_days(amount),
        }
    }

    /// `amount` of this unit in milliseconds, `None` on overflow
    pub fn to_millis(&self, amount: i64) -> Option<i64> {
        self.duration(amount).map(|d| d.num_milliseconds())
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MILLIS" | "MILLISECONDS" | "MS" => Ok(Self::Millis),
            "SECONDS" | "S" => Ok(Self::Seconds),
            "MINUTES" | "M" => Ok(Self::Minutes),
            "HOURS" | "H" => Ok(Self::Hours),
            "DAYS" | "D" => Ok(Self::Days),
            _ => Err(format!(
                "unknown time unit '{}', expected MILLIS, SECONDS, MINUTES, HOURS or DAYS",
                s
            )),
        }
    }
}

/// Positional view over the raw arguments of one function reference
pub(crate) struct Args<'a> {
    function: &'static str,
    raw: &'a [String],
}

impl<'a> Args<'a> {
    pub(crate) fn new(function: &'static str, raw: &'a [String]) -> Self {
        Self { function, raw }
    }

    fn error(&self, position: usize, reason: impl Into<String>) -> FunctionError {
        FunctionError::argument(self.function, position, self.raw(position), reason)
    }

    fn raw(&self, position: usize) -> Option<&'a str> {
        self.raw.get(position).map(String::as_str)
    }

    /// Reject anything past the first `count` arguments
    pub(crate) fn at_most(&self, count: usize) -> Result<()> {
        if self.raw.len() > count {
            return Err(self.error(
                count,
                format!("takes at most {} argument(s), got {}", count, self.raw.len()),
            ));
        }
        Ok(())
    }

    pub(crate) fn is_present(&self, position: usize) -> bool {
        self.raw(position).is_some_and(|s| !s.trim().is_empty())
    }

    pub(crate) fn text(&self, position: usize, name: &str) -> Result<&'a str> {
        match self.raw(position).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(self.error(position, format!("{} is required", name))),
        }
    }

    pub(crate) fn integer(&self, position: usize, name: &str) -> Result<i64> {
        let text = self.text(position, name)?;
        text.parse::<i64>()
            .map_err(|e| self.error(position, format!("{} must be an integer: {}", name, e)))
    }

    pub(crate) fn positive_integer(&self, position: usize, name: &str) -> Result<i64> {
        let value = self.integer(position, name)?;
        if value <= 0 {
            return Err(self.error(position, format!("{} must be positive", name)));
        }
        Ok(value)
    }

    pub(crate) fn optional_positive_integer(
        &self,
        position: usize,
        name: &str,
    ) -> Result<Option<i64>> {
        if !self.is_present(position) {
            return Ok(None);
        }
        self.positive_integer(position, name).map(Some)
    }

    pub(crate) fn count(&self, position: usize, name: &str) -> Result<usize> {
        let value = self.positive_integer(position, name)?;
        usize::try_from(value).map_err(|_| self.error(position, format!("{} is too large", name)))
    }

    pub(crate) fn non_negative_count(&self, position: usize, name: &str) -> Result<usize> {
        let value = self.integer(position, name)?;
        usize::try_from(value)
            .map_err(|_| self.error(position, format!("{} must not be negative", name)))
    }

    pub(crate) fn float(&self, position: usize, name: &str) -> Result<FloatArg> {
        let text = self.text(position, name)?;
        let value = text
            .parse::<f64>()
            .map_err(|e| self.error(position, format!("{} must be a number: {}", name, e)))?;
        if !value.is_finite() {
            return Err(self.error(position, format!("{} must be finite", name)));
        }
        Ok(FloatArg::new(value))
    }

    pub(crate) fn non_negative_float(&self, position: usize, name: &str) -> Result<FloatArg> {
        let value = self.float(position, name)?;
        if value.get() < 0.0 {
            return Err(self.error(position, format!("{} must not be negative", name)));
        }
        Ok(value)
    }

    pub(crate) fn time_unit(&self, position: usize) -> Result<TimeUnit> {
        self.text(position, "unit")?
            .parse()
            .map_err(|e: String| self.error(position, e))
    }
}
