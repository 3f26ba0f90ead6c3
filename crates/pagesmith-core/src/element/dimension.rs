//! Width/height values that arrive either as bare numbers or as
//! unit-suffixed strings (`"320px"`, `"50%"`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A width or height, parsed once at the boundary.
///
/// Geometry only ever looks at [`Dimension::value`]; the unit is carried so
/// the host gets back the same kind of value it handed in. The numeric part
/// is written back in shortest form, so `"1.50px"` serializes as `"1.5px"`
/// and `"1e3px"` as `"1000px"`. Unparsed strings round-trip verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDimension", into = "RawDimension")]
pub enum Dimension {
    /// A bare number of canvas pixels.
    Number(f64),
    /// A numeric prefix followed by a unit suffix (possibly empty).
    Unit { value: f64, unit: String },
    /// A string with no numeric prefix (`"auto"`). Measures as zero.
    Unparsed(String),
}

impl Dimension {
    /// Parse a string using leading-numeric extraction.
    ///
    /// `"120px"` → 120 with unit `px`, `"12.5%"` → 12.5 with unit `%`.
    /// Strings without a numeric prefix are kept verbatim as
    /// [`Dimension::Unparsed`] and treated as 0 by every geometry function.
    pub fn parse(raw: &str) -> Self {
        match split_numeric_prefix(raw) {
            Some((value, unit)) => Dimension::Unit {
                value,
                unit: unit.to_string(),
            },
            None => Dimension::Unparsed(raw.to_string()),
        }
    }

    /// Numeric value in canvas pixels (0 for unparsable input).
    pub fn value(&self) -> f64 {
        match self {
            Dimension::Number(v) => *v,
            Dimension::Unit { value, .. } => *value,
            Dimension::Unparsed(_) => 0.0,
        }
    }

    /// Unit suffix, if the dimension was given as a string.
    pub fn unit(&self) -> Option<&str> {
        match self {
            Dimension::Unit { unit, .. } => Some(unit),
            _ => None,
        }
    }

    /// Replace the numeric value, keeping the unit of a suffixed dimension.
    pub fn with_value(&self, value: f64) -> Self {
        match self {
            Dimension::Unit { unit, .. } => Dimension::Unit {
                value,
                unit: unit.clone(),
            },
            _ => Dimension::Number(value),
        }
    }

    /// Whether the original input had a usable numeric value.
    pub fn is_parsed(&self) -> bool {
        !matches!(self, Dimension::Unparsed(_))
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Dimension::Number(0.0)
    }
}

impl From<f64> for Dimension {
    fn from(value: f64) -> Self {
        Dimension::Number(value)
    }
}

impl From<&str> for Dimension {
    fn from(raw: &str) -> Self {
        Dimension::parse(raw)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Number(v) => write!(f, "{v}"),
            Dimension::Unit { value, unit } => write!(f, "{value}{unit}"),
            Dimension::Unparsed(raw) => f.write_str(raw),
        }
    }
}

/// Wire form: a JSON number or a JSON string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawDimension {
    Number(f64),
    Text(String),
}

impl From<RawDimension> for Dimension {
    fn from(raw: RawDimension) -> Self {
        match raw {
            RawDimension::Number(v) => Dimension::Number(v),
            RawDimension::Text(s) => Dimension::parse(&s),
        }
    }
}

impl From<Dimension> for RawDimension {
    fn from(dim: Dimension) -> Self {
        match dim {
            Dimension::Number(v) => RawDimension::Number(v),
            other => RawDimension::Text(other.to_string()),
        }
    }
}

/// Split `"  -12.5px"` into `(-12.5, "px")`. Returns `None` when there is no
/// digit before the first non-numeric character. An exponent is part of the
/// number (`"1e3px"` is 1000 px); a bare `e` is not (`"2em"` is 2 em).
fn split_numeric_prefix(raw: &str) -> Option<(f64, &str)> {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Optional exponent: only consumed when at least one digit follows.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end..].iter().take_while(|b| b.is_ascii_digit()).count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    let value = trimmed[..end].parse::<f64>().ok()?;
    Some((value, trimmed[end..].trim()))
}
