use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use thiserror::Error;

/// A scalar field as the host stores it.
///
/// Older worlds saved skill values and the healing clock as strings, newer
/// ones as numbers. `NotANumber` is the legacy "invalid number" marker; it
/// travels through JSON as `null`, which is also how the host persists it.
/// Anything else a hand-edited world may hold (booleans, objects) lands in
/// `Other` and is kept verbatim until it is coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Integer(i64),
    Float(f64),
    Text(String),
    NotANumber,
    Other(Value),
}

/// Why a value could not be read as an integer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("no leading digits in '{0}'")]
    NoDigits(String),

    #[error("'{0}' does not fit in a 64-bit integer")]
    OutOfRange(String),

    #[error("{0} is neither a number nor text")]
    NotScalar(String),
}

impl Numeric {
    /// Numbers (including the not-a-number marker) count as numeric; text
    /// and unexpected JSON need coercion.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Numeric::Text(_) | Numeric::Other(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Numeric::Integer(_))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Numeric::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Coerces to an integer when the value is not already numeric.
    ///
    /// Numeric values are returned as they are, floats included. Text is
    /// parsed with [`parse_integer`]. The caller decides what an error
    /// turns into.
    pub fn coerce_integer(&self) -> Result<Numeric, CoercionError> {
        match self {
            Numeric::Text(text) => parse_integer(text).map(Numeric::Integer),
            Numeric::Other(value) => Err(CoercionError::NotScalar(value.to_string())),
            other => Ok(other.clone()),
        }
    }

    /// Coerces, falling back to the not-a-number marker on failure.
    pub fn coerce_or_nan(&self) -> Numeric {
        self.coerce_integer().unwrap_or_else(|err| {
            log::debug!("coercing to not-a-number: {}", err);
            Numeric::NotANumber
        })
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Integer(n) => write!(f, "{}", n),
            Numeric::Float(x) => write!(f, "{}", x),
            Numeric::Text(s) => write!(f, "'{}'", s),
            Numeric::NotANumber => write!(f, "NaN"),
            Numeric::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<&Numeric> for Value {
    fn from(value: &Numeric) -> Self {
        match value {
            Numeric::Integer(n) => Value::from(*n),
            Numeric::Float(x) => Number::from_f64(*x).map_or(Value::Null, Value::Number),
            Numeric::Text(s) => Value::String(s.clone()),
            Numeric::NotANumber => Value::Null,
            Numeric::Other(value) => value.clone(),
        }
    }
}

/// Reads a present field as `Some`, including an explicit `null`.
///
/// Paired with `#[serde(default)]`, a missing field stays `None` while a
/// stored `null` comes back as [`Numeric::NotANumber`].
pub fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Numeric>, D::Error>
where
    D: Deserializer<'de>,
{
    Numeric::deserialize(deserializer).map(Some)
}

impl From<i64> for Numeric {
    fn from(value: i64) -> Self {
        Numeric::Integer(value)
    }
}

impl From<i32> for Numeric {
    fn from(value: i32) -> Self {
        Numeric::Integer(value as i64)
    }
}

impl From<&str> for Numeric {
    fn from(value: &str) -> Self {
        Numeric::Text(value.to_string())
    }
}

/// Reads the leading integer out of `text`.
///
/// Leading whitespace and a single sign are accepted, a `0x`/`0X` prefix
/// switches to hexadecimal, and parsing stops at the first character that
/// is not a digit, so `"12 dots"` reads as 12. Text with no leading digits
/// is an error.
pub fn parse_integer(text: &str) -> Result<i64, CoercionError> {
    let trimmed = text.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first().copied() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, body) = match unsigned.get(..2) {
        Some("0x") | Some("0X") => (16, &unsigned[2..]),
        _ => (10, unsigned),
    };

    let digits: &str = {
        let end = body
            .char_indices()
            .find(|(_, c)| !c.is_digit(radix))
            .map(|(idx, _)| idx)
            .unwrap_or(body.len());
        &body[..end]
    };

    if digits.is_empty() {
        return Err(CoercionError::NoDigits(text.to_string()));
    }

    let magnitude = i128::from_str_radix(digits, radix)
        .map_err(|_| CoercionError::OutOfRange(text.to_string()))?;
    let signed = if negative { -magnitude } else { magnitude };
    i64::try_from(signed).map_err(|_| CoercionError::OutOfRange(text.to_string()))
}
