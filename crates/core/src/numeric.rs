//! Numeric model for calculation inputs and results.
//!
//! Inputs arrive as JSON numbers and keep their integer-ness: a sum,
//! difference or product of integers stays an integer. Integer arithmetic
//! is checked; when an intermediate value no longer fits in `i64` the
//! computation continues in `f64` rather than wrapping.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single numeric input or result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Convert a JSON value into a number. Returns `None` for anything that
    /// is not a JSON number (booleans and numeric strings included).
    pub fn from_json(value: &serde_json::Value) -> Option<Number> {
        if let Some(i) = value.as_i64() {
            return Some(Number::Int(i));
        }
        value.as_f64().map(Number::Float)
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    /// Integers are always finite.
    pub fn is_finite(self) -> bool {
        match self {
            Number::Int(_) => true,
            Number::Float(f) => f.is_finite(),
        }
    }

    pub fn add(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => int_or_float(a.checked_add(b), || {
                a as f64 + b as f64
            }),
            _ => Number::Float(self.as_f64() + rhs.as_f64()),
        }
    }

    pub fn sub(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => int_or_float(a.checked_sub(b), || {
                a as f64 - b as f64
            }),
            _ => Number::Float(self.as_f64() - rhs.as_f64()),
        }
    }

    pub fn mul(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => int_or_float(a.checked_mul(b), || {
                a as f64 * b as f64
            }),
            _ => Number::Float(self.as_f64() * rhs.as_f64()),
        }
    }

    /// True division. Always floating point, even for two integers.
    ///
    /// The caller is responsible for rejecting a zero divisor.
    pub fn div(self, rhs: Number) -> Number {
        Number::Float(self.as_f64() / rhs.as_f64())
    }

    /// `self` raised to `rhs`.
    ///
    /// A non-negative integer exponent on an integer base is computed
    /// exactly while it fits in `i64`; everything else goes through `powf`.
    pub fn pow(self, rhs: Number) -> Number {
        if let (Number::Int(base), Number::Int(exp)) = (self, rhs) {
            if let Ok(exp) = u32::try_from(exp) {
                if let Some(value) = base.checked_pow(exp) {
                    return Number::Int(value);
                }
            }
        }
        Number::Float(self.as_f64().powf(rhs.as_f64()))
    }

    /// Floored remainder: the result takes the sign of the divisor, so
    /// `-7 mod 3 == 2` and `7 mod -3 == -2`.
    ///
    /// The caller is responsible for rejecting a zero divisor.
    pub fn rem_floored(self, rhs: Number) -> f64 {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => match a.checked_rem(b) {
                // |r| < |b| with opposite signs, so r + b cannot overflow.
                Some(r) if r != 0 && (r < 0) != (b < 0) => (r + b) as f64,
                Some(r) => r as f64,
                None => floored_rem_f64(a as f64, b as f64),
            },
            _ => floored_rem_f64(self.as_f64(), rhs.as_f64()),
        }
    }
}

fn int_or_float(checked: Option<i64>, fallback: impl FnOnce() -> f64) -> Number {
    match checked {
        Some(value) => Number::Int(value),
        None => Number::Float(fallback()),
    }
}

fn floored_rem_f64(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            // Debug keeps the trailing ".0" on whole floats ("3.0", not "3").
            Number::Float(x) => write!(f, "{:?}", x),
        }
    }
}
