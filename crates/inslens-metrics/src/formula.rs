//! Formula combinators.
//!
//! Formulas are interpreted over the `{metric -> value}` map of one group of
//! rows. Missing operands read as zero, except denominators, which read as one
//! when missing or zero.

use crate::{MetricError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a metric's value is obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Formula {
    /// Read from the input under the metric's own code
    Base,
    /// Another metric scaled by `multiplier`
    Raw {
        /// Source metric
        code: String,
        /// Scale factor
        #[serde(default = "one")]
        multiplier: f64,
    },
    /// Sum of metrics
    Add {
        /// Summands
        codes: Vec<String>,
    },
    /// Difference of two metrics
    Sub {
        /// Left operand
        minuend: String,
        /// Right operand
        subtrahend: String,
    },
    /// Quotient of two metrics scaled by `multiplier`
    Div {
        /// Numerator metric
        numerator: String,
        /// Denominator metric
        denominator: String,
        /// Scale factor
        #[serde(default = "one")]
        multiplier: f64,
    },
}

const fn one() -> f64 {
    1.0
}

impl Formula {
    /// `code × 1`.
    pub fn raw(code: &str) -> Self {
        Self::Raw {
            code: code.to_string(),
            multiplier: 1.0,
        }
    }

    /// Sum of `codes`.
    pub fn add(codes: &[&str]) -> Self {
        Self::Add {
            codes: codes.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// `a − b`.
    pub fn sub(a: &str, b: &str) -> Self {
        Self::Sub {
            minuend: a.to_string(),
            subtrahend: b.to_string(),
        }
    }

    /// `a / b`.
    pub fn div(a: &str, b: &str) -> Self {
        Self::div_scaled(a, b, 1.0)
    }

    /// `a / b · multiplier`.
    pub fn div_scaled(a: &str, b: &str, multiplier: f64) -> Self {
        Self::Div {
            numerator: a.to_string(),
            denominator: b.to_string(),
            multiplier,
        }
    }

    /// Codes this formula reads, other than the metric's own.
    pub fn dependencies(&self) -> Vec<&str> {
        match self {
            Self::Base => Vec::new(),
            Self::Raw { code, .. } => vec![code.as_str()],
            Self::Add { codes } => codes.iter().map(String::as_str).collect(),
            Self::Sub {
                minuend,
                subtrahend,
            } => vec![minuend.as_str(), subtrahend.as_str()],
            Self::Div {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_str(), denominator.as_str()],
        }
    }

    /// Evaluate for metric `code` over a group's values.
    pub fn evaluate(&self, code: &str, values: &HashMap<String, f64>) -> Result<f64> {
        let get = |c: &str| values.get(c).copied().unwrap_or(0.0);
        let value = match self {
            Self::Base => get(code),
            Self::Raw { code, multiplier } => get(code) * multiplier,
            Self::Add { codes } => codes.iter().map(|c| get(c)).sum(),
            Self::Sub {
                minuend,
                subtrahend,
            } => get(minuend) - get(subtrahend),
            Self::Div {
                numerator,
                denominator,
                multiplier,
            } => {
                let d = values
                    .get(denominator)
                    .copied()
                    .filter(|d| *d != 0.0)
                    .unwrap_or(1.0);
                get(numerator) / d * multiplier
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(MetricError::ArithmeticSkip {
                metric: code.to_string(),
                reason: format!("non-finite result {value}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn values(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_add_missing_reads_zero() {
        let v = values(&[("a", 1.5)]);
        assert_relative_eq!(Formula::add(&["a", "b"]).evaluate("x", &v).unwrap(), 1.5);
    }

    #[test]
    fn test_sub() {
        let v = values(&[("a", 10.0), ("b", 4.0)]);
        assert_relative_eq!(Formula::sub("a", "b").evaluate("x", &v).unwrap(), 6.0);
    }

    #[test]
    fn test_div_zero_denominator_reads_one() {
        let v = values(&[("a", 5.0), ("b", 0.0)]);
        assert_relative_eq!(Formula::div("a", "b").evaluate("x", &v).unwrap(), 5.0);
        let v = values(&[("a", 0.0), ("b", 0.0)]);
        assert_relative_eq!(Formula::div("a", "b").evaluate("x", &v).unwrap(), 0.0);
    }

    #[test]
    fn test_div_scaled() {
        let v = values(&[("premiums", 3000.0), ("contracts", 3.0)]);
        let f = Formula::div_scaled("premiums", "contracts", 1.0 / 1000.0);
        assert_relative_eq!(f.evaluate("x", &v).unwrap(), 1.0);
    }

    #[test]
    fn test_base_reads_own_code() {
        let v = values(&[("direct_premiums", 7.0)]);
        assert_relative_eq!(Formula::Base.evaluate("direct_premiums", &v).unwrap(), 7.0);
        assert_relative_eq!(Formula::Base.evaluate("inward_premiums", &v).unwrap(), 0.0);
    }

    #[test]
    fn test_non_finite_is_skip() {
        let v = values(&[("a", f64::INFINITY)]);
        let err = Formula::raw("a").evaluate("x", &v).unwrap_err();
        assert!(matches!(err, MetricError::ArithmeticSkip { .. }));
    }

    #[test]
    fn test_serde_tagged() {
        let f: Formula =
            serde_json::from_str(r#"{"op": "div", "numerator": "a", "denominator": "b"}"#).unwrap();
        assert_eq!(f, Formula::div("a", "b"));
        assert_eq!(f.dependencies(), vec!["a", "b"]);
    }
}
