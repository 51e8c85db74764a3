//! Validated-range bookkeeping.

use crate::error::{CorrelationError, EvalResult};
use std::fmt;

/// One input outside a correlation's validated range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeWarning {
    pub correlation: &'static str,
    pub parameter: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} correlation: {} = {:.4} outside validated range [{}, {}]",
            self.correlation, self.parameter, self.value, self.min, self.max
        )
    }
}

/// A correlation value plus the range warnings raised while computing it.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluated<T> {
    pub value: T,
    pub warnings: Vec<RangeWarning>,
}

impl<T> Evaluated<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Evaluated<U> {
        Evaluated {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

/// What to do when an input leaves a correlation's validated range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RangePolicy {
    /// Keep the extrapolated value and report the warning.
    #[default]
    Warn,
    /// Treat the first warning as a hard error.
    Error,
}

impl RangePolicy {
    /// Unwrap an evaluation under this policy.
    pub fn accept<T>(self, evaluated: Evaluated<T>) -> EvalResult<(T, Vec<RangeWarning>)> {
        match (self, evaluated.warnings.first()) {
            (RangePolicy::Error, Some(first)) => Err(CorrelationError::OutOfRange(*first)),
            _ => Ok((evaluated.value, evaluated.warnings)),
        }
    }
}

/// Push a warning when `value` is outside `[min, max]`.
pub(crate) fn check(
    warnings: &mut Vec<RangeWarning>,
    correlation: &'static str,
    parameter: &'static str,
    value: f64,
    min: f64,
    max: f64,
) {
    if value < min || value > max {
        warnings.push(RangeWarning {
            correlation,
            parameter,
            value,
            min,
            max,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warned() -> Evaluated<f64> {
        let mut warnings = Vec::new();
        check(&mut warnings, "test", "Re", 10.0, 100.0, 1000.0);
        Evaluated {
            value: 1.5,
            warnings,
        }
    }

    #[test]
    fn warn_policy_keeps_value() {
        let (value, warnings) = RangePolicy::Warn.accept(warned()).unwrap();
        assert_eq!(value, 1.5);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn error_policy_promotes_warning() {
        let err = RangePolicy::Error.accept(warned()).unwrap_err();
        assert!(matches!(err, CorrelationError::OutOfRange(w) if w.parameter == "Re"));
        assert!(err.to_string().contains("outside validated range"));
    }

    #[test]
    fn in_range_values_raise_nothing() {
        let mut warnings = Vec::new();
        check(&mut warnings, "test", "Re", 500.0, 100.0, 1000.0);
        assert!(warnings.is_empty());
        assert!(RangePolicy::Error.accept(Evaluated::clean(2.0)).is_ok());
    }
}
