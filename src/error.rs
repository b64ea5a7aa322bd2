use thiserror::Error;

/// Failure classes of the planning engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    /// Too little input to compute anything meaningful
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A height band, leg ordering or array shape is not usable
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Non-finite or non-physical numeric input
    #[error("numerically degenerate input: {0}")]
    NumericDegenerate(String),
}

impl PlannerError {
    pub fn insufficient(msg: impl Into<String>) -> Self {
        PlannerError::InsufficientData(msg.into())
    }

    pub fn range(msg: impl Into<String>) -> Self {
        PlannerError::InvalidRange(msg.into())
    }

    pub fn degenerate(msg: impl Into<String>) -> Self {
        PlannerError::NumericDegenerate(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;

/// Reject NaN and infinities with a named error
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PlannerError::degenerate(format!("{name} is not finite ({value})")))
    }
}

/// Reject values that are not strictly positive
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<f64> {
    let value = ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(PlannerError::degenerate(format!("{name} must be positive ({value})")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlannerError::range("upper 100 <= lower 200");
        assert_eq!(err.to_string(), "invalid range: upper 100 <= lower 200");
    }

    #[test]
    fn test_ensure_helpers() {
        assert_eq!(ensure_finite("x", 1.5), Ok(1.5));
        assert!(matches!(ensure_finite("x", f64::NAN), Err(PlannerError::NumericDegenerate(_))));
        assert!(ensure_positive("speed", 0.0).is_err());
        assert_eq!(ensure_positive("speed", 3.5), Ok(3.5));
    }
}
