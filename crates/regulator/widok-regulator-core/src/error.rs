//! Error types for the regulator

/// Errors reported by regulator construction and mutation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum RegulatorError {
    /// A target map referenced a name that was not declared in `initial_values`
    #[error("Unknown property: {name}")]
    UnknownProperty { name: String },

    /// A value was NaN or infinite
    #[error("Non-finite value {value} for property {name}")]
    NonFiniteValue { name: String, value: f64 },

    /// A configuration field is out of range
    #[error("Invalid config field `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// The builder was finished without a step handler
    #[error("Regulator requires a step handler")]
    MissingStepHandler,

    /// Config or command JSON could not be parsed
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// `run_to_rest` gave up before the loop settled
    #[error("Regulator did not settle within {frames} frames")]
    NotSettled { frames: usize },
}

impl RegulatorError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownProperty { .. } | Self::NonFiniteValue { .. } => "input",
            Self::InvalidConfig { .. } | Self::MissingStepHandler => "config",
            Self::SerializationError { .. } => "serialization",
            Self::NotSettled { .. } => "convergence",
        }
    }
}

impl From<serde_json::Error> for RegulatorError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RegulatorError::UnknownProperty { name: "y".into() };
        assert_eq!(err.to_string(), "Unknown property: y");

        let err = RegulatorError::NotSettled { frames: 12 };
        assert_eq!(err.to_string(), "Regulator did not settle within 12 frames");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            RegulatorError::NonFiniteValue {
                name: "x".into(),
                value: f64::NAN
            }
            .category(),
            "input"
        );
        assert_eq!(RegulatorError::MissingStepHandler.category(), "config");
        assert_eq!(
            RegulatorError::invalid_config("friction", "must be > 0").category(),
            "config"
        );
    }
}
