//! Regulator configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::RegulatorError;

pub const DEFAULT_FRICTION: f64 = 1.1;
pub const DEFAULT_AMPLIFICATION: f64 = 0.005;

fn default_friction() -> f64 {
    DEFAULT_FRICTION
}

fn default_amplification() -> f64 {
    DEFAULT_AMPLIFICATION
}

/// Configuration for a [`Regulator`](crate::Regulator).
///
/// Every field has a default, so `{}` (or `undefined` from the wasm adapter)
/// is a valid config describing a regulator with no properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegulatorConfig {
    /// Property names and their starting values. Insertion order is the
    /// declaration order used for stepping and for snapshots.
    #[serde(default)]
    pub initial_values: IndexMap<String, f64>,
    /// Velocity decay divisor applied after every spring step.
    #[serde(default = "default_friction")]
    pub friction: f64,
    /// Converts accumulated velocity into a position delta.
    #[serde(default = "default_amplification")]
    pub amplification: f64,
    /// Per-step clamp on the spring drive. `None` leaves it unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self {
            initial_values: IndexMap::new(),
            friction: DEFAULT_FRICTION,
            amplification: DEFAULT_AMPLIFICATION,
            saturation: None,
        }
    }
}

impl RegulatorConfig {
    /// Config with the given properties and default dynamics.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            initial_values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    pub fn friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    pub fn amplification(mut self, amplification: f64) -> Self {
        self.amplification = amplification;
        self
    }

    pub fn saturation(mut self, saturation: f64) -> Self {
        self.saturation = Some(saturation);
        self
    }

    /// Reject configurations the step algorithm cannot run with.
    pub fn validate(&self) -> Result<(), RegulatorError> {
        if !self.friction.is_finite() || self.friction <= 0.0 {
            return Err(RegulatorError::invalid_config(
                "friction",
                format!("must be a finite number > 0, got {}", self.friction),
            ));
        }
        if !self.amplification.is_finite() {
            return Err(RegulatorError::invalid_config(
                "amplification",
                format!("must be finite, got {}", self.amplification),
            ));
        }
        if let Some(s) = self.saturation {
            // +inf is accepted and behaves like `None`.
            if s.is_nan() || s < 0.0 {
                return Err(RegulatorError::invalid_config(
                    "saturation",
                    format!("must be >= 0, got {s}"),
                ));
            }
        }
        for (name, value) in &self.initial_values {
            if !value.is_finite() {
                return Err(RegulatorError::NonFiniteValue {
                    name: name.clone(),
                    value: *value,
                });
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json(s: &str) -> Result<Self, RegulatorError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// The step coefficients, resolved for use by the step loop.
    pub fn dynamics(&self) -> Dynamics {
        Dynamics {
            friction: self.friction,
            amplification: self.amplification,
            saturation: self.saturation.unwrap_or(f64::INFINITY),
        }
    }
}

/// Resolved step coefficients shared by every property of a regulator.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Dynamics {
    pub friction: f64,
    pub amplification: f64,
    pub saturation: f64,
}

impl Default for Dynamics {
    fn default() -> Self {
        RegulatorConfig::default().dynamics()
    }
}
