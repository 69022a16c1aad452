//! Per-property animation state and the single-property step.

use serde::{Deserialize, Serialize};

use crate::config::Dynamics;

/// A property keeps stepping while its velocity exceeds this magnitude.
pub const VELOCITY_EPSILON: f64 = 0.001;
/// A property keeps stepping while it is further than this from its target.
pub const DISTANCE_EPSILON: f64 = 0.01;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Not updated by the step loop; its value is still reported.
    #[default]
    Idle,
    /// Updated every step until the settle test passes.
    Animating,
}

/// Animation state for one named property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyState {
    pub value: f64,
    pub target: f64,
    pub phase: Phase,
    /// Velocity accumulator, decayed by friction each spring step.
    pub dx: f64,
    /// Forced velocity. Non-zero bypasses the spring entirely.
    pub edx: f64,
    /// Forced acceleration, added to the drive each step.
    pub eddx: f64,
}

impl PropertyState {
    pub fn at_rest(value: f64) -> Self {
        Self {
            value,
            target: value,
            phase: Phase::Idle,
            dx: 0.0,
            edx: 0.0,
            eddx: 0.0,
        }
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.phase == Phase::Animating
    }

    /// Advance one step with the (already transformed) acceleration `drive`.
    ///
    /// Returns `true` when the property needs another step. Otherwise the
    /// property has settled and moves back to [`Phase::Idle`].
    pub fn advance(&mut self, drive: f64, dynamics: &Dynamics) -> bool {
        let diff = self.target - self.value + drive;
        if self.edx != 0.0 {
            self.value += self.edx;
        } else {
            self.dx += diff.clamp(-dynamics.saturation, dynamics.saturation);
            self.value += self.dx * dynamics.amplification;
            self.dx /= dynamics.friction;
        }

        let remaining = self.target - self.value;
        let moving = self.edx != 0.0
            || self.dx.abs() > VELOCITY_EPSILON
            || remaining.abs() > DISTANCE_EPSILON;
        if !moving {
            self.phase = Phase::Idle;
        }
        moving
    }
}
