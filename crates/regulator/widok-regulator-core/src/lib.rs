//! Widok Regulator Core (host-agnostic)
//!
//! Drives a fixed set of named scalar values toward their targets with a
//! damped-velocity model, one discrete step per frame. The host owns frame
//! timing: the regulator asks for the next frame through a [`FrameScheduler`]
//! and the host answers by calling [`Regulator::animation_step`].

pub mod config;
pub mod error;
pub mod inputs;
pub mod outputs;
pub mod regulator;
pub mod scheduler;
pub mod state;

// Re-exports for consumers (adapters)
pub use config::{Dynamics, RegulatorConfig};
pub use error::RegulatorError;
pub use inputs::Command;
pub use outputs::Snapshot;
pub use regulator::{Regulator, RegulatorBuilder, StepHandler};
pub use scheduler::{FrameScheduler, ManualScheduler};
pub use state::{Phase, PropertyState, DISTANCE_EPSILON, VELOCITY_EPSILON};
