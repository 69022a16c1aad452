//! Regulator: property ownership, mutation API and the step loop.
//!
//! Methods:
//! - builder/new, animate, eddx, edx, start_animation, animation_step (one frame),
//!   apply (scripted commands), run_to_rest (synchronous host loop)

use std::fmt;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::config::{Dynamics, RegulatorConfig};
use crate::error::RegulatorError;
use crate::inputs::Command;
use crate::outputs::Snapshot;
use crate::scheduler::{FrameScheduler, ManualScheduler};
use crate::state::{Phase, PropertyState};

/// Receives the full snapshot after every step.
///
/// The handler gets the regulator back and may call `animate`, `eddx` or `edx`
/// from inside the callback. It must not call `animation_step` itself.
pub trait StepHandler {
    fn on_step(&mut self, snapshot: &Snapshot, regulator: &mut Regulator);
}

impl<F> StepHandler for F
where
    F: FnMut(&Snapshot, &mut Regulator),
{
    fn on_step(&mut self, snapshot: &Snapshot, regulator: &mut Regulator) {
        self(snapshot, regulator)
    }
}

type EddxTransform = Box<dyn FnMut(f64, &str) -> f64>;

#[derive(Copy, Clone, Debug)]
enum Override {
    Acceleration,
    Velocity,
}

impl Override {
    fn slot(self, prop: &mut PropertyState) -> &mut f64 {
        match self {
            Override::Acceleration => &mut prop.eddx,
            Override::Velocity => &mut prop.edx,
        }
    }
}

/// Builder for [`Regulator`]. A step handler is required.
pub struct RegulatorBuilder {
    cfg: RegulatorConfig,
    step: Option<Box<dyn StepHandler>>,
    transform_eddx: Option<EddxTransform>,
    scheduler: Option<Box<dyn FrameScheduler>>,
}

impl RegulatorBuilder {
    /// Closure form of [`RegulatorBuilder::handler`].
    pub fn on_step<F>(self, f: F) -> Self
    where
        F: FnMut(&Snapshot, &mut Regulator) + 'static,
    {
        self.handler(f)
    }

    pub fn handler<H: StepHandler + 'static>(mut self, handler: H) -> Self {
        self.step = Some(Box::new(handler));
        self
    }

    /// Map each property's raw `eddx` (and its name) to the drive actually used.
    pub fn transform_eddx<F>(mut self, f: F) -> Self
    where
        F: FnMut(f64, &str) -> f64 + 'static,
    {
        self.transform_eddx = Some(Box::new(f));
        self
    }

    /// Defaults to [`ManualScheduler`].
    pub fn scheduler<S: FrameScheduler + 'static>(mut self, scheduler: S) -> Self {
        self.scheduler = Some(Box::new(scheduler));
        self
    }

    pub fn build(self) -> Result<Regulator, RegulatorError> {
        self.cfg.validate()?;
        let step = self.step.ok_or(RegulatorError::MissingStepHandler)?;

        let props: IndexMap<String, PropertyState> = self
            .cfg
            .initial_values
            .iter()
            .map(|(name, value)| (name.clone(), PropertyState::at_rest(*value)))
            .collect();
        debug!("regulator created with {} properties", props.len());

        Ok(Regulator {
            dynamics: self.cfg.dynamics(),
            cfg: self.cfg,
            props,
            step: Some(step),
            transform_eddx: self.transform_eddx,
            scheduler: self
                .scheduler
                .unwrap_or_else(|| Box::new(ManualScheduler)),
            looping: false,
            frame_pending: false,
            frame: 0,
        })
    }
}

/// Drives a fixed set of named values toward their targets, one frame at a time.
pub struct Regulator {
    cfg: RegulatorConfig,
    dynamics: Dynamics,
    // Keys are fixed at construction; order is declaration order.
    props: IndexMap<String, PropertyState>,

    // Taken out while the handler runs so it can borrow the regulator.
    step: Option<Box<dyn StepHandler>>,
    transform_eddx: Option<EddxTransform>,
    scheduler: Box<dyn FrameScheduler>,

    looping: bool,
    frame_pending: bool,
    frame: u64,
}

impl fmt::Debug for Regulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Regulator")
            .field("cfg", &self.cfg)
            .field("props", &self.props)
            .field("looping", &self.looping)
            .field("frame_pending", &self.frame_pending)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl Regulator {
    pub fn builder(cfg: RegulatorConfig) -> RegulatorBuilder {
        RegulatorBuilder {
            cfg,
            step: None,
            transform_eddx: None,
            scheduler: None,
        }
    }

    /// Create a regulator with a step handler and the polling scheduler.
    pub fn new<F>(cfg: RegulatorConfig, step: F) -> Result<Self, RegulatorError>
    where
        F: FnMut(&Snapshot, &mut Regulator) + 'static,
    {
        Self::builder(cfg).on_step(step).build()
    }

    pub fn config(&self) -> &RegulatorConfig {
        &self.cfg
    }

    /// Property names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.props.keys().map(String::as_str)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyState> {
        self.props.get(name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.props.get(name).map(|p| p.value)
    }

    pub fn target(&self, name: &str) -> Option<f64> {
        self.props.get(name).map(|p| p.target)
    }

    /// Whether a step loop is in flight.
    #[inline]
    pub fn is_animating(&self) -> bool {
        self.looping
    }

    /// Whether a frame has been requested and not yet delivered.
    #[inline]
    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Number of steps run so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Current values without stepping.
    pub fn snapshot(&self) -> Snapshot {
        self.props.iter().map(|(k, p)| (k.as_str(), p.value)).collect()
    }

    /// Set new targets. With `jump`, values teleport to the targets and the
    /// loop still runs one step to report them.
    ///
    /// Re-sending the current target without `jump` changes nothing.
    pub fn animate<I, K>(&mut self, targets: I, jump: bool) -> Result<(), RegulatorError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let resolved = self.resolve(targets)?;
        let mut changes_made = false;
        for (idx, target) in resolved {
            if let Some((_, prop)) = self.props.get_index_mut(idx) {
                if prop.target != target || jump {
                    changes_made = true;
                    prop.target = target;
                    if jump {
                        prop.value = target;
                    }
                    prop.phase = Phase::Animating;
                }
            }
        }
        if changes_made {
            self.start_animation();
        }
        Ok(())
    }

    /// Set forced accelerations.
    pub fn eddx<I, K>(&mut self, targets: I) -> Result<(), RegulatorError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.set_override(targets, Override::Acceleration)
    }

    /// Set forced velocities. A non-zero velocity keeps the loop running.
    pub fn edx<I, K>(&mut self, targets: I) -> Result<(), RegulatorError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.set_override(targets, Override::Velocity)
    }

    pub fn apply(&mut self, cmd: &Command) -> Result<(), RegulatorError> {
        match cmd {
            Command::Animate { targets, jump } => self.animate(pairs(targets), *jump),
            Command::Eddx { targets } => self.eddx(pairs(targets)),
            Command::Edx { targets } => self.edx(pairs(targets)),
        }
    }

    /// Run the first step now unless a loop is already in flight.
    pub fn start_animation(&mut self) {
        if !self.looping {
            debug!("regulator loop starting at frame {}", self.frame);
            self.animation_step();
        }
    }

    /// Advance every animating property by one step, report the snapshot and
    /// either request the next frame or end the loop.
    pub fn animation_step(&mut self) {
        self.looping = true;
        self.frame_pending = false;
        self.frame = self.frame.wrapping_add(1);

        let dynamics = self.dynamics;
        let mut snapshot = Snapshot::with_capacity(self.props.len());
        for (name, prop) in self.props.iter_mut() {
            if prop.is_animating() {
                let drive = match self.transform_eddx.as_mut() {
                    Some(transform) => transform(prop.eddx, name.as_str()),
                    None => prop.eddx,
                };
                prop.advance(drive, &dynamics);
            }
            snapshot.insert(name, prop.value);
        }
        trace!("frame {}: {:?}", self.frame, snapshot);

        if let Some(mut handler) = self.step.take() {
            handler.on_step(&snapshot, self);
            self.step = Some(handler);
        }

        // Unsettled properties stay Animating; so do ones the handler re-armed.
        let next_step = self.props.values().any(PropertyState::is_animating);
        if next_step {
            self.frame_pending = true;
            self.scheduler.request_frame();
        } else {
            self.looping = false;
            debug!("regulator settled at frame {}", self.frame);
        }
    }

    /// Deliver requested frames synchronously until the loop ends.
    ///
    /// Returns the number of frames run, or [`RegulatorError::NotSettled`]
    /// once `max_frames` have run with a frame still pending.
    pub fn run_to_rest(&mut self, max_frames: usize) -> Result<usize, RegulatorError> {
        let mut frames = 0;
        while self.frame_pending {
            if frames == max_frames {
                return Err(RegulatorError::NotSettled { frames });
            }
            self.animation_step();
            frames += 1;
        }
        Ok(frames)
    }

    fn set_override<I, K>(&mut self, targets: I, which: Override) -> Result<(), RegulatorError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let resolved = self.resolve(targets)?;
        let mut changes_made = false;
        for (idx, value) in resolved {
            if let Some((_, prop)) = self.props.get_index_mut(idx) {
                let slot = which.slot(prop);
                if *slot == value {
                    continue;
                }
                *slot = value;
                prop.phase = Phase::Animating;
                changes_made = true;
            }
        }
        if changes_made {
            self.start_animation();
        }
        Ok(())
    }

    /// Validate a whole target map before any of it is applied.
    fn resolve<I, K>(&self, targets: I) -> Result<Vec<(usize, f64)>, RegulatorError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        targets
            .into_iter()
            .map(|(name, value)| {
                let name = name.as_ref();
                let idx = self.props.get_index_of(name).ok_or_else(|| {
                    RegulatorError::UnknownProperty {
                        name: name.to_owned(),
                    }
                })?;
                if !value.is_finite() {
                    return Err(RegulatorError::NonFiniteValue {
                        name: name.to_owned(),
                        value,
                    });
                }
                Ok((idx, value))
            })
            .collect()
    }
}

fn pairs(targets: &IndexMap<String, f64>) -> impl Iterator<Item = (&str, f64)> {
    targets.iter().map(|(k, v)| (k.as_str(), *v))
}
