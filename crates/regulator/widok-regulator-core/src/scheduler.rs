//! Frame scheduling seam between the regulator and its host.
//!
//! The regulator never waits for time to pass. When a step leaves motion
//! unsettled it calls [`FrameScheduler::request_frame`] once, and the host is
//! expected to call [`Regulator::animation_step`](crate::Regulator::animation_step)
//! on its next frame (e.g. from `requestAnimationFrame` or a render loop).

/// Host capability for requesting one more step.
/// Adapters (wasm, native loops) implement this and inject it at construction.
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

impl<F: FnMut()> FrameScheduler for F {
    fn request_frame(&mut self) {
        self()
    }
}

/// Scheduler for hosts that poll instead of being called back.
///
/// Requests are only tracked by the regulator itself; the host checks
/// [`Regulator::frame_pending`](crate::Regulator::frame_pending) or drives the
/// loop synchronously with [`Regulator::run_to_rest`](crate::Regulator::run_to_rest).
#[derive(Copy, Clone, Debug, Default)]
pub struct ManualScheduler;

impl FrameScheduler for ManualScheduler {
    #[inline]
    fn request_frame(&mut self) {}
}
