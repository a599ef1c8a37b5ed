//! Frame scheduling, separated from the state advance it drives.
//!
//! A demo only knows how to `advance` one frame. Whether frames arrive at all
//! is the tick source's business: Play subscribes, Pause unsubscribes, and the
//! frame function itself never checks a playing flag.

#[cfg(feature = "serde")]
use serde::Serialize;

/// Deterministic per-frame state advance.
pub trait Animate {
    /// Simulated seconds per rendered frame.
    fn time_step(&self) -> f32;

    /// Advance exactly one frame of `dt` simulated seconds.
    fn advance(&mut self, dt: f32);

    /// Back to time zero with freshly generated records.
    fn reset(&mut self);
}

/// Something that delivers frame callbacks while subscribed.
pub trait TickSource {
    fn subscribe(&mut self);

    /// Deregister the next scheduled callback. No in-flight work exists to cancel.
    fn unsubscribe(&mut self);

    fn is_subscribed(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlayState {
    #[default]
    Paused,
    Playing,
}

impl PlayState {
    /// Label for the button that would switch away from this state.
    pub fn button_label(self) -> &'static str {
        match self {
            PlayState::Paused => "Play",
            PlayState::Playing => "Pause",
        }
    }
}

/// Play/Pause/Restart controls for one demo instance.
#[derive(Debug, Clone, Default)]
pub struct Transport {
    state: PlayState,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Resume scheduling from the current state.
    pub fn play<T: TickSource>(&mut self, ticks: &mut T) {
        if !ticks.is_subscribed() {
            ticks.subscribe();
        }
        self.state = PlayState::Playing;
    }

    /// Halt scheduling without touching demo state.
    pub fn pause<T: TickSource>(&mut self, ticks: &mut T) {
        if ticks.is_subscribed() {
            ticks.unsubscribe();
        }
        self.state = PlayState::Paused;
    }

    pub fn toggle<T: TickSource>(&mut self, ticks: &mut T) -> PlayState {
        match self.state {
            PlayState::Paused => self.play(ticks),
            PlayState::Playing => self.pause(ticks),
        }
        tracing::debug!(state = ?self.state, "transport toggled");
        self.state
    }

    /// Reset the demo and drop back to paused.
    pub fn restart<A: Animate, T: TickSource>(&mut self, demo: &mut A, ticks: &mut T) {
        demo.reset();
        self.pause(ticks);
    }
}

/// Tick source for headless runs and tests: frames are pumped explicitly.
#[derive(Debug, Clone, Default)]
pub struct FixedStepTicks {
    subscribed: bool,
    delivered: u64,
}

impl FixedStepTicks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total frames delivered since construction.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Deliver up to `frames` frames; none while unsubscribed.
    ///
    /// `on_frame` runs after each advance (the render hook).
    pub fn pump<A, F>(&mut self, demo: &mut A, frames: usize, mut on_frame: F) -> usize
    where
        A: Animate,
        F: FnMut(&A),
    {
        let mut n = 0;
        while n < frames && self.subscribed {
            let dt = demo.time_step();
            demo.advance(dt);
            on_frame(demo);
            self.delivered += 1;
            n += 1;
        }
        n
    }
}

impl TickSource for FixedStepTicks {
    fn subscribe(&mut self) {
        self.subscribed = true;
    }

    fn unsubscribe(&mut self) {
        self.subscribed = false;
    }

    fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}
