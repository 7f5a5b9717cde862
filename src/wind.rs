//! World wind: samples, providers and the per-world wind source locator.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schedule::{FrameTimers, TimerHandle};

/// Divides the wind speed to get the force applied to a projectile each update.
pub const WIND_FORCE_DIVISOR: f32 = 4.2;

/// Wind direction and speed at a point.
///
/// Projectiles take one sample at spawn and keep it for their whole flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect, Serialize, Deserialize)]
pub struct WindSample {
    pub direction: Vec3,
    pub speed: f32,
}

impl WindSample {
    /// No wind.
    pub const CALM: Self = Self {
        direction: Vec3::ZERO,
        speed: 0.0,
    };

    /// Constant force this wind applies to a projectile.
    pub fn force(&self) -> Vec3 {
        self.direction * (self.speed / WIND_FORCE_DIVISOR)
    }
}

/// Anything that can report the wind at a location.
pub trait WindProvider {
    fn wind_at(&self, location: Vec3) -> WindSample;
}

impl WindProvider for WindSample {
    fn wind_at(&self, _location: Vec3) -> WindSample {
        *self
    }
}

/// Finds a world's wind source once and remembers it.
///
/// Resolution is deferred by a timer so that sources registered while the
/// world is still loading are found. After the first [`resolve`](Self::resolve)
/// the result never changes, even if it found nothing.
///
/// `S` is whatever the world uses to refer to a wind source: an [`Entity`]
/// inside Bevy, the source value itself in a headless simulation.
///
/// # Example
/// ```
/// use bevy_hybrid_ballistics::schedule::FrameTimers;
/// use bevy_hybrid_ballistics::wind::WindSourceLocator;
///
/// let mut timers = FrameTimers::default();
/// let mut locator = WindSourceLocator::<u32>::default();
/// locator.initialize(&mut timers, 2.0, "resolve");
/// assert!(timers.advance(1.0).is_empty());
/// assert_eq!(timers.advance(1.0), vec!["resolve"]);
/// locator.resolve(|| Some(7));
/// locator.resolve(|| Some(8));
/// assert_eq!(locator.wind_source(), Some(&7));
/// ```
#[derive(Clone, Debug)]
pub struct WindSourceLocator<S> {
    source: Option<S>,
    resolved: bool,
    pending: Option<TimerHandle>,
}

impl<S> Default for WindSourceLocator<S> {
    fn default() -> Self {
        Self {
            source: None,
            resolved: false,
            pending: None,
        }
    }
}

impl<S> WindSourceLocator<S> {
    /// Schedules the one-time resolution `delay` seconds from now.
    ///
    /// `task` is handed back by `timers` when the delay elapses; the owner of
    /// the timers then calls [`resolve`](Self::resolve). Does nothing if a
    /// resolution is already pending or done.
    pub fn initialize<T>(&mut self, timers: &mut FrameTimers<T>, delay: f32, task: T) {
        if self.resolved || self.pending.is_some() {
            return;
        }
        self.pending = Some(timers.schedule(delay, task));
    }

    /// Caches the first wind source `find` returns.
    ///
    /// Later calls are no-ops.
    pub fn resolve(&mut self, find: impl FnOnce() -> Option<S>) -> Option<&S> {
        if !self.resolved {
            self.resolved = true;
            self.pending = None;
            self.source = find();
        }
        self.source.as_ref()
    }

    /// Cancels a pending resolution, if any.
    pub fn teardown<T>(&mut self, timers: &mut FrameTimers<T>) {
        if let Some(handle) = self.pending.take() {
            timers.cancel(handle);
        }
    }

    pub fn wind_source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn pending(&self) -> Option<TimerHandle> {
        self.pending
    }
}
