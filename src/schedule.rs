//! One-shot deferred tasks on the simulation timeline.

use bevy::prelude::*;

/// Slack applied when comparing due times against accumulated frame time.
const DUE_EPSILON: f64 = 1e-6;

/// Handle to a scheduled task, used to cancel it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Reflect)]
pub struct TimerHandle(u64);

#[derive(Clone, Debug)]
struct ScheduledTask<T> {
    handle: TimerHandle,
    due: f64,
    task: T,
}

/// Queue of tasks that fire after a delay measured in simulated seconds.
///
/// Time only moves when [`advance`](Self::advance) is called, once per frame,
/// so tasks fire on the frame timeline and never block. Cancelling is
/// idempotent.
///
/// # Example
/// ```
/// use bevy_hybrid_ballistics::schedule::FrameTimers;
///
/// let mut timers = FrameTimers::default();
/// let expire = timers.schedule(10.0, "expire");
/// timers.schedule(2.0, "wind");
/// assert_eq!(timers.advance(2.0), vec!["wind"]);
/// assert!(timers.cancel(expire));
/// assert!(!timers.cancel(expire));
/// assert!(timers.advance(60.0).is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct FrameTimers<T> {
    now: f64,
    next_id: u64,
    entries: Vec<ScheduledTask<T>>,
}

impl<T> Default for FrameTimers<T> {
    fn default() -> Self {
        Self {
            now: 0.0,
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T> FrameTimers<T> {
    /// Schedules `task` to fire `delay` seconds from now. Negative delays fire
    /// on the next advance.
    pub fn schedule(&mut self, delay: f32, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(ScheduledTask {
            handle,
            due: self.now + f64::from(delay.max(0.0)),
            task,
        });
        handle
    }

    /// Cancels a task. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.handle != handle);
        self.entries.len() != before
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|entry| entry.handle == handle)
    }

    /// Moves time forward by `dt` and returns the tasks that came due, earliest first.
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        self.now += f64::from(dt.max(0.0));
        let now = self.now + DUE_EPSILON;

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|entry| entry.due <= now);
        self.entries = pending;

        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.handle.0.cmp(&b.handle.0)));
        due.into_iter().map(|entry| entry.task).collect()
    }

    /// Seconds elapsed on this timeline.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every pending task.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
