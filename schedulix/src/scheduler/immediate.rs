//! Scheduler executing everything synchronously.

use crate::time::{MonotonicTime, SchedulerTime};

use super::{Action, RepeatingAction, ScheduleKey, Scheduler};

/// A scheduler that executes every action synchronously, before the
/// scheduling call returns.
///
/// Deadlines and periods are ignored: a one-shot action runs exactly once,
/// and so does a repeating action, as if time had stopped right after its
/// first occurrence. The reported time never changes from the value provided
/// at construction. Asynchronous code driven by this scheduler collapses
/// into plain synchronous execution, which takes time out of the equation in
/// tests that do not exercise it.
///
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use schedulix::scheduler::{ImmediateScheduler, Scheduler};
///
/// let scheduler = ImmediateScheduler::new();
/// let fired = Arc::new(AtomicBool::new(false));
///
/// let f = fired.clone();
/// scheduler.schedule_after(Duration::from_secs(3600), move || {
///     f.store(true, Ordering::Relaxed);
/// });
///
/// // The action already ran; no waiting was involved.
/// assert!(fired.load(Ordering::Relaxed));
/// ```
#[derive(Copy, Clone, Debug)]
pub struct ImmediateScheduler<T: SchedulerTime = MonotonicTime> {
    now: T,
}

impl ImmediateScheduler<MonotonicTime> {
    /// Constructs an immediate scheduler reading [`MonotonicTime::EPOCH`].
    pub fn new() -> Self {
        Self::at(MonotonicTime::EPOCH)
    }
}

impl Default for ImmediateScheduler<MonotonicTime> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SchedulerTime> ImmediateScheduler<T> {
    /// Constructs an immediate scheduler reading the provided time.
    pub fn at(now: T) -> Self {
        Self { now }
    }
}

impl<T: SchedulerTime> Scheduler for ImmediateScheduler<T> {
    type Time = T;
    type Options = ();

    fn now(&self) -> T {
        self.now
    }

    fn minimum_tolerance(&self) -> T::Duration {
        T::Duration::default()
    }

    fn schedule(&self, _options: Option<()>, action: Action) {
        action();
    }

    /// Runs the action synchronously, ignoring the deadline.
    fn schedule_at(
        &self,
        _deadline: T,
        _tolerance: T::Duration,
        _options: Option<()>,
        action: Action,
    ) {
        action();
    }

    /// Runs the action synchronously exactly once, ignoring the deadline and
    /// the period, and returns a key whose cancellation has no effect.
    fn schedule_periodic(
        &self,
        _deadline: T,
        _period: T::Duration,
        _tolerance: T::Duration,
        _options: Option<()>,
        mut action: RepeatingAction,
    ) -> ScheduleKey {
        action();

        ScheduleKey::new()
    }
}
