//! Type-erased scheduler.

use std::fmt;
use std::sync::Arc;

use crate::time::{MonotonicTime, SchedulerTime};

use super::{
    Action, FailingScheduler, FailureReporter, ImmediateScheduler, RepeatingAction, ScheduleKey,
    Scheduler, UnimplementedScheduler,
};

type NowFn<T> = Arc<dyn Fn() -> T + Send + Sync>;
type MinimumToleranceFn<D> = Arc<dyn Fn() -> D + Send + Sync>;
type ScheduleFn<O> = Arc<dyn Fn(Option<O>, Action) + Send + Sync>;
type ScheduleAtFn<T, D, O> = Arc<dyn Fn(T, D, Option<O>, Action) + Send + Sync>;
type SchedulePeriodicFn<T, D, O> =
    Arc<dyn Fn(T, D, D, Option<O>, RepeatingAction) -> ScheduleKey + Send + Sync>;

/// A type-erased scheduler.
///
/// `AnyScheduler` bundles the five operations of the [`Scheduler`] trait into
/// shared closures, which gives heterogeneous schedulers a single concrete
/// type: a field of type `AnyScheduler` can hold a real scheduler in
/// production and a [`VirtualScheduler`](super::VirtualScheduler) in tests.
///
/// A wrapped scheduler behaves identically to the original: the wrapper adds
/// no delay, no reordering and no failure of its own, and clones share the
/// wrapped scheduler rather than copying it. The wrapper can be built from a
/// concrete scheduler with [`new`](AnyScheduler::new) or
/// [`from_shared`](AnyScheduler::from_shared), or assembled from five raw
/// closures with [`from_raw`](AnyScheduler::from_raw).
///
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use schedulix::scheduler::{AnyScheduler, Scheduler, VirtualScheduler};
/// use schedulix::time::MonotonicTime;
///
/// let virtual_scheduler = VirtualScheduler::new(MonotonicTime::EPOCH);
/// let scheduler: AnyScheduler = virtual_scheduler.clone().erased();
///
/// let fired = Arc::new(AtomicBool::new(false));
/// let f = fired.clone();
/// scheduler.schedule_after(Duration::from_secs(1), move || {
///     f.store(true, Ordering::Relaxed);
/// });
///
/// // The erased wrapper feeds the same queue as the concrete handle.
/// virtual_scheduler.advance_by(Duration::from_secs(1));
/// assert!(fired.load(Ordering::Relaxed));
/// ```
pub struct AnyScheduler<T: SchedulerTime = MonotonicTime, O = ()> {
    now_fn: NowFn<T>,
    minimum_tolerance_fn: MinimumToleranceFn<T::Duration>,
    schedule_fn: ScheduleFn<O>,
    schedule_at_fn: ScheduleAtFn<T, T::Duration, O>,
    schedule_periodic_fn: SchedulePeriodicFn<T, T::Duration, O>,
}

impl<T: SchedulerTime, O: Send + 'static> AnyScheduler<T, O> {
    /// Wraps a concrete scheduler.
    pub fn new<S>(scheduler: S) -> Self
    where
        S: Scheduler<Time = T, Options = O>,
    {
        Self::from_shared(Arc::new(scheduler))
    }

    /// Wraps a concrete scheduler held by shared ownership.
    ///
    /// The five operations capture clones of the provided handle, so the
    /// wrapper keeps the scheduler alive for as long as it is itself alive.
    pub fn from_shared<S>(scheduler: Arc<S>) -> Self
    where
        S: Scheduler<Time = T, Options = O> + ?Sized,
    {
        let s = scheduler.clone();
        let now_fn: NowFn<T> = Arc::new(move || s.now());
        let s = scheduler.clone();
        let minimum_tolerance_fn: MinimumToleranceFn<T::Duration> =
            Arc::new(move || s.minimum_tolerance());
        let s = scheduler.clone();
        let schedule_fn: ScheduleFn<O> = Arc::new(move |options, action| {
            s.schedule(options, action);
        });
        let s = scheduler.clone();
        let schedule_at_fn: ScheduleAtFn<T, T::Duration, O> =
            Arc::new(move |deadline, tolerance, options, action| {
                s.schedule_at(deadline, tolerance, options, action);
            });
        let s = scheduler;
        let schedule_periodic_fn: SchedulePeriodicFn<T, T::Duration, O> =
            Arc::new(move |deadline, period, tolerance, options, action| {
                s.schedule_periodic(deadline, period, tolerance, options, action)
            });

        Self {
            now_fn,
            minimum_tolerance_fn,
            schedule_fn,
            schedule_at_fn,
            schedule_periodic_fn,
        }
    }

    /// Builds a scheduler from the five raw operations.
    ///
    /// This is the escape hatch for schedulers that are not worth a dedicated
    /// type, such as a decorator shifting the deadlines of an existing
    /// scheduler. The closure implementing `schedule_periodic` is responsible
    /// for minting a [`ScheduleKey`] and honoring its cancellation.
    pub fn from_raw(
        now: impl Fn() -> T + Send + Sync + 'static,
        minimum_tolerance: impl Fn() -> T::Duration + Send + Sync + 'static,
        schedule: impl Fn(Option<O>, Action) + Send + Sync + 'static,
        schedule_at: impl Fn(T, T::Duration, Option<O>, Action) + Send + Sync + 'static,
        schedule_periodic: impl Fn(T, T::Duration, T::Duration, Option<O>, RepeatingAction) -> ScheduleKey
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            now_fn: Arc::new(now),
            minimum_tolerance_fn: Arc::new(minimum_tolerance),
            schedule_fn: Arc::new(schedule),
            schedule_at_fn: Arc::new(schedule_at),
            schedule_periodic_fn: Arc::new(schedule_periodic),
        }
    }
}

impl<T: SchedulerTime> AnyScheduler<T, ()> {
    /// Returns an erased [`ImmediateScheduler`] reading the provided time.
    pub fn immediate(now: T) -> Self {
        ImmediateScheduler::at(now).erased()
    }

    /// Returns an erased [`FailingScheduler`] reading the provided time.
    pub fn failing(
        now: T,
        label: impl Into<String>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        FailingScheduler::at(now, label, reporter).erased()
    }

    /// Returns an erased [`UnimplementedScheduler`] reading the provided
    /// time.
    pub fn unimplemented(
        now: T,
        label: impl Into<String>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        UnimplementedScheduler::at(now, label, reporter).erased()
    }
}

impl<T: SchedulerTime, O: Send + 'static> Scheduler for AnyScheduler<T, O> {
    type Time = T;
    type Options = O;

    fn now(&self) -> T {
        (self.now_fn)()
    }

    fn minimum_tolerance(&self) -> T::Duration {
        (self.minimum_tolerance_fn)()
    }

    fn schedule(&self, options: Option<O>, action: Action) {
        (self.schedule_fn)(options, action);
    }

    fn schedule_at(&self, deadline: T, tolerance: T::Duration, options: Option<O>, action: Action) {
        (self.schedule_at_fn)(deadline, tolerance, options, action);
    }

    fn schedule_periodic(
        &self,
        deadline: T,
        period: T::Duration,
        tolerance: T::Duration,
        options: Option<O>,
        action: RepeatingAction,
    ) -> ScheduleKey {
        (self.schedule_periodic_fn)(deadline, period, tolerance, options, action)
    }
}

impl<T: SchedulerTime, O> Clone for AnyScheduler<T, O> {
    fn clone(&self) -> Self {
        Self {
            now_fn: self.now_fn.clone(),
            minimum_tolerance_fn: self.minimum_tolerance_fn.clone(),
            schedule_fn: self.schedule_fn.clone(),
            schedule_at_fn: self.schedule_at_fn.clone(),
            schedule_periodic_fn: self.schedule_periodic_fn.clone(),
        }
    }
}

impl<T: SchedulerTime, O> fmt::Debug for AnyScheduler<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyScheduler").finish_non_exhaustive()
    }
}
