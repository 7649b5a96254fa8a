//! Scheduling capability and the schedulers implementing it.
//!
//! This module provides most notably:
//!
//! * [`Scheduler`]: the capability trait abstracting over *when* and *on what
//!   clock* work is executed,
//! * [`VirtualScheduler`]: a deterministic scheduler owning a virtual clock
//!   that only moves when explicitly advanced,
//! * [`AnyScheduler`]: a type-erased scheduler wrapper,
//! * [`ImmediateScheduler`]: a scheduler executing everything synchronously,
//! * [`FailingScheduler`] and [`UnimplementedScheduler`]: schedulers that
//!   report any use to a [`FailureReporter`].
//!
//! Code written against the capability runs unchanged against any of these
//! schedulers, so production code bound to a real clock can be exercised in
//! tests against a virtual clock, with time advanced explicitly and no real
//! waiting involved.
//!
//!
//! # Examples
//!
//! A repeating schedule driven by a virtual clock:
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use schedulix::scheduler::{Scheduler, VirtualScheduler};
//! use schedulix::time::MonotonicTime;
//!
//! let scheduler = VirtualScheduler::new(MonotonicTime::EPOCH);
//! let tally = Arc::new(AtomicUsize::new(0));
//!
//! let t = tally.clone();
//! let key = scheduler.schedule_repeating(
//!     Duration::from_secs(1),
//!     Duration::from_secs(1),
//!     move || {
//!         t.fetch_add(1, Ordering::Relaxed);
//!     },
//! );
//!
//! scheduler.advance_by(Duration::from_secs(3));
//! assert_eq!(tally.load(Ordering::Relaxed), 3);
//!
//! key.cancel();
//! scheduler.advance_by(Duration::from_secs(3));
//! assert_eq!(tally.load(Ordering::Relaxed), 3);
//! ```

mod any;
mod immediate;
mod report;
mod virtual_clock;

use std::hash::{Hash, Hasher};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::time::{Deadline, SchedulerTime, Sleep, Timer};

pub use any::AnyScheduler;
pub use immediate::ImmediateScheduler;
pub use report::{
    FailingScheduler, FailureReporter, NoReporter, PanicReporter, RecordingReporter,
    UnimplementedScheduler,
};
pub use virtual_clock::VirtualScheduler;

/// A one-shot scheduled action.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// A repeating scheduled action.
pub type RepeatingAction = Box<dyn FnMut() + Send + 'static>;

/// Duration type of a scheduler's time.
pub type DurationOf<S> = <<S as Scheduler>::Time as SchedulerTime>::Duration;

/// A capability to execute work at a scheduler-defined point of a
/// scheduler-defined timeline.
///
/// The trait deliberately says nothing about *where* actions run: an
/// implementation may hand them to a thread pool, a run loop or, like
/// [`VirtualScheduler`], run them on the thread that advances its clock. What
/// it does pin down is the fire order: an action never fires before its
/// deadline, and actions due at the same instant fire in submission order,
/// including the later occurrences of repeating schedules.
///
/// The three scheduling methods take an absolute deadline and boxed actions;
/// they are object-safe and constitute the whole surface an implementor must
/// provide, together with [`now`](Scheduler::now) and
/// [`minimum_tolerance`](Scheduler::minimum_tolerance). The provided methods
/// ([`schedule_now`](Scheduler::schedule_now),
/// [`schedule_after`](Scheduler::schedule_after),
/// [`schedule_repeating`](Scheduler::schedule_repeating),
/// [`sleep`](Scheduler::sleep), [`timer`](Scheduler::timer) and
/// [`erased`](Scheduler::erased)) are conveniences layered on top of them.
///
/// A deadline lying in the past is valid and makes the action due
/// immediately; it fires the next time the scheduler executes anything. A
/// zero repetition period is accepted by [`VirtualScheduler`] (each occurrence
/// still requires one drain iteration) but makes unbounded draining methods
/// such as [`VirtualScheduler::run`] diverge unless the schedule is
/// cancelled.
pub trait Scheduler: Send + Sync + 'static {
    /// Scheduler time.
    type Time: SchedulerTime;

    /// Implementation-specific scheduling options, passed through unexamined
    /// by generic code; `()` for all built-in schedulers.
    type Options: Send + 'static;

    /// Returns the current scheduler time.
    fn now(&self) -> Self::Time;

    /// Returns the smallest timing slack this scheduler can honor.
    ///
    /// Schedulers that never fire late, like [`VirtualScheduler`] and
    /// [`ImmediateScheduler`], return the zero duration.
    fn minimum_tolerance(&self) -> DurationOf<Self>;

    /// Schedules an action to run at the next opportunity, exactly once.
    fn schedule(&self, options: Option<Self::Options>, action: Action);

    /// Schedules an action to run once, no earlier than `deadline`.
    ///
    /// The action may fire up to `tolerance` after its deadline on schedulers
    /// that trade timing accuracy for efficiency; deterministic schedulers
    /// ignore the tolerance.
    fn schedule_at(
        &self,
        deadline: Self::Time,
        tolerance: DurationOf<Self>,
        options: Option<Self::Options>,
        action: Action,
    );

    /// Schedules an action to run at `deadline` and every `period` thereafter
    /// until the returned key is cancelled.
    fn schedule_periodic(
        &self,
        deadline: Self::Time,
        period: DurationOf<Self>,
        tolerance: DurationOf<Self>,
        options: Option<Self::Options>,
        action: RepeatingAction,
    ) -> ScheduleKey;

    /// Schedules an action to run at the next opportunity, with default
    /// options.
    fn schedule_now(&self, action: impl FnOnce() + Send + 'static)
    where
        Self: Sized,
    {
        self.schedule(None, Box::new(action));
    }

    /// Schedules an action to run once at an absolute or relative deadline,
    /// with the minimum tolerance and default options.
    fn schedule_after(
        &self,
        deadline: impl Deadline<Self::Time>,
        action: impl FnOnce() + Send + 'static,
    ) where
        Self: Sized,
    {
        let deadline = deadline.into_time(self.now());
        self.schedule_at(deadline, self.minimum_tolerance(), None, Box::new(action));
    }

    /// Schedules a repeating action starting at an absolute or relative
    /// deadline, with the minimum tolerance and default options.
    fn schedule_repeating(
        &self,
        deadline: impl Deadline<Self::Time>,
        period: DurationOf<Self>,
        action: impl FnMut() + Send + 'static,
    ) -> ScheduleKey
    where
        Self: Sized,
    {
        let deadline = deadline.into_time(self.now());
        self.schedule_periodic(
            deadline,
            period,
            self.minimum_tolerance(),
            None,
            Box::new(action),
        )
    }

    /// Returns a future that completes once the scheduler time has advanced
    /// by the provided duration.
    ///
    /// See [`Sleep`] for the exact scheduling and cancellation behavior.
    fn sleep(&self, duration: DurationOf<Self>) -> Sleep<Self>
    where
        Self: Clone + Sized,
    {
        Sleep::new(self.clone(), duration)
    }

    /// Returns a stream that yields the scheduler time every `period`,
    /// starting one period from now.
    ///
    /// See [`Timer`] for the exact scheduling and cancellation behavior.
    fn timer(&self, period: DurationOf<Self>) -> Timer<Self>
    where
        Self: Clone + Sized,
    {
        Timer::new(self.clone(), period)
    }

    /// Wraps this scheduler into a type-erased [`AnyScheduler`].
    fn erased(self) -> AnyScheduler<Self::Time, Self::Options>
    where
        Self: Sized,
    {
        AnyScheduler::new(self)
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    type Time = S::Time;
    type Options = S::Options;

    fn now(&self) -> Self::Time {
        (**self).now()
    }

    fn minimum_tolerance(&self) -> DurationOf<Self> {
        (**self).minimum_tolerance()
    }

    fn schedule(&self, options: Option<Self::Options>, action: Action) {
        (**self).schedule(options, action);
    }

    fn schedule_at(
        &self,
        deadline: Self::Time,
        tolerance: DurationOf<Self>,
        options: Option<Self::Options>,
        action: Action,
    ) {
        (**self).schedule_at(deadline, tolerance, options, action);
    }

    fn schedule_periodic(
        &self,
        deadline: Self::Time,
        period: DurationOf<Self>,
        tolerance: DurationOf<Self>,
        options: Option<Self::Options>,
        action: RepeatingAction,
    ) -> ScheduleKey {
        (**self).schedule_periodic(deadline, period, tolerance, options, action)
    }
}

/// Handle to a repeating schedule.
///
/// A `ScheduleKey` can be used to cancel the schedule it was returned for.
/// Cancellation is cooperative: it is idempotent, it is a no-op once the
/// schedule is over, and a cancellation racing with an in-flight occurrence
/// may let that single occurrence complete.
#[derive(Clone, Debug, Default)]
#[must_use = "a schedule key that is immediately dropped cannot cancel its schedule"]
pub struct ScheduleKey {
    is_cancelled: Arc<AtomicBool>,
}

impl ScheduleKey {
    /// Creates a key for a pending schedule.
    ///
    /// Scheduler implementors mint a key per repeating schedule, keep a clone
    /// of it alongside the scheduled entry and watch
    /// [`is_cancelled`](ScheduleKey::is_cancelled) to honor cancellation.
    pub fn new() -> Self {
        Self {
            is_cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Checks whether the schedule was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled.load(Ordering::Relaxed)
    }

    /// Cancels the associated schedule.
    pub fn cancel(self) {
        self.is_cancelled.store(true, Ordering::Relaxed);
    }

    /// Converts the key to a managed key.
    pub fn into_auto(self) -> AutoScheduleKey {
        AutoScheduleKey {
            is_cancelled: self.is_cancelled,
        }
    }
}

impl PartialEq for ScheduleKey {
    /// Implements equality between clones of the same key, not between
    /// distinct keys that happen to agree on their cancellation status.
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(&*self.is_cancelled, &*other.is_cancelled)
    }
}

impl Eq for ScheduleKey {}

impl Hash for ScheduleKey {
    /// Implements `Hash` by key identity, consistently with the `PartialEq`
    /// implementation.
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        ptr::hash(&*self.is_cancelled, state)
    }
}

/// Managed handle to a repeating schedule.
///
/// An `AutoScheduleKey` is a managed handle to a repeating schedule that
/// cancels the schedule on drop.
#[derive(Debug)]
#[must_use = "managed schedule key shall be used"]
pub struct AutoScheduleKey {
    is_cancelled: Arc<AtomicBool>,
}

impl Drop for AutoScheduleKey {
    fn drop(&mut self) {
        self.is_cancelled.store(true, Ordering::Relaxed);
    }
}
