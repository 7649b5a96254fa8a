//! Schedulers that report any use to an injected failure reporter.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::time::{MonotonicTime, SchedulerTime};

use super::{Action, RepeatingAction, ScheduleKey, Scheduler};

/// A collaborator receiving misuse diagnostics from [`FailingScheduler`] and
/// [`UnimplementedScheduler`].
///
/// Reporters must be callable from any thread and should not panic;
/// [`PanicReporter`] is the deliberate exception.
pub trait FailureReporter: Send + Sync + 'static {
    /// Reports a misuse diagnostic.
    fn report(&self, message: &str);
}

/// A reporter that discards all diagnostics.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoReporter {}

impl NoReporter {
    /// Constructs a new `NoReporter` object.
    pub fn new() -> Self {
        Self {}
    }
}

impl FailureReporter for NoReporter {
    /// This method does nothing.
    fn report(&self, _: &str) {}
}

/// A reporter that panics with the reported message.
///
/// This is the right reporter for code paths that must never reach a
/// scheduler at all: any use aborts the test with the diagnostic as the
/// panic message.
#[derive(Copy, Clone, Debug, Default)]
pub struct PanicReporter {}

impl PanicReporter {
    /// Constructs a new `PanicReporter` object.
    pub fn new() -> Self {
        Self {}
    }
}

impl FailureReporter for PanicReporter {
    /// Panics with the reported message.
    fn report(&self, message: &str) {
        panic!("{}", message);
    }
}

/// A reporter that collects diagnostics for later inspection.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    /// Constructs a new `RecordingReporter` object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all diagnostics recorded so far, leaving the reporter empty.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap())
    }
}

impl FailureReporter for RecordingReporter {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// A scheduler that reports any use and otherwise does nothing.
///
/// Every operation, the read accessors included, first hands a diagnostic
/// built from the scheduler label and the operation name to the injected
/// [`FailureReporter`]. Reads then return the stored dummy values while
/// scheduling operations discard the action without running it; the periodic
/// variant returns a key whose cancellation has no effect.
///
/// This is the scheduler to inject into a code path that the test at hand is
/// not supposed to exercise: any scheduling activity surfaces as a reported
/// diagnostic instead of silent test pollution. Note that the convenience
/// methods of the [`Scheduler`] trait consult
/// [`now`](Scheduler::now) and
/// [`minimum_tolerance`](Scheduler::minimum_tolerance) before scheduling, so
/// a single `schedule_after` call produces several reports.
///
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use schedulix::scheduler::{FailingScheduler, RecordingReporter, Scheduler};
///
/// let reporter = Arc::new(RecordingReporter::new());
/// let scheduler = FailingScheduler::new("retry queue", reporter.clone());
///
/// scheduler.schedule(None, Box::new(|| unreachable!("the action never runs")));
///
/// assert_eq!(
///     reporter.take(),
///     ["scheduler \"retry queue\": unexpected call to schedule"]
/// );
/// ```
#[derive(Clone)]
pub struct FailingScheduler<T: SchedulerTime = MonotonicTime> {
    label: String,
    now: T,
    reporter: Arc<dyn FailureReporter>,
}

impl FailingScheduler<MonotonicTime> {
    /// Constructs a failing scheduler reading [`MonotonicTime::EPOCH`].
    pub fn new(label: impl Into<String>, reporter: Arc<dyn FailureReporter>) -> Self {
        Self::at(MonotonicTime::EPOCH, label, reporter)
    }
}

impl<T: SchedulerTime> FailingScheduler<T> {
    /// Constructs a failing scheduler reading the provided time.
    pub fn at(now: T, label: impl Into<String>, reporter: Arc<dyn FailureReporter>) -> Self {
        Self {
            label: label.into(),
            now,
            reporter,
        }
    }

    fn report(&self, operation: &str) {
        self.reporter.report(&format!(
            "scheduler \"{}\": unexpected call to {}",
            self.label, operation
        ));
    }
}

impl<T: SchedulerTime> Scheduler for FailingScheduler<T> {
    type Time = T;
    type Options = ();

    fn now(&self) -> T {
        self.report("now");
        self.now
    }

    fn minimum_tolerance(&self) -> T::Duration {
        self.report("minimum_tolerance");
        T::Duration::default()
    }

    fn schedule(&self, _options: Option<()>, _action: Action) {
        self.report("schedule");
    }

    fn schedule_at(
        &self,
        _deadline: T,
        _tolerance: T::Duration,
        _options: Option<()>,
        _action: Action,
    ) {
        self.report("schedule_at");
    }

    fn schedule_periodic(
        &self,
        _deadline: T,
        _period: T::Duration,
        _tolerance: T::Duration,
        _options: Option<()>,
        _action: RepeatingAction,
    ) -> ScheduleKey {
        self.report("schedule_periodic");

        ScheduleKey::new()
    }
}

impl<T: SchedulerTime> fmt::Debug for FailingScheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailingScheduler")
            .field("label", &self.label)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

/// A scheduler that reports any use and then performs the work anyway.
///
/// Like [`FailingScheduler`], every operation first hands a diagnostic to the
/// injected [`FailureReporter`]; unlike it, the scheduler then behaves as an
/// [`ImmediateScheduler`](super::ImmediateScheduler) would: reads return the
/// stored values and scheduling operations run the action synchronously, the
/// repeating variant exactly once, returning an ordinary key.
///
/// This is the placeholder for dependencies that are not wired up yet:
/// incomplete code keeps executing, while every use remains visible to the
/// reporter. The two reporting schedulers are distinct types on purpose;
/// which of "inert" and "performs the work" a test needs is part of its
/// design, not a tuning flag.
#[derive(Clone)]
pub struct UnimplementedScheduler<T: SchedulerTime = MonotonicTime> {
    label: String,
    now: T,
    reporter: Arc<dyn FailureReporter>,
}

impl UnimplementedScheduler<MonotonicTime> {
    /// Constructs an unimplemented scheduler reading [`MonotonicTime::EPOCH`].
    pub fn new(label: impl Into<String>, reporter: Arc<dyn FailureReporter>) -> Self {
        Self::at(MonotonicTime::EPOCH, label, reporter)
    }
}

impl<T: SchedulerTime> UnimplementedScheduler<T> {
    /// Constructs an unimplemented scheduler reading the provided time.
    pub fn at(now: T, label: impl Into<String>, reporter: Arc<dyn FailureReporter>) -> Self {
        Self {
            label: label.into(),
            now,
            reporter,
        }
    }

    fn report(&self, operation: &str) {
        self.reporter.report(&format!(
            "scheduler \"{}\": unexpected call to {}",
            self.label, operation
        ));
    }
}

impl<T: SchedulerTime> Scheduler for UnimplementedScheduler<T> {
    type Time = T;
    type Options = ();

    fn now(&self) -> T {
        self.report("now");
        self.now
    }

    fn minimum_tolerance(&self) -> T::Duration {
        self.report("minimum_tolerance");
        T::Duration::default()
    }

    fn schedule(&self, _options: Option<()>, action: Action) {
        self.report("schedule");
        action();
    }

    fn schedule_at(
        &self,
        _deadline: T,
        _tolerance: T::Duration,
        _options: Option<()>,
        action: Action,
    ) {
        self.report("schedule_at");
        action();
    }

    fn schedule_periodic(
        &self,
        _deadline: T,
        _period: T::Duration,
        _tolerance: T::Duration,
        _options: Option<()>,
        mut action: RepeatingAction,
    ) -> ScheduleKey {
        self.report("schedule_periodic");
        action();

        ScheduleKey::new()
    }
}

impl<T: SchedulerTime> fmt::Debug for UnimplementedScheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnimplementedScheduler")
            .field("label", &self.label)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}
