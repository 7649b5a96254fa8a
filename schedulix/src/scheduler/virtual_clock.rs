//! Deterministic scheduler owning a virtual clock.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::time::{MonotonicTime, SchedulerTime};
use crate::util::futures::yield_now;
use crate::util::pending_queue::PendingQueue;

use super::{Action, RepeatingAction, ScheduleKey, Scheduler};

/// Number of cooperative yields performed before each drain iteration by the
/// `_async` advancing methods.
const DEFAULT_YIELD_COUNT: usize = 20;

/// A deterministic scheduler owning a virtual clock.
///
/// The clock starts at the timestamp provided to
/// [`new`](VirtualScheduler::new) and only ever moves when one of the
/// advancing methods is called: [`advance_to`](VirtualScheduler::advance_to),
/// [`advance_by`](VirtualScheduler::advance_by),
/// [`run`](VirtualScheduler::run) or their `_async` counterparts. No real
/// time is involved at any point, so a test exercising hours of scheduled
/// work completes in microseconds and yields the same fire order on every
/// execution.
///
/// Pending entries fire in `(fire time, submission order)` order. A repeating
/// entry keeps the submission rank of its original `schedule_periodic` call
/// for all its occurrences, so two interleaved repeating schedules resolve
/// their collisions the same way at every collision. Entries are fired one at
/// a time with the internal lock released, which makes it legal for an action
/// to schedule further work, even at the current instant, or to cancel any
/// schedule, including its own.
///
/// The scheduler is a cheaply clonable handle to shared state: clones
/// schedule onto, and advance, the same clock. It is meant to be driven from
/// one thread while being scheduled onto from any number of threads.
///
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// use schedulix::scheduler::{Scheduler, VirtualScheduler};
/// use schedulix::time::MonotonicTime;
///
/// let scheduler = VirtualScheduler::new(MonotonicTime::EPOCH);
/// let fired = Arc::new(Mutex::new(Vec::new()));
///
/// let f = fired.clone();
/// scheduler.schedule_after(Duration::from_secs(1), move || f.lock().unwrap().push(1));
/// let f = fired.clone();
/// scheduler.schedule_after(Duration::from_secs(2), move || f.lock().unwrap().push(2));
///
/// scheduler.advance_by(Duration::from_secs(1));
/// assert_eq!(*fired.lock().unwrap(), [1]);
///
/// scheduler.advance_by(Duration::from_secs(1));
/// assert_eq!(*fired.lock().unwrap(), [1, 2]);
/// ```
#[derive(Clone)]
pub struct VirtualScheduler<T: SchedulerTime = MonotonicTime> {
    state: Arc<Mutex<SchedulerState<T>>>,
    yield_count: usize,
}

impl<T: SchedulerTime> VirtualScheduler<T> {
    /// Creates a scheduler with its virtual clock set to `start`.
    pub fn new(start: T) -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState {
                now: start,
                queue: PendingQueue::new(),
            })),
            yield_count: DEFAULT_YIELD_COUNT,
        }
    }

    /// Sets the number of cooperative yields performed before each drain
    /// iteration by the `_async` advancing methods.
    ///
    /// More yields give concurrently running tasks more opportunities to
    /// schedule follow-up work before the clock moves further; the default is
    /// 20. This only affects the handle it is called on, not existing clones.
    pub fn with_yield_count(mut self, yield_count: usize) -> Self {
        self.yield_count = yield_count;
        self
    }

    /// Advances the virtual clock to `deadline`, firing all entries due up to
    /// and including it.
    ///
    /// Entries are fired one at a time, so work scheduled by a fired action
    /// is itself fired within the same call if it is due no later than
    /// `deadline`. Upon return the clock reads `deadline`, whether or not an
    /// entry was due at that instant; a deadline not later than the current
    /// time leaves the clock in place and only fires the entries that are
    /// already due.
    pub fn advance_to(&self, deadline: T) {
        while self.fire_next_upto(deadline) {}
    }

    /// Advances the virtual clock by `delta`, firing all entries due up to
    /// and including the resulting instant.
    ///
    /// A zero `delta` fires the entries due at the current time without
    /// moving the clock.
    pub fn advance_by(&self, delta: T::Duration) {
        let deadline = self.state.lock().unwrap().now.advanced_by(delta);
        self.advance_to(deadline);
    }

    /// Fires all pending entries in deadline order, moving the clock along,
    /// until the queue is empty.
    ///
    /// Each iteration advances the clock by the saturating distance to the
    /// earliest pending entry, so entries already due fire without the clock
    /// moving. This method does not return while an uncancelled repeating
    /// schedule remains pending; bounding such a call is the caller's
    /// responsibility.
    pub fn run(&self) {
        while let Some(deadline) = self.next_deadline() {
            self.advance_to(deadline);
        }
    }

    /// Advances the virtual clock to `deadline` like
    /// [`advance_to`](VirtualScheduler::advance_to), cooperatively yielding
    /// to the surrounding task runtime before each drain iteration.
    ///
    /// The yields give suspended tasks that were woken by a fired entry a
    /// chance to resume and schedule follow-up work before the clock moves
    /// further. This is a best-effort interleaving: a task that needs more
    /// wake-ups than the configured yield count to reach its next scheduling
    /// call may observe the clock past the instant it expected.
    pub async fn advance_to_async(&self, deadline: T) {
        loop {
            for _ in 0..self.yield_count {
                yield_now().await;
            }
            if !self.fire_next_upto(deadline) {
                return;
            }
        }
    }

    /// Advances the virtual clock by `delta` like
    /// [`advance_by`](VirtualScheduler::advance_by), cooperatively yielding
    /// to the surrounding task runtime before each drain iteration.
    pub async fn advance_by_async(&self, delta: T::Duration) {
        let deadline = self.state.lock().unwrap().now.advanced_by(delta);
        self.advance_to_async(deadline).await;
    }

    /// Fires all pending entries like [`run`](VirtualScheduler::run),
    /// cooperatively yielding to the surrounding task runtime before each
    /// drain iteration.
    pub async fn run_async(&self) {
        loop {
            for _ in 0..self.yield_count {
                yield_now().await;
            }
            match self.next_deadline() {
                Some(deadline) => self.advance_to_async(deadline).await,
                None => return,
            }
        }
    }

    // Computes the deadline of the next `run` iteration: the current time
    // advanced by the saturating distance to the earliest pending entry.
    fn next_deadline(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        state.discard_cancelled();
        let (fire_at, _, _) = state.queue.peek()?;
        let now = state.now;

        Some(now.advanced_by(fire_at.saturating_duration_since(now)))
    }

    // Fires the earliest pending entry if it is due no later than `deadline`
    // and returns whether an entry was fired.
    //
    // Once no entry is due anymore the clock is brought up to `deadline`,
    // unless it is already past it. The lock is not held while the action
    // runs, so the action can itself schedule and cancel entries; a repeating
    // entry is re-enqueued under its original sequence number afterwards,
    // unless it was cancelled in the meantime.
    fn fire_next_upto(&self, deadline: T) -> bool {
        let mut state = self.state.lock().unwrap();
        state.discard_cancelled();

        match state.queue.peek() {
            Some((fire_at, _, _)) if fire_at <= deadline => {}
            _ => {
                // The clock never moves backward.
                if state.now < deadline {
                    state.now = deadline;
                }
                return false;
            }
        }

        // The peek above guarantees that an entry is available.
        let (fire_at, seq, entry) = state.queue.pull().unwrap();

        // Entries scheduled in the past fire without moving the clock
        // backward.
        if state.now < fire_at {
            state.now = fire_at;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(now = ?state.now, seq, "firing scheduled entry");

        drop(state);

        match entry {
            ScheduledEntry::Once(action) => action(),
            ScheduledEntry::Repeating {
                mut action,
                period,
                key,
            } => {
                action();
                if !key.is_cancelled() {
                    let mut state = self.state.lock().unwrap();
                    state.queue.insert_reused(
                        fire_at.advanced_by(period),
                        seq,
                        ScheduledEntry::Repeating {
                            action,
                            period,
                            key,
                        },
                    );
                }
            }
        }

        true
    }
}

impl<T: SchedulerTime> Scheduler for VirtualScheduler<T> {
    type Time = T;
    type Options = ();

    fn now(&self) -> T {
        self.state.lock().unwrap().now
    }

    fn minimum_tolerance(&self) -> T::Duration {
        T::Duration::default()
    }

    fn schedule(&self, _options: Option<()>, action: Action) {
        let mut state = self.state.lock().unwrap();
        let now = state.now;
        state.queue.insert(now, ScheduledEntry::Once(action));
    }

    fn schedule_at(
        &self,
        deadline: T,
        _tolerance: T::Duration,
        _options: Option<()>,
        action: Action,
    ) {
        let mut state = self.state.lock().unwrap();
        state.queue.insert(deadline, ScheduledEntry::Once(action));
    }

    fn schedule_periodic(
        &self,
        deadline: T,
        period: T::Duration,
        _tolerance: T::Duration,
        _options: Option<()>,
        action: RepeatingAction,
    ) -> ScheduleKey {
        let key = ScheduleKey::new();
        let mut state = self.state.lock().unwrap();
        state.queue.insert(
            deadline,
            ScheduledEntry::Repeating {
                action,
                period,
                key: key.clone(),
            },
        );

        key
    }
}

impl<T: SchedulerTime> fmt::Debug for VirtualScheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualScheduler")
            .field("now", &self.state.lock().unwrap().now)
            .field("yield_count", &self.yield_count)
            .finish_non_exhaustive()
    }
}

struct SchedulerState<T: SchedulerTime> {
    now: T,
    queue: PendingQueue<T, ScheduledEntry<T::Duration>>,
}

impl<T: SchedulerTime> SchedulerState<T> {
    // Discards cancelled entries sitting at the front of the queue.
    fn discard_cancelled(&mut self) {
        while let Some((_, _, entry)) = self.queue.peek() {
            if !entry.is_cancelled() {
                break;
            }
            self.queue.pull();
        }
    }
}

enum ScheduledEntry<D> {
    Once(Action),
    Repeating {
        action: RepeatingAction,
        period: D,
        key: ScheduleKey,
    },
}

impl<D> ScheduledEntry<D> {
    fn is_cancelled(&self) -> bool {
        match self {
            Self::Once(_) => false,
            Self::Repeating { key, .. } => key.is_cancelled(),
        }
    }
}
