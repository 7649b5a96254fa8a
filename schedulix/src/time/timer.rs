//! Repeating asynchronous tick stream.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_channel::mpsc;
use futures_core::Stream;
use pin_project_lite::pin_project;

use crate::scheduler::{AutoScheduleKey, DurationOf, Scheduler};
use crate::time::SchedulerTime;

pin_project! {
    /// Stream returned by [`Scheduler::timer`].
    ///
    /// The stream is lazy: nothing is scheduled until it is first polled, at
    /// which point a repeating fire is scheduled one period past the current
    /// scheduler time. Each fire yields its nominal instant, that is the
    /// first deadline advanced by a whole number of periods, regardless of
    /// when the fire actually ran. Ticks are never dropped: a stream polled
    /// less often than the clock advances yields the backlog in order.
    ///
    /// Dropping the stream cancels the underlying repeating schedule. The
    /// stream itself only ends if the scheduler discards the schedule on its
    /// own, as an [`ImmediateScheduler`](crate::scheduler::ImmediateScheduler)
    /// does after its single synchronous occurrence.
    ///
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use futures_executor::LocalPool;
    /// use futures_util::stream::StreamExt;
    /// use futures_util::task::SpawnExt;
    ///
    /// use schedulix::scheduler::{Scheduler, VirtualScheduler};
    /// use schedulix::time::MonotonicTime;
    ///
    /// let t0 = MonotonicTime::EPOCH;
    /// let scheduler = VirtualScheduler::new(t0);
    /// let mut pool = LocalPool::new();
    ///
    /// let ticks = scheduler.timer(Duration::from_secs(10));
    /// let first_three = pool
    ///     .spawner()
    ///     .spawn_with_handle(async move { ticks.take(3).collect::<Vec<_>>().await })
    ///     .unwrap();
    ///
    /// let ticks = pool.run_until(async {
    ///     scheduler.advance_by_async(Duration::from_secs(30)).await;
    ///     first_three.await
    /// });
    /// assert_eq!(
    ///     ticks,
    ///     [
    ///         t0 + Duration::from_secs(10),
    ///         t0 + Duration::from_secs(20),
    ///         t0 + Duration::from_secs(30),
    ///     ]
    /// );
    /// ```
    #[must_use = "streams do nothing unless polled"]
    pub struct Timer<S: Scheduler> {
        scheduler: S,
        period: DurationOf<S>,
        tolerance: Option<DurationOf<S>>,
        options: Option<S::Options>,
        ticking: Option<Ticking<S::Time>>,
    }
}

struct Ticking<T> {
    ticks: mpsc::UnboundedReceiver<T>,
    // Cancels the repeating schedule when the stream is dropped.
    _key: AutoScheduleKey,
}

impl<S: Scheduler> Timer<S> {
    pub(crate) fn new(scheduler: S, period: DurationOf<S>) -> Self {
        Self {
            scheduler,
            period,
            tolerance: None,
            options: None,
            ticking: None,
        }
    }

    /// Sets the tolerance for the underlying schedule.
    ///
    /// Defaults to the scheduler's minimum tolerance. Has no effect once the
    /// stream was first polled.
    pub fn tolerance(mut self, tolerance: DurationOf<S>) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Sets the scheduling options for the underlying schedule.
    ///
    /// Has no effect once the stream was first polled.
    pub fn options(mut self, options: S::Options) -> Self {
        self.options = Some(options);
        self
    }
}

impl<S: Scheduler> Stream for Timer<S> {
    type Item = S::Time;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        let ticking = match this.ticking {
            Some(ticking) => ticking,
            None => {
                let (sender, receiver) = mpsc::unbounded();
                let period = *this.period;
                let first = this.scheduler.now().advanced_by(period);
                let tolerance = this
                    .tolerance
                    .take()
                    .unwrap_or_else(|| this.scheduler.minimum_tolerance());
                let mut next = first;
                let key = this.scheduler.schedule_periodic(
                    first,
                    period,
                    tolerance,
                    this.options.take(),
                    Box::new(move || {
                        let _ = sender.unbounded_send(next);
                        next = next.advanced_by(period);
                    }),
                );

                this.ticking.insert(Ticking {
                    ticks: receiver,
                    _key: key.into_auto(),
                })
            }
        };

        Pin::new(&mut ticking.ticks).poll_next(cx)
    }
}

impl<S: Scheduler> fmt::Debug for Timer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("period", &self.period)
            .field("is_ticking", &self.ticking.is_some())
            .finish_non_exhaustive()
    }
}
