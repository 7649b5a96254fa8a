//! One-shot asynchronous delay.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_channel::oneshot;
use pin_project_lite::pin_project;

use crate::scheduler::{DurationOf, Scheduler};
use crate::time::SchedulerTime;

pin_project! {
    /// Future returned by [`Scheduler::sleep`].
    ///
    /// The future is lazy: nothing is scheduled until it is first polled, at
    /// which point a one-shot fire is scheduled for the current scheduler
    /// time advanced by the sleep duration. The future completes when that
    /// fire occurs. Dropping it before the first poll therefore schedules
    /// nothing at all, and dropping it afterwards merely lets the fire go
    /// unobserved.
    ///
    /// If the scheduler discards the fire without ever running it, as a
    /// [`FailingScheduler`](crate::scheduler::FailingScheduler) does, the
    /// future stays pending forever.
    ///
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use futures_executor::LocalPool;
    /// use futures_util::task::SpawnExt;
    ///
    /// use schedulix::scheduler::{Scheduler, VirtualScheduler};
    /// use schedulix::time::MonotonicTime;
    ///
    /// let scheduler = VirtualScheduler::new(MonotonicTime::EPOCH);
    /// let mut pool = LocalPool::new();
    ///
    /// let s = scheduler.clone();
    /// let slept = pool
    ///     .spawner()
    ///     .spawn_with_handle(async move {
    ///         s.sleep(Duration::from_secs(60)).await;
    ///         s.now()
    ///     })
    ///     .unwrap();
    ///
    /// let woke_at = pool.run_until(async {
    ///     scheduler.advance_by_async(Duration::from_secs(60)).await;
    ///     slept.await
    /// });
    /// assert_eq!(woke_at, MonotonicTime::EPOCH + Duration::from_secs(60));
    /// ```
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct Sleep<S: Scheduler> {
        scheduler: S,
        duration: DurationOf<S>,
        tolerance: Option<DurationOf<S>>,
        options: Option<S::Options>,
        state: SleepState,
    }
}

enum SleepState {
    Idle,
    Armed { fire: oneshot::Receiver<()> },
    Stalled,
}

impl<S: Scheduler> Sleep<S> {
    pub(crate) fn new(scheduler: S, duration: DurationOf<S>) -> Self {
        Self {
            scheduler,
            duration,
            tolerance: None,
            options: None,
            state: SleepState::Idle,
        }
    }

    /// Sets the tolerance for the underlying schedule.
    ///
    /// Defaults to the scheduler's minimum tolerance. Has no effect once the
    /// future was first polled.
    pub fn tolerance(mut self, tolerance: DurationOf<S>) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Sets the scheduling options for the underlying schedule.
    ///
    /// Has no effect once the future was first polled.
    pub fn options(mut self, options: S::Options) -> Self {
        self.options = Some(options);
        self
    }
}

impl<S: Scheduler> Future for Sleep<S> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let SleepState::Idle = this.state {
            let (sender, receiver) = oneshot::channel();
            let deadline = this.scheduler.now().advanced_by(*this.duration);
            let tolerance = this
                .tolerance
                .take()
                .unwrap_or_else(|| this.scheduler.minimum_tolerance());
            this.scheduler.schedule_at(
                deadline,
                tolerance,
                this.options.take(),
                Box::new(move || {
                    let _ = sender.send(());
                }),
            );
            *this.state = SleepState::Armed { fire: receiver };
        }

        match this.state {
            SleepState::Armed { fire } => match Pin::new(fire).poll(cx) {
                Poll::Ready(Ok(())) => Poll::Ready(()),
                // The fire was discarded without running; the sleep can
                // never complete.
                Poll::Ready(Err(oneshot::Canceled)) => {
                    *this.state = SleepState::Stalled;
                    Poll::Pending
                }
                Poll::Pending => Poll::Pending,
            },
            SleepState::Stalled => Poll::Pending,
            SleepState::Idle => unreachable!(),
        }
    }
}

impl<S: Scheduler> fmt::Debug for Sleep<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            SleepState::Idle => "Idle",
            SleepState::Armed { .. } => "Armed",
            SleepState::Stalled => "Stalled",
        };
        f.debug_struct("Sleep")
            .field("state", &state)
            .finish_non_exhaustive()
    }
}
