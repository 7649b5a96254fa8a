//! Scheduler time and asynchronous time primitives.
//!
//! This module provides most notably:
//!
//! * [`SchedulerTime`]: the instant abstraction schedulers are generic over,
//!   implemented by [`MonotonicTime`] and [`std::time::Instant`],
//! * [`Deadline`]: a trait unifying absolute instants and relative delays
//!   when specifying when an action should run,
//! * [`Sleep`] and [`Timer`]: asynchronous delay primitives built solely on
//!   the [`Scheduler`](crate::scheduler::Scheduler) capability.
//!
//! [`MonotonicTime`], re-exported from the [`tai_time`] crate, is a monotonic
//! timestamp based on the [TAI] time standard and is the canonical scheduler
//! time used by all built-in schedulers.
//!
//! [TAI]: https://en.wikipedia.org/wiki/International_Atomic_Time
//!
//!
//! # Examples
//!
//! Deadlines can be specified as absolute timestamps or as durations relative
//! to the current scheduler time:
//!
//! ```
//! use std::time::Duration;
//!
//! use schedulix::scheduler::{Scheduler, VirtualScheduler};
//! use schedulix::time::MonotonicTime;
//!
//! let t0 = MonotonicTime::EPOCH;
//! let scheduler = VirtualScheduler::new(t0);
//!
//! scheduler.schedule_after(Duration::from_secs(2), || println!("beep"));
//! scheduler.schedule_after(t0 + Duration::from_secs(4), || println!("beep"));
//!
//! scheduler.advance_by(Duration::from_secs(4));
//! assert_eq!(scheduler.now(), t0 + Duration::from_secs(4));
//! ```

use std::fmt;
use std::time::{Duration, Instant};

mod sleep;
mod timer;

pub use tai_time::MonotonicTime;

pub use sleep::Sleep;
pub use timer::Timer;

/// A monotonic instant usable as scheduler time.
///
/// The associated [`Duration`](SchedulerTime::Duration) type is the stride
/// between two instants. A default-constructed duration must be the zero
/// stride, which stands for "no delay" and "no tolerance" throughout this
/// crate.
///
/// Implementations are provided for [`MonotonicTime`], the canonical virtual
/// timestamp, and for [`std::time::Instant`], the natural choice for
/// schedulers backed by a real clock.
pub trait SchedulerTime: Copy + Ord + Send + Sync + fmt::Debug + 'static {
    /// Stride between two instants.
    type Duration: Copy + Ord + Default + Send + Sync + fmt::Debug + 'static;

    /// Returns this instant advanced by the provided duration.
    fn advanced_by(self, duration: Self::Duration) -> Self;

    /// Returns the duration elapsed from `earlier` to this instant, or the
    /// zero duration if `earlier` is not earlier than this instant.
    fn saturating_duration_since(self, earlier: Self) -> Self::Duration;
}

impl SchedulerTime for MonotonicTime {
    type Duration = Duration;

    #[inline(always)]
    fn advanced_by(self, duration: Duration) -> Self {
        self + duration
    }

    fn saturating_duration_since(self, earlier: Self) -> Duration {
        if self <= earlier {
            Duration::ZERO
        } else {
            self.duration_since(earlier)
        }
    }
}

impl SchedulerTime for Instant {
    type Duration = Duration;

    #[inline(always)]
    fn advanced_by(self, duration: Duration) -> Self {
        self + duration
    }

    fn saturating_duration_since(self, earlier: Self) -> Duration {
        Instant::saturating_duration_since(&self, earlier)
    }
}

/// Trait unifying absolute instants and relative delays as deadlines.
///
/// This trait is implemented by [`std::time::Duration`], [`MonotonicTime`]
/// and [`std::time::Instant`]. A duration deadline is interpreted relative to
/// the current scheduler time.
pub trait Deadline<T: SchedulerTime> {
    /// Resolves this deadline to an absolute instant, taking `now` as the
    /// reference for relative deadlines.
    fn into_time(self, now: T) -> T;
}

impl Deadline<MonotonicTime> for Duration {
    #[inline(always)]
    fn into_time(self, now: MonotonicTime) -> MonotonicTime {
        now + self
    }
}

impl Deadline<MonotonicTime> for MonotonicTime {
    #[inline(always)]
    fn into_time(self, _: MonotonicTime) -> MonotonicTime {
        self
    }
}

impl Deadline<Instant> for Duration {
    #[inline(always)]
    fn into_time(self, now: Instant) -> Instant {
        now + self
    }
}

impl Deadline<Instant> for Instant {
    #[inline(always)]
    fn into_time(self, _: Instant) -> Instant {
        self
    }
}
