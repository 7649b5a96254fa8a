//! A scheduling abstraction for deterministic, virtual-time testing of
//! time-driven asynchronous code.
//!
//! Schedulix separates *what* is scheduled from *when, and on which clock* it
//! runs. Code that delays, debounces, polls, retries or ticks is written
//! against the [`Scheduler`](scheduler::Scheduler) capability; production
//! wires in a scheduler bound to a real clock while tests wire in a
//! [`VirtualScheduler`](scheduler::VirtualScheduler), whose clock only moves
//! when the test advances it. Time-dependent logic then becomes exactly as
//! fast and as deterministic as any other logic: no real waiting, no flaky
//! sleeps, the same fire order on every execution.
//!
//! The crate provides the capability trait, a precisely specified virtual
//! scheduler and a small lineup of companions:
//!
//! * [`VirtualScheduler`](scheduler::VirtualScheduler) owns a virtual clock
//!   advanced explicitly with
//!   [`advance_to`](scheduler::VirtualScheduler::advance_to),
//!   [`advance_by`](scheduler::VirtualScheduler::advance_by),
//!   [`run`](scheduler::VirtualScheduler::run) or their suspension-aware
//!   `_async` variants,
//! * [`ImmediateScheduler`](scheduler::ImmediateScheduler) runs every action
//!   synchronously, collapsing time altogether,
//! * [`FailingScheduler`](scheduler::FailingScheduler) and
//!   [`UnimplementedScheduler`](scheduler::UnimplementedScheduler) report any
//!   use to an injected [`FailureReporter`](scheduler::FailureReporter),
//! * [`AnyScheduler`](scheduler::AnyScheduler) erases any scheduler behind
//!   one concrete type.
//!
//! Schedulers bound to real clocks are intentionally left to integrators:
//! any type providing the five core operations of the capability, typically
//! over [`std::time::Instant`], drives the same generic code, including the
//! asynchronous [`Sleep`](time::Sleep) and [`Timer`](time::Timer)
//! primitives.
//!
//!
//! # A deterministic timeline
//!
//! Actions fire in `(fire time, submission order)` order. Repeating
//! schedules keep the rank of their original submission at every occurrence,
//! so interleaved timers resolve their collisions identically at every
//! collision, on every run:
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//!
//! use schedulix::scheduler::{Scheduler, VirtualScheduler};
//! use schedulix::time::MonotonicTime;
//!
//! let scheduler = VirtualScheduler::new(MonotonicTime::EPOCH);
//! let log = Arc::new(Mutex::new(Vec::new()));
//!
//! let l = log.clone();
//! let fast = scheduler.schedule_repeating(
//!     Duration::from_secs(2),
//!     Duration::from_secs(2),
//!     move || l.lock().unwrap().push("fast"),
//! );
//! let l = log.clone();
//! let slow = scheduler.schedule_repeating(
//!     Duration::from_secs(3),
//!     Duration::from_secs(3),
//!     move || l.lock().unwrap().push("slow"),
//! );
//!
//! for _ in 0..6 {
//!     scheduler.advance_by(Duration::from_secs(1));
//! }
//!
//! // At second 6 both schedules collide; the one submitted first fires
//! // first, as it will at every future collision.
//! assert_eq!(
//!     *log.lock().unwrap(),
//!     ["fast", "slow", "fast", "fast", "slow"]
//! );
//!
//! fast.cancel();
//! slow.cancel();
//! ```
//!
//!
//! # Asynchronous code under test
//!
//! The `_async` advancing methods cooperatively yield to the surrounding
//! task runtime between drain iterations, so tasks suspended on
//! [`sleep`](scheduler::Scheduler::sleep) or
//! [`timer`](scheduler::Scheduler::timer) get to resume and schedule their
//! follow-up work while the clock is still at the instant they were woken
//! at:
//!
//! ```
//! use std::time::Duration;
//!
//! use futures_executor::LocalPool;
//! use futures_util::task::SpawnExt;
//!
//! use schedulix::scheduler::{Scheduler, VirtualScheduler};
//! use schedulix::time::MonotonicTime;
//!
//! let scheduler = VirtualScheduler::new(MonotonicTime::EPOCH);
//! let mut pool = LocalPool::new();
//!
//! let s = scheduler.clone();
//! let wakes = pool
//!     .spawner()
//!     .spawn_with_handle(async move {
//!         s.sleep(Duration::from_millis(300)).await;
//!         let first = s.now();
//!         s.sleep(Duration::from_millis(300)).await;
//!         (first, s.now())
//!     })
//!     .unwrap();
//!
//! let (first, second) = pool.run_until(async {
//!     scheduler.advance_by_async(Duration::from_secs(1)).await;
//!     wakes.await
//! });
//! assert_eq!(first, MonotonicTime::EPOCH + Duration::from_millis(300));
//! assert_eq!(second, MonotonicTime::EPOCH + Duration::from_millis(600));
//! ```
//!
//! Further details are available in the documentation of the different
//! modules:
//!
//! * the [`scheduler`] module documents the capability, the exact fire order
//!   of the virtual clock, cancellation and the reporting schedulers,
//! * the [`time`] module documents the timestamp format, the deadline sugar
//!   and the asynchronous [`Sleep`](time::Sleep) and [`Timer`](time::Timer)
//!   primitives.
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod scheduler;
pub mod time;
pub(crate) mod util;
