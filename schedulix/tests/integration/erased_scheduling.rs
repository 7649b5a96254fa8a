//! Scheduling through a type-erased scheduler.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use schedulix::scheduler::{AnyScheduler, ImmediateScheduler, Scheduler, VirtualScheduler};
use schedulix::time::MonotonicTime;

/// Runs one delayed and one repeating action through `scheduler` while
/// driving the clock through `driver`, and returns the firing order.
fn run_scenario(
    scheduler: impl Scheduler<Time = MonotonicTime, Options = ()>,
    driver: &VirtualScheduler,
) -> Vec<&'static str> {
    let log = Arc::new(Mutex::new(Vec::new()));

    let l = log.clone();
    scheduler.schedule_after(Duration::from_secs(1), move || {
        l.lock().unwrap().push("once")
    });
    let l = log.clone();
    let key = scheduler.schedule_repeating(Duration::from_secs(2), Duration::from_secs(2), move || {
        l.lock().unwrap().push("tick")
    });

    driver.advance_by(Duration::from_secs(6));

    // The key minted by the concrete scheduler must keep working through the
    // wrapper.
    key.cancel();
    driver.advance_by(Duration::from_secs(6));

    let log = log.lock().unwrap();
    log.clone()
}

#[test]
fn erased_scheduling_matches_direct_scheduling() {
    let direct = VirtualScheduler::new(MonotonicTime::EPOCH);
    let direct_log = run_scenario(direct.clone(), &direct);

    let wrapped = VirtualScheduler::new(MonotonicTime::EPOCH);
    let erased_log = run_scenario(wrapped.clone().erased(), &wrapped);

    assert_eq!(direct_log, ["once", "tick", "tick", "tick"]);
    assert_eq!(erased_log, direct_log);
}

#[test]
fn erased_wrapper_owns_its_scheduler() {
    // The concrete handle is consumed here; the wrapper alone keeps the
    // scheduler alive.
    fn make() -> AnyScheduler {
        ImmediateScheduler::new().erased()
    }

    let scheduler = make();
    let fired = Arc::new(AtomicUsize::new(0));

    let count = fired.clone();
    scheduler.schedule_now(move || {
        count.fetch_add(1, Ordering::Relaxed);
    });
    assert_eq!(fired.load(Ordering::Relaxed), 1);
}

#[test]
fn from_shared_accepts_a_trait_object() {
    let concrete = VirtualScheduler::new(MonotonicTime::EPOCH);
    let shared: Arc<dyn Scheduler<Time = MonotonicTime, Options = ()>> =
        Arc::new(concrete.clone());
    let erased = AnyScheduler::from_shared(shared);

    let fired = Arc::new(AtomicUsize::new(0));
    let count = fired.clone();
    erased.schedule_after(Duration::from_secs(1), move || {
        count.fetch_add(1, Ordering::Relaxed);
    });

    concrete.advance_by(Duration::from_secs(1));
    assert_eq!(fired.load(Ordering::Relaxed), 1);
}

#[test]
fn raw_closures_can_decorate_a_scheduler() {
    let inner = VirtualScheduler::new(MonotonicTime::EPOCH);
    let log = Arc::new(Mutex::new(Vec::new()));

    // A decorator assembled from raw closures which pushes every deadline
    // back by one second.
    let shift = Duration::from_secs(1);
    let i = inner.clone();
    let now = move || i.now();
    let i = inner.clone();
    let minimum_tolerance = move || i.minimum_tolerance();
    let i = inner.clone();
    let schedule = move |options, action| i.schedule(options, action);
    let i = inner.clone();
    let schedule_at = move |deadline: MonotonicTime, tolerance, options, action| {
        i.schedule_at(deadline + shift, tolerance, options, action)
    };
    let i = inner.clone();
    let schedule_periodic = move |deadline: MonotonicTime, period, tolerance, options, action| {
        i.schedule_periodic(deadline + shift, period, tolerance, options, action)
    };
    let delayed: AnyScheduler = AnyScheduler::from_raw(
        now,
        minimum_tolerance,
        schedule,
        schedule_at,
        schedule_periodic,
    );

    let l = log.clone();
    delayed.schedule_after(Duration::from_secs(1), move || {
        l.lock().unwrap().push("shifted")
    });

    inner.advance_by(Duration::from_secs(1));
    assert!(log.lock().unwrap().is_empty());

    inner.advance_by(Duration::from_secs(1));
    assert_eq!(*log.lock().unwrap(), ["shifted"]);
}
