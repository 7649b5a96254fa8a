//! Scheduling and clock advancement on a virtual scheduler.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use schedulix::scheduler::{ScheduleKey, Scheduler, VirtualScheduler};
use schedulix::time::MonotonicTime;

/// A scheduler over a fresh virtual clock, together with a shared label log.
fn recording_bench() -> (VirtualScheduler, Arc<Mutex<Vec<&'static str>>>) {
    let scheduler = VirtualScheduler::new(MonotonicTime::EPOCH);
    let log = Arc::new(Mutex::new(Vec::new()));

    (scheduler, log)
}

/// An action that appends `label` to the log each time it runs.
fn record(
    log: &Arc<Mutex<Vec<&'static str>>>,
    label: &'static str,
) -> impl FnMut() + Send + 'static {
    let log = log.clone();

    move || log.lock().unwrap().push(label)
}

fn snapshot(log: &Arc<Mutex<Vec<&'static str>>>) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

#[test]
fn delayed_actions_fire_in_deadline_order() {
    let (scheduler, log) = recording_bench();
    let t0 = scheduler.now();

    // Queue 2 actions at t0+2s and t0+1s, in reverse order.
    scheduler.schedule_after(Duration::from_secs(2), record(&log, "second"));
    scheduler.schedule_after(Duration::from_secs(1), record(&log, "first"));

    scheduler.advance_by(Duration::from_secs(1));
    assert_eq!(snapshot(&log), ["first"]);
    assert_eq!(scheduler.now(), t0 + Duration::from_secs(1));

    scheduler.advance_by(Duration::from_secs(1));
    assert_eq!(snapshot(&log), ["first", "second"]);
    assert_eq!(scheduler.now(), t0 + Duration::from_secs(2));
}

#[test]
fn same_deadline_fires_in_submission_order() {
    let (scheduler, log) = recording_bench();

    // Two actions due at t0+2s, one in between, one due immediately.
    scheduler.schedule_after(Duration::from_secs(2), record(&log, "a"));
    scheduler.schedule_after(Duration::from_secs(1), record(&log, "b"));
    scheduler.schedule_after(Duration::from_secs(2), record(&log, "c"));
    scheduler.schedule_now(record(&log, "asap"));

    scheduler.advance_by(Duration::from_secs(2));
    assert_eq!(snapshot(&log), ["asap", "b", "a", "c"]);
}

#[test]
fn repeating_schedules_interleave_deterministically() {
    let (scheduler, log) = recording_bench();

    let fast = scheduler.schedule_repeating(
        Duration::from_secs(2),
        Duration::from_secs(2),
        record(&log, "fast"),
    );
    let slow = scheduler.schedule_repeating(
        Duration::from_secs(3),
        Duration::from_secs(3),
        record(&log, "slow"),
    );

    // Advance second by second and check the interleaving at each landmark.
    for _ in 0..4 {
        scheduler.advance_by(Duration::from_secs(1));
    }
    assert_eq!(snapshot(&log), ["fast", "slow", "fast"]);

    scheduler.advance_by(Duration::from_secs(1));
    assert_eq!(snapshot(&log), ["fast", "slow", "fast"]);

    scheduler.advance_by(Duration::from_secs(1));
    assert_eq!(snapshot(&log), ["fast", "slow", "fast", "fast", "slow"]);

    // Both schedules collide again at t0+12s; the earlier submission still
    // goes first.
    scheduler.advance_by(Duration::from_secs(6));
    assert_eq!(
        snapshot(&log),
        ["fast", "slow", "fast", "fast", "slow", "fast", "slow", "fast", "fast", "slow"]
    );

    fast.cancel();
    slow.cancel();
}

#[test]
fn equal_period_schedules_alternate_in_submission_order() {
    let (scheduler, log) = recording_bench();

    // Same start, same period: the earlier submission wins every tick.
    let a = scheduler.schedule_repeating(
        Duration::from_secs(1),
        Duration::from_secs(1),
        record(&log, "a"),
    );
    let b = scheduler.schedule_repeating(
        Duration::from_secs(1),
        Duration::from_secs(1),
        record(&log, "b"),
    );

    scheduler.advance_by(Duration::from_secs(4));
    assert_eq!(snapshot(&log), ["a", "b", "a", "b", "a", "b", "a", "b"]);

    a.cancel();
    b.cancel();
}

#[test]
fn zero_delta_advance_fires_due_work_only() {
    let (scheduler, log) = recording_bench();
    let t0 = scheduler.now();

    scheduler.schedule_now(record(&log, "due"));
    scheduler.schedule_after(Duration::from_nanos(1), record(&log, "later"));

    // A zero-length advance runs everything due at the current instant but
    // does not move the clock.
    scheduler.advance_by(Duration::ZERO);
    assert_eq!(snapshot(&log), ["due"]);
    assert_eq!(scheduler.now(), t0);

    scheduler.advance_by(Duration::from_nanos(1));
    assert_eq!(snapshot(&log), ["due", "later"]);
}

#[test]
fn actions_scheduled_by_actions_fire_in_the_same_advance() {
    let (scheduler, log) = recording_bench();
    let t0 = scheduler.now();

    // Each action schedules the next one at the same instant.
    let outer_scheduler = scheduler.clone();
    let outer_log = log.clone();
    scheduler.schedule_now(move || {
        outer_log.lock().unwrap().push("outer");

        let middle_scheduler = outer_scheduler.clone();
        let middle_log = outer_log.clone();
        outer_scheduler.schedule_now(move || {
            middle_log.lock().unwrap().push("middle");

            let inner_log = middle_log.clone();
            middle_scheduler.schedule_now(move || inner_log.lock().unwrap().push("inner"));
        });
    });

    scheduler.advance_by(Duration::ZERO);
    assert_eq!(snapshot(&log), ["outer", "middle", "inner"]);
    assert_eq!(scheduler.now(), t0);
}

#[test]
fn overdue_actions_fire_without_moving_the_clock() {
    let start = MonotonicTime::EPOCH + Duration::from_secs(10);
    let scheduler = VirtualScheduler::new(start);
    let log = Arc::new(Mutex::new(Vec::new()));

    // A deadline in the past is due immediately.
    scheduler.schedule_at(
        MonotonicTime::EPOCH + Duration::from_secs(5),
        Duration::ZERO,
        None,
        Box::new(record(&log, "overdue")),
    );

    scheduler.advance_by(Duration::ZERO);
    assert_eq!(snapshot(&log), ["overdue"]);
    assert_eq!(scheduler.now(), start);
}

#[test]
fn clock_reads_the_deadline_while_an_action_runs() {
    let (scheduler, _) = recording_bench();
    let t0 = scheduler.now();

    let handle = scheduler.clone();
    let observed = Arc::new(Mutex::new(None));
    let slot = observed.clone();
    scheduler.schedule_after(Duration::from_secs(3), move || {
        *slot.lock().unwrap() = Some(handle.now());
    });

    // Even though the advance overshoots the deadline, the action observes
    // its own fire time.
    scheduler.advance_by(Duration::from_secs(60));
    assert_eq!(*observed.lock().unwrap(), Some(t0 + Duration::from_secs(3)));
    assert_eq!(scheduler.now(), t0 + Duration::from_secs(60));
}

#[test]
fn cancelled_repeating_schedule_stops_firing() {
    let (scheduler, log) = recording_bench();

    let key = scheduler.schedule_repeating(
        Duration::from_secs(1),
        Duration::from_secs(1),
        record(&log, "tick"),
    );

    scheduler.advance_by(Duration::from_secs(2));
    assert_eq!(snapshot(&log), ["tick", "tick"]);

    key.cancel();
    scheduler.advance_by(Duration::from_secs(10));
    assert_eq!(snapshot(&log), ["tick", "tick"]);
}

#[test]
fn self_cancellation_stops_the_repetition() {
    let (scheduler, _) = recording_bench();

    // The action cancels its own schedule at the third occurrence.
    let key_slot: Arc<Mutex<Option<ScheduleKey>>> = Arc::new(Mutex::new(None));
    let tally = Arc::new(AtomicUsize::new(0));

    let slot = key_slot.clone();
    let count = tally.clone();
    let key = scheduler.schedule_repeating(Duration::from_secs(1), Duration::from_secs(1), move || {
        if count.fetch_add(1, Ordering::Relaxed) + 1 == 3 {
            if let Some(key) = slot.lock().unwrap().take() {
                key.cancel();
            }
        }
    });
    *key_slot.lock().unwrap() = Some(key);

    scheduler.advance_by(Duration::from_secs(10));
    assert_eq!(tally.load(Ordering::Relaxed), 3);
}

#[test]
fn zero_period_self_cancelling_schedule_terminates() {
    let (scheduler, _) = recording_bench();
    let t0 = scheduler.now();

    // A zero-period schedule re-fires at the same instant; cancelling it from
    // inside the action bounds the advance.
    let key_slot: Arc<Mutex<Option<ScheduleKey>>> = Arc::new(Mutex::new(None));
    let tally = Arc::new(AtomicUsize::new(0));

    let slot = key_slot.clone();
    let count = tally.clone();
    let key = scheduler.schedule_repeating(Duration::ZERO, Duration::ZERO, move || {
        if count.fetch_add(1, Ordering::Relaxed) + 1 == 5 {
            if let Some(key) = slot.lock().unwrap().take() {
                key.cancel();
            }
        }
    });
    *key_slot.lock().unwrap() = Some(key);

    scheduler.advance_by(Duration::ZERO);
    assert_eq!(tally.load(Ordering::Relaxed), 5);
    assert_eq!(scheduler.now(), t0);
}

#[test]
fn run_fires_everything_and_stops_at_the_last_deadline() {
    let (scheduler, log) = recording_bench();
    let t0 = scheduler.now();

    scheduler.schedule_after(Duration::from_secs(5), record(&log, "last"));
    scheduler.schedule_after(Duration::from_secs(1), record(&log, "first"));

    scheduler.run();
    assert_eq!(snapshot(&log), ["first", "last"]);
    assert_eq!(scheduler.now(), t0 + Duration::from_secs(5));

    // A second call finds an empty queue and returns right away.
    scheduler.run();
    assert_eq!(scheduler.now(), t0 + Duration::from_secs(5));
}

#[cfg(not(miri))]
#[test]
fn run_does_not_return_while_a_repeating_schedule_is_live() {
    use std::sync::mpsc::channel;
    use std::thread;

    let (scheduler, _) = recording_bench();
    let key = scheduler.schedule_repeating(Duration::from_secs(1), Duration::from_secs(1), || {});

    let (done_tx, done_rx) = channel();
    let runner = scheduler.clone();
    thread::spawn(move || {
        runner.run();
        let _ = done_tx.send(());
    });

    // Give the runner some real time: it must still be going.
    assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());

    // Cancelling the only schedule lets it drain out and terminate.
    key.cancel();
    assert!(done_rx.recv_timeout(Duration::from_secs(10)).is_ok());
}

#[test]
fn virtual_clock_works_over_std_instant() {
    use std::time::Instant;

    let t0 = Instant::now();
    let scheduler = VirtualScheduler::new(t0);
    let fired = Arc::new(AtomicUsize::new(0));

    let count = fired.clone();
    scheduler.schedule_after(Duration::from_secs(3600), move || {
        count.fetch_add(1, Ordering::Relaxed);
    });

    scheduler.advance_by(Duration::from_secs(3600));
    assert_eq!(fired.load(Ordering::Relaxed), 1);
    assert_eq!(scheduler.now(), t0 + Duration::from_secs(3600));
}
