//! Integration test: the paced driver end to end.
//!
//! Starts a `RealtimeField`, drives it through pause, restart, parameter
//! changes and shutdown from the user thread while a reader thread polls
//! snapshots, and checks that readers only ever see whole populations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use contagion_engine::{FieldEvent, ParameterChange, RealtimeConfig, RealtimeField};
use contagion_test_utils::small_config;

fn fast() -> RealtimeConfig {
    RealtimeConfig {
        tick_rate_hz: 2_000.0,
        snapshot_ring_size: 4,
        ..RealtimeConfig::default()
    }
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn readers_never_see_partial_population() {
    let rt = Arc::new(RealtimeField::new(small_config(), fast()).unwrap());
    let stop = Arc::new(AtomicBool::new(false));

    let reader = {
        let rt = Arc::clone(&rt);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut reads = 0u64;
            while !stop.load(Ordering::Acquire) {
                if let Some(snap) = rt.latest_snapshot() {
                    let n = snap.subjects.len();
                    assert!(n == 20 || n == 35, "torn population of {n}");
                    assert_eq!(snap.counts.total() as usize, n);
                    reads += 1;
                }
                thread::yield_now();
            }
            reads
        })
    };

    for _ in 0..5 {
        rt.apply(ParameterChange::SubjectCount(35)).unwrap();
        thread::sleep(Duration::from_millis(2));
        rt.apply(ParameterChange::SubjectCount(20)).unwrap();
        thread::sleep(Duration::from_millis(2));
    }
    stop.store(true, Ordering::Release);
    assert!(reader.join().unwrap() > 0);
}

#[test]
fn cursor_reader_sees_each_snapshot_once_in_order() {
    let rt = RealtimeField::new(small_config(), fast()).unwrap();
    let mut cursor = 0;
    let mut seen = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while seen.len() < 50 && Instant::now() < deadline {
        let (published, next) = rt.snapshots_since(cursor);
        assert!(next >= cursor);
        cursor = next;
        seen.extend(published.iter().map(|s| s.tick));
        thread::sleep(Duration::from_micros(500));
    }
    assert!(seen.len() >= 50, "only {} snapshots read", seen.len());
    assert!(seen.windows(2).all(|w| w[0] < w[1]), "ticks out of order: {seen:?}");
}

#[test]
fn restart_from_another_thread_resets_tick() {
    let rt = RealtimeField::new(small_config(), fast()).unwrap();
    let initial = rt.with_field(|f| f.current_tick());
    assert!(wait_for(|| rt.current_tick().since(initial) >= 20));

    rt.set_paused(true);
    rt.request_restart();
    assert!(wait_for(|| {
        rt.with_field(|f| !f.restart_requested() && !f.is_paused())
    }));
    let after = rt.with_field(|f| f.time_series().samples().first().map(|s| s.tick));
    assert_eq!(after, Some(initial));
}

#[test]
fn observers_receive_events_in_tick_order() {
    let rt = RealtimeField::new(small_config(), fast()).unwrap();
    let (tx, rx) = crossbeam_channel::unbounded();
    let id = rt.subscribe_channel(tx);

    let mut last = None;
    for _ in 0..10 {
        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            FieldEvent::TickCompleted { tick, .. } => {
                if let Some(prev) = last {
                    assert!(tick > prev);
                }
                last = Some(tick);
            }
            FieldEvent::ConfigurationChanged { .. } => {}
        }
    }
    assert!(rt.unsubscribe(id));
}

#[test]
fn drop_stops_the_tick_thread() {
    let rt = RealtimeField::new(small_config(), fast()).unwrap();
    let (tx, rx) = crossbeam_channel::unbounded();
    rt.subscribe_channel(tx);
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    drop(rt);
    // The field, and with it the sender, is gone once the thread is joined.
    while rx.try_recv().is_ok() {}
    assert!(matches!(
        rx.try_recv(),
        Err(crossbeam_channel::TryRecvError::Disconnected)
    ));
}
