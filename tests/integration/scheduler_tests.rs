//! Scheduler timing against a manual clock: spacing, drift, overruns.

use core::time::Duration;

use loranode::app::ports::ClockPort;
use loranode::scheduler::{Instant, TransmissionScheduler};

use crate::mock_node::{FixedRandom, ManualClock, ScriptedRandom};

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

#[test]
fn fixed_draw_gives_fifteen_second_spacing() {
    let mut sched = TransmissionScheduler::new(secs(10), secs(10));
    let mut clock = ManualClock::new();
    let mut rng = FixedRandom(0.5);

    let fires: Vec<u64> = (0..4)
        .map(|_| {
            sched
                .wait_for_next(&mut clock, &mut rng)
                .unwrap()
                .scheduled
                .as_micros()
        })
        .collect();

    assert_eq!(fires, vec![15_000_000, 30_000_000, 45_000_000, 60_000_000]);
    assert_eq!(clock.sleeps, vec![secs(15); 4]);
}

#[test]
fn processing_time_does_not_accumulate() {
    let mut sched = TransmissionScheduler::new(secs(10), secs(10));
    let mut clock = ManualClock::new();
    let mut rng = ScriptedRandom::new(&[0.1, 0.7, 0.3, 0.9]);
    let work = [
        Duration::from_millis(300),
        secs(4),
        Duration::from_millis(1_250),
        secs(9),
    ];

    let mut expected = 0u64;
    for (i, w) in work.iter().enumerate() {
        let fire = sched.wait_for_next(&mut clock, &mut rng).unwrap();
        expected += 10_000_000 + fire.jitter.as_micros() as u64;
        assert_eq!(fire.scheduled.as_micros(), expected, "cycle {i}");
        assert_eq!(clock.now(), fire.scheduled);
        clock.advance(*w);
    }
    assert_eq!(sched.overruns(), 0);
}

#[test]
fn long_cycle_overruns_then_schedule_recovers() {
    let mut sched = TransmissionScheduler::new(secs(10), secs(10));
    let mut clock = ManualClock::new();
    let mut rng = FixedRandom(0.5);

    // Fire at 15 s, then work for 20 s: the 30 s fire is 5 s late.
    sched.wait_for_next(&mut clock, &mut rng).unwrap();
    clock.advance(secs(20));

    let late = sched.wait_for_next(&mut clock, &mut rng).unwrap();
    assert_eq!(late.scheduled, Instant::from_micros(30_000_000));
    assert_eq!(late.overrun, Some(secs(5)));
    assert_eq!(late.waited, Duration::ZERO);

    // Back on the scheduled grid: 45 s, reached after a 10 s sleep from 35 s.
    let next = sched.wait_for_next(&mut clock, &mut rng).unwrap();
    assert_eq!(next.scheduled, Instant::from_micros(45_000_000));
    assert_eq!(next.waited, secs(10));
    assert_eq!(sched.overruns(), 1);
}

#[test]
fn every_sleep_is_positive() {
    let mut sched = TransmissionScheduler::new(secs(1), secs(1));
    let mut clock = ManualClock::new();
    let mut rng = ScriptedRandom::new(&[0.0, 0.99, 0.5]);
    for i in 0..30u64 {
        sched.wait_for_next(&mut clock, &mut rng).unwrap();
        clock.advance(Duration::from_millis(i * 150));
    }
    assert!(clock.sleeps.iter().all(|d| !d.is_zero()));
    assert!(sched.overruns() > 0);
}

#[test]
fn state_tracks_anchor_pair() {
    let mut sched = TransmissionScheduler::new(secs(10), Duration::ZERO);
    let mut clock = ManualClock::new();
    clock.advance(secs(7));
    assert!(sched.state().is_none());

    sched.wait_for_next(&mut clock, &mut FixedRandom(0.0)).unwrap();
    let s = sched.state().unwrap();
    assert_eq!(s.last_fire, Instant::from_micros(7_000_000));
    assert_eq!(s.next_fire, Instant::from_micros(17_000_000));

    sched.wait_for_next(&mut clock, &mut FixedRandom(0.0)).unwrap();
    let s = sched.state().unwrap();
    assert_eq!(s.last_fire, Instant::from_micros(17_000_000));
    assert_eq!(s.next_fire, Instant::from_micros(27_000_000));
}
