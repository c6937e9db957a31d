//! Integration tests for the NodeService → TelemetryLoop pipeline.
//!
//! Identity, activation, scheduling and sending all run against the mock
//! radio, a manual clock and a fixed random source.

use core::time::Duration;

use loranode::activation::JoinPolicy;
use loranode::app::events::AppEvent;
use loranode::app::service::{CycleOutcome, NodeService, TelemetryLoop};
use loranode::config::{ActivationKind, NodeConfig, ProducerFaultPolicy};
use loranode::credentials::Eui64;
use loranode::error::{ActivationError, Error, IdentityError};
use loranode::payload::TestPatternProducer;
use loranode::registry::{DeviceRegistry, FLEET};
use loranode::scheduler::Instant;

use crate::mock_node::{
    FixedRandom, FlakyProducer, ManualClock, MockRadio, RadioCall, RecordingSink, PYCOM01,
};

fn abp_config() -> NodeConfig {
    NodeConfig {
        activation: ActivationKind::Abp,
        ..NodeConfig::default()
    }
}

fn service(config: NodeConfig) -> NodeService {
    NodeService::new(config, DeviceRegistry::from_entries(FLEET).unwrap())
}

fn at(s: u64) -> Instant {
    Instant::from_micros(s * 1_000_000)
}

fn bring_up(
    config: NodeConfig,
    radio: MockRadio,
    clock: &mut ManualClock,
    sink: &mut RecordingSink,
) -> TelemetryLoop<MockRadio> {
    service(config).bring_up(radio, clock, sink).unwrap()
}

// ── Full run ──────────────────────────────────────────────────

#[test]
fn run_sends_every_fifteen_seconds_until_shutdown() {
    let mut clock = ManualClock::new().stopping_after(3);
    let mut sink = RecordingSink::new();

    let summary = service(abp_config())
        .run(
            MockRadio::new(PYCOM01),
            &mut FlakyProducer::reliable(),
            &mut clock,
            &mut FixedRandom(0.5),
            &mut sink,
        )
        .unwrap();

    assert_eq!(sink.sent(), vec![(0, at(15)), (1, at(30)), (2, at(45))]);
    assert_eq!(summary.cycles, 3);
    assert_eq!(summary.sent, 3);
    assert_eq!(summary.next_sequence, 3);
    assert!(matches!(sink.events.last(), Some(AppEvent::Stopped(s)) if *s == summary));
}

#[test]
fn identity_is_resolved_before_join() {
    let mut sink = RecordingSink::new();
    bring_up(
        abp_config(),
        MockRadio::new(PYCOM01),
        &mut ManualClock::new(),
        &mut sink,
    );

    match &sink.events[0] {
        AppEvent::IdentityResolved {
            tag, sequence_no, ..
        } => {
            assert_eq!(tag.as_str(), "PYCOM01");
            assert_eq!(*sequence_no, 1);
        }
        other => panic!("expected IdentityResolved, got {other:?}"),
    }
    assert!(matches!(sink.events[1], AppEvent::JoinStarted { mode: "ABP" }));
}

#[test]
fn otaa_schedule_anchors_after_join() {
    let mut clock = ManualClock::new();
    let mut sink = RecordingSink::new();
    let mut uplink = bring_up(
        NodeConfig::default(),
        MockRadio::new(PYCOM01).joining_after(2),
        &mut clock,
        &mut sink,
    );
    // Two 2.5 s polls: anchored at 5 s, first fire at 20 s.
    uplink
        .step(&mut FlakyProducer::reliable(), &mut clock, &mut FixedRandom(0.5), &mut sink)
        .unwrap();
    assert_eq!(sink.sent(), vec![(0, at(20))]);
}

// ── Startup faults ────────────────────────────────────────────

#[test]
fn unknown_device_fails_before_join() {
    let mut sink = RecordingSink::new();
    let result = service(abp_config()).bring_up(
        MockRadio::new(Eui64([0xFF; 8])),
        &mut ManualClock::new(),
        &mut sink,
    );

    assert!(matches!(
        result.err(),
        Some(Error::Identity(IdentityError::NotProvisioned))
    ));
    assert!(sink.events.is_empty());
}

#[test]
fn malformed_otaa_key_is_a_decode_error() {
    let config = NodeConfig {
        app_key: heapless::String::try_from("00000000000000000000000000000G01").unwrap(),
        ..NodeConfig::default()
    };
    let result = service(config).bring_up(
        MockRadio::new(PYCOM01),
        &mut ManualClock::new(),
        &mut RecordingSink::new(),
    );
    assert!(matches!(result.err(), Some(Error::Decode(_))));
}

#[test]
fn bounded_join_timeout_is_fatal() {
    let config = NodeConfig {
        join_policy: JoinPolicy::Bounded { max_polls: 2 },
        ..NodeConfig::default()
    };
    let result = service(config).run(
        MockRadio::new(PYCOM01).never_joining(),
        &mut FlakyProducer::reliable(),
        &mut ManualClock::new(),
        &mut FixedRandom(0.5),
        &mut RecordingSink::new(),
    );
    assert_eq!(
        result.err(),
        Some(Error::Activation(ActivationError::JoinTimeout { polls: 2 }))
    );
}

// ── Steady-state faults ───────────────────────────────────────

#[test]
fn failed_send_keeps_schedule_and_consumes_sequence() {
    let mut clock = ManualClock::new();
    let mut sink = RecordingSink::new();
    let mut rng = FixedRandom(0.5);
    let mut producer = FlakyProducer::reliable();
    let mut uplink = bring_up(
        abp_config(),
        MockRadio::new(PYCOM01).failing_sends(&[1]),
        &mut clock,
        &mut sink,
    );

    let outcomes: Vec<CycleOutcome> = (0..3)
        .map(|_| uplink.step(&mut producer, &mut clock, &mut rng, &mut sink).unwrap())
        .collect();

    assert_eq!(
        outcomes,
        vec![
            CycleOutcome::Sent { sequence: 0, bytes: 5 },
            CycleOutcome::SendFailed { sequence: 1 },
            CycleOutcome::Sent { sequence: 2, bytes: 5 },
        ]
    );
    assert_eq!(sink.sent(), vec![(0, at(15)), (2, at(45))]);
    assert_eq!(uplink.summary().send_failures, 1);
}

#[test]
fn skipped_cycle_leaves_no_sequence_gap() {
    let config = NodeConfig {
        producer_fault: ProducerFaultPolicy::SkipCycle,
        ..abp_config()
    };
    let mut clock = ManualClock::new();
    let mut sink = RecordingSink::new();
    let mut rng = FixedRandom(0.5);
    let mut producer = FlakyProducer::failing_on(&[1]);
    let mut uplink = bring_up(config, MockRadio::new(PYCOM01), &mut clock, &mut sink);

    let outcomes: Vec<CycleOutcome> = (0..3)
        .map(|_| uplink.step(&mut producer, &mut clock, &mut rng, &mut sink).unwrap())
        .collect();

    assert_eq!(outcomes[1], CycleOutcome::Skipped);
    assert_eq!(sink.sent(), vec![(0, at(15)), (1, at(45))]);
    // The retry after the skip asks for sequence 1 again.
    let sent = uplink.session().radio().sent();
    assert_eq!(sent, vec![b"seq-0".to_vec(), b"seq-1".to_vec()]);
    assert_eq!(uplink.summary().skipped, 1);
    assert_eq!(uplink.summary().producer_faults, 1);
}

#[test]
fn reuse_last_resends_previous_payload() {
    let mut clock = ManualClock::new();
    let mut sink = RecordingSink::new();
    let mut rng = FixedRandom(0.5);
    let mut producer = FlakyProducer::failing_on(&[1]);
    let mut uplink = bring_up(abp_config(), MockRadio::new(PYCOM01), &mut clock, &mut sink);

    for _ in 0..2 {
        uplink.step(&mut producer, &mut clock, &mut rng, &mut sink).unwrap();
    }

    let sent = uplink.session().radio().sent();
    assert_eq!(sent, vec![b"seq-0".to_vec(), b"seq-0".to_vec()]);
    assert_eq!(uplink.next_sequence(), 2);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ProducerFault { reused: true, .. })),
        1
    );
}

#[test]
fn reuse_last_without_history_skips() {
    let mut clock = ManualClock::new();
    let mut sink = RecordingSink::new();
    let mut uplink = bring_up(abp_config(), MockRadio::new(PYCOM01), &mut clock, &mut sink);

    let outcome = uplink
        .step(
            &mut FlakyProducer::failing_on(&[0]),
            &mut clock,
            &mut FixedRandom(0.5),
            &mut sink,
        )
        .unwrap();
    assert_eq!(outcome, CycleOutcome::Skipped);
    assert_eq!(uplink.next_sequence(), 0);
}

// ── Sequencing and radio discipline ───────────────────────────

#[test]
fn sequence_starts_at_configured_value() {
    let config = NodeConfig {
        initial_sequence: 100,
        ..abp_config()
    };
    let mut clock = ManualClock::new().stopping_after(4);
    let mut sink = RecordingSink::new();
    service(config)
        .run(
            MockRadio::new(PYCOM01),
            &mut FlakyProducer::reliable(),
            &mut clock,
            &mut FixedRandom(0.25),
            &mut sink,
        )
        .unwrap();

    let seqs: Vec<u32> = sink.sent().iter().map(|(s, _)| *s).collect();
    assert_eq!(seqs, vec![100, 101, 102, 103]);
}

#[test]
fn payload_counter_matches_message_sequence() {
    let config = NodeConfig {
        initial_sequence: 100,
        producer_fault: ProducerFaultPolicy::SkipCycle,
        ..abp_config()
    };
    let mut clock = ManualClock::new();
    let mut sink = RecordingSink::new();
    let mut rng = FixedRandom(0.5);
    let mut uplink = bring_up(config, MockRadio::new(PYCOM01), &mut clock, &mut sink);

    let mut pattern = TestPatternProducer::new();
    uplink.step(&mut pattern, &mut clock, &mut rng, &mut sink).unwrap();
    uplink
        .step(&mut FlakyProducer::failing_on(&[0]), &mut clock, &mut rng, &mut sink)
        .unwrap();
    uplink.step(&mut pattern, &mut clock, &mut rng, &mut sink).unwrap();

    let sent = uplink.session().radio().sent();
    assert_eq!(
        sent,
        vec![b"Testing data...100".to_vec(), b"Testing data...101".to_vec()]
    );
    assert_eq!(sink.sent(), vec![(100, at(15)), (101, at(45))]);
}

#[test]
fn each_send_is_bracketed_by_blocking_mode() {
    let mut clock = ManualClock::new();
    let mut sink = RecordingSink::new();
    let mut uplink = bring_up(abp_config(), MockRadio::new(PYCOM01), &mut clock, &mut sink);
    uplink
        .step(&mut FlakyProducer::reliable(), &mut clock, &mut FixedRandom(0.5), &mut sink)
        .unwrap();

    let calls = &uplink.session().radio().calls;
    let tail = &calls[calls.len() - 3..];
    assert_eq!(
        tail,
        &[
            RadioCall::SetBlocking(true),
            RadioCall::Send(b"seq-0".to_vec()),
            RadioCall::SetBlocking(false),
        ]
    );
}

#[test]
fn overrun_is_reported_and_anchor_kept() {
    let mut clock = ManualClock::new();
    let mut sink = RecordingSink::new();
    let mut rng = FixedRandom(0.5);
    let mut producer = FlakyProducer::reliable();
    let mut uplink = bring_up(abp_config(), MockRadio::new(PYCOM01), &mut clock, &mut sink);

    uplink.step(&mut producer, &mut clock, &mut rng, &mut sink).unwrap();
    clock.advance(Duration::from_secs(18));
    uplink.step(&mut producer, &mut clock, &mut rng, &mut sink).unwrap();
    uplink.step(&mut producer, &mut clock, &mut rng, &mut sink).unwrap();

    assert_eq!(sink.sent(), vec![(0, at(15)), (1, at(30)), (2, at(45))]);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::Overrun { late_by, .. } if *late_by == Duration::from_secs(3)
    )));
    assert_eq!(uplink.summary().overruns, 1);
}
