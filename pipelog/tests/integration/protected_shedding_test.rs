// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Protected-lane shedding driven by the monitor's shedding controller.

use std::collections::HashSet;
use std::sync::Arc;

use pipelog::{
    build_envelope, ActuatorCounters, AdaptiveSettings, DualQueue, EnvelopeSeed, ExceptionSettings, Level,
    PressureMonitor,
};

fn event(level: Level, message: &str) -> pipelog::LogEnvelope {
    build_envelope(
        EnvelopeSeed {
            level: Some(level),
            message: message.into(),
            ..Default::default()
        },
        &ExceptionSettings::default(),
    )
}

fn shedding_settings() -> AdaptiveSettings {
    AdaptiveSettings {
        enabled: true,
        shedding_enabled: true,
        protected_shed_threshold: 0.70,
        protected_recover_threshold: 0.30,
        cooldown_seconds: 0.0,
        check_interval_seconds: 0.01,
        ..Default::default()
    }
}

#[tokio::test]
async fn shedding_activates_serves_protected_only_then_recovers() {
    let queue = Arc::new(DualQueue::new(
        100,
        10,
        HashSet::from([Level::Error, Level::Critical]),
    ));
    let monitor = PressureMonitor::new(
        Arc::clone(&queue),
        &shedding_settings(),
        Arc::new(ActuatorCounters::new(1)),
    )
    .unwrap();

    for i in 0..20 {
        queue.try_enqueue(event(Level::Info, &format!("main {}", i))).unwrap();
    }
    for i in 0..8 {
        queue.try_enqueue(event(Level::Error, &format!("protected {}", i))).unwrap();
    }

    // 80% protected fill >= 70% threshold.
    monitor.tick();
    assert!(queue.is_shedding());

    // Only protected events are served while shedding.
    let mut served = Vec::new();
    while let Some(envelope) = queue.try_dequeue() {
        served.push(envelope.level);
    }
    assert_eq!(served.len(), 8);
    assert!(served.iter().all(|level| *level == Level::Error));

    // Protected lane is now empty (0% < 30%): shedding releases.
    monitor.tick();
    assert!(!queue.is_shedding());
    assert_eq!(queue.try_dequeue().unwrap().level, Level::Info);
}

#[tokio::test]
async fn shedding_holds_inside_hysteresis_band() {
    let queue = Arc::new(DualQueue::new(100, 10, HashSet::from([Level::Error])));
    let monitor = PressureMonitor::new(
        Arc::clone(&queue),
        &shedding_settings(),
        Arc::new(ActuatorCounters::new(1)),
    )
    .unwrap();

    for i in 0..8 {
        queue.try_enqueue(event(Level::Error, &format!("p{}", i))).unwrap();
    }
    monitor.tick();
    assert!(queue.is_shedding());

    // Drain to 40%: above the 30% recover threshold, shedding holds.
    for _ in 0..4 {
        queue.try_dequeue();
    }
    monitor.tick();
    assert!(queue.is_shedding());

    // Below 30%: releases.
    for _ in 0..2 {
        queue.try_dequeue();
    }
    monitor.tick();
    assert!(!queue.is_shedding());
}

#[tokio::test]
async fn drained_batches_order_protected_first() {
    let queue = DualQueue::new(100, 10, HashSet::from([Level::Error, Level::Critical]));
    queue.try_enqueue(event(Level::Info, "m1")).unwrap();
    queue.try_enqueue(event(Level::Error, "p1")).unwrap();
    queue.try_enqueue(event(Level::Info, "m2")).unwrap();
    queue.try_enqueue(event(Level::Critical, "p2")).unwrap();

    let mut batch = Vec::new();
    queue.drain_into(&mut batch);

    let messages: Vec<&str> = batch.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["p1", "p2", "m1", "m2"]);
}

#[tokio::test]
async fn enqueue_semantics_unchanged_during_shedding() {
    let queue = DualQueue::new(4, 4, HashSet::from([Level::Error]));
    queue.activate_shedding();

    assert!(queue.try_enqueue(event(Level::Info, "m")).is_ok());
    assert!(queue.try_enqueue(event(Level::Error, "p")).is_ok());
    assert_eq!(queue.main_len(), 1);
    assert_eq!(queue.protected_len(), 1);

    // Protected events served during shedding are indistinguishable from
    // normal dequeues.
    let served = queue.try_dequeue().unwrap();
    assert_eq!(served.message, "p");
}
