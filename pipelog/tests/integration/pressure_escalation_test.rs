// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Pressure escalation wired to actuators, exercised deterministically
//! against the bare components (no workers draining the queue).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pipelog::{
    build_envelope, ActuatorCounters, ActuatorSet, AdaptiveSettings, DualQueue, EnvelopeSeed,
    ExceptionSettings, Filter, FilterLadder, Level, PipelineRunner, PressureLevel, PressureMonitor,
    RedactionSettings, WorkerPool,
};

fn fill_main(queue: &DualQueue, count: usize) {
    for i in 0..count {
        let event = build_envelope(
            EnvelopeSeed {
                level: Some(Level::Info),
                message: format!("fill {}", i),
                ..Default::default()
            },
            &ExceptionSettings::default(),
        );
        queue.try_enqueue(event).unwrap();
    }
}

fn adaptive() -> AdaptiveSettings {
    AdaptiveSettings {
        enabled: true,
        cooldown_seconds: 0.0,
        check_interval_seconds: 0.01,
        ..Default::default()
    }
}

struct NullFilter;

#[async_trait::async_trait]
impl Filter for NullFilter {
    fn name(&self) -> &str {
        "null"
    }
    async fn filter(
        &self,
        event: pipelog::LogEnvelope,
    ) -> Option<pipelog::LogEnvelope> {
        Some(event)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn seventy_percent_fill_escalates_once() {
    let queue = Arc::new(DualQueue::new(100, 10, HashSet::from([Level::Error])));
    fill_main(&queue, 70);

    let pipeline = Arc::new(PipelineRunner::new(
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        RedactionSettings::default(),
    ));
    let pool = Arc::new(WorkerPool::new(1, 8, |stop_flag| {
        tokio::spawn(async move {
            while !stop_flag.load(Ordering::Acquire) {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
    }));

    let mut rungs: HashMap<PressureLevel, Vec<Arc<dyn Filter>>> = HashMap::new();
    rungs.insert(PressureLevel::Elevated, vec![Arc::new(NullFilter) as Arc<dyn Filter>]);

    let counters = Arc::new(ActuatorCounters::new(1));
    let actuators = Arc::new(ActuatorSet::new(
        Arc::clone(&pipeline),
        Some(FilterLadder::new(rungs)),
        Some(Arc::clone(&pool)),
        Arc::clone(&queue),
        Arc::clone(&counters),
        100,
        4.0,
        true,
        true,
        true,
    ));

    let monitor = Arc::new(PressureMonitor::new(Arc::clone(&queue), &adaptive(), Arc::clone(&counters)).unwrap());
    let fired = Arc::new(AtomicUsize::new(0));
    {
        let actuators = Arc::clone(&actuators);
        let fired = Arc::clone(&fired);
        monitor.on_level_change(move |old, new| {
            fired.fetch_add(1, Ordering::SeqCst);
            actuators.apply(old, new);
        });
    }

    monitor.tick();

    assert_eq!(monitor.pressure_level(), PressureLevel::Elevated);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(counters.filters_swapped.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.current_filters().len(), 1);
    // Elevated scales by 1.0: the actuator ran but the pool stays at its
    // initial size.
    assert_eq!(pool.current_count(), 1);
    // Capacity actuator applied the elevated growth factor.
    assert_eq!(queue.capacity(), 125);

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.escalation_count, 1);
    assert_eq!(snapshot.peak_pressure_level, PressureLevel::Elevated);

    for handle in pool.drain_all() {
        handle.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn high_pressure_scales_workers_and_caps_growth() {
    let queue = Arc::new(DualQueue::new(100, 10, HashSet::from([Level::Error])));
    let pipeline = Arc::new(PipelineRunner::new(
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        RedactionSettings::default(),
    ));
    let pool = Arc::new(WorkerPool::new(2, 8, |stop_flag| {
        tokio::spawn(async move {
            while !stop_flag.load(Ordering::Acquire) {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
    }));
    let counters = Arc::new(ActuatorCounters::new(2));
    let actuators = Arc::new(ActuatorSet::new(
        pipeline,
        None,
        Some(Arc::clone(&pool)),
        Arc::clone(&queue),
        Arc::clone(&counters),
        100,
        1.4,
        false,
        true,
        true,
    ));
    let monitor = Arc::new(PressureMonitor::new(Arc::clone(&queue), &adaptive(), Arc::clone(&counters)).unwrap());
    {
        let actuators = Arc::clone(&actuators);
        monitor.on_level_change(move |old, new| actuators.apply(old, new));
    }

    fill_main(&queue, 95);
    monitor.tick(); // -> Elevated
    monitor.tick(); // -> High
    assert_eq!(monitor.pressure_level(), PressureLevel::High);

    // ceil(2 * 1.5) = 3 workers.
    assert_eq!(pool.current_count(), 3);
    assert_eq!(counters.peak_workers.load(Ordering::SeqCst), 3);
    // High wants 150 capacity but the cap is 140.
    assert_eq!(queue.capacity(), 140);

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.escalation_count, 2);
    assert_eq!(snapshot.workers_scaled, 1);

    for handle in pool.drain_all() {
        handle.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cooldown_suppresses_second_transition() {
    let queue = Arc::new(DualQueue::new(100, 10, HashSet::from([Level::Error])));
    fill_main(&queue, 95);
    let settings = AdaptiveSettings {
        enabled: true,
        cooldown_seconds: 30.0,
        check_interval_seconds: 0.01,
        ..Default::default()
    };
    let monitor =
        PressureMonitor::new(Arc::clone(&queue), &settings, Arc::new(ActuatorCounters::new(1))).unwrap();

    monitor.tick(); // first transition always allowed
    monitor.tick(); // suppressed by cooldown
    monitor.tick();
    assert_eq!(monitor.pressure_level(), PressureLevel::Elevated);
    assert_eq!(monitor.snapshot().escalation_count, 1);
}
