// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pressure Monitor
//!
//! Dedicated task sampling the queue every `check_interval`. Each tick:
//!
//! 1. Samples both lane depths (metrics) and the **main-lane** fill ratio
//!    (protected-lane depth never causes escalation).
//! 2. Feeds the fill ratio to the escalation state machine.
//! 3. On a transition: bumps escalation/de-escalation counters, updates
//!    peak level and time-at-level, invokes every registered callback
//!    with `(old, new)`, writes a diagnostic record, and sets the integer
//!    level gauge. Callbacks are isolated: a panicking callback is
//!    caught and the others still run.
//! 4. Runs the shedding controller against the protected-lane fill ratio
//!    (activate at `shed_threshold`, release below `recover_threshold`).
//!
//! `snapshot()` finalizes the current level's accumulated time and
//! returns the drain-time [`AdaptiveSnapshot`].

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::json;
use tracing::{info, warn};

use pipelog_domain::entities::AdaptiveSnapshot;
use pipelog_domain::events::DiagnosticEvent;
use pipelog_domain::{LogError, PressureLevel};

use crate::infrastructure::concurrency::DualQueue;
use crate::infrastructure::config::AdaptiveSettings;
use crate::infrastructure::pressure::actuators::ActuatorCounters;
use crate::infrastructure::pressure::state_machine::EscalationStateMachine;

type LevelChangeCallback = Box<dyn Fn(PressureLevel, PressureLevel) + Send + Sync>;
type DiagnosticWriter = Box<dyn Fn(DiagnosticEvent) + Send + Sync>;
type MetricSetter = Box<dyn Fn(usize) + Send + Sync>;
type LaneDepthSetter = Box<dyn Fn(usize, usize) + Send + Sync>;

struct MonitorStats {
    escalations: u64,
    deescalations: u64,
    peak: PressureLevel,
    time_at_level: HashMap<PressureLevel, f64>,
    level_entered_at: Instant,
}

impl MonitorStats {
    fn new() -> Self {
        Self {
            escalations: 0,
            deescalations: 0,
            peak: PressureLevel::Normal,
            time_at_level: PressureLevel::ALL.iter().map(|l| (*l, 0.0)).collect(),
            level_entered_at: Instant::now(),
        }
    }

    fn on_transition(&mut self, old: PressureLevel, new: PressureLevel, now: Instant) {
        let elapsed = now.duration_since(self.level_entered_at).as_secs_f64();
        *self.time_at_level.entry(old).or_insert(0.0) += elapsed;
        self.level_entered_at = now;
        if new > old {
            self.escalations += 1;
        } else {
            self.deescalations += 1;
        }
        if new > self.peak {
            self.peak = new;
        }
    }
}

/// Queue-sampling pressure controller task.
pub struct PressureMonitor {
    queue: Arc<DualQueue>,
    machine: Mutex<EscalationStateMachine>,
    callbacks: Mutex<Vec<LevelChangeCallback>>,
    diagnostic_writer: Mutex<Option<DiagnosticWriter>>,
    metric_setter: Mutex<Option<MetricSetter>>,
    lane_depth_setter: Mutex<Option<LaneDepthSetter>>,
    actuator_counters: Arc<ActuatorCounters>,
    stats: Mutex<MonitorStats>,
    check_interval: Duration,
    shedding_enabled: bool,
    shed_threshold: f64,
    recover_threshold: f64,
    stop: AtomicBool,
}

impl PressureMonitor {
    pub fn new(
        queue: Arc<DualQueue>,
        settings: &AdaptiveSettings,
        actuator_counters: Arc<ActuatorCounters>,
    ) -> Result<Self, LogError> {
        let machine = EscalationStateMachine::new(settings)?;
        Ok(Self {
            queue,
            machine: Mutex::new(machine),
            callbacks: Mutex::new(Vec::new()),
            diagnostic_writer: Mutex::new(None),
            metric_setter: Mutex::new(None),
            lane_depth_setter: Mutex::new(None),
            actuator_counters,
            stats: Mutex::new(MonitorStats::new()),
            check_interval: Duration::from_secs_f64(settings.check_interval_seconds),
            shedding_enabled: settings.shedding_enabled,
            shed_threshold: settings.protected_shed_threshold,
            recover_threshold: settings.protected_recover_threshold,
            stop: AtomicBool::new(false),
        })
    }

    /// Registers a `(old, new)` transition callback.
    pub fn on_level_change(&self, callback: impl Fn(PressureLevel, PressureLevel) + Send + Sync + 'static) {
        self.callbacks.lock().push(Box::new(callback));
    }

    /// Installs the out-of-band diagnostics writer.
    pub fn set_diagnostic_writer(&self, writer: impl Fn(DiagnosticEvent) + Send + Sync + 'static) {
        *self.diagnostic_writer.lock() = Some(Box::new(writer));
    }

    /// Installs the integer pressure-level gauge setter.
    pub fn set_metric_setter(&self, setter: impl Fn(usize) + Send + Sync + 'static) {
        *self.metric_setter.lock() = Some(Box::new(setter));
    }

    /// Installs the per-tick `(main_depth, protected_depth)` gauge setter.
    pub fn set_lane_depth_setter(&self, setter: impl Fn(usize, usize) + Send + Sync + 'static) {
        *self.lane_depth_setter.lock() = Some(Box::new(setter));
    }

    pub fn pressure_level(&self) -> PressureLevel {
        self.machine.lock().current_level()
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Monitor loop; exits promptly once [`PressureMonitor::stop`] is
    /// called.
    pub async fn run(self: Arc<Self>) {
        while !self.stop.load(Ordering::Acquire) {
            self.tick();
            tokio::time::sleep(self.check_interval).await;
        }
    }

    /// One sampling step. Public so the facade can force a deterministic
    /// tick during drain.
    pub fn tick(&self) {
        let main_depth = self.queue.main_len();
        let protected_depth = self.queue.protected_len();
        if let Some(setter) = self.lane_depth_setter.lock().as_ref() {
            setter(main_depth, protected_depth);
        }

        let fill_ratio = self.queue.main_fill_ratio();
        let (old, new) = {
            let mut machine = self.machine.lock();
            let old = machine.current_level();
            let new = machine.evaluate(fill_ratio);
            (old, new)
        };
        if new != old {
            self.handle_transition(old, new, fill_ratio);
        }

        if self.shedding_enabled {
            self.run_shedding_controller();
        }
    }

    fn handle_transition(&self, old: PressureLevel, new: PressureLevel, fill_ratio: f64) {
        let now = Instant::now();
        self.stats.lock().on_transition(old, new, now);

        info!(from = %old, to = %new, fill_ratio, "pressure level changed");

        // Callbacks are isolated: one panicking callback cannot take down
        // the others or the monitor.
        for callback in self.callbacks.lock().iter() {
            if catch_unwind(AssertUnwindSafe(|| callback(old, new))).is_err() {
                warn!(from = %old, to = %new, "pressure callback panicked; continuing");
            }
        }

        if let Some(writer) = self.diagnostic_writer.lock().as_ref() {
            let event = DiagnosticEvent::new("adaptive-controller", "pressure level changed")
                .with_field("from_level", json!(old.as_str()))
                .with_field("to_level", json!(new.as_str()))
                .with_field("fill_ratio", json!(fill_ratio));
            writer(event);
        }
        if let Some(setter) = self.metric_setter.lock().as_ref() {
            setter(new.index());
        }
    }

    fn run_shedding_controller(&self) {
        let protected_fill = self.queue.protected_fill_ratio();
        if protected_fill >= self.shed_threshold && !self.queue.is_shedding() {
            self.queue.activate_shedding();
            info!(protected_fill, "protected-lane shedding activated");
        } else if protected_fill < self.recover_threshold && self.queue.is_shedding() {
            self.queue.deactivate_shedding();
            info!(protected_fill, "protected-lane shedding deactivated");
        }
    }

    /// Finalizes time-at-level and returns the lifetime summary.
    pub fn snapshot(&self) -> AdaptiveSnapshot {
        let current = self.pressure_level();
        let mut stats = self.stats.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(stats.level_entered_at).as_secs_f64();
        *stats.time_at_level.entry(current).or_insert(0.0) += elapsed;
        stats.level_entered_at = now;

        AdaptiveSnapshot {
            peak_pressure_level: stats.peak,
            escalation_count: stats.escalations,
            deescalation_count: stats.deescalations,
            time_at_level: stats.time_at_level.clone(),
            filters_swapped: self.actuator_counters.filters_swapped.load(Ordering::Relaxed),
            workers_scaled: self.actuator_counters.workers_scaled.load(Ordering::Relaxed),
            peak_workers: self.actuator_counters.peak_workers.load(Ordering::Relaxed),
            batch_resize_count: self.actuator_counters.batch_resizes.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;

    use pipelog_domain::entities::{build_envelope, EnvelopeSeed, ExceptionSettings};
    use pipelog_domain::Level;

    fn queue(main: usize, protected: usize) -> Arc<DualQueue> {
        Arc::new(DualQueue::new(
            main,
            protected,
            HashSet::from([Level::Error, Level::Critical]),
        ))
    }

    fn fill(queue: &DualQueue, level: Level, count: usize) {
        for i in 0..count {
            let event = build_envelope(
                EnvelopeSeed {
                    level: Some(level),
                    message: format!("m{}", i),
                    ..Default::default()
                },
                &ExceptionSettings::default(),
            );
            queue.try_enqueue(event).unwrap();
        }
    }

    fn settings(shedding: bool) -> AdaptiveSettings {
        AdaptiveSettings {
            enabled: true,
            cooldown_seconds: 0.0,
            check_interval_seconds: 0.01,
            shedding_enabled: shedding,
            ..Default::default()
        }
    }

    fn monitor(queue: Arc<DualQueue>, settings: &AdaptiveSettings) -> Arc<PressureMonitor> {
        Arc::new(PressureMonitor::new(queue, settings, Arc::new(ActuatorCounters::new(1))).unwrap())
    }

    #[test]
    fn test_tick_escalates_on_main_fill() {
        let q = queue(100, 10);
        fill(&q, Level::Info, 70);
        let m = monitor(Arc::clone(&q), &settings(false));

        m.tick();
        assert_eq!(m.pressure_level(), PressureLevel::Elevated);
    }

    #[test]
    fn test_protected_depth_does_not_escalate() {
        let q = queue(100, 10);
        fill(&q, Level::Error, 10); // protected lane full; main empty
        let m = monitor(Arc::clone(&q), &settings(false));

        m.tick();
        assert_eq!(m.pressure_level(), PressureLevel::Normal);
    }

    #[test]
    fn test_callbacks_invoked_once_per_transition() {
        let q = queue(100, 10);
        fill(&q, Level::Info, 70);
        let m = monitor(Arc::clone(&q), &settings(false));

        let calls = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&calls);
        m.on_level_change(move |old, new| captured.lock().push((old, new)));

        m.tick();
        m.tick(); // constant fill; no second transition
        let calls = calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (PressureLevel::Normal, PressureLevel::Elevated));
    }

    #[test]
    fn test_panicking_callback_isolated() {
        let q = queue(100, 10);
        fill(&q, Level::Info, 70);
        let m = monitor(Arc::clone(&q), &settings(false));

        let good_calls = Arc::new(AtomicUsize::new(0));
        m.on_level_change(|_, _| panic!("callback bug"));
        let captured = Arc::clone(&good_calls);
        m.on_level_change(move |_, _| {
            captured.fetch_add(1, Ordering::SeqCst);
        });

        m.tick();
        assert_eq!(good_calls.load(Ordering::SeqCst), 1);
        assert_eq!(m.pressure_level(), PressureLevel::Elevated);
    }

    #[test]
    fn test_diagnostic_written_on_transition() {
        let q = queue(100, 10);
        fill(&q, Level::Info, 70);
        let m = monitor(Arc::clone(&q), &settings(false));

        let diagnostics = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&diagnostics);
        m.set_diagnostic_writer(move |event| captured.lock().push(event));

        m.tick();
        let diagnostics = diagnostics.lock();
        assert_eq!(diagnostics.len(), 1);
        let diag = diagnostics[0].to_json();
        assert_eq!(diag["component"], json!("adaptive-controller"));
        assert_eq!(diag["message"], json!("pressure level changed"));
        assert_eq!(diag["from_level"], json!("normal"));
        assert_eq!(diag["to_level"], json!("elevated"));
        assert_eq!(diag["fill_ratio"], json!(0.7));
    }

    #[test]
    fn test_metric_gauge_set_on_transition() {
        let q = queue(100, 10);
        fill(&q, Level::Info, 70);
        let m = monitor(Arc::clone(&q), &settings(false));

        let values = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&values);
        m.set_metric_setter(move |value| captured.lock().push(value));

        m.tick();
        m.tick();
        assert_eq!(*values.lock(), vec![1]); // Elevated index, once
    }

    #[test]
    fn test_shedding_activates_and_recovers() {
        let q = queue(100, 10);
        let m = monitor(Arc::clone(&q), &settings(true));

        fill(&q, Level::Error, 8); // 80% protected fill
        m.tick();
        assert!(q.is_shedding());

        // Drain protected below the recover threshold (30%).
        for _ in 0..6 {
            q.try_dequeue();
        }
        m.tick();
        assert!(!q.is_shedding());
    }

    #[test]
    fn test_shedding_disabled_without_adaptive_flag() {
        let q = queue(100, 10);
        let m = monitor(Arc::clone(&q), &settings(false));
        fill(&q, Level::Error, 10);
        m.tick();
        assert!(!q.is_shedding());
    }

    #[test]
    fn test_snapshot_counts_and_peak() {
        let q = queue(100, 10);
        fill(&q, Level::Info, 95);
        let m = monitor(Arc::clone(&q), &settings(false));

        m.tick(); // -> Elevated
        m.tick(); // -> High
        m.tick(); // -> Critical
        while q.try_dequeue().is_some() {}
        m.tick(); // -> High

        let snapshot = m.snapshot();
        assert_eq!(snapshot.peak_pressure_level, PressureLevel::Critical);
        assert_eq!(snapshot.escalation_count, 3);
        assert_eq!(snapshot.deescalation_count, 1);
        assert_eq!(snapshot.time_at_level.len(), PressureLevel::ALL.len());
    }

    #[tokio::test]
    async fn test_run_loop_stops() {
        let q = queue(100, 10);
        let m = monitor(q, &settings(false));

        let task = tokio::spawn(Arc::clone(&m).run());
        tokio::time::sleep(Duration::from_millis(30)).await;
        m.stop();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("monitor should stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_lane_depth_sampled_every_tick() {
        let q = queue(100, 10);
        fill(&q, Level::Info, 3);
        fill(&q, Level::Error, 2);
        let m = monitor(Arc::clone(&q), &settings(false));

        let samples = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&samples);
        m.set_lane_depth_setter(move |main, protected| captured.lock().push((main, protected)));

        m.tick();
        m.tick();
        let samples = samples.lock();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], (3, 2));
    }
}
