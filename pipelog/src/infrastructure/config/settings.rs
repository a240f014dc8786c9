// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Runtime Settings
//!
//! This module provides the validated, immutable configuration record the
//! logger facade consumes. Loading from files or environment variables is
//! an external concern; whatever assembles a [`Settings`] value must go
//! through [`Settings::validated`], which is the only place configuration
//! errors are allowed to propagate out of the library.
//!
//! ## Validation Rules
//!
//! - Escalation thresholds strictly increasing:
//!   `escalate_to_elevated < escalate_to_high < escalate_to_critical`.
//! - Hysteresis: each `deescalate_from_X < escalate_to_X`.
//! - Shedding: `protected_shed_threshold > protected_recover_threshold`,
//!   and shedding requires the adaptive controller.
//! - Worker bounds: `worker_count >= 1`, `max_workers >= worker_count`.
//! - Queue bounds: capacities >= 1, `max_queue_growth >= 1.0`.
//! - Batching: `batch_max_size >= 1`, non-negative timeout.

use serde::{Deserialize, Serialize};

use pipelog_domain::entities::ExceptionSettings;
use pipelog_domain::{Level, LogError};

/// What `try_enqueue` does when the chosen lane is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressureMode {
    /// Drop immediately and increment the drop counter.
    #[default]
    Drop,
    /// Wait up to `backpressure_wait_ms`, then drop.
    WaitThenDrop,
    /// Block until space is available (producers must tolerate stalls).
    Block,
}

/// Redactor-stage behavior knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionSettings {
    /// `open`: a failing redactor passes the pre-redaction snapshot
    /// through. `close`: a failing redactor drops the event.
    pub fail_close: bool,
    /// Guardrail: maximum nesting depth scanned per event.
    pub max_depth: usize,
    /// Guardrail: maximum keys scanned per event.
    pub max_keys: usize,
    /// On guardrail exceeded: `false` = continue best-effort, `true` =
    /// return the original event untouched.
    pub guardrail_drop: bool,
}

impl Default for RedactionSettings {
    fn default() -> Self {
        Self {
            fail_close: false,
            max_depth: 16,
            max_keys: 1000,
            guardrail_drop: false,
        }
    }
}

/// Circuit-breaker settings applied around each user-facing sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkGuardSettings {
    pub enabled: bool,
    /// Consecutive failures before the breaker opens.
    pub failure_threshold: u32,
    /// Seconds the breaker stays open before allowing one probe.
    pub cooldown_seconds: f64,
    /// Minimal redaction of serialized payloads on the stderr fallback
    /// path (`true` = mask well-known secret keys).
    pub fallback_redact_minimal: bool,
}

impl Default for SinkGuardSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            cooldown_seconds: 30.0,
            fallback_redact_minimal: true,
        }
    }
}

/// Core producer/consumer path settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreSettings {
    /// Numeric gate; payloads below this severity are dropped pre-enqueue.
    pub level_gate: Option<u8>,
    /// Levels routed to the protected lane.
    pub protected_levels: Vec<Level>,
    pub queue_capacity: usize,
    pub protected_capacity: usize,
    pub batch_max_size: usize,
    pub batch_timeout_seconds: f64,
    pub backpressure_mode: BackpressureMode,
    pub backpressure_wait_ms: u64,
    pub worker_count: usize,
    /// Suppress consecutive identical (level, message) pairs at
    /// Error/Critical within this window; 0 disables suppression.
    pub duplicate_suppression_seconds: f64,
    pub exceptions: ExceptionSettings,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            level_gate: None,
            protected_levels: vec![Level::Error, Level::Critical],
            queue_capacity: 8192,
            protected_capacity: 1024,
            batch_max_size: 256,
            batch_timeout_seconds: 0.25,
            backpressure_mode: BackpressureMode::Drop,
            backpressure_wait_ms: 0,
            worker_count: 1,
            duplicate_suppression_seconds: 2.0,
            exceptions: ExceptionSettings::default(),
        }
    }
}

/// Adaptive pressure-controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveSettings {
    pub enabled: bool,
    pub check_interval_seconds: f64,
    pub cooldown_seconds: f64,
    pub escalate_to_elevated: f64,
    pub escalate_to_high: f64,
    pub escalate_to_critical: f64,
    pub deescalate_from_elevated: f64,
    pub deescalate_from_high: f64,
    pub deescalate_from_critical: f64,
    // Actuator toggles; all on when adaptive is enabled.
    pub filter_tightening: bool,
    pub worker_scaling: bool,
    pub capacity_growth: bool,
    pub max_workers: usize,
    /// Capacity growth cap as a multiple of the initial capacity.
    pub max_queue_growth: f64,
    // Protected-lane shedding.
    pub shedding_enabled: bool,
    pub protected_shed_threshold: f64,
    pub protected_recover_threshold: f64,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            check_interval_seconds: 0.25,
            cooldown_seconds: 5.0,
            escalate_to_elevated: 0.60,
            escalate_to_high: 0.80,
            escalate_to_critical: 0.92,
            deescalate_from_elevated: 0.40,
            deescalate_from_high: 0.60,
            deescalate_from_critical: 0.75,
            filter_tightening: true,
            worker_scaling: true,
            capacity_growth: true,
            max_workers: 8,
            max_queue_growth: 4.0,
            shedding_enabled: false,
            protected_shed_threshold: 0.70,
            protected_recover_threshold: 0.30,
        }
    }
}

/// The full validated configuration record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub core: CoreSettings,
    pub adaptive: AdaptiveSettings,
    pub redaction: RedactionSettings,
    pub sink_guard: SinkGuardSettings,
}

impl Settings {
    /// Validates the record and returns it unchanged on success. This is
    /// the single point where configuration errors propagate.
    pub fn validated(self) -> Result<Self, LogError> {
        self.core.validate()?;
        self.adaptive.validate()?;
        self.redaction.validate()?;
        if self.adaptive.worker_scaling && self.adaptive.max_workers < self.core.worker_count {
            return Err(LogError::invalid_config(format!(
                "max_workers ({}) must be >= worker_count ({})",
                self.adaptive.max_workers, self.core.worker_count
            )));
        }
        Ok(self)
    }
}

impl CoreSettings {
    fn validate(&self) -> Result<(), LogError> {
        if self.queue_capacity == 0 {
            return Err(LogError::invalid_config("queue_capacity must be >= 1"));
        }
        if self.protected_capacity == 0 {
            return Err(LogError::invalid_config("protected_capacity must be >= 1"));
        }
        if self.batch_max_size == 0 {
            return Err(LogError::invalid_config("batch_max_size must be >= 1"));
        }
        if self.batch_timeout_seconds < 0.0 {
            return Err(LogError::invalid_config("batch_timeout_seconds must be >= 0"));
        }
        if self.worker_count == 0 {
            return Err(LogError::invalid_config("worker_count must be >= 1"));
        }
        if self.duplicate_suppression_seconds < 0.0 {
            return Err(LogError::invalid_config("duplicate_suppression_seconds must be >= 0"));
        }
        Ok(())
    }
}

impl AdaptiveSettings {
    fn validate(&self) -> Result<(), LogError> {
        let ladder = [
            ("escalate_to_elevated", self.escalate_to_elevated),
            ("escalate_to_high", self.escalate_to_high),
            ("escalate_to_critical", self.escalate_to_critical),
        ];
        for window in ladder.windows(2) {
            let (low_name, low) = window[0];
            let (high_name, high) = window[1];
            if low >= high {
                return Err(LogError::invalid_config(format!(
                    "{} ({}) must be < {} ({})",
                    low_name, low, high_name, high
                )));
            }
        }
        let hysteresis = [
            ("deescalate_from_elevated", self.deescalate_from_elevated, "escalate_to_elevated", self.escalate_to_elevated),
            ("deescalate_from_high", self.deescalate_from_high, "escalate_to_high", self.escalate_to_high),
            ("deescalate_from_critical", self.deescalate_from_critical, "escalate_to_critical", self.escalate_to_critical),
        ];
        for (down_name, down, up_name, up) in hysteresis {
            if down >= up {
                return Err(LogError::invalid_config(format!(
                    "{} ({}) must be < {} ({})",
                    down_name, down, up_name, up
                )));
            }
        }
        if self.check_interval_seconds <= 0.0 {
            return Err(LogError::invalid_config("check_interval_seconds must be > 0"));
        }
        if self.cooldown_seconds < 0.0 {
            return Err(LogError::invalid_config("cooldown_seconds must be >= 0"));
        }
        if self.max_queue_growth < 1.0 {
            return Err(LogError::invalid_config("max_queue_growth must be >= 1.0"));
        }
        if self.protected_shed_threshold <= self.protected_recover_threshold {
            return Err(LogError::invalid_config(format!(
                "protected_shed_threshold ({}) must be greater than protected_recover_threshold ({})",
                self.protected_shed_threshold, self.protected_recover_threshold
            )));
        }
        if self.shedding_enabled && !self.enabled {
            return Err(LogError::invalid_config(
                "shedding requires the adaptive controller to be enabled",
            ));
        }
        Ok(())
    }
}

impl RedactionSettings {
    fn validate(&self) -> Result<(), LogError> {
        if self.max_depth == 0 {
            return Err(LogError::invalid_config("redaction max_depth must be >= 1"));
        }
        if self.max_keys == 0 {
            return Err(LogError::invalid_config("redaction max_keys must be >= 1"));
        }
        Ok(())
    }
}
