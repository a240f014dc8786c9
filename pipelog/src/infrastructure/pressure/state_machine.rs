// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Escalation State Machine
//!
//! Hysteresis ladder over queue fill ratio. Escalation and de-escalation
//! use different thresholds so a fill ratio hovering inside the band
//! cannot make the level oscillate:
//!
//! | transition              | default   |
//! |-------------------------|-----------|
//! | escalate to elevated    | ≥ 0.60    |
//! | escalate to high        | ≥ 0.80    |
//! | escalate to critical    | ≥ 0.92    |
//! | de-escalate from elevated | < 0.40  |
//! | de-escalate from high     | < 0.60  |
//! | de-escalate from critical | < 0.75  |
//!
//! At most one step is taken per evaluation, in either direction.
//! Escalation compares with `>=`, de-escalation strictly with `<`.
//!
//! After any transition, further transitions are suppressed until the
//! cooldown elapses. The very first transition is always allowed.

use std::time::{Duration, Instant};

use pipelog_domain::{LogError, PressureLevel};

use crate::infrastructure::config::AdaptiveSettings;

/// One-step-per-tick hysteresis ladder with transition cooldown.
#[derive(Debug)]
pub struct EscalationStateMachine {
    escalate_to_elevated: f64,
    escalate_to_high: f64,
    escalate_to_critical: f64,
    deescalate_from_elevated: f64,
    deescalate_from_high: f64,
    deescalate_from_critical: f64,
    cooldown: Duration,
    current: PressureLevel,
    last_transition: Option<Instant>,
}

impl EscalationStateMachine {
    /// Builds the machine from adaptive settings, re-checking threshold
    /// ordering (construction is the last line of defense even when the
    /// settings object was validated upstream).
    pub fn new(settings: &AdaptiveSettings) -> Result<Self, LogError> {
        if !(settings.escalate_to_elevated < settings.escalate_to_high
            && settings.escalate_to_high < settings.escalate_to_critical)
        {
            return Err(LogError::invalid_config(
                "escalation thresholds must be strictly increasing",
            ));
        }
        if settings.deescalate_from_elevated >= settings.escalate_to_elevated
            || settings.deescalate_from_high >= settings.escalate_to_high
            || settings.deescalate_from_critical >= settings.escalate_to_critical
        {
            return Err(LogError::invalid_config(
                "each de-escalation threshold must be below its escalation threshold",
            ));
        }
        Ok(Self {
            escalate_to_elevated: settings.escalate_to_elevated,
            escalate_to_high: settings.escalate_to_high,
            escalate_to_critical: settings.escalate_to_critical,
            deescalate_from_elevated: settings.deescalate_from_elevated,
            deescalate_from_high: settings.deescalate_from_high,
            deescalate_from_critical: settings.deescalate_from_critical,
            cooldown: Duration::from_secs_f64(settings.cooldown_seconds),
            current: PressureLevel::Normal,
            last_transition: None,
        })
    }

    pub fn current_level(&self) -> PressureLevel {
        self.current
    }

    /// Evaluates one fill-ratio sample and returns the (possibly new)
    /// current level. Takes at most one step along the ladder.
    pub fn evaluate(&mut self, fill_ratio: f64) -> PressureLevel {
        self.evaluate_at(fill_ratio, Instant::now())
    }

    fn evaluate_at(&mut self, fill_ratio: f64, now: Instant) -> PressureLevel {
        let candidate = self.candidate_for(fill_ratio);
        if candidate == self.current {
            return self.current;
        }
        if let Some(last) = self.last_transition {
            if now.duration_since(last) < self.cooldown {
                return self.current; // suppressed by cooldown
            }
        }
        self.current = candidate;
        self.last_transition = Some(now);
        self.current
    }

    fn candidate_for(&self, fill_ratio: f64) -> PressureLevel {
        let up = self.current.next_up();
        if up != self.current && fill_ratio >= self.escalate_threshold(up) {
            return up;
        }
        if self.current != PressureLevel::Normal && fill_ratio < self.deescalate_threshold(self.current) {
            return self.current.next_down();
        }
        self.current
    }

    fn escalate_threshold(&self, target: PressureLevel) -> f64 {
        match target {
            PressureLevel::Elevated => self.escalate_to_elevated,
            PressureLevel::High => self.escalate_to_high,
            PressureLevel::Critical => self.escalate_to_critical,
            PressureLevel::Normal => f64::INFINITY, // never an escalation target
        }
    }

    fn deescalate_threshold(&self, from: PressureLevel) -> f64 {
        match from {
            PressureLevel::Elevated => self.deescalate_from_elevated,
            PressureLevel::High => self.deescalate_from_high,
            PressureLevel::Critical => self.deescalate_from_critical,
            PressureLevel::Normal => f64::NEG_INFINITY, // never de-escalates
        }
    }
}
