// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pressure Actuators
//!
//! The monitor observes; actuators act. Registered as one level-change
//! callback, the set applies up to three effects per transition:
//!
//! - **Filter tightening**: swaps the pipeline's active filter list for
//!   the new level's rung of the ladder.
//! - **Worker scaling**: drives the pool toward
//!   `ceil(initial × scale_factor(level))`.
//! - **Capacity growth**: grows the main lane toward
//!   `initial × growth_factor(level)`, capped at `initial ×
//!   max_queue_growth`. Grow-only; de-escalation never shrinks.
//!
//! Each effect has an independent configuration toggle. All counters feed
//! the drain-time adaptive snapshot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use pipelog_domain::services::Filter;
use pipelog_domain::PressureLevel;

use crate::infrastructure::concurrency::DualQueue;
use crate::infrastructure::pipeline::PipelineRunner;
use crate::infrastructure::runtime::WorkerPool;

/// Main-lane capacity growth factor at each level.
pub fn queue_growth_factor(level: PressureLevel) -> f64 {
    match level {
        PressureLevel::Normal => 1.0,
        PressureLevel::Elevated => 1.25,
        PressureLevel::High => 1.5,
        PressureLevel::Critical => 2.0,
    }
}

/// Lifetime actuator activity, folded into the adaptive snapshot.
#[derive(Debug, Default)]
pub struct ActuatorCounters {
    pub filters_swapped: AtomicU64,
    pub workers_scaled: AtomicU64,
    pub peak_workers: AtomicUsize,
    pub batch_resizes: AtomicU64,
}

impl ActuatorCounters {
    pub fn new(initial_workers: usize) -> Self {
        let counters = Self::default();
        counters.peak_workers.store(initial_workers, Ordering::Relaxed);
        counters
    }
}

/// Filter lists keyed by pressure level. Levels without a rung keep the
/// previously active list.
pub struct FilterLadder {
    rungs: HashMap<PressureLevel, Arc<Vec<Arc<dyn Filter>>>>,
}

impl FilterLadder {
    pub fn new(rungs: HashMap<PressureLevel, Vec<Arc<dyn Filter>>>) -> Self {
        Self {
            rungs: rungs.into_iter().map(|(level, list)| (level, Arc::new(list))).collect(),
        }
    }

    pub fn rung_for(&self, level: PressureLevel) -> Option<Arc<Vec<Arc<dyn Filter>>>> {
        self.rungs.get(&level).map(Arc::clone)
    }
}

/// The three pressure actuators behind their toggles.
pub struct ActuatorSet {
    pipeline: Arc<PipelineRunner>,
    ladder: Option<FilterLadder>,
    pool: Option<Arc<WorkerPool>>,
    queue: Arc<DualQueue>,
    counters: Arc<ActuatorCounters>,
    initial_capacity: usize,
    max_queue_growth: f64,
    filter_tightening: bool,
    worker_scaling: bool,
    capacity_growth: bool,
}

impl ActuatorSet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pipeline: Arc<PipelineRunner>,
        ladder: Option<FilterLadder>,
        pool: Option<Arc<WorkerPool>>,
        queue: Arc<DualQueue>,
        counters: Arc<ActuatorCounters>,
        initial_capacity: usize,
        max_queue_growth: f64,
        filter_tightening: bool,
        worker_scaling: bool,
        capacity_growth: bool,
    ) -> Self {
        Self {
            pipeline,
            ladder,
            pool,
            queue,
            counters,
            initial_capacity,
            max_queue_growth,
            filter_tightening,
            worker_scaling,
            capacity_growth,
        }
    }

    /// Applies every enabled actuator for a transition to `new`.
    pub fn apply(&self, old: PressureLevel, new: PressureLevel) {
        debug!(from = %old, to = %new, "applying pressure actuators");

        if self.filter_tightening {
            if let Some(rung) = self.ladder.as_ref().and_then(|ladder| ladder.rung_for(new)) {
                self.pipeline.swap_filters(rung);
                self.counters.filters_swapped.fetch_add(1, Ordering::Relaxed);
            }
        }

        if self.worker_scaling {
            if let Some(pool) = &self.pool {
                let target = pool.target_for_level(new);
                if pool.scale_to(target) != 0 {
                    self.counters.workers_scaled.fetch_add(1, Ordering::Relaxed);
                }
                self.counters.peak_workers.fetch_max(pool.current_count(), Ordering::Relaxed);
            }
        }

        if self.capacity_growth {
            let target = (self.initial_capacity as f64 * queue_growth_factor(new)) as usize;
            let cap = (self.initial_capacity as f64 * self.max_queue_growth) as usize;
            // grow_capacity is monotonic; de-escalation targets below the
            // current capacity are no-ops.
            self.queue.grow_capacity(target.min(cap));
        }
    }
}
