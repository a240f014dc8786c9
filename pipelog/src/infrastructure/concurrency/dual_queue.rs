// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dual-Priority Bounded Queue
//!
//! Two bounded FIFO lanes, `main` and `protected`, between producers and
//! the worker pool. The protected lane carries high-severity events that
//! must survive pressure; its membership set is fixed at construction.
//!
//! ## Concurrency
//!
//! Safe for multiple producers and multiple consumers. Each lane is a ring
//! buffer (`VecDeque`) behind a short `parking_lot` mutex over the ring
//! indices; producers only ever take the lock for a push or a length
//! check, so the critical sections are a handful of instructions. Drop
//! counters and the shedding flag are atomics; counter reads are
//! eventually consistent.
//!
//! ## Shedding
//!
//! While shedding is active, `try_dequeue` serves the protected lane only
//! and reports empty rather than touching main. Shedding never affects
//! enqueue semantics, and `drain_into` ignores it entirely (it exists for
//! shutdown, where everything must leave the building). Protected events
//! dequeued during shedding are indistinguishable from those dequeued
//! normally.
//!
//! ## Capacity
//!
//! Main-lane capacity is grow-only: `grow_capacity` may only increase it,
//! and wakes any producers parked in `await_enqueue`. The protected lane
//! keeps its construction-time capacity.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::Level;

/// Which lane an event was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Main,
    Protected,
}

struct LaneState {
    buf: VecDeque<LogEnvelope>,
    capacity: usize,
}

impl LaneState {
    fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
}

/// Bounded MPMC queue with a main lane and a protected lane.
pub struct DualQueue {
    main: Mutex<LaneState>,
    protected: Mutex<LaneState>,
    protected_levels: HashSet<Level>,
    shedding: AtomicBool,
    main_dropped: AtomicU64,
    protected_dropped: AtomicU64,
    main_high_watermark: AtomicUsize,
    /// Woken on dequeue and on capacity growth; parked producers re-check.
    space_available: Notify,
}

impl DualQueue {
    pub fn new(main_capacity: usize, protected_capacity: usize, protected_levels: HashSet<Level>) -> Self {
        Self {
            main: Mutex::new(LaneState::new(main_capacity)),
            protected: Mutex::new(LaneState::new(protected_capacity)),
            protected_levels,
            shedding: AtomicBool::new(false),
            main_dropped: AtomicU64::new(0),
            protected_dropped: AtomicU64::new(0),
            main_high_watermark: AtomicUsize::new(0),
            space_available: Notify::new(),
        }
    }

    /// Lane an event of this level routes to.
    pub fn lane_for(&self, level: Level) -> Lane {
        if self.protected_levels.contains(&level) {
            Lane::Protected
        } else {
            Lane::Main
        }
    }

    /// Non-blocking enqueue. On a full lane the envelope is handed back
    /// and the lane's drop counter is incremented.
    pub fn try_enqueue(&self, envelope: LogEnvelope) -> Result<(), LogEnvelope> {
        match self.try_push(envelope) {
            Ok(()) => Ok(()),
            Err(envelope) => {
                match self.lane_for(envelope.level) {
                    Lane::Main => self.main_dropped.fetch_add(1, Ordering::Relaxed),
                    Lane::Protected => self.protected_dropped.fetch_add(1, Ordering::Relaxed),
                };
                Err(envelope)
            }
        }
    }

    /// Enqueue that parks until lane space frees up (dequeue or growth).
    /// Used only in block-until-space backpressure mode.
    pub async fn await_enqueue(&self, mut envelope: LogEnvelope) {
        loop {
            // Register the waiter before the capacity check so a dequeue
            // between check and await cannot be missed.
            let notified = self.space_available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            match self.try_push(envelope) {
                Ok(()) => return,
                Err(back) => {
                    envelope = back;
                    notified.await;
                }
            }
        }
    }

    fn try_push(&self, envelope: LogEnvelope) -> Result<(), LogEnvelope> {
        let route = self.lane_for(envelope.level);
        let lane = match route {
            Lane::Main => &self.main,
            Lane::Protected => &self.protected,
        };
        let mut state = lane.lock();
        if state.buf.len() >= state.capacity {
            return Err(envelope);
        }
        state.buf.push_back(envelope);
        if route == Lane::Main {
            let depth = state.buf.len();
            self.main_high_watermark.fetch_max(depth, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Dequeues one event: protected lane first; main lane only when
    /// shedding is inactive.
    pub fn try_dequeue(&self) -> Option<LogEnvelope> {
        if let Some(envelope) = self.protected.lock().buf.pop_front() {
            self.space_available.notify_waiters();
            return Some(envelope);
        }
        if self.is_shedding() {
            return None;
        }
        let popped = self.main.lock().buf.pop_front();
        if popped.is_some() {
            self.space_available.notify_waiters();
        }
        popped
    }

    /// Drains both lanes into `batch`, protected first. Ignores shedding;
    /// used at shutdown.
    pub fn drain_into(&self, batch: &mut Vec<LogEnvelope>) {
        {
            let mut protected = self.protected.lock();
            batch.extend(protected.buf.drain(..));
        }
        {
            let mut main = self.main.lock();
            batch.extend(main.buf.drain(..));
        }
        self.space_available.notify_waiters();
    }

    /// Activates shedding; idempotent.
    pub fn activate_shedding(&self) {
        self.shedding.store(true, Ordering::Release);
    }

    /// Deactivates shedding; idempotent.
    pub fn deactivate_shedding(&self) {
        self.shedding.store(false, Ordering::Release);
    }

    pub fn is_shedding(&self) -> bool {
        self.shedding.load(Ordering::Acquire)
    }

    /// Grows main-lane capacity; monotonic. A smaller or equal target is a
    /// no-op. Wakes parked producers.
    pub fn grow_capacity(&self, new_capacity: usize) {
        {
            let mut main = self.main.lock();
            if new_capacity <= main.capacity {
                return;
            }
            main.capacity = new_capacity;
            let additional = new_capacity.saturating_sub(main.buf.len());
            main.buf.reserve(additional);
        }
        self.space_available.notify_waiters();
    }

    pub fn capacity(&self) -> usize {
        self.main.lock().capacity
    }

    pub fn protected_capacity(&self) -> usize {
        self.protected.lock().capacity
    }

    pub fn main_len(&self) -> usize {
        self.main.lock().buf.len()
    }

    pub fn protected_len(&self) -> usize {
        self.protected.lock().buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.main_len() == 0 && self.protected_len() == 0
    }

    pub fn is_full(&self) -> bool {
        let main = self.main.lock();
        main.buf.len() >= main.capacity
    }

    /// Main-lane fill ratio; the pressure monitor escalates on this value
    /// only (protected depth drives shedding instead).
    pub fn main_fill_ratio(&self) -> f64 {
        let main = self.main.lock();
        if main.capacity == 0 {
            return 0.0;
        }
        main.buf.len() as f64 / main.capacity as f64
    }

    /// Protected-lane fill ratio; drives the shedding controller.
    pub fn protected_fill_ratio(&self) -> f64 {
        let protected = self.protected.lock();
        if protected.capacity == 0 {
            return 0.0;
        }
        protected.buf.len() as f64 / protected.capacity as f64
    }

    pub fn main_dropped(&self) -> u64 {
        self.main_dropped.load(Ordering::Relaxed)
    }

    pub fn protected_dropped(&self) -> u64 {
        self.protected_dropped.load(Ordering::Relaxed)
    }

    pub fn dropped_total(&self) -> u64 {
        self.main_dropped() + self.protected_dropped()
    }

    pub fn main_high_watermark(&self) -> usize {
        self.main_high_watermark.load(Ordering::Relaxed)
    }
}
