// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Scalable Worker Pool
//!
//! Tracks the initial consumer tasks plus the dynamic workers spawned by
//! the worker-scaling actuator. The pool never owns the worker logic (a
//! factory closure spawns one worker task given its stop flag), so the
//! pool's only concerns are counting, retiring, and joining.
//!
//! ## Scaling Rules
//!
//! - `target_for_level` = `ceil(initial_count × scale_factor(level))`,
//!   capped at `max_workers`; the initial count is the floor.
//! - Scaling down retires dynamic workers only, most recently added first,
//!   by setting their stop flags; each worker finishes its current batch
//!   before exiting.
//! - Retired handles are kept so `drain_all` can join every task ever
//!   spawned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use pipelog_domain::PressureLevel;

/// Scale factor applied to the initial worker count at each level.
pub fn worker_scale_factor(level: PressureLevel) -> f64 {
    match level {
        PressureLevel::Normal => 1.0,
        PressureLevel::Elevated => 1.0,
        PressureLevel::High => 1.5,
        PressureLevel::Critical => 2.0,
    }
}

type WorkerFactory = Box<dyn Fn(Arc<AtomicBool>) -> JoinHandle<()> + Send + Sync>;

struct DynamicWorker {
    stop_flag: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Pool of consumer tasks with pressure-driven scaling.
pub struct WorkerPool {
    initial_count: usize,
    max_workers: usize,
    factory: WorkerFactory,
    initial_tasks: Mutex<Vec<JoinHandle<()>>>,
    dynamic: Mutex<Vec<DynamicWorker>>,
    retired: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// `factory` spawns one worker task that polls its stop flag at every
    /// suspension point and exits after finishing its current batch.
    pub fn new(
        initial_count: usize,
        max_workers: usize,
        factory: impl Fn(Arc<AtomicBool>) -> JoinHandle<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            initial_count,
            max_workers,
            factory: Box::new(factory),
            initial_tasks: Mutex::new(Vec::new()),
            dynamic: Mutex::new(Vec::new()),
            retired: Mutex::new(Vec::new()),
        }
    }

    /// Hands the pool the already-spawned initial worker handles so
    /// `drain_all` covers them.
    pub fn register_initial_tasks(&self, handles: Vec<JoinHandle<()>>) {
        *self.initial_tasks.lock() = handles;
    }

    pub fn initial_count(&self) -> usize {
        self.initial_count
    }

    /// Initial workers plus live dynamic workers.
    pub fn current_count(&self) -> usize {
        self.initial_count + self.dynamic.lock().len()
    }

    pub fn dynamic_count(&self) -> usize {
        self.dynamic.lock().len()
    }

    /// Worker target for a pressure level: `ceil(initial × factor)`,
    /// capped at `max_workers`.
    pub fn target_for_level(&self, level: PressureLevel) -> usize {
        let scaled = (self.initial_count as f64 * worker_scale_factor(level)).ceil() as usize;
        scaled.clamp(self.initial_count, self.max_workers)
    }

    /// Scales toward `target`, clamped to `[initial_count, max_workers]`.
    /// Returns the number of workers added (positive) or retired
    /// (negative); zero when already at target.
    pub fn scale_to(&self, target: usize) -> i64 {
        let target = target.clamp(self.initial_count, self.max_workers);
        let mut dynamic = self.dynamic.lock();
        let current = self.initial_count + dynamic.len();

        if target > current {
            let to_add = target - current;
            for _ in 0..to_add {
                let stop_flag = Arc::new(AtomicBool::new(false));
                let handle = (self.factory)(Arc::clone(&stop_flag));
                dynamic.push(DynamicWorker { stop_flag, handle });
            }
            debug!(added = to_add, total = target, "scaled worker pool up");
            to_add as i64
        } else if target < current {
            let to_retire = current - target;
            let mut retired = self.retired.lock();
            // Most recently added retire first.
            for _ in 0..to_retire {
                if let Some(worker) = dynamic.pop() {
                    worker.stop_flag.store(true, Ordering::Release);
                    retired.push(worker.handle);
                }
            }
            debug!(retired = to_retire, total = target, "scaled worker pool down");
            -(to_retire as i64)
        } else {
            0
        }
    }

    /// Flags every dynamic worker to stop and returns all handles
    /// (initial, dynamic, and previously retired) for joining.
    pub fn drain_all(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        handles.append(&mut self.initial_tasks.lock());
        {
            let mut dynamic = self.dynamic.lock();
            for worker in dynamic.drain(..) {
                worker.stop_flag.store(true, Ordering::Release);
                handles.push(worker.handle);
            }
        }
        handles.append(&mut self.retired.lock());
        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn idle_pool(initial: usize, max: usize) -> WorkerPool {
        WorkerPool::new(initial, max, |stop_flag| {
            tokio::spawn(async move {
                while !stop_flag.load(Ordering::Acquire) {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
        })
    }

    #[test]
    fn test_scale_ladder() {
        assert_eq!(worker_scale_factor(PressureLevel::Normal), 1.0);
        assert_eq!(worker_scale_factor(PressureLevel::Elevated), 1.0);
        assert_eq!(worker_scale_factor(PressureLevel::High), 1.5);
        assert_eq!(worker_scale_factor(PressureLevel::Critical), 2.0);
    }

    #[tokio::test]
    async fn test_initial_counts() {
        let pool = idle_pool(2, 6);
        assert_eq!(pool.current_count(), 2);
        assert_eq!(pool.dynamic_count(), 0);
    }

    #[tokio::test]
    async fn test_scale_up_adds_dynamic_workers() {
        let pool = idle_pool(2, 6);
        assert_eq!(pool.scale_to(4), 2);
        assert_eq!(pool.current_count(), 4);
        assert_eq!(pool.dynamic_count(), 2);
        for handle in pool.drain_all() {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_scale_down_retires_dynamic_workers() {
        let pool = idle_pool(2, 6);
        pool.scale_to(4);
        assert_eq!(pool.scale_to(2), -2);
        assert_eq!(pool.dynamic_count(), 0);
        for handle in pool.drain_all() {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_never_below_initial_count() {
        let pool = idle_pool(2, 6);
        pool.scale_to(1);
        assert_eq!(pool.current_count(), 2);
    }

    #[tokio::test]
    async fn test_never_above_max_workers() {
        let pool = idle_pool(2, 6);
        pool.scale_to(10);
        assert_eq!(pool.current_count(), 6);
        assert_eq!(pool.dynamic_count(), 4);
        for handle in pool.drain_all() {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_scale_to_same_is_noop() {
        let pool = idle_pool(2, 6);
        assert_eq!(pool.scale_to(2), 0);
        assert_eq!(pool.dynamic_count(), 0);
    }

    #[test]
    fn test_target_for_level_ceil() {
        let pool = idle_pool(2, 6);
        assert_eq!(pool.target_for_level(PressureLevel::Normal), 2);
        assert_eq!(pool.target_for_level(PressureLevel::High), 3); // ceil(2 * 1.5)
        assert_eq!(pool.target_for_level(PressureLevel::Critical), 4);
    }

    #[test]
    fn test_target_capped_at_max_workers() {
        let pool = idle_pool(4, 6);
        assert_eq!(pool.target_for_level(PressureLevel::Critical), 6); // 8 capped
    }

    #[tokio::test]
    async fn test_retire_most_recent_first() {
        use parking_lot::Mutex as PMutex;

        let flags: Arc<PMutex<Vec<Arc<AtomicBool>>>> = Arc::new(PMutex::new(Vec::new()));
        let captured = Arc::clone(&flags);
        let pool = WorkerPool::new(1, 4, move |stop_flag| {
            captured.lock().push(Arc::clone(&stop_flag));
            tokio::spawn(async move {
                while !stop_flag.load(Ordering::Acquire) {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
        });

        pool.scale_to(3); // two dynamic workers
        pool.scale_to(2); // retire one

        let flags = flags.lock();
        assert_eq!(flags.len(), 2);
        assert!(flags[1].load(Ordering::Acquire)); // second added, retired first
        assert!(!flags[0].load(Ordering::Acquire));
        drop(flags);

        for handle in pool.drain_all() {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_drain_all_returns_every_task() {
        let pool = idle_pool(2, 6);
        let initial = vec![
            tokio::spawn(async {}),
            tokio::spawn(async {}),
        ];
        pool.register_initial_tasks(initial);
        pool.scale_to(4);
        let handles = pool.drain_all();
        assert_eq!(handles.len(), 4);
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(pool.dynamic_count(), 0);
    }
}
