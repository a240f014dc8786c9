// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Task runtime: supervised spawning, the worker loop, the scalable worker
//! pool, and the bounded resource pool.

pub mod resource_pool;
pub mod supervisor;
pub mod worker;
pub mod worker_pool;

pub use resource_pool::{PoolGuard, ResourcePool};
pub use supervisor::{join_all_within, join_supervised, spawn_supervised, AppResult};
pub use worker::{run_worker, WorkerContext, WorkerCounters};
pub use worker_pool::WorkerPool;
