// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bounded Resource Pool
//!
//! Generic pool for expensive reusable resources (HTTP clients for I/O
//! sinks, primarily). Capacity is enforced with a semaphore; `acquire`
//! waits up to the configured timeout and then surfaces a
//! backpressure-class error, which the calling sink records as a sink
//! failure. Resources return to the pool when the guard drops.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use pipelog_domain::LogError;

struct PoolShared<T> {
    idle: Mutex<Vec<T>>,
    semaphore: Arc<Semaphore>,
}

/// Bounded async resource pool with acquire timeout.
pub struct ResourcePool<T: Send + 'static> {
    shared: Arc<PoolShared<T>>,
    factory: Box<dyn Fn() -> T + Send + Sync>,
    acquire_timeout: Duration,
    max_size: usize,
}

impl<T: Send + 'static> ResourcePool<T> {
    pub fn new(
        max_size: usize,
        acquire_timeout: Duration,
        factory: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        let max_size = max_size.max(1);
        Self {
            shared: Arc::new(PoolShared {
                idle: Mutex::new(Vec::with_capacity(max_size)),
                semaphore: Arc::new(Semaphore::new(max_size)),
            }),
            factory: Box::new(factory),
            acquire_timeout,
            max_size,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of permits currently available.
    pub fn available(&self) -> usize {
        self.shared.semaphore.available_permits()
    }

    /// Acquires a resource, creating one lazily when the idle list is
    /// empty. Times out with `LogError::ResourceExhausted`.
    pub async fn acquire(&self) -> Result<PoolGuard<T>, LogError> {
        let permit = tokio::time::timeout(
            self.acquire_timeout,
            Arc::clone(&self.shared.semaphore).acquire_owned(),
        )
        .await
        .map_err(|_| {
            LogError::resource_exhausted(format!(
                "resource pool acquire timed out after {:?}",
                self.acquire_timeout
            ))
        })?
        .map_err(|_| LogError::internal_error("resource pool semaphore closed"))?;

        let resource = self.shared.idle.lock().pop().unwrap_or_else(|| (self.factory)());
        Ok(PoolGuard {
            resource: Some(resource),
            shared: Arc::clone(&self.shared),
            _permit: permit,
        })
    }
}

/// Owned handle to a pooled resource; returns it to the pool on drop.
pub struct PoolGuard<T: Send + 'static> {
    resource: Option<T>,
    shared: Arc<PoolShared<T>>,
    _permit: OwnedSemaphorePermit,
}

impl<T: Send + 'static> std::fmt::Debug for PoolGuard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolGuard")
            .field("resource", &self.resource.is_some())
            .finish()
    }
}

impl<T: Send + 'static> std::ops::Deref for PoolGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.resource.as_ref().expect("resource present until drop")
    }
}

impl<T: Send + 'static> std::ops::DerefMut for PoolGuard<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.resource.as_mut().expect("resource present until drop")
    }
}

impl<T: Send + 'static> Drop for PoolGuard<T> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.shared.idle.lock().push(resource);
        }
    }
}
