// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Common Test Helpers
//!
//! Shared sinks and builders for integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use pipelog::{LogError, SerializedView, Sink};

/// Sink that retains every delivered payload as parsed JSON.
pub struct CollectingSink {
    lines: Mutex<Vec<Value>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            lines: Mutex::new(Vec::new()),
        })
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.lines.lock().clone()
    }

    pub fn raw_lines(&self) -> Vec<String> {
        self.lines.lock().iter().map(|v| v.to_string()).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter_map(|v| v["log"]["message"].as_str().map(|s| s.to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }
}

#[async_trait]
impl Sink for CollectingSink {
    fn name(&self) -> &str {
        "collecting"
    }

    async fn write(&self, view: &SerializedView) -> Result<(), LogError> {
        let value: Value = serde_json::from_slice(view.as_bytes())?;
        self.lines.lock().push(value);
        Ok(())
    }
}

/// Sink that sleeps per write to simulate a slow downstream.
pub struct SlowSink {
    pub delay: Duration,
    pub delivered: Mutex<u64>,
}

impl SlowSink {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            delivered: Mutex::new(0),
        })
    }

    pub fn delivered(&self) -> u64 {
        *self.delivered.lock()
    }
}

#[async_trait]
impl Sink for SlowSink {
    fn name(&self) -> &str {
        "slow"
    }

    async fn write(&self, _view: &SerializedView) -> Result<(), LogError> {
        tokio::time::sleep(self.delay).await;
        *self.delivered.lock() += 1;
        Ok(())
    }
}
