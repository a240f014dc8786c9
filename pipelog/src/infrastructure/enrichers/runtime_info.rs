// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Runtime Info Enricher
//!
//! Stamps each event with process-level facts: hostname, pid, and the
//! handling thread's name. Hostname and pid are resolved once at
//! construction; only the thread name is looked up per event.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::services::Enricher;
use pipelog_domain::LogError;

/// Adds `hostname`, `pid`, and `thread` to event data.
pub struct RuntimeInfoEnricher {
    hostname: String,
    pid: u32,
}

impl RuntimeInfoEnricher {
    pub fn new() -> Self {
        Self {
            hostname: resolve_hostname(),
            pid: std::process::id(),
        }
    }
}

fn resolve_hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

impl Default for RuntimeInfoEnricher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Enricher for RuntimeInfoEnricher {
    fn name(&self) -> &str {
        "runtime_info"
    }

    async fn enrich(&self, _event: &LogEnvelope) -> Result<Map<String, Value>, LogError> {
        let mut fields = Map::new();
        fields.insert("hostname".into(), json!(self.hostname));
        fields.insert("pid".into(), json!(self.pid));
        if let Some(thread) = std::thread::current().name() {
            fields.insert("thread".into(), json!(thread));
        }
        Ok(fields)
    }
}
