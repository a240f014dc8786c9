// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Audit Sink
//!
//! Adapter that plugs an audit trail into the ordinary sink slot. Each
//! serialized envelope becomes one chained audit event: the log message
//! is carried as the audit message, and level, logger, and correlation id
//! travel in the audit metadata. Audit and Security level events map to
//! the security event type; everything else records as data access.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use pipelog_domain::entities::AuditEventType;
use pipelog_domain::services::Sink;
use pipelog_domain::{LogError, SerializedView};

use crate::infrastructure::audit::AuditTrail;

/// Sink adapter over an [`AuditTrail`].
pub struct AuditSink {
    trail: Arc<AuditTrail>,
}

impl AuditSink {
    pub fn new(trail: Arc<AuditTrail>) -> Self {
        Self { trail }
    }

    pub fn trail(&self) -> &Arc<AuditTrail> {
        &self.trail
    }
}

#[async_trait]
impl Sink for AuditSink {
    fn name(&self) -> &str {
        "audit"
    }

    async fn start(&self) -> Result<(), LogError> {
        self.trail.start().await
    }

    async fn stop(&self) -> Result<(), LogError> {
        self.trail.stop().await
    }

    async fn write(&self, view: &SerializedView) -> Result<(), LogError> {
        let value: Value = serde_json::from_slice(view.as_bytes())?;
        let log = value.get("log").cloned().unwrap_or(Value::Null);

        let message = log
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();
        let level = log.get("level").and_then(|l| l.as_str()).unwrap_or("INFO");

        let mut metadata = Map::new();
        metadata.insert("level".into(), Value::String(level.to_string()));
        if let Some(logger) = log.get("logger") {
            metadata.insert("logger".into(), logger.clone());
        }
        if let Some(correlation_id) = log.get("correlation_id") {
            metadata.insert("correlation_id".into(), correlation_id.clone());
        }

        let event_type = match level {
            "AUDIT" | "SECURITY" => AuditEventType::SecurityEvent,
            _ => AuditEventType::DataAccess,
        };
        self.trail.log_event_with(event_type, message, metadata).await;
        Ok(())
    }
}
