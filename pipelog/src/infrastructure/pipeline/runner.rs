// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Runner
//!
//! Runs one event through the stage ladder:
//!
//! 1. **Enrichers** (concurrent): contributions merged into `data` in list
//!    order, last writer wins. A failing enricher loses its contribution
//!    and is reported via diagnostics; the others proceed.
//! 2. **Redactors** (sequential): each receives an owned copy and returns
//!    the transformed event; the runner commits the result only on `Ok`,
//!    so a redactor that fails mid-transformation rolls back to the last
//!    committed snapshot. Fail-open passes that snapshot through;
//!    fail-close drops the event.
//! 3. **Filters**: first `None` drops the event.
//! 4. **Serializer**: envelope to the versioned byte view.
//! 5. **Processors** (sequential): transform the serialized view; a
//!    failing processor keeps the previous view.
//!
//! Filters run on the envelope and processors on the serialized view, so
//! serialization sits between them; a dropped event is never serialized.
//!
//! ## Guardrails
//!
//! Redaction cost is bounded per event by a depth and key-count scan of
//! the `data` mapping. When the scan exceeds the configured bounds the
//! runner either proceeds best-effort (`continue`) or skips the redactor
//! stage and keeps the original event (`drop`). The `drop` policy drops
//! the *redaction work*, never the event.
//!
//! ## Unsafe Bypass
//!
//! Events carrying `data._pipelog_unsafe == true` skip the redactor stage
//! entirely. Only the facade's `unsafe_debug` can set the marker; the key
//! is stripped from caller-supplied extras on every normal log method.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::warn;

use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::services::{Enricher, Filter, Processor, Redactor};
use pipelog_domain::{LogError, SerializedView};

use crate::infrastructure::config::RedactionSettings;
use crate::infrastructure::serialization::serialize_envelope;

/// In-band marker that exempts an event from redaction.
pub const UNSAFE_MARKER: &str = "_pipelog_unsafe";

/// Orchestrates the stage ladder for every event a worker pulls.
///
/// The filter list is swappable at runtime (filter-tightening actuator);
/// workers snapshot it once per batch via [`PipelineRunner::current_filters`].
pub struct PipelineRunner {
    enrichers: Vec<Arc<dyn Enricher>>,
    redactors: Vec<Arc<dyn Redactor>>,
    processors: Vec<Arc<dyn Processor>>,
    filters: RwLock<Arc<Vec<Arc<dyn Filter>>>>,
    redaction: RedactionSettings,
}

impl PipelineRunner {
    pub fn new(
        enrichers: Vec<Arc<dyn Enricher>>,
        redactors: Vec<Arc<dyn Redactor>>,
        processors: Vec<Arc<dyn Processor>>,
        filters: Vec<Arc<dyn Filter>>,
        redaction: RedactionSettings,
    ) -> Self {
        Self {
            enrichers,
            redactors,
            processors,
            filters: RwLock::new(Arc::new(filters)),
            redaction,
        }
    }

    /// Snapshot of the active filter list; read once per batch.
    pub fn current_filters(&self) -> Arc<Vec<Arc<dyn Filter>>> {
        Arc::clone(&self.filters.read())
    }

    /// Atomically replaces the active filter list. Workers pick the new
    /// list up at their next batch boundary.
    pub fn swap_filters(&self, filters: Arc<Vec<Arc<dyn Filter>>>) {
        *self.filters.write() = filters;
    }

    /// Runs one event through every stage. `Ok(None)` means the event was
    /// intentionally dropped (filter decision or fail-close redaction).
    pub async fn run_event(
        &self,
        envelope: LogEnvelope,
        filters: &[Arc<dyn Filter>],
    ) -> Result<Option<SerializedView>, LogError> {
        let enriched = self.run_enrichers(envelope).await;

        let redacted = match self.run_redactors(enriched).await {
            Some(event) => event,
            None => return Ok(None),
        };

        let mut event = redacted;
        for filter in filters {
            match filter.filter(event).await {
                Some(passed) => event = passed,
                None => return Ok(None),
            }
        }

        let mut view = serialize_envelope(&event)?;
        for processor in &self.processors {
            match processor.process(view.clone()).await {
                Ok(next) => view = next,
                Err(error) => {
                    warn!(
                        processor = processor.name(),
                        error = %error,
                        "processor failed; keeping previous view"
                    );
                }
            }
        }
        Ok(Some(view))
    }

    async fn run_enrichers(&self, mut envelope: LogEnvelope) -> LogEnvelope {
        if self.enrichers.is_empty() {
            return envelope;
        }
        let contributions = futures::future::join_all(
            self.enrichers.iter().map(|enricher| enricher.enrich(&envelope)),
        )
        .await;
        for (enricher, contribution) in self.enrichers.iter().zip(contributions) {
            match contribution {
                Ok(fields) => {
                    for (key, value) in fields {
                        envelope.data.insert(key, value);
                    }
                }
                Err(error) => {
                    warn!(
                        enricher = enricher.name(),
                        error = %error,
                        "enricher failed; contribution dropped"
                    );
                }
            }
        }
        envelope
    }

    /// Returns `None` only in fail-close mode after a redactor failure.
    async fn run_redactors(&self, envelope: LogEnvelope) -> Option<LogEnvelope> {
        if self.redactors.is_empty() || is_unsafe_tagged(&envelope) {
            return Some(envelope);
        }

        if self.exceeds_guardrails(&envelope) {
            if self.redaction.guardrail_drop {
                warn!("redaction guardrails exceeded; event passed through unredacted");
                return Some(envelope);
            }
            warn!("redaction guardrails exceeded; continuing best-effort");
        }

        // `committed` is the rollback point: redactors transform an owned
        // copy, and only an Ok result replaces it.
        let mut committed = envelope;
        for redactor in &self.redactors {
            match redactor.redact(committed.clone()).await {
                Ok(next) => committed = next,
                Err(error) => {
                    warn!(
                        redactor = redactor.name(),
                        error = %error,
                        fail_close = self.redaction.fail_close,
                        "redactor failed"
                    );
                    if self.redaction.fail_close {
                        return None;
                    }
                    // fail-open: keep the last committed snapshot and let
                    // the remaining redactors run against it.
                }
            }
        }
        Some(committed)
    }

    fn exceeds_guardrails(&self, envelope: &LogEnvelope) -> bool {
        let mut keys_seen = 0usize;
        for value in envelope.data.values() {
            keys_seen += 1;
            if keys_seen > self.redaction.max_keys
                || depth_exceeds(value, self.redaction.max_depth, 1, &mut keys_seen, self.redaction.max_keys)
            {
                return true;
            }
        }
        false
    }
}

fn is_unsafe_tagged(envelope: &LogEnvelope) -> bool {
    envelope.data.get(UNSAFE_MARKER) == Some(&Value::Bool(true))
}

fn depth_exceeds(value: &Value, max_depth: usize, depth: usize, keys_seen: &mut usize, max_keys: usize) -> bool {
    if depth > max_depth {
        return true;
    }
    match value {
        Value::Object(map) => {
            for child in map.values() {
                *keys_seen += 1;
                if *keys_seen > max_keys || depth_exceeds(child, max_depth, depth + 1, keys_seen, max_keys) {
                    return true;
                }
            }
            false
        }
        Value::Array(items) => items
            .iter()
            .any(|child| depth_exceeds(child, max_depth, depth + 1, keys_seen, max_keys)),
        _ => false,
    }
}
