// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Fallback Sink
//!
//! Last line of defense for delivery. [`FallbackSink`] wraps any primary
//! sink; when the primary fails it:
//!
//! 1. Emits a diagnostic warning naming the primary, the error, and
//!    `fallback=stderr`.
//! 2. Writes the entry as a single JSON line to stderr.
//! 3. In `minimal` redact mode, masks well-known secret-bearing keys in
//!    the serialized payload before writing; invalid JSON falls back to a
//!    lossy raw write plus a diagnostic.
//! 4. Swallows stderr failures; only the diagnostic remains. Nothing on
//!    this path ever raises back to the caller.
//!
//! [`StderrFallbackSink`] exposes the same stderr path as a standalone
//! sink, usable as the breaker's routing target.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use pipelog_domain::entities::log_envelope::MASK;
use pipelog_domain::services::Sink;
use pipelog_domain::{LogError, SerializedView};

/// Redaction applied to serialized payloads on the stderr path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackRedactMode {
    /// Write the payload as-is.
    None,
    /// Mask well-known secret-bearing keys recursively.
    #[default]
    Minimal,
}

/// Keys masked in `minimal` mode.
const MINIMAL_REDACT_KEYS: [&str; 8] = [
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "authorization",
    "private_key",
];

/// Writes one serialized payload to stderr, applying the redact mode.
/// Never returns an error: stderr failure leaves only a diagnostic.
pub fn write_serialized_to_stderr(view: &SerializedView, redact_mode: FallbackRedactMode) {
    let line = match redact_mode {
        FallbackRedactMode::None => view.to_string_lossy(),
        FallbackRedactMode::Minimal => match serde_json::from_slice::<Value>(view.as_bytes()) {
            Ok(value) => redact_minimal(value).to_string(),
            Err(error) => {
                warn!(error = %error, "fallback payload is not valid JSON; writing raw bytes");
                view.to_string_lossy()
            }
        },
    };
    let mut stderr = std::io::stderr().lock();
    if let Err(error) = writeln!(stderr, "{}", line) {
        warn!(error = %error, "stderr write failed; event lost on fallback path");
    }
}

fn redact_minimal(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, child)| {
                    if MINIMAL_REDACT_KEYS.contains(&key.to_lowercase().as_str()) {
                        (key, Value::String(MASK.to_string()))
                    } else {
                        (key, redact_minimal(child))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact_minimal).collect()),
        other => other,
    }
}

/// Standalone stderr sink used as the default breaker fallback target.
pub struct StderrFallbackSink {
    redact_mode: FallbackRedactMode,
}

impl StderrFallbackSink {
    pub fn new(redact_mode: FallbackRedactMode) -> Self {
        Self { redact_mode }
    }
}

#[async_trait]
impl Sink for StderrFallbackSink {
    fn name(&self) -> &str {
        "stderr_fallback"
    }

    async fn write(&self, view: &SerializedView) -> Result<(), LogError> {
        write_serialized_to_stderr(view, self.redact_mode);
        Ok(())
    }
}

/// Primary-with-stderr-fallback wrapper.
pub struct FallbackSink {
    primary: Arc<dyn Sink>,
    redact_mode: FallbackRedactMode,
}

impl FallbackSink {
    pub fn new(primary: Arc<dyn Sink>, redact_mode: FallbackRedactMode) -> Self {
        Self { primary, redact_mode }
    }
}

#[async_trait]
impl Sink for FallbackSink {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn start(&self) -> Result<(), LogError> {
        self.primary.start().await
    }

    async fn stop(&self) -> Result<(), LogError> {
        self.primary.stop().await
    }

    async fn health_check(&self) -> bool {
        self.primary.health_check().await
    }

    async fn write(&self, view: &SerializedView) -> Result<(), LogError> {
        match self.primary.write(view).await {
            Ok(()) => Ok(()),
            Err(error) => {
                warn!(
                    sink = self.primary.name(),
                    error = %error,
                    fallback = "stderr",
                    "primary sink failed; writing to stderr"
                );
                write_serialized_to_stderr(view, self.redact_mode);
                Ok(())
            }
        }
    }
}
