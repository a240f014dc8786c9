// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Log Envelope Entity
//!
//! This module provides the canonical in-memory record for one log event
//! and the pure builder that assembles it from producer-side inputs.
//!
//! ## Overview
//!
//! The envelope carries:
//!
//! - **Identity**: timestamp (POSIX float seconds UTC), level, message,
//!   logical logger name, correlation id (UUID v4 when none is bound).
//! - **Context**: bound context fields plus trace/span ids.
//! - **Data**: call-site extra fields, including the auto-masked
//!   `sensitive` subtree.
//! - **Diagnostics**: event origin and optional serialized exception.
//!
//! ## Builder Contract
//!
//! [`build_envelope`] is a pure function over its inputs. It never fails on
//! producer-side bad data; values that cannot be represented are coerced to
//! strings. Specifically:
//!
//! - `bound_context` merges under `extra` (extra wins) into `data`, and is
//!   also retained in `context` alongside the correlation/trace ids.
//! - `sensitive` / `pii` keys in `extra` whose values are objects are
//!   merged into `data.sensitive` (pii wins on conflict) with every leaf
//!   masked to `"***"` recursively; an empty merged container is omitted;
//!   non-object `sensitive` / `pii` values stay ordinary fields.
//! - An exception is serialized under `diagnostics.exception` when enabled,
//!   with the stack string and frame list bounded by [`ExceptionSettings`].
//!
//! ## Wire Shape
//!
//! [`LogEnvelope::to_wire_json`] renders the envelope as the `log` subtree
//! of the versioned schema envelope, with the timestamp re-expressed as an
//! RFC3339 UTC string with millisecond precision and trailing `Z`.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::value_objects::Level;

/// Placeholder written over masked sensitive values.
pub const MASK: &str = "***";

/// Where a log event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// Emitted through the native facade.
    #[default]
    Native,
    /// Bridged from a standard-library logging adapter.
    Stdlib,
    /// Bridged from a third-party framework adapter.
    ThirdParty,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Native => "native",
            Origin::Stdlib => "stdlib",
            Origin::ThirdParty => "third_party",
        }
    }
}

/// Diagnostics subtree of an envelope.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub origin: Origin,
    /// Serialized exception (`error.type`, `error.message`, `error.stack`,
    /// `error.frames`), present only when exception capture ran.
    pub exception: Option<Value>,
}

/// An exception captured at the call site, before serialization limits are
/// applied.
#[derive(Debug, Clone)]
pub struct CapturedError {
    /// Concrete error type name.
    pub kind: String,
    /// Display form of the error.
    pub message: String,
    /// Rendered stack or error-chain text, unbounded.
    pub stack: String,
    /// Individual frames (or chain links), outermost first.
    pub frames: Vec<String>,
}

impl CapturedError {
    /// Captures an error value plus its `source()` chain.
    ///
    /// The chain doubles as the frame list: each link is one frame, the
    /// rendered stack is the links joined with `caused by:`.
    pub fn from_error<E: std::error::Error + ?Sized>(kind: impl Into<String>, error: &E) -> Self {
        let mut frames = vec![error.to_string()];
        let mut source = error.source();
        while let Some(cause) = source {
            frames.push(cause.to_string());
            source = cause.source();
        }
        let stack = frames.join("\ncaused by: ");
        Self {
            kind: kind.into(),
            message: error.to_string(),
            stack,
            frames,
        }
    }
}

/// Limits applied when serializing a captured exception into diagnostics.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExceptionSettings {
    /// Master toggle; when false the exception is dropped entirely.
    pub enabled: bool,
    /// Maximum characters retained from the rendered stack.
    pub max_stack_chars: usize,
    /// Maximum entries retained from the frame list.
    pub max_frames: usize,
}

impl Default for ExceptionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_stack_chars: 16_384,
            max_frames: 32,
        }
    }
}

/// The canonical in-memory record of one log event.
#[derive(Debug, Clone)]
pub struct LogEnvelope {
    /// POSIX seconds UTC; non-negative, comparable. Serialized as RFC3339.
    pub timestamp: f64,
    pub level: Level,
    pub message: String,
    /// Logical logger name; defaults to `"root"`.
    pub logger: String,
    /// Always present; UUID v4 when not supplied by context.
    pub correlation_id: String,
    /// Bound context plus correlation/trace ids.
    pub context: Map<String, Value>,
    /// Call-site extra fields, including the masked `sensitive` subtree.
    pub data: Map<String, Value>,
    pub diagnostics: Diagnostics,
    pub tags: Option<Vec<String>>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
}

impl LogEnvelope {
    /// Renders the wire-format `log` subtree: RFC3339 UTC timestamp with
    /// millisecond precision, stable level string, optional fields omitted
    /// when absent.
    pub fn to_wire_json(&self) -> Value {
        let mut log = Map::new();
        log.insert("timestamp".into(), Value::String(format_rfc3339_millis(self.timestamp)));
        log.insert("level".into(), Value::String(self.level.as_str().to_string()));
        log.insert("message".into(), Value::String(self.message.clone()));
        log.insert("logger".into(), Value::String(self.logger.clone()));
        log.insert("correlation_id".into(), Value::String(self.correlation_id.clone()));
        log.insert("context".into(), Value::Object(self.context.clone()));
        log.insert("data".into(), Value::Object(self.data.clone()));

        let mut diagnostics = Map::new();
        diagnostics.insert(
            "origin".into(),
            Value::String(self.diagnostics.origin.as_str().to_string()),
        );
        if let Some(exception) = &self.diagnostics.exception {
            diagnostics.insert("exception".into(), exception.clone());
        }
        log.insert("diagnostics".into(), Value::Object(diagnostics));

        if let Some(tags) = &self.tags {
            log.insert("tags".into(), json!(tags));
        }
        if let Some(trace_id) = &self.trace_id {
            log.insert("trace_id".into(), Value::String(trace_id.clone()));
        }
        if let Some(span_id) = &self.span_id {
            log.insert("span_id".into(), Value::String(span_id.clone()));
        }
        Value::Object(log)
    }
}

/// Producer-side inputs to [`build_envelope`].
///
/// Everything is optional except level and message; defaults match the
/// facade's behavior for a bare `info("...")` call.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeSeed {
    pub level: Option<Level>,
    pub message: String,
    pub logger_name: Option<String>,
    pub extra: Option<Map<String, Value>>,
    pub bound_context: Option<Map<String, Value>>,
    pub correlation_id: Option<String>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub exception: Option<CapturedError>,
    pub origin: Origin,
}

/// Assembles a complete envelope from producer-side inputs.
///
/// Pure over its inputs. Never fails on bad producer data; see the module
/// docs for the merge and masking contract.
pub fn build_envelope(seed: EnvelopeSeed, exceptions: &ExceptionSettings) -> LogEnvelope {
    let level = seed.level.unwrap_or(Level::Info);
    let correlation_id = seed
        .correlation_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // data = bound_context merged under extra (extra wins), with the
    // sensitive/pii containers extracted and masked.
    let mut data = seed.bound_context.clone().unwrap_or_default();
    let mut sensitive = Map::new();
    if let Some(extra) = seed.extra {
        for (key, value) in extra {
            match (key.as_str(), value) {
                ("sensitive", Value::Object(map)) => {
                    for (k, v) in map {
                        sensitive.entry(k).or_insert(v);
                    }
                }
                // pii wins on key conflict with sensitive
                ("pii", Value::Object(map)) => {
                    for (k, v) in map {
                        sensitive.insert(k, v);
                    }
                }
                (_, value) => {
                    data.insert(key, value);
                }
            }
        }
    }
    if !sensitive.is_empty() {
        data.insert("sensitive".into(), mask_value(Value::Object(sensitive)));
    }

    // context = bound context + trace identifiers
    let mut context = seed.bound_context.unwrap_or_default();
    context.insert("correlation_id".into(), Value::String(correlation_id.clone()));
    if let Some(trace_id) = &seed.trace_id {
        context.insert("trace_id".into(), Value::String(trace_id.clone()));
    }
    if let Some(span_id) = &seed.span_id {
        context.insert("span_id".into(), Value::String(span_id.clone()));
    }

    let exception = match (&seed.exception, exceptions.enabled) {
        (Some(captured), true) => Some(serialize_exception(captured, exceptions)),
        _ => None,
    };

    LogEnvelope {
        timestamp: now_posix_seconds(),
        level,
        message: seed.message,
        logger: seed.logger_name.unwrap_or_else(|| "root".to_string()),
        correlation_id,
        context,
        data,
        diagnostics: Diagnostics {
            origin: seed.origin,
            exception,
        },
        tags: seed.tags,
        trace_id: seed.trace_id,
        span_id: seed.span_id,
    }
}

/// Recursively masks every leaf of a sensitive container.
///
/// Objects and arrays keep their shape; every other value becomes the
/// `"***"` placeholder. Masking an already-masked tree is a no-op.
fn mask_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, mask_value(v))).collect()),
        Value::Array(items) => Value::Array(items.into_iter().map(mask_value).collect()),
        _ => Value::String(MASK.to_string()),
    }
}

fn serialize_exception(captured: &CapturedError, limits: &ExceptionSettings) -> Value {
    let mut stack = captured.stack.clone();
    if stack.len() > limits.max_stack_chars {
        // Truncate on a char boundary.
        let mut cut = limits.max_stack_chars;
        while !stack.is_char_boundary(cut) {
            cut -= 1;
        }
        stack.truncate(cut);
    }
    let frames: Vec<Value> = captured
        .frames
        .iter()
        .take(limits.max_frames)
        .map(|frame| Value::String(frame.clone()))
        .collect();
    json!({
        "error.type": captured.kind,
        "error.message": captured.message,
        "error.stack": stack,
        "error.frames": frames,
    })
}

fn now_posix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Formats POSIX seconds as RFC3339 UTC with millisecond precision and a
/// trailing `Z`.
pub fn format_rfc3339_millis(timestamp: f64) -> String {
    let clamped = timestamp.max(0.0);
    let secs = clamped.trunc() as i64;
    let nanos = ((clamped - clamped.trunc()) * 1e9).round() as u32;
    chrono::DateTime::from_timestamp(secs, nanos.min(999_999_999))
        .unwrap_or(chrono::DateTime::UNIX_EPOCH)
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
