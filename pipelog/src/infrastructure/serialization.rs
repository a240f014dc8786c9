// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Envelope Serialization
//!
//! Renders an envelope into the versioned wire format:
//!
//! ```text
//! {"schema_version":"1.0","log":{...}}
//! ```
//!
//! The output terminates without a newline. JSON-lines framing is a
//! separate step ([`frame_json_line`]) applied only ahead of line-oriented
//! sinks, so binary and HTTP sinks receive the unframed buffer.
//!
//! Key ordering is whatever the envelope produces; consumers must treat
//! the output as round-trippable JSON, not as a canonical byte form.

use serde_json::json;

use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::{LogError, SerializedView};

/// Wire schema version emitted in every serialized envelope.
pub const SCHEMA_VERSION: &str = "1.0";

/// Serializes one envelope into the schema wrapper. No trailing newline.
pub fn serialize_envelope(envelope: &LogEnvelope) -> Result<SerializedView, LogError> {
    let wrapped = json!({
        "schema_version": SCHEMA_VERSION,
        "log": envelope.to_wire_json(),
    });
    let bytes = serde_json::to_vec(&wrapped)?;
    Ok(SerializedView::new(bytes))
}

/// Appends the JSON-lines terminator, copying once.
pub fn frame_json_line(view: &SerializedView) -> Vec<u8> {
    let mut framed = Vec::with_capacity(view.len() + 1);
    framed.extend_from_slice(view.as_bytes());
    framed.push(b'\n');
    framed
}
