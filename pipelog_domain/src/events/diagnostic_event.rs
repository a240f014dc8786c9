// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Diagnostic Event
//!
//! Internal out-of-band record for conditions the pipeline must report
//! about itself (pressure transitions, contained stage failures, fallback
//! activations). Diagnostics deliberately bypass the logging pipeline
//! (reporting a queue problem through the same queue would recurse) and
//! are handed to a caller-supplied writer or emitted via `tracing`.

use serde_json::{Map, Value};

/// One self-describing diagnostic record.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticEvent {
    /// Emitting component, e.g. `"adaptive-controller"`.
    pub component: &'static str,
    pub message: String,
    pub fields: Map<String, Value>,
}

impl DiagnosticEvent {
    pub fn new(component: &'static str, message: impl Into<String>) -> Self {
        Self {
            component,
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Flat JSON object form (component and message inline with fields).
    pub fn to_json(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("component".into(), Value::String(self.component.to_string()));
        map.insert("message".into(), Value::String(self.message.clone()));
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_json_flattens_fields() {
        let event = DiagnosticEvent::new("adaptive-controller", "pressure level changed")
            .with_field("from_level", json!("normal"))
            .with_field("to_level", json!("elevated"));
        let value = event.to_json();
        assert_eq!(value["component"], json!("adaptive-controller"));
        assert_eq!(value["from_level"], json!("normal"));
        assert_eq!(value["to_level"], json!("elevated"));
    }
}
