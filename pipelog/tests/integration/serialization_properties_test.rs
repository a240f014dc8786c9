// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Property tests: serialization round-trip and grow-only capacity.

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use pipelog::{build_envelope, serialize_envelope, DualQueue, EnvelopeSeed, ExceptionSettings, Level};

fn level_strategy() -> impl Strategy<Value = Level> {
    prop::sample::select(vec![
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn serialized_envelope_round_trips(
        message in ".{0,120}",
        level in level_strategy(),
        key in "[a-z_]{1,12}",
        text_value in ".{0,40}",
        int_value in any::<i64>(),
    ) {
        let mut extra = Map::new();
        extra.insert(key.clone(), Value::String(text_value));
        extra.insert("n".to_string(), json!(int_value));

        let envelope = build_envelope(
            EnvelopeSeed {
                level: Some(level),
                message,
                extra: Some(extra),
                ..Default::default()
            },
            &ExceptionSettings::default(),
        );

        let view = serialize_envelope(&envelope).unwrap();
        let parsed: Value = serde_json::from_slice(view.as_bytes()).unwrap();

        prop_assert_eq!(&parsed["schema_version"], &json!("1.0"));
        // The log subtree equals the envelope's wire form exactly.
        prop_assert_eq!(&parsed["log"], &envelope.to_wire_json());
        // Level survives as its stable string.
        prop_assert_eq!(parsed["log"]["level"].as_str().unwrap(), level.as_str());
    }

    #[test]
    fn capacity_is_nondecreasing(targets in prop::collection::vec(1usize..10_000, 1..40)) {
        let queue = DualQueue::new(64, 8, HashSet::from([Level::Error]));
        let mut last = queue.capacity();
        for target in targets {
            queue.grow_capacity(target);
            let current = queue.capacity();
            prop_assert!(current >= last);
            prop_assert!(current >= 64);
            last = current;
        }
    }

    #[test]
    fn masking_is_idempotent(secret in ".{1,40}") {
        let mut extra = Map::new();
        extra.insert("sensitive".to_string(), json!({ "field": secret }));
        let envelope = build_envelope(
            EnvelopeSeed {
                level: Some(Level::Info),
                message: "m".into(),
                extra: Some(extra),
                ..Default::default()
            },
            &ExceptionSettings::default(),
        );
        prop_assert_eq!(&envelope.data["sensitive"]["field"], &json!("***"));

        // Feeding the masked value back through produces the same output.
        let mut again = Map::new();
        again.insert("sensitive".to_string(), json!({ "field": "***" }));
        let second = build_envelope(
            EnvelopeSeed {
                level: Some(Level::Info),
                message: "m".into(),
                extra: Some(again),
                ..Default::default()
            },
            &ExceptionSettings::default(),
        );
        prop_assert_eq!(&second.data["sensitive"], &envelope.data["sensitive"]);
    }
}
