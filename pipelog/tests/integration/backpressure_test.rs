// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Backpressure behavior under burst load with a slow sink.

use std::time::{Duration, Instant};

use pipelog::{BackpressureMode, Level, LoggerBuilder, Settings};
use serde_json::Map;

use crate::common::{CollectingSink, SlowSink};

fn burst_settings() -> Settings {
    let mut settings = Settings::default();
    settings.core.queue_capacity = 16;
    settings.core.protected_capacity = 16;
    settings.core.batch_max_size = 8;
    settings.core.batch_timeout_seconds = 0.01;
    settings.core.worker_count = 1;
    settings.core.backpressure_mode = BackpressureMode::Drop;
    settings.core.duplicate_suppression_seconds = 0.0;
    settings
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn burst_with_drop_on_full_balances_counters() {
    let sink = SlowSink::new(Duration::from_millis(2));
    let logger = LoggerBuilder::new(burst_settings()).sink(sink.clone()).build().unwrap();

    let burst = 2000u64;
    let start = Instant::now();
    for i in 0..burst {
        logger.log_with(Level::Info, &format!("burst {}", i), Map::new());
    }
    let enqueue_elapsed = start.elapsed();

    let result = logger.stop_and_drain(Duration::from_secs(30)).await;

    assert_eq!(result.submitted, burst);
    assert!(result.dropped > 0, "a 16-slot queue cannot absorb the burst");
    assert_eq!(result.submitted, result.processed + result.dropped);
    assert_eq!(result.processed, sink.delivered());
    // Producers never stall on a full queue in drop mode.
    assert!(
        enqueue_elapsed < Duration::from_millis(200),
        "enqueue burst stalled for {:?}",
        enqueue_elapsed
    );
    assert!(result.queue_depth_high_watermark <= 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wait_then_drop_respects_budget() {
    let mut settings = burst_settings();
    settings.core.backpressure_mode = BackpressureMode::WaitThenDrop;
    settings.core.backpressure_wait_ms = 5;
    let sink = SlowSink::new(Duration::from_millis(20));
    let logger = LoggerBuilder::new(settings).sink(sink).build().unwrap();

    // Fill the queue, then measure one rejected enqueue.
    for i in 0..50 {
        logger.log_with(Level::Info, &format!("fill {}", i), Map::new());
    }
    let start = Instant::now();
    logger.log_with(Level::Info, "overflow probe", Map::new());
    let elapsed = start.elapsed();
    assert!(elapsed < Duration::from_millis(100), "waited {:?}", elapsed);

    logger.stop_and_drain(Duration::from_secs(30)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn block_mode_loses_nothing() {
    let mut settings = burst_settings();
    settings.core.backpressure_mode = BackpressureMode::Block;
    settings.core.queue_capacity = 8;
    let sink = CollectingSink::new();
    let logger = LoggerBuilder::new(settings).sink(sink.clone()).build().unwrap();

    for i in 0..100 {
        assert!(logger.log_async(Level::Info, &format!("m{}", i), Map::new()).await);
    }
    let result = logger.stop_and_drain(Duration::from_secs(10)).await;

    assert_eq!(result.submitted, 100);
    assert_eq!(result.processed, 100);
    assert_eq!(result.dropped, 0);
    assert_eq!(sink.len(), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn no_event_lost_without_overflow() {
    // Property: with capacity >= burst size and a single consumer, every
    // event survives.
    let mut settings = burst_settings();
    settings.core.queue_capacity = 256;
    let sink = CollectingSink::new();
    let logger = LoggerBuilder::new(settings).sink(sink.clone()).build().unwrap();

    for i in 0..200 {
        assert!(logger.log_with(Level::Info, &format!("m{}", i), Map::new()));
    }
    let result = logger.stop_and_drain(Duration::from_secs(10)).await;

    assert_eq!(result.submitted, 200);
    assert_eq!(result.processed, 200);
    assert_eq!(result.dropped, 0);
    assert_eq!(sink.len(), 200);
}
