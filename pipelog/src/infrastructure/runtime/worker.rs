// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Loop
//!
//! Long-running consumer: pulls batches from the dual queue, runs the
//! pipeline, and writes surviving events to every sink.
//!
//! ## Batching
//!
//! A batch closes when it reaches `batch_max_size` or when
//! `batch_timeout` elapses, whichever comes first; an empty queue is
//! polled with a short backoff sleep. The active filter list is read once
//! per batch, which is where the filter-tightening actuator's swaps take
//! effect.
//!
//! ## Shutdown
//!
//! The stop flag is checked at every suspension point. Once it is set the
//! worker drains whatever is still queued (shedding is ignored on this
//! path), finishes that batch, and exits; a cancelled worker never
//! abandons events it already dequeued, and the counters reflect exactly
//! what reached the sinks.
//!
//! ## Counters
//!
//! `processed` counts events the pipeline fully handled: delivered or
//! intentionally dropped by a filter. `dropped` counts losses: enqueue
//! rejections (recorded by the facade) and pipeline errors. Together they
//! balance against `submitted`. A sink write that fails with a
//! recoverable error is retried once (`retried` counts these); every
//! failed write attempt feeds the sink-error metric, and per-batch flush
//! latency feeds both the shared counters and the flush histogram.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use pipelog_domain::entities::LogEnvelope;
use pipelog_domain::services::Sink;
use pipelog_domain::SerializedView;

use crate::infrastructure::concurrency::DualQueue;
use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::pipeline::PipelineRunner;

/// Counters shared between the facade and every worker.
#[derive(Debug, Default)]
pub struct WorkerCounters {
    pub submitted: AtomicU64,
    pub processed: AtomicU64,
    pub dropped: AtomicU64,
    pub retried: AtomicU64,
    flush_latency_micros: AtomicU64,
    flush_count: AtomicU64,
}

impl WorkerCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_flush(&self, elapsed: Duration) {
        self.flush_latency_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        self.flush_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Mean per-batch flush latency in seconds; 0.0 before the first
    /// flush.
    pub fn average_flush_latency_seconds(&self) -> f64 {
        let count = self.flush_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let total = self.flush_latency_micros.load(Ordering::Relaxed);
        (total as f64 / count as f64) / 1e6
    }
}

/// Everything one worker needs; shared by all workers in the pool.
pub struct WorkerContext {
    pub queue: Arc<DualQueue>,
    pub pipeline: Arc<PipelineRunner>,
    pub sinks: Vec<Arc<dyn Sink>>,
    pub counters: Arc<WorkerCounters>,
    pub metrics: MetricsService,
    pub batch_max_size: usize,
    pub batch_timeout: Duration,
    /// Sleep between polls of an empty queue.
    pub poll_backoff: Duration,
}

/// Runs one worker until its stop flag is set and the queue is drained.
pub async fn run_worker(ctx: Arc<WorkerContext>, stop_flag: Arc<AtomicBool>) {
    debug!("worker started");
    loop {
        let stopping = stop_flag.load(Ordering::Acquire);
        let batch = collect_batch(&ctx, &stop_flag).await;

        if batch.is_empty() {
            if stop_flag.load(Ordering::Acquire) {
                break;
            }
            continue;
        }

        process_batch(&ctx, batch).await;

        if stopping && ctx.queue.is_empty() {
            break;
        }
    }
    debug!("worker exited");
}

/// Accumulates up to `batch_max_size` events or until `batch_timeout`
/// elapses. When the stop flag is set, drains everything unconditionally.
async fn collect_batch(ctx: &WorkerContext, stop_flag: &AtomicBool) -> Vec<LogEnvelope> {
    let deadline = Instant::now() + ctx.batch_timeout;
    let mut batch = Vec::with_capacity(ctx.batch_max_size.min(64));

    loop {
        if stop_flag.load(Ordering::Acquire) {
            ctx.queue.drain_into(&mut batch);
            return batch;
        }
        match ctx.queue.try_dequeue() {
            Some(envelope) => {
                batch.push(envelope);
                if batch.len() >= ctx.batch_max_size {
                    return batch;
                }
            }
            None => {
                if Instant::now() >= deadline {
                    return batch;
                }
                tokio::time::sleep(ctx.poll_backoff).await;
            }
        }
        if Instant::now() >= deadline {
            return batch;
        }
    }
}

async fn process_batch(ctx: &WorkerContext, batch: Vec<LogEnvelope>) {
    // One filter snapshot per batch; actuator swaps land here.
    let filters = ctx.pipeline.current_filters();
    let flush_start = Instant::now();

    for envelope in batch {
        match ctx.pipeline.run_event(envelope, &filters).await {
            Ok(Some(view)) => {
                for sink in &ctx.sinks {
                    write_to_sink(ctx, sink, &view).await;
                }
                ctx.counters.processed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(None) => {
                // Intentionally filtered; the pipeline handled it fully.
                ctx.counters.processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => {
                warn!(error = %error, "pipeline failed; event dropped");
                ctx.counters.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
    let elapsed = flush_start.elapsed();
    ctx.counters.record_flush(elapsed);
    ctx.metrics.flush_duration_seconds.observe(elapsed.as_secs_f64());
}

/// One write with a single retry for recoverable failures. Every failed
/// attempt ticks the sink-error metric; a retry ticks `retried`.
async fn write_to_sink(ctx: &WorkerContext, sink: &Arc<dyn Sink>, view: &SerializedView) {
    let error = match sink.write(view).await {
        Ok(()) => return,
        Err(error) => error,
    };
    ctx.metrics.sink_errors_total.inc();

    if error.is_recoverable() {
        ctx.counters.retried.fetch_add(1, Ordering::Relaxed);
        match sink.write(view).await {
            Ok(()) => return,
            Err(retry_error) => {
                ctx.metrics.sink_errors_total.inc();
                warn!(
                    sink = sink.name(),
                    error = %retry_error,
                    "sink write failed after retry"
                );
                return;
            }
        }
    }
    warn!(sink = sink.name(), error = %error, "sink write failed");
}
