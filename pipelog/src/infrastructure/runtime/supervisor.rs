// /////////////////////////////////////////////////////////////////////////////
// Pipelog RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Task Supervision Utilities
//!
//! Every long-running pipeline task (workers, the pressure monitor) is
//! spawned and joined through this module so no task can fail silently:
//! starts and exits are logged under a stable task name, and a panic in a
//! task body surfaces as a typed error at join time instead of vanishing
//! into a detached handle.
//!
//! Pipeline tasks run containment loops that return `()` — their errors
//! are handled in-loop, so the supervisor's job is lifecycle visibility
//! and panic conversion, not result propagation.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use pipelog_domain::LogError;

/// Result type alias for application operations
pub type AppResult<T> = Result<T, LogError>;

/// Spawns a named pipeline task with lifecycle logging.
///
/// The returned handle must be joined (directly via [`join_supervised`]
/// or in a batch via [`join_all_within`]); spawn-and-forget loses panics.
pub fn spawn_supervised<F>(name: &'static str, fut: F) -> JoinHandle<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    debug!(task = name, "task starting");

    tokio::spawn(async move {
        fut.await;
        debug!(task = name, "task exited");
    })
}

/// Awaits one supervised task, converting a panic or cancellation into a
/// typed error carrying the task name.
pub async fn join_supervised(name: &'static str, handle: JoinHandle<()>) -> AppResult<()> {
    match handle.await {
        Ok(()) => Ok(()),
        Err(e) if e.is_panic() => {
            error!(task = name, error = %e, "task panicked");
            Err(LogError::internal_error(format!("task {} panicked: {}", name, e)))
        }
        Err(e) if e.is_cancelled() => Err(LogError::cancelled()),
        Err(e) => Err(LogError::internal_error(format!("task {} join failed: {}", name, e))),
    }
}

/// Joins a batch of supervised tasks within `deadline`.
///
/// Returns the number of tasks that ended abnormally (panicked or were
/// cancelled), or a timeout error when the deadline elapses first; in
/// that case the unfinished tasks keep running detached and the caller
/// decides what to do with whatever work they left behind.
pub async fn join_all_within(deadline: Duration, handles: Vec<JoinHandle<()>>) -> AppResult<usize> {
    let name = "task-batch";
    let join_all = futures::future::join_all(handles);
    let results = tokio::time::timeout(deadline, join_all)
        .await
        .map_err(|_| LogError::timeout(format!("{} join exceeded {:?}", name, deadline)))?;

    let mut abnormal = 0usize;
    for result in results {
        if let Err(e) = result {
            abnormal += 1;
            if e.is_panic() {
                error!(task = name, error = %e, "task panicked");
            }
        }
    }
    Ok(abnormal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_and_join_clean_exit() {
        let handle = spawn_supervised("test-clean", async {});
        assert!(join_supervised("test-clean", handle).await.is_ok());
    }

    #[tokio::test]
    async fn test_join_converts_panic() {
        let handle = spawn_supervised("test-panic", async {
            panic!("task bug");
        });

        let result = join_supervised("test-panic", handle).await;
        assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("test-panic"));
        assert!(message.contains("panicked"));
    }

    #[tokio::test]
    async fn test_join_all_counts_abnormal_exits() {
        let handles = vec![
            spawn_supervised("ok", async {}),
            spawn_supervised("boom", async { panic!("task bug") }),
            spawn_supervised("ok-2", async {}),
        ];
        let abnormal = join_all_within(Duration::from_secs(1), handles).await.unwrap();
        assert_eq!(abnormal, 1);
    }

    #[tokio::test]
    async fn test_join_all_deadline_exceeded() {
        let handle = spawn_supervised("stuck", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let result = join_all_within(Duration::from_millis(20), vec![handle]).await;
        let error = result.unwrap_err();
        assert_eq!(error.category(), "timeout");
    }
}
