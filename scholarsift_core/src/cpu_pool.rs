//! Small rayon pool for HTML and feed parsing.
//!
//! `scraper::Html` is not `Send`, so documents are parsed and queried entirely
//! inside a pool job; only the extracted records cross back to the runtime.

use crate::error::FetchError;
use once_cell::sync::Lazy;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, info};

static POOL_SIZE: Lazy<usize> = Lazy::new(|| {
    std::thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(2)
        .clamp(1, 4)
});

static CPU_POOL: Lazy<ThreadPool> = Lazy::new(|| {
    rayon::ThreadPoolBuilder::new()
        .num_threads(*POOL_SIZE)
        .thread_name(|idx| format!("scholarsift-parse-{idx}"))
        .build()
        .expect("failed to build scholarsift parse pool")
});

static IN_FLIGHT: AtomicUsize = AtomicUsize::new(0);

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run a parsing job off the async runtime.
///
/// A panic inside the job is reported as [`FetchError::Internal`].
pub async fn spawn_cpu<F, R>(job: F) -> Result<R, FetchError>
where
    F: FnOnce() -> Result<R, FetchError> + Send + 'static,
    R: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let queued = IN_FLIGHT.fetch_add(1, Ordering::Relaxed) + 1;
    if queued > *POOL_SIZE * 2 {
        info!(
            target: "scholarsift.cpu_pool",
            queued,
            threads = *POOL_SIZE,
            "parse backlog growing"
        );
    }

    let start = Instant::now();
    CPU_POOL.spawn(move || {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job))
            .map_err(|payload| {
                FetchError::Internal(format!("parse job panicked: {}", panic_reason(&*payload)))
            })
            .and_then(|inner| inner);
        let _ = tx.send(result);
        let remaining = IN_FLIGHT.fetch_sub(1, Ordering::Relaxed) - 1;
        debug!(
            target: "scholarsift.cpu_pool",
            remaining,
            latency_ms = start.elapsed().as_millis() as u64,
            "parse job finished"
        );
    });

    rx.await
        .map_err(|err| FetchError::Internal(format!("parse pool join error: {}", err)))?
}

pub fn queue_depth() -> usize {
    IN_FLIGHT.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_result_is_returned() {
        let value = spawn_cpu(|| Ok::<_, FetchError>(21 * 2)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let err = spawn_cpu(|| -> Result<(), FetchError> { panic!("malformed markup") })
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "internal_error");
        assert!(err.to_string().contains("malformed markup"));
    }
}
