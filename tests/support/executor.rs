use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hedgelink::error::{Error, ExecutionError, Result};
use hedgelink::exchange::{Fill, OrderExecutor, OrderId, OrderRequest};
use parking_lot::Mutex;
use tokio::time::sleep;

/// Deterministic test double for order submission.
///
/// Requests are recorded in call order. Queued errors are returned
/// first-in-first-out; once the queue is drained, every call fills at
/// the requested price and size.
#[derive(Default)]
pub struct ScriptedExecutor {
    failures: Mutex<VecDeque<Error>>,
    requests: Mutex<Vec<OrderRequest>>,
    fill_counter: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay_ms: u64,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor whose calls take `delay_ms` before completing, so tests
    /// can observe overlapping submissions.
    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::default()
        }
    }

    /// Queue an error for the next call.
    pub fn push_failure(&self, error: Error) {
        self.failures.lock().push_back(error);
    }

    pub fn requests(&self) -> Vec<OrderRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Highest number of calls observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderExecutor for ScriptedExecutor {
    async fn execute(&self, request: &OrderRequest) -> Result<Fill> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if self.delay_ms > 0 {
            sleep(Duration::from_millis(self.delay_ms)).await;
        }

        self.requests.lock().push(request.clone());
        let failure = self.failures.lock().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match failure {
            Some(error) => Err(error),
            None => {
                let seq = self.fill_counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(Fill::new(
                    OrderId::new(format!("order-{seq}")),
                    request.size(),
                    request.price(),
                ))
            }
        }
    }
}

/// An error the gateway treats as retryable.
pub fn transient_error() -> Error {
    ExecutionError::SubmissionFailed("connection reset by peer".into()).into()
}

/// An error the gateway gives up on immediately.
pub fn rejection_error() -> Error {
    ExecutionError::OrderRejected("insufficient balance".into()).into()
}
