//! Linear saga with reverse-order compensation.
//!
//! Multi-step lifecycle operations run their forward steps through a
//! [`Saga`]. Completed steps register a compensating action; when a later
//! forward step fails, the registered compensations run in reverse order
//! before the original error is returned. A compensation that itself fails
//! is collected and logged as critical with an `orphaned` marker - it never
//! replaces the forward error the caller sees.

use futures::future::BoxFuture;
use std::future::Future;

use super::error::AccessError;
use crate::storage::{StoreError, StoreResult};

/// A compensation step that failed during unwind. The referenced resource
/// is orphaned until manual reconciliation.
#[derive(Debug)]
pub struct CompensationFailure {
    pub step: &'static str,
    pub cause: StoreError,
}

struct Compensation {
    step: &'static str,
    undo: BoxFuture<'static, StoreResult<()>>,
}

/// A short linear saga scoped to one lifecycle operation.
pub struct Saga {
    operation: &'static str,
    compensations: Vec<Compensation>,
}

impl Saga {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            compensations: Vec::new(),
        }
    }

    /// Register the compensation for a forward step that just completed.
    pub fn register(&mut self, step: &'static str, undo: BoxFuture<'static, StoreResult<()>>) {
        self.compensations.push(Compensation { step, undo });
    }

    /// Run one forward step. On failure all registered compensations are
    /// unwound and the forward error is returned unchanged.
    pub async fn run<T, F>(&mut self, step: &'static str, forward: F) -> Result<T, AccessError>
    where
        F: Future<Output = Result<T, AccessError>>,
    {
        match forward.await {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(
                    operation = self.operation,
                    step,
                    error = %err,
                    "forward step failed, unwinding saga"
                );
                self.unwind().await;
                Err(err)
            }
        }
    }

    /// Run all registered compensations in reverse order. Failures are
    /// logged as critical and returned for inspection; unwind never aborts
    /// early.
    pub async fn unwind(&mut self) -> Vec<CompensationFailure> {
        let mut failures = Vec::new();
        while let Some(compensation) = self.compensations.pop() {
            match compensation.undo.await {
                Ok(()) => {
                    tracing::info!(
                        operation = self.operation,
                        step = compensation.step,
                        "compensation applied"
                    );
                }
                Err(cause) => {
                    tracing::error!(
                        operation = self.operation,
                        step = compensation.step,
                        error = %cause,
                        orphaned = true,
                        "compensation step failed, resource requires manual reconciliation"
                    );
                    failures.push(CompensationFailure {
                        step: compensation.step,
                        cause,
                    });
                }
            }
        }
        failures
    }

    /// Discard all compensations after the final forward step succeeded.
    pub fn commit(mut self) {
        self.compensations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn record(log: &Arc<Mutex<Vec<&'static str>>>, entry: &'static str) {
        log.lock().unwrap().push(entry);
    }

    #[tokio::test]
    async fn successful_steps_do_not_compensate() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga = Saga::new("test");

        let value = saga.run("step_one", async { Ok::<_, AccessError>(1) }).await;
        assert_eq!(value.unwrap(), 1);
        {
            let log = Arc::clone(&log);
            saga.register(
                "undo_one",
                Box::pin(async move {
                    record(&log, "undo_one");
                    Ok(())
                }),
            );
        }
        saga.commit();
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_unwinds_in_reverse_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga = Saga::new("test");

        for step in ["undo_one", "undo_two"] {
            let log = Arc::clone(&log);
            saga.register(
                step,
                Box::pin(async move {
                    record(&log, step);
                    Ok(())
                }),
            );
        }

        let result = saga
            .run("step_three", async {
                Err::<(), _>(AccessError::NotFound("organization"))
            })
            .await;
        assert!(matches!(result, Err(AccessError::NotFound(_))));
        assert_eq!(*log.lock().unwrap(), vec!["undo_two", "undo_one"]);
    }

    #[tokio::test]
    async fn failed_compensation_is_collected_and_does_not_stop_unwind() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga = Saga::new("test");

        {
            let log = Arc::clone(&log);
            saga.register(
                "undo_one",
                Box::pin(async move {
                    record(&log, "undo_one");
                    Ok(())
                }),
            );
        }
        saga.register(
            "undo_two",
            Box::pin(async { Err(StoreError::Backend(anyhow::anyhow!("boom"))) }),
        );

        let failures = saga.unwind().await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].step, "undo_two");
        // The later-registered compensation failed; the earlier one still ran.
        assert_eq!(*log.lock().unwrap(), vec!["undo_one"]);
    }
}
