use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::DatasourceError;

/// Caller-side control over a running query: cancellation and an optional deadline.
///
/// Every network wait in the pipeline goes through [`QueryContext::run`], so
/// cancelling the token or passing the deadline aborts plan submission and
/// in-progress stream reads alike.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl QueryContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context driven by an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Await `fut` unless the context is cancelled or its deadline passes first.
    ///
    /// # Errors
    /// Returns `DatasourceError::Cancelled` naming `step` when the wait is cut short,
    /// otherwise whatever `fut` returns.
    pub async fn run<T, F>(&self, step: &str, fut: F) -> Result<T, DatasourceError>
    where
        F: Future<Output = Result<T, DatasourceError>>,
    {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                Err(DatasourceError::Cancelled(format!("{step} cancelled by caller")))
            }
            () = deadline => {
                Err(DatasourceError::Cancelled(format!("{step} exceeded deadline")))
            }
            result = fut => result,
        }
    }
}
