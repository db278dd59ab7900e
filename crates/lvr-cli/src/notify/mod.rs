//! Outbound notifications: agent email and CRM follow-ups.
//!
//! Every notification is best-effort. Handlers hand the future to
//! [`BestEffort::spawn`] and answer the caller without waiting; a failed or
//! slow notification is logged at `warn` and dropped. Nothing is retried.

pub mod crm;
pub mod mail;

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_util::task::TaskTracker;

pub use crm::{CrmClient, CrmError, DisabledCrm, SalesforceClient};
pub use mail::{EmailMessage, LogMailer, MailError, Mailer, RelayMailer};

/// Background runner for fire-and-forget side effects.
///
/// Tasks run on the current tokio runtime under a per-task timeout. The
/// tracker lets the server drain in-flight tasks on shutdown.
#[derive(Debug, Clone)]
pub struct BestEffort {
    tracker: TaskTracker,
    timeout: Duration,
}

impl BestEffort {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            tracker: TaskTracker::new(),
            timeout,
        }
    }

    /// Run `task` in the background. Its outcome never reaches the caller.
    pub fn spawn<F, E>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let timeout = self.timeout;
        self.tracker.spawn(async move {
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(())) => tracing::debug!(task = name, "best-effort task finished"),
                Ok(Err(error)) => {
                    tracing::warn!(task = name, error = %error, "best-effort task failed");
                }
                Err(_) => tracing::warn!(
                    task = name,
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "best-effort task timed out"
                ),
            }
        });
    }

    /// Stop accepting tasks and wait for the in-flight ones to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Wait for the tasks spawned so far without closing the runner.
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
