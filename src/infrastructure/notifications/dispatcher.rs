//! Notification fan-out and the background delivery worker.
//!
//! Delivery is best-effort: one attempt per recipient per event, each bounded
//! by a timeout. A failing or hung recipient is logged and counted, never
//! retried, and never affects the others or the caller that raised the event.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::message::render_event;
use crate::domain::{EventPublisher, RequestEvent};
use crate::infrastructure::metrics;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(String),
}

/// A channel able to deliver a text message to one recipient.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: i64, text: &str) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: i64, text: &str) -> Result<(), NotifyError> {
        tracing::info!(recipient, text, "Notification (no bot token configured)");
        Ok(())
    }
}

/// Per-event delivery tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
    pub timed_out: usize,
}

enum Attempt {
    Sent,
    Failed,
    TimedOut,
}

/// Delivers events to a fixed set of recipients.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    recipients: Arc<[i64]>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, recipients: Vec<i64>, timeout: Duration) -> Self {
        Self {
            notifier,
            recipients: recipients.into(),
            timeout,
        }
    }

    pub fn recipients(&self) -> &[i64] {
        &self.recipients
    }

    /// Attempt every recipient concurrently, once each.
    pub async fn deliver(&self, event: &RequestEvent) -> DeliveryReport {
        let text = render_event(event);

        let attempts = self.recipients.iter().map(|&recipient| {
            let text = text.as_str();
            async move {
                match tokio::time::timeout(self.timeout, self.notifier.send(recipient, text)).await
                {
                    Ok(Ok(())) => {
                        metrics::record_notification("sent");
                        Attempt::Sent
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(
                            recipient,
                            request_id = event.request_id,
                            error = %e,
                            "Failed to notify administrator"
                        );
                        metrics::record_notification("failed");
                        Attempt::Failed
                    }
                    Err(_) => {
                        tracing::warn!(
                            recipient,
                            request_id = event.request_id,
                            timeout_ms = self.timeout.as_millis() as u64,
                            "Timed out notifying administrator"
                        );
                        metrics::record_notification("timeout");
                        Attempt::TimedOut
                    }
                }
            }
        });

        join_all(attempts)
            .await
            .into_iter()
            .fold(DeliveryReport::default(), |mut report, attempt| {
                match attempt {
                    Attempt::Sent => report.sent += 1,
                    Attempt::Failed => report.failed += 1,
                    Attempt::TimedOut => report.timed_out += 1,
                }
                report
            })
    }
}

/// Cheap, cloneable entry point that queues events for the worker.
#[derive(Clone)]
pub struct NotificationHandle {
    tx: mpsc::Sender<RequestEvent>,
}

impl EventPublisher for NotificationHandle {
    fn publish(&self, event: RequestEvent) {
        let request_id = event.request_id;
        match self.tx.try_send(event) {
            Ok(()) => metrics::notification_queued(),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(request_id, "Notification queue full, dropping event");
                metrics::record_notification("dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(request_id, "Notification worker stopped, dropping event");
                metrics::record_notification("dropped");
            }
        }
    }
}

/// Start the delivery worker.
///
/// The worker exits once every [`NotificationHandle`] has been dropped and
/// the queue is drained.
pub fn spawn_dispatcher(
    dispatcher: NotificationDispatcher,
    capacity: usize,
) -> (NotificationHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<RequestEvent>(capacity.max(1));

    let worker = tokio::spawn(async move {
        tracing::info!(
            recipients = dispatcher.recipients().len(),
            "Notification worker started"
        );
        while let Some(event) = rx.recv().await {
            metrics::notification_dequeued();
            let report = dispatcher.deliver(&event).await;
            tracing::debug!(
                request_id = event.request_id,
                sent = report.sent,
                failed = report.failed,
                timed_out = report.timed_out,
                "Notification delivered"
            );
        }
        tracing::info!("Notification worker stopped");
    });

    (NotificationHandle { tx }, worker)
}
