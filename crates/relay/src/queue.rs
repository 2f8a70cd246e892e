use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{metrics, openclaw::Forwarder, payload::AlertmanagerPayload};

/// Bounded FIFO hand-off between the webhook handlers and a single consumer
/// task that forwards payloads to OpenClaw one at a time.
///
/// `enqueue` never blocks: a full buffer is an overload signal reported back
/// to the producer, not an error. `stop` is idempotent and waits until the
/// consumer has drained every buffered payload.
pub struct DeliveryQueue {
    tx: mpsc::Sender<AlertmanagerPayload>,
    rx: Mutex<Option<mpsc::Receiver<AlertmanagerPayload>>>,
    forwarder: Arc<dyn Forwarder>,
    shutdown: CancellationToken,
    drained: CancellationToken,
    started: AtomicBool,
    stopping: AtomicBool,
}

impl DeliveryQueue {
    pub fn new(forwarder: Arc<dyn Forwarder>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            forwarder,
            shutdown: CancellationToken::new(),
            drained: CancellationToken::new(),
            started: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
        }
    }

    /// Launches the consumer task. Must be called at most once.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            panic!("delivery queue consumer already started");
        }

        let mut rx = self
            .rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .expect("delivery queue receiver already taken");
        let forwarder = self.forwarder.clone();
        let shutdown = self.shutdown.clone();
        let drained = self.drained.clone();

        tokio::spawn(async move {
            // Signals drain completion even if a forward panics.
            let _done = drained.drop_guard();

            loop {
                tokio::select! {
                    maybe = rx.recv() => match maybe {
                        Some(payload) => process(&forwarder, &shutdown, payload).await,
                        None => break,
                    },
                    _ = shutdown.cancelled() => {
                        // Stop intake, then attempt whatever is already
                        // buffered. In-flight forwards see the cancelled
                        // token and abort quickly.
                        rx.close();
                        while let Some(payload) = rx.recv().await {
                            process(&forwarder, &shutdown, payload).await;
                        }
                        break;
                    }
                }
            }

            info!("delivery queue consumer stopped");
        });
    }

    /// Attempts to place `payload` into the buffer without blocking.
    /// Returns `false` when the buffer is full or intake is closed; the
    /// caller maps that to a service-unavailable response.
    pub fn enqueue(&self, payload: AlertmanagerPayload) -> bool {
        match self.tx.try_send(payload) {
            Ok(()) => {
                metrics::ALERTS_ENQUEUED_TOTAL.inc();
                true
            }
            Err(mpsc::error::TrySendError::Full(payload)) => {
                warn!(
                    alertname = payload.alert_name(),
                    "delivery queue full, dropping alert"
                );
                metrics::ALERTS_DROPPED_TOTAL.inc();
                false
            }
            Err(mpsc::error::TrySendError::Closed(payload)) => {
                warn!(
                    alertname = payload.alert_name(),
                    "delivery queue stopped, dropping alert"
                );
                metrics::ALERTS_DROPPED_TOTAL.inc();
                false
            }
        }
    }

    /// Cancels any in-flight forward, closes intake, and waits for the
    /// consumer to drain. Safe to call repeatedly and from multiple tasks;
    /// teardown runs once, every caller observes full drain completion.
    pub async fn stop(&self) {
        if !self.stopping.swap(true, Ordering::SeqCst) {
            info!("stopping delivery queue");
            self.shutdown.cancel();
            if !self.started.load(Ordering::SeqCst) {
                // No consumer was ever launched, so nothing will drain.
                // Close intake ourselves so later enqueues are rejected.
                if let Some(mut rx) = self
                    .rx
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .take()
                {
                    rx.close();
                }
                self.drained.cancel();
            }
        }
        self.drained.cancelled().await;
    }
}

/// Forwards one payload and records the outcome. Failures are absorbed here
/// so one bad payload never halts the consumer.
async fn process(
    forwarder: &Arc<dyn Forwarder>,
    shutdown: &CancellationToken,
    payload: AlertmanagerPayload,
) {
    let alertname = payload.alert_name().to_string();
    info!(
        alertname = %alertname,
        status = %payload.status,
        alert_count = payload.alerts.len(),
        "processing alert"
    );

    match forwarder.forward(shutdown, &payload).await {
        Ok(()) => {
            metrics::FORWARDS_SUCCEEDED_TOTAL.inc();
            info!(alertname = %alertname, "alert forwarded to OpenClaw");
        }
        Err(err) if err.is_cancelled() => {
            metrics::FORWARDS_FAILED_TOTAL.inc();
            warn!(alertname = %alertname, "alert delivery cancelled by shutdown");
        }
        Err(err) => {
            metrics::FORWARDS_FAILED_TOTAL.inc();
            error!(alertname = %alertname, error = %err, "failed to forward alert to OpenClaw");
        }
    }
}
