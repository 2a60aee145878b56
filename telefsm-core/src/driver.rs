//! Minimal reactor loop driving an [`Engine`] from tokio.
//!
//! The engine itself never blocks. [`Engine::run`] waits for the next timer
//! deadline, queued dispatch requests or a shutdown signal, and feeds each
//! into the engine on the current task.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::{Engine, EventId, InstanceId};

/// Shutdown mode for graceful or immediate termination of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Dispatch every request still queued before returning.
    Graceful,
    /// Return at once, dropping queued requests.
    Immediate,
}

/// A queued dispatch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inbound {
    pub target: InstanceId,
    pub event: EventId,
}

/// Cloneable sender side of a running engine loop.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    inbox_tx: mpsc::Sender<Inbound>,
    shutdown_tx: Arc<watch::Sender<Option<ShutdownMode>>>,
}

/// Receiver side consumed by [`Engine::run`].
#[derive(Debug)]
pub struct Mailbox {
    inbox: mpsc::Receiver<Inbound>,
    shutdown: watch::Receiver<Option<ShutdownMode>>,
}

/// Creates a handle/mailbox pair with room for `capacity` queued requests.
pub fn channel(capacity: usize) -> (EngineHandle, Mailbox) {
    let (inbox_tx, inbox) = mpsc::channel(capacity);
    let (shutdown_tx, shutdown) = watch::channel(None);
    (
        EngineHandle {
            inbox_tx,
            shutdown_tx: Arc::new(shutdown_tx),
        },
        Mailbox { inbox, shutdown },
    )
}

impl EngineHandle {
    /// Queues `event` for `target`.
    pub async fn send(
        &self,
        target: InstanceId,
        event: impl Into<EventId>,
    ) -> Result<(), mpsc::error::SendError<Inbound>> {
        self.inbox_tx
            .send(Inbound {
                target,
                event: event.into(),
            })
            .await
    }

    /// Queues `event` for `target` without waiting for capacity.
    pub fn try_send(
        &self,
        target: InstanceId,
        event: impl Into<EventId>,
    ) -> Result<(), mpsc::error::TrySendError<Inbound>> {
        self.inbox_tx.try_send(Inbound {
            target,
            event: event.into(),
        })
    }

    /// Stops the loop once every queued request has been dispatched.
    pub fn shutdown_graceful(&self) {
        let _ = self.shutdown_tx.send(Some(ShutdownMode::Graceful));
    }

    /// Stops the loop without dispatching queued requests.
    pub fn shutdown_immediate(&self) {
        let _ = self.shutdown_tx.send(Some(ShutdownMode::Immediate));
    }
}

impl Engine {
    /// Runs the engine until shutdown is requested or every handle is gone,
    /// then hands it back.
    ///
    /// Shutdown requests are seen first, then due timers, then queued
    /// requests. Dispatch failures are logged by [`Engine::dispatch`] and
    /// otherwise ignored.
    pub async fn run(mut self, mailbox: Mailbox) -> Self {
        let Mailbox {
            mut inbox,
            mut shutdown,
        } = mailbox;
        let mut shutdown_open = true;

        loop {
            self.fire_expired();
            let deadline = self.next_deadline();

            tokio::select! {
                biased;

                changed = shutdown.changed(), if shutdown_open => {
                    if changed.is_err() {
                        shutdown_open = false;
                        continue;
                    }
                    let mode = *shutdown.borrow_and_update();
                    match mode {
                        Some(ShutdownMode::Immediate) => {
                            tracing::debug!("engine loop stopped immediately");
                            return self;
                        }
                        Some(ShutdownMode::Graceful) => {
                            while let Ok(msg) = inbox.try_recv() {
                                let _ = self.dispatch(msg.target, msg.event, None);
                            }
                            self.fire_expired();
                            tracing::debug!("engine loop drained and stopped");
                            return self;
                        }
                        None => {}
                    }
                }
                _ = async {
                    match deadline {
                        Some(deadline) => tokio::time::sleep_until(deadline).await,
                        None => std::future::pending().await,
                    }
                } => {}
                msg = inbox.recv() => {
                    let Some(msg) = msg else { break };
                    let _ = self.dispatch(msg.target, msg.event, None);
                }
            }
        }

        self
    }
}
