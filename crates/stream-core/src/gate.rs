//! Rendezvous hand-off between one sender and a pool of receivers.
//!
//! [`GateSender::send`] returns only after some receiver has taken the value,
//! so a coordinator that sends N units per tick cannot run ahead of its
//! workers. Each value goes to exactly one receiver.
//!
//! Built on a single-slot [`mpsc`] channel whose items carry a [`oneshot`]
//! acknowledgement. Receivers share the channel end behind a [`Mutex`].

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};

/// The receiving side is gone, or the gate was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("gate closed")]
pub struct GateClosed;

impl<T> From<mpsc::error::SendError<T>> for GateClosed {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        Self
    }
}

impl From<oneshot::error::RecvError> for GateClosed {
    fn from(_: oneshot::error::RecvError) -> Self {
        Self
    }
}

type Slot<T> = (T, oneshot::Sender<()>);

/// Create a connected sender and receiver.
pub fn gate<T>() -> (GateSender<T>, GateReceiver<T>) {
    let (tx, rx) = mpsc::channel(1);
    (
        GateSender { tx },
        GateReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Sending half of a gate. Dropping it closes the gate.
#[derive(Debug)]
pub struct GateSender<T> {
    tx: mpsc::Sender<Slot<T>>,
}

impl<T> GateSender<T> {
    /// Hand `value` to a receiver and wait until one has taken it.
    ///
    /// # Errors
    ///
    /// Returns [`GateClosed`] if every receiver has been dropped.
    pub async fn send(&self, value: T) -> Result<(), GateClosed> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx.send((value, ack_tx)).await?;
        ack_rx.await?;
        Ok(())
    }

    /// Close the gate. Receivers drain what is in flight and then see `None`.
    pub fn close(self) {
        drop(self);
    }
}

/// Receiving half of a gate. Clones share one queue.
#[derive(Debug)]
pub struct GateReceiver<T> {
    rx: Arc<Mutex<mpsc::Receiver<Slot<T>>>>,
}

impl<T> Clone for GateReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> GateReceiver<T> {
    /// Wait for the next value, or `None` once the gate is closed.
    pub async fn recv(&self) -> Option<T> {
        let (value, ack) = {
            let mut rx = self.rx.lock().await;
            rx.recv().await?
        };
        // The sender may have stopped waiting.
        let _ = ack.send(());
        Some(value)
    }
}
