//! Bounded producer/consumer transport for one instrument pipeline.
//!
//! Decouples the ingestion source from the window updater with a fixed
//! capacity and an explicit full-queue policy: either the producer suspends
//! until space frees (never drop, slow the source) or the write is rejected
//! immediately (never block, accept loss under overload). FIFO order is
//! preserved; closure is one-way and idempotent, and a closed queue drains
//! its buffered items before signaling end-of-stream.

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::info;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue capacity must be positive")]
    InvalidCapacity,
    #[error("queue is closed")]
    Closed,
}

/// Behavior when the queue is full at send time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FullPolicy {
    /// Suspend the producer until capacity is available or the queue closes.
    #[default]
    Wait,
    /// Reject the new item immediately, reporting [`SendOutcome::Dropped`].
    DropNewest,
}

/// Whether a send was accepted into the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Accepted,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    pub capacity: usize,
    pub full_policy: FullPolicy,
    /// Optimization hints: the transport may pick a cheaper internal
    /// structure when there is exactly one writer and one reader. Advisory.
    pub single_writer: bool,
    pub single_reader: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            full_policy: FullPolicy::Wait,
            single_writer: true,
            single_reader: true,
        }
    }
}

/// Producer side of a bounded queue.
#[derive(Debug, Clone)]
pub struct QueueSender<T> {
    tx: mpsc::Sender<T>,
    full_policy: FullPolicy,
}

/// Consumer side of a bounded queue.
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: mpsc::Receiver<T>,
}

/// Creates a bounded queue pair with the configured full-queue policy.
///
/// Zero capacity is a configuration error; the pipeline must not start with
/// one.
pub fn bounded_queue<T>(cfg: &QueueConfig) -> Result<(QueueSender<T>, QueueReceiver<T>), QueueError> {
    if cfg.capacity == 0 {
        return Err(QueueError::InvalidCapacity);
    }

    info!(
        component = "queue",
        event = "queue.created",
        capacity = cfg.capacity,
        full_policy = ?cfg.full_policy,
        single_writer = cfg.single_writer,
        single_reader = cfg.single_reader
    );

    let (tx, rx) = mpsc::channel(cfg.capacity);
    Ok((
        QueueSender {
            tx,
            full_policy: cfg.full_policy,
        },
        QueueReceiver { rx },
    ))
}

impl<T> QueueSender<T> {
    /// Offers an item to the queue.
    ///
    /// Under [`FullPolicy::Wait`] this suspends until capacity frees or the
    /// queue is closed; under [`FullPolicy::DropNewest`] it returns
    /// immediately, reporting whether the item was accepted. Sending into a
    /// closed queue is [`QueueError::Closed`] under either policy.
    pub async fn send(&self, item: T) -> Result<SendOutcome, QueueError> {
        match self.full_policy {
            FullPolicy::Wait => self
                .tx
                .send(item)
                .await
                .map(|_| SendOutcome::Accepted)
                .map_err(|_| QueueError::Closed),
            FullPolicy::DropNewest => match self.tx.try_send(item) {
                Ok(()) => Ok(SendOutcome::Accepted),
                Err(TrySendError::Full(_)) => Ok(SendOutcome::Dropped),
                Err(TrySendError::Closed(_)) => Err(QueueError::Closed),
            },
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<T> QueueReceiver<T> {
    /// Receives the next item in FIFO order.
    ///
    /// Suspends until an item is available; returns `None` only once the
    /// queue is closed and fully drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Closes the queue from the consumer side. One-way and idempotent:
    /// subsequent sends fail, items already buffered remain receivable.
    pub fn close(&mut self) {
        self.rx.close();
    }
}
