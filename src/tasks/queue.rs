//! Message queue the dispatcher writes to and the consumer polls.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

use crate::db::Store;

const POLL_STEP: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub receipt_handle: String,
    pub body: String,
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn send(&self, queue: &str, body: &str) -> Result<()>;

    /// Long-polls for up to `wait` and leases at most `max` messages, each
    /// hidden from other receivers for `visibility`.
    async fn receive(
        &self,
        queue: &str,
        max: u64,
        visibility: Duration,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>>;

    async fn delete(&self, receipt_handle: &str) -> Result<()>;
}

/// Queue stored in the application database.
pub struct DbMessageQueue {
    store: Store,
}

impl DbMessageQueue {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MessageQueue for DbMessageQueue {
    async fn send(&self, queue: &str, body: &str) -> Result<()> {
        self.store.tasks().push_message(queue, body).await?;
        Ok(())
    }

    async fn receive(
        &self,
        queue: &str,
        max: u64,
        visibility: Duration,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>> {
        let deadline = tokio::time::Instant::now() + wait;
        let visibility = chrono::Duration::from_std(visibility)?;

        loop {
            let now = Utc::now();
            let leased = self
                .store
                .tasks()
                .lease_messages(queue, max, now, now + visibility)
                .await?;

            if !leased.is_empty() || tokio::time::Instant::now() >= deadline {
                return Ok(leased
                    .into_iter()
                    .filter_map(|m| {
                        m.receipt_handle.map(|receipt_handle| QueueMessage {
                            receipt_handle,
                            body: m.body,
                        })
                    })
                    .collect());
            }

            tokio::time::sleep(POLL_STEP).await;
        }
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        self.store.tasks().delete_message(receipt_handle).await?;
        Ok(())
    }
}
