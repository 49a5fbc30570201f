use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::entities::{queue_messages, scheduled_tasks};

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub name: String,
    pub queue_name: String,
    pub expression: String,
    pub payload: String,
    pub delete_after_completion: bool,
}

/// Schedules for the dispatcher and the message table behind the command queue.
pub struct TaskRepository {
    conn: DatabaseConnection,
}

impl TaskRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create_schedule(&self, input: NewSchedule) -> Result<scheduled_tasks::Model> {
        scheduled_tasks::ActiveModel {
            name: Set(input.name),
            queue_name: Set(input.queue_name),
            expression: Set(input.expression),
            payload: Set(input.payload),
            delete_after_completion: Set(input.delete_after_completion),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert schedule")
    }

    pub async fn list_schedules(&self) -> Result<Vec<scheduled_tasks::Model>> {
        scheduled_tasks::Entity::find()
            .order_by_asc(scheduled_tasks::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list schedules")
    }

    pub async fn get_schedule(&self, name: &str) -> Result<Option<scheduled_tasks::Model>> {
        scheduled_tasks::Entity::find()
            .filter(scheduled_tasks::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query schedule")
    }

    pub async fn delete_schedule(&self, name: &str) -> Result<bool> {
        let result = scheduled_tasks::Entity::delete_many()
            .filter(scheduled_tasks::Column::Name.eq(name))
            .exec(&self.conn)
            .await
            .context("Failed to delete schedule")?;
        Ok(result.rows_affected > 0)
    }

    pub async fn push_message(&self, queue_name: &str, body: &str) -> Result<queue_messages::Model> {
        let now = Utc::now();
        queue_messages::ActiveModel {
            queue_name: Set(queue_name.to_string()),
            body: Set(body.to_string()),
            receipt_handle: Set(None),
            visible_at: Set(now),
            receive_count: Set(0),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to enqueue message")
    }

    /// Leases up to `max` visible messages until `hidden_until`, handing each
    /// a fresh receipt handle.
    pub async fn lease_messages(
        &self,
        queue_name: &str,
        max: u64,
        now: DateTime<Utc>,
        hidden_until: DateTime<Utc>,
    ) -> Result<Vec<queue_messages::Model>> {
        let txn = self.conn.begin().await?;

        let visible = queue_messages::Entity::find()
            .filter(queue_messages::Column::QueueName.eq(queue_name))
            .filter(queue_messages::Column::VisibleAt.lte(now))
            .order_by_asc(queue_messages::Column::Id)
            .limit(max)
            .all(&txn)
            .await
            .context("Failed to poll queue")?;

        let mut leased = Vec::with_capacity(visible.len());
        for message in visible {
            let receive_count = message.receive_count + 1;
            let mut active: queue_messages::ActiveModel = message.into();
            active.receipt_handle = Set(Some(uuid::Uuid::new_v4().simple().to_string()));
            active.visible_at = Set(hidden_until);
            active.receive_count = Set(receive_count);
            leased.push(active.update(&txn).await?);
        }

        txn.commit().await?;
        Ok(leased)
    }

    pub async fn delete_message(&self, receipt_handle: &str) -> Result<bool> {
        let result = queue_messages::Entity::delete_many()
            .filter(queue_messages::Column::ReceiptHandle.eq(receipt_handle))
            .exec(&self.conn)
            .await
            .context("Failed to delete message")?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    #[tokio::test]
    async fn leased_messages_are_hidden_until_released() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let repo = store.tasks();

        repo.push_message("commands", r#"{"command":"clear_expired_tokens"}"#)
            .await
            .unwrap();
        repo.push_message("other", "{}").await.unwrap();

        let now = Utc::now();
        let later = now + chrono::Duration::seconds(10);
        let leased = repo.lease_messages("commands", 10, now, later).await.unwrap();
        assert_eq!(leased.len(), 1);
        assert_eq!(leased[0].receive_count, 1);

        assert!(repo.lease_messages("commands", 10, now, later).await.unwrap().is_empty());

        let again = repo
            .lease_messages("commands", 10, later, later + chrono::Duration::seconds(10))
            .await
            .unwrap();
        assert_eq!(again.len(), 1);
        assert_ne!(again[0].receipt_handle, leased[0].receipt_handle);

        let stale = leased[0].receipt_handle.clone().unwrap();
        assert!(!repo.delete_message(&stale).await.unwrap());
        let fresh = again[0].receipt_handle.clone().unwrap();
        assert!(repo.delete_message(&fresh).await.unwrap());
    }
}
