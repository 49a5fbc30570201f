use crate::entities::prelude::*;
use crate::entities::queue_messages;
use sea_orm_migration::prelude::*;

use super::{create_entity_table, drop_entity_table};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, ScheduledTasks).await?;
        create_entity_table(manager, QueueMessages).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_queue_messages_queue_visible")
                    .table(QueueMessages)
                    .col(queue_messages::Column::QueueName)
                    .col(queue_messages::Column::VisibleAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, QueueMessages).await?;
        drop_entity_table(manager, ScheduledTasks).await
    }
}
