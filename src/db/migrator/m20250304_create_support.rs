use crate::entities::appeals;
use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;

use super::{create_entity_table, drop_entity_table};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, Appeals).await?;
        create_entity_table(manager, AppealHistory).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appeals_kind_status")
                    .table(Appeals)
                    .col(appeals::Column::Kind)
                    .col(appeals::Column::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, AppealHistory).await?;
        drop_entity_table(manager, Appeals).await
    }
}
