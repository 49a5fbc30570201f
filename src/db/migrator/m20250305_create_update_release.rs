use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;

use super::{create_entity_table, drop_entity_table};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, MyanimelistTokens).await?;
        create_entity_table(manager, UpdateReleases).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, UpdateReleases).await?;
        drop_entity_table(manager, MyanimelistTokens).await
    }
}
