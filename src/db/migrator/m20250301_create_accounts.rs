use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;

use super::{create_entity_table, drop_entity_table};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, Users).await?;
        create_entity_table(manager, Teams).await?;
        create_entity_table(manager, TeamMembers).await?;
        create_entity_table(manager, TokenBlacklist).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, TokenBlacklist).await?;
        drop_entity_table(manager, TeamMembers).await?;
        drop_entity_table(manager, Teams).await?;
        drop_entity_table(manager, Users).await
    }
}
