use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "scheduled_tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// `Task-{command}-{uuid}`
    #[sea_orm(unique)]
    pub name: String,

    pub queue_name: String,

    /// `at(...)`, `rate(...)` or `cron(...)`
    pub expression: String,

    /// JSON command envelope delivered to the queue
    pub payload: String,

    pub delete_after_completion: bool,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
