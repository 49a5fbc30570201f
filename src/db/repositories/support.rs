use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::db::{Page, PageRequest, fetch_page};
use crate::domain::history::{appeal_follow_up, appeal_status};
use crate::domain::{AppealEvent, AppealKind, AppealStatus};
use crate::entities::{appeal_history, appeals};

/// Fields of a new appeal; kind-specific fields are `None` for the other kind.
#[derive(Debug, Clone)]
pub struct NewAppeal {
    pub kind: AppealKind,
    pub email: String,
    pub message: String,
    pub title: Option<String>,
    pub organization: Option<String>,
    pub contact_person: Option<String>,
    pub release_url: Option<serde_json::Value>,
    pub document_url: Option<serde_json::Value>,
    pub explanation: Option<String>,
    pub user_id: Option<i32>,
}

pub struct SupportRepository {
    conn: DatabaseConnection,
}

impl SupportRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Stores the appeal and fires its OPEN event.
    pub async fn create(&self, input: NewAppeal) -> Result<appeals::Model> {
        let txn = self.conn.begin().await?;

        let appeal = appeals::ActiveModel {
            kind: Set(input.kind),
            email: Set(input.email),
            message: Set(input.message),
            title: Set(input.title),
            organization: Set(input.organization),
            contact_person: Set(input.contact_person),
            release_url: Set(input.release_url),
            document_url: Set(input.document_url),
            explanation: Set(input.explanation),
            user_id: Set(input.user_id),
            assigned_id: Set(None),
            status: Set(AppealStatus::Open),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert appeal")?;

        let (appeal, _) = process_event(&txn, appeal, AppealEvent::Open, input.user_id, "").await?;

        txn.commit().await?;
        Ok(appeal)
    }

    pub async fn get(&self, kind: AppealKind, id: i32) -> Result<Option<appeals::Model>> {
        appeals::Entity::find_by_id(id)
            .filter(appeals::Column::Kind.eq(kind))
            .one(&self.conn)
            .await
            .context("Failed to query appeal")
    }

    pub async fn list(
        &self,
        kind: AppealKind,
        status: Option<AppealStatus>,
        request: PageRequest,
    ) -> Result<Page<appeals::Model>> {
        let mut select = appeals::Entity::find()
            .filter(appeals::Column::Kind.eq(kind))
            .order_by_desc(appeals::Column::CreatedAt)
            .order_by_desc(appeals::Column::Id);
        if let Some(status) = status {
            select = select.filter(appeals::Column::Status.eq(status));
        }
        fetch_page(&self.conn, select, request).await
    }

    pub async fn history(&self, appeal_id: i32) -> Result<Vec<appeal_history::Model>> {
        appeal_history::Entity::find()
            .filter(appeal_history::Column::AppealId.eq(appeal_id))
            .order_by_asc(appeal_history::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query appeal history")
    }

    /// Appends an event with its chained follow-up in one transaction and
    /// returns the updated appeal plus the primary history record.
    pub async fn process_new_history_event(
        &self,
        kind: AppealKind,
        id: i32,
        event: AppealEvent,
        user_id: Option<i32>,
        message: &str,
    ) -> Result<Option<(appeals::Model, appeal_history::Model)>> {
        let txn = self.conn.begin().await?;

        let Some(appeal) = appeals::Entity::find_by_id(id)
            .filter(appeals::Column::Kind.eq(kind))
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        let result = process_event(&txn, appeal, event, user_id, message).await?;

        txn.commit().await?;
        Ok(Some(result))
    }
}

async fn process_event<C: ConnectionTrait>(
    conn: &C,
    appeal: appeals::Model,
    event: AppealEvent,
    user_id: Option<i32>,
    message: &str,
) -> Result<(appeals::Model, appeal_history::Model)> {
    let (mut appeal, record) = append_event(conn, appeal, event, user_id, message).await?;

    if let Some(follow_up) = appeal_follow_up(event) {
        let (assigned_id, chained_user) = match event {
            AppealEvent::Assigned => (user_id, user_id),
            _ => (None, None),
        };

        let mut active: appeals::ActiveModel = appeal.into();
        active.assigned_id = Set(assigned_id);
        appeal = active.update(conn).await?;

        let (chained, _) = append_event(conn, appeal, follow_up, chained_user, "").await?;
        appeal = chained;
    }

    Ok((appeal, record))
}

async fn append_event<C: ConnectionTrait>(
    conn: &C,
    appeal: appeals::Model,
    event: AppealEvent,
    user_id: Option<i32>,
    message: &str,
) -> Result<(appeals::Model, appeal_history::Model)> {
    let record = appeal_history::ActiveModel {
        appeal_id: Set(appeal.id),
        event: Set(event),
        message: Set(message.to_string()),
        status: Set(None),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .context("Failed to append appeal history")?;

    let events: Vec<AppealEvent> = appeal_history::Entity::find()
        .select_only()
        .column(appeal_history::Column::Event)
        .filter(appeal_history::Column::AppealId.eq(appeal.id))
        .order_by_asc(appeal_history::Column::Id)
        .into_tuple()
        .all(conn)
        .await
        .context("Failed to load appeal events")?;

    let status = appeal_status(&events);
    let is_first = events.len() == 1;
    if status == appeal.status && !is_first {
        return Ok((appeal, record));
    }

    let mut active: appeals::ActiveModel = appeal.into();
    active.status = Set(status);
    let appeal = active.update(conn).await?;

    let mut stamped: appeal_history::ActiveModel = record.into();
    stamped.status = Set(Some(status));
    let record = stamped.update(conn).await?;

    Ok((appeal, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    fn help(email: &str) -> NewAppeal {
        NewAppeal {
            kind: AppealKind::Help,
            email: email.to_string(),
            message: "The player does not load".into(),
            title: Some("Player".into()),
            organization: None,
            contact_person: None,
            release_url: None,
            document_url: None,
            explanation: None,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn creation_fires_open() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let repo = store.support();

        let appeal = repo.create(help("a@example.com")).await.unwrap();
        assert_eq!(appeal.status, AppealStatus::Open);

        let history = repo.history(appeal.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event, AppealEvent::Open);
        assert_eq!(history[0].status, Some(AppealStatus::Open));

        assert!(repo.get(AppealKind::Rightholder, appeal.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unassign_without_user_reopens() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let repo = store.support();
        let appeal = repo.create(help("b@example.com")).await.unwrap();

        let (after, record) = repo
            .process_new_history_event(AppealKind::Help, appeal.id, AppealEvent::Unassigned, None, "")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.status, AppealStatus::Open);
        assert_eq!(after.assigned_id, None);
        assert_eq!(record.status, None);

        let events: Vec<_> = repo
            .history(appeal.id)
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.event)
            .collect();
        assert_eq!(
            events,
            vec![AppealEvent::Open, AppealEvent::Unassigned, AppealEvent::Open]
        );
    }
}
