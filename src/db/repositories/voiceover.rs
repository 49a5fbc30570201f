use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::db::{Page, PageRequest, fetch_page};
use crate::domain::history::voiceover_status;
use crate::domain::{VoiceoverEvent, VoiceoverStatus, VoiceoverType};
use crate::entities::{voiceover_history, voiceovers};

#[derive(Debug, Clone)]
pub struct NewVoiceover {
    pub episode_id: i32,
    pub team_id: i32,
    pub user_id: i32,
    pub voiceover_type: VoiceoverType,
    pub url: String,
}

pub struct VoiceoverRepository {
    conn: DatabaseConnection,
}

impl VoiceoverRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<voiceovers::Model>> {
        voiceovers::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query voiceover")
    }

    pub async fn list(
        &self,
        status: Option<VoiceoverStatus>,
        request: PageRequest,
    ) -> Result<Page<voiceovers::Model>> {
        let mut select = voiceovers::Entity::find().order_by_desc(voiceovers::Column::CreatedAt);
        if let Some(status) = status {
            select = select.filter(voiceovers::Column::Status.eq(status));
        }
        fetch_page(&self.conn, select, request).await
    }

    pub async fn history(&self, voiceover_id: i32) -> Result<Vec<voiceover_history::Model>> {
        voiceover_history::Entity::find()
            .filter(voiceover_history::Column::VoiceoverId.eq(voiceover_id))
            .order_by_asc(voiceover_history::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query voiceover history")
    }

    /// Inserts the voiceover and its CREATED event atomically.
    pub async fn create(&self, input: NewVoiceover) -> Result<(voiceovers::Model, voiceover_history::Model)> {
        let txn = self.conn.begin().await?;
        let now = Utc::now();

        let voiceover = voiceovers::ActiveModel {
            voiceover_type: Set(input.voiceover_type),
            episode_id: Set(input.episode_id),
            team_id: Set(input.team_id),
            user_id: Set(Some(input.user_id)),
            status: Set(VoiceoverStatus::Created),
            url: Set(input.url),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert voiceover")?;

        let (voiceover, record) = process_event(
            &txn,
            voiceover,
            VoiceoverEvent::Created,
            Some(input.user_id),
            "",
        )
        .await?;

        txn.commit().await?;
        Ok((voiceover, record))
    }

    /// Appends an event, re-derives the status and stamps the record when
    /// the status moved. Returns `None` for an unknown voiceover.
    pub async fn process_new_history_event(
        &self,
        voiceover_id: i32,
        event: VoiceoverEvent,
        user_id: Option<i32>,
        message: &str,
    ) -> Result<Option<(voiceovers::Model, voiceover_history::Model)>> {
        let txn = self.conn.begin().await?;

        let Some(voiceover) = voiceovers::Entity::find_by_id(voiceover_id).one(&txn).await? else {
            return Ok(None);
        };

        let result = process_event(&txn, voiceover, event, user_id, message).await?;

        txn.commit().await?;
        Ok(Some(result))
    }
}

async fn process_event<C: ConnectionTrait>(
    conn: &C,
    voiceover: voiceovers::Model,
    event: VoiceoverEvent,
    user_id: Option<i32>,
    message: &str,
) -> Result<(voiceovers::Model, voiceover_history::Model)> {
    let record = voiceover_history::ActiveModel {
        voiceover_id: Set(voiceover.id),
        event: Set(event),
        message: Set(message.to_string()),
        status: Set(None),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .context("Failed to append voiceover history")?;

    let events: Vec<VoiceoverEvent> = voiceover_history::Entity::find()
        .select_only()
        .column(voiceover_history::Column::Event)
        .filter(voiceover_history::Column::VoiceoverId.eq(voiceover.id))
        .order_by_asc(voiceover_history::Column::Id)
        .into_tuple()
        .all(conn)
        .await
        .context("Failed to load voiceover events")?;

    let status = voiceover_status(&events);
    // The first event always stamps the initial status.
    let is_first = events.len() == 1;
    if status == voiceover.status && !is_first {
        return Ok((voiceover, record));
    }

    let mut active: voiceovers::ActiveModel = voiceover.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    let voiceover = active.update(conn).await?;

    let mut stamped: voiceover_history::ActiveModel = record.into();
    stamped.status = Set(Some(status));
    let record = stamped.update(conn).await?;

    Ok((voiceover, record))
}
