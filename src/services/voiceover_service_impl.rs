//! `SeaORM` implementation of the `VoiceoverService` trait.

use async_trait::async_trait;

use crate::api::types::{HistoryEventRequest, VoiceoverCreateRequest, VoiceoverDto, VoiceoverHistoryDto};
use crate::api::validation::FieldErrors;
use crate::db::repositories::user::User;
use crate::db::repositories::voiceover::NewVoiceover;
use crate::db::{Page, PageRequest, Store};
use crate::domain::{VoiceoverEvent, VoiceoverStatus, VoiceoverType};
use crate::entities::{voiceover_history, voiceovers};
use crate::services::voiceover_service::{VoiceoverError, VoiceoverService};

impl From<voiceover_history::Model> for VoiceoverHistoryDto {
    fn from(record: voiceover_history::Model) -> Self {
        Self {
            id: record.id,
            event: record.event,
            message: record.message,
            status: record.status,
            user_id: record.user_id,
            created: record.created_at,
        }
    }
}

impl From<voiceovers::Model> for VoiceoverDto {
    fn from(voiceover: voiceovers::Model) -> Self {
        Self {
            id: voiceover.id,
            voiceover_type: voiceover.voiceover_type,
            episode: voiceover.episode_id,
            team: voiceover.team_id,
            user: voiceover.user_id,
            status: voiceover.status,
            url: voiceover.url,
            created: voiceover.created_at,
            updated: voiceover.updated_at,
            history: None,
        }
    }
}

/// The submitter may not approve their own work.
#[must_use]
pub fn can_be_approved_by(voiceover: &voiceovers::Model, user_id: i32) -> bool {
    voiceover.user_id != Some(user_id)
}

pub struct SeaOrmVoiceoverService {
    store: Store,
}

impl SeaOrmVoiceoverService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn with_history(&self, voiceover: voiceovers::Model) -> Result<VoiceoverDto, VoiceoverError> {
        let history = self.store.voiceovers().history(voiceover.id).await?;
        let mut dto = VoiceoverDto::from(voiceover);
        dto.history = Some(history.into_iter().map(VoiceoverHistoryDto::from).collect());
        Ok(dto)
    }
}

#[async_trait]
impl VoiceoverService for SeaOrmVoiceoverService {
    async fn create(&self, user: &User, request: VoiceoverCreateRequest) -> Result<VoiceoverDto, VoiceoverError> {
        let mut errors = FieldErrors::new();
        let episode_id = errors.required_value("episode", request.episode);
        let team_id = errors.required_value("team", request.team);
        let voiceover_type =
            errors.required_choice::<VoiceoverType>("type", request.voiceover_type.as_deref());
        let url = errors.required("url", request.url.as_deref()).map(str::to_string);

        if let Some(id) = episode_id
            && self.store.episodes().get(id).await?.is_none()
        {
            errors.push("episode", format!("Invalid pk \"{id}\" - object does not exist."));
        }
        if let Some(id) = team_id
            && self.store.catalog().get_team(id).await?.is_none()
        {
            errors.push("team", format!("Invalid pk \"{id}\" - object does not exist."));
        }
        errors.into_result().map_err(VoiceoverError::Validation)?;

        let (Some(episode_id), Some(team_id), Some(voiceover_type), Some(url)) =
            (episode_id, team_id, voiceover_type, url)
        else {
            return Err(VoiceoverError::Internal("Validated voiceover fields missing".into()));
        };

        if !self.store.catalog().is_team_member(team_id, user.id).await? {
            return Err(VoiceoverError::Forbidden(
                "You are not a member of this voiceover team.".into(),
            ));
        }

        let (voiceover, _) = self
            .store
            .voiceovers()
            .create(NewVoiceover {
                episode_id,
                team_id,
                user_id: user.id,
                voiceover_type,
                url,
            })
            .await?;

        tracing::info!(
            event = "voiceover_created",
            voiceover_id = voiceover.id,
            episode_id,
            team_id,
            user_id = user.id,
            "Voiceover submitted"
        );

        Ok(VoiceoverDto::from(voiceover))
    }

    async fn get(&self, user: &User, id: i32) -> Result<VoiceoverDto, VoiceoverError> {
        let voiceover = self
            .store
            .voiceovers()
            .get(id)
            .await?
            .ok_or(VoiceoverError::NotFound)?;

        if voiceover.user_id != Some(user.id) && !user.is_staff {
            return Err(VoiceoverError::NotFound);
        }

        self.with_history(voiceover).await
    }

    async fn list(&self, status: Option<&str>, page: PageRequest) -> Result<Page<VoiceoverDto>, VoiceoverError> {
        let mut errors = FieldErrors::new();
        let status = errors.choice::<VoiceoverStatus>("status", status);
        errors.into_result().map_err(VoiceoverError::Validation)?;

        let page = self.store.voiceovers().list(status, page).await?;
        Ok(page.map(VoiceoverDto::from))
    }

    async fn add_event(
        &self,
        user: &User,
        id: i32,
        request: HistoryEventRequest,
    ) -> Result<VoiceoverHistoryDto, VoiceoverError> {
        let mut errors = FieldErrors::new();
        let event = errors.required_choice::<VoiceoverEvent>("event", request.event.as_deref());
        errors.into_result().map_err(VoiceoverError::Validation)?;
        let event = event.ok_or_else(|| VoiceoverError::Internal("Validated event missing".into()))?;

        let voiceover = self
            .store
            .voiceovers()
            .get(id)
            .await?
            .ok_or(VoiceoverError::NotFound)?;

        if event == VoiceoverEvent::Approved && !can_be_approved_by(&voiceover, user.id) {
            return Err(VoiceoverError::Forbidden(
                "You cannot approve your own voiceover.".into(),
            ));
        }

        let (voiceover, record) = self
            .store
            .voiceovers()
            .process_new_history_event(voiceover.id, event, Some(user.id), &request.message)
            .await?
            .ok_or(VoiceoverError::NotFound)?;

        tracing::info!(
            event = "voiceover_event",
            voiceover_id = voiceover.id,
            history_event = %event,
            status = %voiceover.status,
            user_id = user.id,
            "Voiceover history event processed"
        );

        Ok(VoiceoverHistoryDto::from(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn submitter_cannot_approve() {
        let voiceover = voiceovers::Model {
            id: 1,
            voiceover_type: VoiceoverType::Voiceover,
            episode_id: 1,
            team_id: 1,
            user_id: Some(7),
            status: VoiceoverStatus::Wait,
            url: "https://video.example/1".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!can_be_approved_by(&voiceover, 7));
        assert!(can_be_approved_by(&voiceover, 8));

        let orphan = voiceovers::Model {
            user_id: None,
            ..voiceover
        };
        assert!(can_be_approved_by(&orphan, 7));
    }
}
