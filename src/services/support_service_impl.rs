//! `SeaORM` implementation of the `SupportService` trait.

use async_trait::async_trait;
use std::sync::Arc;

use crate::api::types::{
    AppealDto, AppealHistoryDto, BulkAssignDto, BulkAssignRequest, HelpAppealRequest, NoteRequest,
    RightholderAppealRequest,
};
use crate::api::validation::{FieldErrors, INVALID_EMAIL, REQUIRED, is_valid_email};
use crate::config::EmailConfig;
use crate::db::repositories::support::NewAppeal;
use crate::db::repositories::user::User;
use crate::db::{Page, PageRequest, Store};
use crate::domain::history::AppealAssignment;
use crate::domain::{AppealEvent, AppealKind, AppealStatus};
use crate::entities::{appeal_history, appeals};
use crate::services::mail::{Mailer, OutgoingMail};
use crate::services::support_service::{SupportError, SupportService};

const RIGHTHOLDER_SUBJECT: &str = "Rightholder appeal";

impl From<appeal_history::Model> for AppealHistoryDto {
    fn from(record: appeal_history::Model) -> Self {
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

impl From<appeals::Model> for AppealDto {
    fn from(appeal: appeals::Model) -> Self {
        Self {
            id: appeal.id,
            kind: appeal.kind,
            email: appeal.email,
            message: appeal.message,
            title: appeal.title,
            organization: appeal.organization,
            contact_person: appeal.contact_person,
            release_url: appeal.release_url,
            document_url: appeal.document_url,
            explanation: appeal.explanation,
            user: appeal.user_id,
            assigned: appeal.assigned_id,
            status: appeal.status,
            created: appeal.created_at,
            history: None,
        }
    }
}

/// A JSON field may arrive as an already encoded JSON string; decode it
/// when it parses and keep the raw string otherwise.
fn normalize_json(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(raw) => {
            serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
        }
        other => other,
    }
}

fn required_json(
    errors: &mut FieldErrors,
    location: &str,
    value: Option<serde_json::Value>,
) -> Option<serde_json::Value> {
    match value {
        None | Some(serde_json::Value::Null) => {
            errors.push(location, REQUIRED);
            None
        }
        Some(value) => Some(normalize_json(value)),
    }
}

fn validated_email(errors: &mut FieldErrors, value: Option<&str>) -> Option<String> {
    let email = errors.required("email", value)?;
    if is_valid_email(email) {
        Some(email.to_string())
    } else {
        errors.push("email", INVALID_EMAIL);
        None
    }
}

fn assignment(appeal: &appeals::Model) -> AppealAssignment {
    AppealAssignment {
        assigned_id: appeal.assigned_id,
        status: appeal.status,
    }
}

pub struct SeaOrmSupportService {
    store: Store,
    mailer: Arc<dyn Mailer>,
    email: EmailConfig,
}

impl SeaOrmSupportService {
    #[must_use]
    pub fn new(store: Store, mailer: Arc<dyn Mailer>, email: EmailConfig) -> Self {
        Self {
            store,
            mailer,
            email,
        }
    }

    async fn appeal(&self, kind: AppealKind, id: i32) -> Result<appeals::Model, SupportError> {
        self.store
            .support()
            .get(kind, id)
            .await?
            .ok_or(SupportError::NotFound)
    }

    async fn store_appeal(&self, input: NewAppeal, subject: String) -> Result<(), SupportError> {
        let appeal = self.store.support().create(input).await?;

        tracing::info!(
            event = "appeal_created",
            appeal_id = appeal.id,
            kind = %appeal.kind,
            "Support appeal opened"
        );

        if self.email.is_enabled() {
            let mail = OutgoingMail {
                subject,
                body: appeal.message.clone(),
                recipients: vec![appeal.email.clone(), self.email.username.clone()],
            };
            if let Err(e) = self.mailer.send(mail).await {
                tracing::warn!(
                    event = "appeal_mail_failed",
                    appeal_id = appeal.id,
                    error = %e,
                    "Failed to send appeal mail"
                );
            }
        }

        Ok(())
    }

    async fn apply(
        &self,
        kind: AppealKind,
        id: i32,
        event: AppealEvent,
        user: &User,
        message: &str,
    ) -> Result<(appeals::Model, appeal_history::Model), SupportError> {
        let result = self
            .store
            .support()
            .process_new_history_event(kind, id, event, Some(user.id), message)
            .await?
            .ok_or(SupportError::NotFound)?;

        tracing::info!(
            event = "appeal_event",
            appeal_id = id,
            kind = %kind,
            history_event = %event,
            status = %result.0.status,
            user_id = user.id,
            "Appeal history event processed"
        );

        Ok(result)
    }
}

#[async_trait]
impl SupportService for SeaOrmSupportService {
    async fn create_rightholder(
        &self,
        user: Option<&User>,
        request: RightholderAppealRequest,
    ) -> Result<(), SupportError> {
        let mut errors = FieldErrors::new();
        let organization = errors
            .required("organization", request.organization.as_deref())
            .map(str::to_string);
        let contact_person = errors
            .required("contact_person", request.contact_person.as_deref())
            .map(str::to_string);
        let email = validated_email(&mut errors, request.email.as_deref());
        let release_url = required_json(&mut errors, "release_url", request.release_url);
        let document_url = required_json(&mut errors, "document_url", request.document_url);
        let explanation = errors
            .required("explanation", request.explanation.as_deref())
            .map(str::to_string);
        let message = errors
            .required("message", request.message.as_deref())
            .map(str::to_string);
        errors.into_result().map_err(SupportError::Validation)?;

        let (Some(email), Some(message)) = (email, message) else {
            return Err(SupportError::Internal("Validated appeal fields missing".into()));
        };

        let subject = organization
            .as_deref()
            .map_or_else(|| RIGHTHOLDER_SUBJECT.to_string(), |org| format!("{RIGHTHOLDER_SUBJECT}: {org}"));

        self.store_appeal(
            NewAppeal {
                kind: AppealKind::Rightholder,
                email,
                message,
                title: None,
                organization,
                contact_person,
                release_url,
                document_url,
                explanation,
                user_id: user.map(|u| u.id),
            },
            subject,
        )
        .await
    }

    async fn create_help(&self, user: Option<&User>, request: HelpAppealRequest) -> Result<(), SupportError> {
        let mut errors = FieldErrors::new();
        let title = errors.required("title", request.title.as_deref()).map(str::to_string);
        let email = validated_email(&mut errors, request.email.as_deref());
        let message = errors
            .required("message", request.message.as_deref())
            .map(str::to_string);
        errors.into_result().map_err(SupportError::Validation)?;

        let (Some(title), Some(email), Some(message)) = (title, email, message) else {
            return Err(SupportError::Internal("Validated appeal fields missing".into()));
        };

        self.store_appeal(
            NewAppeal {
                kind: AppealKind::Help,
                email,
                message,
                title: Some(title.clone()),
                organization: None,
                contact_person: None,
                release_url: None,
                document_url: None,
                explanation: None,
                user_id: user.map(|u| u.id),
            },
            title,
        )
        .await
    }

    async fn list(
        &self,
        kind: AppealKind,
        status: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<AppealDto>, SupportError> {
        let mut errors = FieldErrors::new();
        let status = errors.choice::<AppealStatus>("status", status);
        errors.into_result().map_err(SupportError::Validation)?;

        let page = self.store.support().list(kind, status, page).await?;
        Ok(page.map(AppealDto::from))
    }

    async fn detail(&self, kind: AppealKind, id: i32) -> Result<AppealDto, SupportError> {
        let appeal = self.appeal(kind, id).await?;
        let history = self.store.support().history(appeal.id).await?;

        let mut dto = AppealDto::from(appeal);
        dto.history = Some(history.into_iter().map(AppealHistoryDto::from).collect());
        Ok(dto)
    }

    async fn assign(&self, kind: AppealKind, id: i32, user: &User) -> Result<AppealDto, SupportError> {
        let appeal = self.appeal(kind, id).await?;
        if !assignment(&appeal).can_be_assigned_to(user.id) {
            return Err(SupportError::Conflict(
                "The appeal is already assigned to you.".into(),
            ));
        }

        let (appeal, _) = self.apply(kind, id, AppealEvent::Assigned, user, "").await?;
        Ok(AppealDto::from(appeal))
    }

    async fn unassign(&self, kind: AppealKind, id: i32, user: &User) -> Result<AppealDto, SupportError> {
        let appeal = self.appeal(kind, id).await?;
        if !assignment(&appeal).can_be_unassigned_by(user.id) {
            return Err(SupportError::Conflict(
                "Only the assignee can unassign an unresolved appeal.".into(),
            ));
        }

        let (appeal, _) = self.apply(kind, id, AppealEvent::Unassigned, user, "").await?;
        Ok(AppealDto::from(appeal))
    }

    async fn resolve(&self, kind: AppealKind, id: i32, user: &User) -> Result<AppealDto, SupportError> {
        let appeal = self.appeal(kind, id).await?;
        if !assignment(&appeal).can_be_resolved(user.id) {
            return Err(SupportError::Conflict(
                "Only the assignee can resolve an unresolved appeal.".into(),
            ));
        }

        let (appeal, _) = self.apply(kind, id, AppealEvent::Resolved, user, "").await?;
        Ok(AppealDto::from(appeal))
    }

    async fn add_note(
        &self,
        kind: AppealKind,
        id: i32,
        user: &User,
        request: NoteRequest,
    ) -> Result<AppealHistoryDto, SupportError> {
        let mut errors = FieldErrors::new();
        let message = errors
            .required("message", request.message.as_deref())
            .map(str::to_string);
        errors.into_result().map_err(SupportError::Validation)?;
        let Some(message) = message else {
            return Err(SupportError::Internal("Validated note missing".into()));
        };

        self.appeal(kind, id).await?;
        let (_, record) = self.apply(kind, id, AppealEvent::Comment, user, &message).await?;
        Ok(AppealHistoryDto::from(record))
    }

    async fn bulk_assign(
        &self,
        kind: AppealKind,
        user: &User,
        request: BulkAssignRequest,
    ) -> Result<BulkAssignDto, SupportError> {
        let total = request.ids.len() as u64;
        let mut assigned = 0;

        for id in request.ids {
            let Some(appeal) = self.store.support().get(kind, id).await? else {
                continue;
            };
            if !assignment(&appeal).can_be_assigned_to(user.id) {
                continue;
            }
            self.apply(kind, id, AppealEvent::Assigned, user, "").await?;
            assigned += 1;
        }

        Ok(BulkAssignDto { assigned, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encoded_json_strings_are_decoded() {
        assert_eq!(
            normalize_json(json!("[\"https://a.example\"]")),
            json!(["https://a.example"])
        );
        assert_eq!(
            normalize_json(json!("https://a.example")),
            json!("https://a.example")
        );
        assert_eq!(normalize_json(json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn null_json_is_required() {
        let mut errors = FieldErrors::new();
        assert!(required_json(&mut errors, "release_url", Some(serde_json::Value::Null)).is_none());
        assert!(required_json(&mut errors, "document_url", None).is_none());
        assert!(required_json(&mut errors, "x", Some(json!([]))).is_some());
        let errors = errors.into_inner();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, REQUIRED);
    }
}
