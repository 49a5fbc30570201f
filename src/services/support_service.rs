//! Domain service for rightholder and help appeals.
//!
//! Appeals are created anonymously or by a signed-in user. Staff members
//! then work through them with assign, unassign, resolve and note events;
//! the status is always derived from the appeal's history log.

use thiserror::Error;

use crate::api::types::{
    AppealDto, AppealHistoryDto, BulkAssignDto, BulkAssignRequest, FieldError, HelpAppealRequest,
    NoteRequest, RightholderAppealRequest,
};
use crate::db::repositories::user::User;
use crate::db::{Page, PageRequest};
use crate::domain::AppealKind;

#[derive(Debug, Error)]
pub enum SupportError {
    #[error("Not found.")]
    NotFound,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// A staff guard refused the transition.
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for SupportError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for SupportError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait SupportService: Send + Sync {
    async fn create_rightholder(
        &self,
        user: Option<&User>,
        request: RightholderAppealRequest,
    ) -> Result<(), SupportError>;

    async fn create_help(&self, user: Option<&User>, request: HelpAppealRequest) -> Result<(), SupportError>;

    async fn list(
        &self,
        kind: AppealKind,
        status: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<AppealDto>, SupportError>;

    async fn detail(&self, kind: AppealKind, id: i32) -> Result<AppealDto, SupportError>;

    async fn assign(&self, kind: AppealKind, id: i32, user: &User) -> Result<AppealDto, SupportError>;

    async fn unassign(&self, kind: AppealKind, id: i32, user: &User) -> Result<AppealDto, SupportError>;

    async fn resolve(&self, kind: AppealKind, id: i32, user: &User) -> Result<AppealDto, SupportError>;

    async fn add_note(
        &self,
        kind: AppealKind,
        id: i32,
        user: &User,
        request: NoteRequest,
    ) -> Result<AppealHistoryDto, SupportError>;

    /// Assigns every listed appeal whose guard allows it.
    async fn bulk_assign(
        &self,
        kind: AppealKind,
        user: &User,
        request: BulkAssignRequest,
    ) -> Result<BulkAssignDto, SupportError>;
}
