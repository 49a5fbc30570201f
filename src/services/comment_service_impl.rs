//! `SeaORM` implementation of the `CommentService` trait.

use async_trait::async_trait;

use crate::api::types::{
    CommentCreateRequest, CommentDto, CommentUpdateRequest, ReactionDto, ReactionRequest,
};
use crate::api::validation::FieldErrors;
use crate::db::repositories::comment::NewComment;
use crate::db::repositories::user::User;
use crate::db::{Page, PageRequest, Store};
use crate::domain::{Choice, CommentTarget, ReactionKind};
use crate::entities::comments;
use crate::services::comment_service::{CommentError, CommentService};

pub struct SeaOrmCommentService {
    store: Store,
}

impl SeaOrmCommentService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn by_urlhash(&self, urlhash: &str) -> Result<comments::Model, CommentError> {
        self.store
            .comments()
            .get_by_urlhash(urlhash)
            .await?
            .ok_or(CommentError::NotFound)
    }

    async fn target_exists(&self, target: CommentTarget, object_id: i32) -> Result<bool, CommentError> {
        Ok(match target {
            CommentTarget::Anime => self.store.catalog().get_anime(object_id).await?.is_some(),
            CommentTarget::Episode => self.store.episodes().get(object_id).await?.is_some(),
        })
    }

    /// Attaches author names, reply flags and reaction totals in batch.
    async fn represent(&self, rows: Vec<comments::Model>) -> Result<Vec<CommentDto>, CommentError> {
        let ids: Vec<i32> = rows.iter().map(|c| c.id).collect();
        let mut user_ids: Vec<i32> = rows.iter().map(|c| c.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let repo = self.store.comments();
        let with_replies = repo.with_replies(&ids).await?;
        let reactions = repo.reaction_counts(&ids).await?;
        let usernames = self.store.users().usernames(&user_ids).await?;

        Ok(rows
            .into_iter()
            .map(|comment| {
                let counts = reactions.get(&comment.id).copied().unwrap_or_default();
                CommentDto {
                    id: comment.id,
                    is_edited: comment.is_edited(),
                    username: usernames.get(&comment.user_id).cloned().unwrap_or_default(),
                    has_reply: with_replies.contains(&comment.id),
                    count_like: counts.like,
                    count_dislike: counts.dislike,
                    urlhash: comment.urlhash,
                    content: comment.content,
                    content_main: comment.content_main,
                    created: comment.created_at,
                    updated: comment.updated_at,
                    is_spoiler: comment.is_spoiler,
                    is_pinned: comment.is_pinned,
                    parent: comment.parent_id,
                }
            })
            .collect())
    }

    async fn represent_one(&self, row: comments::Model) -> Result<CommentDto, CommentError> {
        self.represent(vec![row])
            .await?
            .pop()
            .ok_or_else(|| CommentError::Internal("Comment representation missing".into()))
    }

    async fn represent_page(&self, page: Page<comments::Model>) -> Result<Page<CommentDto>, CommentError> {
        let Page {
            items,
            count,
            page,
            page_size,
        } = page;
        Ok(Page {
            items: self.represent(items).await?,
            count,
            page,
            page_size,
        })
    }
}

#[async_trait]
impl CommentService for SeaOrmCommentService {
    async fn create(&self, user: &User, request: CommentCreateRequest) -> Result<CommentDto, CommentError> {
        let mut errors = FieldErrors::new();
        let content = errors
            .required("content", request.content.as_deref())
            .map(str::to_string);
        let object_id = errors.required_value("object_id", request.object_id);
        let target = match request.content_type.as_deref() {
            None => Some(CommentTarget::Anime),
            value => errors.choice::<CommentTarget>("content_type", value),
        };

        if let (Some(target), Some(object_id)) = (target, object_id)
            && !self.target_exists(target, object_id).await?
        {
            errors.push("object_id", format!("{} not found.", target.label()));
        }

        if let Some(parent_id) = request.parent_id {
            let parent = self.store.comments().get(parent_id).await?;
            match parent {
                None => errors.push("parent_id", "Parent comment not found."),
                Some(parent)
                    if Some(parent.content_type) != target || Some(parent.object_id) != object_id =>
                {
                    errors.push("parent_id", "Parent comment belongs to another object.");
                }
                Some(_) => {}
            }
        }
        errors.into_result().map_err(CommentError::Validation)?;

        let (Some(content), Some(target), Some(object_id)) = (content, target, object_id) else {
            return Err(CommentError::Internal("Validated comment fields missing".into()));
        };

        let created = self
            .store
            .comments()
            .create(NewComment {
                user_id: user.id,
                content,
                parent_id: request.parent_id,
                is_spoiler: request.is_spoiler,
                target,
                object_id,
            })
            .await?;

        tracing::info!(
            event = "comment_created",
            comment_id = created.id,
            urlhash = %created.urlhash,
            content_type = %target,
            object_id,
            "Comment created"
        );

        self.represent_one(created).await
    }

    async fn list_for_anime(&self, anime_id: i32, page: PageRequest) -> Result<Page<CommentDto>, CommentError> {
        if self.store.catalog().get_anime(anime_id).await?.is_none() {
            return Err(CommentError::NotFound);
        }

        let rows = self
            .store
            .comments()
            .list_parents(CommentTarget::Anime, anime_id, page)
            .await?;
        self.represent_page(rows).await
    }

    async fn replies(&self, urlhash: &str, page: PageRequest) -> Result<Page<CommentDto>, CommentError> {
        let parent = self.by_urlhash(urlhash).await?;
        let rows = self.store.comments().list_replies(parent.id, page).await?;
        self.represent_page(rows).await
    }

    async fn update(
        &self,
        user: &User,
        urlhash: &str,
        request: CommentUpdateRequest,
    ) -> Result<CommentDto, CommentError> {
        let comment = self.by_urlhash(urlhash).await?;
        if comment.user_id != user.id {
            return Err(CommentError::Forbidden);
        }

        let mut errors = FieldErrors::new();
        let content = errors
            .required("content", request.content.as_deref())
            .map(str::to_string);
        errors.into_result().map_err(CommentError::Validation)?;
        let Some(content) = content else {
            return Err(CommentError::Internal("Validated content missing".into()));
        };

        let updated = self.store.comments().update_content(comment, &content).await?;
        self.represent_one(updated).await
    }

    async fn delete(&self, user: &User, urlhash: &str) -> Result<(), CommentError> {
        let comment = self.by_urlhash(urlhash).await?;
        if comment.user_id != user.id && !user.is_staff {
            return Err(CommentError::Forbidden);
        }

        let removed = self.store.comments().delete_thread(comment.id).await?;
        tracing::info!(
            event = "comment_deleted",
            comment_id = comment.id,
            removed,
            by_staff = comment.user_id != user.id,
            "Comment thread deleted"
        );
        Ok(())
    }

    async fn react(&self, user_id: i32, comment_id: i32, request: ReactionRequest) -> Result<ReactionDto, CommentError> {
        let mut errors = FieldErrors::new();
        let kind = errors.required_choice::<ReactionKind>("reaction", request.reaction.as_deref());
        errors.into_result().map_err(CommentError::Validation)?;
        let kind = kind.ok_or_else(|| CommentError::Internal("Validated kind missing".into()))?;

        let comment = self
            .store
            .comments()
            .get(comment_id)
            .await?
            .ok_or(CommentError::NotFound)?;

        let action = self
            .store
            .comments()
            .toggle_reaction(user_id, comment.id, kind)
            .await?;
        Ok(ReactionDto { action })
    }

    async fn pin(&self, urlhash: &str, is_pinned: bool) -> Result<CommentDto, CommentError> {
        let comment = self.by_urlhash(urlhash).await?;
        let updated = self.store.comments().set_pinned(comment, is_pinned).await?;
        self.represent_one(updated).await
    }
}
