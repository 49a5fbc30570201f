use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};

use crate::db::{Page, PageRequest, fetch_page};
use crate::domain::reaction::{self, ReactionAction, ReactionCounts};
use crate::domain::{CommentTarget, ReactionKind};
use crate::entities::{comment_reactions, comments, episodes};

const URLHASH_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: i32,
    pub content: String,
    pub parent_id: Option<i32>,
    pub is_spoiler: bool,
    pub target: CommentTarget,
    pub object_id: i32,
}

#[derive(Debug, FromQueryResult)]
struct ReactionRow {
    comment_id: i32,
    reaction: ReactionKind,
}

pub struct CommentRepository {
    conn: DatabaseConnection,
}

impl CommentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<comments::Model>> {
        comments::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query comment")
    }

    pub async fn get_by_urlhash(&self, urlhash: &str) -> Result<Option<comments::Model>> {
        comments::Entity::find()
            .filter(comments::Column::Urlhash.eq(urlhash))
            .one(&self.conn)
            .await
            .context("Failed to query comment by urlhash")
    }

    async fn urlhash_taken(&self, urlhash: &str) -> Result<bool> {
        let count = comments::Entity::find()
            .filter(comments::Column::Urlhash.eq(urlhash))
            .count(&self.conn)
            .await
            .context("Failed to check urlhash")?;
        Ok(count > 0)
    }

    /// Inserts the comment under a fresh urlhash, regenerating on collision.
    pub async fn create(&self, input: NewComment) -> Result<comments::Model> {
        let mut urlhash = generate_urlhash();
        while self.urlhash_taken(&urlhash).await? {
            urlhash = generate_urlhash();
        }

        let now = Utc::now();
        comments::ActiveModel {
            user_id: Set(input.user_id),
            content_main: Set(input.content.clone()),
            content: Set(input.content),
            parent_id: Set(input.parent_id),
            is_spoiler: Set(input.is_spoiler),
            is_pinned: Set(false),
            urlhash: Set(urlhash),
            content_type: Set(input.target),
            object_id: Set(input.object_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert comment")
    }

    /// Top-level comments of a target, pinned first then newest.
    pub async fn list_parents(
        &self,
        target: CommentTarget,
        object_id: i32,
        request: PageRequest,
    ) -> Result<Page<comments::Model>> {
        let select = comments::Entity::find()
            .filter(comments::Column::ContentType.eq(target))
            .filter(comments::Column::ObjectId.eq(object_id))
            .filter(comments::Column::ParentId.is_null())
            .order_by_desc(comments::Column::IsPinned)
            .order_by_desc(comments::Column::CreatedAt)
            .order_by_desc(comments::Column::Id);

        fetch_page(&self.conn, select, request).await
    }

    /// Direct replies, oldest first.
    pub async fn list_replies(&self, parent_id: i32, request: PageRequest) -> Result<Page<comments::Model>> {
        let select = comments::Entity::find()
            .filter(comments::Column::ParentId.eq(parent_id))
            .order_by_asc(comments::Column::CreatedAt)
            .order_by_asc(comments::Column::Id);

        fetch_page(&self.conn, select, request).await
    }

    pub async fn update_content(&self, comment: comments::Model, content: &str) -> Result<comments::Model> {
        let mut active: comments::ActiveModel = comment.into();
        active.content = Set(content.to_string());
        active.updated_at = Set(Utc::now());
        active.update(&self.conn).await.context("Failed to update comment")
    }

    pub async fn set_pinned(&self, comment: comments::Model, is_pinned: bool) -> Result<comments::Model> {
        let mut active: comments::ActiveModel = comment.into();
        active.is_pinned = Set(is_pinned);
        active.update(&self.conn).await.context("Failed to pin comment")
    }

    /// Deletes the comment and every reply below it.
    pub async fn delete_thread(&self, id: i32) -> Result<u64> {
        let txn = self.conn.begin().await?;

        let mut levels = vec![vec![id]];
        loop {
            let frontier = levels.last().cloned().unwrap_or_default();
            let children: Vec<i32> = comments::Entity::find()
                .select_only()
                .column(comments::Column::Id)
                .filter(comments::Column::ParentId.is_in(frontier))
                .into_tuple()
                .all(&txn)
                .await?;
            if children.is_empty() {
                break;
            }
            levels.push(children);
        }

        // Deepest replies first; the parent FK cascades on delete.
        let mut removed = 0;
        for level in levels.into_iter().rev() {
            removed += comments::Entity::delete_many()
                .filter(comments::Column::Id.is_in(level))
                .exec(&txn)
                .await?
                .rows_affected;
        }

        txn.commit().await?;
        Ok(removed)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let result = comments::Entity::delete_many()
            .exec(&self.conn)
            .await
            .context("Failed to delete comments")?;
        Ok(result.rows_affected)
    }

    /// Which of the given comments have at least one reply.
    pub async fn with_replies(&self, ids: &[i32]) -> Result<HashSet<i32>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let parents: Vec<Option<i32>> = comments::Entity::find()
            .select_only()
            .column(comments::Column::ParentId)
            .filter(comments::Column::ParentId.is_in(ids.iter().copied()))
            .distinct()
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query replies")?;

        Ok(parents.into_iter().flatten().collect())
    }

    pub async fn reaction_counts(&self, ids: &[i32]) -> Result<HashMap<i32, ReactionCounts>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = comment_reactions::Entity::find()
            .select_only()
            .column(comment_reactions::Column::CommentId)
            .column(comment_reactions::Column::Reaction)
            .filter(comment_reactions::Column::CommentId.is_in(ids.iter().copied()))
            .into_model::<ReactionRow>()
            .all(&self.conn)
            .await
            .context("Failed to query comment reactions")?;

        let mut grouped: HashMap<i32, Vec<ReactionKind>> = HashMap::new();
        for row in rows {
            grouped.entry(row.comment_id).or_default().push(row.reaction);
        }

        Ok(grouped
            .into_iter()
            .map(|(id, kinds)| (id, ReactionCounts::from_kinds(kinds)))
            .collect())
    }

    pub async fn toggle_reaction(
        &self,
        user_id: i32,
        comment_id: i32,
        desired: ReactionKind,
    ) -> Result<ReactionAction> {
        let txn = self.conn.begin().await?;

        let existing = comment_reactions::Entity::find()
            .filter(comment_reactions::Column::UserId.eq(user_id))
            .filter(comment_reactions::Column::CommentId.eq(comment_id))
            .one(&txn)
            .await
            .context("Failed to query comment reaction")?;

        let action = reaction::toggle(existing.as_ref().map(|r| r.reaction), desired);

        match existing {
            Some(row) if action == ReactionAction::Delete => {
                row.delete(&txn).await?;
            }
            Some(row) => {
                let mut active: comment_reactions::ActiveModel = row.into();
                active.reaction = Set(desired);
                active.update(&txn).await?;
            }
            None => {
                comment_reactions::ActiveModel {
                    user_id: Set(user_id),
                    comment_id: Set(comment_id),
                    reaction: Set(desired),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }

        txn.commit().await?;
        Ok(action)
    }

    /// Distinct anime the user commented on, directly or through an episode.
    pub async fn commented_anime_count(&self, user_id: i32) -> Result<u64> {
        let targets: Vec<(CommentTarget, i32)> = comments::Entity::find()
            .select_only()
            .column(comments::Column::ContentType)
            .column(comments::Column::ObjectId)
            .filter(comments::Column::UserId.eq(user_id))
            .distinct()
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query commented targets")?;

        let mut anime_ids: HashSet<i32> = HashSet::new();
        let mut episode_ids = Vec::new();
        for (target, object_id) in targets {
            match target {
                CommentTarget::Anime => {
                    anime_ids.insert(object_id);
                }
                CommentTarget::Episode => episode_ids.push(object_id),
            }
        }

        if !episode_ids.is_empty() {
            let via_episodes: Vec<i32> = episodes::Entity::find()
                .select_only()
                .column(episodes::Column::AnimeId)
                .filter(episodes::Column::Id.is_in(episode_ids))
                .into_tuple()
                .all(&self.conn)
                .await
                .context("Failed to resolve episode comments")?;
            anime_ids.extend(via_episodes);
        }

        Ok(anime_ids.len() as u64)
    }
}

/// Eight random lowercase ASCII letters.
#[must_use]
pub fn generate_urlhash() -> String {
    let mut rng = rand::rng();
    (0..URLHASH_LEN)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::db::Store;
    use crate::db::repositories::catalog::tests::sample_input;
    use crate::db::repositories::user::NewUser;

    #[test]
    fn urlhash_shape() {
        let hash = generate_urlhash();
        assert_eq!(hash.len(), 8);
        assert!(hash.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn thread_delete_cascades() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let user = store
            .users()
            .create(
                NewUser {
                    username: "writer".into(),
                    email: "w@example.com".into(),
                    password: "pw".into(),
                    ..Default::default()
                },
                &SecurityConfig {
                    argon2_memory_cost_kib: 1024,
                    argon2_time_cost: 1,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let anime = store.catalog().create_anime(sample_input("Threads")).await.unwrap();
        let repo = store.comments();

        let comment = |parent_id| NewComment {
            user_id: user.id,
            content: "text".into(),
            parent_id,
            is_spoiler: false,
            target: CommentTarget::Anime,
            object_id: anime.id,
        };

        let root = repo.create(comment(None)).await.unwrap();
        let reply = repo.create(comment(Some(root.id))).await.unwrap();
        repo.create(comment(Some(reply.id))).await.unwrap();

        let flags = repo.with_replies(&[root.id, reply.id]).await.unwrap();
        assert!(flags.contains(&root.id) && flags.contains(&reply.id));

        assert_eq!(repo.commented_anime_count(user.id).await.unwrap(), 1);

        assert_eq!(repo.delete_thread(root.id).await.unwrap(), 3);
        assert!(repo.get(reply.id).await.unwrap().is_none());
    }
}
