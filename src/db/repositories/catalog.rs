use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, ModelTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use std::collections::HashMap;

use crate::db::{Page, PageRequest, fetch_page};
use crate::domain::reaction::{self, ReactionAction, ReactionCounts};
use crate::domain::{
    AnimeHistoryEvent, AnimeStatus, AnimeType, Choice, DayOfWeek, Rating, ReactionKind, Season,
    VoiceoverStatus, make_slug,
};
use crate::entities::{
    anime, anime_genres, anime_history, anime_reactions, anime_related, anime_studios,
    directors, episodes, genres, posters, preview_images, studios, team_members, teams,
    voiceovers,
};

/// Query-string filters of the anime list.
#[derive(Debug, Clone, Default)]
pub struct AnimeFilter {
    pub genre_id: Option<i32>,
    pub studio_id: Option<i32>,
    /// Country of one of the anime's studios
    pub country: Option<String>,
    pub status: Option<AnimeStatus>,
    pub director_id: Option<i32>,
    pub anime_type: Option<AnimeType>,
    /// Team with an approved voiceover on any episode
    pub team_id: Option<i32>,
    pub season: Option<Season>,
    pub year_gte: Option<i32>,
    pub year_lte: Option<i32>,
    /// Case-insensitive title substring
    pub search: Option<String>,
    pub only_top: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnimeOrdering {
    #[default]
    Newest,
    Random,
}

/// Writable anime fields. Link lists replace the existing links.
#[derive(Debug, Clone)]
pub struct AnimeInput {
    pub title: String,
    pub anime_type: AnimeType,
    pub status: AnimeStatus,
    pub rating: Rating,
    pub season: Season,
    pub description: String,
    pub other_title: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub release_day_of_week: Option<DayOfWeek>,
    pub average_time_episode: Option<i32>,
    pub country: Option<String>,
    pub trailer_url: Option<String>,
    pub director_id: Option<i32>,
    pub genre_ids: Vec<i32>,
    pub studio_ids: Vec<i32>,
    pub related_ids: Vec<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopOutcome {
    Changed,
    Unchanged,
    LimitReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimeImage {
    Card,
    Background,
}

/// Lookup tables rendered by the filters endpoint.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub directors: Vec<directors::Model>,
    pub genres: Vec<genres::Model>,
    pub studios: Vec<studios::Model>,
    pub countries: Vec<String>,
    pub teams: Vec<teams::Model>,
}

#[derive(Debug, FromQueryResult)]
struct AnimeCountRow {
    anime_id: i32,
    total: i64,
}

pub struct CatalogRepository {
    conn: DatabaseConnection,
}

impl CatalogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_anime(&self, id: i32) -> Result<Option<anime::Model>> {
        anime::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query anime")
    }

    pub async fn list_anime(
        &self,
        filter: &AnimeFilter,
        ordering: AnimeOrdering,
        request: PageRequest,
    ) -> Result<Page<anime::Model>> {
        let mut select = anime::Entity::find().filter(anime_condition(filter));

        select = match ordering {
            AnimeOrdering::Newest => select
                .order_by_desc(anime::Column::CreatedAt)
                .order_by_desc(anime::Column::Id),
            AnimeOrdering::Random => select.order_by(Expr::cust("RANDOM()"), Order::Asc),
        };

        fetch_page(&self.conn, select, request).await
    }

    pub async fn random_anime(&self) -> Result<Option<anime::Model>> {
        anime::Entity::find()
            .order_by(Expr::cust("RANDOM()"), Order::Asc)
            .one(&self.conn)
            .await
            .context("Failed to pick random anime")
    }

    /// Genres of several anime at once, keyed by anime id.
    pub async fn genres_by_anime(&self, anime_ids: &[i32]) -> Result<HashMap<i32, Vec<genres::Model>>> {
        if anime_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = anime_genres::Entity::find()
            .filter(anime_genres::Column::AnimeId.is_in(anime_ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to query anime genres")?;

        let genre_ids: Vec<i32> = links.iter().map(|l| l.genre_id).collect();
        let genres: HashMap<i32, genres::Model> = genres::Entity::find()
            .filter(genres::Column::Id.is_in(genre_ids))
            .order_by_asc(genres::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to query genres")?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        let mut grouped: HashMap<i32, Vec<genres::Model>> = HashMap::new();
        for link in links {
            if let Some(genre) = genres.get(&link.genre_id) {
                grouped.entry(link.anime_id).or_default().push(genre.clone());
            }
        }
        for list in grouped.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(grouped)
    }

    /// Episode totals of several anime at once, keyed by anime id.
    pub async fn episode_counts(&self, anime_ids: &[i32]) -> Result<HashMap<i32, u64>> {
        if anime_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = episodes::Entity::find()
            .select_only()
            .column(episodes::Column::AnimeId)
            .column_as(Expr::col(episodes::Column::Id).count(), "total")
            .filter(episodes::Column::AnimeId.is_in(anime_ids.iter().copied()))
            .group_by(episodes::Column::AnimeId)
            .into_model::<AnimeCountRow>()
            .all(&self.conn)
            .await
            .context("Failed to count episodes")?;

        Ok(rows
            .into_iter()
            .map(|row| (row.anime_id, u64::try_from(row.total).unwrap_or_default()))
            .collect())
    }

    pub async fn studios_of(&self, anime: &anime::Model) -> Result<Vec<studios::Model>> {
        anime
            .find_related(studios::Entity)
            .order_by_asc(studios::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to query anime studios")
    }

    pub async fn director_of(&self, anime: &anime::Model) -> Result<Option<directors::Model>> {
        let Some(director_id) = anime.director_id else {
            return Ok(None);
        };
        directors::Entity::find_by_id(director_id)
            .one(&self.conn)
            .await
            .context("Failed to query director")
    }

    pub async fn related_of(&self, anime_id: i32) -> Result<Vec<anime::Model>> {
        let related_ids = Query::select()
            .column(anime_related::Column::RelatedId)
            .from(anime_related::Entity)
            .and_where(Expr::col(anime_related::Column::AnimeId).eq(anime_id))
            .to_owned();

        anime::Entity::find()
            .filter(anime::Column::Id.in_subquery(related_ids))
            .order_by_asc(anime::Column::StartDate)
            .all(&self.conn)
            .await
            .context("Failed to query related anime")
    }

    /// Up to `limit` other anime sharing at least one genre.
    pub async fn similar_to(&self, anime_id: i32, limit: u64) -> Result<Vec<anime::Model>> {
        let own_genres = Query::select()
            .column(anime_genres::Column::GenreId)
            .from(anime_genres::Entity)
            .and_where(Expr::col(anime_genres::Column::AnimeId).eq(anime_id))
            .to_owned();

        let sharing = Query::select()
            .column(anime_genres::Column::AnimeId)
            .from(anime_genres::Entity)
            .and_where(Expr::col(anime_genres::Column::GenreId).in_subquery(own_genres))
            .to_owned();

        anime::Entity::find()
            .filter(anime::Column::Id.in_subquery(sharing))
            .filter(anime::Column::Id.ne(anime_id))
            .order_by_desc(anime::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query similar anime")
    }

    pub async fn preview_images_of(&self, anime_id: i32) -> Result<Vec<preview_images::Model>> {
        preview_images::Entity::find()
            .filter(preview_images::Column::AnimeId.eq(anime_id))
            .order_by_asc(preview_images::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query preview images")
    }

    /// Distinct teams that have an approved voiceover for the anime.
    pub async fn approved_teams_of(&self, anime_id: i32) -> Result<Vec<teams::Model>> {
        let team_ids = Query::select()
            .column((voiceovers::Entity, voiceovers::Column::TeamId))
            .from(voiceovers::Entity)
            .inner_join(
                episodes::Entity,
                Expr::col((episodes::Entity, episodes::Column::Id))
                    .equals((voiceovers::Entity, voiceovers::Column::EpisodeId)),
            )
            .and_where(Expr::col((episodes::Entity, episodes::Column::AnimeId)).eq(anime_id))
            .and_where(
                Expr::col((voiceovers::Entity, voiceovers::Column::Status))
                    .eq(VoiceoverStatus::Approved.code()),
            )
            .to_owned();

        teams::Entity::find()
            .filter(teams::Column::Id.in_subquery(team_ids))
            .order_by_asc(teams::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to query voiceover teams")
    }

    pub async fn reaction_counts(&self, anime_id: i32) -> Result<ReactionCounts> {
        let kinds: Vec<ReactionKind> = anime_reactions::Entity::find()
            .select_only()
            .column(anime_reactions::Column::Reaction)
            .filter(anime_reactions::Column::AnimeId.eq(anime_id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query anime reactions")?;

        Ok(ReactionCounts::from_kinds(kinds))
    }

    /// Creates, switches or removes the user's reaction in one transaction.
    pub async fn toggle_reaction(
        &self,
        user_id: i32,
        anime_id: i32,
        desired: ReactionKind,
    ) -> Result<ReactionAction> {
        let txn = self.conn.begin().await?;

        let existing = anime_reactions::Entity::find()
            .filter(anime_reactions::Column::UserId.eq(user_id))
            .filter(anime_reactions::Column::AnimeId.eq(anime_id))
            .one(&txn)
            .await
            .context("Failed to query anime reaction")?;

        let action = reaction::toggle(existing.as_ref().map(|r| r.reaction), desired);

        match existing {
            Some(row) if action == ReactionAction::Delete => {
                row.delete(&txn).await?;
            }
            Some(row) => {
                let mut active: anime_reactions::ActiveModel = row.into();
                active.reaction = Set(desired);
                active.update(&txn).await?;
            }
            None => {
                anime_reactions::ActiveModel {
                    user_id: Set(user_id),
                    anime_id: Set(anime_id),
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

    pub async fn posters(&self) -> Result<Vec<(posters::Model, anime::Model)>> {
        let rows = posters::Entity::find()
            .find_also_related(anime::Entity)
            .order_by_desc(posters::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query posters")?;

        Ok(rows
            .into_iter()
            .filter_map(|(poster, anime)| anime.map(|a| (poster, a)))
            .collect())
    }

    pub async fn filter_options(&self) -> Result<FilterOptions> {
        let directors = directors::Entity::find()
            .order_by_asc(directors::Column::LastName)
            .all(&self.conn)
            .await
            .context("Failed to query directors")?;

        let genres = genres::Entity::find()
            .order_by_asc(genres::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to query genres")?;

        let studios = studios::Entity::find()
            .order_by_asc(studios::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to query studios")?;

        let countries: Vec<String> = studios::Entity::find()
            .select_only()
            .column(studios::Column::Country)
            .filter(studios::Column::Country.is_not_null())
            .distinct()
            .order_by_asc(studios::Column::Country)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query countries")?;

        let teams = teams::Entity::find()
            .order_by_asc(teams::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to query teams")?;

        Ok(FilterOptions {
            directors,
            genres,
            studios,
            countries,
            teams,
        })
    }

    pub async fn get_director(&self, id: i32) -> Result<Option<(directors::Model, Vec<anime::Model>)>> {
        let Some(director) = directors::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query director")?
        else {
            return Ok(None);
        };

        let anime = director
            .find_related(anime::Entity)
            .order_by_asc(anime::Column::StartDate)
            .all(&self.conn)
            .await
            .context("Failed to query director anime")?;

        Ok(Some((director, anime)))
    }

    pub async fn get_studio(&self, id: i32) -> Result<Option<(studios::Model, Vec<anime::Model>)>> {
        let Some(studio) = studios::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query studio")?
        else {
            return Ok(None);
        };

        let anime = studio
            .find_related(anime::Entity)
            .order_by_asc(anime::Column::StartDate)
            .all(&self.conn)
            .await
            .context("Failed to query studio anime")?;

        Ok(Some((studio, anime)))
    }

    /// Marks the anime as TOP unless the section is full. Appends history.
    pub async fn set_top(
        &self,
        anime_id: i32,
        user_id: Option<i32>,
        limit: u64,
    ) -> Result<Option<TopOutcome>> {
        let txn = self.conn.begin().await?;

        let Some(model) = anime::Entity::find_by_id(anime_id).one(&txn).await? else {
            return Ok(None);
        };
        if model.is_top {
            return Ok(Some(TopOutcome::Unchanged));
        }

        let current = anime::Entity::find()
            .filter(anime::Column::IsTop.eq(true))
            .count(&txn)
            .await?;
        if current >= limit {
            return Ok(Some(TopOutcome::LimitReached));
        }

        let mut active: anime::ActiveModel = model.into();
        active.is_top = Set(true);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        append_history(&txn, anime_id, AnimeHistoryEvent::SetTop, user_id).await?;

        txn.commit().await?;
        Ok(Some(TopOutcome::Changed))
    }

    pub async fn reset_top(&self, anime_id: i32, user_id: Option<i32>) -> Result<Option<TopOutcome>> {
        let txn = self.conn.begin().await?;

        let Some(model) = anime::Entity::find_by_id(anime_id).one(&txn).await? else {
            return Ok(None);
        };
        if !model.is_top {
            return Ok(Some(TopOutcome::Unchanged));
        }

        let mut active: anime::ActiveModel = model.into();
        active.is_top = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        append_history(&txn, anime_id, AnimeHistoryEvent::ResetTop, user_id).await?;

        txn.commit().await?;
        Ok(Some(TopOutcome::Changed))
    }

    pub async fn history_of(&self, anime_id: i32) -> Result<Vec<anime_history::Model>> {
        anime_history::Entity::find()
            .filter(anime_history::Column::AnimeId.eq(anime_id))
            .order_by_asc(anime_history::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query anime history")
    }

    pub async fn create_anime(&self, input: AnimeInput) -> Result<anime::Model> {
        let txn = self.conn.begin().await?;
        let now = Utc::now();

        let mut active = anime::ActiveModel {
            is_top: Set(false),
            card_image: Set(None),
            background_image: Set(None),
            created_at: Set(now),
            ..Default::default()
        };
        apply_input(&mut active, &input);
        let model = active.insert(&txn).await.context("Failed to insert anime")?;

        replace_links(&txn, model.id, &input).await?;

        txn.commit().await?;
        Ok(model)
    }

    pub async fn update_anime(&self, id: i32, input: AnimeInput) -> Result<Option<anime::Model>> {
        let txn = self.conn.begin().await?;

        let Some(existing) = anime::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut active: anime::ActiveModel = existing.into();
        apply_input(&mut active, &input);
        let model = active.update(&txn).await.context("Failed to update anime")?;

        replace_links(&txn, id, &input).await?;

        txn.commit().await?;
        Ok(Some(model))
    }

    pub async fn delete_anime(&self, id: i32) -> Result<bool> {
        let result = anime::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete anime")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn set_image(&self, id: i32, kind: AnimeImage, key: &str) -> Result<()> {
        let mut active = anime::ActiveModel {
            id: Set(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        match kind {
            AnimeImage::Card => active.card_image = Set(Some(key.to_string())),
            AnimeImage::Background => active.background_image = Set(Some(key.to_string())),
        }
        active.update(&self.conn).await.context("Failed to update anime image")?;
        Ok(())
    }

    pub async fn add_preview_image(&self, anime_id: i32, key: &str) -> Result<preview_images::Model> {
        preview_images::ActiveModel {
            anime_id: Set(anime_id),
            image: Set(Some(key.to_string())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert preview image")
    }

    /// One poster per anime: an existing poster is overwritten.
    pub async fn upsert_poster(
        &self,
        anime_id: i32,
        image: Option<&str>,
        description: &str,
    ) -> Result<posters::Model> {
        let existing = posters::Entity::find()
            .filter(posters::Column::AnimeId.eq(anime_id))
            .one(&self.conn)
            .await
            .context("Failed to query poster")?;

        if let Some(poster) = existing {
            let mut active: posters::ActiveModel = poster.into();
            if let Some(image) = image {
                active.image = Set(Some(image.to_string()));
            }
            active.description = Set(description.to_string());
            return active.update(&self.conn).await.context("Failed to update poster");
        }

        posters::ActiveModel {
            anime_id: Set(anime_id),
            image: Set(image.map(ToString::to_string)),
            description: Set(description.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert poster")
    }

    pub async fn create_genre(&self, name: &str) -> Result<genres::Model> {
        genres::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert genre")
    }

    pub async fn genre_exists(&self, name: &str) -> Result<bool> {
        let count = genres::Entity::find()
            .filter(genres::Column::Name.eq(name))
            .count(&self.conn)
            .await
            .context("Failed to check genre")?;
        Ok(count > 0)
    }

    pub async fn create_studio(
        &self,
        name: &str,
        description: &str,
        country: Option<&str>,
    ) -> Result<studios::Model> {
        studios::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            country: Set(country.map(str::to_uppercase)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert studio")
    }

    pub async fn studio_exists(&self, name: &str) -> Result<bool> {
        let count = studios::Entity::find()
            .filter(studios::Column::Name.eq(name))
            .count(&self.conn)
            .await
            .context("Failed to check studio")?;
        Ok(count > 0)
    }

    pub async fn create_director(
        &self,
        first_name: &str,
        last_name: &str,
        url: Option<&str>,
    ) -> Result<directors::Model> {
        directors::ActiveModel {
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            url: Set(url.map(ToString::to_string)),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert director")
    }

    pub async fn create_team(&self, name: &str) -> Result<teams::Model> {
        teams::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert team")
    }

    pub async fn team_exists(&self, name: &str) -> Result<bool> {
        let count = teams::Entity::find()
            .filter(teams::Column::Name.eq(name))
            .count(&self.conn)
            .await
            .context("Failed to check team")?;
        Ok(count > 0)
    }

    pub async fn get_team(&self, id: i32) -> Result<Option<teams::Model>> {
        teams::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query team")
    }

    pub async fn add_team_member(&self, team_id: i32, user_id: i32) -> Result<()> {
        if self.is_team_member(team_id, user_id).await? {
            return Ok(());
        }

        team_members::ActiveModel {
            team_id: Set(team_id),
            user_id: Set(user_id),
        }
        .insert(&self.conn)
        .await
        .context("Failed to add team member")?;

        Ok(())
    }

    pub async fn is_team_member(&self, team_id: i32, user_id: i32) -> Result<bool> {
        let count = team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team_id))
            .filter(team_members::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to check team membership")?;
        Ok(count > 0)
    }

    /// Ids that exist among the given ones, for link validation.
    pub async fn existing_ids(&self, kind: LinkKind, ids: &[i32]) -> Result<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.iter().copied();

        let found = match kind {
            LinkKind::Genre => {
                genres::Entity::find()
                    .select_only()
                    .column(genres::Column::Id)
                    .filter(genres::Column::Id.is_in(ids))
                    .into_tuple()
                    .all(&self.conn)
                    .await
            }
            LinkKind::Studio => {
                studios::Entity::find()
                    .select_only()
                    .column(studios::Column::Id)
                    .filter(studios::Column::Id.is_in(ids))
                    .into_tuple()
                    .all(&self.conn)
                    .await
            }
            LinkKind::Director => {
                directors::Entity::find()
                    .select_only()
                    .column(directors::Column::Id)
                    .filter(directors::Column::Id.is_in(ids))
                    .into_tuple()
                    .all(&self.conn)
                    .await
            }
            LinkKind::Anime => {
                anime::Entity::find()
                    .select_only()
                    .column(anime::Column::Id)
                    .filter(anime::Column::Id.is_in(ids))
                    .into_tuple()
                    .all(&self.conn)
                    .await
            }
        };

        found.context("Failed to validate linked ids")
    }

    /// Deletes the whole catalog; episodes, arches and posters cascade.
    pub async fn remove_all(&self) -> Result<u64> {
        let txn = self.conn.begin().await?;

        let removed = anime::Entity::delete_many().exec(&txn).await?.rows_affected;
        directors::Entity::delete_many().exec(&txn).await?;
        studios::Entity::delete_many().exec(&txn).await?;
        genres::Entity::delete_many().exec(&txn).await?;
        episodes::Entity::delete_many().exec(&txn).await?;
        posters::Entity::delete_many().exec(&txn).await?;

        txn.commit().await?;
        Ok(removed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Genre,
    Studio,
    Director,
    Anime,
}

fn anime_condition(filter: &AnimeFilter) -> Condition {
    let mut cond = Condition::all();

    if let Some(genre_id) = filter.genre_id {
        cond = cond.add(
            anime::Column::Id.in_subquery(
                Query::select()
                    .column(anime_genres::Column::AnimeId)
                    .from(anime_genres::Entity)
                    .and_where(Expr::col(anime_genres::Column::GenreId).eq(genre_id))
                    .to_owned(),
            ),
        );
    }

    if let Some(studio_id) = filter.studio_id {
        cond = cond.add(
            anime::Column::Id.in_subquery(
                Query::select()
                    .column(anime_studios::Column::AnimeId)
                    .from(anime_studios::Entity)
                    .and_where(Expr::col(anime_studios::Column::StudioId).eq(studio_id))
                    .to_owned(),
            ),
        );
    }

    if let Some(country) = &filter.country {
        cond = cond.add(
            anime::Column::Id.in_subquery(
                Query::select()
                    .column((anime_studios::Entity, anime_studios::Column::AnimeId))
                    .from(anime_studios::Entity)
                    .inner_join(
                        studios::Entity,
                        Expr::col((studios::Entity, studios::Column::Id))
                            .equals((anime_studios::Entity, anime_studios::Column::StudioId)),
                    )
                    .and_where(
                        Expr::col((studios::Entity, studios::Column::Country))
                            .eq(country.to_uppercase()),
                    )
                    .to_owned(),
            ),
        );
    }

    if let Some(team_id) = filter.team_id {
        cond = cond.add(
            anime::Column::Id.in_subquery(
                Query::select()
                    .column((episodes::Entity, episodes::Column::AnimeId))
                    .from(episodes::Entity)
                    .inner_join(
                        voiceovers::Entity,
                        Expr::col((voiceovers::Entity, voiceovers::Column::EpisodeId))
                            .equals((episodes::Entity, episodes::Column::Id)),
                    )
                    .and_where(Expr::col((voiceovers::Entity, voiceovers::Column::TeamId)).eq(team_id))
                    .and_where(
                        Expr::col((voiceovers::Entity, voiceovers::Column::Status))
                            .eq(VoiceoverStatus::Approved.code()),
                    )
                    .to_owned(),
            ),
        );
    }

    if let Some(status) = filter.status {
        cond = cond.add(anime::Column::Status.eq(status));
    }
    if let Some(director_id) = filter.director_id {
        cond = cond.add(anime::Column::DirectorId.eq(director_id));
    }
    if let Some(anime_type) = filter.anime_type {
        cond = cond.add(anime::Column::AnimeType.eq(anime_type));
    }
    if let Some(season) = filter.season {
        cond = cond.add(anime::Column::Season.eq(season));
    }
    if let Some(date) = filter.year_gte.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)) {
        cond = cond.add(anime::Column::StartDate.gte(date));
    }
    if let Some(date) = filter.year_lte.and_then(|y| NaiveDate::from_ymd_opt(y, 12, 31)) {
        cond = cond.add(anime::Column::StartDate.lte(date));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        cond = cond.add(anime::Column::Title.contains(search));
    }
    if filter.only_top {
        cond = cond.add(anime::Column::IsTop.eq(true));
    }

    cond
}

fn apply_input(active: &mut anime::ActiveModel, input: &AnimeInput) {
    active.title = Set(input.title.clone());
    active.slug = Set(make_slug(&input.title));
    active.anime_type = Set(input.anime_type);
    active.status = Set(input.status);
    active.rating = Set(input.rating);
    active.season = Set(input.season);
    active.description = Set(input.description.clone());
    active.other_title = Set(input.other_title.clone());
    active.start_date = Set(input.start_date);
    active.end_date = Set(input.end_date);
    active.release_day_of_week = Set(input.release_day_of_week);
    active.average_time_episode = Set(input.average_time_episode);
    active.country = Set(input.country.as_deref().map(str::to_uppercase));
    active.trailer_url = Set(input.trailer_url.clone());
    active.director_id = Set(input.director_id);
    active.updated_at = Set(Utc::now());
}

async fn replace_links<C: ConnectionTrait>(conn: &C, anime_id: i32, input: &AnimeInput) -> Result<()> {
    anime_genres::Entity::delete_many()
        .filter(anime_genres::Column::AnimeId.eq(anime_id))
        .exec(conn)
        .await?;
    let genre_links: Vec<anime_genres::ActiveModel> = dedup(&input.genre_ids)
        .into_iter()
        .map(|genre_id| anime_genres::ActiveModel {
            anime_id: Set(anime_id),
            genre_id: Set(genre_id),
        })
        .collect();
    if !genre_links.is_empty() {
        anime_genres::Entity::insert_many(genre_links).exec(conn).await?;
    }

    anime_studios::Entity::delete_many()
        .filter(anime_studios::Column::AnimeId.eq(anime_id))
        .exec(conn)
        .await?;
    let studio_links: Vec<anime_studios::ActiveModel> = dedup(&input.studio_ids)
        .into_iter()
        .map(|studio_id| anime_studios::ActiveModel {
            anime_id: Set(anime_id),
            studio_id: Set(studio_id),
        })
        .collect();
    if !studio_links.is_empty() {
        anime_studios::Entity::insert_many(studio_links).exec(conn).await?;
    }

    anime_related::Entity::delete_many()
        .filter(
            Condition::any()
                .add(anime_related::Column::AnimeId.eq(anime_id))
                .add(anime_related::Column::RelatedId.eq(anime_id)),
        )
        .exec(conn)
        .await?;
    let related_links: Vec<anime_related::ActiveModel> = dedup(&input.related_ids)
        .into_iter()
        .filter(|&related_id| related_id != anime_id)
        .flat_map(|related_id| {
            [
                anime_related::ActiveModel {
                    anime_id: Set(anime_id),
                    related_id: Set(related_id),
                },
                anime_related::ActiveModel {
                    anime_id: Set(related_id),
                    related_id: Set(anime_id),
                },
            ]
        })
        .collect();
    if !related_links.is_empty() {
        anime_related::Entity::insert_many(related_links).exec(conn).await?;
    }

    Ok(())
}

async fn append_history<C: ConnectionTrait>(
    conn: &C,
    anime_id: i32,
    event: AnimeHistoryEvent,
    user_id: Option<i32>,
) -> Result<()> {
    anime_history::ActiveModel {
        anime_id: Set(anime_id),
        event: Set(event),
        message: Set(event.label().to_string()),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .context("Failed to append anime history")?;

    Ok(())
}

fn dedup(ids: &[i32]) -> Vec<i32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::Store;

    pub(crate) fn sample_input(title: &str) -> AnimeInput {
        AnimeInput {
            title: title.to_string(),
            anime_type: AnimeType::Anime,
            status: AnimeStatus::CameOut,
            rating: Rating::Pg13,
            season: Season::Spring,
            description: String::new(),
            other_title: None,
            start_date: NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
            end_date: None,
            release_day_of_week: None,
            average_time_episode: Some(24),
            country: Some("jp".into()),
            trailer_url: None,
            director_id: None,
            genre_ids: Vec::new(),
            studio_ids: Vec::new(),
            related_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn top_limit_and_noops() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let repo = store.catalog();

        let first = repo.create_anime(sample_input("First")).await.unwrap();
        let second = repo.create_anime(sample_input("Second")).await.unwrap();

        assert_eq!(repo.set_top(first.id, None, 1).await.unwrap(), Some(TopOutcome::Changed));
        assert_eq!(repo.set_top(first.id, None, 1).await.unwrap(), Some(TopOutcome::Unchanged));
        assert_eq!(
            repo.set_top(second.id, None, 1).await.unwrap(),
            Some(TopOutcome::LimitReached)
        );
        assert_eq!(repo.reset_top(second.id, None).await.unwrap(), Some(TopOutcome::Unchanged));
        assert_eq!(repo.reset_top(first.id, None).await.unwrap(), Some(TopOutcome::Changed));

        let history = repo.history_of(first.id).await.unwrap();
        let events: Vec<_> = history.iter().map(|h| h.event).collect();
        assert_eq!(events, vec![AnimeHistoryEvent::SetTop, AnimeHistoryEvent::ResetTop]);
    }

    #[tokio::test]
    async fn slug_follows_title_and_related_is_symmetric() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let repo = store.catalog();

        let base = repo.create_anime(sample_input("Mob Psycho 100")).await.unwrap();
        assert_eq!(base.slug, "mob-psycho-100");

        let mut input = sample_input("Mob Psycho 100 II");
        input.related_ids = vec![base.id];
        let sequel = repo.create_anime(input).await.unwrap();
        assert_eq!(sequel.slug, "mob-psycho-100-ii");

        let related = repo.related_of(base.id).await.unwrap();
        assert_eq!(related.iter().map(|a| a.id).collect::<Vec<_>>(), vec![sequel.id]);
    }

    #[tokio::test]
    async fn filters_by_genre_and_year() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let repo = store.catalog();
        let drama = repo.create_genre("Drama").await.unwrap();

        let mut input = sample_input("Tagged");
        input.genre_ids = vec![drama.id];
        let tagged = repo.create_anime(input).await.unwrap();
        let mut old = sample_input("Old");
        old.start_date = NaiveDate::from_ymd_opt(1998, 4, 3).unwrap();
        repo.create_anime(old).await.unwrap();

        let by_genre = AnimeFilter {
            genre_id: Some(drama.id),
            ..AnimeFilter::default()
        };
        let page = repo
            .list_anime(&by_genre, AnimeOrdering::Newest, PageRequest::new(1, 12))
            .await
            .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.items[0].id, tagged.id);

        let modern = AnimeFilter {
            year_gte: Some(2000),
            ..AnimeFilter::default()
        };
        let page = repo
            .list_anime(&modern, AnimeOrdering::Random, PageRequest::new(1, 12))
            .await
            .unwrap();
        assert_eq!(page.count, 1);
    }

    #[tokio::test]
    async fn reaction_toggle_updates_in_place() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let user = store
            .users()
            .create(
                crate::db::repositories::user::NewUser {
                    username: "reactor".into(),
                    email: "r@example.com".into(),
                    password: "pw".into(),
                    ..Default::default()
                },
                &crate::config::SecurityConfig {
                    argon2_memory_cost_kib: 1024,
                    argon2_time_cost: 1,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let repo = store.catalog();
        let anime = repo.create_anime(sample_input("Toggle")).await.unwrap();

        let like = repo.toggle_reaction(user.id, anime.id, ReactionKind::Like).await.unwrap();
        assert_eq!(like, ReactionAction::New);
        let change = repo
            .toggle_reaction(user.id, anime.id, ReactionKind::Dislike)
            .await
            .unwrap();
        assert_eq!(change, ReactionAction::Change);
        let counts = repo.reaction_counts(anime.id).await.unwrap();
        assert_eq!((counts.like, counts.dislike), (0, 1));

        let delete = repo
            .toggle_reaction(user.id, anime.id, ReactionKind::Dislike)
            .await
            .unwrap();
        assert_eq!(delete, ReactionAction::Delete);
        assert_eq!(repo.reaction_counts(anime.id).await.unwrap(), ReactionCounts::default());
    }
}
