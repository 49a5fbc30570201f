pub mod prelude;

pub mod anime;
pub mod anime_genres;
pub mod anime_history;
pub mod anime_reactions;
pub mod anime_related;
pub mod anime_studios;
pub mod appeal_history;
pub mod appeals;
pub mod arches;
pub mod comment_reactions;
pub mod comments;
pub mod directors;
pub mod episodes;
pub mod genres;
pub mod myanimelist_tokens;
pub mod posters;
pub mod preview_images;
pub mod queue_messages;
pub mod scheduled_tasks;
pub mod studios;
pub mod team_members;
pub mod teams;
pub mod token_blacklist;
pub mod update_releases;
pub mod user_anime;
pub mod user_episode_viewed;
pub mod users;
pub mod voiceover_history;
pub mod voiceovers;
