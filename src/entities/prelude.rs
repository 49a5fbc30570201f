//! Entity aliases used by migrations and queries.

pub use super::anime::Entity as Anime;
pub use super::anime_genres::Entity as AnimeGenres;
pub use super::anime_history::Entity as AnimeHistory;
pub use super::anime_reactions::Entity as AnimeReactions;
pub use super::anime_related::Entity as AnimeRelated;
pub use super::anime_studios::Entity as AnimeStudios;
pub use super::appeal_history::Entity as AppealHistory;
pub use super::appeals::Entity as Appeals;
pub use super::arches::Entity as Arches;
pub use super::comment_reactions::Entity as CommentReactions;
pub use super::comments::Entity as Comments;
pub use super::directors::Entity as Directors;
pub use super::episodes::Entity as Episodes;
pub use super::genres::Entity as Genres;
pub use super::myanimelist_tokens::Entity as MyanimelistTokens;
pub use super::posters::Entity as Posters;
pub use super::preview_images::Entity as PreviewImages;
pub use super::queue_messages::Entity as QueueMessages;
pub use super::scheduled_tasks::Entity as ScheduledTasks;
pub use super::studios::Entity as Studios;
pub use super::team_members::Entity as TeamMembers;
pub use super::teams::Entity as Teams;
pub use super::token_blacklist::Entity as TokenBlacklist;
pub use super::update_releases::Entity as UpdateReleases;
pub use super::user_anime::Entity as UserAnime;
pub use super::user_episode_viewed::Entity as UserEpisodeViewed;
pub use super::users::Entity as Users;
pub use super::voiceover_history::Entity as VoiceoverHistory;
pub use super::voiceovers::Entity as Voiceovers;
