//! Domain types that do not depend on storage or transport.

pub mod choices;
pub mod history;
pub mod reaction;

pub use choices::{
    AnimeHistoryEvent, AnimeStatus, AnimeType, AppealEvent, AppealKind, AppealStatus, Choice,
    CommentTarget, DayOfWeek, EpisodeStatus, Rating, ReactionKind, ReleaseSource, Season,
    UserAnimeAction, VoiceoverEvent, VoiceoverStatus, VoiceoverType,
};
pub use reaction::{ReactionAction, ReactionCounts};

/// Normalizes a title into a URL slug.
#[must_use]
pub fn make_slug(title: &str) -> String {
    slug::slugify(title.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_lowercase_and_hyphenated() {
        assert_eq!(
            make_slug("  Fullmetal Alchemist: Brotherhood "),
            "fullmetal-alchemist-brotherhood"
        );
        assert_eq!(make_slug("Attack on Titan!!"), "attack-on-titan");
    }
}
