//! Choice columns shared by entities, request validation and display labels.
//!
//! Every choice is stored as its upper-case code and carries a human label
//! used by the catalog filters and detail payloads.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Common surface of all choice enums.
pub trait Choice: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn code(self) -> &'static str;

    fn label(self) -> &'static str;

    /// Parses a stored or submitted code, case-sensitively.
    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == value)
    }

    /// `{code: label}` pairs in declaration order.
    fn labels() -> Vec<(&'static str, &'static str)> {
        Self::ALL.iter().map(|c| (c.code(), c.label())).collect()
    }
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $code:tt, $label:tt;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
        #[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
        pub enum $name {
            $(
                #[sea_orm(string_value = $code)]
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl Choice for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

choice_enum! {
    AnimeType {
        Anime => "ANIME", "Anime";
        Film => "FILM", "Film";
    }
}

choice_enum! {
    AnimeStatus {
        CameOut => "CAME_OUT", "Released";
        ComesOut => "COMES_OUT", "Airing";
        Announced => "ANNOUNCED", "Announced";
    }
}

choice_enum! {
    Rating {
        G => "G", "All ages";
        Pg => "PG", "Children";
        Pg13 => "PG13", "Teens 13 or older";
        R => "R", "17+ (violence and profanity)";
        Rplus => "RPLUS", "Mild nudity";
        Rx => "RX", "Hentai";
    }
}

choice_enum! {
    Season {
        Winter => "WINTER", "Winter";
        Spring => "SPRING", "Spring";
        Summer => "SUMMER", "Summer";
        Fall => "FALL", "Fall";
    }
}

choice_enum! {
    DayOfWeek {
        Monday => "MONDAY", "Monday";
        Tuesday => "TUESDAY", "Tuesday";
        Wednesday => "WEDNESDAY", "Wednesday";
        Thursday => "THURSDAY", "Thursday";
        Friday => "FRIDAY", "Friday";
        Saturday => "SATURDAY", "Saturday";
        Sunday => "SUNDAY", "Sunday";
    }
}

choice_enum! {
    EpisodeStatus {
        Announced => "ANNOUNCED", "Announced";
        Released => "RELEASED", "Released";
    }
}

choice_enum! {
    VoiceoverType {
        Voiceover => "VOICEOVER", "Voiceover";
        Subtitles => "SUBTITLES", "Subtitles";
    }
}

choice_enum! {
    VoiceoverStatus {
        Created => "CREATED", "Created";
        Wait => "WAIT", "Waiting for review";
        Declined => "DECLINED", "Declined";
        Approved => "APPROVED", "Approved";
    }
}

choice_enum! {
    VoiceoverEvent {
        Created => "CREATED", "Created";
        Wait => "WAIT", "Sent for review";
        Approved => "APPROVED", "Approved";
        Declined => "DECLINED", "Declined";
        Comment => "COMMENT", "Comment";
    }
}

choice_enum! {
    ReactionKind {
        Like => "LIKE", "Like";
        Dislike => "DISLIKE", "Dislike";
    }
}

choice_enum! {
    UserAnimeAction {
        Favorite => "FAVORITE", "Favorite";
        Viewed => "VIEWED", "Viewed";
        Dropped => "DROPPED", "Dropped";
        Planned => "PLANNED", "Planned";
        Watching => "WATCHING", "Watching";
    }
}

choice_enum! {
    AppealKind {
        Rightholder => "RIGHTHOLDER", "Rightholder";
        Help => "HELP", "Help";
    }
}

choice_enum! {
    AppealEvent {
        Assigned => "ASSIGNED", "Assigned";
        Unassigned => "UNASSIGNED", "Unassigned";
        InProgress => "IN_PROGRESS", "In progress";
        Resolved => "RESOLVED", "Resolved";
        Open => "OPEN", "Opened";
        Comment => "COMMENT", "Comment";
    }
}

choice_enum! {
    AppealStatus {
        Open => "OPEN", "Open";
        InProgress => "IN_PROGRESS", "In progress";
        Resolved => "RESOLVED", "Resolved";
    }
}

choice_enum! {
    AnimeHistoryEvent {
        SetTop => "SET_TOP", "Added to TOP";
        ResetTop => "RESET_TOP", "Removed from TOP";
    }
}

choice_enum! {
    /// Target of a polymorphic comment.
    CommentTarget {
        Anime => "anime", "Anime";
        Episode => "episode", "Episode";
    }
}

choice_enum! {
    ReleaseSource {
        MyAnimeList => "MYANIMELIST", "MyAnimeList";
    }
}

impl AppealKind {
    /// Path segment used by the staff endpoints.
    #[must_use]
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "rightholder" => Some(Self::Rightholder),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

impl Season {
    /// Lowercase name accepted by the MyAnimeList seasonal endpoint.
    #[must_use]
    pub const fn as_myanimelist(self) -> &'static str {
        match self {
            Self::Winter => "winter",
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Fall => "fall",
        }
    }
}

impl Default for AnimeStatus {
    fn default() -> Self {
        Self::Announced
    }
}

impl Default for Season {
    fn default() -> Self {
        Self::Summer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_matches_codes_only() {
        assert_eq!(Rating::parse("PG13"), Some(Rating::Pg13));
        assert_eq!(Rating::parse("pg13"), None);
        assert_eq!(AnimeStatus::parse("CAME_OUT"), Some(AnimeStatus::CameOut));
        assert_eq!(CommentTarget::parse("episode"), Some(CommentTarget::Episode));
    }

    #[test]
    fn serde_uses_codes() {
        let json = serde_json::to_string(&AppealStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");

        let parsed: UserAnimeAction = serde_json::from_str("\"WATCHING\"").unwrap();
        assert_eq!(parsed, UserAnimeAction::Watching);
    }

    #[test]
    fn labels_keep_declaration_order() {
        let labels = Season::labels();
        assert_eq!(labels.first(), Some(&("WINTER", "Winter")));
        assert_eq!(labels.len(), 4);
    }
}
