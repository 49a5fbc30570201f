use serde::{Deserialize, Serialize};

use super::choices::ReactionKind;

/// Outcome of a reaction toggle, returned to clients as `{"action": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReactionAction {
    New,
    Change,
    Delete,
}

/// Decides what a toggle does given the reaction the user already left.
#[must_use]
pub fn toggle(existing: Option<ReactionKind>, desired: ReactionKind) -> ReactionAction {
    match existing {
        Some(current) if current == desired => ReactionAction::Delete,
        Some(_) => ReactionAction::Change,
        None => ReactionAction::New,
    }
}

/// Like/dislike totals for a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReactionCounts {
    #[serde(rename = "LIKE")]
    pub like: u64,
    #[serde(rename = "DISLIKE")]
    pub dislike: u64,
}

impl ReactionCounts {
    #[must_use]
    pub fn from_kinds(kinds: impl IntoIterator<Item = ReactionKind>) -> Self {
        kinds.into_iter().fold(Self::default(), |mut acc, kind| {
            match kind {
                ReactionKind::Like => acc.like += 1,
                ReactionKind::Dislike => acc.dislike += 1,
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_cases() {
        assert_eq!(toggle(None, ReactionKind::Like), ReactionAction::New);
        assert_eq!(
            toggle(Some(ReactionKind::Like), ReactionKind::Like),
            ReactionAction::Delete
        );
        assert_eq!(
            toggle(Some(ReactionKind::Dislike), ReactionKind::Like),
            ReactionAction::Change
        );
    }

    #[test]
    fn counts_and_wire_names() {
        let counts = ReactionCounts::from_kinds([
            ReactionKind::Like,
            ReactionKind::Dislike,
            ReactionKind::Like,
        ]);
        assert_eq!(counts.like, 2);
        assert_eq!(counts.dislike, 1);

        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json["LIKE"], 2);
        assert_eq!(
            serde_json::to_value(ReactionAction::Change).unwrap(),
            "CHANGE"
        );
    }
}
