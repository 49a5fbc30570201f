//! Status derivation for append-only history logs.
//!
//! Voiceovers and appeals never store a status that was set directly: the
//! current value is recomputed from the full event list every time a new
//! event is appended.

use super::choices::{AppealEvent, AppealStatus, VoiceoverEvent, VoiceoverStatus};

/// Derives a voiceover status. Precedence is DECLINED, APPROVED, WAIT, CREATED.
#[must_use]
pub fn voiceover_status(events: &[VoiceoverEvent]) -> VoiceoverStatus {
    let has = |event: VoiceoverEvent| events.contains(&event);

    if has(VoiceoverEvent::Declined) {
        VoiceoverStatus::Declined
    } else if has(VoiceoverEvent::Approved) {
        VoiceoverStatus::Approved
    } else if has(VoiceoverEvent::Wait) {
        VoiceoverStatus::Wait
    } else {
        VoiceoverStatus::Created
    }
}

/// Derives an appeal status from events in chronological order.
///
/// Any RESOLVED event wins; otherwise the most recent OPEN or IN_PROGRESS
/// event decides; an empty log counts as OPEN.
#[must_use]
pub fn appeal_status(events: &[AppealEvent]) -> AppealStatus {
    if events.contains(&AppealEvent::Resolved) {
        return AppealStatus::Resolved;
    }

    events
        .iter()
        .rev()
        .find_map(|event| match event {
            AppealEvent::Open => Some(AppealStatus::Open),
            AppealEvent::InProgress => Some(AppealStatus::InProgress),
            _ => None,
        })
        .unwrap_or(AppealStatus::Open)
}

/// Event chained automatically after an assignment change.
#[must_use]
pub const fn appeal_follow_up(event: AppealEvent) -> Option<AppealEvent> {
    match event {
        AppealEvent::Assigned => Some(AppealEvent::InProgress),
        AppealEvent::Unassigned => Some(AppealEvent::Open),
        _ => None,
    }
}

/// Assignment snapshot of an appeal used by the staff guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppealAssignment {
    pub assigned_id: Option<i32>,
    pub status: AppealStatus,
}

impl AppealAssignment {
    #[must_use]
    pub fn can_be_resolved(&self, user_id: i32) -> bool {
        self.assigned_id == Some(user_id) && self.status != AppealStatus::Resolved
    }

    #[must_use]
    pub fn can_be_assigned_to(&self, user_id: i32) -> bool {
        self.assigned_id != Some(user_id) || self.status == AppealStatus::Open
    }

    #[must_use]
    pub fn can_be_unassigned_by(&self, user_id: i32) -> bool {
        self.assigned_id == Some(user_id) && self.status != AppealStatus::Resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voiceover_declined_beats_everything() {
        let events = [
            VoiceoverEvent::Created,
            VoiceoverEvent::Approved,
            VoiceoverEvent::Declined,
            VoiceoverEvent::Wait,
        ];
        assert_eq!(voiceover_status(&events), VoiceoverStatus::Declined);
    }

    #[test]
    fn voiceover_approved_over_wait() {
        let events = [
            VoiceoverEvent::Created,
            VoiceoverEvent::Wait,
            VoiceoverEvent::Approved,
            VoiceoverEvent::Comment,
        ];
        assert_eq!(voiceover_status(&events), VoiceoverStatus::Approved);
    }

    #[test]
    fn voiceover_comments_do_not_move_status() {
        let events = [VoiceoverEvent::Created, VoiceoverEvent::Comment];
        assert_eq!(voiceover_status(&events), VoiceoverStatus::Created);
        assert_eq!(voiceover_status(&[]), VoiceoverStatus::Created);
    }

    #[test]
    fn appeal_resolved_is_terminal() {
        let events = [
            AppealEvent::Open,
            AppealEvent::Resolved,
            AppealEvent::Open,
        ];
        assert_eq!(appeal_status(&events), AppealStatus::Resolved);
    }

    #[test]
    fn appeal_latest_open_or_progress_wins() {
        let assigned = [
            AppealEvent::Open,
            AppealEvent::Assigned,
            AppealEvent::InProgress,
            AppealEvent::Comment,
        ];
        assert_eq!(appeal_status(&assigned), AppealStatus::InProgress);

        let reopened = [
            AppealEvent::Open,
            AppealEvent::InProgress,
            AppealEvent::Unassigned,
            AppealEvent::Open,
        ];
        assert_eq!(appeal_status(&reopened), AppealStatus::Open);
        assert_eq!(appeal_status(&[]), AppealStatus::Open);
    }

    #[test]
    fn follow_up_events() {
        assert_eq!(
            appeal_follow_up(AppealEvent::Assigned),
            Some(AppealEvent::InProgress)
        );
        assert_eq!(
            appeal_follow_up(AppealEvent::Unassigned),
            Some(AppealEvent::Open)
        );
        assert_eq!(appeal_follow_up(AppealEvent::Comment), None);
    }

    #[test]
    fn guards() {
        let open = AppealAssignment {
            assigned_id: None,
            status: AppealStatus::Open,
        };
        assert!(open.can_be_assigned_to(1));
        assert!(!open.can_be_resolved(1));
        assert!(!open.can_be_unassigned_by(1));

        let mine = AppealAssignment {
            assigned_id: Some(1),
            status: AppealStatus::InProgress,
        };
        assert!(mine.can_be_resolved(1));
        assert!(mine.can_be_unassigned_by(1));
        assert!(!mine.can_be_assigned_to(1));
        assert!(mine.can_be_assigned_to(2));
        assert!(!mine.can_be_resolved(2));

        let done = AppealAssignment {
            assigned_id: Some(1),
            status: AppealStatus::Resolved,
        };
        assert!(!done.can_be_resolved(1));
        assert!(!done.can_be_unassigned_by(1));
    }
}
