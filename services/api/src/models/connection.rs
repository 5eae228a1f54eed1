//! Connection request model and its status state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a connection request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Ignored,
}

impl RequestStatus {
    /// The full transition table. Pending may move to any resolved status;
    /// resolved statuses are immutable facts.
    pub fn accepts_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Accepted)
                | (RequestStatus::Pending, RequestStatus::Rejected)
                | (RequestStatus::Pending, RequestStatus::Ignored)
        )
    }
}

/// The recipient's decision on a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveDecision {
    Accepted,
    Rejected,
    Ignored,
}

impl ResolveDecision {
    pub fn as_status(self) -> RequestStatus {
        match self {
            ResolveDecision::Accepted => RequestStatus::Accepted,
            ResolveDecision::Rejected => RequestStatus::Rejected,
            ResolveDecision::Ignored => RequestStatus::Ignored,
        }
    }
}

/// Connection request entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectionRequest {
    /// The other user of the pair, from `user_id`'s point of view.
    pub fn counterpart_of(&self, user_id: Uuid) -> Uuid {
        if self.from_user_id == user_id {
            self.to_user_id
        } else {
            self.from_user_id
        }
    }
}

/// New connection request payload; id and timestamps are assigned by the
/// store on insert.
#[derive(Debug, Clone, Copy)]
pub struct NewConnectionRequest {
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RequestStatus; 4] = [
        RequestStatus::Pending,
        RequestStatus::Accepted,
        RequestStatus::Rejected,
        RequestStatus::Ignored,
    ];

    #[test]
    fn only_pending_has_outgoing_transitions() {
        for from in ALL {
            for to in ALL {
                let allowed = from == RequestStatus::Pending && to != RequestStatus::Pending;
                assert_eq!(
                    from.accepts_transition_to(to),
                    allowed,
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn decision_maps_onto_resolved_statuses() {
        assert_eq!(ResolveDecision::Accepted.as_status(), RequestStatus::Accepted);
        assert_eq!(ResolveDecision::Rejected.as_status(), RequestStatus::Rejected);
        assert_eq!(ResolveDecision::Ignored.as_status(), RequestStatus::Ignored);
    }
}
