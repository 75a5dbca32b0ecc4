//! Participants and their questionnaire answers
//!
//! A participant's status is driven from outside the graph (recruiter
//! callbacks). The graph only consults it when a node is created for them.

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::details::Details;
use crate::entity::{Lifecycle, impl_entity};
use crate::ids::{ParticipantId, QuestionId};

/// Session status of a participant
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    #[display("working")]
    Working,
    #[display("submitted")]
    Submitted,
    #[display("returned")]
    Returned,
    #[display("abandoned")]
    Abandoned,
    #[display("approved")]
    Approved,
    #[display("rejected")]
    Rejected,
    #[display("bad_data")]
    BadData,
    #[display("did_not_attend")]
    DidNotAttend,
    #[display("missing_notification")]
    MissingNotification,
    #[display("replaced")]
    Replaced,
}

impl ParticipantStatus {
    /// Whether `next` is reachable from this status in one step
    pub fn can_transition_to(&self, next: ParticipantStatus) -> bool {
        use ParticipantStatus::*;

        if next == Replaced {
            return true;
        }
        match self {
            Working => matches!(next, Submitted | Returned | Abandoned | MissingNotification),
            Submitted => matches!(
                next,
                Approved | Rejected | BadData | DidNotAttend | MissingNotification
            ),
            _ => false,
        }
    }
}

/// Recruitment identifiers for a new participant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub worker_id: String,
    pub assignment_id: String,
    pub hit_id: String,
    /// Deployment mode, e.g. "debug" or "live"
    pub mode: String,
}

impl ParticipantInfo {
    pub fn new(
        worker_id: impl Into<String>,
        assignment_id: impl Into<String>,
        hit_id: impl Into<String>,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            assignment_id: assignment_id.into(),
            hit_id: hit_id.into(),
            mode: "debug".to_string(),
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }
}

/// One human or bot session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub worker_id: String,
    pub assignment_id: String,
    /// `worker_id:assignment_id`
    pub unique_id: String,
    pub hit_id: String,
    pub mode: String,
    pub status: ParticipantStatus,
    pub end_time: Option<DateTime<Utc>>,
    pub base_pay: Option<f64>,
    pub bonus: Option<f64>,
    pub lifecycle: Lifecycle,
    pub details: Details,
}

impl_entity!(Participant);

impl Participant {
    pub(crate) fn new(id: ParticipantId, info: ParticipantInfo, lifecycle: Lifecycle) -> Self {
        Self {
            id,
            unique_id: format!("{}:{}", info.worker_id, info.assignment_id),
            worker_id: info.worker_id,
            assignment_id: info.assignment_id,
            hit_id: info.hit_id,
            mode: info.mode,
            status: ParticipantStatus::Working,
            end_time: None,
            base_pay: None,
            bonus: None,
            lifecycle,
            details: Details::new(),
        }
    }

    pub fn is_working(&self) -> bool {
        self.status == ParticipantStatus::Working
    }
}

/// A participant's answer to one questionnaire item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub participant_id: ParticipantId,
    pub number: u32,
    pub question: String,
    pub response: String,
    pub lifecycle: Lifecycle,
    pub details: Details,
}

impl_entity!(Question);
