use chrono::NaiveDate;
use derive_more::Display;
use serde::Serialize;
use strum_macros::Display as StrumDisplay;

use crate::db::StoreError;
use crate::model::leave_request::{LeaveStatus, LeaveType};

/// The approved leave that blocks a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Display)]
#[display(
    fmt = "{} from the same stream already has approved leave from {} to {}",
    member_name,
    start_date,
    end_date
)]
pub struct Conflict {
    pub request_id: u64,
    pub member_id: u64,
    pub member_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, StrumDisplay)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Transition {
    Approve,
    Reject,
    Override,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Display)]
pub enum LeaveError {
    #[display(fmt = "validation failed: {}", _0)]
    Validation(String),
    #[display(
        fmt = "insufficient {} leave balance: requested {}, available {}, short by {}",
        leave_type,
        requested,
        current,
        shortfall
    )]
    InsufficientBalance {
        leave_type: LeaveType,
        requested: f64,
        current: f64,
        shortfall: f64,
    },
    #[display(fmt = "{}", _0)]
    OverlapConflict(Conflict),
    #[display(fmt = "cannot {} a request that is {}", action, from)]
    InvalidStateTransition {
        from: LeaveStatus,
        action: Transition,
    },
    #[display(fmt = "unauthorized: {}", _0)]
    Unauthorized(String),
    #[display(fmt = "{} {} not found", entity, id)]
    NotFound { entity: &'static str, id: u64 },
    #[display(fmt = "admission for stream {} is busy, retry later", _0)]
    Busy(String),
    #[display(fmt = "{}", _0)]
    Store(StoreError),
}

impl std::error::Error for LeaveError {}

impl From<StoreError> for LeaveError {
    fn from(value: StoreError) -> Self {
        LeaveError::Store(value)
    }
}

impl LeaveError {
    pub fn validation(message: impl Into<String>) -> Self {
        LeaveError::Validation(message.into())
    }

    pub fn member_not_found(id: u64) -> Self {
        LeaveError::NotFound {
            entity: "member",
            id,
        }
    }

    pub fn request_not_found(id: u64) -> Self {
        LeaveError::NotFound {
            entity: "leave request",
            id,
        }
    }

    /// Stable machine-readable name, used in API bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LeaveError::Validation(_) => "validation",
            LeaveError::InsufficientBalance { .. } => "insufficient_balance",
            LeaveError::OverlapConflict(_) => "overlap_conflict",
            LeaveError::InvalidStateTransition { .. } => "invalid_state_transition",
            LeaveError::Unauthorized(_) => "unauthorized",
            LeaveError::NotFound { .. } => "not_found",
            LeaveError::Busy(_) => "busy",
            LeaveError::Store(_) => "store",
        }
    }
}
