use derive_more::Display;
use serde::Serialize;
use tracing::{info, warn};

use super::error::LeaveError;
use crate::model::leave_request::LeaveRequest;

/// Decision outcomes the engine publishes after each operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DecisionEvent {
    Submitted {
        request: LeaveRequest,
    },
    /// A submission refused for balance or overlap reasons.
    Blocked {
        member_id: u64,
        #[serde(serialize_with = "serialize_display")]
        cause: LeaveError,
    },
    Approved {
        request: LeaveRequest,
        remaining_balance: f64,
    },
    Overridden {
        request: LeaveRequest,
        remaining_balance: f64,
    },
    Rejected {
        request: LeaveRequest,
    },
    /// Emitted after the record is deleted.
    Cancelled {
        request: LeaveRequest,
    },
}

fn serialize_display<S: serde::Serializer>(
    value: &LeaveError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl DecisionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DecisionEvent::Submitted { .. } => "submitted",
            DecisionEvent::Blocked { .. } => "blocked",
            DecisionEvent::Approved { .. } => "approved",
            DecisionEvent::Overridden { .. } => "overridden",
            DecisionEvent::Rejected { .. } => "rejected",
            DecisionEvent::Cancelled { .. } => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Display)]
#[display(fmt = "subscriber failed: {}", _0)]
pub struct SubscriberError(pub String);

impl std::error::Error for SubscriberError {}

/// Outbound hook for notification collaborators. A failing subscriber is
/// logged and otherwise ignored; it never changes a decision.
pub trait DecisionSubscriber: Send + Sync {
    fn publish(&self, event: &DecisionEvent) -> Result<(), SubscriberError>;
}

/// Default subscriber: one structured log line per decision.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSubscriber;

impl DecisionSubscriber for TracingSubscriber {
    fn publish(&self, event: &DecisionEvent) -> Result<(), SubscriberError> {
        match event {
            DecisionEvent::Submitted { request } => info!(
                request_id = request.id,
                member_id = request.member_id,
                leave_type = %request.leave_type,
                days = request.working_days,
                "Leave request submitted"
            ),
            DecisionEvent::Blocked { member_id, cause } => warn!(
                member_id,
                kind = cause.kind(),
                cause = %cause,
                "Leave request blocked"
            ),
            DecisionEvent::Approved {
                request,
                remaining_balance,
            } => info!(
                request_id = request.id,
                approver_id = request.approved_by,
                remaining_balance,
                "Leave request approved"
            ),
            DecisionEvent::Overridden {
                request,
                remaining_balance,
            } => warn!(
                request_id = request.id,
                approver_id = request.approved_by,
                reason = request.override_reason.as_deref().unwrap_or_default(),
                remaining_balance,
                "Leave request approved with manager override"
            ),
            DecisionEvent::Rejected { request } => info!(
                request_id = request.id,
                reason = request.rejection_reason.as_deref().unwrap_or_default(),
                "Leave request rejected"
            ),
            DecisionEvent::Cancelled { request } => info!(
                request_id = request.id,
                member_id = request.member_id,
                "Leave request cancelled"
            ),
        }
        Ok(())
    }
}
