//! Status transitions of a single leave request.
//!
//! `Pending` is the only state that accepts a transition. `Approved` and
//! `Rejected` are terminal; cancelling removes the record instead of
//! recording a status. Every method validates before it mutates, so an `Err`
//! leaves the request exactly as it was.

use chrono::{DateTime, Utc};

use super::error::{LeaveError, Transition};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl LeaveRequest {
    pub fn ensure_pending(&self, action: Transition) -> Result<(), LeaveError> {
        match self.status {
            LeaveStatus::Pending => Ok(()),
            from => Err(LeaveError::InvalidStateTransition { from, action }),
        }
    }

    pub fn approve(&mut self, approver_id: u64, at: DateTime<Utc>) -> Result<(), LeaveError> {
        self.ensure_pending(Transition::Approve)?;
        self.status = LeaveStatus::Approved;
        self.approved_by = Some(approver_id);
        self.approved_at = Some(at);
        Ok(())
    }

    /// The reason is optional; blank text is stored as none.
    pub fn reject(&mut self, reason: Option<&str>) -> Result<(), LeaveError> {
        self.ensure_pending(Transition::Reject)?;
        self.status = LeaveStatus::Rejected;
        self.rejection_reason = reason.and_then(non_empty);
        Ok(())
    }

    /// Approval that skips balance and overlap checks. Needs a non-blank
    /// justification.
    pub fn override_approve(
        &mut self,
        approver_id: u64,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<(), LeaveError> {
        let reason = non_empty(reason)
            .ok_or_else(|| LeaveError::validation("override reason is required"))?;
        self.ensure_pending(Transition::Override)?;
        self.status = LeaveStatus::Approved;
        self.override_used = true;
        self.override_reason = Some(reason);
        self.approved_by = Some(approver_id);
        self.approved_at = Some(at);
        Ok(())
    }

    /// Only the owner may cancel, and only while pending. The caller deletes
    /// the record afterwards.
    pub fn ensure_cancellable(&self, member_id: u64) -> Result<(), LeaveError> {
        if self.member_id != member_id {
            return Err(LeaveError::Unauthorized(
                "only the requester may cancel a leave request".to_string(),
            ));
        }
        self.ensure_pending(Transition::Cancel)
    }
}
