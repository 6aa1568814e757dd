use serde::Serialize;
use utoipa::ToSchema;

use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::member::Member;

/// Outcome of a sufficiency check, kept for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalanceCheck {
    pub sufficient: bool,
    pub current: f64,
    pub remaining_after: f64,
}

impl BalanceCheck {
    pub fn shortfall(&self) -> f64 {
        if self.remaining_after < 0.0 {
            -self.remaining_after
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct MemberBalances {
    pub member_id: u64,
    #[schema(example = 17.0)]
    pub annual: f64,
    #[schema(example = 10.0)]
    pub sick: f64,
}

/// Days already committed: only approved requests of this member and type.
/// Pending and rejected requests never count.
pub fn used_days<'a>(
    member: &Member,
    leave_type: LeaveType,
    history: impl IntoIterator<Item = &'a LeaveRequest>,
) -> f64 {
    history
        .into_iter()
        .filter(|r| {
            r.member_id == member.id
                && r.leave_type == leave_type
                && r.status == LeaveStatus::Approved
        })
        .map(|r| r.working_days)
        .sum()
}

pub fn balance<'a>(
    member: &Member,
    leave_type: LeaveType,
    history: impl IntoIterator<Item = &'a LeaveRequest>,
) -> f64 {
    f64::from(member.entitlement(leave_type)) - used_days(member, leave_type, history)
}

pub fn check_sufficient<'a>(
    member: &Member,
    leave_type: LeaveType,
    requested: f64,
    history: impl IntoIterator<Item = &'a LeaveRequest>,
) -> BalanceCheck {
    let current = balance(member, leave_type, history);
    let remaining_after = current - requested;
    BalanceCheck {
        sufficient: remaining_after >= 0.0,
        current,
        remaining_after,
    }
}
