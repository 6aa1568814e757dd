use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum LeaveType {
    Annual,
    Sick,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum DayType {
    #[serde(rename = "Full Day")]
    #[strum(serialize = "Full Day")]
    FullDay,
    #[serde(rename = "Half Day")]
    #[strum(serialize = "Half Day")]
    HalfDay,
}

impl Default for DayType {
    fn default() -> Self {
        DayType::FullDay
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "member_id": 12,
    "leave_type": "Annual",
    "day_type": "Full Day",
    "start_date": "2026-02-02",
    "end_date": "2026-02-06",
    "working_days": 5.0,
    "status": "Pending",
    "reason": "Family visit",
    "rejection_reason": null,
    "override_used": false,
    "override_reason": null,
    "approved_by": null,
    "submitted_at": "2026-01-20T09:30:00Z",
    "approved_at": null
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub member_id: u64,
    pub leave_type: LeaveType,
    pub day_type: DayType,
    #[schema(example = "2026-02-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Frozen at submission; later holiday edits never change it
    pub working_days: f64,
    pub status: LeaveStatus,
    pub reason: String,
    pub rejection_reason: Option<String>,
    pub override_used: bool,
    pub override_reason: Option<String>,
    pub approved_by: Option<u64>,
    #[schema(format = "date-time", value_type = String)]
    pub submitted_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub approved_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    /// Inclusive range intersection.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

/// A request ready to be stored. It is always created `Pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub member_id: u64,
    pub leave_type: LeaveType,
    pub day_type: DayType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub working_days: f64,
    pub reason: String,
    pub submitted_at: DateTime<Utc>,
}

impl NewLeaveRequest {
    pub fn into_request(self, id: u64) -> LeaveRequest {
        LeaveRequest {
            id,
            member_id: self.member_id,
            leave_type: self.leave_type,
            day_type: self.day_type,
            start_date: self.start_date,
            end_date: self.end_date,
            working_days: self.working_days,
            status: LeaveStatus::Pending,
            reason: self.reason,
            rejection_reason: None,
            override_used: false,
            override_reason: None,
            approved_by: None,
            submitted_at: self.submitted_at,
            approved_at: None,
        }
    }
}
