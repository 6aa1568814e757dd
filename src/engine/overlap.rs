//! One member per stream on approved leave at a time.
//!
//! The first conflicting request found is enough to block; conflicts are not
//! enumerated.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::error::Conflict;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::member::Member;

/// `stream_members` maps member ids to members; requests whose owner is not in
/// it are treated as belonging to another stream.
pub fn find_conflict<'a>(
    member: &Member,
    start: NaiveDate,
    end: NaiveDate,
    exclude_request_id: Option<u64>,
    stream_members: &HashMap<u64, Member>,
    candidates: impl IntoIterator<Item = &'a LeaveRequest>,
) -> Option<Conflict> {
    candidates
        .into_iter()
        .filter(|r| Some(r.id) != exclude_request_id)
        .filter(|r| r.member_id != member.id)
        .filter(|r| r.status == LeaveStatus::Approved)
        .filter(|r| r.overlaps(start, end))
        .find_map(|r| {
            let owner = stream_members.get(&r.member_id)?;
            (owner.stream == member.stream).then(|| Conflict {
                request_id: r.id,
                member_id: owner.id,
                member_name: owner.name.clone(),
                start_date: r.start_date,
                end_date: r.end_date,
            })
        })
}
