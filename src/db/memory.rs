use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::model::holiday::{DEFAULT_HOLIDAY_COLOR, HolidayEntry, NewHoliday};
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest};
use crate::model::member::{
    DEFAULT_ANNUAL_ENTITLEMENT, DEFAULT_SICK_ENTITLEMENT, Location, Member, NewMember,
    normalize_email,
};

use super::{LeaveStore, MemberFilter, RequestFilter, StoreError};

#[derive(Default)]
struct State {
    members: BTreeMap<u64, Member>,
    holidays: BTreeMap<u64, HolidayEntry>,
    requests: BTreeMap<u64, LeaveRequest>,
    next_member_id: u64,
    next_holiday_id: u64,
    next_request_id: u64,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// Process-local store. Every call holds the lock for its whole body, so each
/// write is applied all at once.
#[derive(Default)]
pub struct MemoryLeaveStore {
    state: RwLock<State>,
}

impl MemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeaveStore for MemoryLeaveStore {
    async fn member(&self, id: u64) -> Result<Option<Member>, StoreError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.members.get(&id).cloned())
    }

    async fn member_by_email(&self, email: &str) -> Result<Option<Member>, StoreError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.members.values().find(|m| m.email == email).cloned())
    }

    async fn members(&self, filter: &MemberFilter) -> Result<Vec<Member>, StoreError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .members
            .values()
            .filter(|m| filter.stream.as_ref().is_none_or(|s| &m.stream == s))
            .filter(|m| !filter.active_only || m.is_active)
            .cloned()
            .collect())
    }

    async fn insert_member(&self, member: NewMember) -> Result<Member, StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let email = normalize_email(&member.email);
        if state.members.values().any(|m| m.email == email) {
            return Err(StoreError::Duplicate(email));
        }

        let id = next_id(&mut state.next_member_id);
        let stored = Member {
            id,
            name: member.name,
            email,
            stream: member.stream,
            location: member.location,
            role: member.role,
            annual_entitlement: member
                .annual_entitlement
                .unwrap_or(DEFAULT_ANNUAL_ENTITLEMENT),
            sick_entitlement: member.sick_entitlement.unwrap_or(DEFAULT_SICK_ENTITLEMENT),
            is_active: true,
        };
        state.members.insert(id, stored.clone());
        Ok(stored)
    }

    async fn holidays_for(&self, location: Location) -> Result<Vec<HolidayEntry>, StoreError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .holidays
            .values()
            .filter(|h| h.location.applies_to(location))
            .cloned()
            .collect())
    }

    async fn insert_holiday(&self, holiday: NewHoliday) -> Result<HolidayEntry, StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state
            .holidays
            .values()
            .any(|h| h.date == holiday.date && h.location == holiday.location)
        {
            return Err(StoreError::Duplicate(format!(
                "{} ({})",
                holiday.date, holiday.location
            )));
        }

        let id = next_id(&mut state.next_holiday_id);
        let stored = HolidayEntry {
            id,
            name: holiday.name,
            date: holiday.date,
            location: holiday.location,
            color: holiday
                .color
                .unwrap_or_else(|| DEFAULT_HOLIDAY_COLOR.to_string()),
        };
        state.holidays.insert(id, stored.clone());
        Ok(stored)
    }

    async fn leave_request(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.requests.get(&id).cloned())
    }

    async fn leave_requests(&self, filter: &RequestFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<LeaveRequest> = state
            .requests
            .values()
            .filter(|r| filter.matches(r, state.members.get(&r.member_id)))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn insert_leave_request(
        &self,
        request: NewLeaveRequest,
    ) -> Result<LeaveRequest, StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let id = next_id(&mut state.next_request_id);
        let stored = request.into_request(id);
        state.requests.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_leave_request(&self, request: &LeaveRequest) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match state.requests.get_mut(&request.id) {
            Some(slot) => {
                *slot = request.clone();
                Ok(())
            }
            None => Err(StoreError::Database(format!(
                "leave request {} vanished during update",
                request.id
            ))),
        }
    }

    async fn delete_leave_request(&self, id: u64) -> Result<bool, StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        Ok(state.requests.remove(&id).is_some())
    }
}
