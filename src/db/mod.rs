//! Storage seam for the admission engine.
//!
//! The engine only ever talks to [`LeaveStore`]. `MySqlLeaveStore` backs the
//! running service, `MemoryLeaveStore` backs tests and demo runs.

use std::future::Future;

use chrono::NaiveDate;
use derive_more::Display;

use crate::model::holiday::{HolidayEntry, NewHoliday};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest};
use crate::model::member::{Location, Member, NewMember};

pub mod memory;
pub mod mysql;

pub use memory::MemoryLeaveStore;
pub use mysql::{MySqlLeaveStore, init_db};

#[derive(Debug, Clone, PartialEq, Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(String),
    #[display(fmt = "corrupt row: {}", _0)]
    Corrupt(String),
    #[display(fmt = "duplicate entry: {}", _0)]
    Duplicate(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &value {
            if db_err.code().as_deref() == Some("23000") {
                return StoreError::Duplicate(db_err.message().to_string());
            }
        }
        StoreError::Database(value.to_string())
    }
}

impl From<strum::ParseError> for StoreError {
    fn from(value: strum::ParseError) -> Self {
        StoreError::Corrupt(value.to_string())
    }
}

/// Query-by-filter over leave requests. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFilter {
    pub member_id: Option<u64>,
    /// Stream of the owning member
    pub stream: Option<String>,
    pub status: Option<LeaveStatus>,
    pub leave_type: Option<LeaveType>,
    /// Inclusive date range the request must intersect
    pub overlapping: Option<(NaiveDate, NaiveDate)>,
}

impl RequestFilter {
    pub fn matches(&self, request: &LeaveRequest, owner: Option<&Member>) -> bool {
        if self.member_id.is_some_and(|id| id != request.member_id) {
            return false;
        }
        if let Some(stream) = &self.stream {
            if owner.map(|m| &m.stream) != Some(stream) {
                return false;
            }
        }
        if self.status.is_some_and(|status| status != request.status) {
            return false;
        }
        if self
            .leave_type
            .is_some_and(|leave_type| leave_type != request.leave_type)
        {
            return false;
        }
        if let Some((start, end)) = self.overlapping {
            if !request.overlaps(start, end) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberFilter {
    pub stream: Option<String>,
    pub active_only: bool,
}

/// Read and write access the engine needs. Writes are single calls so a
/// caller never observes half of an update.
pub trait LeaveStore: Send + Sync {
    fn member(&self, id: u64) -> impl Future<Output = Result<Option<Member>, StoreError>> + Send;

    /// `email` must already be normalized.
    fn member_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Member>, StoreError>> + Send;

    fn members(
        &self,
        filter: &MemberFilter,
    ) -> impl Future<Output = Result<Vec<Member>, StoreError>> + Send;

    fn insert_member(
        &self,
        member: NewMember,
    ) -> impl Future<Output = Result<Member, StoreError>> + Send;

    /// Holidays scoped to `location` or to `Both`.
    fn holidays_for(
        &self,
        location: Location,
    ) -> impl Future<Output = Result<Vec<HolidayEntry>, StoreError>> + Send;

    fn insert_holiday(
        &self,
        holiday: NewHoliday,
    ) -> impl Future<Output = Result<HolidayEntry, StoreError>> + Send;

    fn leave_request(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<Option<LeaveRequest>, StoreError>> + Send;

    /// Newest submissions first.
    fn leave_requests(
        &self,
        filter: &RequestFilter,
    ) -> impl Future<Output = Result<Vec<LeaveRequest>, StoreError>> + Send;

    fn insert_leave_request(
        &self,
        request: NewLeaveRequest,
    ) -> impl Future<Output = Result<LeaveRequest, StoreError>> + Send;

    /// Overwrites every mutable column of an existing request.
    fn update_leave_request(
        &self,
        request: &LeaveRequest,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns false when nothing was deleted.
    fn delete_leave_request(&self, id: u64)
    -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// Store picked at startup: MySQL when `DATABASE_URL` is set, memory otherwise.
pub enum AppStore {
    MySql(MySqlLeaveStore),
    Memory(MemoryLeaveStore),
}

macro_rules! delegate {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            AppStore::MySql($store) => $call.await,
            AppStore::Memory($store) => $call.await,
        }
    };
}

impl LeaveStore for AppStore {
    async fn member(&self, id: u64) -> Result<Option<Member>, StoreError> {
        delegate!(self, store => store.member(id))
    }

    async fn member_by_email(&self, email: &str) -> Result<Option<Member>, StoreError> {
        delegate!(self, store => store.member_by_email(email))
    }

    async fn members(&self, filter: &MemberFilter) -> Result<Vec<Member>, StoreError> {
        delegate!(self, store => store.members(filter))
    }

    async fn insert_member(&self, member: NewMember) -> Result<Member, StoreError> {
        delegate!(self, store => store.insert_member(member))
    }

    async fn holidays_for(&self, location: Location) -> Result<Vec<HolidayEntry>, StoreError> {
        delegate!(self, store => store.holidays_for(location))
    }

    async fn insert_holiday(&self, holiday: NewHoliday) -> Result<HolidayEntry, StoreError> {
        delegate!(self, store => store.insert_holiday(holiday))
    }

    async fn leave_request(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        delegate!(self, store => store.leave_request(id))
    }

    async fn leave_requests(&self, filter: &RequestFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        delegate!(self, store => store.leave_requests(filter))
    }

    async fn insert_leave_request(
        &self,
        request: NewLeaveRequest,
    ) -> Result<LeaveRequest, StoreError> {
        delegate!(self, store => store.insert_leave_request(request))
    }

    async fn update_leave_request(&self, request: &LeaveRequest) -> Result<(), StoreError> {
        delegate!(self, store => store.update_leave_request(request))
    }

    async fn delete_leave_request(&self, id: u64) -> Result<bool, StoreError> {
        delegate!(self, store => store.delete_leave_request(id))
    }
}
