use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Semaphore;

use leave_tracker::db::{LeaveStore, MemberFilter, MemoryLeaveStore, RequestFilter, StoreError};
use leave_tracker::engine::{AdmissionController, AdmissionSettings, LeaveError, LeaveSubmission};
use leave_tracker::model::holiday::{HolidayEntry, NewHoliday};
use leave_tracker::model::leave_request::{
    DayType, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest,
};
use leave_tracker::model::member::{Location, Member, NewMember};
use leave_tracker::model::role::MemberRole;

/// Memory store that suspends inside the reads and writes the engine makes
/// while holding a stream lock, so interleaved operations really interleave.
/// A closed gate parks every `leave_requests` call until `release`.
struct PausingStore {
    inner: MemoryLeaveStore,
    gate: Semaphore,
}

const PERMITS: usize = 1024;

impl PausingStore {
    fn open() -> Self {
        Self {
            inner: MemoryLeaveStore::new(),
            gate: Semaphore::new(PERMITS),
        }
    }

    fn closed() -> Self {
        Self {
            inner: MemoryLeaveStore::new(),
            gate: Semaphore::new(0),
        }
    }

    fn release(&self) {
        self.gate.add_permits(PERMITS);
    }
}

impl LeaveStore for PausingStore {
    async fn member(&self, id: u64) -> Result<Option<Member>, StoreError> {
        self.inner.member(id).await
    }

    async fn member_by_email(&self, email: &str) -> Result<Option<Member>, StoreError> {
        self.inner.member_by_email(email).await
    }

    async fn members(&self, filter: &MemberFilter) -> Result<Vec<Member>, StoreError> {
        self.inner.members(filter).await
    }

    async fn insert_member(&self, member: NewMember) -> Result<Member, StoreError> {
        self.inner.insert_member(member).await
    }

    async fn holidays_for(&self, location: Location) -> Result<Vec<HolidayEntry>, StoreError> {
        self.inner.holidays_for(location).await
    }

    async fn insert_holiday(&self, holiday: NewHoliday) -> Result<HolidayEntry, StoreError> {
        self.inner.insert_holiday(holiday).await
    }

    async fn leave_request(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        self.inner.leave_request(id).await
    }

    async fn leave_requests(&self, filter: &RequestFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        let _permit = self.gate.acquire().await.unwrap();
        tokio::task::yield_now().await;
        self.inner.leave_requests(filter).await
    }

    async fn insert_leave_request(
        &self,
        request: NewLeaveRequest,
    ) -> Result<LeaveRequest, StoreError> {
        self.inner.insert_leave_request(request).await
    }

    async fn update_leave_request(&self, request: &LeaveRequest) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.inner.update_leave_request(request).await
    }

    async fn delete_leave_request(&self, id: u64) -> Result<bool, StoreError> {
        self.inner.delete_leave_request(id).await
    }
}

type Controller = AdmissionController<PausingStore>;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn controller(store: Arc<PausingStore>, lock_timeout: Duration) -> Controller {
    AdmissionController::new(
        store,
        AdmissionSettings {
            lock_timeout,
            ..Default::default()
        },
    )
}

async fn register(
    engine: &Controller,
    name: &str,
    role: MemberRole,
    annual_entitlement: Option<u32>,
) -> Member {
    engine
        .register_member(NewMember {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            stream: "QA".to_string(),
            location: Location::India,
            role,
            annual_entitlement,
            sick_entitlement: None,
        })
        .await
        .unwrap()
}

fn annual(member_id: u64, start: NaiveDate, end: NaiveDate) -> LeaveSubmission {
    LeaveSubmission {
        member_id,
        leave_type: LeaveType::Annual,
        day_type: DayType::FullDay,
        start_date: start,
        end_date: end,
        reason: String::new(),
    }
}

#[actix_web::test]
async fn interleaved_approvals_admit_one_of_two_overlapping_requests() {
    let engine = controller(Arc::new(PausingStore::open()), Duration::from_secs(5));
    let sm = register(&engine, "Husam", MemberRole::ScrumMaster, None).await;
    let alice = register(&engine, "Alice", MemberRole::Member, None).await;
    let bob = register(&engine, "Bob", MemberRole::Member, None).await;

    let a = engine
        .submit_leave(annual(alice.id, date(2026, 10, 5), date(2026, 10, 9)))
        .await
        .unwrap();
    let b = engine
        .submit_leave(annual(bob.id, date(2026, 10, 8), date(2026, 10, 9)))
        .await
        .unwrap();

    let (first, second) = futures::join!(
        engine.approve_leave(a.id, sm.id),
        engine.approve_leave(b.id, sm.id)
    );
    assert!(first.is_ok());
    assert_eq!(second.unwrap_err().kind(), "overlap_conflict");

    let approved = engine
        .list_requests(&RequestFilter {
            status: Some(LeaveStatus::Approved),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(approved.len(), 1);
    assert_eq!(engine.get_request(b.id).await.unwrap().status, LeaveStatus::Pending);
}

#[actix_web::test]
async fn interleaved_approvals_never_overdraw_one_balance() {
    let engine = controller(Arc::new(PausingStore::open()), Duration::from_secs(5));
    let sm = register(&engine, "Husam", MemberRole::ScrumMaster, None).await;
    let alice = register(&engine, "Alice", MemberRole::Member, Some(5)).await;

    // pending requests do not consume balance, so both are admitted
    let (first, second) = futures::join!(
        engine.submit_leave(annual(alice.id, date(2026, 2, 2), date(2026, 2, 4))),
        engine.submit_leave(annual(alice.id, date(2026, 2, 9), date(2026, 2, 11)))
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    let (approved, refused) = futures::join!(
        engine.approve_leave(first.id, sm.id),
        engine.approve_leave(second.id, sm.id)
    );
    assert!(approved.is_ok());
    assert_eq!(
        refused.unwrap_err(),
        LeaveError::InsufficientBalance {
            leave_type: LeaveType::Annual,
            requested: 3.0,
            current: 2.0,
            shortfall: 1.0,
        }
    );
    assert_eq!(engine.get_balance(alice.id, LeaveType::Annual).await.unwrap(), 2.0);
}

#[actix_web::test]
async fn held_stream_lock_times_out_as_busy_without_writing() {
    let store = Arc::new(PausingStore::closed());
    let engine = controller(store.clone(), Duration::from_millis(1));
    let alice = register(&engine, "Alice", MemberRole::Member, None).await;
    let bob = register(&engine, "Bob", MemberRole::Member, None).await;

    // Alice's submission parks inside the store while holding the QA lock
    let (held, refused) = futures::join!(
        engine.submit_leave(annual(alice.id, date(2026, 3, 2), date(2026, 3, 3))),
        async {
            let result = engine
                .submit_leave(annual(bob.id, date(2026, 4, 6), date(2026, 4, 7)))
                .await;
            store.release();
            result
        }
    );

    assert!(held.is_ok());
    assert_eq!(refused.unwrap_err(), LeaveError::Busy("QA".to_string()));

    let bob_requests = engine
        .list_requests(&RequestFilter {
            member_id: Some(bob.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(bob_requests.is_empty());
}
