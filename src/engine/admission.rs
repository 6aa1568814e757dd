//! Entry point of the engine.
//!
//! Every mutating operation runs under the admission lock of the owning
//! member's stream: the approved-leave reads, the decision and the write all
//! happen while that lock is held. A member belongs to exactly one stream, so
//! this also serializes balance decisions per member and leave type.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use super::balance::{self, MemberBalances};
use super::calendar::HolidayCalendar;
use super::error::{Conflict, LeaveError, Transition};
use super::events::{DecisionEvent, DecisionSubscriber};
use super::overlap;
use super::working_days;
use crate::db::{LeaveStore, MemberFilter, RequestFilter, StoreError};
use crate::model::holiday::{HolidayEntry, NewHoliday};
use crate::model::leave_request::{DayType, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest};
use crate::model::member::{Location, Member, NewMember, normalize_email};

/// Switches that relax the admission checks. Both default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdmissionPolicy {
    pub allow_overlap: bool,
    pub allow_negative_balance: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionSettings {
    pub policy: AdmissionPolicy,
    /// How long an operation waits for its stream before failing with `Busy`
    pub lock_timeout: Duration,
    pub default_annual_entitlement: u32,
    pub default_sick_entitlement: u32,
}

impl Default for AdmissionSettings {
    fn default() -> Self {
        Self {
            policy: AdmissionPolicy::default(),
            lock_timeout: Duration::from_secs(5),
            default_annual_entitlement: crate::model::member::DEFAULT_ANNUAL_ENTITLEMENT,
            default_sick_entitlement: crate::model::member::DEFAULT_SICK_ENTITLEMENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct LeaveSubmission {
    #[schema(example = 12)]
    pub member_id: u64,
    pub leave_type: LeaveType,
    #[serde(default)]
    pub day_type: DayType,
    #[schema(example = "2026-02-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(default)]
    #[schema(example = "Family visit")]
    pub reason: String,
}

/// One async mutex per stream, created on first use.
struct StreamLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    timeout: Duration,
}

impl StreamLocks {
    fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    async fn acquire(&self, stream: &str) -> Result<OwnedMutexGuard<()>, LeaveError> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(stream.to_string()).or_default().clone()
        };

        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                warn!(stream, "Timed out waiting for stream admission lock");
                LeaveError::Busy(stream.to_string())
            })
    }
}

pub struct AdmissionController<S> {
    store: Arc<S>,
    settings: AdmissionSettings,
    locks: StreamLocks,
    subscribers: Vec<Arc<dyn DecisionSubscriber>>,
}

impl<S: LeaveStore> AdmissionController<S> {
    pub fn new(store: Arc<S>, settings: AdmissionSettings) -> Self {
        let locks = StreamLocks::new(settings.lock_timeout);
        Self {
            store,
            settings,
            locks,
            subscribers: Vec::new(),
        }
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn DecisionSubscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn settings(&self) -> &AdmissionSettings {
        &self.settings
    }

    fn publish(&self, event: DecisionEvent) {
        for subscriber in &self.subscribers {
            if let Err(e) = subscriber.publish(&event) {
                warn!(error = %e, event = event.name(), "Decision subscriber failed");
            }
        }
    }

    async fn load_member(&self, member_id: u64) -> Result<Member, LeaveError> {
        self.store
            .member(member_id)
            .await?
            .ok_or_else(|| LeaveError::member_not_found(member_id))
    }

    async fn load_request(&self, request_id: u64) -> Result<LeaveRequest, LeaveError> {
        self.store
            .leave_request(request_id)
            .await?
            .ok_or_else(|| LeaveError::request_not_found(request_id))
    }

    /// Approve, reject and override are reserved for active scrum masters.
    async fn load_reviewer(&self, approver_id: u64) -> Result<Member, LeaveError> {
        match self.store.member(approver_id).await? {
            Some(member) if member.is_active && member.role.can_review() => Ok(member),
            Some(_) => Err(LeaveError::Unauthorized(
                "scrum master role required".to_string(),
            )),
            None => Err(LeaveError::Unauthorized(format!(
                "unknown approver {approver_id}"
            ))),
        }
    }

    async fn calendar_for(&self, location: Location) -> Result<HolidayCalendar, LeaveError> {
        let holidays = self.store.holidays_for(location).await?;
        Ok(HolidayCalendar::for_location(location, &holidays))
    }

    async fn approved_history(
        &self,
        member: &Member,
        leave_type: LeaveType,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        self.store
            .leave_requests(&RequestFilter {
                member_id: Some(member.id),
                leave_type: Some(leave_type),
                status: Some(LeaveStatus::Approved),
                ..Default::default()
            })
            .await
    }

    async fn current_balance(&self, member: &Member, leave_type: LeaveType) -> Result<f64, LeaveError> {
        let history = self.approved_history(member, leave_type).await?;
        Ok(balance::balance(member, leave_type, &history))
    }

    async fn ensure_balance(
        &self,
        member: &Member,
        leave_type: LeaveType,
        requested: f64,
    ) -> Result<(), LeaveError> {
        if self.settings.policy.allow_negative_balance {
            return Ok(());
        }

        let history = self.approved_history(member, leave_type).await?;
        let check = balance::check_sufficient(member, leave_type, requested, &history);
        if check.sufficient {
            return Ok(());
        }
        Err(LeaveError::InsufficientBalance {
            leave_type,
            requested,
            current: check.current,
            shortfall: check.shortfall(),
        })
    }

    async fn conflict_for(
        &self,
        member: &Member,
        start: NaiveDate,
        end: NaiveDate,
        exclude_request_id: Option<u64>,
    ) -> Result<Option<Conflict>, LeaveError> {
        let stream_members: HashMap<u64, Member> = self
            .store
            .members(&MemberFilter {
                stream: Some(member.stream.clone()),
                active_only: false,
            })
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let candidates = self
            .store
            .leave_requests(&RequestFilter {
                stream: Some(member.stream.clone()),
                status: Some(LeaveStatus::Approved),
                overlapping: Some((start, end)),
                ..Default::default()
            })
            .await?;

        Ok(overlap::find_conflict(
            member,
            start,
            end,
            exclude_request_id,
            &stream_members,
            &candidates,
        ))
    }

    async fn ensure_no_overlap(
        &self,
        member: &Member,
        start: NaiveDate,
        end: NaiveDate,
        exclude_request_id: Option<u64>,
    ) -> Result<(), LeaveError> {
        if self.settings.policy.allow_overlap {
            return Ok(());
        }
        match self.conflict_for(member, start, end, exclude_request_id).await? {
            Some(conflict) => Err(LeaveError::OverlapConflict(conflict)),
            None => Ok(()),
        }
    }

    /// Computes the cost of a new request, checks balance then overlap, and
    /// only then stores it as `Pending`. A refused submission stores nothing.
    #[instrument(
        name = "submit_leave",
        skip(self, submission),
        fields(member_id = submission.member_id, leave_type = %submission.leave_type)
    )]
    pub async fn submit_leave(&self, submission: LeaveSubmission) -> Result<LeaveRequest, LeaveError> {
        if submission.start_date > submission.end_date {
            return Err(LeaveError::validation("start_date cannot be after end_date"));
        }
        if submission.day_type == DayType::HalfDay && submission.start_date != submission.end_date {
            return Err(LeaveError::validation(
                "a half day request must start and end on the same date",
            ));
        }

        let member = self.load_member(submission.member_id).await?;
        if !member.is_active {
            return Err(LeaveError::validation("member account is inactive"));
        }

        let _guard = self.locks.acquire(&member.stream).await?;

        let calendar = self.calendar_for(member.location).await?;
        let days = working_days::requested_days(
            submission.start_date,
            submission.end_date,
            submission.day_type,
            &calendar,
        );
        debug!(days, "Working days computed");

        let checks = match self
            .ensure_balance(&member, submission.leave_type, days)
            .await
        {
            Ok(()) => {
                self.ensure_no_overlap(&member, submission.start_date, submission.end_date, None)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(cause) = checks {
            if matches!(
                cause,
                LeaveError::InsufficientBalance { .. } | LeaveError::OverlapConflict(_)
            ) {
                self.publish(DecisionEvent::Blocked {
                    member_id: member.id,
                    cause: cause.clone(),
                });
            }
            return Err(cause);
        }

        let request = self
            .store
            .insert_leave_request(NewLeaveRequest {
                member_id: member.id,
                leave_type: submission.leave_type,
                day_type: submission.day_type,
                start_date: submission.start_date,
                end_date: submission.end_date,
                working_days: days,
                reason: submission.reason.trim().to_string(),
                submitted_at: Utc::now(),
            })
            .await?;

        info!(request_id = request.id, days, "Leave request admitted");
        self.publish(DecisionEvent::Submitted {
            request: request.clone(),
        });
        Ok(request)
    }

    /// Approval re-runs the balance and overlap checks against the current
    /// approved set; earlier approvals may have changed either since
    /// submission.
    #[instrument(name = "approve_leave", skip(self))]
    pub async fn approve_leave(&self, request_id: u64, approver_id: u64) -> Result<LeaveRequest, LeaveError> {
        let request = self.load_request(request_id).await?;
        let approver = self.load_reviewer(approver_id).await?;
        let owner = self.load_member(request.member_id).await?;

        let _guard = self.locks.acquire(&owner.stream).await?;
        let mut request = self.load_request(request_id).await?;
        request.ensure_pending(Transition::Approve)?;

        self.ensure_balance(&owner, request.leave_type, request.working_days)
            .await?;
        self.ensure_no_overlap(&owner, request.start_date, request.end_date, Some(request.id))
            .await?;

        request.approve(approver.id, Utc::now())?;
        self.store.update_leave_request(&request).await?;

        let remaining_balance = self.current_balance(&owner, request.leave_type).await?;
        info!(remaining_balance, "Leave request approved");
        self.publish(DecisionEvent::Approved {
            request: request.clone(),
            remaining_balance,
        });
        Ok(request)
    }

    #[instrument(name = "reject_leave", skip(self, reason))]
    pub async fn reject_leave(
        &self,
        request_id: u64,
        approver_id: u64,
        reason: Option<&str>,
    ) -> Result<LeaveRequest, LeaveError> {
        let request = self.load_request(request_id).await?;
        self.load_reviewer(approver_id).await?;
        let owner = self.load_member(request.member_id).await?;

        let _guard = self.locks.acquire(&owner.stream).await?;
        let mut request = self.load_request(request_id).await?;
        request.reject(reason)?;
        self.store.update_leave_request(&request).await?;

        self.publish(DecisionEvent::Rejected {
            request: request.clone(),
        });
        Ok(request)
    }

    /// Approves without balance or overlap checks. This is the only path that
    /// can drive a balance negative or put two stream members on leave at
    /// once.
    #[instrument(name = "override_approve", skip(self, reason))]
    pub async fn override_approve(
        &self,
        request_id: u64,
        approver_id: u64,
        reason: &str,
    ) -> Result<LeaveRequest, LeaveError> {
        let request = self.load_request(request_id).await?;
        let approver = self.load_reviewer(approver_id).await?;
        let owner = self.load_member(request.member_id).await?;

        let _guard = self.locks.acquire(&owner.stream).await?;
        let mut request = self.load_request(request_id).await?;
        request.override_approve(approver.id, reason, Utc::now())?;
        self.store.update_leave_request(&request).await?;

        let remaining_balance = self.current_balance(&owner, request.leave_type).await?;
        warn!(remaining_balance, "Leave request approved with override");
        self.publish(DecisionEvent::Overridden {
            request: request.clone(),
            remaining_balance,
        });
        Ok(request)
    }

    /// Deletes a pending request on behalf of its owner. No record is kept;
    /// subscribers receive the deleted request.
    #[instrument(name = "cancel_leave", skip(self))]
    pub async fn cancel_leave(&self, request_id: u64, member_id: u64) -> Result<(), LeaveError> {
        let request = self.load_request(request_id).await?;
        request.ensure_cancellable(member_id)?;
        let owner = self.load_member(request.member_id).await?;

        let _guard = self.locks.acquire(&owner.stream).await?;
        let request = self.load_request(request_id).await?;
        request.ensure_cancellable(member_id)?;

        if !self.store.delete_leave_request(request.id).await? {
            return Err(LeaveError::request_not_found(request_id));
        }

        self.publish(DecisionEvent::Cancelled { request });
        Ok(())
    }

    pub async fn get_balance(&self, member_id: u64, leave_type: LeaveType) -> Result<f64, LeaveError> {
        let member = self.load_member(member_id).await?;
        self.current_balance(&member, leave_type).await
    }

    pub async fn member_balances(&self, member_id: u64) -> Result<MemberBalances, LeaveError> {
        let member = self.load_member(member_id).await?;
        Ok(MemberBalances {
            member_id,
            annual: self.current_balance(&member, LeaveType::Annual).await?,
            sick: self.current_balance(&member, LeaveType::Sick).await?,
        })
    }

    pub async fn compute_working_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        location: Location,
    ) -> Result<u32, LeaveError> {
        let calendar = self.calendar_for(location).await?;
        Ok(working_days::working_days(start, end, &calendar))
    }

    /// Holidays that apply to `location`, including `Both` entries, by date.
    pub async fn holidays(&self, location: Location) -> Result<Vec<HolidayEntry>, LeaveError> {
        let mut holidays = self.store.holidays_for(location).await?;
        holidays.sort_by_key(|h| h.date);
        Ok(holidays)
    }

    /// Advisory lookup for callers planning a request; submission repeats the
    /// check under the stream lock.
    pub async fn check_overlap(
        &self,
        member_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Conflict>, LeaveError> {
        if start > end {
            return Err(LeaveError::validation("start_date cannot be after end_date"));
        }
        let member = self.load_member(member_id).await?;
        self.conflict_for(&member, start, end, None).await
    }

    pub async fn get_request(&self, request_id: u64) -> Result<LeaveRequest, LeaveError> {
        self.load_request(request_id).await
    }

    pub async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<LeaveRequest>, LeaveError> {
        Ok(self.store.leave_requests(filter).await?)
    }

    /// Pending requests, oldest submission first.
    pub async fn pending_queue(&self) -> Result<Vec<LeaveRequest>, LeaveError> {
        let mut pending = self
            .store
            .leave_requests(&RequestFilter {
                status: Some(LeaveStatus::Pending),
                ..Default::default()
            })
            .await?;
        pending.reverse();
        Ok(pending)
    }

    pub async fn find_member(&self, member_id: u64) -> Result<Option<Member>, LeaveError> {
        Ok(self.store.member(member_id).await?)
    }

    pub async fn member_by_email(&self, email: &str) -> Result<Option<Member>, LeaveError> {
        Ok(self.store.member_by_email(&normalize_email(email)).await?)
    }

    #[instrument(name = "register_member", skip(self, member), fields(stream = %member.stream))]
    pub async fn register_member(&self, mut member: NewMember) -> Result<Member, LeaveError> {
        member.name = member.name.trim().to_string();
        member.email = normalize_email(&member.email);
        member.stream = member.stream.trim().to_string();
        if member.name.is_empty() || member.email.is_empty() || member.stream.is_empty() {
            return Err(LeaveError::validation("name, email and stream are required"));
        }
        if self.store.member_by_email(&member.email).await?.is_some() {
            return Err(LeaveError::validation(format!(
                "email {} is already registered",
                member.email
            )));
        }

        member.annual_entitlement = member
            .annual_entitlement
            .or(Some(self.settings.default_annual_entitlement));
        member.sick_entitlement = member
            .sick_entitlement
            .or(Some(self.settings.default_sick_entitlement));

        let stored = self.store.insert_member(member).await.map_err(|e| match e {
            StoreError::Duplicate(email) => {
                LeaveError::validation(format!("email {email} is already registered"))
            }
            other => LeaveError::Store(other),
        })?;
        info!(member_id = stored.id, "Member registered");
        Ok(stored)
    }

    /// Existing requests keep the working-day count computed at submission.
    pub async fn add_holiday(&self, holiday: NewHoliday) -> Result<HolidayEntry, LeaveError> {
        if holiday.name.trim().is_empty() {
            return Err(LeaveError::validation("holiday name is required"));
        }
        self.store.insert_holiday(holiday).await.map_err(|e| match e {
            StoreError::Duplicate(what) => {
                LeaveError::validation(format!("holiday already exists: {what}"))
            }
            other => LeaveError::Store(other),
        })
    }
}
