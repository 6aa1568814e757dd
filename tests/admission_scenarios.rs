use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use leave_tracker::db::{MemoryLeaveStore, RequestFilter};
use leave_tracker::engine::{
    AdmissionController, AdmissionPolicy, AdmissionSettings, DecisionEvent, DecisionSubscriber,
    LeaveError, LeaveSubmission, SubscriberError, Transition,
};
use leave_tracker::model::holiday::{HolidayScope, NewHoliday};
use leave_tracker::model::leave_request::{DayType, LeaveStatus, LeaveType};
use leave_tracker::model::member::{Location, Member, NewMember};
use leave_tracker::model::role::MemberRole;

type Controller = AdmissionController<MemoryLeaveStore>;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn controller(policy: AdmissionPolicy) -> Controller {
    AdmissionController::new(
        Arc::new(MemoryLeaveStore::new()),
        AdmissionSettings {
            policy,
            ..Default::default()
        },
    )
}

async fn member(engine: &Controller, name: &str, stream: &str, location: Location) -> Member {
    engine
        .register_member(NewMember {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            stream: stream.to_string(),
            location,
            role: MemberRole::Member,
            annual_entitlement: None,
            sick_entitlement: None,
        })
        .await
        .unwrap()
}

async fn scrum_master(engine: &Controller) -> Member {
    engine
        .register_member(NewMember {
            name: "Husam".to_string(),
            email: "obeidh@example.com".to_string(),
            stream: "Scrum".to_string(),
            location: Location::Uae,
            role: MemberRole::ScrumMaster,
            annual_entitlement: None,
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

#[derive(Default)]
struct RecordingSubscriber {
    events: Mutex<Vec<&'static str>>,
}

impl DecisionSubscriber for RecordingSubscriber {
    fn publish(&self, event: &DecisionEvent) -> Result<(), SubscriberError> {
        self.events.lock().unwrap().push(event.name());
        Ok(())
    }
}

struct FailingSubscriber;

impl DecisionSubscriber for FailingSubscriber {
    fn publish(&self, _event: &DecisionEvent) -> Result<(), SubscriberError> {
        Err(SubscriberError("mail relay down".to_string()))
    }
}

#[actix_web::test]
async fn shared_holiday_costs_no_working_days() {
    let engine = controller(AdmissionPolicy::default());
    engine
        .add_holiday(NewHoliday {
            name: "New Year's Day".to_string(),
            date: date(2026, 1, 1),
            location: HolidayScope::Both,
            color: None,
        })
        .await
        .unwrap();

    for location in [Location::Uae, Location::India] {
        let days = engine
            .compute_working_days(date(2026, 1, 1), date(2026, 1, 1), location)
            .await
            .unwrap();
        assert_eq!(days, 0);
    }
}

#[actix_web::test]
async fn holiday_listing_follows_location_in_date_order() {
    let engine = controller(AdmissionPolicy::default());
    for (name, day, scope) in [
        ("Republic Day", date(2026, 1, 26), HolidayScope::India),
        ("National Day", date(2026, 12, 2), HolidayScope::Uae),
        ("New Year's Day", date(2026, 1, 1), HolidayScope::Both),
        ("Holi", date(2026, 3, 4), HolidayScope::India),
    ] {
        engine
            .add_holiday(NewHoliday {
                name: name.to_string(),
                date: day,
                location: scope,
                color: None,
            })
            .await
            .unwrap();
    }

    let india: Vec<String> = engine
        .holidays(Location::India)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.name)
        .collect();
    assert_eq!(india, ["New Year's Day", "Republic Day", "Holi"]);

    let uae = engine.holidays(Location::Uae).await.unwrap();
    assert_eq!(uae.len(), 2);
    assert_eq!(uae[0].date, date(2026, 1, 1));
    assert_eq!(uae[1].name, "National Day");
}

#[actix_web::test]
async fn approved_week_reduces_annual_balance() {
    let engine = controller(AdmissionPolicy::default());
    let sm = scrum_master(&engine).await;
    let alice = member(&engine, "Alice", "QA", Location::India).await;

    let request = engine
        .submit_leave(annual(alice.id, date(2026, 2, 2), date(2026, 2, 6)))
        .await
        .unwrap();
    assert_eq!(request.working_days, 5.0);
    assert_eq!(request.status, LeaveStatus::Pending);
    // pending leave is not consumed yet
    assert_eq!(engine.get_balance(alice.id, LeaveType::Annual).await.unwrap(), 22.0);

    let approved = engine.approve_leave(request.id, sm.id).await.unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
    assert_eq!(approved.approved_by, Some(sm.id));
    assert!(approved.approved_at.is_some());
    assert_eq!(engine.get_balance(alice.id, LeaveType::Annual).await.unwrap(), 17.0);
}

#[actix_web::test]
async fn overlapping_submission_in_same_stream_is_refused() {
    let engine = controller(AdmissionPolicy::default());
    let sm = scrum_master(&engine).await;
    let alice = member(&engine, "Alice", "QA", Location::India).await;
    let bob = member(&engine, "Bob", "QA", Location::Uae).await;
    let carol = member(&engine, "Carol", "CRM", Location::Uae).await;

    let first = engine
        .submit_leave(annual(alice.id, date(2026, 2, 2), date(2026, 2, 6)))
        .await
        .unwrap();
    engine.approve_leave(first.id, sm.id).await.unwrap();

    let err = engine
        .submit_leave(annual(bob.id, date(2026, 2, 5), date(2026, 2, 10)))
        .await
        .unwrap_err();
    match err {
        LeaveError::OverlapConflict(conflict) => {
            assert_eq!(conflict.member_id, alice.id);
            assert_eq!(conflict.member_name, "Alice");
            assert_eq!(conflict.start_date, date(2026, 2, 2));
            assert_eq!(conflict.end_date, date(2026, 2, 6));
        }
        other => panic!("expected overlap conflict, got {other:?}"),
    }
    let stored = engine
        .list_requests(&RequestFilter {
            member_id: Some(bob.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(stored.is_empty());

    // another stream is unaffected
    engine
        .submit_leave(annual(carol.id, date(2026, 2, 5), date(2026, 2, 10)))
        .await
        .unwrap();
}

#[actix_web::test]
async fn sick_request_beyond_entitlement_reports_shortfall() {
    let engine = controller(AdmissionPolicy::default());
    let alice = member(&engine, "Alice", "QA", Location::India).await;

    // 2026-03-02 (Mon) .. 2026-03-16 (Mon) spans 11 working days
    let err = engine
        .submit_leave(LeaveSubmission {
            leave_type: LeaveType::Sick,
            ..annual(alice.id, date(2026, 3, 2), date(2026, 3, 16))
        })
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LeaveError::InsufficientBalance {
            leave_type: LeaveType::Sick,
            requested: 11.0,
            current: 10.0,
            shortfall: 1.0,
        }
    );
    assert!(engine.list_requests(&RequestFilter::default()).await.unwrap().is_empty());
}

#[actix_web::test]
async fn balance_is_reported_before_overlap() {
    let engine = controller(AdmissionPolicy::default());
    let sm = scrum_master(&engine).await;
    let alice = member(&engine, "Alice", "QA", Location::India).await;
    let bob = engine
        .register_member(NewMember {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            stream: "QA".to_string(),
            location: Location::India,
            role: MemberRole::Member,
            annual_entitlement: Some(1),
            sick_entitlement: None,
        })
        .await
        .unwrap();

    let first = engine
        .submit_leave(annual(alice.id, date(2026, 2, 2), date(2026, 2, 6)))
        .await
        .unwrap();
    engine.approve_leave(first.id, sm.id).await.unwrap();

    let err = engine
        .submit_leave(annual(bob.id, date(2026, 2, 3), date(2026, 2, 4)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "insufficient_balance");
}

#[actix_web::test]
async fn cancel_is_owner_only_and_pending_only() {
    let engine = controller(AdmissionPolicy::default());
    let sm = scrum_master(&engine).await;
    let alice = member(&engine, "Alice", "QA", Location::India).await;
    let bob = member(&engine, "Bob", "QA", Location::India).await;

    let pending = engine
        .submit_leave(annual(alice.id, date(2026, 4, 6), date(2026, 4, 7)))
        .await
        .unwrap();
    let err = engine.cancel_leave(pending.id, bob.id).await.unwrap_err();
    assert_eq!(err.kind(), "unauthorized");

    engine.cancel_leave(pending.id, alice.id).await.unwrap();
    assert_eq!(
        engine.get_request(pending.id).await.unwrap_err(),
        LeaveError::request_not_found(pending.id)
    );

    let approved = engine
        .submit_leave(annual(alice.id, date(2026, 5, 4), date(2026, 5, 5)))
        .await
        .unwrap();
    engine.approve_leave(approved.id, sm.id).await.unwrap();
    assert_eq!(
        engine.cancel_leave(approved.id, alice.id).await.unwrap_err(),
        LeaveError::InvalidStateTransition {
            from: LeaveStatus::Approved,
            action: Transition::Cancel,
        }
    );
}

#[actix_web::test]
async fn override_needs_a_reason_and_skips_checks() {
    let engine = controller(AdmissionPolicy::default());
    let sm = scrum_master(&engine).await;
    let alice = member(&engine, "Alice", "QA", Location::India).await;
    let bob = member(&engine, "Bob", "QA", Location::India).await;

    let alice_leave = engine
        .submit_leave(annual(alice.id, date(2026, 6, 1), date(2026, 6, 5)))
        .await
        .unwrap();
    let bob_leave = engine
        .submit_leave(annual(bob.id, date(2026, 6, 3), date(2026, 6, 4)))
        .await
        .unwrap();
    engine.approve_leave(alice_leave.id, sm.id).await.unwrap();

    let err = engine
        .override_approve(bob_leave.id, sm.id, "   ")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert_eq!(
        engine.get_request(bob_leave.id).await.unwrap().status,
        LeaveStatus::Pending
    );

    let approved = engine
        .override_approve(bob_leave.id, sm.id, "Release cover arranged")
        .await
        .unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
    assert!(approved.override_used);
    assert_eq!(approved.override_reason.as_deref(), Some("Release cover arranged"));
}

#[actix_web::test]
async fn override_approves_past_an_exhausted_balance() {
    let engine = controller(AdmissionPolicy::default());
    let sm = scrum_master(&engine).await;
    let alice = engine
        .register_member(NewMember {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            stream: "QA".to_string(),
            location: Location::India,
            role: MemberRole::Member,
            annual_entitlement: Some(5),
            sick_entitlement: None,
        })
        .await
        .unwrap();

    // each fits the balance on its own while both are pending
    let week = engine
        .submit_leave(annual(alice.id, date(2026, 2, 2), date(2026, 2, 6)))
        .await
        .unwrap();
    let extra = engine
        .submit_leave(annual(alice.id, date(2026, 2, 9), date(2026, 2, 10)))
        .await
        .unwrap();
    engine.approve_leave(week.id, sm.id).await.unwrap();

    assert_eq!(
        engine.approve_leave(extra.id, sm.id).await.unwrap_err(),
        LeaveError::InsufficientBalance {
            leave_type: LeaveType::Annual,
            requested: 2.0,
            current: 0.0,
            shortfall: 2.0,
        }
    );
    assert_eq!(engine.get_request(extra.id).await.unwrap().status, LeaveStatus::Pending);

    let approved = engine
        .override_approve(extra.id, sm.id, "Visa appointment cannot move")
        .await
        .unwrap();
    assert!(approved.override_used);
    assert_eq!(engine.get_balance(alice.id, LeaveType::Annual).await.unwrap(), -2.0);
}

#[actix_web::test]
async fn negative_balance_policy_admits_oversized_request() {
    let engine = controller(AdmissionPolicy {
        allow_negative_balance: true,
        ..Default::default()
    });
    let sm = scrum_master(&engine).await;
    let alice = member(&engine, "Alice", "QA", Location::India).await;

    // 2026-07-01 .. 2026-07-31 holds 23 weekdays, one more than the entitlement
    let request = engine
        .submit_leave(annual(alice.id, date(2026, 7, 1), date(2026, 7, 31)))
        .await
        .unwrap();
    assert_eq!(request.working_days, 23.0);

    engine
        .override_approve(request.id, sm.id, "Extended family leave")
        .await
        .unwrap();
    assert_eq!(engine.get_balance(alice.id, LeaveType::Annual).await.unwrap(), -1.0);
}

#[actix_web::test]
async fn only_active_scrum_masters_review() {
    let engine = controller(AdmissionPolicy::default());
    let alice = member(&engine, "Alice", "QA", Location::India).await;
    let bob = member(&engine, "Bob", "QA", Location::India).await;

    let request = engine
        .submit_leave(annual(alice.id, date(2026, 2, 2), date(2026, 2, 3)))
        .await
        .unwrap();

    assert_eq!(
        engine.approve_leave(request.id, bob.id).await.unwrap_err().kind(),
        "unauthorized"
    );
    assert_eq!(
        engine.reject_leave(request.id, 999, None).await.unwrap_err().kind(),
        "unauthorized"
    );
    assert_eq!(
        engine.approve_leave(404, bob.id).await.unwrap_err(),
        LeaveError::request_not_found(404)
    );
    assert_eq!(
        engine.get_request(request.id).await.unwrap().status,
        LeaveStatus::Pending
    );
}

#[actix_web::test]
async fn rejected_and_pending_leave_leave_balance_untouched() {
    let engine = controller(AdmissionPolicy::default());
    let sm = scrum_master(&engine).await;
    let alice = member(&engine, "Alice", "QA", Location::India).await;

    let rejected = engine
        .submit_leave(annual(alice.id, date(2026, 2, 2), date(2026, 2, 6)))
        .await
        .unwrap();
    let rejected = engine
        .reject_leave(rejected.id, sm.id, Some("Release week"))
        .await
        .unwrap();
    assert_eq!(rejected.status, LeaveStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Release week"));

    engine
        .submit_leave(annual(alice.id, date(2026, 3, 2), date(2026, 3, 3)))
        .await
        .unwrap();

    let balances = engine.member_balances(alice.id).await.unwrap();
    assert_eq!(balances.annual, 22.0);
    assert_eq!(balances.sick, 10.0);

    assert_eq!(
        engine
            .approve_leave(rejected.id, sm.id)
            .await
            .unwrap_err(),
        LeaveError::InvalidStateTransition {
            from: LeaveStatus::Rejected,
            action: Transition::Approve,
        }
    );
}

#[actix_web::test]
async fn approval_rechecks_overlap_against_later_approvals() {
    let engine = controller(AdmissionPolicy::default());
    let sm = scrum_master(&engine).await;
    let alice = member(&engine, "Alice", "QA", Location::India).await;
    let bob = member(&engine, "Bob", "QA", Location::India).await;

    // both pending, so neither blocks the other at submission
    let a = engine
        .submit_leave(annual(alice.id, date(2026, 9, 7), date(2026, 9, 11)))
        .await
        .unwrap();
    let b = engine
        .submit_leave(annual(bob.id, date(2026, 9, 10), date(2026, 9, 14)))
        .await
        .unwrap();

    engine.approve_leave(a.id, sm.id).await.unwrap();
    let err = engine.approve_leave(b.id, sm.id).await.unwrap_err();
    assert_eq!(err.kind(), "overlap_conflict");
    assert_eq!(engine.get_request(b.id).await.unwrap().status, LeaveStatus::Pending);

    let queue = engine.pending_queue().await.unwrap();
    assert_eq!(queue.iter().map(|r| r.id).collect::<Vec<_>>(), vec![b.id]);
}

#[actix_web::test]
async fn subscribers_see_decisions_and_failures_do_not_change_them() {
    let recorder = Arc::new(RecordingSubscriber::default());
    let engine = controller(AdmissionPolicy::default())
        .with_subscriber(Arc::new(FailingSubscriber))
        .with_subscriber(recorder.clone());
    let sm = scrum_master(&engine).await;
    let alice = member(&engine, "Alice", "QA", Location::India).await;
    let bob = member(&engine, "Bob", "QA", Location::India).await;

    let request = engine
        .submit_leave(annual(alice.id, date(2026, 2, 2), date(2026, 2, 6)))
        .await
        .unwrap();
    engine.approve_leave(request.id, sm.id).await.unwrap();
    engine
        .submit_leave(annual(bob.id, date(2026, 2, 4), date(2026, 2, 4)))
        .await
        .unwrap_err();

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec!["submitted", "approved", "blocked"]
    );
}

#[actix_web::test]
async fn allow_overlap_admits_same_stream_requests() {
    let engine = controller(AdmissionPolicy {
        allow_overlap: true,
        ..Default::default()
    });
    let sm = scrum_master(&engine).await;
    let alice = member(&engine, "Alice", "QA", Location::India).await;
    let bob = member(&engine, "Bob", "QA", Location::India).await;

    let a = engine
        .submit_leave(annual(alice.id, date(2026, 2, 2), date(2026, 2, 6)))
        .await
        .unwrap();
    engine.approve_leave(a.id, sm.id).await.unwrap();
    let b = engine
        .submit_leave(annual(bob.id, date(2026, 2, 5), date(2026, 2, 6)))
        .await
        .unwrap();
    engine.approve_leave(b.id, sm.id).await.unwrap();
}

#[actix_web::test]
async fn half_day_costs_half_a_working_day() {
    let engine = controller(AdmissionPolicy::default());
    let alice = member(&engine, "Alice", "QA", Location::India).await;

    let request = engine
        .submit_leave(LeaveSubmission {
            day_type: DayType::HalfDay,
            ..annual(alice.id, date(2026, 2, 3), date(2026, 2, 3))
        })
        .await
        .unwrap();
    assert_eq!(request.working_days, 0.5);

    let err = engine
        .submit_leave(LeaveSubmission {
            day_type: DayType::HalfDay,
            ..annual(alice.id, date(2026, 2, 3), date(2026, 2, 4))
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[actix_web::test]
async fn submission_validates_dates_and_member() {
    let engine = controller(AdmissionPolicy::default());
    let alice = member(&engine, "Alice", "QA", Location::India).await;

    assert_eq!(
        engine
            .submit_leave(annual(alice.id, date(2026, 2, 6), date(2026, 2, 2)))
            .await
            .unwrap_err()
            .kind(),
        "validation"
    );
    assert_eq!(
        engine
            .submit_leave(annual(77, date(2026, 2, 2), date(2026, 2, 6)))
            .await
            .unwrap_err(),
        LeaveError::member_not_found(77)
    );

    // weekend-only range is admitted at zero cost
    let weekend = engine
        .submit_leave(annual(alice.id, date(2026, 2, 7), date(2026, 2, 8)))
        .await
        .unwrap();
    assert_eq!(weekend.working_days, 0.0);
}
