use crate::api::Engine;
use crate::auth::auth::AuthUser;
use crate::db::RequestFilter;
use crate::engine::LeaveSubmission;
use crate::model::leave_request::{DayType, LeaveRequest, LeaveStatus, LeaveType};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "Annual")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
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

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = "Release week")]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct OverrideLeave {
    #[schema(example = "Family emergency, coverage arranged with CRM")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 12)]
    /// Filter by requesting member
    pub member_id: Option<u64>,
    #[schema(example = "QA")]
    /// Filter by the requester's stream
    pub stream: Option<String>,
    #[schema(example = "Pending")]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = "Annual")]
    /// Filter by leave type
    pub leave_type: Option<LeaveType>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub total: usize,
}

/// Submit a leave request for the calling member
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request admitted as pending", body = LeaveRequest),
        (status = 400, description = "Invalid dates or inactive member"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Insufficient balance or overlapping approved leave in the stream", body = Object,
         example = json!({
            "error": "overlap_conflict",
            "message": "Alice from the same stream already has approved leave from 2026-02-02 to 2026-02-06",
            "conflict": {
                "request_id": 3,
                "member_id": 1,
                "member_name": "Alice",
                "start_date": "2026-02-02",
                "end_date": "2026-02-06"
            }
         })
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    engine: web::Data<Engine>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let request = engine
        .submit_leave(LeaveSubmission {
            member_id: auth.member_id,
            leave_type: payload.leave_type,
            day_type: payload.day_type,
            start_date: payload.start_date,
            end_date: payload.end_date,
            reason: payload.reason,
        })
        .await?;

    Ok(HttpResponse::Created().json(request))
}

/// List leave requests, newest first
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave requests", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    _auth: AuthUser,
    engine: web::Data<Engine>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let query = query.into_inner();
    let filter = RequestFilter {
        member_id: query.member_id,
        stream: query.stream,
        status: query.status,
        leave_type: query.leave_type,
        overlapping: None,
    };

    let data = engine.list_requests(&filter).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse {
        total: data.len(),
        data,
    }))
}

/// Review queue: pending requests, oldest first (Scrum Master)
#[utoipa::path(
    get,
    path = "/api/v1/leave/pending",
    responses(
        (status = 200, description = "Pending leave requests", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn pending_leaves(
    auth: AuthUser,
    engine: web::Data<Engine>,
) -> actix_web::Result<impl Responder> {
    auth.require_scrum_master()?;

    let data = engine.pending_queue().await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse {
        total: data.len(),
        data,
    }))
}

/// Fetch one leave request
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    _auth: AuthUser,
    engine: web::Data<Engine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = engine.get_request(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Approve a pending request (Scrum Master); balance and overlap are re-checked
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 403, description = "Scrum Master role required"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Not pending, insufficient balance or overlapping leave")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    engine: web::Data<Engine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = engine
        .approve_leave(path.into_inner(), auth.member_id)
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Reject a pending request (Scrum Master)
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(
        content = RejectLeave,
        description = "Optional; the body may be omitted",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 403, description = "Scrum Master role required"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    engine: web::Data<Engine>,
    path: web::Path<u64>,
    payload: Option<web::Json<RejectLeave>>,
) -> actix_web::Result<impl Responder> {
    let reason = payload.and_then(|p| p.into_inner().reason);
    let request = engine
        .reject_leave(path.into_inner(), auth.member_id, reason.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Approve bypassing balance and overlap checks (Scrum Master, reason required)
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/override",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve with override")
    ),
    request_body = OverrideLeave,
    responses(
        (status = 200, description = "Leave approved with override", body = LeaveRequest),
        (status = 400, description = "Override reason missing"),
        (status = 403, description = "Scrum Master role required"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn override_leave(
    auth: AuthUser,
    engine: web::Data<Engine>,
    path: web::Path<u64>,
    payload: web::Json<OverrideLeave>,
) -> actix_web::Result<impl Responder> {
    let request = engine
        .override_approve(path.into_inner(), auth.member_id, &payload.reason)
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Cancel (delete) the caller's own pending request
#[utoipa::path(
    post,
    path = "/api/v1/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave request cancelled", body = Object, example = json!({
            "message": "Leave request cancelled"
        })),
        (status = 403, description = "Not the requester"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Only pending requests can be cancelled")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    engine: web::Data<Engine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    engine
        .cancel_leave(path.into_inner(), auth.member_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request cancelled"
    })))
}
