use crate::api::Engine;
use crate::auth::auth::AuthUser;
use crate::engine::Conflict;
use crate::model::holiday::{HolidayEntry, NewHoliday};
use crate::model::member::Location;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct WorkingDaysQuery {
    #[schema(example = "2026-02-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub location: Location,
}

#[derive(Deserialize, IntoParams)]
pub struct HolidayQuery {
    /// Office location; `Both` entries are always included
    #[param(value_type = String, example = "UAE")]
    pub location: Location,
}

#[derive(Serialize, ToSchema)]
pub struct HolidayListResponse {
    pub data: Vec<HolidayEntry>,
    #[schema(example = 1)]
    pub total: usize,
}

#[derive(Serialize, ToSchema)]
pub struct WorkingDaysResponse {
    #[schema(example = 5)]
    pub working_days: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct OverlapQuery {
    /// Defaults to the caller
    #[schema(example = 12)]
    pub member_id: Option<u64>,
    #[schema(example = "2026-02-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-10", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct OverlapResponse {
    pub has_conflict: bool,
    #[schema(value_type = Option<Object>)]
    pub conflict: Option<Conflict>,
}

/// Working days in a range for one office location; an inverted range counts 0
#[utoipa::path(
    post,
    path = "/api/v1/calendar/working-days",
    request_body = WorkingDaysQuery,
    responses(
        (status = 200, description = "Working day count", body = WorkingDaysResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Calendar"
)]
pub async fn working_days(
    _auth: AuthUser,
    engine: web::Data<Engine>,
    payload: web::Json<WorkingDaysQuery>,
) -> actix_web::Result<impl Responder> {
    let working_days = engine
        .compute_working_days(payload.start_date, payload.end_date, payload.location)
        .await?;
    Ok(HttpResponse::Ok().json(WorkingDaysResponse { working_days }))
}

/// Advisory check for approved leave in the member's stream
#[utoipa::path(
    post,
    path = "/api/v1/calendar/check-overlap",
    request_body = OverlapQuery,
    responses(
        (status = 200, description = "Overlap result", body = OverlapResponse),
        (status = 400, description = "start_date after end_date"),
        (status = 403, description = "Not your record"),
        (status = 404, description = "Member not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Calendar"
)]
pub async fn check_overlap(
    auth: AuthUser,
    engine: web::Data<Engine>,
    payload: web::Json<OverlapQuery>,
) -> actix_web::Result<impl Responder> {
    let member_id = payload.member_id.unwrap_or(auth.member_id);
    auth.require_self_or_scrum_master(member_id)?;

    let conflict = engine
        .check_overlap(member_id, payload.start_date, payload.end_date)
        .await?;
    Ok(HttpResponse::Ok().json(OverlapResponse {
        has_conflict: conflict.is_some(),
        conflict,
    }))
}

/// Public holidays observed at one office location
#[utoipa::path(
    get,
    path = "/api/v1/calendar/holidays",
    params(HolidayQuery),
    responses(
        (status = 200, description = "Holidays ordered by date", body = HolidayListResponse),
        (status = 400, description = "Unknown location"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Calendar"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    engine: web::Data<Engine>,
    query: web::Query<HolidayQuery>,
) -> actix_web::Result<impl Responder> {
    let data = engine.holidays(query.location).await?;
    Ok(HttpResponse::Ok().json(HolidayListResponse {
        total: data.len(),
        data,
    }))
}

/// Add a public holiday (Scrum Master)
#[utoipa::path(
    post,
    path = "/api/v1/calendar/holidays",
    request_body = NewHoliday,
    responses(
        (status = 201, description = "Holiday added", body = HolidayEntry),
        (status = 400, description = "Missing name or holiday already exists"),
        (status = 403, description = "Scrum Master role required")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Calendar"
)]
pub async fn add_holiday(
    auth: AuthUser,
    engine: web::Data<Engine>,
    payload: web::Json<NewHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require_scrum_master()?;

    let holiday = engine.add_holiday(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(holiday))
}
