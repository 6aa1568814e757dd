use crate::api::Engine;
use crate::auth::auth::AuthUser;
use crate::engine::MemberBalances;
use crate::model::member::{Member, NewMember};
use actix_web::{HttpResponse, Responder, web};
use tracing::info;

/// Register a team member (Scrum Master)
#[utoipa::path(
    post,
    path = "/api/v1/members",
    request_body(
        content = NewMember,
        description = "Member payload; entitlements fall back to the configured defaults",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Member registered", body = Member),
        (status = 400, description = "Missing fields or email already registered"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Scrum Master role required")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Members"
)]
pub async fn register_member(
    auth: AuthUser,
    engine: web::Data<Engine>,
    payload: web::Json<NewMember>,
) -> actix_web::Result<impl Responder> {
    auth.require_scrum_master()?;

    let member = engine.register_member(payload.into_inner()).await?;
    info!(member_id = member.id, registered_by = auth.member_id, "Member created");
    Ok(HttpResponse::Created().json(member))
}

/// Fetch one member
#[utoipa::path(
    get,
    path = "/api/v1/members/{member_id}",
    params(
        ("member_id" = u64, Path, description = "ID of the member to fetch")
    ),
    responses(
        (status = 200, description = "Member found", body = Member),
        (status = 403, description = "Not your record"),
        (status = 404, description = "Member not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Members"
)]
pub async fn get_member(
    auth: AuthUser,
    engine: web::Data<Engine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let member_id = path.into_inner();
    auth.require_self_or_scrum_master(member_id)?;

    match engine.find_member(member_id).await? {
        Some(member) => Ok(HttpResponse::Ok().json(member)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "not_found",
            "message": format!("member {member_id} not found")
        }))),
    }
}

/// Current annual and sick balances of a member
#[utoipa::path(
    get,
    path = "/api/v1/members/{member_id}/balance",
    params(
        ("member_id" = u64, Path, description = "ID of the member")
    ),
    responses(
        (status = 200, description = "Remaining balances", body = MemberBalances),
        (status = 403, description = "Not your record"),
        (status = 404, description = "Member not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Members"
)]
pub async fn member_balance(
    auth: AuthUser,
    engine: web::Data<Engine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let member_id = path.into_inner();
    auth.require_self_or_scrum_master(member_id)?;

    let balances = engine.member_balances(member_id).await?;
    Ok(HttpResponse::Ok().json(balances))
}
