use crate::{
    api::Engine,
    auth::jwt::{generate_access_token, generate_refresh_token, verify_token},
    config::Config,
    model::member::Member,
    models::{LoginReqDto, LoginResponse, TokenType},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{debug, error, info, instrument};

fn issue_tokens(member: &Member, config: &Config) -> HttpResponse {
    let access_token =
        match generate_access_token(member, &config.jwt_secret, config.access_token_ttl) {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Failed to sign access token");
                return HttpResponse::InternalServerError().finish();
            }
        };

    let (refresh_token, refresh_claims) =
        match generate_refresh_token(member, &config.jwt_secret, config.refresh_token_ttl) {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, "Failed to sign refresh token");
                return HttpResponse::InternalServerError().finish();
            }
        };
    debug!(member_id = member.id, jti = %refresh_claims.jti, "Issued token pair");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
    })
}

/// Login by email; only active members get tokens.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Token pair issued", body = LoginResponse),
        (status = 400, description = "Email missing"),
        (status = 401, description = "Unknown or inactive member")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(engine, config, payload))]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    engine: web::Data<Engine>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if payload.email.trim().is_empty() {
        info!("Validation failed: empty email");
        return HttpResponse::BadRequest().body("Email required");
    }

    let member = match engine.member_by_email(&payload.email).await {
        Ok(Some(member)) if member.is_active => member,
        Ok(_) => {
            info!("Invalid credentials: unknown or inactive member");
            return HttpResponse::Unauthorized().body("Email not found or account inactive");
        }
        Err(e) => {
            error!(error = %e, "Store error while fetching member");
            return HttpResponse::InternalServerError().finish();
        }
    };

    info!(member_id = member.id, "Login successful");
    issue_tokens(&member, config.get_ref())
}

/// Swap a refresh token for a fresh pair.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Token pair issued", body = LoginResponse),
        (status = 401, description = "Missing, invalid or non-refresh token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    engine: web::Data<Engine>,
    config: web::Data<Config>,
) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::Unauthorized().body("No token"),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().body("Invalid token"),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    // role or active flag may have changed since the last login
    let member = match engine.find_member(claims.member_id).await {
        Ok(Some(member)) if member.is_active => member,
        Ok(_) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            error!(error = %e, "Store error while refreshing token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    issue_tokens(&member, config.get_ref())
}
