use crate::config::Config;
use crate::model::role::MemberRole;
use crate::models::TokenType;
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

use super::jwt::verify_token;

/// Caller identity decoded from the bearer token. Handlers pass `member_id`
/// explicitly into the engine; nothing is kept in session state.
pub struct AuthUser {
    pub member_id: u64,
    pub email: String,
    pub role: MemberRole,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        if claims.token_type != TokenType::Access {
            return ready(Err(ErrorUnauthorized("Access token required")));
        }

        ready(Ok(AuthUser {
            member_id: claims.member_id,
            email: claims.sub,
            role: claims.role,
        }))
    }
}

impl AuthUser {
    pub fn require_scrum_master(&self) -> actix_web::Result<()> {
        if self.role.can_review() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Scrum Master only"))
        }
    }

    /// Members may read their own data; scrum masters may read anyone's.
    pub fn require_self_or_scrum_master(&self, member_id: u64) -> actix_web::Result<()> {
        if self.member_id == member_id || self.role.can_review() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Not your record"))
        }
    }
}
