use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::MemberRole;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "arorag@example.com", format = "email")]
    pub email: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub member_id: u64,
    /// member email
    pub sub: String,
    pub role: MemberRole,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
