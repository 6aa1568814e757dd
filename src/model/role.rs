use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MemberRole {
    Member,
    ScrumMaster,
}

impl MemberRole {
    /// Scrum masters review (approve, reject, override) leave requests.
    pub fn can_review(&self) -> bool {
        *self == MemberRole::ScrumMaster
    }
}

impl Default for MemberRole {
    fn default() -> Self {
        MemberRole::Member
    }
}
