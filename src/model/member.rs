use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::leave_request::LeaveType;
use super::role::MemberRole;

pub const DEFAULT_ANNUAL_ENTITLEMENT: u32 = 22;
pub const DEFAULT_SICK_ENTITLEMENT: u32 = 10;

/// Office a member works from; decides which holidays apply.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum Location {
    #[serde(rename = "UAE")]
    #[strum(serialize = "UAE")]
    Uae,
    India,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 12,
        "name": "Gaurav Arora",
        "email": "arorag@example.com",
        "stream": "QA",
        "location": "India",
        "role": "member",
        "annual_entitlement": 22,
        "sick_entitlement": 10,
        "is_active": true
    })
)]
pub struct Member {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub stream: String,
    pub location: Location,
    pub role: MemberRole,
    pub annual_entitlement: u32,
    pub sick_entitlement: u32,
    pub is_active: bool,
}

impl Member {
    pub fn entitlement(&self, leave_type: LeaveType) -> u32 {
        match leave_type {
            LeaveType::Annual => self.annual_entitlement,
            LeaveType::Sick => self.sick_entitlement,
        }
    }
}

/// Member as handed to the store; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct NewMember {
    #[schema(example = "Gaurav Arora")]
    pub name: String,
    #[schema(example = "AroraG@example.com", format = "email")]
    pub email: String,
    #[schema(example = "QA")]
    pub stream: String,
    pub location: Location,
    #[serde(default)]
    pub role: MemberRole,
    /// Falls back to the configured default when omitted
    pub annual_entitlement: Option<u32>,
    /// Falls back to the configured default when omitted
    pub sick_entitlement: Option<u32>,
}

/// Emails are compared case-insensitively, so they are stored lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_round_trips_through_strings() {
        assert_eq!(Location::Uae.as_ref(), "UAE");
        assert_eq!("India".parse::<Location>(), Ok(Location::India));
        assert_eq!(
            serde_json::to_string(&Location::Uae).unwrap(),
            "\"UAE\""
        );
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  YadavT@Example.COM "), "yadavt@example.com");
    }
}
