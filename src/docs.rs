use crate::api::calendar::{
    HolidayListResponse, OverlapQuery, OverlapResponse, WorkingDaysQuery, WorkingDaysResponse,
};
use crate::api::leave_request::{
    CreateLeave, LeaveFilter, LeaveListResponse, OverrideLeave, RejectLeave,
};
use crate::engine::MemberBalances;
use crate::model::holiday::{HolidayEntry, HolidayScope, NewHoliday};
use crate::model::leave_request::{DayType, LeaveRequest, LeaveStatus, LeaveType};
use crate::model::member::{Location, Member, NewMember};
use crate::model::role::MemberRole;
use crate::models::{LoginReqDto, LoginResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Tracker API",
        version = "1.0.0",
        description = r#"
## Team Leave Tracker

Admission and lifecycle engine for team leave requests.

### 🔹 Key Features
- **Leave Requests**
  - Submit annual, sick or half-day leave; balance and stream overlap are checked before a request is stored
  - Approve, reject or override-approve pending requests (Scrum Master)
  - Cancel your own pending requests
- **Balances**
  - Remaining annual and sick days derived from approved leave
- **Calendar**
  - Working days per office location, excluding weekends and public holidays

### 🔐 Security
Endpoints under the API prefix require a **JWT Bearer** access token from `/auth/login`.

### 📦 Errors
Refusals carry a machine-readable `error` field: `validation`, `insufficient_balance`,
`overlap_conflict`, `invalid_state_transition`, `unauthorized`, `not_found` or `busy`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::pending_leaves,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::override_leave,
        crate::api::leave_request::cancel_leave,

        crate::api::member::register_member,
        crate::api::member::get_member,
        crate::api::member::member_balance,

        crate::api::calendar::working_days,
        crate::api::calendar::check_overlap,
        crate::api::calendar::list_holidays,
        crate::api::calendar::add_holiday
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            CreateLeave,
            RejectLeave,
            OverrideLeave,
            LeaveFilter,
            LeaveListResponse,
            LeaveRequest,
            LeaveType,
            LeaveStatus,
            DayType,
            Member,
            NewMember,
            MemberRole,
            Location,
            MemberBalances,
            HolidayEntry,
            HolidayListResponse,
            HolidayScope,
            NewHoliday,
            WorkingDaysQuery,
            WorkingDaysResponse,
            OverlapQuery,
            OverlapResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Token issue and refresh"),
        (name = "Leave", description = "Leave submission and review APIs"),
        (name = "Members", description = "Team members and balances"),
        (name = "Calendar", description = "Working days, holidays and overlap checks"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
