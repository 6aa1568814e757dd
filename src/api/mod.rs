use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::db::AppStore;
use crate::engine::{AdmissionController, LeaveError};

pub mod calendar;
pub mod leave_request;
pub mod member;

/// Engine as shared with the handlers through `web::Data`.
pub type Engine = AdmissionController<AppStore>;

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_) => StatusCode::BAD_REQUEST,
            LeaveError::InsufficientBalance { .. }
            | LeaveError::OverlapConflict(_)
            | LeaveError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            LeaveError::Unauthorized(_) => StatusCode::FORBIDDEN,
            LeaveError::NotFound { .. } => StatusCode::NOT_FOUND,
            LeaveError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
            LeaveError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            LeaveError::InsufficientBalance {
                leave_type,
                requested,
                current,
                shortfall,
            } => json!({
                "error": self.kind(),
                "message": self.to_string(),
                "leave_type": leave_type,
                "requested": requested,
                "current": current,
                "shortfall": shortfall,
            }),
            LeaveError::OverlapConflict(conflict) => json!({
                "error": self.kind(),
                "message": self.to_string(),
                "conflict": conflict,
            }),
            LeaveError::Store(e) => {
                tracing::error!(error = %e, "Store failure while handling request");
                json!({
                    "error": self.kind(),
                    "message": "Internal Server Error",
                })
            }
            _ => json!({
                "error": self.kind(),
                "message": self.to_string(),
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
