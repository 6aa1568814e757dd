pub mod holiday;
pub mod leave_request;
pub mod member;
pub mod role;
