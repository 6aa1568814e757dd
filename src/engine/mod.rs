//! Leave admission and lifecycle engine.

pub mod admission;
pub mod balance;
pub mod calendar;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod overlap;
pub mod working_days;

pub use admission::{AdmissionController, AdmissionPolicy, AdmissionSettings, LeaveSubmission};
pub use balance::{BalanceCheck, MemberBalances};
pub use calendar::HolidayCalendar;
pub use error::{Conflict, LeaveError, Transition};
pub use events::{DecisionEvent, DecisionSubscriber, SubscriberError, TracingSubscriber};
