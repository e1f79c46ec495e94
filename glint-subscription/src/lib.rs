pub mod models;
pub mod change_requests;
pub mod repository;
pub mod schedule;

pub use change_requests::{ChangeRequestError, ChangeRequestWorkflow, ReviewDecision};
pub use models::{ChangeRequest, ChangeRequestStatus, SubscriptionAppointment};
pub use schedule::Frequency;
