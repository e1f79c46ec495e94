pub mod models;
pub mod policy;
pub mod repository;
pub mod manager;
pub mod reconciler;
pub mod reminders;

pub use models::{
    Appointment, AppointmentStatus, CompletionPhoto, CustomerAppointment, Order, OrderItem,
    OrderStatus, PaymentStatus,
};
pub use policy::PolicyDecision;
pub use reconciler::{BookingReconciler, ReconcileSummary};
pub use reminders::{ReminderDispatcher, ReminderSummary, ReminderWindow};
