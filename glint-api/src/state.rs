use std::sync::Arc;

use glint_booking::repository::{
    AppointmentRepository, CustomerAppointmentRepository, OrderRepository, ReminderSender,
};
use glint_store::app_config::PolicyConfig;
use glint_subscription::repository::{ChangeRequestRepository, SubscriptionAppointmentRepository};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub appointments: Arc<dyn AppointmentRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub bookings: Arc<dyn CustomerAppointmentRepository>,
    pub visits: Arc<dyn SubscriptionAppointmentRepository>,
    pub change_requests: Arc<dyn ChangeRequestRepository>,
    pub reminder_sender: Arc<dyn ReminderSender>,
    pub auth: AuthConfig,
    pub policy: PolicyConfig,
}
