use std::sync::Arc;

use chrono::{Duration, Utc};
use glint_shared::models::events::ReminderSentEvent;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::models::AppointmentStatus;
use crate::repository::{AppointmentRepository, ReminderSender, RepoError};

/// Time window for reminder candidates, in hours from now.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ReminderWindow {
    pub hours_min: i64,
    pub hours_max: i64,
}

impl Default for ReminderWindow {
    fn default() -> Self {
        Self {
            hours_min: 23,
            hours_max: 25,
        }
    }
}

/// Counts reported after a reminder sweep.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ReminderSummary {
    pub candidates: usize,
    pub sent: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Time-windowed batch job selecting upcoming appointments and handing
/// each to the notification collaborator. A send failure or missing
/// recipient is reported, never batch-fatal.
pub struct ReminderDispatcher {
    appointments: Arc<dyn AppointmentRepository>,
    sender: Arc<dyn ReminderSender>,
}

impl ReminderDispatcher {
    pub fn new(appointments: Arc<dyn AppointmentRepository>, sender: Arc<dyn ReminderSender>) -> Self {
        Self {
            appointments,
            sender,
        }
    }

    pub async fn run(
        &self,
        window: ReminderWindow,
        dry_run: bool,
    ) -> Result<ReminderSummary, RepoError> {
        let now = Utc::now();
        let from = now + Duration::hours(window.hours_min);
        let to = now + Duration::hours(window.hours_max);

        let candidates = self
            .appointments
            .list_in_window(
                from,
                to,
                &[AppointmentStatus::Confirmed, AppointmentStatus::Pending],
            )
            .await?;

        let mut summary = ReminderSummary {
            candidates: candidates.len(),
            ..Default::default()
        };

        for appointment in &candidates {
            if dry_run {
                warn!(
                    appointment_id = %appointment.id,
                    start_time = %appointment.start_time,
                    "[dry-run] would send booking reminder"
                );
                continue;
            }

            match self.sender.send_booking_reminder(appointment).await {
                Ok(true) => {
                    summary.sent += 1;
                    let event = ReminderSentEvent {
                        appointment_id: appointment.id,
                        timestamp: Utc::now().timestamp(),
                    };
                    info!(event = ?event, "Booking reminder sent");
                }
                Ok(false) => {
                    summary.skipped += 1;
                    warn!(
                        appointment_id = %appointment.id,
                        "No recipient for booking reminder, skipped"
                    );
                }
                Err(e) => {
                    summary.errors += 1;
                    error!(
                        appointment_id = %appointment.id,
                        "Failed to send booking reminder: {}",
                        e
                    );
                }
            }
        }

        info!(
            dry_run,
            candidates = summary.candidates,
            sent = summary.sent,
            skipped = summary.skipped,
            errors = summary.errors,
            "Reminder dispatch finished"
        );
        Ok(summary)
    }
}
