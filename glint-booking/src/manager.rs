use crate::models::{Appointment, AppointmentStatus, CompletionPhoto};
use crate::policy;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Manages appointment lifecycle and state transitions
pub struct AppointmentManager {
    appointments: HashMap<Uuid, Appointment>,
}

impl AppointmentManager {
    pub fn new() -> Self {
        Self {
            appointments: HashMap::new(),
        }
    }

    /// Register a newly scheduled appointment (order confirmation or
    /// subscription-visit generation).
    pub fn schedule(
        &mut self,
        service_id: Uuid,
        staff_id: Option<Uuid>,
        start_time: DateTime<Utc>,
    ) -> &Appointment {
        let appointment = Appointment::new(service_id, staff_id, start_time);
        let id = appointment.id;
        self.appointments.insert(id, appointment);
        &self.appointments[&id]
    }

    pub fn get(&self, id: &Uuid) -> Option<&Appointment> {
        self.appointments.get(id)
    }

    /// Transition: Pending → Confirmed
    pub fn confirm(&mut self, id: &Uuid) -> Result<(), AppointmentError> {
        let appointment = self.get_mut(id)?;

        if appointment.status != AppointmentStatus::Pending {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status.to_string(),
                to: "CONFIRMED".to_string(),
            });
        }

        appointment.update_status(AppointmentStatus::Confirmed);
        Ok(())
    }

    /// Transition: Confirmed → Completed (visit done)
    pub fn complete(&mut self, id: &Uuid) -> Result<(), AppointmentError> {
        let appointment = self.get_mut(id)?;

        if appointment.status != AppointmentStatus::Confirmed {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status.to_string(),
                to: "COMPLETED".to_string(),
            });
        }

        appointment.update_status(AppointmentStatus::Completed);
        Ok(())
    }

    /// Staff-side cancel (no policy gate): any status except Completed.
    pub fn cancel(&mut self, id: &Uuid) -> Result<(), AppointmentError> {
        let appointment = self.get_mut(id)?;

        if matches!(
            appointment.status,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        ) {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status.to_string(),
                to: "CANCELLED".to_string(),
            });
        }

        appointment.update_status(AppointmentStatus::Cancelled);
        Ok(())
    }

    /// Customer-side cancel: the cancellation policy is re-evaluated at
    /// call time. The stored snapshot on the booking record is never
    /// consulted here.
    pub fn cancel_within_policy(
        &mut self,
        id: &Uuid,
        policy_hours: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        let appointment = self.get_mut(id)?;

        let decision = policy::evaluate_at(appointment.start_time, policy_hours, now);
        if !decision.can_cancel {
            return Err(AppointmentError::PolicyWindowClosed {
                deadline: decision.cancellation_deadline.to_rfc3339(),
            });
        }

        if matches!(
            appointment.status,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        ) {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status.to_string(),
                to: "CANCELLED".to_string(),
            });
        }

        appointment.update_status(AppointmentStatus::Cancelled);
        Ok(())
    }

    /// Attach a completion photo to a completed visit.
    pub fn add_completion_photo(
        &mut self,
        id: &Uuid,
        photo: CompletionPhoto,
    ) -> Result<(), AppointmentError> {
        let appointment = self.get_mut(id)?;

        if appointment.status != AppointmentStatus::Completed {
            return Err(AppointmentError::NotCompleted(id.to_string()));
        }

        appointment.add_completion_photo(photo);
        Ok(())
    }

    fn get_mut(&mut self, id: &Uuid) -> Result<&mut Appointment, AppointmentError> {
        self.appointments
            .get_mut(id)
            .ok_or_else(|| AppointmentError::NotFound(id.to_string()))
    }
}

impl Default for AppointmentManager {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Cancellation window closed at {deadline}")]
    PolicyWindowClosed { deadline: String },

    #[error("Appointment not completed yet: {0}")]
    NotCompleted(String),
}
