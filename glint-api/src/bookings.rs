use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use glint_booking::models::{AppointmentStatus, CustomerAppointment};
use glint_booking::repository::{AppointmentRepository, CustomerAppointmentRepository};
use glint_shared::models::events::BookingCancelledEvent;
use serde::Serialize;
use uuid::Uuid;

use crate::{error::AppError, middleware::auth::Claims, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_my_bookings))
        .route("/bookings/{id}/cancel", post(cancel_booking))
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    id: Uuid,
    appointment_id: Uuid,
    start_time: Option<DateTime<Utc>>,
    appointment_status: Option<AppointmentStatus>,
    number_of_persons: i32,
    total_price_cents: i64,
    payment_status: String,
    cancellation_policy_hours: i32,
    can_cancel: bool,
    can_reschedule: bool,
    cancellation_deadline: DateTime<Utc>,
}

fn customer_id(claims: &Claims) -> Result<Uuid, AppError> {
    Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthenticationError("Malformed subject claim".to_string()))
}

/// The policy triple is recomputed against the current clock for every
/// booking returned; the stored snapshot is never served as-is.
async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let customer_id = customer_id(&claims)?;
    let bookings = state.bookings.list_for_customer(customer_id).await?;

    let now = Utc::now();
    let mut responses = Vec::with_capacity(bookings.len());
    for mut booking in bookings {
        let appointment = state.appointments.get_appointment(booking.appointment_id).await?;
        if let Some(ref appointment) = appointment {
            booking.refresh_policy(appointment.start_time, now);
        }
        responses.push(to_response(booking, appointment.map(|a| (a.start_time, a.status))));
    }

    Ok(Json(responses))
}

fn to_response(
    booking: CustomerAppointment,
    appointment: Option<(DateTime<Utc>, AppointmentStatus)>,
) -> BookingResponse {
    BookingResponse {
        id: booking.id,
        appointment_id: booking.appointment_id,
        start_time: appointment.map(|(start, _)| start),
        appointment_status: appointment.map(|(_, status)| status),
        number_of_persons: booking.number_of_persons,
        total_price_cents: booking.total_price_cents,
        payment_status: booking.payment_status.as_str().to_string(),
        cancellation_policy_hours: booking.cancellation_policy_hours,
        can_cancel: booking.can_cancel,
        can_reschedule: booking.can_reschedule,
        cancellation_deadline: booking.cancellation_deadline,
    }
}

#[derive(Debug, Serialize)]
struct CancelResponse {
    id: Uuid,
    appointment_id: Uuid,
    cancelled: bool,
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelResponse>, AppError> {
    let customer_id = customer_id(&claims)?;

    let booking = state
        .bookings
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Booking {} not found", id)))?;

    if booking.customer_id != customer_id {
        return Err(AppError::AuthorizationError(
            "Booking belongs to another customer".to_string(),
        ));
    }

    let appointment = state
        .appointments
        .get_appointment(booking.appointment_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFoundError(format!("Appointment {} not found", booking.appointment_id))
        })?;

    // Gate on a fresh evaluation, not the stored snapshot.
    let now = Utc::now();
    let decision = booking.current_policy(appointment.start_time, now);
    if !decision.can_cancel {
        return Err(AppError::ConflictError(format!(
            "Cancellation window closed at {}",
            decision.cancellation_deadline.to_rfc3339()
        )));
    }

    state
        .appointments
        .update_status(booking.appointment_id, AppointmentStatus::Cancelled)
        .await?;
    state.bookings.update_policy_snapshot(booking.id, &decision).await?;

    let event = BookingCancelledEvent {
        customer_appointment_id: booking.id,
        appointment_id: booking.appointment_id,
        customer_id,
        timestamp: now.timestamp(),
    };
    tracing::info!(event = ?event, "Booking cancelled");

    Ok(Json(CancelResponse {
        id: booking.id,
        appointment_id: booking.appointment_id,
        cancelled: true,
    }))
}
