use axum::{
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::post,
    Json, Router,
};
use glint_booking::{BookingReconciler, ReminderDispatcher, ReminderWindow};
use glint_subscription::repository::ChangeRequestRepository;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, middleware::auth::admin_auth_middleware, state::AppState};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/reconcile-bookings", post(reconcile_bookings))
        .route("/admin/reminders/dispatch", post(dispatch_reminders))
        .route("/admin/reviewers/{id}/detach", post(detach_reviewer))
        .route_layer(from_fn_with_state(state, admin_auth_middleware))
}

#[derive(Debug, Default, Deserialize)]
struct ReconcileBody {
    #[serde(default)]
    dry_run: bool,
}

async fn reconcile_bookings(
    State(state): State<AppState>,
    Json(body): Json<ReconcileBody>,
) -> Result<Json<glint_booking::ReconcileSummary>, AppError> {
    let reconciler = BookingReconciler::new(
        state.orders.clone(),
        state.appointments.clone(),
        state.bookings.clone(),
    );
    let summary = reconciler.run(body.dry_run).await?;

    Ok(Json(summary))
}

#[derive(Debug, Default, Deserialize)]
struct DispatchBody {
    #[serde(default)]
    dry_run: bool,
    hours_min: Option<i64>,
    hours_max: Option<i64>,
}

async fn dispatch_reminders(
    State(state): State<AppState>,
    Json(body): Json<DispatchBody>,
) -> Result<Json<glint_booking::ReminderSummary>, AppError> {
    let window = ReminderWindow {
        hours_min: body.hours_min.unwrap_or(state.policy.reminder_hours_min),
        hours_max: body.hours_max.unwrap_or(state.policy.reminder_hours_max),
    };
    let dispatcher =
        ReminderDispatcher::new(state.appointments.clone(), state.reminder_sender.clone());
    let summary = dispatcher.run(window, body.dry_run).await?;

    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
struct DetachResponse {
    detached: u64,
}

/// Explicit administrative command run when a reviewer account is removed:
/// clears their reference on stamped reviews without touching the reviews.
async fn detach_reviewer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DetachResponse>, AppError> {
    let detached = state.change_requests.detach_reviewer(id).await?;
    Ok(Json(DetachResponse { detached }))
}
