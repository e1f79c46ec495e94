use axum::{
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use glint_booking::policy;
use glint_shared::models::events::ChangeRequestReviewedEvent;
use glint_subscription::change_requests::ReviewDecision;
use glint_subscription::models::{ChangeRequest, ChangeRequestStatus};
use glint_subscription::repository::{ChangeRequestRepository, SubscriptionAppointmentRepository};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::{customer_auth_middleware, manager_auth_middleware, Claims},
    state::AppState,
};

pub fn routes(state: AppState) -> Router<AppState> {
    let customer = Router::new()
        .route(
            "/subscription-appointments/{id}/change-requests",
            post(create_change_request).get(list_change_requests),
        )
        .route_layer(from_fn_with_state(state.clone(), customer_auth_middleware));

    let manager = Router::new()
        .route("/change-requests/{id}/review", post(review_change_request))
        .route_layer(from_fn_with_state(state, manager_auth_middleware));

    customer.merge(manager)
}

#[derive(Debug, Deserialize)]
struct CreateChangeRequestBody {
    requested_date: NaiveDate,
    requested_time: Option<NaiveTime>,
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChangeRequestResponse {
    id: Uuid,
    subscription_appointment_id: Uuid,
    requested_date: NaiveDate,
    requested_time: Option<NaiveTime>,
    reason: Option<String>,
    status: ChangeRequestStatus,
    reviewed_at: Option<DateTime<Utc>>,
    reviewed_by: Option<Uuid>,
    review_notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ChangeRequest> for ChangeRequestResponse {
    fn from(request: ChangeRequest) -> Self {
        Self {
            id: request.id,
            subscription_appointment_id: request.subscription_appointment_id,
            requested_date: request.requested_date,
            requested_time: request.requested_time,
            reason: request.reason,
            status: request.status,
            reviewed_at: request.reviewed_at,
            reviewed_by: request.reviewed_by,
            review_notes: request.review_notes,
            created_at: request.created_at,
        }
    }
}

async fn create_change_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateChangeRequestBody>,
) -> Result<Json<ChangeRequestResponse>, AppError> {
    state
        .visits
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Subscription appointment {} not found", id)))?;

    let request = ChangeRequest::new(id, body.requested_date, body.requested_time, body.reason);
    state.change_requests.create(&request).await?;

    Ok(Json(request.into()))
}

async fn list_change_requests(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChangeRequestResponse>>, AppError> {
    let requests = state
        .change_requests
        .list_for_subscription_appointment(id)
        .await?;

    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

#[derive(Debug, Deserialize)]
struct ReviewBody {
    decision: ReviewDecision,
    notes: Option<String>,
}

async fn review_change_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<ChangeRequestResponse>, AppError> {
    let reviewer = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthenticationError("Malformed subject claim".to_string()))?;

    let mut request = state
        .change_requests
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Change request {} not found", id)))?;

    // Reviews are terminal; there is no re-opening.
    if request.is_reviewed() {
        return Err(AppError::ConflictError(format!(
            "Change request already reviewed ({})",
            request.status
        )));
    }

    let now = Utc::now();
    request.status = body.decision.as_status();
    request.reviewed_at = Some(now);
    request.reviewed_by = Some(reviewer);
    request.review_notes = body.notes;

    // Storage re-checks the pending status; a concurrent review that won
    // the race surfaces here rather than being overwritten.
    if !state.change_requests.record_review(&request).await? {
        return Err(AppError::ConflictError(format!(
            "Change request {} already reviewed",
            request.id
        )));
    }

    // Approval moves the underlying visit to the requested slot.
    if body.decision == ReviewDecision::Approved {
        if let Some(visit) = state.visits.get(request.subscription_appointment_id).await? {
            let time = request.requested_time.unwrap_or_else(|| visit.scheduled_for.time());
            let new_start = policy::resolve_start_time(request.requested_date.and_time(time));
            state
                .visits
                .update_schedule(visit.id, new_start)
                .await?;
        }
    }

    let event = ChangeRequestReviewedEvent {
        change_request_id: request.id,
        subscription_appointment_id: request.subscription_appointment_id,
        decision: request.status.to_string(),
        reviewed_by: request.reviewed_by,
        timestamp: now.timestamp(),
    };
    tracing::info!(event = ?event, "Change request reviewed");

    Ok(Json(request.into()))
}
