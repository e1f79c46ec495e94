//! Backfill job: creates missing customer booking records for confirmed
//! orders. Safe to re-run; per-item errors are logged and counted without
//! changing the exit status.
//!
//! Usage: reconcile-bookings [--dry-run]

use std::sync::Arc;

use glint_booking::BookingReconciler;
use glint_store::{
    appointment_repo::PgAppointmentRepository, booking_repo::PgCustomerAppointmentRepository,
    order_repo::PgOrderRepository, DbClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reconcile_bookings=info,glint_booking=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let dry_run = std::env::args().any(|arg| arg == "--dry-run");

    let config = glint_store::app_config::Config::load().expect("Failed to load config");
    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");

    let reconciler = BookingReconciler::new(
        Arc::new(PgOrderRepository::new(db.pool.clone())),
        Arc::new(PgAppointmentRepository::new(db.pool.clone())),
        Arc::new(PgCustomerAppointmentRepository::new(db.pool.clone())),
    );

    let summary = reconciler
        .run(dry_run)
        .await
        .expect("Reconciliation sweep failed to start");

    let label = if dry_run { " (dry run)" } else { "" };
    println!("Booking reconciliation summary{}:", label);
    println!("  created:             {}", summary.created);
    println!("  skipped_no_customer: {}", summary.skipped_no_customer);
    println!("  skipped_has_booking: {}", summary.skipped_has_booking);
    println!("  errors:              {}", summary.errors);
}
