use std::net::SocketAddr;
use std::sync::Arc;

use glint_api::{app, notify::WebhookReminderSender, state::AuthConfig, AppState};
use glint_store::{
    appointment_repo::PgAppointmentRepository,
    booking_repo::PgCustomerAppointmentRepository,
    change_request_repo::{PgChangeRequestRepository, PgSubscriptionAppointmentRepository},
    order_repo::PgOrderRepository,
    DbClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glint_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = glint_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Glint API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let app_state = AppState {
        appointments: Arc::new(PgAppointmentRepository::new(db.pool.clone())),
        orders: Arc::new(PgOrderRepository::new(db.pool.clone())),
        bookings: Arc::new(PgCustomerAppointmentRepository::new(db.pool.clone())),
        visits: Arc::new(PgSubscriptionAppointmentRepository::new(db.pool.clone())),
        change_requests: Arc::new(PgChangeRequestRepository::new(db.pool.clone())),
        reminder_sender: Arc::new(WebhookReminderSender::new(
            config.notify.webhook_url.clone(),
        )),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        policy: config.policy.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
