//! Reminder job: notifies customers about appointments starting within
//! the configured window. Per-appointment send failures are logged and
//! counted without changing the exit status.
//!
//! Usage: send-reminders [--dry-run] [--hours-min N] [--hours-max N]

use std::sync::Arc;

use glint_api::notify::WebhookReminderSender;
use glint_booking::{ReminderDispatcher, ReminderWindow};
use glint_store::{appointment_repo::PgAppointmentRepository, DbClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct Args {
    dry_run: bool,
    hours_min: Option<i64>,
    hours_max: Option<i64>,
}

fn parse_args() -> Args {
    let mut args = Args {
        dry_run: false,
        hours_min: None,
        hours_max: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dry-run" => args.dry_run = true,
            "--hours-min" => {
                let value = iter.next().expect("--hours-min requires a value");
                args.hours_min = Some(value.parse().expect("--hours-min must be an integer"));
            }
            "--hours-max" => {
                let value = iter.next().expect("--hours-max requires a value");
                args.hours_max = Some(value.parse().expect("--hours-max must be an integer"));
            }
            other => panic!("Unknown argument: {}", other),
        }
    }
    args
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "send_reminders=info,glint_booking=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args();

    let config = glint_store::app_config::Config::load().expect("Failed to load config");
    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");

    let window = ReminderWindow {
        hours_min: args.hours_min.unwrap_or(config.policy.reminder_hours_min),
        hours_max: args.hours_max.unwrap_or(config.policy.reminder_hours_max),
    };

    let dispatcher = ReminderDispatcher::new(
        Arc::new(PgAppointmentRepository::new(db.pool.clone())),
        Arc::new(WebhookReminderSender::new(config.notify.webhook_url.clone())),
    );

    let summary = dispatcher
        .run(window, args.dry_run)
        .await
        .expect("Reminder sweep failed to start");

    let label = if args.dry_run { " (dry run)" } else { "" };
    println!("Reminder dispatch summary{}:", label);
    println!("  candidates: {}", summary.candidates);
    println!("  sent:       {}", summary.sent);
    println!("  skipped:    {}", summary.skipped);
    println!("  errors:     {}", summary.errors);
}
