use async_trait::async_trait;
use glint_booking::models::Appointment;
use glint_booking::repository::{ReminderSender, RepoError};
use serde_json::json;

/// Delivers booking reminders by posting to the configured notification
/// webhook. With no webhook configured, every send reports "no recipient".
pub struct WebhookReminderSender {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl WebhookReminderSender {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }
}

#[async_trait]
impl ReminderSender for WebhookReminderSender {
    async fn send_booking_reminder(&self, appointment: &Appointment) -> Result<bool, RepoError> {
        let Some(url) = self.webhook_url.as_deref() else {
            return Ok(false);
        };

        let payload = json!({
            "type": "booking_reminder",
            "appointment_id": appointment.id,
            "service_id": appointment.service_id,
            "start_time": appointment.start_time.to_rfc3339(),
        });

        let response = self.client.post(url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(format!("Webhook returned {}", response.status()).into());
        }
        Ok(true)
    }
}
