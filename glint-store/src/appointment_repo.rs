use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use glint_booking::models::{Appointment, AppointmentStatus, CompletionPhoto};
use glint_booking::repository::{AppointmentRepository, RepoError};

pub struct PgAppointmentRepository {
    pool: PgPool,
}

impl PgAppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AppointmentRow {
    id: Uuid,
    service_id: Uuid,
    staff_id: Option<Uuid>,
    start_time: DateTime<Utc>,
    status: String,
    completion_photos: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AppointmentRow {
    fn into_appointment(self) -> Result<Appointment, RepoError> {
        let status: AppointmentStatus = self.status.parse()?;
        let completion_photos: Vec<CompletionPhoto> =
            serde_json::from_value(self.completion_photos)?;
        Ok(Appointment {
            id: self.id,
            service_id: self.service_id,
            staff_id: self.staff_id,
            start_time: self.start_time,
            status,
            completion_photos,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const APPOINTMENT_COLUMNS: &str =
    "id, service_id, staff_id, start_time, status, completion_photos, created_at, updated_at";

#[async_trait]
impl AppointmentRepository for PgAppointmentRepository {
    async fn create_appointment(&self, appointment: &Appointment) -> Result<Uuid, RepoError> {
        sqlx::query(
            r#"
            INSERT INTO appointments (id, service_id, staff_id, start_time, status, completion_photos, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(appointment.id)
        .bind(appointment.service_id)
        .bind(appointment.staff_id)
        .bind(appointment.start_time)
        .bind(appointment.status.as_str())
        .bind(serde_json::to_value(&appointment.completion_photos)?)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(appointment.id)
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, RepoError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {} FROM appointments WHERE id = $1",
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AppointmentRow::into_appointment).transpose()
    }

    async fn list_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, RepoError> {
        let status_values: Vec<String> =
            statuses.iter().map(|s| s.as_str().to_string()).collect();

        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE start_time >= $1 AND start_time <= $2 AND status = ANY($3)
            ORDER BY start_time
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(from)
        .bind(to)
        .bind(&status_values)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(AppointmentRow::into_appointment)
            .collect()
    }

    async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Result<(), RepoError> {
        sqlx::query("UPDATE appointments SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_completion_photo(
        &self,
        id: Uuid,
        photo: &CompletionPhoto,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE appointments
            SET completion_photos = completion_photos || $1::jsonb, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(serde_json::to_value(photo)?)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
