use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use glint_booking::models::{Order, OrderItem, OrderStatus, PaymentStatus};
use glint_booking::repository::{OrderRepository, RepoError};

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, RepoError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT id, order_id, service_id, service_name, appointment_id, total_price_cents, created_at
            FROM order_items
            WHERE order_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItemRow::into_item).collect())
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_id: Option<Uuid>,
    status: String,
    payment_status: Option<String>,
    cancellation_policy_hours: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepoError> {
        let status: OrderStatus = self.status.parse()?;
        let payment_status = self
            .payment_status
            .as_deref()
            .map(str::parse::<PaymentStatus>)
            .transpose()?;
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            customer_id: self.customer_id,
            status,
            payment_status,
            cancellation_policy_hours: self.cancellation_policy_hours,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    service_id: Uuid,
    service_name: String,
    appointment_id: Option<Uuid>,
    total_price_cents: i64,
    created_at: DateTime<Utc>,
}

impl OrderItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            id: self.id,
            order_id: self.order_id,
            service_id: self.service_id,
            service_name: self.service_name,
            appointment_id: self.appointment_id,
            total_price_cents: self.total_price_cents,
            created_at: self.created_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, customer_id, status, payment_status, cancellation_policy_hours, created_at, updated_at";

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_order(&self, order: &Order) -> Result<Uuid, RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, customer_id, status, payment_status, cancellation_policy_hours, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.customer_id)
        .bind(order.status.as_str())
        .bind(order.payment_status.map(|p| p.as_str()))
        .bind(order.cancellation_policy_hours)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, service_id, service_name, appointment_id, total_price_cents, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id)
            .bind(order.id)
            .bind(item.service_id)
            .bind(&item.service_name)
            .bind(item.appointment_id)
            .bind(item.total_price_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order.id)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.load_items(row.id).await?;
                Ok(Some(row.into_order(items)?))
            }
            None => Ok(None),
        }
    }

    async fn list_confirmed_orders(&self) -> Result<Vec<Order>, RepoError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE status = 'CONFIRMED' ORDER BY created_at",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.load_items(row.id).await?;
            orders.push(row.into_order(items)?);
        }
        Ok(orders)
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<(), RepoError> {
        sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
