use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rental_types::domain::actor::{Actor, ActorRole};
use rental_types::domain::booking::{Booking, BookingId, BookingStatus, TimeSlot};
use rental_types::domain::cancellation::Cancellation;
use rental_types::domain::feedback::{Feedback, ServiceQuality};
use rental_types::domain::order::{Order, OrderId, OrderStatus};
use rental_types::ports::repository::{
    BookingRepository, FeedbackRepository, OrderRepository, RepoError,
};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

const MIGRATIONS: [&str; 3] = [
    include_str!("../migrations/0001_create_bookings.sql"),
    include_str!("../migrations/0002_create_orders.sql"),
    include_str!("../migrations/0003_create_feedback.sql"),
];

const BOOKING_COLUMNS: &str = "id, status, booking_date, slot_start, slot_end, service_type, \
     provider_ref, customer_ref, created_at, updated_at, version, canceled_by, \
     canceled_account_id, canceled_at, cancel_reason";

const ORDER_COLUMNS: &str = "id, listing_ref, owner_ref, customer_ref, payment_method, status, \
     created_at, updated_at, version, canceled_by, canceled_account_id, canceled_at, cancel_reason";

pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

fn parse_cancellation(
    canceled_by: Option<String>,
    canceled_account_id: Option<String>,
    canceled_at: Option<String>,
    cancel_reason: Option<String>,
    fallback_at: DateTime<Utc>,
) -> Result<Option<Cancellation>, RepoError> {
    match (canceled_by, canceled_account_id) {
        (Some(canceled_by), Some(canceled_account_id)) => {
            let canceled_at = match canceled_at {
                Some(raw) => parse_ts(&raw)?,
                None => fallback_at,
            };
            Ok(Some(Cancellation {
                canceled_by,
                canceled_account_id,
                canceled_at,
                reason: cancel_reason,
            }))
        }
        _ => Ok(None),
    }
}

type CancellationColumns = (Option<String>, Option<String>, Option<String>, Option<String>);

fn cancellation_columns(c: &Option<Cancellation>) -> CancellationColumns {
    match c {
        Some(c) => (
            Some(c.canceled_by.clone()),
            Some(c.canceled_account_id.clone()),
            Some(c.canceled_at.to_rfc3339()),
            c.reason.clone(),
        ),
        None => (None, None, None, None),
    }
}

#[derive(FromRow)]
struct DbBooking {
    id: String,
    status: String,
    booking_date: Option<String>,
    slot_start: String,
    slot_end: String,
    service_type: String,
    provider_ref: String,
    customer_ref: String,
    created_at: String,
    updated_at: String,
    version: i64,
    canceled_by: Option<String>,
    canceled_account_id: Option<String>,
    canceled_at: Option<String>,
    cancel_reason: Option<String>,
}

impl DbBooking {
    fn into_booking(self) -> Result<Booking, RepoError> {
        let status = BookingStatus::from_str(&self.status).map_err(db_err)?;
        let booking_date = self
            .booking_date
            .map(|d| NaiveDate::from_str(&d))
            .transpose()
            .map_err(db_err)?;
        let start = NaiveTime::from_str(&self.slot_start).map_err(db_err)?;
        let end = NaiveTime::from_str(&self.slot_end).map_err(db_err)?;
        let time_slot = TimeSlot::new(start, end).map_err(db_err)?;
        let created_at = parse_ts(&self.created_at)?;
        let updated_at = parse_ts(&self.updated_at)?;
        let cancellation = parse_cancellation(
            self.canceled_by,
            self.canceled_account_id,
            self.canceled_at,
            self.cancel_reason,
            updated_at,
        )?;
        if status == BookingStatus::Cancelled && cancellation.is_none() {
            return Err(RepoError::DbError(format!(
                "booking {} is cancelled without attribution",
                self.id
            )));
        }
        Ok(Booking {
            id: BookingId::new(self.id),
            status,
            booking_date,
            time_slot,
            service_type: self.service_type,
            provider_ref: self.provider_ref,
            customer_ref: self.customer_ref,
            created_at,
            updated_at,
            version: self.version as u64,
            cancellation,
        })
    }
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    listing_ref: String,
    owner_ref: String,
    customer_ref: String,
    payment_method: String,
    status: String,
    created_at: String,
    updated_at: String,
    version: i64,
    canceled_by: Option<String>,
    canceled_account_id: Option<String>,
    canceled_at: Option<String>,
    cancel_reason: Option<String>,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let status = OrderStatus::from_str(&self.status).map_err(db_err)?;
        let created_at = parse_ts(&self.created_at)?;
        let updated_at = parse_ts(&self.updated_at)?;
        let cancellation = parse_cancellation(
            self.canceled_by,
            self.canceled_account_id,
            self.canceled_at,
            self.cancel_reason,
            updated_at,
        )?;
        if status == OrderStatus::Canceled && cancellation.is_none() {
            return Err(RepoError::DbError(format!(
                "order {} is canceled without attribution",
                self.id
            )));
        }
        Ok(Order {
            id: OrderId::new(self.id),
            listing_ref: self.listing_ref,
            owner_ref: self.owner_ref,
            customer_ref: self.customer_ref,
            payment_method: self.payment_method,
            status,
            created_at,
            updated_at,
            version: self.version as u64,
            cancellation,
        })
    }
}

#[derive(FromRow)]
struct DbFeedback {
    booking_id: String,
    author_ref: String,
    rating: i64,
    service_quality: String,
    message: String,
    created_at: String,
}

impl DbFeedback {
    fn into_feedback(self) -> Result<Feedback, RepoError> {
        let rating = u8::try_from(self.rating).map_err(db_err)?;
        Ok(Feedback {
            booking_id: BookingId::new(self.booking_id),
            author_ref: self.author_ref,
            rating,
            service_quality: ServiceQuality::from_str(&self.service_quality).map_err(db_err)?,
            message: self.message,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        for ddl in MIGRATIONS {
            sqlx::query(ddl).execute(&pool).await?;
        }

        Ok(Self { pool })
    }

    async fn version_mismatch(
        &self,
        table: &'static str,
        id: &str,
        expected_version: u64,
    ) -> RepoError {
        let sql = format!("SELECT version FROM {table} WHERE id = ?");
        let actual: Result<Option<i64>, sqlx::Error> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        match actual {
            Ok(Some(actual)) => RepoError::Conflict(format!(
                "{table} row {id} is at version {actual}, request expected {expected_version}"
            )),
            Ok(None) => RepoError::NotFound(format!("{table} row {id}")),
            Err(e) => db_err(e),
        }
    }
}

#[async_trait]
impl BookingRepository for SqliteRepo {
    async fn create_booking(&self, booking: Booking) -> Result<Booking, RepoError> {
        let (canceled_by, canceled_account_id, canceled_at, cancel_reason) =
            cancellation_columns(&booking.cancellation);
        let sql = format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO NOTHING"
        );
        let inserted = sqlx::query(&sql)
            .bind(booking.id.as_str())
            .bind(booking.status.as_str())
            .bind(booking.booking_date.map(|d| d.to_string()))
            .bind(booking.time_slot.start().to_string())
            .bind(booking.time_slot.end().to_string())
            .bind(&booking.service_type)
            .bind(&booking.provider_ref)
            .bind(&booking.customer_ref)
            .bind(booking.created_at.to_rfc3339())
            .bind(booking.updated_at.to_rfc3339())
            .bind(booking.version as i64)
            .bind(canceled_by)
            .bind(canceled_account_id)
            .bind(canceled_at)
            .bind(cancel_reason)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if inserted.rows_affected() == 0 {
            return Err(RepoError::Conflict(format!("booking {} already exists", booking.id)));
        }
        Ok(booking)
    }

    async fn get_booking(&self, id: &BookingId) -> Result<Option<Booking>, RepoError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?");
        let row: Option<DbBooking> = sqlx::query_as(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| r.into_booking()).transpose()
    }

    async fn list_bookings_for(&self, actor: &Actor) -> Result<Vec<Booking>, RepoError> {
        let column = match actor.role {
            ActorRole::Provider => "provider_ref",
            ActorRole::Customer => "customer_ref",
        };
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE {column} = ?");
        let rows: Vec<DbBooking> = sqlx::query_as(&sql)
            .bind(&actor.id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter()
            .map(|r| r.into_booking())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update_booking(
        &self,
        mut booking: Booking,
        expected_version: u64,
    ) -> Result<Booking, RepoError> {
        let (canceled_by, canceled_account_id, canceled_at, cancel_reason) =
            cancellation_columns(&booking.cancellation);
        let next_version = expected_version + 1;
        let updated = sqlx::query(
            "UPDATE bookings SET status = ?, booking_date = ?, slot_start = ?, slot_end = ?, \
             updated_at = ?, version = ?, canceled_by = ?, canceled_account_id = ?, \
             canceled_at = ?, cancel_reason = ? WHERE id = ? AND version = ?",
        )
        .bind(booking.status.as_str())
        .bind(booking.booking_date.map(|d| d.to_string()))
        .bind(booking.time_slot.start().to_string())
        .bind(booking.time_slot.end().to_string())
        .bind(booking.updated_at.to_rfc3339())
        .bind(next_version as i64)
        .bind(canceled_by)
        .bind(canceled_account_id)
        .bind(canceled_at)
        .bind(cancel_reason)
        .bind(booking.id.as_str())
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Err(self
                .version_mismatch("bookings", booking.id.as_str(), expected_version)
                .await);
        }
        booking.version = next_version;
        Ok(booking)
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError> {
        let (canceled_by, canceled_account_id, canceled_at, cancel_reason) =
            cancellation_columns(&order.cancellation);
        let sql = format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO NOTHING"
        );
        let inserted = sqlx::query(&sql)
            .bind(order.id.as_str())
            .bind(&order.listing_ref)
            .bind(&order.owner_ref)
            .bind(&order.customer_ref)
            .bind(&order.payment_method)
            .bind(order.status.as_str())
            .bind(order.created_at.to_rfc3339())
            .bind(order.updated_at.to_rfc3339())
            .bind(order.version as i64)
            .bind(canceled_by)
            .bind(canceled_account_id)
            .bind(canceled_at)
            .bind(cancel_reason)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if inserted.rows_affected() == 0 {
            return Err(RepoError::Conflict(format!("order {} already exists", order.id)));
        }
        Ok(order)
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, RepoError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
        let row: Option<DbOrder> = sqlx::query_as(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| r.into_order()).transpose()
    }

    async fn list_orders_for(&self, actor: &Actor) -> Result<Vec<Order>, RepoError> {
        let column = match actor.role {
            ActorRole::Provider => "owner_ref",
            ActorRole::Customer => "customer_ref",
        };
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE {column} = ?");
        let rows: Vec<DbOrder> = sqlx::query_as(&sql)
            .bind(&actor.id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter()
            .map(|r| r.into_order())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update_order(
        &self,
        mut order: Order,
        expected_version: u64,
    ) -> Result<Order, RepoError> {
        let (canceled_by, canceled_account_id, canceled_at, cancel_reason) =
            cancellation_columns(&order.cancellation);
        let next_version = expected_version + 1;
        let updated = sqlx::query(
            "UPDATE orders SET status = ?, updated_at = ?, version = ?, canceled_by = ?, \
             canceled_account_id = ?, canceled_at = ?, cancel_reason = ? \
             WHERE id = ? AND version = ?",
        )
        .bind(order.status.as_str())
        .bind(order.updated_at.to_rfc3339())
        .bind(next_version as i64)
        .bind(canceled_by)
        .bind(canceled_account_id)
        .bind(canceled_at)
        .bind(cancel_reason)
        .bind(order.id.as_str())
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Err(self
                .version_mismatch("orders", order.id.as_str(), expected_version)
                .await);
        }
        order.version = next_version;
        Ok(order)
    }
}

#[async_trait]
impl FeedbackRepository for SqliteRepo {
    async fn insert_feedback(&self, feedback: Feedback) -> Result<Feedback, RepoError> {
        let inserted = sqlx::query(
            "INSERT INTO feedback (booking_id, author_ref, rating, service_quality, message, created_at)
             VALUES (?, ?, ?, ?, ?, ?) ON CONFLICT(booking_id) DO NOTHING",
        )
        .bind(feedback.booking_id.as_str())
        .bind(&feedback.author_ref)
        .bind(feedback.rating as i64)
        .bind(feedback.service_quality.as_str())
        .bind(&feedback.message)
        .bind(feedback.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if inserted.rows_affected() == 0 {
            return Err(RepoError::Conflict(format!(
                "booking {} already has feedback",
                feedback.booking_id
            )));
        }
        Ok(feedback)
    }

    async fn get_feedback(&self, booking_id: &BookingId) -> Result<Option<Feedback>, RepoError> {
        let row: Option<DbFeedback> = sqlx::query_as(
            "SELECT booking_id, author_ref, rating, service_quality, message, created_at
             FROM feedback WHERE booking_id = ?",
        )
        .bind(booking_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(|r| r.into_feedback()).transpose()
    }

    async fn list_feedback_by(&self, author_ref: &str) -> Result<Vec<Feedback>, RepoError> {
        let rows: Vec<DbFeedback> = sqlx::query_as(
            "SELECT booking_id, author_ref, rating, service_quality, message, created_at
             FROM feedback WHERE author_ref = ?",
        )
        .bind(author_ref)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter()
            .map(|r| r.into_feedback())
            .collect::<Result<Vec<_>, _>>()
    }
}
