use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use skywings_core::booking::{Booking, BookingRecord, BookingStatus, FlightDetails};
use skywings_core::repository::{BookingRepository, RepoResult};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;

// `departure_date` columns are derived from the details JSON and only used for filtering.
const BOOKING_COLUMNS: &str = "id, booking_reference, user_id, flight_id, passenger_name, passenger_email, seat_number, \
     booking_status, total_amount, booking_date, created_at, flight_details, \
     return_flight_id, return_seat_number, return_flight_details";

/// Postgres-backed booking store. One row per booking, return leg in `return_*` columns.
#[derive(Clone)]
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    booking_reference: String,
    user_id: String,
    flight_id: String,
    passenger_name: String,
    passenger_email: String,
    seat_number: String,
    booking_status: String,
    total_amount: f64,
    booking_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    flight_details: Option<Json<FlightDetails>>,
    return_flight_id: Option<String>,
    return_seat_number: Option<String>,
    return_flight_details: Option<Json<FlightDetails>>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let decode = |reason: String| StoreError::Decode { id, reason };

        let booking_status: BookingStatus = row
            .booking_status
            .parse()
            .map_err(|e: skywings_core::booking::BookingDecodeError| decode(e.to_string()))?;

        let record = BookingRecord {
            id: row.id,
            booking_reference: row.booking_reference,
            user_id: row.user_id,
            flight_id: row.flight_id,
            passenger_name: row.passenger_name,
            passenger_email: row.passenger_email,
            seat_number: row.seat_number,
            booking_status,
            total_amount: row.total_amount,
            booking_date: row.booking_date,
            created_at: row.created_at,
            flight_details: row.flight_details.map(|j| j.0),
            return_flight_id: row.return_flight_id,
            return_seat_number: row.return_seat_number,
            return_flight_details: row.return_flight_details.map(|j| j.0),
        };

        Booking::try_from(record).map_err(|e| decode(e.to_string()))
    }
}

fn into_bookings(rows: Vec<BookingRow>) -> RepoResult<Vec<Booking>> {
    rows.into_iter()
        .map(|row| {
            Booking::try_from(row).map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
        })
        .collect()
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn put(&self, booking: &Booking) -> RepoResult<()> {
        let record = BookingRecord::from(booking.clone());
        let departure_date = record.flight_details.as_ref().and_then(|d| d.departure_date);
        let return_departure_date = record
            .return_flight_details
            .as_ref()
            .and_then(|d| d.departure_date);

        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, flight_id, passenger_name, passenger_email, seat_number,
                                  booking_status, total_amount, booking_date, created_at, flight_details,
                                  departure_date, return_flight_id, return_seat_number,
                                  return_flight_details, return_departure_date, booking_reference)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                flight_id = EXCLUDED.flight_id,
                passenger_name = EXCLUDED.passenger_name,
                passenger_email = EXCLUDED.passenger_email,
                seat_number = EXCLUDED.seat_number,
                booking_status = EXCLUDED.booking_status,
                total_amount = EXCLUDED.total_amount,
                booking_date = EXCLUDED.booking_date,
                flight_details = EXCLUDED.flight_details,
                departure_date = EXCLUDED.departure_date,
                return_flight_id = EXCLUDED.return_flight_id,
                return_seat_number = EXCLUDED.return_seat_number,
                return_flight_details = EXCLUDED.return_flight_details,
                return_departure_date = EXCLUDED.return_departure_date
            "#,
        )
        .bind(record.id)
        .bind(&record.user_id)
        .bind(&record.flight_id)
        .bind(&record.passenger_name)
        .bind(&record.passenger_email)
        .bind(&record.seat_number)
        .bind(record.booking_status.as_str())
        .bind(record.total_amount)
        .bind(record.booking_date)
        .bind(record.created_at)
        .bind(record.flight_details.map(Json))
        .bind(departure_date)
        .bind(&record.return_flight_id)
        .bind(&record.return_seat_number)
        .bind(record.return_flight_details.map(Json))
        .bind(return_departure_date)
        .bind(&record.booking_reference)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Booking::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn query_by_user(&self, user_id: &str) -> RepoResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY booking_date DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_bookings(rows)
    }

    async fn query_by_flight(
        &self,
        flight_id: &str,
        date: Option<NaiveDate>,
    ) -> RepoResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE flight_id = $1 AND ($2::date IS NULL OR departure_date = $2)",
            BOOKING_COLUMNS
        ))
        .bind(flight_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        into_bookings(rows)
    }

    async fn scan_by_return_flight(
        &self,
        flight_id: &str,
        date: Option<NaiveDate>,
    ) -> RepoResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE return_flight_id = $1 \
             AND ($2::date IS NULL OR return_departure_date = $2)",
            BOOKING_COLUMNS
        ))
        .bind(flight_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        into_bookings(rows)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> RepoResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET booking_status = $1 WHERE id = $2 RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Booking::try_from(row)?)),
            None => Ok(None),
        }
    }
}
