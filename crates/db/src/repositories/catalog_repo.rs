//! Repository for the catalog tables the booking core collaborates with:
//! movies, rooms, chairs, combos, vouchers, users.
//!
//! The admin CRUD surface for these lives outside this service; the create
//! methods here exist for seeding and tests.

use sqlx::PgPool;

use cinebook_core::types::{Amount, DbId, Timestamp};

use crate::models::combo::Combo;
use crate::models::voucher::Voucher;

/// Provides catalog lookups and seed helpers.
pub struct CatalogRepo;

impl CatalogRepo {
    // -- Lookups the booking core needs --------------------------------------

    /// Voucher terms by id.
    pub async fn find_voucher(pool: &PgPool, id: DbId) -> Result<Option<Voucher>, sqlx::Error> {
        sqlx::query_as::<_, Voucher>(
            "SELECT id, code, discount_rate, max_value, starts_at, ends_at \
             FROM vouchers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Combo by id.
    pub async fn find_combo(pool: &PgPool, id: DbId) -> Result<Option<Combo>, sqlx::Error> {
        sqlx::query_as::<_, Combo>("SELECT id, name, price FROM combos WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Contact details of a user, for orders placed while signed in.
    pub async fn user_contact(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<(String, String, String)>, sqlx::Error> {
        sqlx::query_as("SELECT name, phone, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // -- Seed helpers --------------------------------------------------------

    pub async fn create_movie(
        pool: &PgPool,
        title: &str,
        duration_minutes: i32,
    ) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) =
            sqlx::query_as("INSERT INTO movies (title, duration_minutes) VALUES ($1, $2) RETURNING id")
                .bind(title)
                .bind(duration_minutes)
                .fetch_one(pool)
                .await?;
        Ok(id)
    }

    pub async fn create_room(pool: &PgPool, name: &str) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as("INSERT INTO rooms (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await?;
        Ok(id)
    }

    pub async fn create_chair_type(
        pool: &PgPool,
        name: &str,
        price: Amount,
    ) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) =
            sqlx::query_as("INSERT INTO chair_types (name, price) VALUES ($1, $2) RETURNING id")
                .bind(name)
                .bind(price)
                .fetch_one(pool)
                .await?;
        Ok(id)
    }

    pub async fn create_chair(
        pool: &PgPool,
        room_id: DbId,
        chair_type_id: DbId,
        label: &str,
    ) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO chairs (room_id, chair_type_id, label) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(room_id)
        .bind(chair_type_id)
        .bind(label)
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    pub async fn create_combo(pool: &PgPool, name: &str, price: Amount) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) =
            sqlx::query_as("INSERT INTO combos (name, price) VALUES ($1, $2) RETURNING id")
                .bind(name)
                .bind(price)
                .fetch_one(pool)
                .await?;
        Ok(id)
    }

    pub async fn create_voucher(
        pool: &PgPool,
        code: &str,
        discount_rate: f64,
        max_value: Amount,
        starts_at: Timestamp,
        ends_at: Timestamp,
    ) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO vouchers (code, discount_rate, max_value, starts_at, ends_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(code)
        .bind(discount_rate)
        .bind(max_value)
        .bind(starts_at)
        .bind(ends_at)
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    pub async fn create_user(
        pool: &PgPool,
        name: &str,
        email: &str,
        phone: &str,
        role: &str,
    ) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO users (name, email, phone, role) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(role)
        .fetch_one(pool)
        .await?;
        Ok(id)
    }
}
