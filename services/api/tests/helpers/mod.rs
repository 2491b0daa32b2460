#![allow(dead_code)]

use api_lib::adapters::SqliteStore;
use chrono::{Duration, NaiveDate};
use momentum_core::domain::{PreferredTime, User};
use momentum_core::ports::HabitStore;
use sqlx::sqlite::SqlitePoolOptions;

/// Open a fresh in-memory store with migrations applied.
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures.
pub async fn test_store() -> SqliteStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let store = SqliteStore::new(pool);
    store
        .run_migrations()
        .await
        .expect("Failed to run migrations");
    store
}

/// A fixed "today" keeps every backward date walk deterministic.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

pub fn day(days_ago: i64) -> NaiveDate {
    today() - Duration::days(days_ago)
}

pub async fn seed_user(store: &SqliteStore, goal: u32) -> User {
    store
        .create_user("Avid Reader", goal, PreferredTime::Evening)
        .await
        .expect("Failed to create user")
}

/// Log `minutes` on the day falling `days_ago` before the fixed today.
pub async fn seed_session(store: &SqliteStore, user_id: i64, days_ago: i64, minutes: f64) {
    let date = day(days_ago);
    let started_at = date.and_hms_opt(19, 0, 0).unwrap().and_utc();
    store
        .append_session(user_id, started_at, minutes, date)
        .await
        .expect("Failed to append session");
}
