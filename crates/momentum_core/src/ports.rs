//! crates/momentum_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::domain::{GoalAdjustment, PreferredTime, ReadingSession, StreakHistoryEntry, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Port (Trait)
//=========================================================================================

/// Persistence contract for users, sessions, goal adjustments and streak
/// history. Implemented by the storage adapter in the service layer.
///
/// Every operation is a single statement (or an atomic upsert); the engines
/// assume a single active writer per user and add no locking on top.
#[async_trait]
pub trait HabitStore: Send + Sync {
    // --- Users ---
    async fn create_user(
        &self,
        name: &str,
        daily_goal_minutes: u32,
        preferred_reading_time: PreferredTime,
    ) -> PortResult<User>;

    async fn get_user(&self, user_id: i64) -> PortResult<User>;

    async fn update_shields(&self, user_id: i64, shields_available: u32) -> PortResult<()>;

    /// Persists the recomputed streak fields in one statement.
    async fn update_streak(
        &self,
        user_id: i64,
        current_streak: u32,
        longest_streak: u32,
        streak_start_date: Option<NaiveDate>,
    ) -> PortResult<()>;

    async fn update_goal(&self, user_id: i64, daily_goal_minutes: u32) -> PortResult<()>;

    async fn update_preferred_time(
        &self,
        user_id: i64,
        preferred_reading_time: PreferredTime,
    ) -> PortResult<()>;

    // --- Reading sessions ---
    async fn append_session(
        &self,
        user_id: i64,
        started_at: DateTime<Utc>,
        duration_minutes: f64,
        date: NaiveDate,
    ) -> PortResult<ReadingSession>;

    /// Summed minutes per calendar day, optionally restricted to dates on or
    /// after `from_date`. Days without sessions are absent from the map.
    async fn get_daily_totals(
        &self,
        user_id: i64,
        from_date: Option<NaiveDate>,
    ) -> PortResult<BTreeMap<NaiveDate, f64>>;

    async fn recent_sessions(&self, user_id: i64, limit: u32) -> PortResult<Vec<ReadingSession>>;

    // --- Goal adjustments ---
    async fn pending_adjustment(&self, user_id: i64) -> PortResult<Option<GoalAdjustment>>;

    /// Inserts a pending proposal. The storage layer enforces at most one
    /// pending proposal per user; if a concurrent call won the race, the
    /// surviving pending row is returned instead of a duplicate.
    async fn create_adjustment(
        &self,
        user_id: i64,
        old_goal: u32,
        new_goal: u32,
        reason: &str,
    ) -> PortResult<GoalAdjustment>;

    async fn get_adjustment(&self, adjustment_id: i64) -> PortResult<GoalAdjustment>;

    async fn mark_adjustment_accepted(&self, adjustment_id: i64) -> PortResult<()>;

    async fn mark_adjustment_dismissed(&self, adjustment_id: i64) -> PortResult<()>;

    // --- Streak history ---
    async fn append_streak_history(
        &self,
        user_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        length_days: u32,
    ) -> PortResult<StreakHistoryEntry>;

    async fn streak_history(&self, user_id: i64) -> PortResult<Vec<StreakHistoryEntry>>;
}
