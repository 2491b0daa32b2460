//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `HabitStore` port from the core crate. It handles
//! all interactions with the SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use momentum_core::domain::{
    GoalAdjustment, PreferredTime, ReadingSession, StreakHistoryEntry, User,
};
use momentum_core::ports::{HabitStore, PortError, PortResult};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A SQLite-backed adapter that implements the `HabitStore` port.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Creates a new `SqliteStore`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    daily_goal_minutes: i64,
    preferred_reading_time: String,
    shields_available: i64,
    current_streak: i64,
    longest_streak: i64,
    streak_start_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            daily_goal_minutes: self.daily_goal_minutes as u32,
            // Unknown stored values fall back to the default window.
            preferred_reading_time: self.preferred_reading_time.parse().unwrap_or_default(),
            shields_available: self.shields_available as u32,
            current_streak: self.current_streak as u32,
            longest_streak: self.longest_streak as u32,
            streak_start_date: self.streak_start_date,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: i64,
    user_id: i64,
    started_at: DateTime<Utc>,
    duration_minutes: f64,
    date: NaiveDate,
}

impl SessionRecord {
    fn to_domain(self) -> ReadingSession {
        ReadingSession {
            id: self.id,
            user_id: self.user_id,
            started_at: self.started_at,
            duration_minutes: self.duration_minutes,
            date: self.date,
        }
    }
}

#[derive(FromRow)]
struct AdjustmentRecord {
    id: i64,
    user_id: i64,
    old_goal: i64,
    new_goal: i64,
    reason: String,
    suggested_at: DateTime<Utc>,
    accepted: i64,
    dismissed: i64,
}

impl AdjustmentRecord {
    fn to_domain(self) -> GoalAdjustment {
        GoalAdjustment {
            id: self.id,
            user_id: self.user_id,
            old_goal: self.old_goal as u32,
            new_goal: self.new_goal as u32,
            reason: self.reason,
            suggested_at: self.suggested_at,
            accepted: self.accepted != 0,
            dismissed: self.dismissed != 0,
        }
    }
}

#[derive(FromRow)]
struct HistoryRecord {
    id: i64,
    user_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    length_days: i64,
}

impl HistoryRecord {
    fn to_domain(self) -> StreakHistoryEntry {
        StreakHistoryEntry {
            id: self.id,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: self.end_date,
            length_days: self.length_days as u32,
        }
    }
}

//=========================================================================================
// `HabitStore` Trait Implementation
//=========================================================================================

const USER_COLUMNS: &str = "id, name, daily_goal_minutes, preferred_reading_time, \
     shields_available, current_streak, longest_streak, streak_start_date, created_at";

const ADJUSTMENT_COLUMNS: &str =
    "id, user_id, old_goal, new_goal, reason, suggested_at, accepted, dismissed";

#[async_trait]
impl HabitStore for SqliteStore {
    async fn create_user(
        &self,
        name: &str,
        daily_goal_minutes: u32,
        preferred_reading_time: PreferredTime,
    ) -> PortResult<User> {
        let record: UserRecord = sqlx::query_as(&format!(
            "INSERT INTO users (name, daily_goal_minutes, preferred_reading_time, created_at) \
             VALUES (?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(daily_goal_minutes)
        .bind(preferred_reading_time.to_string())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: i64) -> PortResult<User> {
        let record: UserRecord =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| match e {
                    sqlx::Error::RowNotFound => {
                        PortError::NotFound(format!("User {} not found", user_id))
                    }
                    _ => unexpected(e),
                })?;

        Ok(record.to_domain())
    }

    async fn update_shields(&self, user_id: i64, shields_available: u32) -> PortResult<()> {
        sqlx::query("UPDATE users SET shields_available = ? WHERE id = ?")
            .bind(shields_available)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn update_streak(
        &self,
        user_id: i64,
        current_streak: u32,
        longest_streak: u32,
        streak_start_date: Option<NaiveDate>,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE users SET current_streak = ?, longest_streak = ?, streak_start_date = ? \
             WHERE id = ?",
        )
        .bind(current_streak)
        .bind(longest_streak)
        .bind(streak_start_date)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn update_goal(&self, user_id: i64, daily_goal_minutes: u32) -> PortResult<()> {
        sqlx::query("UPDATE users SET daily_goal_minutes = ? WHERE id = ?")
            .bind(daily_goal_minutes)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn update_preferred_time(
        &self,
        user_id: i64,
        preferred_reading_time: PreferredTime,
    ) -> PortResult<()> {
        sqlx::query("UPDATE users SET preferred_reading_time = ? WHERE id = ?")
            .bind(preferred_reading_time.to_string())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn append_session(
        &self,
        user_id: i64,
        started_at: DateTime<Utc>,
        duration_minutes: f64,
        date: NaiveDate,
    ) -> PortResult<ReadingSession> {
        let record: SessionRecord = sqlx::query_as(
            "INSERT INTO reading_sessions (user_id, started_at, duration_minutes, date) \
             VALUES (?, ?, ?, ?) \
             RETURNING id, user_id, started_at, duration_minutes, date",
        )
        .bind(user_id)
        .bind(started_at)
        .bind(duration_minutes)
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn get_daily_totals(
        &self,
        user_id: i64,
        from_date: Option<NaiveDate>,
    ) -> PortResult<BTreeMap<NaiveDate, f64>> {
        let rows: Vec<(NaiveDate, f64)> = match from_date {
            Some(from) => {
                sqlx::query_as(
                    "SELECT date, SUM(duration_minutes) FROM reading_sessions \
                     WHERE user_id = ? AND date >= ? GROUP BY date",
                )
                .bind(user_id)
                .bind(from)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(
                    "SELECT date, SUM(duration_minutes) FROM reading_sessions \
                     WHERE user_id = ? GROUP BY date",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(unexpected)?;

        Ok(rows.into_iter().collect())
    }

    async fn recent_sessions(&self, user_id: i64, limit: u32) -> PortResult<Vec<ReadingSession>> {
        let records: Vec<SessionRecord> = sqlx::query_as(
            "SELECT id, user_id, started_at, duration_minutes, date FROM reading_sessions \
             WHERE user_id = ? ORDER BY date DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn pending_adjustment(&self, user_id: i64) -> PortResult<Option<GoalAdjustment>> {
        let record: Option<AdjustmentRecord> = sqlx::query_as(&format!(
            "SELECT {ADJUSTMENT_COLUMNS} FROM goal_adjustments \
             WHERE user_id = ? AND accepted = 0 AND dismissed = 0 \
             ORDER BY suggested_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(|r| r.to_domain()))
    }

    async fn create_adjustment(
        &self,
        user_id: i64,
        old_goal: u32,
        new_goal: u32,
        reason: &str,
    ) -> PortResult<GoalAdjustment> {
        // The partial unique index on pending rows turns a lost race into a
        // no-op insert; whoever won supplies the row returned below.
        sqlx::query(
            "INSERT INTO goal_adjustments (user_id, old_goal, new_goal, reason, suggested_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (user_id) WHERE accepted = 0 AND dismissed = 0 DO NOTHING",
        )
        .bind(user_id)
        .bind(old_goal)
        .bind(new_goal)
        .bind(reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        self.pending_adjustment(user_id).await?.ok_or_else(|| {
            PortError::Unexpected(format!(
                "No pending adjustment present for user {} after insert",
                user_id
            ))
        })
    }

    async fn get_adjustment(&self, adjustment_id: i64) -> PortResult<GoalAdjustment> {
        let record: AdjustmentRecord = sqlx::query_as(&format!(
            "SELECT {ADJUSTMENT_COLUMNS} FROM goal_adjustments WHERE id = ?"
        ))
        .bind(adjustment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Adjustment {} not found", adjustment_id))
            }
            _ => unexpected(e),
        })?;

        Ok(record.to_domain())
    }

    async fn mark_adjustment_accepted(&self, adjustment_id: i64) -> PortResult<()> {
        sqlx::query("UPDATE goal_adjustments SET accepted = 1 WHERE id = ?")
            .bind(adjustment_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn mark_adjustment_dismissed(&self, adjustment_id: i64) -> PortResult<()> {
        sqlx::query("UPDATE goal_adjustments SET dismissed = 1 WHERE id = ?")
            .bind(adjustment_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn append_streak_history(
        &self,
        user_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        length_days: u32,
    ) -> PortResult<StreakHistoryEntry> {
        let record: HistoryRecord = sqlx::query_as(
            "INSERT INTO streak_history (user_id, start_date, end_date, length_days) \
             VALUES (?, ?, ?, ?) \
             RETURNING id, user_id, start_date, end_date, length_days",
        )
        .bind(user_id)
        .bind(start_date)
        .bind(end_date)
        .bind(length_days)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn streak_history(&self, user_id: i64) -> PortResult<Vec<StreakHistoryEntry>> {
        let records: Vec<HistoryRecord> = sqlx::query_as(
            "SELECT id, user_id, start_date, end_date, length_days FROM streak_history \
             WHERE user_id = ? ORDER BY start_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
