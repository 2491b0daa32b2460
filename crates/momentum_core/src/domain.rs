//! crates/momentum_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Represents a reader and the live state of their daily habit.
///
/// The streak and shield fields are mutated only by the streak engine;
/// the goal and preference fields only by the settings path.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Minutes of reading per day required to count the day as met. Always >= 1.
    pub daily_goal_minutes: u32,
    pub preferred_reading_time: PreferredTime,
    /// Forgiveness credits, kept in 0..=3 by the streak engine.
    pub shields_available: u32,
    pub current_streak: u32,
    /// Never less than `current_streak`.
    pub longest_streak: u32,
    /// First day of the running streak, absent while the streak is zero.
    pub streak_start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// A single logged reading session. Immutable once created.
#[derive(Debug, Clone)]
pub struct ReadingSession {
    pub id: i64,
    pub user_id: i64,
    pub started_at: DateTime<Utc>,
    /// Fractional minutes are allowed; stored rounded to a tenth.
    pub duration_minutes: f64,
    /// The server-local calendar day captured when the session was logged,
    /// never reconstructed from the timestamp.
    pub date: NaiveDate,
}

/// A completed streak, archived as the closed interval it covered.
#[derive(Debug, Clone)]
pub struct StreakHistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub length_days: u32,
}

/// A proposed change to the daily goal awaiting user action.
///
/// Created pending, then either accepted (the new goal is copied onto the
/// user) or dismissed. Both outcomes are terminal.
#[derive(Debug, Clone)]
pub struct GoalAdjustment {
    pub id: i64,
    pub user_id: i64,
    pub old_goal: u32,
    pub new_goal: u32,
    pub reason: String,
    pub suggested_at: DateTime<Utc>,
    pub accepted: bool,
    pub dismissed: bool,
}

impl GoalAdjustment {
    pub fn is_pending(&self) -> bool {
        !self.accepted && !self.dismissed
    }
}

/// The slice of the day a reader prefers to read in.
///
/// Stored as lowercase text; values that fail to parse fall back to the
/// default, so an unknown preference behaves like `Evening`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreferredTime {
    Morning,
    Afternoon,
    #[default]
    Evening,
}

impl PreferredTime {
    /// The inclusive hour range of the preferred reading window.
    pub fn window(self) -> (u32, u32) {
        match self {
            Self::Morning => (6, 10),
            Self::Afternoon => (12, 16),
            Self::Evening => (18, 22),
        }
    }
}

impl std::fmt::Display for PreferredTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Morning => write!(f, "morning"),
            Self::Afternoon => write!(f, "afternoon"),
            Self::Evening => write!(f, "evening"),
        }
    }
}

impl std::str::FromStr for PreferredTime {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            _ => Err(format!("Unknown preferred reading time: {}", s)),
        }
    }
}
