//! crates/momentum_core/src/sessions.rs
//!
//! Logging of reading sessions. Validation happens before any write; a
//! successful append is followed by a full streak recomputation.

use chrono::{DateTime, NaiveDate, Utc};

use crate::ports::{HabitStore, PortError, PortResult};
use crate::streak::{self, StreakReport};

/// Outcome of logging one session.
#[derive(Debug, Clone)]
pub struct SessionLogged {
    /// Whether today's summed minutes now reach the daily goal.
    pub goal_met: bool,
    /// Today's summed minutes after the append, rounded to a tenth.
    pub today_total: f64,
    pub streak: StreakReport,
}

/// Round minutes to a tenth, the precision sessions are stored at.
pub fn round_tenth(minutes: f64) -> f64 {
    (minutes * 10.0).round() / 10.0
}

/// Appends a session for `date` (the server-local day supplied by the
/// caller) and recomputes the streak.
///
/// A non-positive or non-finite duration is rejected before anything is
/// written.
pub async fn log_session(
    store: &dyn HabitStore,
    user_id: i64,
    started_at: DateTime<Utc>,
    date: NaiveDate,
    duration_minutes: f64,
) -> PortResult<SessionLogged> {
    if !duration_minutes.is_finite() || duration_minutes <= 0.0 {
        return Err(PortError::InvalidInput(
            "session duration must be a positive number of minutes".to_string(),
        ));
    }

    let user = store.get_user(user_id).await?;

    store
        .append_session(user_id, started_at, round_tenth(duration_minutes), date)
        .await?;

    let totals = store.get_daily_totals(user_id, Some(date)).await?;
    let today_total = totals.get(&date).copied().unwrap_or(0.0);
    let goal_met = today_total >= f64::from(user.daily_goal_minutes);

    let streak = streak::compute_streak(store, user_id, date).await?;

    Ok(SessionLogged {
        goal_met,
        today_total: round_tenth(today_total),
        streak,
    })
}
