//! crates/momentum_core/src/nudge.rs
//!
//! Time-of-day reading reminders. The decision is a pure function of the
//! clock, today's progress and the user's preference; the read path never
//! recomputes the streak.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::PreferredTime;
use crate::ports::{HabitStore, PortResult};

/// From this hour on, an unmet goal puts the streak at risk today.
const URGENT_HOUR: u32 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeKind {
    /// Late in the day with the goal unmet; the streak is on the line.
    Urgent,
    /// Inside the user's preferred reading window.
    Gentle,
}

impl NudgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NudgeKind::Urgent => "urgent",
            NudgeKind::Gentle => "gentle",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Nudge {
    pub kind: NudgeKind,
    pub message: String,
    /// Minutes still needed today, rounded, never negative.
    pub remaining_minutes: u32,
}

/// Decides whether to nudge at `hour` given today's progress.
///
/// Nothing fires once the goal is met. The urgent check runs first, so late
/// evening hours inside a preferred window still produce an urgent nudge.
pub fn nudge_at(
    hour: u32,
    today_total: f64,
    goal_minutes: u32,
    preferred: PreferredTime,
    current_streak: u32,
) -> Option<Nudge> {
    let goal = f64::from(goal_minutes);
    if today_total >= goal {
        return None;
    }
    let remaining = (goal - today_total).max(0.0).round() as u32;

    if hour >= URGENT_HOUR {
        return Some(Nudge {
            kind: NudgeKind::Urgent,
            message: format!(
                "Your {}-day streak is on the line. {} minutes is all it takes.",
                current_streak, remaining
            ),
            remaining_minutes: remaining,
        });
    }

    let (start, end) = preferred.window();
    if (start..=end).contains(&hour) {
        return Some(Nudge {
            kind: NudgeKind::Gentle,
            message: format!(
                "It's your favorite reading window. Just {} minutes to keep your streak alive.",
                remaining
            ),
            remaining_minutes: remaining,
        });
    }

    None
}

/// Loads today's total and the user profile and applies `nudge_at`.
/// Uses the stored streak; fetching a nudge does not trigger a recompute.
pub async fn nudge_for_user(
    store: &dyn HabitStore,
    user_id: i64,
    today: NaiveDate,
    hour: u32,
) -> PortResult<Option<Nudge>> {
    let user = store.get_user(user_id).await?;
    let totals = store.get_daily_totals(user_id, Some(today)).await?;
    let today_total = totals.get(&today).copied().unwrap_or(0.0);

    Ok(nudge_at(
        hour,
        today_total,
        user.daily_goal_minutes,
        user.preferred_reading_time,
        user.current_streak,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgent_late_evening_with_nothing_read() {
        let nudge = nudge_at(22, 0.0, 20, PreferredTime::Evening, 5).expect("should nudge");
        assert_eq!(nudge.kind, NudgeKind::Urgent);
        assert_eq!(nudge.remaining_minutes, 20);
        assert!(nudge.message.contains("5-day streak"));
    }

    #[test]
    fn urgent_wins_over_the_preferred_window() {
        // Hour 21 is inside the evening window but past the urgency cutoff.
        let nudge = nudge_at(21, 3.0, 20, PreferredTime::Evening, 2).expect("should nudge");
        assert_eq!(nudge.kind, NudgeKind::Urgent);
        assert_eq!(nudge.remaining_minutes, 17);
    }

    #[test]
    fn gentle_inside_the_preferred_window() {
        let nudge = nudge_at(8, 0.0, 20, PreferredTime::Morning, 3).expect("should nudge");
        assert_eq!(nudge.kind, NudgeKind::Gentle);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        assert!(nudge_at(6, 0.0, 20, PreferredTime::Morning, 0).is_some());
        assert!(nudge_at(10, 0.0, 20, PreferredTime::Morning, 0).is_some());
        assert!(nudge_at(11, 0.0, 20, PreferredTime::Morning, 0).is_none());
        assert!(nudge_at(12, 0.0, 20, PreferredTime::Afternoon, 0).is_some());
        assert!(nudge_at(17, 0.0, 20, PreferredTime::Afternoon, 0).is_none());
    }

    #[test]
    fn nothing_once_the_goal_is_met() {
        assert!(nudge_at(22, 20.0, 20, PreferredTime::Evening, 9).is_none());
        assert!(nudge_at(19, 25.5, 20, PreferredTime::Evening, 9).is_none());
    }

    #[test]
    fn remaining_minutes_are_rounded() {
        let nudge = nudge_at(19, 7.4, 20, PreferredTime::Evening, 1).expect("should nudge");
        assert_eq!(nudge.remaining_minutes, 13);
    }
}
