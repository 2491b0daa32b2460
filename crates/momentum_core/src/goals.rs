//! crates/momentum_core/src/goals.rs
//!
//! The goal adviser: inspects a trailing 14-day window of per-day totals and
//! proposes raising or lowering the daily goal. At most one proposal is ever
//! pending per user; an existing pending proposal is returned unchanged
//! without recomputing.

use chrono::{Duration, NaiveDate};

use crate::domain::GoalAdjustment;
use crate::ports::{HabitStore, PortError, PortResult};

/// Suggested goals never exceed this many minutes.
pub const GOAL_CEILING: u32 = 60;

/// Suggested goals never drop below this many minutes.
pub const GOAL_FLOOR: u32 = 10;

/// The 14-day average must exceed the goal by this factor before a raise.
const RAISE_FACTOR: f64 = 1.2;

/// Lowering is proposed once this many of the last seven data days missed.
const MISSES_TO_LOWER: usize = 3;

/// Days the trailing window spans, today inclusive.
const WINDOW_DAYS: i64 = 14;

/// Minimum data-bearing days in the window before any suggestion is made.
const MIN_SAMPLE_DAYS: usize = 7;

// ---------------------------------------------------------------------------
// Pure window evaluation
// ---------------------------------------------------------------------------

/// Summed minutes for one data-bearing day. Days with no sessions never
/// appear in a window; they are absent rather than zero.
#[derive(Debug, Clone, Copy)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub minutes: f64,
}

/// A proposal the adviser decided to make, before persistence.
#[derive(Debug, Clone)]
pub struct GoalProposal {
    pub new_goal: u32,
    pub reason: String,
}

/// Evaluates the raise and lower triggers over a window of data-bearing day
/// totals, newest first. Fewer than seven rows means there is not enough
/// data to say anything, which is `None` rather than an error.
///
/// The raise trigger wins: the lower trigger is only evaluated when the
/// raise did not fire. Hysteresis comes from the `new_goal > goal` and
/// `new_goal < goal` guards, which keep borderline windows from flapping.
pub fn propose(goal_minutes: u32, window: &[DayTotal]) -> Option<GoalProposal> {
    if window.len() < MIN_SAMPLE_DAYS {
        return None;
    }

    let goal = f64::from(goal_minutes);
    let avg: f64 = window.iter().map(|d| d.minutes).sum::<f64>() / window.len() as f64;
    let last7 = &window[..MIN_SAMPLE_DAYS];
    let days_met = last7.iter().filter(|d| d.minutes >= goal).count();
    let days_missed = MIN_SAMPLE_DAYS - days_met;

    if avg > goal * RAISE_FACTOR && days_met == MIN_SAMPLE_DAYS {
        // Round the average to the nearest 5 minutes, capped at the ceiling.
        let new_goal = (((avg / 5.0).round() as u32) * 5).min(GOAL_CEILING);
        return (new_goal > goal_minutes).then(|| GoalProposal {
            new_goal,
            reason: format!(
                "You've been reading {} min/day. Want to raise your goal to {} min?",
                avg.round() as u32,
                new_goal
            ),
        });
    }

    if days_missed >= MISSES_TO_LOWER {
        let new_goal = goal_minutes.saturating_sub(5).max(GOAL_FLOOR);
        return (new_goal < goal_minutes).then(|| GoalProposal {
            new_goal,
            reason: format!(
                "You've missed {} of the last 7 days. Lower your goal to {} min to stay consistent?",
                days_missed, new_goal
            ),
        });
    }

    None
}

// ---------------------------------------------------------------------------
// Adviser operations
// ---------------------------------------------------------------------------

/// Returns the pending proposal for the user, computing and persisting a new
/// one from the trailing window when none is pending and a trigger fires.
pub async fn suggest_goal(
    store: &dyn HabitStore,
    user_id: i64,
    today: NaiveDate,
) -> PortResult<Option<GoalAdjustment>> {
    let user = store.get_user(user_id).await?;

    if let Some(pending) = store.pending_adjustment(user_id).await? {
        return Ok(Some(pending));
    }

    let from = today - Duration::days(WINDOW_DAYS - 1);
    let totals = store.get_daily_totals(user_id, Some(from)).await?;
    let window: Vec<DayTotal> = totals
        .iter()
        .rev()
        .map(|(date, minutes)| DayTotal {
            date: *date,
            minutes: *minutes,
        })
        .collect();

    match propose(user.daily_goal_minutes, &window) {
        Some(proposal) => {
            let adjustment = store
                .create_adjustment(
                    user_id,
                    user.daily_goal_minutes,
                    proposal.new_goal,
                    &proposal.reason,
                )
                .await?;
            Ok(Some(adjustment))
        }
        None => Ok(None),
    }
}

/// Accepts a proposal: marks it accepted and copies the new goal onto the
/// user. Unknown ids, and ids belonging to another user, are NotFound.
pub async fn accept_adjustment(
    store: &dyn HabitStore,
    adjustment_id: i64,
    user_id: i64,
) -> PortResult<u32> {
    let adjustment = store.get_adjustment(adjustment_id).await?;
    if adjustment.user_id != user_id {
        return Err(PortError::NotFound(format!(
            "Adjustment {} not found for user {}",
            adjustment_id, user_id
        )));
    }

    store.mark_adjustment_accepted(adjustment_id).await?;
    store.update_goal(user_id, adjustment.new_goal).await?;
    Ok(adjustment.new_goal)
}

/// Dismisses a proposal. Terminal; there is no un-dismiss.
pub async fn dismiss_adjustment(store: &dyn HabitStore, adjustment_id: i64) -> PortResult<()> {
    store.get_adjustment(adjustment_id).await?;
    store.mark_adjustment_dismissed(adjustment_id).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn window(minutes: &[f64]) -> Vec<DayTotal> {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        minutes
            .iter()
            .enumerate()
            .map(|(i, m)| DayTotal {
                date: today - Duration::days(i as i64),
                minutes: *m,
            })
            .collect()
    }

    #[test]
    fn raise_fires_on_strong_two_weeks() {
        // 14 days averaging 30 min against a 20 min goal, every one of the
        // last 7 met: propose 30 (nearest 5, capped at 60).
        let days = window(&[30.0; 14]);
        let proposal = propose(20, &days).expect("raise should fire");
        assert_eq!(proposal.new_goal, 30);
        assert!(proposal.reason.contains("raise"));
    }

    #[test]
    fn raise_needs_every_one_of_the_last_seven() {
        let mut minutes = [30.0; 14];
        minutes[3] = 10.0;
        assert!(propose(20, &window(&minutes)).is_none());
    }

    #[test]
    fn raise_needs_average_above_factor() {
        // All 7 met, but 22 min average is below 1.2 * 20.
        let days = window(&[22.0; 14]);
        assert!(propose(20, &days).is_none());
    }

    #[test]
    fn raise_is_capped_at_the_ceiling() {
        let days = window(&[90.0; 14]);
        let proposal = propose(55, &days).expect("raise should fire");
        assert_eq!(proposal.new_goal, GOAL_CEILING);
    }

    #[test]
    fn raise_already_at_ceiling_proposes_nothing() {
        let days = window(&[90.0; 14]);
        assert!(propose(60, &days).is_none());
    }

    #[test]
    fn lower_fires_after_three_misses() {
        // 4 of the last 7 data days below goal.
        let minutes = [25.0, 5.0, 5.0, 25.0, 5.0, 5.0, 25.0, 25.0, 25.0, 25.0];
        let proposal = propose(20, &window(&minutes)).expect("lower should fire");
        assert_eq!(proposal.new_goal, 15);
        assert!(proposal.reason.contains("missed 4"));
    }

    #[test]
    fn lower_never_goes_below_the_floor() {
        let minutes = [5.0; 7];
        let proposal = propose(12, &window(&minutes)).expect("lower should fire");
        assert_eq!(proposal.new_goal, GOAL_FLOOR);
    }

    #[test]
    fn lower_at_the_floor_proposes_nothing() {
        let minutes = [5.0; 7];
        assert!(propose(10, &window(&minutes)).is_none());
    }

    #[test]
    fn two_misses_are_tolerated() {
        let minutes = [25.0, 5.0, 25.0, 5.0, 25.0, 25.0, 25.0];
        assert!(propose(20, &window(&minutes)).is_none());
    }

    #[test]
    fn fewer_than_seven_data_days_is_insufficient() {
        let days = window(&[45.0; 6]);
        assert!(propose(20, &days).is_none());
    }

    #[test]
    fn average_spans_the_whole_window_not_just_last_seven() {
        // Last 7 all met at 30, but 7 older weak days drag the 14-day
        // average to 20, under the 24 needed to raise a 20 min goal.
        let minutes = [30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0];
        assert!(propose(20, &window(&minutes)).is_none());
    }
}
