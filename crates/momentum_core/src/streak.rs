//! crates/momentum_core/src/streak.rs
//!
//! The streak engine: a backward day-by-day walk over per-day reading totals
//! with shield forgiveness, shield accrual and streak-history archival.
//!
//! The walk itself is pure arithmetic over a date-keyed map; `compute_streak`
//! wraps it with the load/persist choreography and is called on every user
//! read and after every logged session.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

use crate::ports::{HabitStore, PortResult};

/// Shield balances never grow past this, no matter how long the streak runs.
pub const SHIELD_CAP: u32 = 3;

/// One shield is granted for every this many full days of streak.
const DAYS_PER_SHIELD: u32 = 7;

// ---------------------------------------------------------------------------
// Pure walk
// ---------------------------------------------------------------------------

/// Result of the backward walk, before any persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakWalk {
    /// Consecutive goal-met-or-shielded days ending at the anchor.
    pub length: u32,
    /// Shields the walk had to consume to reach that length.
    pub shields_spent: u32,
    /// The day the walk started from: today if today's goal is met,
    /// otherwise yesterday. The streak covers `anchor - (length - 1) ..= anchor`.
    pub anchor: NaiveDate,
}

impl StreakWalk {
    /// First day of the streak, absent when the streak is zero.
    pub fn start_date(&self) -> Option<NaiveDate> {
        (self.length > 0).then(|| self.anchor - Duration::days(i64::from(self.length) - 1))
    }
}

/// Walks backward from today applying the goal-met / shield / break rules.
///
/// Today not yet being met is not a failure: the walk then anchors at
/// yesterday so an in-progress day cannot break the streak prematurely.
/// A shield is only ever spent to extend a streak that has already begun.
pub fn walk(
    totals: &BTreeMap<NaiveDate, f64>,
    goal_minutes: u32,
    shields_available: u32,
    today: NaiveDate,
) -> StreakWalk {
    let goal = f64::from(goal_minutes);
    let met = |date: &NaiveDate| totals.get(date).is_some_and(|total| *total >= goal);

    let anchor = if met(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut length = 0u32;
    let mut shields_spent = 0u32;
    let mut date = anchor;
    loop {
        if met(&date) {
            length += 1;
        } else if shields_spent < shields_available && length > 0 {
            shields_spent += 1;
            length += 1;
        } else {
            break;
        }
        date -= Duration::days(1);
    }

    StreakWalk {
        length,
        shields_spent,
        anchor,
    }
}

/// Shields granted for a freshly computed streak length.
///
/// Earned against the post-walk length, independent of any shields just
/// spent; the cap applies to the balance the grant lands on.
pub fn shields_earned(length: u32, balance_after_spend: u32) -> u32 {
    (length / DAYS_PER_SHIELD).min(SHIELD_CAP.saturating_sub(balance_after_spend))
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Outcome of a full recomputation, after persistence.
#[derive(Debug, Clone)]
pub struct StreakReport {
    pub length: u32,
    pub shields_spent: u32,
    /// Balance after spending and accrual, always within 0..=3.
    pub shields_available: u32,
    pub longest: u32,
    /// Set when the walk consumed at least one shield; surfaced to the
    /// caller for display.
    pub shield_message: Option<String>,
}

/// Recomputes the streak for a user and persists the result.
///
/// Spending and earning shields in the same pass are two independent steps:
/// the spend is checked against the pre-walk balance, the accrual against
/// the resulting streak length, and both apply additively.
pub async fn compute_streak(
    store: &dyn HabitStore,
    user_id: i64,
    today: NaiveDate,
) -> PortResult<StreakReport> {
    let user = store.get_user(user_id).await?;
    let totals = store.get_daily_totals(user_id, None).await?;

    let walk = walk(&totals, user.daily_goal_minutes, user.shields_available, today);

    let mut shields = user.shields_available;
    let mut shield_message = None;
    if walk.shields_spent > 0 {
        shields -= walk.shields_spent;
        shield_message = Some(format!(
            "Shield used! Your {}-day streak lives on.",
            walk.length
        ));
    }
    shields += shields_earned(walk.length, shields);
    if shields != user.shields_available {
        store.update_shields(user_id, shields).await?;
    }

    // A stored streak collapsing to zero means it has ended for good; archive
    // the closed interval before overwriting it.
    if walk.length == 0 && user.current_streak > 0 {
        if let Some(start) = user.streak_start_date {
            let end = start + Duration::days(i64::from(user.current_streak) - 1);
            store
                .append_streak_history(user_id, start, end, user.current_streak)
                .await?;
        }
    }

    let longest = user.longest_streak.max(walk.length);
    store
        .update_streak(user_id, walk.length, longest, walk.start_date())
        .await?;

    Ok(StreakReport {
        length: walk.length,
        shields_spent: walk.shields_spent,
        shields_available: shields,
        longest,
        shield_message,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
