//! crates/momentum_core/src/settings.rs
//!
//! User creation and the settings-update path. These are the only writers of
//! the goal and preference fields outside of an accepted goal adjustment.

use crate::domain::{PreferredTime, User};
use crate::ports::{HabitStore, PortError, PortResult};

fn validate_goal(daily_goal_minutes: u32) -> PortResult<()> {
    if daily_goal_minutes == 0 {
        return Err(PortError::InvalidInput(
            "daily goal must be at least one minute".to_string(),
        ));
    }
    Ok(())
}

/// Creates a user. Any caller-chosen name works; nothing in the system
/// assumes a particular user id.
pub async fn create_user(
    store: &dyn HabitStore,
    name: &str,
    daily_goal_minutes: u32,
    preferred_reading_time: PreferredTime,
) -> PortResult<User> {
    if name.trim().is_empty() {
        return Err(PortError::InvalidInput("name must not be empty".to_string()));
    }
    validate_goal(daily_goal_minutes)?;
    store
        .create_user(name, daily_goal_minutes, preferred_reading_time)
        .await
}

/// Applies whichever settings are present, validating everything before the
/// first write.
pub async fn update_settings(
    store: &dyn HabitStore,
    user_id: i64,
    daily_goal_minutes: Option<u32>,
    preferred_reading_time: Option<PreferredTime>,
) -> PortResult<()> {
    if let Some(goal) = daily_goal_minutes {
        validate_goal(goal)?;
    }
    store.get_user(user_id).await?;

    if let Some(goal) = daily_goal_minutes {
        store.update_goal(user_id, goal).await?;
    }
    if let Some(preferred) = preferred_reading_time {
        store.update_preferred_time(user_id, preferred).await?;
    }
    Ok(())
}
