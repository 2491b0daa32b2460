//! User creation and settings updates against a real (in-memory) store.

mod helpers;

use helpers::{seed_user, test_store};
use momentum_core::domain::PreferredTime;
use momentum_core::ports::{HabitStore, PortError};
use momentum_core::settings;

#[tokio::test]
async fn created_users_start_with_a_clean_slate() {
    let store = test_store().await;

    let user = settings::create_user(&store, "Night Owl", 25, PreferredTime::Evening)
        .await
        .expect("Should create user");

    assert_eq!(user.daily_goal_minutes, 25);
    assert_eq!(user.current_streak, 0);
    assert_eq!(user.longest_streak, 0);
    assert_eq!(user.shields_available, 0);
    assert_eq!(user.streak_start_date, None);
}

#[tokio::test]
async fn zero_minute_goals_are_rejected() {
    let store = test_store().await;

    let result = settings::create_user(&store, "Eager", 0, PreferredTime::Morning).await;
    assert!(matches!(result, Err(PortError::InvalidInput(_))));

    let user = seed_user(&store, 20).await;
    let result = settings::update_settings(&store, user.id, Some(0), None).await;
    assert!(matches!(result, Err(PortError::InvalidInput(_))));

    let reloaded = store.get_user(user.id).await.expect("Should reload user");
    assert_eq!(reloaded.daily_goal_minutes, 20);
}

#[tokio::test]
async fn settings_update_applies_only_the_given_fields() {
    let store = test_store().await;
    let user = seed_user(&store, 20).await;

    settings::update_settings(&store, user.id, Some(35), None)
        .await
        .expect("Should update goal");
    let reloaded = store.get_user(user.id).await.expect("Should reload user");
    assert_eq!(reloaded.daily_goal_minutes, 35);
    assert_eq!(reloaded.preferred_reading_time, PreferredTime::Evening);

    settings::update_settings(&store, user.id, None, Some(PreferredTime::Morning))
        .await
        .expect("Should update preference");
    let reloaded = store.get_user(user.id).await.expect("Should reload user");
    assert_eq!(reloaded.daily_goal_minutes, 35);
    assert_eq!(reloaded.preferred_reading_time, PreferredTime::Morning);
}

#[tokio::test]
async fn updating_an_unknown_user_is_not_found() {
    let store = test_store().await;

    let result = settings::update_settings(&store, 777, Some(30), None).await;
    assert!(matches!(result, Err(PortError::NotFound(_))));
}
