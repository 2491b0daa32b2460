//! Goal adviser behavior against a real (in-memory) store: trigger firing,
//! pending-proposal uniqueness, and the accept/dismiss lifecycle.

mod helpers;

use helpers::{seed_session, seed_user, test_store, today};
use momentum_core::goals;
use momentum_core::ports::{HabitStore, PortError};

#[tokio::test]
async fn strong_two_weeks_propose_a_raise() {
    let store = test_store().await;
    let user = seed_user(&store, 20).await;
    // 14 days at 30 min: average 30 > 24, every one of the last 7 met.
    for ago in 0..14 {
        seed_session(&store, user.id, ago, 30.0).await;
    }

    let suggestion = goals::suggest_goal(&store, user.id, today())
        .await
        .expect("Should evaluate window")
        .expect("Raise should fire");

    assert_eq!(suggestion.old_goal, 20);
    assert_eq!(suggestion.new_goal, 30);
    assert!(suggestion.is_pending());
    assert!(suggestion.reason.contains("30 min"));
}

#[tokio::test]
async fn repeated_misses_propose_a_lower_goal() {
    let store = test_store().await;
    let user = seed_user(&store, 20).await;
    // Last 7 data days: 4 below goal. Older days fill out the sample.
    let short_days = [1, 2, 4, 5];
    for ago in 0..7 {
        let minutes = if short_days.contains(&ago) { 5.0 } else { 25.0 };
        seed_session(&store, user.id, ago, minutes).await;
    }
    for ago in 7..10 {
        seed_session(&store, user.id, ago, 25.0).await;
    }

    let suggestion = goals::suggest_goal(&store, user.id, today())
        .await
        .expect("Should evaluate window")
        .expect("Lower should fire");

    assert_eq!(suggestion.new_goal, 15);
    assert!(suggestion.reason.contains("missed 4"));
}

#[tokio::test]
async fn fewer_than_seven_data_days_yields_nothing() {
    let store = test_store().await;
    let user = seed_user(&store, 20).await;
    for ago in 0..6 {
        seed_session(&store, user.id, ago, 45.0).await;
    }

    let suggestion = goals::suggest_goal(&store, user.id, today())
        .await
        .expect("Should evaluate window");
    assert!(suggestion.is_none());
}

#[tokio::test]
async fn old_data_outside_the_window_is_ignored() {
    let store = test_store().await;
    let user = seed_user(&store, 20).await;
    // Plenty of strong days, all older than the trailing 14.
    for ago in 20..30 {
        seed_session(&store, user.id, ago, 45.0).await;
    }

    let suggestion = goals::suggest_goal(&store, user.id, today())
        .await
        .expect("Should evaluate window");
    assert!(suggestion.is_none());
}

#[tokio::test]
async fn a_pending_proposal_is_returned_unchanged() {
    let store = test_store().await;
    let user = seed_user(&store, 20).await;
    for ago in 0..14 {
        seed_session(&store, user.id, ago, 30.0).await;
    }

    let first = goals::suggest_goal(&store, user.id, today())
        .await
        .expect("Should evaluate window")
        .expect("Raise should fire");

    // More reading arrives; the pending proposal still wins, unrecomputed.
    seed_session(&store, user.id, 0, 60.0).await;
    let second = goals::suggest_goal(&store, user.id, today())
        .await
        .expect("Should evaluate window")
        .expect("Pending should be returned");

    assert_eq!(second.id, first.id);
    assert_eq!(second.new_goal, first.new_goal);
}

#[tokio::test]
async fn racing_inserts_cannot_create_two_pending_proposals() {
    let store = test_store().await;
    let user = seed_user(&store, 20).await;

    let first = store
        .create_adjustment(user.id, 20, 25, "first")
        .await
        .expect("Should create adjustment");
    // A second insert slipping past the check-before-insert collapses onto
    // the surviving pending row instead of duplicating it.
    let second = store
        .create_adjustment(user.id, 20, 30, "second")
        .await
        .expect("Should fall back to the pending row");

    assert_eq!(second.id, first.id);
    assert_eq!(second.new_goal, 25);

    // Resolving the single pending row leaves none behind.
    store
        .mark_adjustment_dismissed(first.id)
        .await
        .expect("Should dismiss");
    let pending = store
        .pending_adjustment(user.id)
        .await
        .expect("Should query pending");
    assert!(pending.is_none());
}

#[tokio::test]
async fn accepting_applies_the_new_goal_to_the_user() {
    let store = test_store().await;
    let user = seed_user(&store, 20).await;
    for ago in 0..14 {
        seed_session(&store, user.id, ago, 30.0).await;
    }

    let suggestion = goals::suggest_goal(&store, user.id, today())
        .await
        .expect("Should evaluate window")
        .expect("Raise should fire");

    let new_goal = goals::accept_adjustment(&store, suggestion.id, user.id)
        .await
        .expect("Should accept");
    assert_eq!(new_goal, 30);

    let reloaded = store.get_user(user.id).await.expect("Should reload user");
    assert_eq!(reloaded.daily_goal_minutes, 30);

    let adjustment = store
        .get_adjustment(suggestion.id)
        .await
        .expect("Should reload adjustment");
    assert!(adjustment.accepted);
    assert!(!adjustment.is_pending());

    // With the raise applied, the same window no longer clears the bar.
    let next = goals::suggest_goal(&store, user.id, today())
        .await
        .expect("Should evaluate window");
    assert!(next.is_none());
}

#[tokio::test]
async fn accepting_someone_elses_adjustment_is_not_found() {
    let store = test_store().await;
    let owner = seed_user(&store, 20).await;
    let other = seed_user(&store, 20).await;

    let adjustment = store
        .create_adjustment(owner.id, 20, 25, "raise")
        .await
        .expect("Should create adjustment");

    let result = goals::accept_adjustment(&store, adjustment.id, other.id).await;
    assert!(matches!(result, Err(PortError::NotFound(_))));

    // The owner's goal is untouched.
    let reloaded = store.get_user(owner.id).await.expect("Should reload user");
    assert_eq!(reloaded.daily_goal_minutes, 20);
}

#[tokio::test]
async fn dismissal_is_terminal_and_frees_the_slot() {
    let store = test_store().await;
    let user = seed_user(&store, 20).await;
    for ago in 0..14 {
        seed_session(&store, user.id, ago, 30.0).await;
    }

    let suggestion = goals::suggest_goal(&store, user.id, today())
        .await
        .expect("Should evaluate window")
        .expect("Raise should fire");

    goals::dismiss_adjustment(&store, suggestion.id)
        .await
        .expect("Should dismiss");

    let adjustment = store
        .get_adjustment(suggestion.id)
        .await
        .expect("Should reload adjustment");
    assert!(adjustment.dismissed);
    assert!(!adjustment.accepted);

    // The slot is free again; the unchanged window fires a fresh proposal.
    let next = goals::suggest_goal(&store, user.id, today())
        .await
        .expect("Should evaluate window")
        .expect("Raise should fire again");
    assert_ne!(next.id, suggestion.id);
}

#[tokio::test]
async fn dismissing_an_unknown_adjustment_is_not_found() {
    let store = test_store().await;

    let result = goals::dismiss_adjustment(&store, 4242).await;
    assert!(matches!(result, Err(PortError::NotFound(_))));
}

#[tokio::test]
async fn suggesting_for_an_unknown_user_is_not_found() {
    let store = test_store().await;

    let result = goals::suggest_goal(&store, 9999, today()).await;
    assert!(matches!(result, Err(PortError::NotFound(_))));
}
