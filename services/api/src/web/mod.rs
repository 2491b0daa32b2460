pub mod rest;
pub mod state;

// Re-export the OpenAPI definition and the handlers so the binary that
// builds the web server router can reach them easily.
pub use rest::{
    accept_goal_handler, create_user_handler, dismiss_goal_handler, get_user_handler,
    goal_suggestion_handler, heatmap_handler, list_sessions_handler, log_session_handler,
    nudge_handler, streak_history_handler, update_settings_handler, ApiDoc,
};
