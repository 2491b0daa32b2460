pub mod domain;
pub mod goals;
pub mod nudge;
pub mod ports;
pub mod sessions;
pub mod settings;
pub mod streak;

pub use domain::{GoalAdjustment, PreferredTime, ReadingSession, StreakHistoryEntry, User};
pub use ports::{HabitStore, PortError, PortResult};
