//! Data models for Rollcall

pub mod activity;
pub mod participation;
pub mod record;
pub mod settings;
pub mod user;

// Re-export commonly used types
pub use activity::{Activity, ActivitySummary, RepeatMode};
pub use participation::Participation;
pub use record::{CheckInRecord, CheckInStatus};
pub use settings::SiteSettings;
pub use user::{User, UserShort};
