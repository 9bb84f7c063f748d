//! Activity model and related types

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

// ---------------------------------------------------------------------------
// RepeatMode
// ---------------------------------------------------------------------------

/// Activity recurrence mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Single occurrence bounded by start and end instants
    None,
    /// Repeats every day within the date range
    Daily,
    /// Repeats on selected ISO weekdays within the date range
    Weekly,
}

impl RepeatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatMode::None => "none",
            RepeatMode::Daily => "daily",
            RepeatMode::Weekly => "weekly",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, RepeatMode::None)
    }
}

impl Default for RepeatMode {
    fn default() -> Self {
        RepeatMode::None
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RepeatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(RepeatMode::None),
            "daily" => Ok(RepeatMode::Daily),
            "weekly" => Ok(RepeatMode::Weekly),
            _ => Err(format!("Invalid repeat mode: {}", s)),
        }
    }
}

impl From<String> for RepeatMode {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(RepeatMode::None)
    }
}

// SQLx conversion for RepeatMode (stored as TEXT)
impl sqlx::Type<Postgres> for RepeatMode {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for RepeatMode {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for RepeatMode {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// Full activity model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Activity {
    pub id: i32,
    /// Display name
    pub name: String,
    pub description: String,
    /// Start of the validity window (for recurring modes: first valid date)
    pub start_time: DateTime<Utc>,
    /// End of the validity window; NULL means open-ended for recurring modes
    pub end_time: Option<DateTime<Utc>>,
    pub repeat_mode: RepeatMode,
    /// ISO weekdays (1=Monday..7=Sunday), consulted only in weekly mode
    pub repeat_weekdays: Vec<i16>,
    /// Daily check-in window start; NULL means 00:00:00
    pub window_start: Option<NaiveTime>,
    /// Daily check-in window end; NULL means 23:59:59
    pub window_end: Option<NaiveTime>,
    pub location_enabled: bool,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    /// Geofence radius in meters; 0 or NULL disables the fence
    pub location_radius_m: Option<i32>,
    pub qr_enabled: bool,
    /// Token rotation interval in seconds, clamped to a minimum of 10 at use
    pub qr_refresh_interval_s: i32,
    /// Per-activity token secret, generated once at creation
    #[serde(skip_serializing)]
    pub qr_secret: String,
    /// Kill switch: a disabled activity is never open
    pub active: bool,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
}

/// Short activity representation for admin lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ActivitySummary {
    pub id: i32,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub repeat_mode: RepeatMode,
    pub location_enabled: bool,
    pub qr_enabled: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    /// Number of enrolled users
    pub participant_count: Option<i64>,
    /// Number of check-in records
    pub checkin_count: Option<i64>,
}

/// Activity as shown on a participant's dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardActivity {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub repeat_mode: RepeatMode,
    pub window_start: Option<NaiveTime>,
    pub window_end: Option<NaiveTime>,
    /// Whether a coordinate must be submitted with the check-in
    pub location_enabled: bool,
    /// Whether a scanned QR token must be submitted with the check-in
    pub qr_enabled: bool,
    /// Whether the activity accepts check-ins right now
    pub open_now: bool,
    pub has_checked_in: bool,
    pub checkin_time: Option<DateTime<Utc>>,
}

/// Normalized activity fields ready for insertion, produced by the
/// activities service after schedule validation
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub name: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub repeat_mode: RepeatMode,
    pub repeat_weekdays: Vec<i16>,
    pub window_start: Option<NaiveTime>,
    pub window_end: Option<NaiveTime>,
    pub location_enabled: bool,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub location_radius_m: Option<i32>,
    pub qr_enabled: bool,
    pub qr_refresh_interval_s: i32,
    pub qr_secret: String,
    pub created_by: i32,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Activity query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ActivityQuery {
    /// Search in activity name
    pub name: Option<String>,
    /// Filter by active flag
    pub active: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create activity request
///
/// One-shot activities (`repeat_mode = none`) supply `start_time` and
/// `end_time`. Recurring activities supply `start_date` and optionally
/// `end_date`; a missing end date means open-ended.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateActivity {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub repeat_mode: Option<RepeatMode>,
    /// ISO weekdays (1=Monday..7=Sunday) for weekly mode
    pub repeat_weekdays: Option<Vec<i16>>,
    /// First valid date for recurring modes (YYYY-MM-DD)
    pub start_date: Option<NaiveDate>,
    /// Last valid date for recurring modes; omit for open-ended
    pub end_date: Option<NaiveDate>,
    /// Daily window start (HH:MM:SS)
    pub window_start: Option<NaiveTime>,
    /// Daily window end; ignored when `window_duration_minutes` is given
    pub window_end: Option<NaiveTime>,
    /// Alternative to `window_end`: window length from `window_start`
    #[validate(range(min = 1, max = 1439, message = "Duration must be 1-1439 minutes"))]
    pub window_duration_minutes: Option<i64>,
    #[serde(default)]
    pub location_enabled: bool,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub location_lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub location_lng: Option<f64>,
    #[validate(range(min = 0, message = "Radius must not be negative"))]
    pub location_radius_m: Option<i32>,
    #[serde(default)]
    pub qr_enabled: bool,
    #[validate(range(min = 1, message = "Refresh interval must be positive"))]
    pub qr_refresh_interval_s: Option<i32>,
    /// Users to enroll at creation
    pub participant_ids: Option<Vec<i32>>,
}

/// Update activity request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateActivity {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub repeat_mode: Option<RepeatMode>,
    pub repeat_weekdays: Option<Vec<i16>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub window_start: Option<NaiveTime>,
    pub window_end: Option<NaiveTime>,
    #[validate(range(min = 1, max = 1439, message = "Duration must be 1-1439 minutes"))]
    pub window_duration_minutes: Option<i64>,
    pub location_enabled: Option<bool>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub location_lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub location_lng: Option<f64>,
    #[validate(range(min = 0, message = "Radius must not be negative"))]
    pub location_radius_m: Option<i32>,
    pub qr_enabled: Option<bool>,
    #[validate(range(min = 1, message = "Refresh interval must be positive"))]
    pub qr_refresh_interval_s: Option<i32>,
    pub active: Option<bool>,
    /// Replaces the enrollment set when present
    pub participant_ids: Option<Vec<i32>>,
}
