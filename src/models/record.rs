//! Check-in record model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// CheckInStatus
// ---------------------------------------------------------------------------

/// Attendance status of a record
///
/// Self-service check-ins always produce `present`; the other values are
/// administrative overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CheckInStatus {
    Present,
    /// Checked in by someone else on the user's behalf
    Proxy,
    Excused,
    Absent,
}

impl CheckInStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInStatus::Present => "present",
            CheckInStatus::Proxy => "proxy",
            CheckInStatus::Excused => "excused",
            CheckInStatus::Absent => "absent",
        }
    }
}

impl std::fmt::Display for CheckInStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CheckInStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "present" => Ok(CheckInStatus::Present),
            "proxy" => Ok(CheckInStatus::Proxy),
            "excused" => Ok(CheckInStatus::Excused),
            "absent" => Ok(CheckInStatus::Absent),
            _ => Err(format!("Invalid check-in status: {}", s)),
        }
    }
}

// SQLx conversion for CheckInStatus (stored as TEXT)
impl sqlx::Type<Postgres> for CheckInStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for CheckInStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for CheckInStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

// ---------------------------------------------------------------------------
// CheckInRecord
// ---------------------------------------------------------------------------

/// Evidence of one user's successful check-in to one activity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CheckInRecord {
    pub id: i32,
    pub activity_id: i32,
    pub user_id: i32,
    /// Set at insert, immutable
    pub checkin_time: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip_address: Option<String>,
    pub user_agent: String,
    pub status: CheckInStatus,
    pub status_note: String,
}

/// Administrative status override request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecordStatus {
    pub status: CheckInStatus,
    pub status_note: Option<String>,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// A user who has checked in, for the stats view
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CheckedEntry {
    pub record_id: i32,
    pub user_id: i32,
    pub username: String,
    pub display_name: String,
    pub checkin_time: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub status: CheckInStatus,
    pub status_note: String,
}

/// An enrolled user who has not checked in, for the stats view
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UncheckedEntry {
    pub user_id: i32,
    pub username: String,
    pub display_name: String,
}

/// Per-activity attendance statistics
#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityStats {
    pub activity_id: i32,
    pub activity_name: String,
    pub checked: Vec<CheckedEntry>,
    pub unchecked: Vec<UncheckedEntry>,
    pub checked_count: i64,
    pub unchecked_count: i64,
    pub total_participants: i64,
}
