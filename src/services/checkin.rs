//! Check-in orchestration service
//!
//! Fetches the state snapshot, runs the pure decision ladder, and persists
//! the record when the attempt is accepted. The evaluation instant is always
//! the server clock.

use chrono::Utc;
use std::collections::HashMap;

use crate::{
    checkin::{availability, decision, Decision, RejectReason},
    error::{AppError, AppResult},
    models::activity::DashboardActivity,
    models::record::CheckInRecord,
    repository::{records::NewRecord, Repository},
};

/// One check-in attempt as received from the web layer
#[derive(Debug, Clone)]
pub struct CheckinRequest {
    pub activity_id: i32,
    pub user_id: i32,
    pub coordinate: Option<(f64, f64)>,
    pub qr_token: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: String,
}

/// Terminal outcome delivered to the handler
#[derive(Debug)]
pub enum CheckinOutcome {
    Accepted(CheckInRecord),
    Rejected(RejectReason),
}

#[derive(Clone)]
pub struct CheckinService {
    repository: Repository,
}

impl CheckinService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Evaluate one attempt and insert the record on acceptance.
    pub async fn attempt(&self, request: &CheckinRequest) -> AppResult<CheckinOutcome> {
        let instant = Utc::now();

        let activity = self
            .repository
            .activities
            .get_optional(request.activity_id)
            .await?;

        // Eligibility and duplicates only matter once the activity is live
        let (eligible, already_checked_in) = match activity {
            Some(ref a) if a.active => (
                self.repository
                    .participations
                    .is_eligible(a.id, request.user_id)
                    .await?,
                self.repository.records.exists(a.id, request.user_id).await?,
            ),
            _ => (false, false),
        };

        let outcome = decision::evaluate(
            activity.as_ref(),
            eligible,
            already_checked_in,
            request.coordinate,
            request.qr_token.as_deref(),
            instant,
        );

        match outcome {
            Decision::Rejected(reason) => Ok(CheckinOutcome::Rejected(reason)),
            Decision::Accepted => {
                let new_record = NewRecord {
                    activity_id: request.activity_id,
                    user_id: request.user_id,
                    latitude: request.coordinate.map(|(lat, _)| lat),
                    longitude: request.coordinate.map(|(_, lng)| lng),
                    ip_address: request.ip_address.clone(),
                    user_agent: request.user_agent.clone(),
                };

                match self.repository.records.insert(&new_record).await {
                    Ok(record) => Ok(CheckinOutcome::Accepted(record)),
                    // A concurrent duplicate loses the race at the unique
                    // index; it is a decision, not a storage failure
                    Err(err) if is_unique_violation(&err) => {
                        Ok(CheckinOutcome::Rejected(RejectReason::AlreadyCheckedIn))
                    }
                    Err(err) => Err(err),
                }
            }
        }
    }

    /// Activities on the caller's dashboard, annotated with live open state
    /// and the caller's own record.
    pub async fn dashboard(&self, user_id: i32) -> AppResult<Vec<DashboardActivity>> {
        let now = Utc::now();

        let activities = self
            .repository
            .activities
            .list_for_participant(user_id)
            .await?;
        let records: HashMap<i32, CheckInRecord> = self
            .repository
            .records
            .list_for_user(user_id)
            .await?
            .into_iter()
            .map(|r| (r.activity_id, r))
            .collect();

        let dashboard = activities
            .into_iter()
            .map(|a| {
                let open_now = availability::is_open(&a, now);
                let record = records.get(&a.id);
                DashboardActivity {
                    id: a.id,
                    name: a.name,
                    description: a.description,
                    start_time: a.start_time,
                    end_time: a.end_time,
                    repeat_mode: a.repeat_mode,
                    window_start: a.window_start,
                    window_end: a.window_end,
                    location_enabled: a.location_enabled,
                    qr_enabled: a.qr_enabled,
                    open_now,
                    has_checked_in: record.is_some(),
                    checkin_time: record.map(|r| r.checkin_time),
                }
            })
            .collect();

        Ok(dashboard)
    }
}

/// PostgreSQL 23505 unique_violation, raised by the `(activity_id, user_id)`
/// index when two requests race past the existence check.
fn is_unique_violation(err: &AppError) -> bool {
    match err {
        AppError::Database(sqlx::Error::Database(db_err)) => {
            db_err.code().as_deref() == Some("23505")
        }
        _ => false,
    }
}
