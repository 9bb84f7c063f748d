//! Activity management service
//!
//! Create/update normalize the submitted schedule into the storage shape the
//! evaluator consumes: date-only bounds become day-spanning instants, weekly
//! with every weekday collapses to daily, and window durations become end
//! times.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::{
    api::activities::{ActivityDetail, QrTokenResponse},
    checkin::qr,
    error::{AppError, AppResult},
    models::activity::{
        Activity, ActivityQuery, ActivitySummary, CreateActivity, NewActivity, RepeatMode,
        UpdateActivity,
    },
    models::participation::Participation,
    repository::Repository,
};

/// Default QR rotation when the request leaves it unset
const DEFAULT_QR_REFRESH_S: i32 = 60;

/// Normalized schedule columns shared by create and update
#[derive(Debug, Clone, PartialEq)]
struct Schedule {
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    repeat_mode: RepeatMode,
    repeat_weekdays: Vec<i16>,
    window_start: Option<NaiveTime>,
    window_end: Option<NaiveTime>,
}

/// Schedule fields as submitted, before normalization
#[derive(Debug, Clone, Default)]
struct ScheduleInput {
    repeat_mode: RepeatMode,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    repeat_weekdays: Vec<i16>,
    window_start: Option<NaiveTime>,
    window_end: Option<NaiveTime>,
    window_duration_minutes: Option<i64>,
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc()
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(23, 59, 59).unwrap().and_utc()
}

/// Validate and normalize a submitted schedule into storage shape.
fn normalize_schedule(input: ScheduleInput) -> AppResult<Schedule> {
    if input.repeat_mode == RepeatMode::None {
        let start = input.start_time.ok_or_else(|| {
            AppError::Validation("start_time is required for one-shot activities".to_string())
        })?;
        let end = input.end_time.ok_or_else(|| {
            AppError::Validation("end_time is required for one-shot activities".to_string())
        })?;
        if end < start {
            return Err(AppError::Validation(
                "end_time must not precede start_time".to_string(),
            ));
        }
        return Ok(Schedule {
            start_time: start,
            end_time: Some(end),
            repeat_mode: RepeatMode::None,
            repeat_weekdays: vec![],
            window_start: None,
            window_end: None,
        });
    }

    // Recurring: date-only bounds, a missing end date means open-ended
    let start_date = input
        .start_date
        .or_else(|| input.start_time.map(|t| t.date_naive()))
        .ok_or_else(|| {
            AppError::Validation("start_date is required for recurring activities".to_string())
        })?;
    let end_date = input.end_date.or_else(|| input.end_time.map(|t| t.date_naive()));

    if let Some(end) = end_date {
        if end < start_date {
            return Err(AppError::Validation(
                "end_date must not precede start_date".to_string(),
            ));
        }
    }

    let window_start = input.window_start;
    let window_end = match (input.window_start, input.window_duration_minutes) {
        // NaiveTime addition wraps at midnight, which is exactly the
        // midnight-crossing window shape
        (Some(start), Some(minutes)) => Some(start + Duration::minutes(minutes)),
        _ => input.window_end,
    };

    let (repeat_mode, repeat_weekdays) = match input.repeat_mode {
        RepeatMode::Weekly => {
            let mut days = input.repeat_weekdays;
            days.sort_unstable();
            days.dedup();
            if days.is_empty() {
                return Err(AppError::Validation(
                    "weekly activities need at least one weekday".to_string(),
                ));
            }
            if days.iter().any(|d| !(1..=7).contains(d)) {
                return Err(AppError::Validation(
                    "Weekdays must be 1 (Monday) to 7 (Sunday)".to_string(),
                ));
            }
            if days.len() == 7 {
                // Every weekday selected is just a daily activity
                (RepeatMode::Daily, vec![])
            } else {
                (RepeatMode::Weekly, days)
            }
        }
        _ => (RepeatMode::Daily, vec![]),
    };

    Ok(Schedule {
        start_time: day_start(start_date),
        end_time: end_date.map(day_end),
        repeat_mode,
        repeat_weekdays,
        window_start,
        window_end,
    })
}

#[derive(Clone)]
pub struct ActivitiesService {
    repository: Repository,
}

impl ActivitiesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search activities
    pub async fn search(&self, query: &ActivityQuery) -> AppResult<(Vec<ActivitySummary>, i64)> {
        self.repository.activities.search(query).await
    }

    /// Activity with its enrolled participants
    pub async fn get_detail(&self, id: i32) -> AppResult<ActivityDetail> {
        let activity = self.repository.activities.get(id).await?;
        let participants = self.repository.participations.list_for_activity(id).await?;

        Ok(ActivityDetail {
            activity,
            participants,
        })
    }

    /// Create a new activity; the QR secret is generated here and never
    /// leaves the server.
    pub async fn create(&self, create: CreateActivity, created_by: i32) -> AppResult<Activity> {
        let schedule = normalize_schedule(ScheduleInput {
            repeat_mode: create.repeat_mode.unwrap_or(RepeatMode::None),
            start_time: create.start_time,
            end_time: create.end_time,
            start_date: create.start_date,
            end_date: create.end_date,
            repeat_weekdays: create.repeat_weekdays.unwrap_or_default(),
            window_start: create.window_start,
            window_end: create.window_end,
            window_duration_minutes: create.window_duration_minutes,
        })?;

        let new_activity = NewActivity {
            name: create.name,
            description: create.description.unwrap_or_default(),
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            repeat_mode: schedule.repeat_mode,
            repeat_weekdays: schedule.repeat_weekdays,
            window_start: schedule.window_start,
            window_end: schedule.window_end,
            location_enabled: create.location_enabled,
            location_lat: create.location_lat,
            location_lng: create.location_lng,
            location_radius_m: create.location_radius_m,
            qr_enabled: create.qr_enabled,
            qr_refresh_interval_s: create.qr_refresh_interval_s.unwrap_or(DEFAULT_QR_REFRESH_S),
            qr_secret: qr::generate_secret(),
            created_by,
        };

        let activity = self.repository.activities.create(&new_activity).await?;

        if let Some(ref participant_ids) = create.participant_ids {
            self.repository
                .participations
                .replace_for_activity(activity.id, participant_ids)
                .await?;
        }

        Ok(activity)
    }

    /// Update an activity; missing schedule fields keep their stored values.
    pub async fn update(&self, id: i32, update: UpdateActivity) -> AppResult<Activity> {
        let mut activity = self.repository.activities.get(id).await?;

        let schedule = normalize_schedule(ScheduleInput {
            repeat_mode: update.repeat_mode.unwrap_or(activity.repeat_mode),
            start_time: update.start_time.or(Some(activity.start_time)),
            end_time: update.end_time.or(activity.end_time),
            start_date: update.start_date,
            end_date: update.end_date,
            repeat_weekdays: update
                .repeat_weekdays
                .unwrap_or_else(|| activity.repeat_weekdays.clone()),
            window_start: update.window_start.or(activity.window_start),
            window_end: update.window_end.or(activity.window_end),
            window_duration_minutes: update.window_duration_minutes,
        })?;

        if let Some(name) = update.name {
            activity.name = name;
        }
        if let Some(description) = update.description {
            activity.description = description;
        }
        activity.start_time = schedule.start_time;
        activity.end_time = schedule.end_time;
        activity.repeat_mode = schedule.repeat_mode;
        activity.repeat_weekdays = schedule.repeat_weekdays;
        activity.window_start = schedule.window_start;
        activity.window_end = schedule.window_end;
        if let Some(location_enabled) = update.location_enabled {
            activity.location_enabled = location_enabled;
        }
        if update.location_lat.is_some() {
            activity.location_lat = update.location_lat;
        }
        if update.location_lng.is_some() {
            activity.location_lng = update.location_lng;
        }
        if update.location_radius_m.is_some() {
            activity.location_radius_m = update.location_radius_m;
        }
        if let Some(qr_enabled) = update.qr_enabled {
            activity.qr_enabled = qr_enabled;
        }
        if let Some(interval) = update.qr_refresh_interval_s {
            activity.qr_refresh_interval_s = interval;
        }
        if let Some(active) = update.active {
            activity.active = active;
        }

        let updated = self.repository.activities.update(&activity).await?;

        if let Some(ref participant_ids) = update.participant_ids {
            self.repository
                .participations
                .replace_for_activity(updated.id, participant_ids)
                .await?;
        }

        Ok(updated)
    }

    /// Manual early close
    pub async fn close(&self, id: i32) -> AppResult<Activity> {
        self.repository.activities.close(id, Utc::now()).await
    }

    /// Delete an activity with its enrollment and records
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.activities.delete(id).await
    }

    /// Flip one participant's eligibility
    pub async fn set_participant_eligibility(
        &self,
        activity_id: i32,
        user_id: i32,
        can_participate: bool,
    ) -> AppResult<Participation> {
        self.repository.activities.get(activity_id).await?;
        self.repository
            .participations
            .set_eligibility(activity_id, user_id, can_participate)
            .await
    }

    /// Current token for the presenter screen, with rotation metadata.
    pub async fn presenter_token(&self, id: i32) -> AppResult<QrTokenResponse> {
        let activity = self.repository.activities.get(id).await?;

        if !activity.qr_enabled {
            return Err(AppError::BusinessRule(
                "QR check-in is not enabled for this activity".to_string(),
            ));
        }

        let now = Utc::now();
        let token = qr::current_token(&activity, now)
            .ok_or_else(|| AppError::Internal("Activity has no QR secret".to_string()))?;
        let interval_s = qr::refresh_interval(&activity);
        let expires_in_s = interval_s - now.timestamp().rem_euclid(interval_s);

        Ok(QrTokenResponse {
            token,
            interval_s,
            expires_in_s,
        })
    }

    /// Disable activities whose end instant has passed (background sweep)
    pub async fn close_expired(&self) -> AppResult<u64> {
        self.repository.activities.close_expired(Utc::now()).await
    }
}
