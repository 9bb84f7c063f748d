//! Activity availability evaluation
//!
//! Decides whether an activity accepts check-ins at a given instant, from
//! the activity's schedule configuration alone. Instants are UTC; dates,
//! times of day, and weekdays are read off the UTC calendar.

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc};

use crate::models::activity::{Activity, RepeatMode};

/// Window bounds applied when no explicit daily window is configured
const ALL_DAY_START: (u32, u32, u32) = (0, 0, 0);
const ALL_DAY_END: (u32, u32, u32) = (23, 59, 59);

/// Returns true if the activity accepts check-ins at `instant`.
///
/// The kill switch wins over everything. One-shot activities are open
/// between their start and end instants, inclusive. Recurring activities
/// are open on valid dates, inside the daily window, and (for weekly mode)
/// on a selected ISO weekday. All bounds are inclusive.
pub fn is_open(activity: &Activity, instant: DateTime<Utc>) -> bool {
    if !activity.active {
        return false;
    }

    if activity.repeat_mode == RepeatMode::None {
        if instant < activity.start_time {
            return false;
        }
        return match activity.end_time {
            Some(end) => instant <= end,
            None => true,
        };
    }

    // Recurring: date range is compared at day granularity
    let current_date = instant.date_naive();
    if current_date < activity.start_time.date_naive() {
        return false;
    }
    if let Some(end) = activity.end_time {
        if current_date > end.date_naive() {
            return false;
        }
    }

    let window_start = activity.window_start.unwrap_or_else(|| {
        NaiveTime::from_hms_opt(ALL_DAY_START.0, ALL_DAY_START.1, ALL_DAY_START.2).unwrap()
    });
    let window_end = activity.window_end.unwrap_or_else(|| {
        NaiveTime::from_hms_opt(ALL_DAY_END.0, ALL_DAY_END.1, ALL_DAY_END.2).unwrap()
    });
    let current_time = truncate_to_second(instant.time());

    let in_window = if window_start <= window_end {
        window_start <= current_time && current_time <= window_end
    } else {
        // Window crosses midnight, e.g. 23:00-01:00
        current_time >= window_start || current_time <= window_end
    };
    if !in_window {
        return false;
    }

    match activity.repeat_mode {
        RepeatMode::Weekly => {
            let weekday = instant.weekday().number_from_monday() as i16;
            activity.repeat_weekdays.contains(&weekday)
        }
        _ => true,
    }
}

/// Drop sub-second precision so 23:59:59.5 still matches an inclusive
/// 23:59:59 bound.
fn truncate_to_second(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), t.second()).unwrap_or(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_activity() -> Activity {
        Activity {
            id: 1,
            name: "Morning assembly".to_string(),
            description: String::new(),
            start_time: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            end_time: Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()),
            repeat_mode: RepeatMode::None,
            repeat_weekdays: vec![],
            window_start: None,
            window_end: None,
            location_enabled: false,
            location_lat: None,
            location_lng: None,
            location_radius_m: None,
            qr_enabled: false,
            qr_refresh_interval_s: 60,
            qr_secret: "secret".to_string(),
            active: true,
            created_by: 1,
            created_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        }
    }

    fn recurring(mode: RepeatMode) -> Activity {
        let mut activity = base_activity();
        activity.repeat_mode = mode;
        activity.start_time = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        activity.end_time = Some(Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap());
        activity
    }

    #[test]
    fn test_inactive_is_never_open() {
        let mut activity = base_activity();
        activity.active = false;
        let inside = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        assert!(!is_open(&activity, inside));
    }

    #[test]
    fn test_single_shot_inclusive_bounds() {
        let activity = base_activity();
        let start = activity.start_time;
        let end = activity.end_time.unwrap();

        assert!(!is_open(&activity, start - chrono::Duration::seconds(1)));
        assert!(is_open(&activity, start));
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));
        assert!(is_open(&activity, end));
        assert!(!is_open(&activity, end + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_single_shot_without_end_stays_open() {
        let mut activity = base_activity();
        activity.end_time = None;
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()));
        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_daily_all_day_window() {
        let activity = recurring(RepeatMode::Daily);
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap()));
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_daily_respects_date_range() {
        let activity = recurring(RepeatMode::Daily);
        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()));
        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()));
        // Last valid date is open through its window
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_daily_open_ended() {
        let mut activity = recurring(RepeatMode::Daily);
        activity.end_time = None;
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2034, 3, 1, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_daily_window_bounds_inclusive() {
        let mut activity = recurring(RepeatMode::Daily);
        activity.window_start = NaiveTime::from_hms_opt(9, 0, 0);
        activity.window_end = NaiveTime::from_hms_opt(10, 0, 0);

        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 8, 59, 59).unwrap()));
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 9, 0, 0).unwrap()));
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 10, 0, 0).unwrap()));
        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 10, 0, 1).unwrap()));
    }

    #[test]
    fn test_midnight_crossing_window() {
        let mut activity = recurring(RepeatMode::Daily);
        activity.window_start = NaiveTime::from_hms_opt(23, 0, 0);
        activity.window_end = NaiveTime::from_hms_opt(1, 0, 0);

        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 23, 30, 0).unwrap()));
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 0, 30, 0).unwrap()));
        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 12, 0, 0).unwrap()));
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 23, 0, 0).unwrap()));
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 1, 0, 0).unwrap()));
        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 1, 0, 1).unwrap()));
    }

    #[test]
    fn test_weekly_selected_days_with_window() {
        let mut activity = recurring(RepeatMode::Weekly);
        // Monday, Wednesday, Friday
        activity.repeat_weekdays = vec![1, 3, 5];
        activity.window_start = NaiveTime::from_hms_opt(9, 0, 0);
        activity.window_end = NaiveTime::from_hms_opt(10, 0, 0);

        // 2024-04-15 is a Monday
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 9, 30, 0).unwrap()));
        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 10, 1, 0).unwrap()));
        // 2024-04-16 is a Tuesday
        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 16, 9, 30, 0).unwrap()));
        // 2024-04-17 is a Wednesday
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 17, 9, 30, 0).unwrap()));
        // 2024-04-21 is a Sunday
        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 21, 9, 30, 0).unwrap()));
    }

    #[test]
    fn test_weekly_empty_set_is_always_closed() {
        let activity = recurring(RepeatMode::Weekly);
        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 15, 12, 0, 0).unwrap()));
        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 21, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_weekly_all_seven_days_opens_every_day() {
        let mut activity = recurring(RepeatMode::Weekly);
        activity.repeat_weekdays = vec![1, 2, 3, 4, 5, 6, 7];
        for day in 15..=21 {
            assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 4, day, 12, 0, 0).unwrap()));
        }
    }

    #[test]
    fn test_weekly_sunday_is_seven() {
        let mut activity = recurring(RepeatMode::Weekly);
        activity.repeat_weekdays = vec![7];
        // 2024-04-21 is a Sunday
        assert!(is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 21, 12, 0, 0).unwrap()));
        assert!(!is_open(&activity, Utc.with_ymd_and_hms(2024, 4, 20, 12, 0, 0).unwrap()));
    }
}
