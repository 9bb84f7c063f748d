//! Attendance statistics service

use crate::{
    error::AppResult,
    models::record::{ActivityStats, CheckInRecord, CheckInStatus, UpdateRecordStatus},
    repository::Repository,
};

/// Which side of the attendance split to export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Checked,
    Unchecked,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Checked => "checked",
            ExportKind::Unchecked => "unchecked",
        }
    }
}

impl std::str::FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "checked" => Ok(ExportKind::Checked),
            "unchecked" => Ok(ExportKind::Unchecked),
            _ => Err(format!("Invalid export kind: {}", s)),
        }
    }
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Attendance split for one activity
    pub async fn activity_stats(&self, activity_id: i32) -> AppResult<ActivityStats> {
        let activity = self.repository.activities.get(activity_id).await?;
        let checked = self.repository.records.list_checked(activity_id).await?;
        let unchecked = self.repository.records.list_unchecked(activity_id).await?;
        let total_participants = self
            .repository
            .participations
            .count_for_activity(activity_id)
            .await?;

        Ok(ActivityStats {
            activity_id: activity.id,
            activity_name: activity.name,
            checked_count: checked.len() as i64,
            unchecked_count: unchecked.len() as i64,
            checked,
            unchecked,
            total_participants,
        })
    }

    /// CSV export of one side of the attendance split. Returns the suggested
    /// filename and the document body.
    pub async fn export_csv(
        &self,
        activity_id: i32,
        kind: ExportKind,
    ) -> AppResult<(String, String)> {
        let activity = self.repository.activities.get(activity_id).await?;
        let filename = format!("activity-{}-{}.csv", activity.id, kind.as_str());

        let mut body = String::new();
        match kind {
            ExportKind::Checked => {
                push_csv_row(&mut body, &["username", "display_name", "checkin_time", "ip_address"]);
                for entry in self.repository.records.list_checked(activity_id).await? {
                    push_csv_row(
                        &mut body,
                        &[
                            &entry.username,
                            &entry.display_name,
                            &entry.checkin_time.to_rfc3339(),
                            entry.ip_address.as_deref().unwrap_or(""),
                        ],
                    );
                }
            }
            ExportKind::Unchecked => {
                push_csv_row(&mut body, &["username", "display_name"]);
                for entry in self.repository.records.list_unchecked(activity_id).await? {
                    push_csv_row(&mut body, &[&entry.username, &entry.display_name]);
                }
            }
        }

        Ok((filename, body))
    }

    /// Administrative attendance override on one record
    pub async fn override_record_status(
        &self,
        record_id: i32,
        update: UpdateRecordStatus,
    ) -> AppResult<CheckInRecord> {
        if update.status == CheckInStatus::Present && update.status_note.is_none() {
            // Plain reinstatement keeps whatever note was there
            let existing = self.repository.records.get(record_id).await?;
            return self
                .repository
                .records
                .update_status(record_id, update.status, &existing.status_note)
                .await;
        }

        self.repository
            .records
            .update_status(
                record_id,
                update.status,
                update.status_note.as_deref().unwrap_or(""),
            )
            .await
    }
}

/// Append one CSV row, quoting fields that need it (RFC 4180 line endings).
fn push_csv_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
        {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}
