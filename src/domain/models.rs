use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Server-authoritative availability record, already normalized to the
/// canonical internal shape (full day names, `HH:mm` times, one deduplicated
/// service-area list). Replaced wholesale by each successful fetch, never
/// mutated in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilitySnapshot {
    pub is_online: bool,
    pub auto_accept_jobs: bool,
    pub working_days: Vec<String>,
    pub enabled_slots: Vec<String>,
    pub service_areas: Vec<String>,
    pub breaks: Vec<BreakEntry>,
    pub vacations: Vec<VacationEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreakEntry {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BreakEntry {
    /// Creation-time check used by the break editor. The entry type itself
    /// carries whatever the server sent, ordered or not. Ordering compares
    /// parsed clock values; string order breaks down on single-digit hours.
    pub fn validate_new(&self) -> Result<(), String> {
        validate_date(&self.date, "break.date")?;
        let start = parse_hhmm(&self.start_time, "break.start_time")?;
        let end = parse_hhmm(&self.end_time, "break.end_time")?;
        if start >= end {
            return Err("break end time must be after its start time".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VacationEntry {
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VacationEntry {
    pub fn validate(&self) -> Result<(), String> {
        let start = parse_date(&self.start_date, "vacation.start_date")?;
        let end = parse_date(&self.end_date, "vacation.end_date")?;
        if end < start {
            return Err("vacation end date must not be before its start date".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Rejected,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Accept,
    Reject,
}

impl TaskStatus {
    /// Collapses the wire spelling variants seen across API versions into
    /// the canonical set. Anything unrecognized becomes `Unknown`, which
    /// permits no client-initiated transition.
    pub fn parse(raw: &str) -> TaskStatus {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pending" | "new" | "assigned" => TaskStatus::Pending,
            "accepted" => TaskStatus::Accepted,
            "in_progress" | "inprogress" | "ongoing" | "started" => TaskStatus::InProgress,
            "completed" | "done" | "finished" => TaskStatus::Completed,
            "rejected" | "cancelled" | "canceled" | "declined" => TaskStatus::Rejected,
            _ => TaskStatus::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Accepted => "accepted",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Rejected => "rejected",
            TaskStatus::Unknown => "unknown",
        }
    }

    /// Legal-from-state set per technician action. The server remains the
    /// final enforcer; this only stops requests that cannot succeed.
    pub fn allows(self, action: TaskAction) -> bool {
        match action {
            TaskAction::Accept | TaskAction::Reject => self == TaskStatus::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Rejected)
    }
}

/// One assigned job as shown in the task list. Status is server-owned; the
/// client only requests transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    pub scheduled_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub service_name: String,
    pub customer_name: String,
}

pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

pub fn validate_hhmm(value: &str, field_name: &str) -> Result<(), String> {
    parse_hhmm(value, field_name).map(|_| ())
}

fn parse_hhmm(value: &str, field_name: &str) -> Result<(u8, u8), String> {
    let mut split = value.split(':');
    let (Some(hour_str), Some(minute_str), None) = (split.next(), split.next(), split.next())
    else {
        return Err(format!("{field_name} must be HH:MM"));
    };
    let hour = hour_str
        .parse::<u8>()
        .map_err(|_| format!("{field_name} must be HH:MM"))?;
    let minute = minute_str
        .parse::<u8>()
        .map_err(|_| format!("{field_name} must be HH:MM"))?;
    if hour > 23 || minute > 59 {
        return Err(format!("{field_name} must be HH:MM"));
    }
    Ok((hour, minute))
}

pub fn validate_date(value: &str, field_name: &str) -> Result<(), String> {
    parse_date(value, field_name).map(|_| ())
}

fn parse_date(value: &str, field_name: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("{field_name} must be YYYY-MM-DD"))
}
