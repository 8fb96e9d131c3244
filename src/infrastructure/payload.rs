use crate::domain::day_codes::{code_to_day, day_to_code, normalize_time};
use crate::domain::models::{AvailabilitySnapshot, BreakEntry, Task, TaskStatus, VacationEntry};
use crate::domain::slots::slot_by_id;
use serde::{Deserialize, Serialize};

/// Wire shapes as the server sends them, including legacy field variants.
/// Decoding produces the one canonical internal shape immediately on
/// receipt; nothing outside this module sees server field-name drift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotTriple {
    pub slot: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityPayload {
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub auto_accept_jobs: bool,
    #[serde(default)]
    pub working_days: Vec<String>,
    #[serde(default)]
    pub working_hours_slots: Vec<SlotTriple>,
    #[serde(default)]
    pub service_areas: Option<Vec<String>>,
    #[serde(default)]
    pub service_area: Option<String>,
    #[serde(default)]
    pub breaks: Option<Vec<BreakEntry>>,
    #[serde(default)]
    pub vacations: Option<Vec<VacationEntry>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AvailabilityUpdatePayload {
    pub is_online: bool,
    pub auto_accept_jobs: bool,
    pub working_days: Vec<String>,
    pub working_hours_slots: Vec<SlotTriple>,
    pub service_areas: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breaks: Option<Vec<BreakEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacations: Option<Vec<VacationEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateResponsePayload {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardPayload {
    #[serde(default)]
    pub weekly_kpis: WeeklyKpisPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeeklyKpisPayload {
    #[serde(default)]
    pub visits_done: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPayload {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default, alias = "job_status")]
    pub status: Option<String>,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default, alias = "duration_minutes")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default, alias = "customerName", alias = "farm_name")]
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPagePayload {
    #[serde(default)]
    pub list: Vec<TaskPayload>,
    #[serde(default, rename = "currentPage", alias = "current_page")]
    pub current_page: Option<u32>,
    #[serde(default, rename = "lastPage", alias = "last_page")]
    pub last_page: Option<u32>,
    #[serde(default, rename = "nextPageUrl", alias = "next_page_url")]
    pub next_page_url: Option<String>,
}

pub fn decode_availability(payload: AvailabilityPayload) -> AvailabilitySnapshot {
    let working_days = payload
        .working_days
        .iter()
        .map(|code| code_to_day(code.trim()).to_string())
        .filter(|day| !day.is_empty())
        .collect();

    let enabled_slots = payload
        .working_hours_slots
        .iter()
        .map(|triple| triple.slot.trim().to_string())
        .filter(|slot| !slot.is_empty())
        .collect();

    // Prefer the list; an absent or empty list falls back to the legacy
    // singular field.
    let raw_areas = match payload.service_areas.filter(|areas| !areas.is_empty()) {
        Some(areas) => areas,
        None => payload
            .service_area
            .map(|area| vec![area])
            .unwrap_or_default(),
    };
    let mut service_areas: Vec<String> = Vec::new();
    for area in raw_areas {
        let area = area.trim().to_string();
        if !area.is_empty() && !service_areas.contains(&area) {
            service_areas.push(area);
        }
    }

    let breaks = payload
        .breaks
        .unwrap_or_default()
        .into_iter()
        .map(|entry| BreakEntry {
            start_time: normalize_time(&entry.start_time),
            end_time: normalize_time(&entry.end_time),
            ..entry
        })
        .collect();

    AvailabilitySnapshot {
        is_online: payload.is_online,
        auto_accept_jobs: payload.auto_accept_jobs,
        working_days,
        enabled_slots,
        service_areas,
        breaks,
        vacations: payload.vacations.unwrap_or_default(),
    }
}

/// Builds the outbound update payload. Empty break/vacation lists are
/// omitted entirely rather than sent as `[]`; the legacy singular
/// `service_area` rides along only when exactly one area is configured.
pub fn encode_availability_update(
    is_online: bool,
    auto_accept_jobs: bool,
    selected_days: &[String],
    enabled_slots: &[String],
    service_areas: &[String],
    breaks: &[BreakEntry],
    vacations: &[VacationEntry],
) -> AvailabilityUpdatePayload {
    let working_days = selected_days
        .iter()
        .map(|day| day_to_code(day).to_string())
        .collect();

    let working_hours_slots = enabled_slots
        .iter()
        .filter_map(|slot_id| slot_by_id(slot_id))
        .map(|slot| SlotTriple {
            slot: slot.id.to_string(),
            start: slot.start.to_string(),
            end: slot.end.to_string(),
        })
        .collect();

    let service_area = match service_areas {
        [only] => Some(only.clone()),
        _ => None,
    };

    AvailabilityUpdatePayload {
        is_online,
        auto_accept_jobs,
        working_days,
        working_hours_slots,
        service_areas: service_areas.to_vec(),
        service_area,
        breaks: (!breaks.is_empty()).then(|| breaks.to_vec()),
        vacations: (!vacations.is_empty()).then(|| vacations.to_vec()),
    }
}

pub fn decode_dashboard_completed_jobs(payload: DashboardPayload) -> u32 {
    payload.weekly_kpis.visits_done
}

pub fn decode_task(payload: TaskPayload) -> Option<Task> {
    // Older API versions send numeric ids.
    let id = match &payload.id {
        serde_json::Value::String(value) => value.trim().to_string(),
        serde_json::Value::Number(value) => value.to_string(),
        _ => String::new(),
    };
    if id.is_empty() {
        return None;
    }

    Some(Task {
        id,
        status: TaskStatus::parse(payload.status.as_deref().unwrap_or_default()),
        scheduled_time: payload.scheduled_time.unwrap_or_default(),
        duration_minutes: payload.duration,
        location: payload
            .location
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()),
        service_name: payload.service_name.unwrap_or_default(),
        customer_name: payload.customer_name.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_break(start: &str, end: &str) -> BreakEntry {
        BreakEntry {
            date: "2026-03-02".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            reason: None,
        }
    }

    #[test]
    fn decode_maps_codes_and_normalizes_break_times() {
        let payload = AvailabilityPayload {
            is_online: true,
            working_days: vec!["mon".to_string(), "wed".to_string(), "xyz".to_string()],
            working_hours_slots: vec![SlotTriple {
                slot: "morning".to_string(),
                start: "09:00:00".to_string(),
                end: "12:00:00".to_string(),
            }],
            breaks: Some(vec![sample_break("12:00:00", "12:30:00")]),
            ..AvailabilityPayload::default()
        };

        let snapshot = decode_availability(payload);
        assert_eq!(snapshot.working_days, vec!["monday", "wednesday", "xyz"]);
        assert_eq!(snapshot.enabled_slots, vec!["morning"]);
        assert_eq!(snapshot.breaks[0].start_time, "12:00");
        assert_eq!(snapshot.breaks[0].end_time, "12:30");
    }

    #[test]
    fn decode_prefers_area_list_over_legacy_singular() {
        let payload = AvailabilityPayload {
            service_areas: Some(vec!["Leeds".to_string(), "York".to_string()]),
            service_area: Some("Hull".to_string()),
            ..AvailabilityPayload::default()
        };
        assert_eq!(
            decode_availability(payload).service_areas,
            vec!["Leeds", "York"]
        );
    }

    #[test]
    fn decode_falls_back_to_legacy_singular_when_list_absent_or_empty() {
        let absent = AvailabilityPayload {
            service_area: Some("Hull".to_string()),
            ..AvailabilityPayload::default()
        };
        assert_eq!(decode_availability(absent).service_areas, vec!["Hull"]);

        let empty = AvailabilityPayload {
            service_areas: Some(Vec::new()),
            service_area: Some("Hull".to_string()),
            ..AvailabilityPayload::default()
        };
        assert_eq!(decode_availability(empty).service_areas, vec!["Hull"]);
    }

    #[test]
    fn decode_dedupes_areas_case_sensitively_preserving_order() {
        let payload = AvailabilityPayload {
            service_areas: Some(vec![
                "Leeds".to_string(),
                "york".to_string(),
                "Leeds".to_string(),
                "York".to_string(),
            ]),
            ..AvailabilityPayload::default()
        };
        assert_eq!(
            decode_availability(payload).service_areas,
            vec!["Leeds", "york", "York"]
        );
    }

    #[test]
    fn encode_omits_empty_break_and_vacation_keys() {
        let payload = encode_availability_update(true, false, &[], &[], &[], &[], &[]);
        let value = serde_json::to_value(&payload).expect("serialize update");
        let object = value.as_object().expect("object payload");
        assert!(!object.contains_key("breaks"));
        assert!(!object.contains_key("vacations"));
        assert!(!object.contains_key("service_area"));
    }

    #[test]
    fn encode_includes_legacy_singular_only_for_exactly_one_area() {
        let one = encode_availability_update(
            true,
            false,
            &[],
            &[],
            &["Leeds".to_string()],
            &[],
            &[],
        );
        assert_eq!(one.service_area.as_deref(), Some("Leeds"));
        assert_eq!(one.service_areas, vec!["Leeds"]);

        let two = encode_availability_update(
            true,
            false,
            &[],
            &[],
            &["Leeds".to_string(), "York".to_string()],
            &[],
            &[],
        );
        assert!(two.service_area.is_none());
    }

    #[test]
    fn encode_translates_days_and_expands_catalog_slots() {
        let payload = encode_availability_update(
            true,
            true,
            &["monday".to_string(), "sunday".to_string()],
            &["evening".to_string(), "bogus".to_string()],
            &[],
            &[sample_break("12:00", "12:30")],
            &[],
        );
        assert_eq!(payload.working_days, vec!["mon", "sun"]);
        assert_eq!(
            payload.working_hours_slots,
            vec![SlotTriple {
                slot: "evening".to_string(),
                start: "17:00".to_string(),
                end: "21:00".to_string(),
            }]
        );
        assert_eq!(payload.breaks.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn task_decode_tolerates_field_name_and_status_drift() {
        let raw = serde_json::json!({
            "id": 118,
            "job_status": "In-Progress",
            "scheduled_time": "2026-03-02T09:00:00Z",
            "duration": 45,
            "customerName": "Oakfield Farm",
            "service_name": "Hoof trim"
        });
        let payload: TaskPayload = serde_json::from_value(raw).expect("parse task");
        let task = decode_task(payload).expect("decoded task");
        assert_eq!(task.id, "118");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.customer_name, "Oakfield Farm");
        assert_eq!(task.duration_minutes, Some(45));
    }

    #[test]
    fn task_decode_skips_entries_without_an_id() {
        let payload: TaskPayload =
            serde_json::from_value(serde_json::json!({ "status": "pending" })).expect("parse");
        assert!(decode_task(payload).is_none());
    }

    #[test]
    fn task_page_accepts_both_casings() {
        let camel: TaskPagePayload = serde_json::from_value(serde_json::json!({
            "list": [], "currentPage": 2, "lastPage": 5, "nextPageUrl": "…?page=3"
        }))
        .expect("camel page");
        assert_eq!(camel.current_page, Some(2));
        assert_eq!(camel.last_page, Some(5));

        let snake: TaskPagePayload = serde_json::from_value(serde_json::json!({
            "list": [], "current_page": 1, "last_page": 1
        }))
        .expect("snake page");
        assert_eq!(snake.current_page, Some(1));
        assert!(snake.next_page_url.is_none());
    }

    #[test]
    fn dashboard_defaults_to_zero_visits() {
        let payload: DashboardPayload =
            serde_json::from_value(serde_json::json!({})).expect("parse dashboard");
        assert_eq!(decode_dashboard_completed_jobs(payload), 0);
    }
}
