use crate::application::reconciler::DraftAvailability;
use crate::domain::slots::SLOT_CATALOG;
use serde::Serialize;

/// Weekly capacity figures shown next to the availability screen.
/// `total_hours` is a projection derived from the draft; `completed_jobs`
/// is a trailing actual taken verbatim from the server's weekly KPI feed —
/// the two must never be conflated.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct WeeklyStats {
    pub available_days: u32,
    pub hours_per_day: u32,
    pub total_hours: u32,
    pub completed_jobs: u32,
}

pub fn derive_weekly_stats(draft: &DraftAvailability, completed_jobs: u32) -> WeeklyStats {
    let available_days = draft.selected_days.len() as u32;
    let hours_per_day: u32 = SLOT_CATALOG
        .iter()
        .filter(|slot| draft.enabled_slots.iter().any(|enabled| enabled == slot.id))
        .map(|slot| slot.duration_hours)
        .sum();

    WeeklyStats {
        available_days,
        hours_per_day,
        total_hours: available_days * hours_per_day,
        completed_jobs,
    }
}
