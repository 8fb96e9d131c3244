use crate::domain::day_codes::DAY_ORDER;
use crate::domain::models::{AvailabilitySnapshot, BreakEntry, VacationEntry};
use crate::domain::slots::SLOT_CATALOG;
use crate::infrastructure::api_client::TechnicianApi;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::payload::{
    decode_availability, encode_availability_update, AvailabilityUpdatePayload,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Local edits handed back by a child editor screen as navigation
/// parameters. `None` means "no edit pending" — the screen was never
/// visited — while `Some(vec![])` means "visited and cleared".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalEdits {
    pub breaks: Option<Vec<BreakEntry>>,
    pub vacations: Option<Vec<VacationEntry>>,
    pub service_areas: Option<Vec<String>>,
}

/// Toggle groups the user has interacted with in the current session.
/// A touched group represents intent not yet persisted and is never
/// overwritten by a later snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Touched {
    online: bool,
    auto_accept: bool,
    days: bool,
    slots: bool,
}

/// Screen-local working copy of the availability configuration. Created on
/// screen focus, discarded on unmount, promoted to an outbound payload only
/// on explicit save.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DraftAvailability {
    pub is_online: bool,
    pub auto_accept_jobs: bool,
    pub selected_days: Vec<String>,
    pub enabled_slots: Vec<String>,
    pub service_areas: Vec<String>,
    pub breaks: Vec<BreakEntry>,
    pub vacations: Vec<VacationEntry>,
    #[serde(skip)]
    touched: Touched,
}

impl DraftAvailability {
    /// Precedence step 1: seed from the server snapshot. A snapshot with
    /// zero working days keeps the configured default selection instead of
    /// collapsing the screen to "unavailable every day".
    pub fn seed(snapshot: &AvailabilitySnapshot, default_days: &[String]) -> Self {
        let mut draft = Self::default();
        draft.apply_snapshot(snapshot, default_days);
        draft
    }

    /// Re-applies server truth after a completed fetch. Successive fetches
    /// are last-write-wins, except that touched toggle groups keep their
    /// local values.
    pub fn apply_snapshot(&mut self, snapshot: &AvailabilitySnapshot, default_days: &[String]) {
        if !self.touched.online {
            self.is_online = snapshot.is_online;
        }
        if !self.touched.auto_accept {
            self.auto_accept_jobs = snapshot.auto_accept_jobs;
        }
        if !self.touched.days {
            self.selected_days = if snapshot.working_days.is_empty() {
                ordered_days(default_days)
            } else {
                ordered_days(&snapshot.working_days)
            };
        }
        if !self.touched.slots {
            self.enabled_slots = ordered_slots(&snapshot.enabled_slots);
        }
        self.service_areas = snapshot.service_areas.clone();
        self.breaks = snapshot.breaks.clone();
        self.vacations = snapshot.vacations.clone();
    }

    /// Precedence step 2: overlay navigation-supplied local edits. Only
    /// non-null parameters replace the corresponding list.
    pub fn overlay(&mut self, edits: LocalEdits) {
        if let Some(breaks) = edits.breaks {
            self.breaks = breaks;
        }
        if let Some(vacations) = edits.vacations {
            self.vacations = vacations;
        }
        if let Some(areas) = edits.service_areas {
            self.service_areas = dedup_areas(areas);
        }
    }

    pub fn set_online(&mut self, online: bool) {
        self.is_online = online;
        self.touched.online = true;
    }

    pub fn set_auto_accept(&mut self, enabled: bool) {
        self.auto_accept_jobs = enabled;
        self.touched.auto_accept = true;
    }

    /// Returns the new selection state of the day.
    pub fn toggle_day(&mut self, day: &str) -> bool {
        self.touched.days = true;
        if let Some(position) = self.selected_days.iter().position(|selected| selected == day) {
            self.selected_days.remove(position);
            false
        } else {
            self.selected_days.push(day.to_string());
            self.selected_days = ordered_days(&self.selected_days);
            true
        }
    }

    /// Returns the new enabled state of the slot.
    pub fn toggle_slot(&mut self, slot_id: &str) -> bool {
        self.touched.slots = true;
        if let Some(position) = self.enabled_slots.iter().position(|enabled| enabled == slot_id) {
            self.enabled_slots.remove(position);
            false
        } else {
            self.enabled_slots.push(slot_id.to_string());
            self.enabled_slots = ordered_slots(&self.enabled_slots);
            true
        }
    }

    /// Appends a service area unless an identical label is already present;
    /// first-insertion order is preserved.
    pub fn add_service_area(&mut self, area: String) -> bool {
        if self.service_areas.contains(&area) {
            return false;
        }
        self.service_areas.push(area);
        true
    }

    pub fn to_update(&self) -> AvailabilityUpdatePayload {
        encode_availability_update(
            self.is_online,
            self.auto_accept_jobs,
            &self.selected_days,
            &self.enabled_slots,
            &self.service_areas,
            &self.breaks,
            &self.vacations,
        )
    }

    /// All unsaved intent is persisted once a save round-trips, so the next
    /// snapshot application owns every field again.
    pub fn clear_touched(&mut self) {
        self.touched = Touched::default();
    }
}

/// Builds the draft for a focus event: seed a fresh session or apply the
/// newly completed fetch over the existing one, then overlay pending edits.
pub fn reconcile_focus(
    existing: Option<DraftAvailability>,
    snapshot: &AvailabilitySnapshot,
    default_days: &[String],
    edits: LocalEdits,
) -> DraftAvailability {
    let mut draft = match existing {
        Some(mut draft) => {
            draft.apply_snapshot(snapshot, default_days);
            draft
        }
        None => DraftAvailability::seed(snapshot, default_days),
    };
    draft.overlay(edits);
    draft
}

fn ordered_days(days: &[String]) -> Vec<String> {
    DAY_ORDER
        .iter()
        .filter(|day| days.iter().any(|selected| selected == *day))
        .map(|day| day.to_string())
        .collect()
}

fn ordered_slots(slots: &[String]) -> Vec<String> {
    SLOT_CATALOG
        .iter()
        .filter(|slot| slots.iter().any(|enabled| enabled == slot.id))
        .map(|slot| slot.id.to_string())
        .collect()
}

fn dedup_areas(areas: Vec<String>) -> Vec<String> {
    let mut deduped: Vec<String> = Vec::new();
    for area in areas {
        let area = area.trim().to_string();
        if !area.is_empty() && !deduped.contains(&area) {
            deduped.push(area);
        }
    }
    deduped
}

pub struct AvailabilityService<C>
where
    C: TechnicianApi,
{
    api: Arc<C>,
}

impl<C> AvailabilityService<C>
where
    C: TechnicianApi,
{
    pub fn new(api: Arc<C>) -> Self {
        Self { api }
    }

    pub async fn fetch_snapshot(
        &self,
        access_token: &str,
    ) -> Result<AvailabilitySnapshot, InfraError> {
        let payload = self.api.fetch_availability(access_token).await?;
        Ok(decode_availability(payload))
    }

    /// Sends the draft as an update. The draft itself is never mutated here:
    /// on failure the caller keeps it for retry, on success the caller
    /// re-fetches the snapshot rather than trusting the draft as truth.
    pub async fn save(
        &self,
        access_token: &str,
        draft: &DraftAvailability,
    ) -> Result<Option<String>, InfraError> {
        let update = draft.to_update();
        let response = self.api.update_availability(access_token, &update).await?;
        if !response.success {
            return Err(InfraError::ServerRejected(response.message.unwrap_or_else(
                || "the server could not save your availability, please try again".to_string(),
            )));
        }
        Ok(response.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::payload::{
        AvailabilityPayload, DashboardPayload, TaskPagePayload, UpdateResponsePayload,
    };
    use crate::infrastructure::api_client::TaskQuery;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn sample_break(label: &str) -> BreakEntry {
        BreakEntry {
            date: "2026-03-02".to_string(),
            start_time: "12:00".to_string(),
            end_time: "12:30".to_string(),
            reason: Some(label.to_string()),
        }
    }

    fn default_days() -> Vec<String> {
        ["monday", "tuesday", "wednesday", "thursday", "friday"]
            .map(String::from)
            .to_vec()
    }

    fn snapshot_with_break(label: &str) -> AvailabilitySnapshot {
        AvailabilitySnapshot {
            is_online: true,
            auto_accept_jobs: false,
            working_days: vec!["monday".to_string(), "tuesday".to_string()],
            enabled_slots: vec!["morning".to_string()],
            service_areas: vec!["Leeds".to_string()],
            breaks: vec![sample_break(label)],
            vacations: Vec::new(),
        }
    }

    #[test]
    fn seed_keeps_default_days_when_server_reports_none() {
        let mut snapshot = snapshot_with_break("a");
        snapshot.working_days.clear();
        let draft = DraftAvailability::seed(&snapshot, &default_days());
        assert_eq!(draft.selected_days, default_days());
    }

    #[test]
    fn seed_orders_days_and_slots_canonically() {
        let snapshot = AvailabilitySnapshot {
            working_days: vec!["friday".to_string(), "monday".to_string()],
            enabled_slots: vec!["evening".to_string(), "morning".to_string()],
            ..AvailabilitySnapshot::default()
        };
        let draft = DraftAvailability::seed(&snapshot, &default_days());
        assert_eq!(draft.selected_days, vec!["monday", "friday"]);
        assert_eq!(draft.enabled_slots, vec!["morning", "evening"]);
    }

    #[test]
    fn overlay_replaces_only_non_null_lists() {
        let snapshot = snapshot_with_break("server");
        let mut draft = DraftAvailability::seed(&snapshot, &default_days());
        draft.overlay(LocalEdits {
            breaks: Some(vec![sample_break("local")]),
            vacations: None,
            service_areas: None,
        });
        assert_eq!(draft.breaks[0].reason.as_deref(), Some("local"));
        assert_eq!(draft.service_areas, vec!["Leeds"]);

        let mut untouched = DraftAvailability::seed(&snapshot, &default_days());
        untouched.overlay(LocalEdits::default());
        assert_eq!(untouched.breaks[0].reason.as_deref(), Some("server"));
    }

    #[test]
    fn overlay_with_empty_list_means_visited_and_cleared() {
        let mut draft = DraftAvailability::seed(&snapshot_with_break("server"), &default_days());
        draft.overlay(LocalEdits {
            breaks: Some(Vec::new()),
            vacations: None,
            service_areas: None,
        });
        assert!(draft.breaks.is_empty());
    }

    #[test]
    fn later_snapshot_wins_except_for_touched_toggles() {
        let first = snapshot_with_break("first");
        let mut draft = DraftAvailability::seed(&first, &default_days());
        draft.set_online(false);
        draft.toggle_day("wednesday");

        let mut second = snapshot_with_break("second");
        second.is_online = true;
        second.auto_accept_jobs = true;
        draft.apply_snapshot(&second, &default_days());

        // untouched groups follow the latest fetch
        assert!(draft.auto_accept_jobs);
        assert_eq!(draft.breaks[0].reason.as_deref(), Some("second"));
        // touched groups keep local intent
        assert!(!draft.is_online);
        assert_eq!(draft.selected_days, vec!["monday", "tuesday", "wednesday"]);
    }

    #[test]
    fn clear_touched_lets_the_next_snapshot_own_everything() {
        let mut draft = DraftAvailability::seed(&snapshot_with_break("a"), &default_days());
        draft.set_online(false);
        draft.clear_touched();

        let refreshed = snapshot_with_break("b");
        draft.apply_snapshot(&refreshed, &default_days());
        assert!(draft.is_online);
    }

    #[test]
    fn reconcile_focus_seeds_then_overlays() {
        let reconciled = reconcile_focus(
            None,
            &snapshot_with_break("server"),
            &default_days(),
            LocalEdits {
                breaks: Some(vec![sample_break("pending")]),
                vacations: None,
                service_areas: Some(vec!["York".to_string(), "York".to_string()]),
            },
        );
        assert_eq!(reconciled.breaks[0].reason.as_deref(), Some("pending"));
        assert_eq!(reconciled.service_areas, vec!["York"]);
    }

    #[test]
    fn toggles_flip_and_report_the_new_state() {
        let mut draft = DraftAvailability::seed(&snapshot_with_break("a"), &default_days());
        assert!(!draft.toggle_day("monday"));
        assert!(draft.toggle_day("monday"));
        assert!(draft.toggle_slot("evening"));
        assert!(!draft.toggle_slot("evening"));
    }

    #[test]
    fn add_service_area_skips_exact_duplicates() {
        let mut draft = DraftAvailability::default();
        assert!(draft.add_service_area("Leeds".to_string()));
        assert!(!draft.add_service_area("Leeds".to_string()));
        assert!(draft.add_service_area("leeds".to_string()));
        assert_eq!(draft.service_areas, vec!["Leeds", "leeds"]);
    }

    #[derive(Debug, Default)]
    struct FakeTechnicianApi {
        availability_responses: Mutex<VecDeque<AvailabilityPayload>>,
        update_responses: Mutex<VecDeque<Result<UpdateResponsePayload, InfraError>>>,
        update_calls: AtomicUsize,
        last_update: Mutex<Option<AvailabilityUpdatePayload>>,
    }

    #[async_trait]
    impl TechnicianApi for FakeTechnicianApi {
        async fn fetch_availability(
            &self,
            _access_token: &str,
        ) -> Result<AvailabilityPayload, InfraError> {
            Ok(self
                .availability_responses
                .lock()
                .expect("availability responses lock poisoned")
                .pop_front()
                .unwrap_or_default())
        }

        async fn update_availability(
            &self,
            _access_token: &str,
            update: &AvailabilityUpdatePayload,
        ) -> Result<UpdateResponsePayload, InfraError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_update.lock().expect("last update lock poisoned") = Some(update.clone());
            self.update_responses
                .lock()
                .expect("update responses lock poisoned")
                .pop_front()
                .unwrap_or_else(|| Ok(UpdateResponsePayload {
                    success: true,
                    message: None,
                }))
        }

        async fn fetch_dashboard(
            &self,
            _access_token: &str,
        ) -> Result<DashboardPayload, InfraError> {
            Ok(DashboardPayload::default())
        }

        async fn list_tasks(
            &self,
            _access_token: &str,
            _query: TaskQuery<'_>,
        ) -> Result<TaskPagePayload, InfraError> {
            Ok(TaskPagePayload::default())
        }

        async fn accept_task(
            &self,
            _access_token: &str,
            _task_id: &str,
        ) -> Result<UpdateResponsePayload, InfraError> {
            Err(InfraError::Api("not used in reconciler tests".to_string()))
        }

        async fn reject_task(
            &self,
            _access_token: &str,
            _task_id: &str,
            _reason: &str,
        ) -> Result<UpdateResponsePayload, InfraError> {
            Err(InfraError::Api("not used in reconciler tests".to_string()))
        }
    }

    #[tokio::test]
    async fn save_surfaces_server_message_on_rejection() {
        let api = Arc::new(FakeTechnicianApi::default());
        api.update_responses
            .lock()
            .expect("seed responses")
            .push_back(Ok(UpdateResponsePayload {
                success: false,
                message: Some("overlapping break".to_string()),
            }));

        let service = AvailabilityService::new(Arc::clone(&api));
        let draft = DraftAvailability::seed(&snapshot_with_break("a"), &default_days());
        let before = draft.clone();
        let error = service
            .save("token", &draft)
            .await
            .expect_err("rejection must surface");
        assert!(matches!(
            error,
            InfraError::ServerRejected(message) if message == "overlapping break"
        ));
        // the draft stays as it was so the technician can retry
        assert_eq!(draft, before);
    }

    #[tokio::test]
    async fn save_sends_the_encoded_draft_and_returns_the_message() {
        let api = Arc::new(FakeTechnicianApi::default());
        api.update_responses
            .lock()
            .expect("seed responses")
            .push_back(Ok(UpdateResponsePayload {
                success: true,
                message: Some("availability saved".to_string()),
            }));

        let service = AvailabilityService::new(Arc::clone(&api));
        let draft = DraftAvailability::seed(&snapshot_with_break("a"), &default_days());
        let message = service.save("token", &draft).await.expect("save succeeds");

        assert_eq!(message.as_deref(), Some("availability saved"));
        assert_eq!(api.update_calls.load(Ordering::SeqCst), 1);
        let sent = api
            .last_update
            .lock()
            .expect("last update lock poisoned")
            .clone()
            .expect("update captured");
        assert_eq!(sent.working_days, vec!["mon", "tue"]);
        assert_eq!(sent.service_area.as_deref(), Some("Leeds"));
    }

    #[tokio::test]
    async fn fetch_snapshot_decodes_on_receipt() {
        let api = Arc::new(FakeTechnicianApi::default());
        api.availability_responses
            .lock()
            .expect("seed responses")
            .push_back(AvailabilityPayload {
                working_days: vec!["mon".to_string()],
                service_area: Some("Hull".to_string()),
                ..AvailabilityPayload::default()
            });

        let service = AvailabilityService::new(api);
        let snapshot = service.fetch_snapshot("token").await.expect("fetch");
        assert_eq!(snapshot.working_days, vec!["monday"]);
        assert_eq!(snapshot.service_areas, vec!["Hull"]);
    }
}
