mod application;
mod domain;
mod infrastructure;

use application::bootstrap::bootstrap_workspace;
use application::commands::{
    accept_task_impl, add_break_entry_impl, add_service_area_impl, add_vacation_entry_impl,
    availability_screen_focused_impl, availability_screen_unmounted_impl, dashboard_summary_impl,
    list_tasks_impl, load_more_tasks_impl, reject_task_impl, remove_break_entry_impl,
    remove_service_area_impl, remove_vacation_entry_impl, save_availability_impl,
    set_auto_accept_impl, set_online_status_impl, toggle_slot_impl, toggle_working_day_impl,
    AppState, AvailabilityResponse, DashboardSummaryResponse, SaveAvailabilityResponse,
    TaskActionResponse, TaskListResponse,
};
use application::reconciler::LocalEdits;
use domain::models::{BreakEntry, VacationEntry};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct BootstrapResponse {
    workspace_root: String,
    config_dir: String,
    logs_dir: String,
}

#[tauri::command]
fn bootstrap(root: Option<String>) -> Result<BootstrapResponse, String> {
    let workspace_root = match root {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().map_err(|error| error.to_string())?,
    };

    let result = bootstrap_workspace(&workspace_root).map_err(|error| error.to_string())?;
    Ok(BootstrapResponse {
        workspace_root: result.workspace_root.display().to_string(),
        config_dir: result.config_dir.display().to_string(),
        logs_dir: result.logs_dir.display().to_string(),
    })
}

#[tauri::command]
fn ping() -> &'static str {
    "pong"
}

#[tauri::command]
async fn availability_screen_focused(
    state: tauri::State<'_, AppState>,
    access_token: String,
    edits: Option<LocalEdits>,
) -> Result<AvailabilityResponse, String> {
    availability_screen_focused_impl(state.inner(), access_token, edits)
        .await
        .map_err(|error| state.command_error("availability_screen_focused", &error))
}

#[tauri::command]
fn availability_screen_unmounted(state: tauri::State<'_, AppState>) -> Result<(), String> {
    availability_screen_unmounted_impl(state.inner())
        .map_err(|error| state.command_error("availability_screen_unmounted", &error))
}

#[tauri::command]
fn set_online_status(
    state: tauri::State<'_, AppState>,
    online: bool,
) -> Result<AvailabilityResponse, String> {
    set_online_status_impl(state.inner(), online)
        .map_err(|error| state.command_error("set_online_status", &error))
}

#[tauri::command]
fn set_auto_accept(
    state: tauri::State<'_, AppState>,
    enabled: bool,
) -> Result<AvailabilityResponse, String> {
    set_auto_accept_impl(state.inner(), enabled)
        .map_err(|error| state.command_error("set_auto_accept", &error))
}

#[tauri::command]
fn toggle_working_day(
    state: tauri::State<'_, AppState>,
    day: String,
) -> Result<AvailabilityResponse, String> {
    toggle_working_day_impl(state.inner(), day)
        .map_err(|error| state.command_error("toggle_working_day", &error))
}

#[tauri::command]
fn toggle_slot(
    state: tauri::State<'_, AppState>,
    slot_id: String,
) -> Result<AvailabilityResponse, String> {
    toggle_slot_impl(state.inner(), slot_id)
        .map_err(|error| state.command_error("toggle_slot", &error))
}

#[tauri::command]
fn add_break_entry(
    state: tauri::State<'_, AppState>,
    entry: BreakEntry,
) -> Result<AvailabilityResponse, String> {
    add_break_entry_impl(state.inner(), entry)
        .map_err(|error| state.command_error("add_break_entry", &error))
}

#[tauri::command]
fn remove_break_entry(
    state: tauri::State<'_, AppState>,
    index: usize,
) -> Result<AvailabilityResponse, String> {
    remove_break_entry_impl(state.inner(), index)
        .map_err(|error| state.command_error("remove_break_entry", &error))
}

#[tauri::command]
fn add_vacation_entry(
    state: tauri::State<'_, AppState>,
    entry: VacationEntry,
) -> Result<AvailabilityResponse, String> {
    add_vacation_entry_impl(state.inner(), entry)
        .map_err(|error| state.command_error("add_vacation_entry", &error))
}

#[tauri::command]
fn remove_vacation_entry(
    state: tauri::State<'_, AppState>,
    index: usize,
) -> Result<AvailabilityResponse, String> {
    remove_vacation_entry_impl(state.inner(), index)
        .map_err(|error| state.command_error("remove_vacation_entry", &error))
}

#[tauri::command]
fn add_service_area(
    state: tauri::State<'_, AppState>,
    area: String,
) -> Result<AvailabilityResponse, String> {
    add_service_area_impl(state.inner(), area)
        .map_err(|error| state.command_error("add_service_area", &error))
}

#[tauri::command]
fn remove_service_area(
    state: tauri::State<'_, AppState>,
    index: usize,
) -> Result<AvailabilityResponse, String> {
    remove_service_area_impl(state.inner(), index)
        .map_err(|error| state.command_error("remove_service_area", &error))
}

#[tauri::command]
async fn save_availability(
    state: tauri::State<'_, AppState>,
    access_token: String,
) -> Result<SaveAvailabilityResponse, String> {
    save_availability_impl(state.inner(), access_token)
        .await
        .map_err(|error| state.command_error("save_availability", &error))
}

#[tauri::command]
async fn dashboard_summary(
    state: tauri::State<'_, AppState>,
    access_token: String,
) -> Result<DashboardSummaryResponse, String> {
    dashboard_summary_impl(state.inner(), access_token)
        .await
        .map_err(|error| state.command_error("dashboard_summary", &error))
}

#[tauri::command]
async fn list_tasks(
    state: tauri::State<'_, AppState>,
    access_token: String,
    window: String,
    status: Option<String>,
    client_status: Option<String>,
) -> Result<TaskListResponse, String> {
    list_tasks_impl(state.inner(), access_token, window, status, client_status)
        .await
        .map_err(|error| state.command_error("list_tasks", &error))
}

#[tauri::command]
async fn load_more_tasks(
    state: tauri::State<'_, AppState>,
    access_token: String,
) -> Result<TaskListResponse, String> {
    load_more_tasks_impl(state.inner(), access_token)
        .await
        .map_err(|error| state.command_error("load_more_tasks", &error))
}

#[tauri::command]
async fn accept_task(
    state: tauri::State<'_, AppState>,
    access_token: String,
    task_id: String,
) -> Result<TaskActionResponse, String> {
    accept_task_impl(state.inner(), access_token, task_id)
        .await
        .map_err(|error| state.command_error("accept_task", &error))
}

#[tauri::command]
async fn reject_task(
    state: tauri::State<'_, AppState>,
    access_token: String,
    task_id: String,
    reason: String,
) -> Result<TaskActionResponse, String> {
    reject_task_impl(state.inner(), access_token, task_id, reason)
        .await
        .map_err(|error| state.command_error("reject_task", &error))
}

pub fn run() {
    let workspace_root = std::env::current_dir().expect("failed to resolve current directory");
    let app_state = AppState::new(workspace_root).expect("failed to initialize app state");

    tauri::Builder::default()
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            ping,
            bootstrap,
            availability_screen_focused,
            availability_screen_unmounted,
            set_online_status,
            set_auto_accept,
            toggle_working_day,
            toggle_slot,
            add_break_entry,
            remove_break_entry,
            add_vacation_entry,
            remove_vacation_entry,
            add_service_area,
            remove_service_area,
            save_availability,
            dashboard_summary,
            list_tasks,
            load_more_tasks,
            accept_task,
            reject_task
        ])
        .run(tauri::generate_context!())
        .expect("failed to run tauri app");
}
