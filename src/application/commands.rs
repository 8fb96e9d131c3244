use crate::application::bootstrap::bootstrap_workspace;
use crate::application::lifecycle::{
    more_pages, TaskPage, TaskService, TaskStatusFilter, TaskWindow,
};
use crate::application::reconciler::{
    reconcile_focus, AvailabilityService, DraftAvailability, LocalEdits,
};
use crate::application::stats::{derive_weekly_stats, WeeklyStats};
use crate::domain::day_codes::DAY_ORDER;
use crate::domain::models::{validate_non_empty, BreakEntry, Task, TaskStatus, VacationEntry};
use crate::domain::slots::slot_by_id;
use crate::infrastructure::api_client::{ReqwestTechnicianApi, TechnicianApi};
use crate::infrastructure::config::{
    read_api_base_url, read_default_working_days, read_tasks_per_page,
};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::payload::decode_dashboard_completed_jobs;
use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct AppState {
    config_dir: PathBuf,
    logs_dir: PathBuf,
    runtime: Mutex<RuntimeState>,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;

        Ok(Self {
            config_dir: bootstrap.config_dir,
            logs_dir: bootstrap.logs_dir,
            runtime: Mutex::new(RuntimeState::default()),
            log_guard: Mutex::new(()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

/// Per-screen working state. Sessions exist only while the matching screen
/// is mounted; there is no ambient global draft.
#[derive(Debug, Default)]
struct RuntimeState {
    availability: Option<AvailabilitySession>,
    task_board: Option<TaskBoard>,
}

#[derive(Debug, Clone)]
struct AvailabilitySession {
    draft: DraftAvailability,
    completed_jobs: u32,
}

#[derive(Debug, Clone)]
struct TaskBoard {
    window: TaskWindow,
    filter: TaskStatusFilter,
    client_filter: Option<TaskStatus>,
    tasks: Vec<Task>,
    current_page: u32,
    last_page: u32,
    next_page_url: Option<String>,
    loading_more: bool,
}

impl TaskBoard {
    fn has_more(&self) -> bool {
        more_pages(self.current_page, self.last_page, self.next_page_url.as_deref())
    }
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub draft: DraftAvailability,
    pub stats: WeeklyStats,
}

#[derive(Debug, Serialize)]
pub struct SaveAvailabilityResponse {
    pub draft: DraftAvailability,
    pub stats: WeeklyStats,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummaryResponse {
    pub completed_jobs: u32,
    pub stats: WeeklyStats,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub current_page: u32,
    pub last_page: u32,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct TaskActionResponse {
    pub list: TaskListResponse,
    pub message: String,
}

fn technician_api(state: &AppState) -> Result<Arc<ReqwestTechnicianApi>, InfraError> {
    let base_url = read_api_base_url(state.config_dir())?;
    Ok(Arc::new(ReqwestTechnicianApi::new(&base_url)?))
}

fn lock_runtime(state: &AppState) -> Result<MutexGuard<'_, RuntimeState>, InfraError> {
    state
        .runtime
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("runtime lock poisoned: {error}")))
}

fn availability_session(runtime: &mut RuntimeState) -> Result<&mut AvailabilitySession, InfraError> {
    runtime.availability.as_mut().ok_or_else(|| {
        InfraError::InvalidConfig("the availability screen is not active".to_string())
    })
}

fn task_board(runtime: &mut RuntimeState) -> Result<&mut TaskBoard, InfraError> {
    runtime
        .task_board
        .as_mut()
        .ok_or_else(|| InfraError::InvalidConfig("the task list is not active".to_string()))
}

fn availability_response(session: &AvailabilitySession) -> AvailabilityResponse {
    AvailabilityResponse {
        draft: session.draft.clone(),
        stats: derive_weekly_stats(&session.draft, session.completed_jobs),
    }
}

fn board_response(board: &TaskBoard) -> TaskListResponse {
    let tasks = board
        .tasks
        .iter()
        .filter(|task| {
            board
                .client_filter
                .map_or(true, |status| task.status == status)
        })
        .cloned()
        .collect();

    TaskListResponse {
        tasks,
        current_page: board.current_page,
        last_page: board.last_page,
        has_more: board.has_more(),
    }
}

fn page_response(page: &TaskPage) -> TaskListResponse {
    TaskListResponse {
        tasks: page.tasks.clone(),
        current_page: page.current_page,
        last_page: page.last_page,
        has_more: page.has_more(),
    }
}

/// Fetches the server snapshot, then applies the three-step precedence:
/// seed or last-write-wins snapshot application, followed by the overlay
/// of navigation-supplied local edits. The fetch runs without holding the
/// runtime lock; whichever fetch completes last wins.
pub async fn availability_screen_focused_impl(
    state: &AppState,
    access_token: String,
    edits: Option<LocalEdits>,
) -> Result<AvailabilityResponse, InfraError> {
    let service = AvailabilityService::new(technician_api(state)?);
    let default_days = read_default_working_days(state.config_dir())?;
    let snapshot = service.fetch_snapshot(&access_token).await?;

    let mut runtime = lock_runtime(state)?;
    let previous = runtime.availability.take();
    let completed_jobs = previous
        .as_ref()
        .map(|session| session.completed_jobs)
        .unwrap_or(0);
    let draft = reconcile_focus(
        previous.map(|session| session.draft),
        &snapshot,
        &default_days,
        edits.unwrap_or_default(),
    );

    let session = AvailabilitySession {
        draft,
        completed_jobs,
    };
    let response = availability_response(&session);
    runtime.availability = Some(session);
    drop(runtime);

    state.log_info(
        "availability_screen_focused",
        &format!(
            "reconciled snapshot days={} slots={}",
            response.draft.selected_days.len(),
            response.draft.enabled_slots.len()
        ),
    );
    Ok(response)
}

pub fn availability_screen_unmounted_impl(state: &AppState) -> Result<(), InfraError> {
    let mut runtime = lock_runtime(state)?;
    runtime.availability = None;
    Ok(())
}

pub fn set_online_status_impl(
    state: &AppState,
    online: bool,
) -> Result<AvailabilityResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let session = availability_session(&mut runtime)?;
    session.draft.set_online(online);
    Ok(availability_response(session))
}

pub fn set_auto_accept_impl(
    state: &AppState,
    enabled: bool,
) -> Result<AvailabilityResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let session = availability_session(&mut runtime)?;
    session.draft.set_auto_accept(enabled);
    Ok(availability_response(session))
}

pub fn toggle_working_day_impl(
    state: &AppState,
    day: String,
) -> Result<AvailabilityResponse, InfraError> {
    if !DAY_ORDER.contains(&day.as_str()) {
        return Err(InfraError::InvalidConfig(format!("unknown day name: {day}")));
    }
    let mut runtime = lock_runtime(state)?;
    let session = availability_session(&mut runtime)?;
    session.draft.toggle_day(&day);
    Ok(availability_response(session))
}

pub fn toggle_slot_impl(
    state: &AppState,
    slot_id: String,
) -> Result<AvailabilityResponse, InfraError> {
    if slot_by_id(&slot_id).is_none() {
        return Err(InfraError::InvalidConfig(format!(
            "unknown time slot: {slot_id}"
        )));
    }
    let mut runtime = lock_runtime(state)?;
    let session = availability_session(&mut runtime)?;
    session.draft.toggle_slot(&slot_id);
    Ok(availability_response(session))
}

pub fn add_break_entry_impl(
    state: &AppState,
    entry: BreakEntry,
) -> Result<AvailabilityResponse, InfraError> {
    entry.validate_new().map_err(InfraError::InvalidConfig)?;
    let mut runtime = lock_runtime(state)?;
    let session = availability_session(&mut runtime)?;
    session.draft.breaks.push(entry);
    Ok(availability_response(session))
}

pub fn remove_break_entry_impl(
    state: &AppState,
    index: usize,
) -> Result<AvailabilityResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let session = availability_session(&mut runtime)?;
    if index >= session.draft.breaks.len() {
        return Err(InfraError::InvalidConfig(format!(
            "no break entry at index {index}"
        )));
    }
    session.draft.breaks.remove(index);
    Ok(availability_response(session))
}

pub fn add_vacation_entry_impl(
    state: &AppState,
    entry: VacationEntry,
) -> Result<AvailabilityResponse, InfraError> {
    entry.validate().map_err(InfraError::InvalidConfig)?;
    let mut runtime = lock_runtime(state)?;
    let session = availability_session(&mut runtime)?;
    session.draft.vacations.push(entry);
    Ok(availability_response(session))
}

pub fn remove_vacation_entry_impl(
    state: &AppState,
    index: usize,
) -> Result<AvailabilityResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let session = availability_session(&mut runtime)?;
    if index >= session.draft.vacations.len() {
        return Err(InfraError::InvalidConfig(format!(
            "no vacation entry at index {index}"
        )));
    }
    session.draft.vacations.remove(index);
    Ok(availability_response(session))
}

pub fn add_service_area_impl(
    state: &AppState,
    area: String,
) -> Result<AvailabilityResponse, InfraError> {
    let area = area.trim().to_string();
    validate_non_empty(&area, "service area").map_err(InfraError::InvalidConfig)?;
    let mut runtime = lock_runtime(state)?;
    let session = availability_session(&mut runtime)?;
    session.draft.add_service_area(area);
    Ok(availability_response(session))
}

pub fn remove_service_area_impl(
    state: &AppState,
    index: usize,
) -> Result<AvailabilityResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let session = availability_session(&mut runtime)?;
    if index >= session.draft.service_areas.len() {
        return Err(InfraError::InvalidConfig(format!(
            "no service area at index {index}"
        )));
    }
    session.draft.service_areas.remove(index);
    Ok(availability_response(session))
}

/// Sends the current draft. On failure the draft stays exactly as it was so
/// the technician can retry; on success the snapshot is re-fetched and the
/// session re-seeded from server truth rather than trusting the draft.
pub async fn save_availability_impl(
    state: &AppState,
    access_token: String,
) -> Result<SaveAvailabilityResponse, InfraError> {
    let draft = {
        let mut runtime = lock_runtime(state)?;
        availability_session(&mut runtime)?.draft.clone()
    };

    let service = AvailabilityService::new(technician_api(state)?);
    let message = service.save(&access_token, &draft).await?;
    state.log_info("save_availability", "availability accepted by the server");

    let snapshot = service.fetch_snapshot(&access_token).await?;
    let default_days = read_default_working_days(state.config_dir())?;

    let mut runtime = lock_runtime(state)?;
    match runtime.availability.as_mut() {
        Some(session) => {
            session.draft.clear_touched();
            session.draft.apply_snapshot(&snapshot, &default_days);
            Ok(SaveAvailabilityResponse {
                draft: session.draft.clone(),
                stats: derive_weekly_stats(&session.draft, session.completed_jobs),
                message,
            })
        }
        None => {
            // Screen unmounted while the save was in flight.
            let draft = DraftAvailability::seed(&snapshot, &default_days);
            let stats = derive_weekly_stats(&draft, 0);
            Ok(SaveAvailabilityResponse {
                draft,
                stats,
                message,
            })
        }
    }
}

/// The availability fetch and the weekly KPI fetch are independent, so both
/// are fired at once and awaited together.
pub async fn dashboard_summary_impl(
    state: &AppState,
    access_token: String,
) -> Result<DashboardSummaryResponse, InfraError> {
    let api = technician_api(state)?;
    let service = AvailabilityService::new(Arc::clone(&api));
    let default_days = read_default_working_days(state.config_dir())?;

    let (snapshot, dashboard) = tokio::join!(
        service.fetch_snapshot(&access_token),
        api.fetch_dashboard(&access_token),
    );
    let snapshot = snapshot?;
    let completed_jobs = decode_dashboard_completed_jobs(dashboard?);

    let mut runtime = lock_runtime(state)?;
    let stats = match runtime.availability.as_mut() {
        Some(session) => {
            session.draft.apply_snapshot(&snapshot, &default_days);
            session.completed_jobs = completed_jobs;
            derive_weekly_stats(&session.draft, completed_jobs)
        }
        None => {
            let draft = DraftAvailability::seed(&snapshot, &default_days);
            derive_weekly_stats(&draft, completed_jobs)
        }
    };

    Ok(DashboardSummaryResponse {
        completed_jobs,
        stats,
    })
}

/// Loads page one for the given window and server-side status filter,
/// replacing any previous board. `client_status`, when present, additionally
/// narrows the returned list by exact status equality without another
/// request.
pub async fn list_tasks_impl(
    state: &AppState,
    access_token: String,
    window: String,
    status: Option<String>,
    client_status: Option<String>,
) -> Result<TaskListResponse, InfraError> {
    let window = TaskWindow::parse(&window)?;
    let filter = match status.as_deref() {
        Some(raw) => TaskStatusFilter::parse(raw)?,
        None => TaskStatusFilter::All,
    };
    let client_filter = client_status
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(TaskStatus::parse);

    let per_page = read_tasks_per_page(state.config_dir())?;
    let service = TaskService::new(technician_api(state)?, per_page);
    let page = service.fetch_page(&access_token, window, filter, 1).await?;

    let mut runtime = lock_runtime(state)?;
    let board = TaskBoard {
        window,
        filter,
        client_filter,
        tasks: page.tasks,
        current_page: page.current_page,
        last_page: page.last_page,
        next_page_url: page.next_page_url,
        loading_more: false,
    };
    let response = board_response(&board);
    runtime.task_board = Some(board);
    drop(runtime);

    state.log_info(
        "list_tasks",
        &format!(
            "loaded page 1 window={} status={} tasks={}",
            window.as_str(),
            filter.as_str(),
            response.tasks.len()
        ),
    );
    Ok(response)
}

/// Appends the next page. A second call while one is already in flight, or
/// past the last page, returns the current board unchanged instead of firing
/// a duplicate request.
pub async fn load_more_tasks_impl(
    state: &AppState,
    access_token: String,
) -> Result<TaskListResponse, InfraError> {
    let per_page = read_tasks_per_page(state.config_dir())?;
    let service = TaskService::new(technician_api(state)?, per_page);

    let (window, filter, next_page) = {
        let mut runtime = lock_runtime(state)?;
        let board = task_board(&mut runtime)?;
        if board.loading_more || !board.has_more() {
            return Ok(board_response(board));
        }
        board.loading_more = true;
        (board.window, board.filter, board.current_page + 1)
    };

    let fetched = service
        .fetch_page(&access_token, window, filter, next_page)
        .await;

    let mut runtime = lock_runtime(state)?;
    let board = task_board(&mut runtime)?;
    board.loading_more = false;
    let page = fetched?;

    // A reload with a different query may have replaced the board while the
    // request was in flight; a stale page is discarded, not appended.
    if board.window == window && board.filter == filter && page.current_page > board.current_page {
        board.tasks.extend(page.tasks);
        board.current_page = page.current_page;
        board.last_page = page.last_page;
        board.next_page_url = page.next_page_url;
    }
    Ok(board_response(board))
}

pub async fn accept_task_impl(
    state: &AppState,
    access_token: String,
    task_id: String,
) -> Result<TaskActionResponse, InfraError> {
    let (window, filter, known) = {
        let mut runtime = lock_runtime(state)?;
        let board = task_board(&mut runtime)?;
        (board.window, board.filter, board.tasks.clone())
    };

    let per_page = read_tasks_per_page(state.config_dir())?;
    let service = TaskService::new(technician_api(state)?, per_page);
    let (page, message) = service
        .accept(&access_token, &known, &task_id, window, filter)
        .await?;

    state.log_info("accept_task", &format!("accepted task_id={task_id}"));
    replace_board(state, page, message)
}

pub async fn reject_task_impl(
    state: &AppState,
    access_token: String,
    task_id: String,
    reason: String,
) -> Result<TaskActionResponse, InfraError> {
    let (window, filter, known) = {
        let mut runtime = lock_runtime(state)?;
        let board = task_board(&mut runtime)?;
        (board.window, board.filter, board.tasks.clone())
    };

    let per_page = read_tasks_per_page(state.config_dir())?;
    let service = TaskService::new(technician_api(state)?, per_page);
    let (page, message) = service
        .reject(&access_token, &known, &task_id, &reason, window, filter)
        .await?;

    state.log_info("reject_task", &format!("rejected task_id={task_id}"));
    replace_board(state, page, message)
}

fn replace_board(
    state: &AppState,
    page: TaskPage,
    message: String,
) -> Result<TaskActionResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    match runtime.task_board.as_mut() {
        Some(board) => {
            board.tasks = page.tasks;
            board.current_page = page.current_page;
            board.last_page = page.last_page;
            board.next_page_url = page.next_page_url;
            board.loading_more = false;
            Ok(TaskActionResponse {
                list: board_response(board),
                message,
            })
        }
        None => Ok(TaskActionResponse {
            list: page_response(&page),
            message,
        }),
    }
}
