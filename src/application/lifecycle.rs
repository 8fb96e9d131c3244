use crate::domain::models::{Task, TaskAction, TaskStatus};
use crate::infrastructure::api_client::{TaskQuery, TechnicianApi};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::payload::{decode_task, TaskPagePayload};
use std::sync::Arc;

const GENERIC_ACCEPT_MESSAGE: &str = "task accepted";
const GENERIC_REJECT_MESSAGE: &str = "task rejected";

/// Reporting time range applied server-side via query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskWindow {
    Today,
    Week,
    Month,
    Year,
}

impl TaskWindow {
    pub fn parse(raw: &str) -> Result<TaskWindow, InfraError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(TaskWindow::Today),
            "week" => Ok(TaskWindow::Week),
            "month" => Ok(TaskWindow::Month),
            "year" => Ok(TaskWindow::Year),
            other => Err(InfraError::InvalidConfig(format!(
                "unknown task window: {other}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskWindow::Today => "today",
            TaskWindow::Week => "week",
            TaskWindow::Month => "month",
            TaskWindow::Year => "year",
        }
    }
}

/// Status filter applied server-side. The "today" screen offers
/// pending/accepted/in_progress; the history screens offer
/// in_progress/completed/cancelled. Both collapse to this one enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskStatusFilter {
    #[default]
    All,
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatusFilter {
    pub fn parse(raw: &str) -> Result<TaskStatusFilter, InfraError> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "" | "all" => Ok(TaskStatusFilter::All),
            "pending" => Ok(TaskStatusFilter::Pending),
            "accepted" => Ok(TaskStatusFilter::Accepted),
            "in_progress" => Ok(TaskStatusFilter::InProgress),
            "completed" => Ok(TaskStatusFilter::Completed),
            "cancelled" | "canceled" => Ok(TaskStatusFilter::Cancelled),
            other => Err(InfraError::InvalidConfig(format!(
                "unknown status filter: {other}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatusFilter::All => "all",
            TaskStatusFilter::Pending => "pending",
            TaskStatusFilter::Accepted => "accepted",
            TaskStatusFilter::InProgress => "in_progress",
            TaskStatusFilter::Completed => "completed",
            TaskStatusFilter::Cancelled => "cancelled",
        }
    }
}

/// One decoded page of the technician's task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub current_page: u32,
    pub last_page: u32,
    pub next_page_url: Option<String>,
}

impl TaskPage {
    pub fn has_more(&self) -> bool {
        more_pages(self.current_page, self.last_page, self.next_page_url.as_deref())
    }
}

/// One pagination predicate for every holder of a page cursor: a later page
/// exists when the counter says so or the server handed back a next-page url.
pub fn more_pages(current_page: u32, last_page: u32, next_page_url: Option<&str>) -> bool {
    current_page < last_page || next_page_url.is_some()
}

fn decode_page(payload: TaskPagePayload) -> TaskPage {
    let tasks = payload.list.into_iter().filter_map(decode_task).collect();
    let current_page = payload.current_page.unwrap_or(1).max(1);
    TaskPage {
        tasks,
        current_page,
        last_page: payload.last_page.unwrap_or(current_page).max(current_page),
        next_page_url: payload.next_page_url,
    }
}

/// Drives the task state machine from the client side. Illegal transitions
/// are rejected before any network call; the server stays the final
/// enforcer for everything else.
pub struct TaskService<C>
where
    C: TechnicianApi,
{
    api: Arc<C>,
    per_page: u32,
}

impl<C> TaskService<C>
where
    C: TechnicianApi,
{
    pub fn new(api: Arc<C>, per_page: u32) -> Self {
        Self {
            api,
            per_page: per_page.max(1),
        }
    }

    pub async fn fetch_page(
        &self,
        access_token: &str,
        window: TaskWindow,
        filter: TaskStatusFilter,
        page: u32,
    ) -> Result<TaskPage, InfraError> {
        let payload = self
            .api
            .list_tasks(
                access_token,
                TaskQuery {
                    window: window.as_str(),
                    status: filter.as_str(),
                    page: page.max(1),
                    per_page: self.per_page,
                },
            )
            .await?;
        Ok(decode_page(payload))
    }

    /// Accepts a pending task. On success the first page is refetched so
    /// server-side side effects (reassignment of conflicting tasks) are
    /// picked up; local state is never patched optimistically.
    pub async fn accept(
        &self,
        access_token: &str,
        known_tasks: &[Task],
        task_id: &str,
        window: TaskWindow,
        filter: TaskStatusFilter,
    ) -> Result<(TaskPage, String), InfraError> {
        check_transition(known_tasks, task_id, TaskAction::Accept)?;

        let response = self.api.accept_task(access_token, task_id).await?;
        if !response.success {
            return Err(InfraError::ServerRejected(
                response
                    .message
                    .unwrap_or_else(|| "the task could not be accepted".to_string()),
            ));
        }

        let page = self.fetch_page(access_token, window, filter, 1).await?;
        let message = response
            .message
            .unwrap_or_else(|| GENERIC_ACCEPT_MESSAGE.to_string());
        Ok((page, message))
    }

    /// Rejects a pending task with an advisory reason (non-empty at the
    /// call site, otherwise unvalidated).
    pub async fn reject(
        &self,
        access_token: &str,
        known_tasks: &[Task],
        task_id: &str,
        reason: &str,
        window: TaskWindow,
        filter: TaskStatusFilter,
    ) -> Result<(TaskPage, String), InfraError> {
        if reason.trim().is_empty() {
            return Err(InfraError::InvalidConfig(
                "a rejection reason is required".to_string(),
            ));
        }
        check_transition(known_tasks, task_id, TaskAction::Reject)?;

        let response = self.api.reject_task(access_token, task_id, reason).await?;
        if !response.success {
            return Err(InfraError::ServerRejected(
                response
                    .message
                    .unwrap_or_else(|| "the task could not be rejected".to_string()),
            ));
        }

        let page = self.fetch_page(access_token, window, filter, 1).await?;
        let message = response
            .message
            .unwrap_or_else(|| GENERIC_REJECT_MESSAGE.to_string());
        Ok((page, message))
    }
}

fn check_transition(
    known_tasks: &[Task],
    task_id: &str,
    action: TaskAction,
) -> Result<(), InfraError> {
    let Some(task) = known_tasks.iter().find(|task| task.id == task_id) else {
        return Err(InfraError::InvalidConfig(format!(
            "task not found: {task_id}"
        )));
    };
    if !task.status.allows(action) {
        let verb = match action {
            TaskAction::Accept => "accepted",
            TaskAction::Reject => "rejected",
        };
        return Err(InfraError::InvalidConfig(format!(
            "task {task_id} cannot be {verb} from status {}",
            task.status.as_str()
        )));
    }
    Ok(())
}
