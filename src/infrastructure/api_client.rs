use crate::infrastructure::error::InfraError;
use crate::infrastructure::payload::{
    AvailabilityPayload, AvailabilityUpdatePayload, DashboardPayload, TaskPagePayload,
    UpdateResponsePayload,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskQuery<'a> {
    pub window: &'a str,
    pub status: &'a str,
    pub page: u32,
    pub per_page: u32,
}

/// The request/response seam to the FieldCrew REST service. Everything above
/// this trait works against it; tests substitute scripted fakes.
#[async_trait]
pub trait TechnicianApi: Send + Sync {
    async fn fetch_availability(&self, access_token: &str)
        -> Result<AvailabilityPayload, InfraError>;

    async fn update_availability(
        &self,
        access_token: &str,
        update: &AvailabilityUpdatePayload,
    ) -> Result<UpdateResponsePayload, InfraError>;

    async fn fetch_dashboard(&self, access_token: &str) -> Result<DashboardPayload, InfraError>;

    async fn list_tasks(
        &self,
        access_token: &str,
        query: TaskQuery<'_>,
    ) -> Result<TaskPagePayload, InfraError>;

    async fn accept_task(
        &self,
        access_token: &str,
        task_id: &str,
    ) -> Result<UpdateResponsePayload, InfraError>;

    async fn reject_task(
        &self,
        access_token: &str,
        task_id: &str,
        reason: &str,
    ) -> Result<UpdateResponsePayload, InfraError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTechnicianApi {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Serialize)]
struct RejectRequest<'a> {
    reason: &'a str,
}

impl ReqwestTechnicianApi {
    pub fn new(base_url: &str) -> Result<Self, InfraError> {
        let base_url = Url::parse(base_url)
            .map_err(|error| InfraError::InvalidConfig(format!("invalid api base url: {error}")))?;
        if base_url.cannot_be_a_base() {
            return Err(InfraError::InvalidConfig(
                "api base url cannot be a base".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), InfraError> {
        if value.trim().is_empty() {
            return Err(InfraError::InvalidConfig(format!(
                "{field} must not be empty"
            )));
        }
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, InfraError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| InfraError::InvalidConfig("api base url cannot be a base".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn http_error(context: &str, status: reqwest::StatusCode, body: &str) -> InfraError {
        let message = if body.trim().is_empty() {
            format!("{context}: http {}", status.as_u16())
        } else {
            format!("{context}: http {}; body={body}", status.as_u16())
        };
        InfraError::Api(message)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        context: &str,
        response: reqwest::Response,
    ) -> Result<T, InfraError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Api(format!("failed reading {context} response: {error}")))?;
        if !status.is_success() {
            return Err(Self::http_error(context, status, &body));
        }
        serde_json::from_str(&body)
            .map_err(|error| InfraError::Api(format!("invalid {context} payload: {error}; body={body}")))
    }
}

#[async_trait]
impl TechnicianApi for ReqwestTechnicianApi {
    async fn fetch_availability(
        &self,
        access_token: &str,
    ) -> Result<AvailabilityPayload, InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        let endpoint = self.endpoint(&["technician", "availability"])?;
        let response = self
            .client
            .get(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| {
                InfraError::Api(format!("network error while fetching availability: {error}"))
            })?;
        Self::read_json("availability", response).await
    }

    async fn update_availability(
        &self,
        access_token: &str,
        update: &AvailabilityUpdatePayload,
    ) -> Result<UpdateResponsePayload, InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        let endpoint = self.endpoint(&["technician", "availability"])?;
        let response = self
            .client
            .put(endpoint)
            .bearer_auth(access_token)
            .json(update)
            .send()
            .await
            .map_err(|error| {
                InfraError::Api(format!("network error while updating availability: {error}"))
            })?;
        Self::read_json("availability update", response).await
    }

    async fn fetch_dashboard(&self, access_token: &str) -> Result<DashboardPayload, InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        let endpoint = self.endpoint(&["technician", "dashboard"])?;
        let response = self
            .client
            .get(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| {
                InfraError::Api(format!("network error while fetching dashboard: {error}"))
            })?;
        Self::read_json("dashboard", response).await
    }

    async fn list_tasks(
        &self,
        access_token: &str,
        query: TaskQuery<'_>,
    ) -> Result<TaskPagePayload, InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        let endpoint = self.endpoint(&["technician", "tasks"])?;
        let response = self
            .client
            .get(endpoint)
            .query(&[("window", query.window), ("status", query.status)])
            .query(&[("page", query.page), ("per_page", query.per_page)])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| {
                InfraError::Api(format!("network error while listing tasks: {error}"))
            })?;
        Self::read_json("task list", response).await
    }

    async fn accept_task(
        &self,
        access_token: &str,
        task_id: &str,
    ) -> Result<UpdateResponsePayload, InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(task_id, "task id")?;
        let endpoint = self.endpoint(&["technician", "tasks", task_id, "accept"])?;
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| {
                InfraError::Api(format!("network error while accepting task: {error}"))
            })?;
        Self::read_json("task accept", response).await
    }

    async fn reject_task(
        &self,
        access_token: &str,
        task_id: &str,
        reason: &str,
    ) -> Result<UpdateResponsePayload, InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(task_id, "task id")?;
        Self::ensure_non_empty(reason, "reason")?;
        let endpoint = self.endpoint(&["technician", "tasks", task_id, "reject"])?;
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(access_token)
            .json(&RejectRequest { reason })
            .send()
            .await
            .map_err(|error| {
                InfraError::Api(format!("network error while rejecting task: {error}"))
            })?;
        Self::read_json("task reject", response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_builder_appends_segments_to_base_path() {
        let api = ReqwestTechnicianApi::new("https://api.example.com/v1/").expect("client");
        let url = api
            .endpoint(&["technician", "tasks", "t-9", "accept"])
            .expect("endpoint");
        assert_eq!(url.as_str(), "https://api.example.com/v1/technician/tasks/t-9/accept");
    }

    #[test]
    fn endpoint_builder_escapes_hostile_task_ids() {
        let api = ReqwestTechnicianApi::new("https://api.example.com/v1/").expect("client");
        let url = api
            .endpoint(&["technician", "tasks", "a/b", "accept"])
            .expect("endpoint");
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/technician/tasks/a%2Fb/accept"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected_up_front() {
        assert!(ReqwestTechnicianApi::new("not a url").is_err());
        assert!(ReqwestTechnicianApi::new("mailto:ops@example.com").is_err());
    }
}
