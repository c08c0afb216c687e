#[cfg(test)]
#[path = "graphql_test.rs"]
mod tests;

use crate::backend::documents::{CREATE_TASK, DELETE_TASK, LIST_TASKS, UPDATE_TASK};
use crate::backend::{ArcBackend, Backend};
use crate::config::{BackendConfig, user_agent};
use crate::models::Task;
use async_trait::async_trait;
use eyre::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt::Display;
use std::sync::Arc;
use std::time;
use thiserror::Error;

/// GraphQL talks to the task API over HTTP. Every operation is a POST of
/// `{query, variables}` to the endpoint.
pub struct GraphQL {
    alias: String,
    endpoint: String,
    api_key: Option<String>,
    auth_token: Option<String>,
    timeout: Option<time::Duration>,
    page_size: Option<usize>,
    client: reqwest::Client,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("sending {operation} request: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} failed with HTTP {http_code}: {body}")]
    Http {
        operation: &'static str,
        http_code: u16,
        body: String,
    },

    #[error("{operation} rejected by backend: {}", join_errors(.errors))]
    Rejected {
        operation: &'static str,
        errors: Vec<GraphQLError>,
    },

    #[error("malformed {operation} response: {reason}")]
    Malformed {
        operation: &'static str,
        reason: String,
    },
}

#[derive(Default, Error, Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(rename = "errorType", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl Display for GraphQLError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_type {
            Some(error_type) => write!(f, "{} ({})", self.message, error_type),
            None => write!(f, "{}", self.message),
        }
    }
}

fn join_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl Backend for GraphQL {
    fn name(&self) -> &str {
        &self.alias
    }

    async fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut tasks = vec![];
        let mut next_token: Option<String> = None;

        loop {
            let variables = json!({
                "limit": self.page_size,
                "nextToken": next_token,
            });
            let data: ListTasksData = self.execute("listTasks", LIST_TASKS, variables).await?;
            let page = data.list_tasks;
            log::debug!("listTasks page with {} items", page.items.len());
            tasks.extend(page.items.into_iter().flatten());

            match page.next_token {
                Some(token) if !token.is_empty() => {
                    if next_token.as_deref() == Some(token.as_str()) {
                        log::warn!("listTasks returned the same nextToken twice, stopping");
                        break;
                    }
                    next_token = Some(token);
                }
                _ => break,
            }
        }

        Ok(tasks)
    }

    async fn create_task(&self, title: String) -> Result<Task> {
        let variables = json!({ "input": { "title": title } });
        let data: CreateTaskData = self.execute("createTask", CREATE_TASK, variables).await?;
        Ok(data.create_task)
    }

    async fn update_task(&self, id: String, title: String) -> Result<Task> {
        let variables = json!({ "input": { "id": id, "title": title } });
        let data: UpdateTaskData = self.execute("updateTask", UPDATE_TASK, variables).await?;
        Ok(data.update_task)
    }

    async fn delete_task(&self, id: String) -> Result<()> {
        let variables = json!({ "input": { "id": id } });
        // Only success matters, the deleted record is reported by the subscription
        let _: Value = self.execute("deleteTask", DELETE_TASK, variables).await?;
        Ok(())
    }
}

impl From<GraphQL> for ArcBackend {
    fn from(value: GraphQL) -> Self {
        Arc::new(value)
    }
}

impl From<&BackendConfig> for GraphQL {
    fn from(value: &BackendConfig) -> Self {
        let mut graphql = GraphQL::default().with_endpoint(&value.endpoint);

        if let Some(alias) = value.alias.as_deref() {
            graphql.alias = alias.to_string();
        }

        graphql.api_key = value.api_key.clone();
        graphql.auth_token = value.auth_token.clone();
        graphql.timeout = value.timeout();
        if value.page_size > 0 {
            graphql.page_size = Some(value.page_size);
        }
        graphql
    }
}

impl Default for GraphQL {
    fn default() -> Self {
        Self {
            alias: "GraphQL".to_string(),
            endpoint: String::new(),
            api_key: None,
            auth_token: None,
            timeout: None,
            page_size: None,
            client: reqwest::Client::new(),
        }
    }
}

impl GraphQL {
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Option<time::Duration> {
        self.timeout
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &str,
        variables: Value,
    ) -> Result<T, BackendError> {
        let mut req = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("User-Agent", user_agent());

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        if let Some(api_key) = &self.api_key {
            req = req.header("x-api-key", api_key);
        }

        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }

        let request = GraphQLRequest { query, variables };
        log::trace!("Sending {} request: {:?}", operation, request);

        let res = req
            .json(&request)
            .send()
            .await
            .map_err(|source| BackendError::Transport { operation, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| BackendError::Transport { operation, source })?;
        log::trace!("{} response ({}): {}", operation, status, body);

        if !status.is_success() {
            log::error!("{} failed ({}): {}", operation, status, body);
            // Some servers report resolver errors with a non-2xx status
            if let Ok(resp) = serde_json::from_str::<GraphQLResponse>(&body) {
                if !resp.errors.is_empty() {
                    return Err(BackendError::Rejected {
                        operation,
                        errors: resp.errors,
                    });
                }
            }
            return Err(BackendError::Http {
                operation,
                http_code: status.as_u16(),
                body,
            });
        }

        // Rejected operations usually carry null data
        let resp = serde_json::from_str::<GraphQLResponse>(&body).map_err(|err| {
            BackendError::Malformed {
                operation,
                reason: err.to_string(),
            }
        })?;

        if !resp.errors.is_empty() {
            return Err(BackendError::Rejected {
                operation,
                errors: resp.errors,
            });
        }

        let data = resp.data.ok_or_else(|| BackendError::Malformed {
            operation,
            reason: "missing data".to_string(),
        })?;

        serde_json::from_value(data).map_err(|err| BackendError::Malformed {
            operation,
            reason: err.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQLError>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskConnection {
    #[serde(default)]
    items: Vec<Option<Task>>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksData {
    list_tasks: TaskConnection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskData {
    create_task: Task,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskData {
    update_task: Task,
}
