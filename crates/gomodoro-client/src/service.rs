//! Domain service: a typed facade over the GraphQL transport.
//!
//! Each remote operation gets one method. Mutations that come back with a
//! null entity fail with an error naming the operation -- a null body is
//! never treated as success.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::{Result, ServiceError};
use crate::graphql;
use crate::transport::{GraphqlClient, Subscription};
use crate::types::{EventEnvelope, EventPayload, Pomodoro, StartPomodoroInput, Task};

pub struct PomodoroService {
    gql: Arc<GraphqlClient>,
}

impl PomodoroService {
    pub fn new(gql: Arc<GraphqlClient>) -> Self {
        Self { gql }
    }

    // ── Timer operations ────────────────────────────────────────────

    /// Fetch the current timer session, `None` when the server reports none.
    pub async fn current_pomodoro(&self) -> Result<Option<Pomodoro>> {
        let data = self
            .gql
            .query(graphql::CURRENT_POMODORO_QUERY, json!({}))
            .await?;
        let current = &data["currentPomodoro"];
        if current.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(current.clone()).map_err(
            |e| ServiceError::Transport(e.into()),
        )?))
    }

    pub async fn start_pomodoro(&self, input: &StartPomodoroInput) -> Result<Pomodoro> {
        let variables = json!({ "input": input });
        let data = self
            .gql
            .mutate("start", graphql::START_POMODORO_MUTATION, variables)
            .await?;
        pomodoro_from(&data["startPomodoro"], "start")
    }

    pub async fn pause_pomodoro(&self) -> Result<Pomodoro> {
        let data = self
            .gql
            .mutate("pause", graphql::PAUSE_POMODORO_MUTATION, json!({}))
            .await?;
        pomodoro_from(&data["pausePomodoro"], "pause")
    }

    pub async fn resume_pomodoro(&self) -> Result<Pomodoro> {
        let data = self
            .gql
            .mutate("resume", graphql::RESUME_POMODORO_MUTATION, json!({}))
            .await?;
        pomodoro_from(&data["resumePomodoro"], "resume")
    }

    pub async fn stop_pomodoro(&self) -> Result<Pomodoro> {
        let data = self
            .gql
            .mutate("stop", graphql::STOP_POMODORO_MUTATION, json!({}))
            .await?;
        pomodoro_from(&data["stopPomodoro"], "stop")
    }

    pub async fn reset_pomodoro(&self) -> Result<Pomodoro> {
        let data = self
            .gql
            .mutate("reset", graphql::RESET_POMODORO_MUTATION, json!({}))
            .await?;
        pomodoro_from(&data["resetPomodoro"], "reset")
    }

    // ── Task operations ─────────────────────────────────────────────

    /// List all tasks. The server's connection shape is flattened; null
    /// edges and nodes are skipped. The listing is effectively unpaginated.
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let data = self.gql.query(graphql::TASKS_QUERY, json!({})).await?;
        let edges = data["tasks"]["edges"].as_array().cloned().unwrap_or_default();
        let tasks = edges
            .iter()
            .filter_map(|edge| {
                let node = edge.get("node")?;
                serde_json::from_value::<Task>(node.clone()).ok()
            })
            .collect();
        Ok(tasks)
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let data = self
            .gql
            .query(graphql::TASK_QUERY, json!({ "id": id }))
            .await?;
        let task = &data["task"];
        if task.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(task.clone()).map_err(|e| {
            ServiceError::Transport(e.into())
        })?))
    }

    pub async fn create_task(&self, title: &str) -> Result<Task> {
        let variables = json!({ "input": { "title": title } });
        let data = self
            .gql
            .mutate("create", graphql::CREATE_TASK_MUTATION, variables)
            .await?;
        task_from(&data["createTask"], "create")
    }

    pub async fn update_task(&self, id: &str, title: &str) -> Result<Task> {
        let variables = json!({ "input": { "id": id, "title": title } });
        let data = self
            .gql
            .mutate("update", graphql::UPDATE_TASK_MUTATION, variables)
            .await?;
        task_from(&data["updateTask"], "update")
    }

    pub async fn delete_task(&self, id: &str) -> Result<bool> {
        let data = self
            .gql
            .mutate("delete", graphql::DELETE_TASK_MUTATION, json!({ "id": id }))
            .await?;
        Ok(data["deleteTask"].as_bool().unwrap_or(false))
    }

    // ── Push events ─────────────────────────────────────────────────

    /// Subscribe to timer events. Only the pomodoro payload variant reaches
    /// `on_event`; an absent payload or a task-shaped payload is reported
    /// through `on_error` instead of being dropped.
    pub async fn subscribe_pomodoro_events<F, E>(
        &self,
        on_event: F,
        on_error: E,
    ) -> Result<Subscription>
    where
        F: Fn(Pomodoro) + Send + 'static,
        E: Fn(String) + Send + Clone + 'static,
    {
        let variables = json!({ "input": { "eventCategory": ["POMODORO"] } });
        let data_error = on_error.clone();
        let subscription = self
            .gql
            .subscribe(
                graphql::ON_POMODORO_EVENT_SUBSCRIPTION,
                variables,
                move |data| route_event(data, &on_event, &data_error),
                on_error,
            )
            .await
            .map_err(ServiceError::Transport)?;
        Ok(subscription)
    }
}

/// Dispatch one subscription payload to the pomodoro handler, reporting
/// anything else as a local error. Never panics inside the socket handler.
fn route_event(
    data: Value,
    on_event: &(dyn Fn(Pomodoro) + Send),
    on_error: &(dyn Fn(String) + Send),
) {
    let envelope: EventEnvelope = match serde_json::from_value(data["eventReceived"].clone()) {
        Ok(envelope) => envelope,
        Err(e) => {
            on_error(format!("malformed event envelope: {e}"));
            return;
        }
    };
    match envelope.payload {
        Some(EventPayload::Pomodoro(pomodoro)) => on_event(pomodoro),
        Some(EventPayload::Task(_)) => {
            on_error("failed to get payload: payload is not a pomodoro event".into());
        }
        None => {
            on_error("failed to get payload: payload not found".into());
        }
    }
}

fn pomodoro_from(value: &Value, operation: &'static str) -> Result<Pomodoro> {
    if value.is_null() {
        return Err(ServiceError::NullPomodoro { operation });
    }
    serde_json::from_value(value.clone()).map_err(|e| ServiceError::Transport(e.into()))
}

fn task_from(value: &Value, operation: &'static str) -> Result<Task> {
    if value.is_null() {
        return Err(ServiceError::NullTask { operation });
    }
    serde_json::from_value(value.clone()).map_err(|e| ServiceError::Transport(e.into()))
}
