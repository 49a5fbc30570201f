use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use super::expression::{ExpressionError, ScheduleExpression};
use crate::config::TasksConfig;
use crate::db::Store;
use crate::db::repositories::tasks::NewSchedule;

const COMMAND_PREFIX_LEN: usize = 26;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Only one of start_time and schedule_expression required")]
    Conflicting,

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),

    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Body of a queued management command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub command: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl CommandPayload {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }
}

/// Stored schedule names stay short enough for external schedulers.
#[must_use]
pub fn task_id(command: &str) -> String {
    let prefix: String = command.chars().take(COMMAND_PREFIX_LEN).collect();
    format!("Task-{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// Registers a management command for later execution.
///
/// Without an expression the command runs once at `start_time`, or now.
/// Returns the schedule name, or `None` when scheduling is disabled.
pub async fn schedule_command(
    store: &Store,
    config: &TasksConfig,
    payload: CommandPayload,
    start_time: Option<DateTime<Utc>>,
    schedule_expression: Option<String>,
) -> Result<Option<String>, ScheduleError> {
    if !config.is_enabled() {
        warn!(
            event = "schedule_command_skipped",
            command = %payload.command,
            "Task queue is not configured. Scheduling task has been skipped."
        );
        return Ok(None);
    }

    let expression = match (start_time, schedule_expression) {
        (Some(_), Some(_)) => return Err(ScheduleError::Conflicting),
        (_, Some(expression)) => {
            ScheduleExpression::parse(&expression)?;
            expression
        }
        (start_time, None) => ScheduleExpression::at(start_time.unwrap_or_else(Utc::now)),
    };

    let name = task_id(&payload.command);
    let body = serde_json::to_string(&payload)?;

    store
        .tasks()
        .create_schedule(NewSchedule {
            name: name.clone(),
            queue_name: config.queue_name.clone(),
            expression: expression.clone(),
            payload: body.clone(),
            delete_after_completion: true,
        })
        .await?;

    info!(
        event = "schedule_command_task_registered",
        command_name = %payload.command,
        command_input = %body,
        schedule_expression = %expression,
        task_id = %name,
        "A task has been scheduled."
    );

    Ok(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn task_id_truncates_command() {
        let id = task_id("myanimelist_update_releases_with_a_long_tail");
        assert!(id.starts_with("Task-myanimelist_update_release-"));
        assert_eq!(id.len(), "Task-".len() + 26 + 1 + 32);
    }

    #[tokio::test]
    async fn disabled_queue_skips() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let config = TasksConfig {
            queue_name: String::new(),
            ..Default::default()
        };
        let result = schedule_command(&store, &config, CommandPayload::new("x"), None, None)
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(store.tasks().list_schedules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_time_becomes_at_expression() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let config = TasksConfig::default();
        let start = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();

        let mut payload = CommandPayload::new("clear_expired_tokens");
        payload.kwargs.insert("verbose".into(), Value::Bool(true));

        let name = schedule_command(&store, &config, payload, Some(start), None)
            .await
            .unwrap()
            .unwrap();

        let stored = store.tasks().get_schedule(&name).await.unwrap().unwrap();
        assert_eq!(stored.expression, "at(2030-01-02T03:04:05)");
        assert!(stored.delete_after_completion);
        let body: CommandPayload = serde_json::from_str(&stored.payload).unwrap();
        assert_eq!(body.command, "clear_expired_tokens");
        assert!(body.args.is_empty());
        assert_eq!(body.kwargs.get("verbose"), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn both_start_and_expression_is_an_error() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let result = schedule_command(
            &store,
            &TasksConfig::default(),
            CommandPayload::new("x"),
            Some(Utc::now()),
            Some("rate(5 minutes)".into()),
        )
        .await;
        assert!(matches!(result, Err(ScheduleError::Conflicting)));

        let bad = schedule_command(
            &store,
            &TasksConfig::default(),
            CommandPayload::new("x"),
            None,
            Some("weekly".into()),
        )
        .await;
        assert!(matches!(bad, Err(ScheduleError::Expression(_))));
    }
}
