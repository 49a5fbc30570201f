mod common;

use std::sync::{Arc, Mutex};

use animeon::tasks::{CommandPayload, CommandRunner, Consumer, DbMessageQueue, MessageQueue, Processed};
use async_trait::async_trait;
use axum::http::StatusCode;
use common::{TestApp, spawn_app};
use serde_json::json;

#[derive(Default)]
struct RecordingRunner {
    seen: Mutex<Vec<CommandPayload>>,
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run_command(&self, payload: CommandPayload) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(payload);
        Ok(())
    }
}

fn consumer(app: &TestApp, runner: Arc<RecordingRunner>) -> (Consumer, Arc<DbMessageQueue>) {
    let queue = Arc::new(DbMessageQueue::new(app.state.store().clone()));
    let mut tasks = app.state.config().tasks.clone();
    tasks.wait_time_seconds = 0;
    let consumer = Consumer::new(
        queue.clone(),
        runner,
        app.router.clone(),
        tasks,
        app.state.config().server.clone(),
    );
    (consumer, queue)
}

#[tokio::test]
async fn command_messages_reach_the_runner() {
    let app = spawn_app().await;
    let runner = Arc::new(RecordingRunner::default());
    let (consumer, _) = consumer(&app, runner.clone());

    let processed = consumer
        .process(r#"{"command": "generate_fixtures", "kwargs": {"count": 3}}"#)
        .await
        .unwrap();
    assert_eq!(processed, Processed::Command("generate_fixtures".to_string()));

    let seen = runner.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].kwargs["count"], 3);
    assert!(seen[0].args.is_empty());
}

#[tokio::test]
async fn envelopes_are_replayed_through_the_router() {
    let app = spawn_app().await;
    let (consumer, _) = consumer(&app, Arc::new(RecordingRunner::default()));

    let envelope = json!({
        "version": "0",
        "detail-type": "/api/v1/support/help/",
        "source": "animeon.tasks",
        "detail": {
            "httpMethod": "POST",
            "body": {
                "title": "Replay",
                "email": "replay@example.com",
                "message": "From the bus",
            },
        },
    });
    let processed = consumer.process(&envelope.to_string()).await.unwrap();
    assert_eq!(processed, Processed::Replayed(StatusCode::CREATED));

    let staff = app.staff("reviewer").await;
    let list = app.get("/api/v1/staff/appeals/help/", Some(&staff)).await;
    assert_eq!(list.body["count"], 1);
    assert_eq!(list.body["results"][0]["title"], "Replay");
}

#[tokio::test]
async fn poll_drains_the_queue() {
    let app = spawn_app().await;
    let runner = Arc::new(RecordingRunner::default());
    let (consumer, queue) = consumer(&app, runner.clone());
    let name = app.state.config().tasks.queue_name.clone();

    queue
        .send(&name, r#"{"command": "clear_cache"}"#)
        .await
        .unwrap();
    queue.send(&name, "not json").await.unwrap();

    assert_eq!(consumer.poll_once().await.unwrap(), 2);
    assert_eq!(consumer.poll_once().await.unwrap(), 0);
    assert_eq!(runner.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_messages_are_errors() {
    let app = spawn_app().await;
    let (consumer, _) = consumer(&app, Arc::new(RecordingRunner::default()));

    assert!(consumer.process("[]").await.is_err());
    assert!(consumer.process(r#"{"command": 5}"#).await.is_err());
    assert!(consumer.process("plain text").await.is_err());
}
