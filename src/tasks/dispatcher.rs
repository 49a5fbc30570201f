//! Fires stored schedules onto their queues.
//!
//! The schedule table is the source of truth: every sync interval the
//! dispatcher registers jobs for new rows and drops jobs whose rows are
//! gone. A fired job only enqueues the payload; the consumer executes it.

use anyhow::Result;
use chrono::{Datelike, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::expression::ScheduleExpression;
use super::queue::MessageQueue;
use crate::db::Store;
use crate::entities::scheduled_tasks;

pub struct Dispatcher {
    store: Store,
    queue: Arc<dyn MessageQueue>,
    sync_interval: Duration,
    registered: HashMap<String, Uuid>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(store: Store, queue: Arc<dyn MessageQueue>, sync_interval: Duration) -> Self {
        Self {
            store,
            queue,
            sync_interval: sync_interval.max(Duration::from_secs(1)),
            registered: HashMap::new(),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let sched = JobScheduler::new().await?;
        sched.start().await?;
        info!(
            event = "dispatcher_started",
            sync_interval_secs = self.sync_interval.as_secs(),
            "Schedule dispatcher running"
        );

        let mut ticker = tokio::time::interval(self.sync_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.sync(&sched).await {
                error!(event = "dispatcher_sync_failed", error = %e, "Failed to sync schedules");
            }
        }
    }

    /// Aligns the registered jobs with the schedule table.
    pub async fn sync(&mut self, sched: &JobScheduler) -> Result<usize> {
        let schedules = self.store.tasks().list_schedules().await?;

        let stale: Vec<String> = self
            .registered
            .keys()
            .filter(|name| !schedules.iter().any(|s| &s.name == *name))
            .cloned()
            .collect();
        for name in stale {
            if let Some(job_id) = self.registered.remove(&name) {
                sched.remove(&job_id).await?;
            }
        }

        let mut added = 0;
        for schedule in schedules {
            if self.registered.contains_key(&schedule.name) {
                continue;
            }
            match self.build_job(&schedule) {
                Ok(job) => {
                    let job_id = sched.add(job).await?;
                    self.registered.insert(schedule.name.clone(), job_id);
                    added += 1;
                }
                Err(e) => {
                    warn!(
                        event = "schedule_rejected",
                        task_id = %schedule.name,
                        expression = %schedule.expression,
                        error = %e,
                        "Skipping schedule"
                    );
                }
            }
        }

        Ok(added)
    }

    fn build_job(&self, schedule: &scheduled_tasks::Model) -> Result<Job> {
        let expression = ScheduleExpression::parse(&schedule.expression)?;
        let fire = Fire {
            store: self.store.clone(),
            queue: Arc::clone(&self.queue),
            name: schedule.name.clone(),
            queue_name: schedule.queue_name.clone(),
            payload: schedule.payload.clone(),
            delete_after: schedule.delete_after_completion && expression.is_one_shot(),
        };

        let cron = expression.job_cron();
        let job = match expression {
            ScheduleExpression::At(at) => {
                let delay = (at.and_utc() - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                Job::new_one_shot_async(delay, move |_id, _sched| {
                    let fire = fire.clone();
                    Box::pin(async move { fire.run().await })
                })?
            }
            ScheduleExpression::Rate(every) => Job::new_repeated_async(every, move |_id, _sched| {
                let fire = fire.clone();
                Box::pin(async move { fire.run().await })
            })?,
            ScheduleExpression::Cron { year, .. } => {
                let cron = cron.unwrap_or_default();
                Job::new_async(cron.as_str(), move |_id, _sched| {
                    let fire = fire.clone();
                    Box::pin(async move {
                        if year.is_none_or(|y| y == Utc::now().year()) {
                            fire.run().await;
                        }
                    })
                })?
            }
        };

        Ok(job)
    }
}

#[derive(Clone)]
struct Fire {
    store: Store,
    queue: Arc<dyn MessageQueue>,
    name: String,
    queue_name: String,
    payload: String,
    delete_after: bool,
}

impl Fire {
    async fn run(&self) {
        match self.queue.send(&self.queue_name, &self.payload).await {
            Ok(()) => info!(
                event = "schedule_fired",
                task_id = %self.name,
                queue = %self.queue_name,
                "Scheduled command enqueued"
            ),
            Err(e) => {
                error!(event = "schedule_fire_failed", task_id = %self.name, error = %e, "Failed to enqueue");
                return;
            }
        }

        if self.delete_after
            && let Err(e) = self.store.tasks().delete_schedule(&self.name).await
        {
            error!(event = "schedule_delete_failed", task_id = %self.name, error = %e, "Failed to delete schedule");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::tasks::NewSchedule;
    use crate::tasks::queue::DbMessageQueue;

    #[tokio::test]
    async fn due_one_shot_is_enqueued_and_removed() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store
            .tasks()
            .create_schedule(NewSchedule {
                name: "Task-x-1".into(),
                queue_name: "commands".into(),
                expression: "at(2000-01-01T00:00:00)".into(),
                payload: "{\"command\":\"x\"}".into(),
                delete_after_completion: true,
            })
            .await
            .unwrap();
        store
            .tasks()
            .create_schedule(NewSchedule {
                name: "Task-bad-1".into(),
                queue_name: "commands".into(),
                expression: "weekly".into(),
                payload: "{}".into(),
                delete_after_completion: true,
            })
            .await
            .unwrap();

        let queue: Arc<dyn MessageQueue> = Arc::new(DbMessageQueue::new(store.clone()));
        let mut dispatcher = Dispatcher::new(store.clone(), Arc::clone(&queue), Duration::from_secs(1));
        let sched = JobScheduler::new().await.unwrap();
        sched.start().await.unwrap();

        assert_eq!(dispatcher.sync(&sched).await.unwrap(), 1);
        assert_eq!(dispatcher.sync(&sched).await.unwrap(), 0);

        let received = queue
            .receive("commands", 10, Duration::from_secs(10), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].body, "{\"command\":\"x\"}");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(store.tasks().get_schedule("Task-x-1").await.unwrap().is_none());
    }
}
