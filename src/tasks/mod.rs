//! Command scheduling bridge: schedules, the dispatcher that fires them onto
//! a queue, and the consumer that executes queued work.

pub mod consumer;
pub mod dispatcher;
pub mod expression;
pub mod queue;
pub mod schedule;

pub use consumer::{CommandRunner, Consumer, Processed};
pub use dispatcher::Dispatcher;
pub use expression::{ExpressionError, ScheduleExpression};
pub use queue::{DbMessageQueue, MessageQueue, QueueMessage};
pub use schedule::{CommandPayload, ScheduleError, schedule_command};
