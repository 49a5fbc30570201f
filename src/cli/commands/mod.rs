//! Management commands.
//!
//! Commands are addressed by name with JSON args/kwargs, the same shape the
//! task queue carries, so `animeon manage` and the queue consumer share one
//! dispatch path.

mod catalog;
mod myanimelist;
mod users;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::services::{AuthError, ReleaseError};
use crate::state::SharedState;
use crate::tasks::{CommandPayload, CommandRunner};

pub use catalog::{cmd_generate_tests_anime, cmd_remove_all_anime};
pub use myanimelist::{cmd_myanimelist_auth, cmd_myanimelist_update_releases};
pub use users::{cmd_clear_expired_tokens, cmd_create_default_superuser, cmd_finalise_deploy};

/// Names accepted by [`CommandContext::run`].
pub const COMMANDS: &[&str] = &[
    "create_default_superuser",
    "finalise_deploy",
    "generate_tests_anime",
    "remove_all_anime",
    "myanimelist_auth",
    "myanimelist_update_releases",
    "clear_expired_tokens",
];

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("the following arguments are required: --{0}")]
    MissingArgument(String),

    #[error("argument --{name}: invalid value '{value}'")]
    InvalidArgument { name: String, value: String },

    #[error("unrecognized arguments: {0}")]
    UnexpectedArguments(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Release(#[from] ReleaseError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Keyword arguments of one invocation. Values may arrive as JSON strings
/// (command line) or as typed JSON (queue payloads).
pub struct Options<'a> {
    kwargs: &'a Map<String, Value>,
}

impl<'a> Options<'a> {
    #[must_use]
    pub const fn new(kwargs: &'a Map<String, Value>) -> Self {
        Self { kwargs }
    }

    #[must_use]
    pub fn string(&self, name: &str) -> Option<String> {
        match self.kwargs.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn required(&self, name: &str) -> Result<String, CommandError> {
        self.string(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CommandError::MissingArgument(name.to_string()))
    }

    pub fn count(&self, name: &str, default: u32) -> Result<u32, CommandError> {
        let Some(value) = self.kwargs.get(name) else {
            return Ok(default);
        };
        let parsed = match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| CommandError::InvalidArgument {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

#[derive(Clone)]
pub struct CommandContext {
    pub state: SharedState,
}

impl CommandContext {
    #[must_use]
    pub const fn new(state: SharedState) -> Self {
        Self { state }
    }

    pub async fn run(&self, payload: &CommandPayload) -> Result<(), CommandError> {
        if !payload.args.is_empty() {
            let extra: Vec<String> = payload.args.iter().map(Value::to_string).collect();
            return Err(CommandError::UnexpectedArguments(extra.join(" ")));
        }

        let options = Options::new(&payload.kwargs);
        info!(event = "management_command_started", command = %payload.command);

        match payload.command.as_str() {
            "create_default_superuser" => cmd_create_default_superuser(self, &options).await,
            "finalise_deploy" => cmd_finalise_deploy(self).await,
            "generate_tests_anime" => cmd_generate_tests_anime(self, &options).await,
            "remove_all_anime" => cmd_remove_all_anime(self).await,
            "myanimelist_auth" => cmd_myanimelist_auth(self).await,
            "myanimelist_update_releases" => cmd_myanimelist_update_releases(self, &options).await,
            "clear_expired_tokens" => cmd_clear_expired_tokens(self).await,
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

#[async_trait]
impl CommandRunner for CommandContext {
    async fn run_command(&self, payload: CommandPayload) -> anyhow::Result<()> {
        self.run(&payload).await?;
        Ok(())
    }
}

/// Turns `--key value`, `--key=value` and bare flags into kwargs; anything
/// else is positional. A flag followed by a word that is not itself a flag
/// takes that word as its value.
#[must_use]
pub fn parse_cli_arguments(raw: &[String]) -> (Vec<Value>, Map<String, Value>) {
    let mut args = Vec::new();
    let mut kwargs = Map::new();
    let mut iter = raw.iter().peekable();

    while let Some(item) = iter.next() {
        let Some(flag) = item.strip_prefix("--") else {
            args.push(Value::String(item.clone()));
            continue;
        };

        if let Some((key, value)) = flag.split_once('=') {
            kwargs.insert(key.replace('-', "_"), Value::String(value.to_string()));
        } else if let Some(value) = iter.next_if(|next| !next.starts_with("--")) {
            kwargs.insert(flag.replace('-', "_"), Value::String(value.clone()));
        } else {
            kwargs.insert(flag.replace('-', "_"), Value::Bool(true));
        }
    }

    (args, kwargs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Store;

    pub(super) async fn context() -> CommandContext {
        let mut config = Config::default();
        config.security.argon2_memory_cost_kib = 1024;
        config.security.argon2_time_cost = 1;
        let store = Store::new("sqlite::memory:").await.unwrap();
        CommandContext::new(SharedState::with_store(config, store).unwrap())
    }

    #[test]
    fn cli_arguments_split_into_kwargs() {
        let raw: Vec<String> = ["extra", "--keyword", "bleach", "--dry-run", "--anime=3", "--force"]
            .into_iter()
            .map(String::from)
            .collect();
        let (args, kwargs) = parse_cli_arguments(&raw);

        assert_eq!(args, vec![Value::String("extra".into())]);
        assert_eq!(kwargs["keyword"], "bleach");
        assert_eq!(kwargs["anime"], "3");
        assert_eq!(kwargs["dry_run"], true);
        assert_eq!(kwargs["force"], true);
    }

    #[test]
    fn flag_followed_by_a_word_takes_it_as_value() {
        let raw: Vec<String> = ["--dry-run", "extra"].into_iter().map(String::from).collect();
        let (args, kwargs) = parse_cli_arguments(&raw);

        assert!(args.is_empty());
        assert_eq!(kwargs["dry_run"], "extra");
    }

    #[test]
    fn counts_accept_numbers_and_text() {
        let mut kwargs = Map::new();
        kwargs.insert("anime".into(), Value::from(3));
        kwargs.insert("episodes".into(), Value::from("7"));
        kwargs.insert("posters".into(), Value::from("many"));
        let options = Options::new(&kwargs);

        assert_eq!(options.count("anime", 10).unwrap(), 3);
        assert_eq!(options.count("episodes", 10).unwrap(), 7);
        assert_eq!(options.count("genres", 10).unwrap(), 10);
        assert!(matches!(
            options.count("posters", 10),
            Err(CommandError::InvalidArgument { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_command_and_positional_args_fail() {
        let ctx = context().await;

        let unknown = ctx.run(&CommandPayload::new("collectstatic")).await;
        assert!(matches!(unknown, Err(CommandError::Unknown(name)) if name == "collectstatic"));

        let mut payload = CommandPayload::new("clear_expired_tokens");
        payload.args.push(Value::from(1));
        assert!(matches!(
            ctx.run(&payload).await,
            Err(CommandError::UnexpectedArguments(_))
        ));
    }
}
