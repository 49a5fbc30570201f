pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod services;
pub mod state;
pub mod tasks;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use cli::commands::{CommandContext, parse_cli_arguments};
use cli::{Cli, Commands};
pub use config::Config;
use state::SharedState;
use tasks::{CommandPayload, Consumer, DbMessageQueue, Dispatcher, MessageQueue};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, Layer};

const SPAM_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if matches!(command, Commands::Init) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("config.toml already exists");
        }
        return Ok(());
    }

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;
    if prometheus_handle.is_some() {
        info!(event = "metrics_enabled", "Prometheus metrics recorder initialized");
    }

    match command {
        Commands::Serve => run_server(config, prometheus_handle).await,
        Commands::Consume => run_consumer(config).await,
        Commands::Manage { command, args } => {
            let (args, kwargs) = parse_cli_arguments(&args);
            let payload = CommandPayload {
                command,
                args,
                kwargs,
            };
            let shared = SharedState::new(config).await?;
            CommandContext::new(shared).run(&payload).await?;
            Ok(())
        }
        Commands::Schedule {
            command,
            at,
            expression,
            kwargs,
            args,
        } => {
            let start_time = at.as_deref().map(cli::parse_start_time).transpose()?;
            let payload = CommandPayload {
                command,
                args: args.into_iter().map(serde_json::Value::String).collect(),
                kwargs: cli::parse_kwargs(&kwargs)?,
            };
            let shared = SharedState::new(config).await?;
            let scheduled = tasks::schedule_command(
                &shared.store,
                &shared.config.tasks,
                payload,
                start_time,
                expression,
            )
            .await?;
            match scheduled {
                Some(name) => println!("Scheduled {name}"),
                None => println!("Task queue is not configured, nothing was scheduled."),
            }
            Ok(())
        }
        Commands::Init => Ok(()),
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = if config.general.log_format == "json" {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let registry = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "animeon")?
            .extra_field("env", "production")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            event = "loki_enabled",
            url = %config.observability.loki_url,
            "Loki logging initialized"
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        event = "server_starting",
        version = env!("CARGO_PKG_VERSION"),
        "animeon starting"
    );

    let api_state = api::create_app_state_from_config(config.clone(), prometheus_handle).await?;
    let store = api_state.store().clone();

    let dispatcher_handle = if config.tasks.is_enabled() {
        let queue: Arc<dyn MessageQueue> = Arc::new(DbMessageQueue::new(store.clone()));
        let dispatcher = Dispatcher::new(
            store,
            queue,
            Duration::from_secs(config.tasks.sync_interval_seconds),
        );
        Some(tokio::spawn(async move {
            if let Err(e) = dispatcher.run().await {
                error!(event = "dispatcher_failed", error = %e, "Schedule dispatcher stopped");
            }
        }))
    } else {
        info!(event = "dispatcher_disabled", "Task queue is not configured");
        None
    };

    let spam = api_state.shared.spam.clone();
    let prune_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SPAM_PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            spam.prune();
        }
    });

    let port = config.server.port;
    let app = api::router(api_state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    let server_handle = tokio::spawn(async move {
        info!(event = "server_listening", port, "HTTP server running");
        let service = app.into_make_service_with_connect_info::<SocketAddr>();
        if let Err(e) = axum::serve(listener, service).await {
            error!(event = "server_failed", error = %e, "HTTP server error");
        }
    });

    wait_for_shutdown().await;

    server_handle.abort();
    prune_handle.abort();
    if let Some(handle) = dispatcher_handle {
        handle.abort();
    }
    info!(event = "server_stopped", "Server stopped");

    Ok(())
}

async fn run_consumer(config: Config) -> anyhow::Result<()> {
    if !config.tasks.is_enabled() {
        anyhow::bail!("tasks.queue_name is empty, there is no queue to consume");
    }

    let tasks_config = config.tasks.clone();
    let server_config = config.server.clone();
    let api_state = api::create_app_state_from_config(config, None).await?;

    let queue: Arc<dyn MessageQueue> = Arc::new(DbMessageQueue::new(api_state.store().clone()));
    let runner = Arc::new(CommandContext::new(api_state.shared.clone()));
    let consumer = Consumer::new(
        queue,
        runner,
        api::router(api_state),
        tasks_config,
        server_config,
    );

    tokio::select! {
        result = consumer.run() => result,
        () = wait_for_shutdown() => {
            info!(event = "consumer_stopped", "Queue consumer stopped");
            Ok(())
        }
    }
}

async fn wait_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => info!(event = "shutdown_signal", "Shutdown signal received"),
        Err(e) => error!(event = "shutdown_listen_failed", error = %e, "Error listening for shutdown"),
    }
}
