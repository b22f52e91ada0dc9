//! Entry point for the Falcon hide-host function.
//!
//! Started without arguments (as the Lambda `bootstrap`), it resolves the
//! Falcon credentials once and serves EC2 termination events until the
//! runtime shuts it down. The `hide` and `lookup` subcommands run the same
//! code paths by hand.

use anyhow::Result;
use clap::{Parser, Subcommand};
use falcon_hide_host::{
    config::Settings,
    falcon::USER_AGENT,
    fetch::BasicClient,
    handler::{function_handler, process_event},
    hide::instance_filter,
    infra::keys::connect_store,
    services::HostsApi,
    startup::bootstrap,
};
use lambda_runtime::{LambdaEvent, service_fn};
use serde_json::{Value, json};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "falcon_hide_host")]
#[command(about = "Hide terminated EC2 instances in the CrowdStrike Falcon console", long_about = None)]
struct Cli {
    /// Without a subcommand the Lambda runtime loop is started
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide the Falcon host registered for an EC2 instance
    Hide {
        /// EC2 instance id, e.g. i-0123456789abcdef0
        #[arg(short, long)]
        instance_id: String,
    },
    /// Show the Falcon host ids registered for an EC2 instance without hiding anything
    Lookup {
        /// EC2 instance id, e.g. i-0123456789abcdef0
        #[arg(short, long)]
        instance_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = init_logging();

    let cli = Cli::parse();

    let settings = Settings::from_env()?;
    let store = connect_store(&settings.credential_source, &settings.secret_region).await;
    let client = bootstrap(&settings, store.as_ref(), BasicClient::new(USER_AGENT)?).await?;

    match cli.command {
        None => {
            let client = &client;
            lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
                function_handler(client, event)
            }))
            .await
            .map_err(|e| anyhow::anyhow!("Lambda runtime failed: {e}"))?;
        }
        Some(Commands::Hide { instance_id }) => {
            let payload = json!({ "detail": { "instance-id": instance_id } });
            let output = process_event(&payload, &client.session()).await;
            info!("{}", serde_json::to_string(&output)?);
        }
        Some(Commands::Lookup { instance_id }) => {
            let result = client
                .session()
                .query_devices_by_filter(&instance_filter(&instance_id))
                .await?;
            info!(
                instance_id = %instance_id,
                status = result.status_code,
                hosts = ?result.resources,
                "Host lookup"
            );
        }
    }

    Ok(())
}

/// Inside Lambda: JSON lines on stdout for CloudWatch. Locally: colored stderr
/// plus an optional JSON rolling log file when `LOG_FILE_PATH` is set.
fn init_logging() -> Option<WorkerGuard> {
    if std::env::var("AWS_LAMBDA_FUNCTION_NAME").is_ok() {
        tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(env_filter("RUST_LOG", "info"))
            .with_ansi(false)
            .without_time()
            .init();
        return None;
    }

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info"));

    let (json_layer, guard) = match std::env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let log_dir = Path::new(&log_file_path)
                .parent()
                .unwrap_or(Path::new("logs"));
            let log_file_name = Path::new(&log_file_path)
                .file_name()
                .unwrap_or(OsStr::new("falcon_hide_host.log"));

            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking_file)
                .with_filter(env_filter("RUST_LOG_JSON", "debug"));
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

fn env_filter(var: &str, default: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}
