use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use keyspace_manager::cli::Args;
use keyspace_manager::config::{self, KeyspaceManagerConfig};
use keyspace_manager::{KeyspaceReconciler, ReconciliationResult};
use svckit::database::ScyllaConnector;
use svckit::errors::KeyspaceError;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let name = args.name.clone().unwrap_or_default();
            return emit(&ReconciliationResult::failure(&name, format!("Configuration error: {:#}", e)));
        }
    };
    args.apply(&mut config);

    // Logs go to stderr so stdout carries only the result document.
    let level = config.observability.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("keyspace_manager={level},svckit={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let name = config.keyspace.name.clone();
    let span = info_span!("reconcile", keyspace = %name, invocation_id = %Uuid::new_v4());
    let result = run(config).instrument(span).await;
    emit(&result)
}

async fn run(config: KeyspaceManagerConfig) -> ReconciliationResult {
    let name = config.keyspace.name.clone();
    match prepare(&config).await {
        Ok((connector, spec)) => {
            info!(
                "Reconciling keyspace {} towards {:?} (check_mode={})",
                spec.name, spec.state, config.check_mode
            );
            let mut reconciler = KeyspaceReconciler::new(
                connector,
                config.connection.consistency_level,
                config.check_mode,
            );
            reconciler.run(&spec).await
        }
        Err(e) => {
            error!("Invalid configuration: {}", e);
            ReconciliationResult::from_error(&name, &e)
        }
    }
}

async fn prepare(
    config: &KeyspaceManagerConfig,
) -> Result<(ScyllaConnector, keyspace_manager::DesiredKeyspaceSpec), KeyspaceError> {
    let spec = config.keyspace.to_spec()?;
    config.connection.validate()?;
    let hosts = config.connection.resolve_hosts().await;
    let connector = ScyllaConnector::new(&config.connection, &hosts)?;
    Ok((connector, spec))
}

fn emit(result: &ReconciliationResult) -> ExitCode {
    match serde_json::to_string(result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("failed to serialize result: {}", e);
            return ExitCode::FAILURE;
        }
    }
    if result.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
