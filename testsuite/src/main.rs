use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use testbed_core::config::AgentConfig;
use testbed_executor::TestSuiteExecutor;
use testbed_testsuite::ExampleTestsuiteConfigurator;
use testbed_testsuite::cli::TestsuiteCli;
use tokio_util::sync::CancellationToken;

const CONFIG_ERROR_EXIT_CODE: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = TestsuiteCli::parse();

    let config = match resolve_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("testbed-testsuite: {e:#}");
            std::process::exit(CONFIG_ERROR_EXIT_CODE);
        }
    };

    let executor = TestSuiteExecutor::new(
        config.orchestrator.api_socket,
        config.general.log_level,
        cli.params_json,
        ExampleTestsuiteConfigurator::new(config.general.log_format),
    )
    .with_request_timeout(Duration::from_secs(config.orchestrator.request_timeout_secs));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_cancel.cancel();
        }
    });

    match executor.run(cancel).await {
        Ok(()) => tracing::info!("testbed-testsuite finished"),
        Err(e) => {
            tracing::error!(error = %e, "testbed-testsuite failed");
            eprintln!("testbed-testsuite: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn resolve_config(cli: &TestsuiteCli) -> anyhow::Result<AgentConfig> {
    let config = cli.resolve_config().await.with_context(|| match &cli.config {
        Some(path) => format!("failed to resolve configuration from {}", path.display()),
        None => "failed to resolve configuration".to_owned(),
    })?;
    Ok(config)
}
