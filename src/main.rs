use std::{fmt::Debug, io, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use synctest::{
    TestHarness,
    config::{HarnessConfig, OutputFormat},
    datastore::MemoryStore,
    filter::DefaultFilter,
    formatter::{
        TestFormatter, json::JsonFormatter, no::NoFormatter, table::TableFormatter,
        terse::TerseFormatter,
    },
    harness, suite,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Run the data store conformance suite against the in-memory store.
#[derive(Debug, Parser)]
#[command(name = "synctest", version)]
struct Cli {
    #[command(flatten)]
    config: HarnessConfig,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SYNCTEST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    // Test bodies are not `Send`, everything runs on this one thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("could not start the async runtime")?;
    runtime.block_on(run(&cli.config))
}

async fn run(config: &HarnessConfig) -> anyhow::Result<ExitCode> {
    let harness = harness().with_config(config);
    let color = config.color;
    match config.format {
        OutputFormat::Table => {
            execute(harness.with_formatter(TableFormatter::default().with_color_setting(color))).await
        }
        OutputFormat::Terse => {
            execute(harness.with_formatter(TerseFormatter::default().with_color_setting(color))).await
        }
        OutputFormat::Json => execute(harness.with_formatter(JsonFormatter::default())).await,
        OutputFormat::None => execute(harness.with_formatter(NoFormatter)).await,
    }
}

async fn execute<Formatter>(
    harness: TestHarness<DefaultFilter, Formatter>,
) -> anyhow::Result<ExitCode>
where
    Formatter: TestFormatter,
    Formatter::Error: Debug,
{
    let store = MemoryStore::new();
    let report = harness
        .run(|registry| async move { suite::register(&registry, store).await })
        .await?;

    for (call, err) in &report.fmt_errors {
        warn!(call, ?err, "formatter failed");
    }
    Ok(report.exit_code())
}
