use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dealhound::watch::Watcher;
use dealhound::Credentials;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dealhound", about = "Deal discovery with ensemble price estimation")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/dealhound.toml")]
    config: String,

    /// Pretty-print the output JSON
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one planning cycle and print the alerted opportunity (or null)
    Plan,
    /// Price a single product description with the full ensemble
    Price {
        /// Product description
        description: String,
    },
    /// Run planning cycles until interrupted
    Watch {
        #[arg(long, default_value_t = 300)]
        interval_seconds: u64,
    },
}

fn init_tracing() {
    let json = std::env::var("DEALHOUND_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = dealhound::load_config(&cli.config)?;
    let credentials = Credentials::from_env();

    match cli.command {
        Command::Plan => {
            let planner = dealhound::build_planner(&config, &credentials)
                .context("Failed to build planner")?;
            let report = dealhound::plan_and_remember(&planner, &config.planner.memory_path)
                .await
                .context("Planning cycle failed")?;
            print_json(&report.alerted, cli.pretty)?;
        }
        Command::Price { description } => {
            let ensemble = dealhound::build_ensemble(&config, &credentials)
                .context("Failed to build ensemble")?;
            let pricing = dealhound::price_description(&ensemble, &description).await?;
            print_json(&pricing, cli.pretty)?;
        }
        Command::Watch { interval_seconds } => {
            let planner = dealhound::build_planner(&config, &credentials)
                .context("Failed to build planner")?;
            let watcher = Watcher::new(
                planner,
                &config.planner.memory_path,
                Duration::from_secs(interval_seconds),
            );
            let cancel = watcher.cancel_token();

            // Handle shutdown signals
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Received shutdown signal");
                cancel.cancel();
            });

            watcher.run().await;
        }
    }

    Ok(())
}
