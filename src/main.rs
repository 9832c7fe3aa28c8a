use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use spacemedic::check::{self, RebuildPolicy};
use spacemedic::config::{Settings, Tuning};
use spacemedic::hub::HubClient;

#[derive(Parser)]
#[command(
    name = "spacemedic",
    about = "Scheduled health checks and automatic rebuilds for hosted Spaces",
    version,
    long_about = None
)]
struct Cli {
    /// TOML tuning file (endpoints, polling limits, report paths)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every instance in SPACE_LIST, rebuild failures, update reports
    Run {
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a single instance without rebuilding it
    Probe {
        /// Instance name
        instance: String,
    },

    /// Rebuild a single instance and wait for it to come back
    Rebuild {
        /// Instance name
        instance: String,
    },

    /// Print the timestamp the report would use for a run right now
    RenderTimestamp,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs go to stderr so `run --json` output stays parseable.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn client(settings: &Settings, tuning: &Tuning) -> Result<HubClient> {
    HubClient::new(
        settings.token.clone(),
        settings.account.clone(),
        tuning.endpoints.clone(),
        &tuning.probe,
    )
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let tuning = Tuning::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { json } => {
            let settings = Settings::from_env().context("cannot start run")?;
            let outcome = spacemedic::run(&settings, &tuning).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
            } else {
                println!("\n{:<25} | {:<8} | {:<8} | Elapsed", "Instance", "Action", "Outcome");
                println!("{:-<25}-|-{:-<8}-|-{:-<8}-|-{:-<10}", "", "", "", "");
                for r in &outcome.summary.records {
                    let action = match r.action {
                        check::Action::Probed => "probe",
                        check::Action::Rebuilt => "rebuild",
                    };
                    println!(
                        "{:<25} | {:<8} | {:<8} | {:.2}s",
                        r.instance,
                        action,
                        r.outcome.to_string(),
                        r.elapsed.as_secs_f64()
                    );
                }
                for name in &outcome.summary.skipped {
                    println!("{:<25} | {:<8} | {:<8} |", name, "-", "skipped");
                }
                println!();
            }
            Ok(ExitCode::from(outcome.exit_code as u8))
        }
        Commands::Probe { instance } => {
            let settings = Settings::from_env()?;
            let api = client(&settings, &tuning)?;
            let report = check::probe_instance(&api, &instance).await;
            let status = if report.success { "✅ reachable" } else { "❌ unreachable" };
            println!("{}: {} ({:.2}s)", instance, status, report.elapsed.as_secs_f64());
            Ok(if report.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Rebuild { instance } => {
            let settings = Settings::from_env()?;
            let api = client(&settings, &tuning)?;
            let policy = RebuildPolicy::from(&tuning.rebuild);
            let report = check::rebuild_instance(&api, &instance, &policy).await;
            println!(
                "{}: {} after {} poll(s) ({:.2}s)",
                instance,
                report.outcome,
                report.polls,
                report.elapsed.as_secs_f64()
            );
            Ok(if report.outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::RenderTimestamp => {
            let ts = spacemedic::report::run_timestamp(
                chrono::Utc::now(),
                tuning.report.utc_offset_minutes,
            )?;
            println!("{}", ts);
            Ok(ExitCode::SUCCESS)
        }
    }
}
