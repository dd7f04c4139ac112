use std::time::Duration;

use anyhow::{ensure, Result};
use banquet::config::{self, Config, IntervalMs};
use banquet::sim::RunController;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

/// Shared-resource arbiter simulation: N participants compete for F forks,
/// claimed two at a time, under a hybrid aging/FIFO fairness policy.
#[derive(Debug, Parser)]
#[command(name = "banquet", version)]
struct Cli {
    /// Number of competing participants (minimum 2)
    #[arg(long, default_value_t = 6)]
    participants: usize,

    /// Total fork count at the table (minimum 2, below --participants)
    #[arg(long, default_value_t = 4)]
    resource_units: u32,

    /// Seconds of waiting after which a request outranks FIFO order
    #[arg(long, default_value_t = 1.0)]
    aging_threshold: f64,

    /// Wall-clock run duration in seconds
    #[arg(long, default_value_t = 60.0)]
    run_duration: f64,

    /// Think interval range in milliseconds
    #[arg(long, value_name = "LO-HI", value_parser = config::parse_interval, default_value = "100-400")]
    think_ms: IntervalMs,

    /// Eat interval range in milliseconds
    #[arg(long, value_name = "LO-HI", value_parser = config::parse_interval, default_value = "100-350")]
    eat_ms: IntervalMs,

    /// Late join as ID:SECONDS, repeatable (stock scenario: 0:5)
    #[arg(long = "join-late", value_name = "ID:SECS", value_parser = config::parse_offset)]
    join_late: Vec<(usize, Duration)>,

    /// Early leave as ID:SECONDS, repeatable (stock scenario: 3:30)
    #[arg(long = "leave-early", value_name = "ID:SECS", value_parser = config::parse_offset)]
    leave_early: Vec<(usize, Duration)>,

    /// Drop the stock late-join/early-leave scenario hooks
    #[arg(long)]
    no_scenario: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let join_late = if self.no_scenario || !self.join_late.is_empty() {
            self.join_late
        } else {
            config::default_joins()
        };
        let leave_early = if self.no_scenario || !self.leave_early.is_empty() {
            self.leave_early
        } else {
            config::default_leaves(self.participants)
        };
        Ok(Config {
            participants: self.participants,
            resource_units: self.resource_units,
            aging_threshold: seconds(self.aging_threshold, "--aging-threshold")?,
            run_duration: seconds(self.run_duration, "--run-duration")?,
            think_interval: self.think_ms,
            eat_interval: self.eat_ms,
            join_late,
            leave_early,
        })
    }
}

fn seconds(value: f64, flag: &str) -> Result<Duration> {
    ensure!(
        value.is_finite() && value > 0.0,
        "{flag} must be a positive number of seconds, got {value}"
    );
    Ok(Duration::from_secs_f64(value))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let controller = match cli.into_config().and_then(RunController::new) {
        Ok(controller) => controller,
        Err(err) => Cli::command()
            .error(ErrorKind::ValueValidation, format!("{err:#}"))
            .exit(),
    };

    match controller.run() {
        Ok(report) => print!("{report}"),
        Err(err) => {
            eprintln!("banquet: {err:#}");
            std::process::exit(1);
        }
    }
}
