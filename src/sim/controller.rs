use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::info;

use super::{Arbiter, Participant, Report};
use crate::config::Config;
use crate::table::Table;

/// Granularity of the deadline watch in the controller thread.
const DEADLINE_POLL: Duration = Duration::from_millis(200);

/// Owns a whole run: validates the configuration, spawns the arbiter and one
/// thread per participant, enforces the wall-clock deadline, and surfaces the
/// arbiter's final report. No policy logic lives here.
pub struct RunController {
    config: Config,
}

impl RunController {
    /// Fails on an invalid configuration, before any thread starts.
    pub fn new(config: Config) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        Ok(Self { config })
    }

    pub fn run(&self) -> Result<Report> {
        let cfg = &self.config;
        let table = Arc::new(Table::new(cfg.participants, cfg.resource_units));
        let started = Instant::now();
        info!(
            participants = cfg.participants,
            resource_units = cfg.resource_units,
            "banquet starting"
        );

        let arbiter = Arbiter::new(&table, cfg.aging_threshold);
        let arbiter_th = thread::Builder::new()
            .name("arbiter".into())
            .spawn(move || arbiter.run())
            .context("spawning arbiter")?;

        let mut participant_ths = Vec::with_capacity(cfg.participants);
        for seat in 0..cfg.participants {
            let p = Participant::new(&table, seat, cfg, started);
            let th = thread::Builder::new()
                .name(format!("participant-{seat}"))
                .spawn(move || p.run())
                .with_context(|| format!("spawning participant {seat}"))?;
            participant_ths.push(th);
        }

        let mut remaining = cfg.run_duration.saturating_sub(started.elapsed());
        while !remaining.is_zero() {
            thread::sleep(remaining.min(DEADLINE_POLL));
            remaining = cfg.run_duration.saturating_sub(started.elapsed());
        }

        table.stop();
        info!("deadline reached, shutting down");
        for (seat, th) in participant_ths.into_iter().enumerate() {
            th.join()
                .map_err(|_| anyhow!("participant {seat} panicked"))?;
        }
        let report = arbiter_th
            .join()
            .map_err(|_| anyhow!("arbiter panicked"))?;
        Ok(report)
    }
}
