use std::time::Duration;

use anyhow::{ensure, Result};

pub const MIN_PARTICIPANTS: usize = 2;
pub const MIN_RESOURCE_UNITS: u32 = 2;

/// Inclusive millisecond range a participant sleeps for, sampled fresh each
/// cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalMs {
    pub lo: u64,
    pub hi: u64,
}

impl IntervalMs {
    pub const fn new(lo: u64, hi: u64) -> Self {
        Self { lo, hi }
    }

    pub fn sample(&self, rng: &mut impl rand::Rng) -> Duration {
        Duration::from_millis(rng.gen_range(self.lo..=self.hi))
    }
}

/// Simulation parameters. Scenario hooks (late joins, early departures) are
/// data here rather than code, so tests and the CLI can shape runs freely.
#[derive(Debug, Clone)]
pub struct Config {
    pub participants: usize,
    pub resource_units: u32,
    pub aging_threshold: Duration,
    pub run_duration: Duration,
    pub think_interval: IntervalMs,
    pub eat_interval: IntervalMs,
    /// `(seat, offset)` pairs: the seat stays inactive until `offset` after
    /// process start.
    pub join_late: Vec<(usize, Duration)>,
    /// `(seat, offset)` pairs: the seat deactivates once `offset` has elapsed.
    pub leave_early: Vec<(usize, Duration)>,
}

impl Default for Config {
    fn default() -> Self {
        let participants = 6;
        Self {
            participants,
            resource_units: 4,
            aging_threshold: Duration::from_secs_f64(1.0),
            run_duration: Duration::from_secs(60),
            think_interval: IntervalMs::new(100, 400),
            eat_interval: IntervalMs::new(100, 350),
            join_late: default_joins(),
            leave_early: default_leaves(participants),
        }
    }
}

/// Stock scenario: seat 0 arrives five seconds late.
pub fn default_joins() -> Vec<(usize, Duration)> {
    vec![(0, Duration::from_secs(5))]
}

/// Stock scenario: seat 3 departs at thirty seconds, when the table is big
/// enough to have a seat 3.
pub fn default_leaves(participants: usize) -> Vec<(usize, Duration)> {
    if participants > 3 {
        vec![(3, Duration::from_secs(30))]
    } else {
        Vec::new()
    }
}

impl Config {
    /// Rejects any combination that would start an unsafe or degenerate run.
    /// Called before any thread is spawned.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.participants >= MIN_PARTICIPANTS,
            "at least {MIN_PARTICIPANTS} participants are required, got {}",
            self.participants
        );
        ensure!(
            self.resource_units >= MIN_RESOURCE_UNITS,
            "at least {MIN_RESOURCE_UNITS} resource units are required, got {}",
            self.resource_units
        );
        ensure!(
            (self.resource_units as usize) < self.participants,
            "resource units ({}) must stay below the participant count ({})",
            self.resource_units,
            self.participants
        );
        ensure!(
            !self.run_duration.is_zero(),
            "run duration must be positive"
        );
        ensure!(
            !self.aging_threshold.is_zero(),
            "aging threshold must be positive"
        );
        for interval in [self.think_interval, self.eat_interval] {
            ensure!(
                interval.lo <= interval.hi,
                "interval range {}-{} is inverted",
                interval.lo,
                interval.hi
            );
        }
        for (seat, _) in self.join_late.iter().chain(&self.leave_early) {
            ensure!(
                *seat < self.participants,
                "scenario hook names seat {seat}, but seats run 0..{}",
                self.participants
            );
        }
        Ok(())
    }

    pub fn join_offset(&self, seat: usize) -> Option<Duration> {
        self.join_late
            .iter()
            .find(|(s, _)| *s == seat)
            .map(|(_, d)| *d)
    }

    pub fn leave_offset(&self, seat: usize) -> Option<Duration> {
        self.leave_early
            .iter()
            .find(|(s, _)| *s == seat)
            .map(|(_, d)| *d)
    }
}

/// Parses a scenario hook of the form `ID:SECONDS`, e.g. `0:5` or `3:30.5`.
pub fn parse_offset(s: &str) -> Result<(usize, Duration), String> {
    let (id, secs) = s
        .split_once(':')
        .ok_or_else(|| format!("expected ID:SECONDS, got `{s}`"))?;
    let id: usize = id
        .parse()
        .map_err(|_| format!("invalid participant id `{id}`"))?;
    let secs: f64 = secs
        .parse()
        .map_err(|_| format!("invalid seconds value `{secs}`"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("offset seconds must be finite and >= 0, got {secs}"));
    }
    Ok((id, Duration::from_secs_f64(secs)))
}

/// Parses an interval range of the form `LO-HI` in milliseconds, e.g.
/// `100-400`.
pub fn parse_interval(s: &str) -> Result<IntervalMs, String> {
    let (lo, hi) = s
        .split_once('-')
        .ok_or_else(|| format!("expected LO-HI milliseconds, got `{s}`"))?;
    let lo: u64 = lo.parse().map_err(|_| format!("invalid bound `{lo}`"))?;
    let hi: u64 = hi.parse().map_err(|_| format!("invalid bound `{hi}`"))?;
    if lo > hi {
        return Err(format!("interval range {lo}-{hi} is inverted"));
    }
    Ok(IntervalMs::new(lo, hi))
}
