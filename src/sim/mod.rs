pub mod arbiter;
pub mod controller;
pub mod participant;

use std::fmt;
use std::time::Duration;

use crate::table::TableState;

pub use self::arbiter::Arbiter;
pub use self::controller::RunController;
pub use self::participant::Participant;

/// Final statistics for one seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatReport {
    pub seat: usize,
    pub acquisitions: u32,
    pub wait_total: Duration,
    pub wait_max: Duration,
}

impl SeatReport {
    pub fn avg_wait(&self) -> Duration {
        if self.acquisitions == 0 {
            Duration::ZERO
        } else {
            self.wait_total / self.acquisitions
        }
    }
}

/// Per-seat statistics in ascending seat order, snapshotted under the table
/// lock at shutdown. The rendered form is part of the external contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub seats: Vec<SeatReport>,
}

impl Report {
    pub fn snapshot(state: &TableState) -> Self {
        Self {
            seats: state
                .seats
                .iter()
                .enumerate()
                .map(|(seat, s)| SeatReport {
                    seat,
                    acquisitions: s.acquire_count,
                    wait_total: s.wait_total,
                    wait_max: s.wait_max,
                })
                .collect(),
        }
    }

    pub fn total_acquisitions(&self) -> u32 {
        self.seats.iter().map(|s| s.acquisitions).sum()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===== Banquet Report =====")?;
        for s in &self.seats {
            writeln!(
                f,
                "Participant {}: ate {} times | avg wait: {:.2}s | max wait: {:.2}s",
                s.seat,
                s.acquisitions,
                s.avg_wait().as_secs_f64(),
                s.wait_max.as_secs_f64()
            )?;
        }
        Ok(())
    }
}
