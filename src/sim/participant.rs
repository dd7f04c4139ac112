use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::{Config, IntervalMs};
use crate::table::{Table, UNIT_COST};

/// One competing thread of work: think, request, eat, release, repeat.
/// May start late (join offset) and may stop competing early (leave offset);
/// both are plain data from the configuration.
pub struct Participant {
    table: Arc<Table>,
    seat: usize,
    think: IntervalMs,
    eat: IntervalMs,
    join_after: Option<Duration>,
    leave_after: Option<Duration>,
    started: Instant,
}

impl Participant {
    /// `started` is the shared process start, the zero point for join/leave
    /// offsets.
    pub fn new(table: &Arc<Table>, seat: usize, config: &Config, started: Instant) -> Self {
        Self {
            table: table.clone(),
            seat,
            think: config.think_interval,
            eat: config.eat_interval,
            join_after: config.join_offset(seat),
            leave_after: config.leave_offset(seat),
            started,
        }
    }

    pub fn run(self) {
        if let Some(delay) = self.join_after {
            if !self.sleep_while_running(delay) {
                // the run ended before this seat ever joined
                return;
            }
            info!(seat = self.seat, "arrives late to the banquet");
        }
        self.table.lock().seats[self.seat].active = true;
        info!(seat = self.seat, "thinking");

        let mut rng = rand::thread_rng();
        while self.table.running() {
            thread::sleep(self.think.sample(&mut rng));
            // departure is checked before a new request is ever issued
            if self.leave_due() {
                self.depart();
                return;
            }
            if !self.request() {
                // woken by shutdown or deactivation, not by a grant
                break;
            }
            info!(seat = self.seat, "eating");
            thread::sleep(self.eat.sample(&mut rng));
            self.finish_eating();
            info!(seat = self.seat, "released forks, thinking");
        }
    }

    /// Sleeps for `total`, waking early if the run stops. Returns whether the
    /// full delay elapsed with the run still going. Join offsets can exceed
    /// the deadline, so this must not pin the controller's join.
    fn sleep_while_running(&self, total: Duration) -> bool {
        let deadline = Instant::now() + total;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return true;
            }
            thread::sleep(left.min(Duration::from_millis(100)));
            if !self.table.running() {
                return false;
            }
        }
    }

    fn leave_due(&self) -> bool {
        self.leave_after
            .is_some_and(|after| self.started.elapsed() >= after)
    }

    fn depart(&self) {
        let mut st = self.table.lock();
        st.seats[self.seat].active = false;
        drop(st);
        // the arbiter purges the seat's queue entry, if any, on its next scan
        self.table.notify_arbiter();
        info!(seat = self.seat, "leaves the banquet early");
    }

    /// Enqueues a request (idempotently) and blocks on this seat's condvar
    /// until the grant arrives or the run ends. Returns whether a grant was
    /// received; statistics are recorded only for fulfilled requests.
    fn request(&self) -> bool {
        let mut st = self.table.lock();
        if !st.seats[self.seat].waiting {
            let now = Instant::now();
            st.seats[self.seat].waiting = true;
            st.seats[self.seat].request_time = Some(now);
            st.queue.enqueue(self.seat, now);
            info!(seat = self.seat, "hungry, requesting forks");
            self.table.notify_arbiter();
        }
        while !st.seats[self.seat].granted && st.seats[self.seat].active && self.table.running() {
            st = self.table.wait_seat(st, self.seat);
        }
        let seat = &mut st.seats[self.seat];
        if !seat.granted {
            // abandoned mid-request; the grant never arrived
            return false;
        }
        seat.granted = false; // consume exactly once
        let wait = seat
            .request_time
            .take()
            .map(|at| at.elapsed())
            .unwrap_or_default();
        seat.wait_total += wait;
        if wait > seat.wait_max {
            seat.wait_max = wait;
        }
        true
    }

    fn finish_eating(&self) {
        let mut st = self.table.lock();
        st.seats[self.seat].acquire_count += 1;
        st.pool.release(UNIT_COST);
        drop(st);
        self.table.notify_arbiter();
    }
}
