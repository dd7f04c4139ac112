pub mod pool;
pub mod queue;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use self::pool::ResourcePool;
use self::queue::RequestQueue;

/// Units taken per grant. A participant always claims two forks at once.
pub const UNIT_COST: u32 = 2;

/// Registry entry for one participant. The transient request flags are shared
/// with the arbiter and touched only under the table lock; the statistics are
/// written by the owning participant alone (also under the lock, so the final
/// report sees a consistent snapshot). Seats are never removed mid-run,
/// deactivation is a flag flip.
#[derive(Debug, Default)]
pub struct Seat {
    pub active: bool,
    pub waiting: bool,
    pub granted: bool,
    pub request_time: Option<Instant>,
    pub acquire_count: u32,
    pub wait_total: Duration,
    pub wait_max: Duration,
}

/// Everything guarded by the single table lock.
pub struct TableState {
    pub pool: ResourcePool,
    pub queue: RequestQueue,
    pub seats: Vec<Seat>,
}

impl TableState {
    /// Drops queue entries whose owner deactivated since the last scan. Purged
    /// seats are neither granted nor penalized; their request simply vanishes.
    pub fn purge_inactive(&mut self) {
        for req in self.queue.iter() {
            if !self.seats[req.seat].active {
                let seat = &mut self.seats[req.seat];
                seat.waiting = false;
                seat.request_time = None;
            }
        }
        let seats = &self.seats;
        self.queue.retain(|req| seats[req.seat].active);
    }
}

/// Shared context for one run: the lock-guarded state, the arbiter's
/// "something changed" condvar, one grant condvar per seat for point-to-point
/// delivery, and the global running flag.
pub struct Table {
    state: Mutex<TableState>,
    arbiter_cv: Condvar,
    seat_cvs: Vec<Condvar>,
    running: AtomicBool,
}

impl Table {
    pub fn new(seats: usize, units: u32) -> Self {
        Self {
            state: Mutex::new(TableState {
                pool: ResourcePool::new(units),
                queue: RequestQueue::default(),
                seats: (0..seats).map(|_| Seat::default()).collect(),
            }),
            arbiter_cv: Condvar::new(),
            seat_cvs: (0..seats).map(|_| Condvar::new()).collect(),
            running: AtomicBool::new(true),
        }
    }

    pub fn seats(&self) -> usize {
        self.seat_cvs.len()
    }

    // A poisoned lock means a thread panicked inside the critical section;
    // the shared invariants can no longer be trusted, so propagate the abort.
    pub fn lock(&self) -> MutexGuard<'_, TableState> {
        self.state.lock().expect("table lock poisoned")
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Wakes the arbiter to re-run its scan (new request, release, departure).
    pub fn notify_arbiter(&self) {
        self.arbiter_cv.notify_one();
    }

    /// Delivers a grant wakeup to exactly one seat.
    pub fn notify_seat(&self, seat: usize) {
        self.seat_cvs[seat].notify_one();
    }

    /// Blocks the arbiter until notified or `timeout` elapses. The timeout is
    /// the liveness fallback: even a missed signal only delays the next scan.
    pub fn wait_arbiter<'a>(
        &self,
        guard: MutexGuard<'a, TableState>,
        timeout: Duration,
    ) -> MutexGuard<'a, TableState> {
        let (guard, _timed_out) = self
            .arbiter_cv
            .wait_timeout(guard, timeout)
            .expect("table lock poisoned");
        guard
    }

    /// Blocks a seat until its grant condvar fires. Callers re-check their
    /// predicate in a loop; spurious wakes are expected.
    pub fn wait_seat<'a>(
        &self,
        guard: MutexGuard<'a, TableState>,
        seat: usize,
    ) -> MutexGuard<'a, TableState> {
        self.seat_cvs[seat].wait(guard).expect("table lock poisoned")
    }

    /// Ends the run: clears the running flag and wakes every blocked thread
    /// exactly once so each can re-check its predicate and exit.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let guard = self.lock();
        self.arbiter_cv.notify_all();
        for cv in &self.seat_cvs {
            cv.notify_all();
        }
        drop(guard);
    }
}
