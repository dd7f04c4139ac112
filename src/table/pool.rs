/// Count of indivisible resource units (forks) currently free at the table.
///
/// `0 <= available <= total` must hold at all times; both mutators run only
/// while the table lock is held, so a violation means mutual exclusion is
/// broken and the process aborts rather than recovers.
pub struct ResourcePool {
    available: u32,
    total: u32,
}

impl ResourcePool {
    pub fn new(total: u32) -> Self {
        Self {
            available: total,
            total,
        }
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Succeeds iff `available >= cost`, taking `cost` units on success.
    pub fn try_grant(&mut self, cost: u32) -> bool {
        if self.available < cost {
            return false;
        }
        self.available -= cost;
        true
    }

    /// Returns `cost` units to the pool. Must be called exactly once per
    /// successful grant; returning more than was taken is fatal.
    pub fn release(&mut self, cost: u32) {
        self.available += cost;
        assert!(
            self.available <= self.total,
            "resource pool overflow: {} units free out of {} total",
            self.available,
            self.total
        );
    }
}
