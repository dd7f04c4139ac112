//! Shared-resource arbiter with starvation-avoidance fairness.
//!
//! `N` participants compete for `F < N` indivisible resource units (forks),
//! claimed two at a time. A single arbiter thread decides grants under a
//! hybrid policy: FIFO order, overridden by wait-time aging once a request
//! has waited past a configured threshold. Participants may join the
//! competition late or depart early while the run is in progress.

pub mod config;
pub mod sim;
pub mod table;
