//! Compile-time configuration and the scheduling policy enum.

use serde::{Deserialize, Serialize};

/// 64 MiB, matching the source's fixed-size simulated arena.
pub const HEAP_SIZE: usize = 64 * 1024 * 1024;

/// Structural, not configurable: `LOW`, `MEDIUM`, `HIGH`.
pub const NUM_PRIORITIES: usize = 3;

/// Default quantum substituted for a non-positive configured value.
pub const DEFAULT_QUANTUM: u32 = 2;

/// Maximum number of processes a single run will admit.
pub const MAX_PROCESSES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    RoundRobin,
    Priority,
    PriorityRr,
}

impl Policy {
    /// Whether this policy preempts a running process when a higher
    /// priority process becomes ready.
    pub fn preempts_on_priority(self) -> bool {
        matches!(self, Policy::Priority | Policy::PriorityRr)
    }

    /// Whether this policy charges and recharges a quantum at all.
    pub fn uses_quantum(self) -> bool {
        matches!(self, Policy::RoundRobin | Policy::PriorityRr)
    }
}

/// Resolved configuration for a single run. Construct via
/// [`SimConfig::new`], which applies the documented fallbacks for invalid
/// input rather than failing.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    pub policy: Policy,
    pub quantum: u32,
    pub heap_size: usize,
    pub max_processes: usize,
}

impl SimConfig {
    /// `quantum_input <= 0` is a configuration error per the error-handling
    /// policy: substitute [`DEFAULT_QUANTUM`] and warn, never fail.
    pub fn new(policy: Policy, quantum_input: i64) -> Self {
        let quantum = if quantum_input > 0 {
            quantum_input as u32
        } else {
            log::warn!(
                "quantum {quantum_input} is not positive; falling back to default {DEFAULT_QUANTUM}"
            );
            DEFAULT_QUANTUM
        };
        SimConfig { policy, quantum, heap_size: HEAP_SIZE, max_processes: MAX_PROCESSES }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig::new(Policy::Priority, i64::from(DEFAULT_QUANTUM))
    }
}
