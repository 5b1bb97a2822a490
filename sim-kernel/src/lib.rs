//! Discrete-event, single-CPU operating-system scheduling kernel.
//!
//! Drives a batch of synthetic processes tick-by-tick through
//! NEW → READY → RUNNING → BLOCKED → TERMINATED, under a choice of
//! round-robin, priority, or priority round-robin scheduling, with a
//! simulated heap and mutex/semaphore primitives shared with a small I/O
//! manager. Every transition is emitted through a [`trace::TraceSink`].
//!
//! This crate is the kernel only. Menu prompting, CSV rendering, and
//! scenario authoring live in the `sim-cli` driver binary.

pub mod config;
pub mod error;
pub mod heap;
pub mod io;
pub mod kernel;
pub mod mutex;
pub mod pcb;
pub mod queue;
pub mod semaphore;
pub mod trace;

pub use config::{Policy, SimConfig};
pub use kernel::{Kernel, ProcessSpec};
pub use pcb::{BlockReason, Device, IoPlan, MutexId, Pcb, Pid, Priority, ProcessState, SemaphoreId};
pub use trace::{CsvTraceSink, NullTraceSink, TraceEvent, TraceSink, VecTraceSink};
