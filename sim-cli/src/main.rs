//! Driver binary for `sim-kernel`.
//!
//! Parses a policy and a scenario (file or interactive), runs the tick loop
//! to completion, and writes the canonical CSV trace. The kernel does all
//! the real work; this binary is the thin, out-of-scope-per-spec.md-§1
//! "external collaborator" layer: menu prompting, CSV serialization, and a
//! minimal replay mode. Gantt-plot rendering stays out of scope.

mod interactive;
mod scenario;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use sim_kernel::config::{Policy, SimConfig};
use sim_kernel::kernel::Kernel;
use sim_kernel::trace::{CsvTraceSink, CSV_HEADER};

#[derive(Parser)]
#[command(name = "sim-cli")]
#[command(about = "Discrete-event single-CPU OS scheduling simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario non-interactively and write a CSV trace.
    Run {
        /// Scheduling policy.
        #[arg(long, value_enum, default_value = "priority")]
        policy: PolicyArg,

        /// Ticks a process may hold the CPU before preemption (round-robin
        /// and priority-round-robin only). Non-positive values fall back
        /// to the documented default of 2.
        #[arg(long, default_value_t = 2)]
        quantum: i64,

        /// JSON scenario file. Falls back to the built-in Scenario A demo
        /// (three CPU-bound processes under round-robin) if omitted.
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// Where to write the CSV event trace.
        #[arg(long, default_value = "trace.csv")]
        trace: PathBuf,
    },

    /// Walk the interactive menu/scenario prompts, then behave like `run`.
    Interactive {
        #[arg(long, default_value = "trace.csv")]
        trace: PathBuf,
    },

    /// Print a previously recorded CSV trace back out (a minimal stand-in
    /// for the Gantt-plot renderer, which stays out of scope).
    Replay {
        /// Path to a CSV trace produced by `run` or `interactive`.
        trace: PathBuf,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum PolicyArg {
    RoundRobin,
    Priority,
    PriorityRr,
}

impl From<PolicyArg> for Policy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::RoundRobin => Policy::RoundRobin,
            PolicyArg::Priority => Policy::Priority,
            PolicyArg::PriorityRr => Policy::PriorityRr,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { policy, quantum, scenario, trace } => {
            let policy = policy.into();
            let specs = match scenario {
                Some(path) => self::scenario::load_file(&path, policy)?,
                None => self::scenario::demo_scenario(),
            };
            run(policy, quantum, specs, &trace)
        }
        Commands::Interactive { trace } => {
            let policy = interactive::ask_policy()?;
            let quantum = interactive::ask_quantum(policy)?;
            let specs = interactive::ask_processes(policy)?;
            run(policy, i64::from(quantum), specs, &trace)
        }
        Commands::Replay { trace } => replay(&trace),
    }
}

fn run(policy: Policy, quantum: i64, specs: Vec<sim_kernel::kernel::ProcessSpec>, trace_path: &PathBuf) -> Result<()> {
    let config = SimConfig::new(policy, quantum);
    // Fatal I/O per spec.md §7: an unopenable trace file aborts the run
    // with a non-zero exit, unlike every other error path in the kernel.
    let sink = CsvTraceSink::create(trace_path)
        .with_context(|| format!("could not open trace file {}", trace_path.display()))?;
    let mut kernel = Kernel::new(config, sink);

    if specs.is_empty() {
        anyhow::bail!("scenario describes zero processes");
    }
    for spec in specs {
        kernel.create_process(spec);
    }

    // `is_finished` is the documented termination condition; a generous
    // safety cap guards against a malformed scenario (e.g. a burst large
    // enough, combined with I/O, to never settle) hanging the CLI forever.
    const MAX_TICKS: u64 = 1_000_000;
    while !kernel.is_finished() && kernel.current_time() < MAX_TICKS {
        kernel.step();
    }

    println!("policy: {:?}", kernel.policy());
    println!("finished at tick: {}", kernel.current_time());
    println!("context switches: {}", kernel.context_switches());
    println!("idle ticks: {}", kernel.idle_ticks());
    println!("trace written to: {}", trace_path.display());

    if !kernel.is_finished() {
        anyhow::bail!("scenario did not complete within {MAX_TICKS} ticks");
    }

    for pcb in kernel.processes() {
        let start = pcb.start_time.map_or("-".to_string(), |t| t.to_string());
        let finish = pcb.finish_time.map_or("-".to_string(), |t| t.to_string());
        println!("  pid {}: priority={} arrival={} start={start} finish={finish}", pcb.pid, pcb.priority, pcb.arrival_time);
    }

    Ok(())
}

fn replay(trace_path: &PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(trace_path)
        .with_context(|| format!("could not read trace file {}", trace_path.display()))?;
    let mut lines = text.lines();
    match lines.next() {
        Some(header) if header == CSV_HEADER => {}
        Some(other) => log::warn!("trace header {other:?} does not match the canonical header"),
        None => anyhow::bail!("trace file {} is empty", trace_path.display()),
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
