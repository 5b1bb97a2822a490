//! Interactive prompting: a direct translation of the original `menu`/
//! `scenario` modules' prompts, preserving their forgiving behavior — an
//! unparsable or out-of-range answer is replaced with the documented
//! default rather than aborting the session (spec.md §7, configuration
//! errors).

use std::io::{self, Write};

use sim_kernel::config::{Policy, DEFAULT_QUANTUM, MAX_PROCESSES};
use sim_kernel::kernel::ProcessSpec;
use sim_kernel::pcb::{Device, IoPlan, Priority};

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Asks for a policy choice (1/2/3 per spec.md §6). Anything else falls
/// back to `PRIORITY`, the same default `SimConfig` uses.
pub fn ask_policy() -> io::Result<Policy> {
    println!("Select scheduling policy:");
    println!("  1) Round robin");
    println!("  2) Priority");
    println!("  3) Priority round robin");
    let answer = prompt("> ")?;
    Ok(match answer.as_str() {
        "1" => Policy::RoundRobin,
        "2" => Policy::Priority,
        "3" => Policy::PriorityRr,
        other => {
            log::warn!("unrecognized policy choice {other:?}; defaulting to PRIORITY");
            Policy::Priority
        }
    })
}

/// Asks for a quantum, only meaningful for a quantum-using policy. A
/// non-positive or unparsable answer falls back to [`DEFAULT_QUANTUM`].
pub fn ask_quantum(policy: Policy) -> io::Result<u32> {
    if !policy.uses_quantum() {
        return Ok(DEFAULT_QUANTUM);
    }
    let answer = prompt("Quantum (ticks): ")?;
    Ok(match answer.parse::<i64>() {
        Ok(n) if n > 0 => n as u32,
        _ => {
            log::warn!("unparsable or non-positive quantum {answer:?}; defaulting to {DEFAULT_QUANTUM}");
            DEFAULT_QUANTUM
        }
    })
}

/// Walks the user through describing one process at a time until they
/// answer anything but `y` to "add another?". Mirrors
/// `scenario_build_interactive`'s per-process prompt loop.
pub fn ask_processes(policy: Policy) -> io::Result<Vec<ProcessSpec>> {
    let mut specs = Vec::new();
    loop {
        println!("\n-- Process #{} --", specs.len() + 1);
        let priority = if policy == Policy::RoundRobin {
            Priority::Medium
        } else {
            ask_priority()?
        };
        let arrival = ask_u64("Arrival time: ", 0)?;
        let burst = ask_u64("Burst (CPU ticks): ", 1)?.max(1);
        let mem_size = ask_u64("Memory size (bytes): ", 4096)? as usize;
        let io_plan = ask_io_plan(arrival)?;

        specs.push(ProcessSpec { priority, arrival_time: arrival, burst, mem_size, io_plan });

        if specs.len() >= MAX_PROCESSES {
            println!("reached the maximum of {MAX_PROCESSES} processes per run; starting the simulation");
            break;
        }

        let again = prompt("Add another process? [y/N] ")?;
        if !again.eq_ignore_ascii_case("y") {
            break;
        }
    }
    Ok(specs)
}

fn ask_priority() -> io::Result<Priority> {
    let answer = prompt("Priority [low/medium/high]: ")?;
    Ok(match answer.to_lowercase().as_str() {
        "low" => Priority::Low,
        "high" => Priority::High,
        "medium" => Priority::Medium,
        other => {
            log::warn!("unrecognized priority {other:?}; defaulting to MEDIUM");
            Priority::Medium
        }
    })
}

fn ask_u64(label: &str, default: u64) -> io::Result<u64> {
    let answer = prompt(label)?;
    Ok(answer.parse::<u64>().unwrap_or_else(|_| {
        if !answer.is_empty() {
            log::warn!("unparsable value {answer:?}; defaulting to {default}");
        }
        default
    }))
}

fn ask_io_plan(arrival: u64) -> io::Result<Option<IoPlan>> {
    let answer = prompt("I/O device (blank for none) [printer/keyboard/mouse/disk/screen/network]: ")?;
    if answer.is_empty() {
        return Ok(None);
    }
    let device = match answer.to_lowercase().as_str() {
        "printer" => Device::Printer,
        "keyboard" => Device::Keyboard,
        "mouse" => Device::Mouse,
        "disk" => Device::Disk,
        "screen" => Device::Screen,
        "network" => Device::Network,
        other => {
            log::warn!("unrecognized device {other:?}; skipping I/O plan for this process");
            return Ok(None);
        }
    };
    let duration = ask_u64("I/O duration (ticks): ", 1)?;
    let start_time = ask_u64("I/O start tick: ", arrival)?.max(arrival);
    Ok(Some(IoPlan { device, duration, start_time }))
}
