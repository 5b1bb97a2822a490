//! Scenario loading: the non-interactive, scriptable stand-in for the
//! external scenario builder (spec §6 "Scenario builder → scheduler").
//!
//! A scenario is a JSON array of process descriptions. This module turns
//! that into the `Vec<ProcessSpec>` the kernel's `create_process` expects,
//! applying the two coercion rules the spec assigns to the builder rather
//! than the kernel: round-robin forces every priority to MEDIUM, and an
//! I/O start tick is clamped up to the process's arrival time.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use sim_kernel::config::{Policy, MAX_PROCESSES};
use sim_kernel::error::ConfigError;
use sim_kernel::kernel::ProcessSpec;
use sim_kernel::pcb::{Device, IoPlan, Priority};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScenarioProcess {
    pub priority: ScenarioPriority,
    pub arrival: u64,
    pub burst: u64,
    #[serde(default)]
    pub mem_size: usize,
    #[serde(default)]
    pub io_device: Option<ScenarioDevice>,
    #[serde(default)]
    pub io_duration: u64,
    #[serde(default)]
    pub io_start_time: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioPriority {
    Low,
    Medium,
    High,
}

impl From<ScenarioPriority> for Priority {
    fn from(value: ScenarioPriority) -> Self {
        match value {
            ScenarioPriority::Low => Priority::Low,
            ScenarioPriority::Medium => Priority::Medium,
            ScenarioPriority::High => Priority::High,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioDevice {
    Printer,
    Keyboard,
    Mouse,
    Disk,
    Screen,
    Network,
}

impl From<ScenarioDevice> for Device {
    fn from(value: ScenarioDevice) -> Self {
        match value {
            ScenarioDevice::Printer => Device::Printer,
            ScenarioDevice::Keyboard => Device::Keyboard,
            ScenarioDevice::Mouse => Device::Mouse,
            ScenarioDevice::Disk => Device::Disk,
            ScenarioDevice::Screen => Device::Screen,
            ScenarioDevice::Network => Device::Network,
        }
    }
}

/// Default memory reservation for a scenario process that doesn't specify
/// one, chosen so a full 32-process run comfortably fits the 64 MiB arena.
const DEFAULT_MEM_SIZE: usize = 4096;

/// Reads a scenario file and turns it into kernel-ready process specs,
/// applying the round-robin priority coercion and the I/O start-tick clamp
/// spec.md §6 assigns to the builder.
pub fn load_file(path: impl AsRef<Path>, policy: Policy) -> Result<Vec<ProcessSpec>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading scenario file {}", path.display()))?;
    let raw: Vec<ScenarioProcess> =
        serde_json::from_str(&text).with_context(|| format!("parsing scenario file {}", path.display()))?;
    if raw.is_empty() {
        return Err(anyhow!("scenario file {} describes zero processes", path.display()));
    }
    if raw.len() > MAX_PROCESSES {
        return Err(ConfigError::TooManyProcesses(raw.len(), MAX_PROCESSES).into());
    }
    Ok(raw.into_iter().map(|p| resolve(p, policy)).collect())
}

fn resolve(raw: ScenarioProcess, policy: Policy) -> ProcessSpec {
    let priority = if policy == Policy::RoundRobin { Priority::Medium } else { raw.priority.into() };

    let mem_size = if raw.mem_size == 0 { DEFAULT_MEM_SIZE } else { raw.mem_size };

    let io_plan = raw.io_device.map(|device| {
        let start_time = raw.io_start_time.unwrap_or(raw.arrival).max(raw.arrival);
        IoPlan { device: device.into(), duration: raw.io_duration, start_time }
    });

    ProcessSpec { priority, arrival_time: raw.arrival, burst: raw.burst.max(1), mem_size, io_plan }
}

/// Scenario A from spec.md §8: three CPU-bound processes under round-robin,
/// used as the built-in demo when no `--scenario` file is given.
pub fn demo_scenario() -> Vec<ProcessSpec> {
    vec![
        ProcessSpec { priority: Priority::Medium, arrival_time: 0, burst: 5, mem_size: DEFAULT_MEM_SIZE, io_plan: None },
        ProcessSpec { priority: Priority::Medium, arrival_time: 2, burst: 3, mem_size: DEFAULT_MEM_SIZE, io_plan: None },
        ProcessSpec { priority: Priority::Medium, arrival_time: 4, burst: 4, mem_size: DEFAULT_MEM_SIZE, io_plan: None },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_coerces_priority_to_medium() {
        let raw = ScenarioProcess {
            priority: ScenarioPriority::High,
            arrival: 0,
            burst: 3,
            mem_size: 0,
            io_device: None,
            io_duration: 0,
            io_start_time: None,
        };
        let spec = resolve(raw, Policy::RoundRobin);
        assert_eq!(spec.priority, Priority::Medium);
    }

    #[test]
    fn io_start_time_is_clamped_up_to_arrival() {
        let raw = ScenarioProcess {
            priority: ScenarioPriority::Medium,
            arrival: 10,
            burst: 3,
            mem_size: 0,
            io_device: Some(ScenarioDevice::Disk),
            io_duration: 2,
            io_start_time: Some(3),
        };
        let spec = resolve(raw, Policy::Priority);
        assert_eq!(spec.io_plan.unwrap().start_time, 10);
    }

    #[test]
    fn missing_mem_size_falls_back_to_default() {
        let raw = ScenarioProcess {
            priority: ScenarioPriority::Low,
            arrival: 0,
            burst: 1,
            mem_size: 0,
            io_device: None,
            io_duration: 0,
            io_start_time: None,
        };
        let spec = resolve(raw, Policy::Priority);
        assert_eq!(spec.mem_size, DEFAULT_MEM_SIZE);
    }

    #[test]
    fn scenario_exceeding_max_processes_is_rejected() {
        let one = r#"{"priority":"medium","arrival":0,"burst":1}"#;
        let body = format!("[{}]", vec![one; MAX_PROCESSES + 1].join(","));
        let dir = std::env::temp_dir();
        let path = dir.join(format!("sim-cli-test-scenario-{}.json", std::process::id()));
        fs::write(&path, body).unwrap();

        let result = load_file(&path, Policy::Priority);
        let _ = fs::remove_file(&path);

        let err = result.unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some(), "expected a ConfigError, got {err:?}");
    }
}
