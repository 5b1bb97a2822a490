//! Process control block and the small value types that describe it.

use std::fmt;

/// Process identifier, monotonically assigned starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduling priority. Ordered `Low < Medium < High` so `pcb.priority >
/// current.priority` (the preemption test in the scheduler) reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Priority {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Blocked,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Blocked => "BLOCKED",
            ProcessState::Terminated => "TERMINATED",
        };
        write!(f, "{s}")
    }
}

/// I/O-capable devices. Printer and Screen are exclusive; the rest share
/// capacity among several simultaneous requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Printer,
    Keyboard,
    Mouse,
    Disk,
    Screen,
    Network,
}

impl Device {
    pub const ALL: [Device; 6] = [
        Device::Printer,
        Device::Keyboard,
        Device::Mouse,
        Device::Disk,
        Device::Screen,
        Device::Network,
    ];

    /// `true` for devices backed by a mutex (capacity 1, single owner at a
    /// time); `false` for devices backed by a counting semaphore.
    pub fn is_exclusive(self) -> bool {
        matches!(self, Device::Printer | Device::Screen)
    }

    /// Shared-device capacity. Meaningless for exclusive devices (they use a
    /// mutex, not a counter).
    pub fn capacity(self) -> u32 {
        match self {
            Device::Printer | Device::Screen => 1,
            Device::Keyboard => 1,
            Device::Mouse | Device::Disk => 2,
            Device::Network => 3,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Device::Printer => "PRINTER",
            Device::Keyboard => "KEYBOARD",
            Device::Mouse => "MOUSE",
            Device::Disk => "DISK",
            Device::Screen => "SCREEN",
            Device::Network => "NETWORK",
        };
        write!(f, "{s}")
    }
}

/// Opaque handle to a user-level mutex created via `Kernel::create_mutex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutexId(pub usize);

/// Opaque handle to a user-level semaphore created via `Kernel::create_semaphore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SemaphoreId(pub usize);

/// The single cause a BLOCKED process is waiting on. Replaces the source's
/// three disjoint `waiting_on_*` fields with a tagged sum: a PCB can hold at
/// most one of these by construction, not by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Mutex(MutexId),
    Semaphore(SemaphoreId),
    Io { device: Device, wake_tick: u64 },
}

impl BlockReason {
    /// The trace `reason` field for this cause.
    pub fn trace_reason(self) -> &'static str {
        match self {
            BlockReason::Mutex(_) => "mutex",
            BlockReason::Semaphore(_) => "semaphore",
            BlockReason::Io { .. } => "io",
        }
    }

    /// The trace `queue` label used while this PCB sits in the blocked queue.
    pub fn queue_label(self) -> &'static str {
        match self {
            BlockReason::Mutex(_) => "BLOCKED_MUTEX",
            BlockReason::Semaphore(_) => "BLOCKED_SEM",
            BlockReason::Io { .. } => "IO",
        }
    }
}

/// Tick at which an I/O-blocked process wakes on its own; synchronization
/// blocks never expire on a timer, so they use this sentinel.
pub const BLOCKED_FOREVER: u64 = u64::MAX;

/// A planned I/O request, attached to a process at creation time.
#[derive(Debug, Clone, Copy)]
pub struct IoPlan {
    pub device: Device,
    pub duration: u64,
    pub start_time: u64,
}

/// Process control block.
#[derive(Debug, Clone)]
pub struct Pcb {
    pub pid: Pid,
    pub priority: Priority,
    pub state: ProcessState,

    pub arrival_time: u64,
    pub start_time: Option<u64>,
    pub finish_time: Option<u64>,
    pub remaining_time: u64,
    pub quantum_remaining: u64,
    pub last_run_time: Option<u64>,

    pub io_plan: Option<IoPlan>,
    pub waiting_for_io: bool,
    pub blocked_until: u64,

    pub block_reason: Option<BlockReason>,

    pub mem_base: Option<usize>,
    pub mem_size: usize,
}

impl Pcb {
    pub fn new(pid: Pid, priority: Priority, arrival_time: u64, burst: u64, mem_size: usize, io_plan: Option<IoPlan>) -> Self {
        Pcb {
            pid,
            priority,
            state: ProcessState::New,
            arrival_time,
            start_time: None,
            finish_time: None,
            remaining_time: burst,
            quantum_remaining: 0,
            last_run_time: None,
            io_plan,
            waiting_for_io: false,
            blocked_until: BLOCKED_FOREVER,
            block_reason: None,
            mem_base: None,
            mem_size,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.state == ProcessState::Blocked
    }
}
