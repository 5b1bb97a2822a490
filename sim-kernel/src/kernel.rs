//! The scheduling kernel: the single authoritative owner of every piece of
//! simulated state. There is no global instance (see the design notes on
//! the source's `global_scheduler`) — a `Kernel` is constructed once by the
//! driver and threaded through explicitly.

use crate::config::{Policy, SimConfig};
use crate::heap::SimHeap;
use crate::io::IoManager;
use crate::mutex::{LockOutcome, Mutex};
use crate::pcb::{BlockReason, Device, IoPlan, MutexId, Pcb, Pid, Priority, ProcessState, SemaphoreId, BLOCKED_FOREVER};
use crate::queue::{BlockedQueue, ReadyQueues, TerminatedQueue};
use crate::semaphore::{Semaphore, WaitOutcome};
use crate::trace::{TraceEvent, TraceSink};

/// A process description handed to [`Kernel::create_process`], the in-memory
/// analogue of what an external scenario builder produces.
#[derive(Debug, Clone, Copy)]
pub struct ProcessSpec {
    pub priority: Priority,
    pub arrival_time: u64,
    pub burst: u64,
    pub mem_size: usize,
    pub io_plan: Option<IoPlan>,
}

pub struct Kernel<S: TraceSink> {
    config: SimConfig,
    current_time: u64,
    current: Option<Pid>,
    processes: Vec<Pcb>,

    ready: ReadyQueues,
    blocked: BlockedQueue,
    terminated: TerminatedQueue,

    heap: SimHeap,
    io: IoManager,
    user_mutexes: Vec<Mutex>,
    user_semaphores: Vec<Semaphore>,

    context_switches: u64,
    idle_ticks: u64,

    sink: S,
}

fn index_of(pid: Pid) -> usize {
    (pid.0 - 1) as usize
}

impl<S: TraceSink> Kernel<S> {
    pub fn new(config: SimConfig, sink: S) -> Self {
        log::debug!("kernel init: policy={:?} quantum={}", config.policy, config.quantum);
        Kernel {
            heap: SimHeap::new(config.heap_size),
            config,
            current_time: 0,
            current: None,
            processes: Vec::new(),
            ready: ReadyQueues::new(),
            blocked: BlockedQueue::new(),
            terminated: TerminatedQueue::new(),
            io: IoManager::new(),
            user_mutexes: Vec::new(),
            user_semaphores: Vec::new(),
            context_switches: 0,
            idle_ticks: 0,
            sink,
        }
    }

    pub fn policy(&self) -> Policy {
        self.config.policy
    }

    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    pub fn current(&self) -> Option<Pid> {
        self.current
    }

    pub fn context_switches(&self) -> u64 {
        self.context_switches
    }

    pub fn idle_ticks(&self) -> u64 {
        self.idle_ticks
    }

    pub fn process(&self, pid: Pid) -> &Pcb {
        &self.processes[index_of(pid)]
    }

    pub fn processes(&self) -> &[Pcb] {
        &self.processes
    }

    pub fn heap(&self) -> &SimHeap {
        &self.heap
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn process_mut(&mut self, pid: Pid) -> &mut Pcb {
        &mut self.processes[index_of(pid)]
    }

    fn emit(&mut self, pid: Option<Pid>, event: &'static str, state: &'static str, reason: impl Into<String>, cpu: i32, queue: &'static str) {
        self.sink.record(TraceEvent { time: self.current_time, pid, event, state, reason: reason.into(), cpu, queue });
    }

    // ---- process creation -------------------------------------------------

    /// Creates a process in the NEW state, reserving its backing memory on
    /// the simulated heap. If the heap is exhausted the PCB is created but
    /// immediately marked TERMINATED, per the resource-exhaustion policy —
    /// it never enters scheduling.
    pub fn create_process(&mut self, spec: ProcessSpec) -> Pid {
        let pid = Pid(self.processes.len() as u32 + 1);
        let mut pcb = Pcb::new(pid, spec.priority, spec.arrival_time, spec.burst.max(1), spec.mem_size, spec.io_plan);

        match self.heap.alloc(spec.mem_size, Some(pid)) {
            Some(alloc) => {
                pcb.mem_base = Some(alloc.address);
                self.processes.push(pcb);
                self.emit(Some(pid), "CREATE", "NEW", "", -1, "NEW");
                self.emit(Some(pid), "MEMORY", "NEW", alloc.size.to_string(), -1, "MEM");
            }
            None => {
                pcb.state = ProcessState::Terminated;
                pcb.finish_time = Some(self.current_time);
                self.processes.push(pcb);
                self.terminated.push_back(pid);
                self.emit(Some(pid), "CREATE_FAIL_OOM", "TERMINATED", "", -1, "TERM");
            }
        }
        pid
    }

    // ---- scheduler kernel contract (spec 4.6) ------------------------------

    pub fn add_ready(&mut self, pid: Pid) {
        let priority = self.ready_priority_for(pid);
        self.process_mut(pid).state = ProcessState::Ready;
        self.ready.push_back(priority, pid);
        self.emit(Some(pid), "STATE_CHANGE", "READY", "", -1, "READY");

        if self.config.policy.preempts_on_priority() {
            if let Some(current) = self.current {
                if current != pid && priority > self.process(current).priority {
                    self.preempt(current);
                }
            }
        }
    }

    fn preempt(&mut self, pid: Pid) {
        let priority = self.process(pid).priority;
        self.process_mut(pid).state = ProcessState::Ready;
        self.ready.push_back(priority, pid);
        self.current = None;
        self.emit(Some(pid), "PREEMPTED", "READY", "higher_priority_arrived", -1, "READY");
    }

    pub fn block(&mut self, pid: Pid, reason: BlockReason) {
        let pcb = self.process_mut(pid);
        pcb.state = ProcessState::Blocked;
        pcb.block_reason = Some(reason);
        self.blocked.push_back(pid);
        self.emit(Some(pid), "STATE_CHANGE", "BLOCKED", reason.trace_reason(), -1, reason.queue_label());
        if self.current == Some(pid) {
            self.current = None;
        }
    }

    pub fn terminate(&mut self, pid: Pid) {
        if let Some(base) = self.process(pid).mem_base {
            if let Some(freed_size) = self.heap.free(base) {
                self.emit(Some(pid), "MEMORY", "TERMINATED", freed_size.to_string(), -1, "MEM");
            }
            self.process_mut(pid).mem_base = None;
        }
        let pcb = self.process_mut(pid);
        pcb.state = ProcessState::Terminated;
        pcb.finish_time = Some(self.current_time);
        self.terminated.push_back(pid);
        self.emit(Some(pid), "TERMINATED", "TERMINATED", "", -1, "TERM");
        if self.current == Some(pid) {
            self.current = None;
        }
    }

    pub fn pick_next(&mut self) {
        let next = match self.config.policy {
            Policy::RoundRobin => self.ready.queue_mut(Priority::Medium).pop_front(),
            Policy::Priority | Policy::PriorityRr => self.ready.pop_highest(),
        };

        let Some(pid) = next else {
            self.current = None;
            return;
        };

        let pcb = self.process_mut(pid);
        pcb.state = ProcessState::Running;
        if pcb.start_time.is_none() {
            pcb.start_time = Some(self.current_time);
        }
        if self.config.policy.uses_quantum() && pcb.quantum_remaining == 0 {
            pcb.quantum_remaining = u64::from(self.config.quantum);
        }
        self.current = Some(pid);
        self.context_switches += 1;
        self.emit(Some(pid), "STATE_CHANGE", "RUNNING", "", 0, "CPU");
    }

    pub fn is_finished(&self) -> bool {
        self.terminated.len() == self.processes.len()
    }

    /// The discrete-time heart: advance the clock, charge the running
    /// process, sweep the blocked queue, then pick a new process if the CPU
    /// is idle. Exactly the four steps and order from the scheduler
    /// contract.
    pub fn tick(&mut self) {
        self.current_time += 1;

        if let Some(pid) = self.current {
            let uses_quantum = self.config.policy.uses_quantum();
            let pcb = self.process_mut(pid);
            pcb.remaining_time = pcb.remaining_time.saturating_sub(1);
            if uses_quantum {
                pcb.quantum_remaining = pcb.quantum_remaining.saturating_sub(1);
            }
            pcb.last_run_time = Some(self.current_time);

            if pcb.remaining_time == 0 {
                self.terminate(pid);
            } else if uses_quantum && self.process(pid).quantum_remaining == 0 {
                let priority = self.ready_priority_for(pid);
                self.process_mut(pid).state = ProcessState::Ready;
                self.ready.push_back(priority, pid);
                self.current = None;
                self.emit(Some(pid), "TIME_SLICE_EXPIRED", "READY", "", -1, "READY");
            }
        }

        self.sweep_blocked();

        if self.current.is_none() {
            self.idle_ticks += 1;
            self.pick_next();
        }
    }

    fn sweep_blocked(&mut self) {
        let snapshot = self.blocked.len();
        for _ in 0..snapshot {
            let Some(pid) = self.blocked.pop_front() else { break };
            let pcb = self.process(pid);
            if pcb.blocked_until <= self.current_time {
                if let Some(BlockReason::Io { device, .. }) = pcb.block_reason {
                    self.io.release(device);
                }
                let pcb = self.process_mut(pid);
                pcb.block_reason = None;
                pcb.waiting_for_io = false;
                pcb.blocked_until = BLOCKED_FOREVER;
                pcb.io_plan = None;
                self.emit(Some(pid), "UNBLOCKED", "READY", "io", -1, "READY");
                self.add_ready(pid);
            } else {
                self.blocked.push_back(pid);
            }
        }
    }

    fn ready_priority_for(&self, pid: Pid) -> Priority {
        match self.config.policy {
            Policy::RoundRobin => Priority::Medium,
            Policy::Priority | Policy::PriorityRr => self.process(pid).priority,
        }
    }

    // ---- driver-loop helpers (admission + I/O issuance; spec: performed by
    // the external driver loop, not by tick itself) --------------------------

    pub fn admit_arrived(&mut self) {
        let arrived: Vec<Pid> = self
            .processes
            .iter()
            .filter(|p| p.state == ProcessState::New && p.arrival_time <= self.current_time)
            .map(|p| p.pid)
            .collect();
        for pid in arrived {
            self.add_ready(pid);
        }
    }

    pub fn maybe_issue_io(&mut self) {
        let Some(pid) = self.current else { return };
        let pcb = self.process(pid);
        if pcb.waiting_for_io {
            return;
        }
        let Some(plan) = pcb.io_plan else { return };
        if plan.duration == 0 || self.current_time < plan.start_time {
            return;
        }
        self.io_request(pid, plan.device, plan.duration, self.current_time);
    }

    pub fn io_request(&mut self, pid: Pid, device: Device, duration: u64, now: u64) {
        self.io.reserve(device);
        let pcb = self.process_mut(pid);
        pcb.waiting_for_io = true;
        pcb.blocked_until = now + duration;
        self.block(pid, BlockReason::Io { device, wake_tick: now + duration });
    }

    /// Admit, issue I/O, and tick — the full per-iteration driver contract
    /// in one call.
    pub fn step(&mut self) {
        self.admit_arrived();
        self.maybe_issue_io();
        self.tick();
    }

    // ---- synchronization primitives ---------------------------------------

    pub fn create_mutex(&mut self) -> MutexId {
        self.user_mutexes.push(Mutex::new());
        MutexId(self.user_mutexes.len() - 1)
    }

    pub fn create_semaphore(&mut self, initial: u32) -> SemaphoreId {
        self.user_semaphores.push(Semaphore::new(initial));
        SemaphoreId(self.user_semaphores.len() - 1)
    }

    pub fn mutex_lock(&mut self, pid: Pid, id: MutexId) {
        match self.user_mutexes[id.0].lock(pid) {
            LockOutcome::Acquired => {}
            LockOutcome::Blocked => self.block(pid, BlockReason::Mutex(id)),
        }
    }

    pub fn mutex_unlock(&mut self, pid: Pid, id: MutexId) {
        if let Some(woken) = self.user_mutexes[id.0].unlock(pid) {
            self.wake_blocked(woken, "mutex");
        }
    }

    pub fn semaphore_wait(&mut self, pid: Pid, id: SemaphoreId) {
        match self.user_semaphores[id.0].wait(pid) {
            WaitOutcome::Acquired => {}
            WaitOutcome::Blocked => self.block(pid, BlockReason::Semaphore(id)),
        }
    }

    pub fn semaphore_signal(&mut self, id: SemaphoreId) {
        if let Some(woken) = self.user_semaphores[id.0].signal() {
            self.wake_blocked(woken, "semaphore");
        }
    }

    fn wake_blocked(&mut self, pid: Pid, reason: &'static str) {
        self.blocked.remove(pid);
        let pcb = self.process_mut(pid);
        pcb.block_reason = None;
        pcb.blocked_until = BLOCKED_FOREVER;
        self.emit(Some(pid), "UNBLOCKED", "READY", reason, -1, "READY");
        self.add_ready(pid);
    }

    // ---- invariant checking (spec 8), used by tests ------------------------

    #[cfg(debug_assertions)]
    pub fn assert_invariants(&self) {
        let running_count = self.processes.iter().filter(|p| p.state == ProcessState::Running).count();
        assert!(running_count <= 1, "more than one RUNNING process");
        if let Some(current) = self.current {
            assert_eq!(self.process(current).state, ProcessState::Running, "current must be RUNNING");
        }

        for pcb in &self.processes {
            if pcb.state == ProcessState::New {
                continue;
            }
            let in_ready = self.ready.contains(pcb.pid);
            let in_blocked = self.blocked.contains(pcb.pid);
            let in_terminated = self.terminated.contains(pcb.pid);
            let is_current = self.current == Some(pcb.pid);
            let count = [in_ready, in_blocked, in_terminated, is_current].iter().filter(|b| **b).count();
            assert_eq!(count, 1, "pid {:?} must be in exactly one location, found in {count}", pcb.pid);
        }

        assert_eq!(self.heap.total_coverage(), self.heap.capacity(), "heap coverage must equal arena size");

        for pid in self.terminated.iter() {
            assert!(self.process(*pid).mem_base.is_none(), "terminated process must have freed its memory");
        }
    }
}

