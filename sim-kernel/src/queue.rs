//! FIFO queues of PCB handles.
//!
//! The source threads PCBs through a shared intrusive `next` field. PCBs here
//! are owned by the kernel's process table and queues hold only `Pid`
//! handles, so "in exactly one queue" is a fact about which `VecDeque`
//! contains the handle, not about a pointer field on the PCB itself.

use std::collections::VecDeque;

use crate::pcb::{Pid, Priority};

/// A single FIFO queue of process handles.
#[derive(Debug, Default)]
pub struct PcbQueue {
    items: VecDeque<Pid>,
}

impl PcbQueue {
    pub fn new() -> Self {
        Self { items: VecDeque::new() }
    }

    pub fn push_back(&mut self, pid: Pid) {
        self.items.push_back(pid);
    }

    pub fn pop_front(&mut self) -> Option<Pid> {
        self.items.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.items.contains(&pid)
    }

    /// Linear-scan removal, matching the source's O(n) `remove`.
    pub fn remove(&mut self, pid: Pid) -> bool {
        if let Some(index) = self.items.iter().position(|&p| p == pid) {
            self.items.remove(index);
            true
        } else {
            false
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pid> {
        self.items.iter()
    }
}

/// The three priority-indexed ready queues. Under round-robin only the
/// `Medium` slot is used.
#[derive(Debug, Default)]
pub struct ReadyQueues {
    queues: [PcbQueue; 3],
}

impl ReadyQueues {
    pub fn new() -> Self {
        Self { queues: [PcbQueue::new(), PcbQueue::new(), PcbQueue::new()] }
    }

    fn index(priority: Priority) -> usize {
        priority as usize
    }

    pub fn push_back(&mut self, priority: Priority, pid: Pid) {
        self.queues[Self::index(priority)].push_back(pid);
    }

    pub fn queue(&self, priority: Priority) -> &PcbQueue {
        &self.queues[Self::index(priority)]
    }

    pub fn queue_mut(&mut self, priority: Priority) -> &mut PcbQueue {
        &mut self.queues[Self::index(priority)]
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(PcbQueue::is_empty)
    }

    pub fn len(&self) -> usize {
        self.queues.iter().map(PcbQueue::len).sum()
    }

    /// Scan `High -> Medium -> Low` and pop the first non-empty queue's head.
    pub fn pop_highest(&mut self) -> Option<Pid> {
        for priority in [Priority::High, Priority::Medium, Priority::Low] {
            if let Some(pid) = self.queue_mut(priority).pop_front() {
                return Some(pid);
            }
        }
        None
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.queues.iter().any(|q| q.contains(pid))
    }
}

pub type BlockedQueue = PcbQueue;
pub type TerminatedQueue = PcbQueue;
