//! Binary mutex with ownership and a FIFO waiter queue.
//!
//! This type only tracks lock state; it has no access to the process table
//! or the blocked queue. Blocking a waiter and waking it up again is the
//! kernel's job (see `Kernel::mutex_lock`/`Kernel::mutex_unlock`), which is
//! what lets `Mutex` be tested in isolation here.

use std::collections::VecDeque;

use crate::pcb::Pid;

#[derive(Debug, Default)]
pub struct Mutex {
    locked: bool,
    owner: Option<Pid>,
    waiters: VecDeque<Pid>,
}

/// Outcome of a non-anonymous lock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Acquired,
    /// The caller was appended to the waiter queue; the kernel must now
    /// transition it to BLOCKED.
    Blocked,
}

impl Mutex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn owner(&self) -> Option<Pid> {
        self.owner
    }

    /// Attempt to lock on behalf of `caller`. If the mutex is free, it is
    /// acquired immediately. Otherwise `caller` is appended to the waiter
    /// queue and the kernel is responsible for blocking it.
    pub fn lock(&mut self, caller: Pid) -> LockOutcome {
        if !self.locked {
            self.locked = true;
            self.owner = Some(caller);
            LockOutcome::Acquired
        } else {
            self.waiters.push_back(caller);
            LockOutcome::Blocked
        }
    }

    /// Unlock on behalf of `caller`. A non-owner unlock is a silent no-op
    /// per the invariant-violation policy. If a waiter exists, ownership
    /// transfers to it directly (the lock is never released in between)
    /// and that waiter is returned so the kernel can wake it.
    pub fn unlock(&mut self, caller: Pid) -> Option<Pid> {
        if self.owner != Some(caller) {
            return None;
        }
        if let Some(next) = self.waiters.pop_front() {
            self.owner = Some(next);
            Some(next)
        } else {
            self.locked = false;
            self.owner = None;
            None
        }
    }

    /// Anonymous reservation used by the I/O manager: marks the resource
    /// busy without ever blocking or queuing a caller. Overwrites whatever
    /// ownership state existed — anonymous use is purely an annotation for
    /// exclusive-device trace serialization, not a correctness mechanism.
    pub fn reserve_anonymous(&mut self) {
        self.locked = true;
        self.owner = None;
    }

    pub fn release_anonymous(&mut self) {
        self.locked = false;
        self.owner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u32) -> Pid {
        Pid(n)
    }

    #[test]
    fn first_locker_acquires_immediately() {
        let mut m = Mutex::new();
        assert_eq!(m.lock(pid(1)), LockOutcome::Acquired);
        assert_eq!(m.owner(), Some(pid(1)));
    }

    #[test]
    fn contended_locker_blocks() {
        let mut m = Mutex::new();
        assert_eq!(m.lock(pid(1)), LockOutcome::Acquired);
        assert_eq!(m.lock(pid(2)), LockOutcome::Blocked);
    }

    #[test]
    fn unlock_transfers_ownership_without_releasing() {
        let mut m = Mutex::new();
        m.lock(pid(1));
        m.lock(pid(2));
        let woken = m.unlock(pid(1));
        assert_eq!(woken, Some(pid(2)));
        assert_eq!(m.owner(), Some(pid(2)));
        assert!(m.is_locked());
    }

    #[test]
    fn unlock_by_non_owner_is_a_no_op() {
        let mut m = Mutex::new();
        m.lock(pid(1));
        assert_eq!(m.unlock(pid(2)), None);
        assert_eq!(m.owner(), Some(pid(1)));
    }

    #[test]
    fn unlock_with_no_waiters_frees_the_lock() {
        let mut m = Mutex::new();
        m.lock(pid(1));
        assert_eq!(m.unlock(pid(1)), None);
        assert!(!m.is_locked());
        assert_eq!(m.owner(), None);
    }
}
