//! Per-device I/O resources.
//!
//! I/O blocking is time-driven (wake at `blocked_until`, swept by the
//! scheduler's tick loop), never queue-driven — these primitives exist only
//! to serialize exclusive-device events and annotate shared-device
//! concurrency in the trace, using the anonymous (non-blocking) mode of
//! the mutex/semaphore primitives.

use std::collections::HashMap;

use crate::mutex::Mutex;
use crate::pcb::Device;
use crate::semaphore::Semaphore;

pub struct IoManager {
    exclusive: HashMap<Device, Mutex>,
    shared: HashMap<Device, Semaphore>,
}

impl IoManager {
    pub fn new() -> Self {
        let mut exclusive = HashMap::new();
        let mut shared = HashMap::new();
        for device in Device::ALL {
            if device.is_exclusive() {
                exclusive.insert(device, Mutex::new());
            } else {
                shared.insert(device, Semaphore::new(device.capacity()));
            }
        }
        IoManager { exclusive, shared }
    }

    /// Reserve `device` in anonymous mode. Never blocks; see module docs.
    pub fn reserve(&mut self, device: Device) {
        if device.is_exclusive() {
            if let Some(m) = self.exclusive.get_mut(&device) {
                m.reserve_anonymous();
            }
        } else if let Some(s) = self.shared.get_mut(&device) {
            s.wait_anonymous();
        }
    }

    /// Release `device`, the counterpart to `reserve`.
    pub fn release(&mut self, device: Device) {
        if device.is_exclusive() {
            if let Some(m) = self.exclusive.get_mut(&device) {
                m.release_anonymous();
            }
        } else if let Some(s) = self.shared.get_mut(&device) {
            s.signal_anonymous();
        }
    }
}

impl Default for IoManager {
    fn default() -> Self {
        Self::new()
    }
}
