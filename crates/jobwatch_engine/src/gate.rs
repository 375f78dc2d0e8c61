use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GateState {
    Idle = 0,
    Running = 1,
}

/// Single-flight guard: at most one holder of a [`RunPermit`] at a time.
/// Overlapping callers are turned away, never queued.
#[derive(Debug, Clone, Default)]
pub struct RunGate {
    state: Arc<AtomicU8>,
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        match self.state.load(Ordering::Acquire) {
            0 => GateState::Idle,
            _ => GateState::Running,
        }
    }

    /// `None` while another permit is alive.
    pub fn try_acquire(&self) -> Option<RunPermit> {
        self.state
            .compare_exchange(
                GateState::Idle as u8,
                GateState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()
            .map(|_| RunPermit {
                state: Arc::clone(&self.state),
            })
    }
}

/// Returns the gate to `Idle` when dropped, on every exit path.
#[derive(Debug)]
pub struct RunPermit {
    state: Arc<AtomicU8>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.state.store(GateState::Idle as u8, Ordering::Release);
    }
}
