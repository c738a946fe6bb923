//! Decode thread lifecycle, shared between the thread and its owner.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Where the decode thread is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkerState {
    /// Receiving and publishing.
    Running = 0,
    /// Asked to stop or hit a fatal error; exits after the current iteration.
    Stopping = 1,
    /// Thread has exited.
    Stopped = 2,
}

impl WorkerState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

/// Atomic state plus a sticky failure flag.
#[derive(Debug)]
pub(crate) struct WorkerStatus {
    state: AtomicU8,
    failed: AtomicBool,
}

impl WorkerStatus {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(WorkerState::Running as u8),
            failed: AtomicBool::new(false),
        }
    }

    pub(crate) fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state() == WorkerState::Running
    }

    pub(crate) fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Running -> Stopping. No effect once stopping or stopped.
    pub(crate) fn request_stop(&self) {
        let _ = self.state.compare_exchange(
            WorkerState::Running as u8,
            WorkerState::Stopping as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub(crate) fn fail(&self) {
        self.failed.store(true, Ordering::Release);
        self.request_stop();
    }

    pub(crate) fn finish(&self) {
        self.state.store(WorkerState::Stopped as u8, Ordering::Release);
    }
}
