use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct GuardState {
    running: bool,
    rerun: bool,
}

/// Single-flight gate for reconcile/render cycles.
///
/// At most one cycle runs at a time. Triggers that arrive while one is
/// running are folded into a single follow-up run: the first marks it,
/// later ones find it already marked and are dropped.
#[derive(Debug, Default)]
pub struct CycleGuard {
    state: Mutex<GuardState>,
}

/// Proof that the holder owns the running cycle. Dropping it (including on
/// cancellation) frees the gate and discards any pending follow-up.
#[derive(Debug)]
pub struct CyclePermit<'a> {
    guard: &'a CycleGuard,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a cycle, or record a follow-up if one is already running.
    pub fn try_begin(&self) -> Option<CyclePermit<'_>> {
        let mut state = self.lock();
        if state.running {
            state.rerun = true;
            None
        } else {
            state.running = true;
            Some(CyclePermit { guard: self })
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn rerun_pending(&self) -> bool {
        self.lock().rerun
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CyclePermit<'_> {
    /// Consume a pending follow-up request. The permit stays held either way.
    pub fn take_rerun(&self) -> bool {
        std::mem::take(&mut self.guard.lock().rerun)
    }
}

impl Drop for CyclePermit<'_> {
    fn drop(&mut self) {
        let mut state = self.guard.lock();
        state.running = false;
        state.rerun = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_trigger_is_queued_once() {
        let guard = CycleGuard::new();
        let permit = guard.try_begin().expect("first trigger runs");
        assert!(guard.try_begin().is_none());
        assert!(guard.try_begin().is_none());
        assert!(guard.rerun_pending());

        assert!(permit.take_rerun());
        assert!(!permit.take_rerun());
        assert!(guard.is_running());
        drop(permit);
        assert!(!guard.is_running());
    }

    #[test]
    fn dropping_permit_frees_the_gate() {
        let guard = CycleGuard::new();
        {
            let _permit = guard.try_begin().unwrap();
            assert!(guard.try_begin().is_none());
        }
        assert!(!guard.rerun_pending());
        assert!(guard.try_begin().is_some());
    }
}
