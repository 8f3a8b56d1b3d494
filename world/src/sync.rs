//! Lock helpers that survive a panicking actor.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, MutexGuard,
};

use tracing::warn;

static LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_lock_poison_once(operation: &'static str) {
    if LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "world lock poisoned; recovered inner value");
    }
}

/// Locks `mutex`, recovering the guarded value if another actor panicked
/// while holding it.
pub(crate) fn lock<'a, T>(mutex: &'a Mutex<T>, operation: &'static str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn_lock_poison_once(operation);
            poisoned.into_inner()
        }
    }
}
