use std::hint;
use std::sync::atomic::{AtomicU32, Ordering};

use atomic_wait::{wait, wake_one};

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;
// Locked, and a waiter may be parked on the futex.
const CONTENDED: u32 = 2;

// Number of spin iterations before parking.
const SPIN_LIMIT: u32 = 100;

/// A binary lock guarding a single slot.
///
/// Slot critical sections are a handful of instructions, so the lock spins
/// first and parks on the futex only under persistent contention. There is
/// no reentrancy and no timeout: a holder that never releases stalls every
/// probe that reaches its slot.
pub struct SlotLock {
    state: AtomicU32,
}

impl SlotLock {
    #[inline]
    pub const fn new() -> SlotLock {
        SlotLock {
            state: AtomicU32::new(UNLOCKED),
        }
    }

    /// Acquires the lock, blocking until it is available.
    #[inline]
    pub fn lock(&self) {
        if self
            .state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            self.lock_slow();
        }
    }

    #[cold]
    fn lock_slow(&self) {
        // Spin while the lock is held but uncontended, in the hope that
        // the holder finishes its single-slot critical section quickly.
        let mut spun = 0;
        while self.state.load(Ordering::Relaxed) == LOCKED && spun < SPIN_LIMIT {
            hint::spin_loop();
            spun += 1;
        }

        if self
            .state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            return;
        }

        // Mark the lock contended and park until it is released. The swap
        // can briefly report CONTENDED for a lock with no parked waiters;
        // that only costs the next unlock a spurious wake.
        while self.state.swap(CONTENDED, Ordering::Acquire) != UNLOCKED {
            wait(&self.state, CONTENDED);
        }
    }

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// The lock must be held by the current thread.
    #[inline]
    pub unsafe fn unlock(&self) {
        if self.state.swap(UNLOCKED, Ordering::Release) == CONTENDED {
            self.unlock_slow();
        }
    }

    #[cold]
    fn unlock_slow(&self) {
        wake_one(&self.state);
    }
}

#[test]
fn lock_roundtrip() {
    let lock = SlotLock::new();
    lock.lock();
    unsafe { lock.unlock() };
    lock.lock();
    unsafe { lock.unlock() };
}

#[test]
fn mutual_exclusion() {
    use std::cell::UnsafeCell;
    use std::thread;

    struct Shared {
        lock: SlotLock,
        value: UnsafeCell<usize>,
    }

    // Safety: `value` is only accessed with the lock held.
    unsafe impl Sync for Shared {}

    const THREADS: usize = 4;
    const PER_THREAD: usize = if cfg!(miri) { 100 } else { 100_000 };

    let shared = Shared {
        lock: SlotLock::new(),
        value: UnsafeCell::new(0),
    };

    thread::scope(|s| {
        // Borrow the struct whole: capturing the fields one by one would
        // sidestep the `Sync` impl.
        let shared = &shared;

        for _ in 0..THREADS {
            s.spawn(move || {
                for _ in 0..PER_THREAD {
                    shared.lock.lock();
                    unsafe { *shared.value.get() += 1 };
                    unsafe { shared.lock.unlock() };
                }
            });
        }
    });

    assert_eq!(unsafe { *shared.value.get() }, THREADS * PER_THREAD);
}
