// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! State shared between the control interrupt and the foreground dispatcher.
//!
//! [`Shared`] is a `static`-friendly cell around a critical-section mutex. Every access runs with
//! interrupts masked, so a multi-field read or write is never interleaved with the other context
//! and no float is observed half written.
//!
//! [`CycleGate`] drops and counts control ticks that come due while a cycle is still running.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};
use critical_section::Mutex;

/// Lazily initialized value guarded by a critical section.
pub struct Shared<T> {
    inner: Mutex<RefCell<Option<T>>>,
}

impl<T> Shared<T> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Install the value, returning any previous one.
    pub fn init(&self, value: T) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(value))
    }

    /// Take the value back out.
    pub fn take(&self) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    /// Run `f` on the value inside a critical section.
    ///
    /// Returns `None` if the value has not been installed yet.
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Overrun accounting for the control cycle.
///
/// The control timer keeps its own schedule. A tick that comes due while a cycle is still running
/// is discarded, never run late, and counted as an overrun.
pub struct CycleGate {
    overruns: AtomicU32,
}

impl CycleGate {
    pub const fn new() -> Self {
        Self {
            overruns: AtomicU32::new(0),
        }
    }

    /// Run one cycle, then ask `tick_missed` whether the next tick already fired.
    ///
    /// `tick_missed` must also discard that pending tick. A `true` counts one overrun.
    pub fn run<R>(&self, cycle: impl FnOnce() -> R, tick_missed: impl FnOnce() -> bool) -> R {
        let out = cycle();
        if tick_missed() {
            self.record_overrun();
        }
        out
    }

    /// Number of ticks dropped because a cycle was still running.
    #[inline]
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Count one dropped tick.
    pub fn record_overrun(&self) {
        let total = self.overruns.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        warn!("control cycle overrun ({} total)", total);
    }
}

impl Default for CycleGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_before_init_is_none() {
        let cell: Shared<u32> = Shared::new();
        assert!(!cell.is_initialized());
        assert_eq!(cell.lock(|v| *v), None);
    }

    #[test]
    fn lock_mutates_installed_value() {
        static CELL: Shared<[f32; 3]> = Shared::new();
        CELL.init([0.0; 3]);
        CELL.lock(|v| v[1] = 0.5);
        assert_eq!(CELL.lock(|v| *v), Some([0.0, 0.5, 0.0]));
        assert_eq!(CELL.take(), Some([0.0, 0.5, 0.0]));
        assert!(!CELL.is_initialized());
    }

    #[test]
    fn late_tick_is_counted_not_run() {
        let gate = CycleGate::new();
        let mut runs = 0;

        assert_eq!(gate.run(|| { runs += 1; 1 }, || false), 1);
        assert_eq!(gate.overruns(), 0);

        assert_eq!(gate.run(|| { runs += 1; 2 }, || true), 2);
        assert_eq!(gate.overruns(), 1);
        assert_eq!(runs, 2);

        gate.record_overrun();
        assert_eq!(gate.overruns(), 2);
    }

    #[test]
    fn missed_check_runs_after_the_cycle() {
        let gate = CycleGate::new();
        let order = RefCell::new(Vec::new());
        gate.run(
            || order.borrow_mut().push("cycle"),
            || {
                order.borrow_mut().push("check");
                false
            },
        );
        assert_eq!(order.into_inner(), ["cycle", "check"]);
    }
}
