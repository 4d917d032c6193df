//! Security boundaries shared by the parser and rule engine: a recursion
//! depth budget and a wall-clock deadline, both pollable without locking.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use derive_builder::Builder;

/// Immutable, thread-shareable limits handed to every pipeline stage.
#[derive(Builder, Clone, Copy, Debug)]
#[builder(setter(into))]
pub struct SecurityConfig {
    #[builder(default = "512")]
    pub max_depth: u32,

    #[builder(default = "64 * 1024 * 1024")]
    pub max_output_bytes: usize,

    #[builder(default = "Duration::from_secs(30)")]
    pub wall_clock_budget: Duration,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_depth: 512,
            max_output_bytes: 64 * 1024 * 1024,
            wall_clock_budget: Duration::from_secs(30),
        }
    }
}

/// A monotonic instant, stored as nanoseconds since an arbitrary epoch, by
/// which a per-file task must complete. Readable/writable without a lock so
/// hot loops (parser depth-enter, rule analyze loops) can poll it cheaply.
pub struct Deadline {
    started_at: Instant,
    budget: Duration,
    expired: AtomicU64,
}

impl Deadline {
    pub fn starting_now(budget: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            budget,
            expired: AtomicU64::new(0),
        }
    }

    /// Returns `true` the first time (and every time after) the budget has
    /// been exceeded. Never panics; safe to call from any thread holding only
    /// a shared reference.
    pub fn has_expired(&self) -> bool {
        if self.expired.load(Ordering::Relaxed) != 0 {
            return true;
        }
        if self.started_at.elapsed() >= self.budget {
            self.expired.store(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Forces the deadline into the expired state, used to propagate an
    /// external cancellation signal into a running task.
    pub fn force_expire(&self) {
        self.expired.store(1, Ordering::Relaxed);
    }
}

/// A depth counter with RAII-style enter/exit, used to bound parser
/// recursion. `enter()` returns `Err` once `max_depth` is exceeded; the
/// caller must treat that as an unrecoverable `SecurityError`.
pub struct DepthGuard<'a> {
    current: &'a mut u32,
}

impl<'a> DepthGuard<'a> {
    pub fn enter(current: &'a mut u32, max_depth: u32) -> Result<Self, DepthExceeded> {
        *current += 1;
        if *current > max_depth {
            *current -= 1;
            return Err(DepthExceeded { max_depth });
        }
        Ok(Self { current })
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        *self.current -= 1;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DepthExceeded {
    pub max_depth: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_expires_after_budget() {
        let deadline = Deadline::starting_now(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(deadline.has_expired());
    }

    #[test]
    fn deadline_not_expired_within_budget() {
        let deadline = Deadline::starting_now(Duration::from_secs(60));
        assert!(!deadline.has_expired());
    }

    #[test]
    fn depth_guard_releases_on_drop() {
        let mut depth = 0u32;
        {
            let _g = DepthGuard::enter(&mut depth, 10).unwrap();
            assert_eq!(depth, 1);
        }
        assert_eq!(depth, 0);
    }

    #[test]
    fn depth_guard_rejects_beyond_max() {
        let mut depth = 2u32;
        assert!(DepthGuard::enter(&mut depth, 2).is_err());
    }
}
