//! Process-wide AI mode flag.
//!
//! Starts off on every boot and is never persisted.

use std::sync::atomic::{AtomicBool, Ordering};

/// Toggleable AI-assist flag shared by all operators.
#[derive(Debug, Default)]
pub struct AiMode(AtomicBool);

impl AiMode {
    /// A new flag, off.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Current value.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Flip the flag and return the new value.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_starts_off_and_toggles() {
        let mode = AiMode::new();
        assert!(!mode.is_enabled());
        assert!(mode.toggle());
        assert!(mode.is_enabled());
        assert!(!mode.toggle());
        assert!(!mode.is_enabled());
    }

    #[test]
    fn test_concurrent_toggles_do_not_lose_updates() {
        let mode = Arc::new(AiMode::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mode = Arc::clone(&mode);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        mode.toggle();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().ok();
        }
        // An even number of flips lands back where it started.
        assert!(!mode.is_enabled());
    }
}
