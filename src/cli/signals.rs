//! SIGTERM/SIGINT shutdown flag for the watch loop.
//!
//! Uses `signal-hook` for safe registration. The loop polls the flag each
//! iteration rather than blocking on signals.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create a flag and register it for SIGTERM and SIGINT.
    ///
    /// Registration is best-effort; failures are logged to stderr but not fatal.
    #[must_use]
    pub fn register() -> Self {
        let signal = Self::default();
        for (name, sig) in [("SIGTERM", SIGTERM), ("SIGINT", SIGINT)] {
            if let Err(e) = signal_hook::flag::register(sig, Arc::clone(&signal.flag)) {
                eprintln!("[VDASH-SIGNAL] failed to register {name} handler: {e}");
            }
        }
        signal
    }

    #[must_use]
    pub fn should_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_visible_to_clones() {
        let signal = ShutdownSignal::default();
        let observer = signal.clone();
        assert!(!observer.should_shutdown());
        signal.request_shutdown();
        assert!(observer.should_shutdown());
    }
}
