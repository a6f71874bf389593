//! # Watchdog
//!
//! Bounds the blocking loops of the drive train. A [`Watchdog`] is started when the loop begins and
//! checked once per iteration, it expires when its timeout elapses or its [`CancelFlag`] is raised
//! from elsewhere. A watchdog with neither never expires.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A shared flag used to cancel a blocking loop from another thread or a signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

#[derive(Debug, Clone)]
pub struct Watchdog {
    start: Instant,
    timeout: Option<Duration>,
    cancel: Option<CancelFlag>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum WatchdogError {
    #[error("Timed out after {0:.3} s")]
    TimedOut(f64),

    #[error("Cancelled")]
    Cancelled,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Watchdog {
    /// Start a new watchdog now.
    pub fn new(timeout: Option<Duration>, cancel: Option<CancelFlag>) -> Self {
        Self {
            start: Instant::now(),
            timeout,
            cancel,
        }
    }

    /// A watchdog which never expires.
    pub fn unlimited() -> Self {
        Self::new(None, None)
    }

    /// A watchdog which expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(Some(timeout), None)
    }

    /// Returns an error if the watchdog has expired.
    ///
    /// Cancellation takes priority over the timeout.
    pub fn check(&self) -> Result<(), WatchdogError> {
        if let Some(ref c) = self.cancel {
            if c.is_cancelled() {
                return Err(WatchdogError::Cancelled)
            }
        }

        if let Some(t) = self.timeout {
            let elapsed = self.start.elapsed();
            if elapsed >= t {
                return Err(WatchdogError::TimedOut(elapsed.as_secs_f64()))
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited() {
        assert_eq!(Watchdog::unlimited().check(), Ok(()));
    }

    #[test]
    fn test_timeout() {
        assert!(matches!(
            Watchdog::with_timeout(Duration::from_secs(0)).check(),
            Err(WatchdogError::TimedOut(_))
        ));
        assert_eq!(Watchdog::with_timeout(Duration::from_secs(3600)).check(), Ok(()));
    }

    #[test]
    fn test_cancel_shared() {
        let flag = CancelFlag::new();
        let wd = Watchdog::new(Some(Duration::from_secs(0)), Some(flag.clone()));

        flag.cancel();
        assert_eq!(wd.check(), Err(WatchdogError::Cancelled));
    }
}
