//! Process-wide, thread-safe runtime parameters (spec component C5).
//!
//! Mirrors the original's `runtime_reservation_ttl.py` /
//! `runtime_reservation_warning.py` module-level globals guarded by a
//! `threading.Lock`, reworked as two independent atomics: reads and writes
//! are mutually exclusive per cell but independent across cells, and no
//! lock is ever held across I/O.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::AppError;

pub const TTL_MIN_SECONDS: u64 = 60;
pub const TTL_MAX_SECONDS: u64 = 900;
pub const WARNING_MIN_SECONDS: u64 = 5;
pub const WARNING_MAX_SECONDS: u64 = 120;

/// Holds the current reservation TTL and warning threshold. One instance
/// lives in `AppState` for the lifetime of the process.
#[derive(Debug)]
pub struct RuntimeParams {
    ttl_seconds: AtomicU64,
    warning_threshold_seconds: AtomicU64,
}

impl RuntimeParams {
    pub fn new(ttl_seconds: u64, warning_threshold_seconds: u64) -> Self {
        Self {
            ttl_seconds: AtomicU64::new(ttl_seconds),
            warning_threshold_seconds: AtomicU64::new(warning_threshold_seconds),
        }
    }

    pub fn get_ttl(&self) -> u64 {
        self.ttl_seconds.load(Ordering::SeqCst)
    }

    pub fn set_ttl(&self, seconds: u64) -> Result<(), AppError> {
        if !(TTL_MIN_SECONDS..=TTL_MAX_SECONDS).contains(&seconds) {
            return Err(AppError::Validation(format!(
                "reservation_ttl_seconds must be between {TTL_MIN_SECONDS} and {TTL_MAX_SECONDS}"
            )));
        }
        self.ttl_seconds.store(seconds, Ordering::SeqCst);
        Ok(())
    }

    pub fn get_warning(&self) -> u64 {
        self.warning_threshold_seconds.load(Ordering::SeqCst)
    }

    pub fn set_warning(&self, seconds: u64) -> Result<(), AppError> {
        if !(WARNING_MIN_SECONDS..=WARNING_MAX_SECONDS).contains(&seconds) {
            return Err(AppError::Validation(format!(
                "reservation_warning_threshold_seconds must be between {WARNING_MIN_SECONDS} and {WARNING_MAX_SECONDS}"
            )));
        }
        self.warning_threshold_seconds.store(seconds, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_ttl() {
        let params = RuntimeParams::new(120, 20);
        assert!(params.set_ttl(59).is_err());
        assert!(params.set_ttl(901).is_err());
        assert!(params.set_ttl(60).is_ok());
        assert_eq!(params.get_ttl(), 60);
    }

    #[test]
    fn rejects_out_of_range_warning() {
        let params = RuntimeParams::new(120, 20);
        assert!(params.set_warning(4).is_err());
        assert!(params.set_warning(121).is_err());
        assert!(params.set_warning(5).is_ok());
        assert_eq!(params.get_warning(), 5);
    }

    #[test]
    fn cells_are_independent() {
        let params = RuntimeParams::new(120, 20);
        params.set_ttl(300).unwrap();
        assert_eq!(params.get_warning(), 20);
    }
}
