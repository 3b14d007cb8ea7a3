#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pulse/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and trait definitions for the Pulse market health engine.
//!
//! This crate provides the foundational abstractions shared by every other
//! Pulse crate: the signal and pillar identifiers, the raw value model that
//! data sources produce, the [`Signal`] scoring trait, the error taxonomy and
//! the [`Clock`] used for TTLs and calendar dates.

/// The version of the pulse-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod clock;
pub mod error;
pub mod signal;
pub mod stats;
pub mod types;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorKind, PulseError, Result};
pub use signal::Signal;
pub use types::{PillarKey, RawSignalValue, RawValue, Score, SignalKey, Snapshot};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
