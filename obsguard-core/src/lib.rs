//! Core QC engine for ObsGuard
//!
//! Quality control for weather-station telemetry: one sensor-day of
//! fixed-cadence readings goes in, fault-annotated tables at raw, minute and
//! hour resolution come out, plus a scalar daily quality score.
//!
//! Key properties:
//! - Pure, synchronous, batch-oriented; no I/O inside the algorithms
//! - One run = one quantity of one day; runs share nothing and parallelize
//!   freely
//! - Degraded statistics are data (`None` plus a fault flag), never silent
//!   zeros and never errors
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use obsguard_core::{run_quantity, Quantity, RawSlot, StationType};
//!
//! let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 16).unwrap();
//! let slots: Vec<RawSlot> = (0..450)
//!     .map(|i| RawSlot::new(start + Duration::seconds(16 * i), 21.5))
//!     .collect();
//!
//! let mut profile = Quantity::Temperature.profile();
//! profile.preprocess_window_min = 0; // no lookback in this tiny example
//!
//! let report = run_quantity(slots, Quantity::Temperature, &profile, StationType::Ws2000)
//!     .expect("well-formed grid");
//! assert!(report.score.availability > 0.99);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod annotation;
pub mod average;
pub mod config;
pub mod constants;
pub mod detect;
pub mod errors;
pub mod hour;
pub mod median;
pub mod minute;
pub mod pipeline;
pub mod quantity;
pub mod raw_check;
pub mod series;

// Public API
pub use annotation::FaultTags;
pub use config::QuantityProfile;
pub use errors::{QcError, QcResult};
pub use hour::aggregate_hour;
pub use minute::aggregate_minute;
pub use pipeline::{run_quantity, QcReport, QualityScore};
pub use quantity::{AveragingKind, Quantity, StationType};
pub use raw_check::detect_raw_faults;
pub use series::{HourBucket, MinuteBucket, PreFlags, RawCheckRow, RawSlot};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
