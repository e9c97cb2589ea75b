//! Per-Quantity QC Driver
//!
//! Runs the three stages back to back for one quantity of one sensor-day:
//!
//! ```text
//! Vec<RawSlot> → raw check → minute aggregation → hour aggregation
//!                    ↓               ↓                    ↓
//!              RawCheckRow     MinuteBucket          HourBucket
//! ```
//!
//! The driver owns nothing beyond sequencing: every stage is a pure
//! transform, so a run for one quantity of one day shares no state with any
//! other run. Callers wanting parallelism across quantities or days can
//! spawn independent runs without coordination.
//!
//! Reading the input series and persisting the three result tables belong to
//! the surrounding orchestrator; this module only computes.

use log::debug;

use crate::config::QuantityProfile;
use crate::errors::QcResult;
use crate::hour::aggregate_hour;
use crate::minute::aggregate_minute;
use crate::quantity::{Quantity, StationType};
use crate::raw_check::detect_raw_faults;
use crate::series::{HourBucket, MinuteBucket, RawCheckRow, RawSlot};

/// Daily quality summary over the hourly buckets.
///
/// Each track is the mean hourly valid fraction in [0, 1]; the reward track
/// uses the reward-specific fault counts. The two are equal as long as the
/// reward fault mask mirrors the full mask.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QualityScore {
    /// Mean hourly valid fraction, full fault track
    pub availability: f32,
    /// Mean hourly valid fraction, reward fault track
    pub reward: f32,
}

impl QualityScore {
    /// Score over an hourly table; zero when the table is empty
    pub fn from_hours(hours: &[HourBucket]) -> Self {
        if hours.is_empty() {
            return Self {
                availability: 0.0,
                reward: 0.0,
            };
        }
        let n = hours.len() as f32;
        Self {
            availability: hours.iter().map(|h| h.valid_percentage / 100.0).sum::<f32>() / n,
            reward: hours
                .iter()
                .map(|h| h.valid_percentage_rewards / 100.0)
                .sum::<f32>()
                / n,
        }
    }
}

/// All three result tables for one quantity of one processing window
#[derive(Debug, Clone, serde::Serialize)]
pub struct QcReport {
    /// The quantity this report covers
    pub quantity: Quantity,
    /// Raw-resolution rows with fault verdicts
    pub raw: Vec<RawCheckRow>,
    /// Minute buckets, warm-up region already dropped
    pub minutes: Vec<MinuteBucket>,
    /// Hourly buckets
    pub hours: Vec<HourBucket>,
    /// Daily quality summary over the hourly buckets
    pub score: QualityScore,
}

/// Run raw check, minute aggregation and hour aggregation for one quantity.
///
/// Consumes the slot buffer and returns the three result tables plus the
/// daily score. Errors from any stage propagate unchanged; no partial
/// report is produced on failure.
pub fn run_quantity(
    slots: Vec<RawSlot>,
    quantity: Quantity,
    profile: &QuantityProfile,
    station: StationType,
) -> QcResult<QcReport> {
    debug!(
        "qc run: {} on a {} station, {} slots",
        quantity.name(),
        station.name(),
        slots.len()
    );

    let raw = detect_raw_faults(slots, quantity, profile)?;
    let (raw, minutes) = aggregate_minute(raw, quantity, profile, station)?;
    let hours = aggregate_hour(minutes.clone(), quantity, profile)?;
    let score = QualityScore::from_hours(&hours);

    debug!(
        "qc run: {} scored {:.3} over {} hours",
        quantity.name(),
        score.availability,
        hours.len()
    );

    Ok(QcReport {
        quantity,
        raw,
        minutes,
        hours,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn score_of_clean_hours_is_one() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 16).unwrap();
        let slots: Vec<RawSlot> = (0..450)
            .map(|i| RawSlot::new(start + Duration::seconds(16 * i), 20.0))
            .collect();

        let mut profile = Quantity::Temperature.profile();
        profile.preprocess_window_min = 0;
        let report =
            run_quantity(slots, Quantity::Temperature, &profile, StationType::Ws2000)
                .unwrap();

        assert_eq!(report.hours.len(), 2);
        assert!((report.score.availability - 1.0).abs() < 1e-6);
        assert_eq!(report.score.availability, report.score.reward);
    }

    #[test]
    fn score_of_empty_table_is_zero() {
        let score = QualityScore::from_hours(&[]);
        assert_eq!(score.availability, 0.0);
        assert_eq!(score.reward, 0.0);
    }

    #[test]
    fn gaps_pull_the_score_down() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 16).unwrap();
        // Second hour loses every slot.
        let slots: Vec<RawSlot> = (0..450)
            .map(|i| {
                let ts = start + Duration::seconds(16 * i);
                if i >= 225 {
                    RawSlot::missing(ts)
                } else {
                    RawSlot::new(ts, 20.0)
                }
            })
            .collect();

        let mut profile = Quantity::Temperature.profile();
        profile.preprocess_window_min = 0;
        let report =
            run_quantity(slots, Quantity::Temperature, &profile, StationType::Ws2000)
                .unwrap();

        assert!(report.score.availability < 0.6);
        let last_hour = report.hours.last().unwrap();
        assert!(last_hour.availability_fault);
        assert_eq!(last_hour.value_avg_corrected, None);
    }
}
