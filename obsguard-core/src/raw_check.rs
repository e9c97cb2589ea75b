//! Raw-Level Fault Detection
//!
//! First QC stage: flag faulty samples on the fixed-cadence grid for one
//! quantity over one processing window (six hours of lookback plus the
//! target day, so rolling statistics are warm before the day starts).
//!
//! Per slot, the stage:
//!
//! 1. computes the availability-gated trailing median and the two distance
//!    columns (consecutive difference, distance from median),
//! 2. runs the jump/spike/contamination scan against them,
//! 3. flags missing slots as `no_datum`,
//! 4. merges the verdicts with the pre-processing flags into `total_fault`
//!    and the reward-track mask, and renders the fault-reason tags.
//!
//! Wind direction and accumulated precipitation skip steps 1-2: circular
//! angles and a monotonic counter both make consecutive-difference checks
//! meaningless. Precipitation instead gets its per-slot accumulation delta
//! computed here, which the minute stage sums under a plausibility cap.

use log::{debug, warn};

use crate::annotation::FaultTags;
use crate::config::QuantityProfile;
use crate::constants::MS_PER_MINUTE;
use crate::detect::{scan_jumps, SpikeFlags};
use crate::errors::{QcError, QcResult};
use crate::median::TrailingWindow;
use crate::quantity::Quantity;
use crate::series::{RawCheckRow, RawFlags, RawSlot};

/// Detect faulty samples on the normalized raw grid.
///
/// Consumes the slot buffer and returns one annotated row per slot, in
/// timestamp order. Fails on an empty buffer, on non-finite sample values
/// and on duplicate grid timestamps; gaps must arrive as `None` rows, never
/// as omitted rows.
pub fn detect_raw_faults(
    mut slots: Vec<RawSlot>,
    quantity: Quantity,
    profile: &QuantityProfile,
) -> QcResult<Vec<RawCheckRow>> {
    if slots.is_empty() {
        return Err(QcError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    slots.sort_by_key(|s| s.timestamp);
    validate_grid(&slots)?;

    debug!(
        "raw check: {} slots of {} at {}s cadence",
        slots.len(),
        quantity.name(),
        profile.slot_seconds
    );

    let values: Vec<Option<f32>> = slots.iter().map(|s| s.value).collect();
    if values.iter().all(Option::is_none) {
        warn!("raw check: {} window contains no data at all", quantity.name());
    }

    // Trailing median, distance columns and the jump scan only apply where
    // consecutive differences mean something.
    let (medians, spikes) = if quantity.detects_jumps() {
        let mut window = TrailingWindow::new(
            profile.raw_median_window_min as i64 * MS_PER_MINUTE,
            profile.raw_window_capacity(),
            profile.raw_median_availability,
        );
        let medians: Vec<Option<f32>> = slots
            .iter()
            .map(|s| window.push(s.timestamp.timestamp_millis(), s.value))
            .collect();
        let spikes = scan_jumps(&values, &medians, profile.control_threshold);
        (medians, spikes)
    } else {
        (
            vec![None; slots.len()],
            vec![SpikeFlags::default(); slots.len()],
        )
    };

    let is_precipitation = quantity == Quantity::PrecipitationAccumulated;
    let mut rows = Vec::with_capacity(slots.len());
    let mut prev_value: Option<f32> = None;

    for (i, slot) in slots.into_iter().enumerate() {
        let consec_diff_abs = match (slot.value, prev_value) {
            (Some(curr), Some(prev)) if i > 0 => Some((curr - prev).abs()),
            _ => None,
        };
        let precip_delta = match (is_precipitation, slot.value, prev_value) {
            (true, Some(curr), Some(prev)) if i > 0 => Some(curr - prev),
            _ => None,
        };
        let median_diff_abs = match (slot.value, medians[i]) {
            (Some(v), Some(m)) => Some((v - m).abs()),
            _ => None,
        };

        let flags = RawFlags {
            jump_couple: spikes[i].jump_couple,
            invalid_datum: spikes[i].invalid_datum,
            unidentified_spike: spikes[i].unidentified,
            no_datum: slot.value.is_none(),
        };

        let faulty = slot.pre.any()
            || flags.invalid_datum
            || flags.unidentified_spike
            || flags.no_datum;

        let annotation = slot
            .pre
            .tags()
            .tagged_if(flags.no_datum, FaultTags::NO_DATA)
            .tagged_if(flags.invalid_datum, FaultTags::SPIKES)
            .tagged_if(flags.unidentified_spike, FaultTags::UNIDENTIFIED_SPIKE);

        prev_value = slot.value;
        rows.push(RawCheckRow {
            timestamp: slot.timestamp,
            value: slot.value,
            paired_wind: slot.paired_wind,
            pre: slot.pre,
            rolling_median: medians[i],
            consec_diff_abs,
            median_diff_abs,
            precip_delta,
            flags,
            total_fault: faulty,
            // The reward track is a separate verdict that happens to share
            // the formula today; keep the columns distinct.
            reward_fault: faulty,
            annotation,
        });
    }

    Ok(rows)
}

/// Reject buffers that break the fixed-grid contract
fn validate_grid(slots: &[RawSlot]) -> QcResult<()> {
    for pair in slots.windows(2) {
        if pair[0].timestamp == pair[1].timestamp {
            return Err(QcError::MalformedInput {
                reason: "duplicate grid timestamp",
            });
        }
    }
    for slot in slots {
        for v in [slot.value, slot.paired_wind].into_iter().flatten() {
            if !v.is_finite() {
                return Err(QcError::MalformedInput {
                    reason: "non-finite sample value",
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::PreFlags;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn grid(start: DateTime<Utc>, values: &[Option<f32>]) -> Vec<RawSlot> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Some(v) => RawSlot::new(start + Duration::seconds(16 * i as i64), *v),
                None => RawSlot::missing(start + Duration::seconds(16 * i as i64)),
            })
            .collect()
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn profile() -> QuantityProfile {
        Quantity::Temperature.profile()
    }

    #[test]
    fn empty_input_is_fatal() {
        let err = detect_raw_faults(Vec::new(), Quantity::Temperature, &profile());
        assert_eq!(
            err,
            Err(QcError::InsufficientData {
                required: 1,
                available: 0
            })
        );
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let slots = grid(start(), &[Some(10.0), Some(f32::NAN)]);
        let err = detect_raw_faults(slots, Quantity::Temperature, &profile());
        assert!(matches!(err, Err(QcError::MalformedInput { .. })));
    }

    #[test]
    fn duplicate_timestamps_are_rejected() {
        let ts = start();
        let slots = vec![RawSlot::new(ts, 10.0), RawSlot::new(ts, 11.0)];
        let err = detect_raw_faults(slots, Quantity::Temperature, &profile());
        assert!(matches!(err, Err(QcError::MalformedInput { .. })));
    }

    #[test]
    fn all_missing_input_flags_every_row() {
        let slots = grid(start(), &[None; 40]);
        let rows = detect_raw_faults(slots, Quantity::Temperature, &profile()).unwrap();
        for row in &rows {
            assert!(row.flags.no_datum);
            assert!(row.total_fault);
            assert!(row.annotation.contains(FaultTags::NO_DATA));
            // Columns stay undefined, they are not zeroed.
            assert_eq!(row.rolling_median, None);
            assert_eq!(row.consec_diff_abs, None);
            assert_eq!(row.median_diff_abs, None);
        }
    }

    #[test]
    fn spike_sequence_is_attributed_after_warm_up() {
        // Half an hour of steady readings warms the median, then the
        // textbook suspicious tail.
        let mut values: Vec<Option<f32>> = vec![Some(10.0); 120];
        let tail = [
            Some(10.0),
            Some(10.0),
            Some(10.1),
            Some(50.0),
            Some(10.1),
            Some(50.0),
            Some(50.0),
            Some(50.0),
            Some(10.2),
            Some(10.2),
            None,
            Some(10.2),
        ];
        values.extend_from_slice(&tail);
        let base = values.len() - tail.len();

        let mut p = profile();
        p.control_threshold = 3.0;
        let rows = detect_raw_faults(
            grid(start(), &values),
            Quantity::Temperature,
            &p,
        )
        .unwrap();

        // Warm-up region is clean.
        assert!(rows[..base].iter().all(|r| !r.total_fault));

        let jump: Vec<usize> = (0..tail.len())
            .filter(|&i| rows[base + i].flags.jump_couple)
            .collect();
        assert_eq!(jump, vec![2, 3, 4, 5, 7, 8]);

        // Exactly one member of the first couple is attributed; the stuck
        // run of 50s stays faulty end to end.
        let invalid: Vec<usize> = (0..tail.len())
            .filter(|&i| rows[base + i].flags.invalid_datum)
            .collect();
        assert_eq!(invalid, vec![3, 5, 6, 7]);

        // The gap is a missing datum, not a jump member.
        let gap = &rows[base + 10];
        assert!(gap.flags.no_datum && !gap.flags.jump_couple);
        assert!(gap.annotation.contains(FaultTags::NO_DATA));

        for &i in &invalid {
            assert!(rows[base + i].annotation.contains(FaultTags::SPIKES));
            assert!(rows[base + i].total_fault);
            assert!(rows[base + i].reward_fault);
        }
    }

    #[test]
    fn jump_without_median_is_unidentified() {
        // Too short for the 10-minute median to become available.
        let values = [Some(10.0), Some(10.0), Some(50.0), Some(10.0)];
        let mut p = profile();
        p.control_threshold = 3.0;
        let rows =
            detect_raw_faults(grid(start(), &values), Quantity::Temperature, &p).unwrap();

        assert!(rows[2].flags.jump_couple);
        assert!(!rows[2].flags.invalid_datum);
        assert!(rows[2].flags.unidentified_spike);
        assert!(rows[2].annotation.contains(FaultTags::UNIDENTIFIED_SPIKE));
        assert!(rows[2].total_fault);
    }

    #[test]
    fn wind_direction_skips_jump_detection() {
        // A 350 to 10 degree step is 20 degrees of real rotation, not a
        // spike; the detector must not run here.
        let values = [Some(350.0), Some(10.0), Some(350.0), Some(10.0)];
        let rows = detect_raw_faults(
            grid(start(), &values),
            Quantity::WindDirection,
            &Quantity::WindDirection.profile(),
        )
        .unwrap();

        for row in &rows {
            assert!(!row.flags.jump_couple);
            assert!(!row.flags.invalid_datum);
            assert_eq!(row.rolling_median, None);
            assert!(!row.total_fault);
        }
    }

    #[test]
    fn precipitation_gets_deltas_not_jumps() {
        let values = [Some(10.0), Some(10.2), Some(9.0), None, Some(12.0)];
        let rows = detect_raw_faults(
            grid(start(), &values),
            Quantity::PrecipitationAccumulated,
            &Quantity::PrecipitationAccumulated.profile(),
        )
        .unwrap();

        let deltas: Vec<Option<f32>> = rows.iter().map(|r| r.precip_delta).collect();
        assert_eq!(deltas[0], None);
        assert!((deltas[1].unwrap() - 0.2).abs() < 1e-5);
        // Counter reset shows up as a negative delta; capping happens later.
        assert!((deltas[2].unwrap() - -1.2).abs() < 1e-5);
        assert_eq!(deltas[3], None);
        assert_eq!(deltas[4], None);

        assert!(rows.iter().all(|r| !r.flags.jump_couple));
        assert!(rows[3].flags.no_datum);
    }

    #[test]
    fn pre_flags_propagate_into_the_verdict() {
        let ts = start();
        let slots = vec![
            RawSlot::new(ts, 10.0),
            RawSlot::new(ts + Duration::seconds(16), 10.0).with_pre(PreFlags {
                constant_frozen: true,
                ..PreFlags::clear()
            }),
        ];
        let rows = detect_raw_faults(slots, Quantity::Temperature, &profile()).unwrap();
        assert!(!rows[0].total_fault);
        assert!(rows[1].total_fault);
        assert!(rows[1].annotation.contains(FaultTags::FROZEN_SENSOR));
    }
}
