//! Minute-Level Aggregation
//!
//! Second QC stage: fold raw-check rows into fixed-width minute buckets and
//! re-run the jump detector at bucket granularity.
//!
//! Buckets are right-closed, left-open and labelled by their end; the bucket
//! width is quantity-specific (wind averages over two minutes, everything
//! else over one). Every bucket carries a plain average, a corrected average
//! that excludes raw-faulty slots, availability bookkeeping on both fault
//! tracks, and the merged fault-reason tags of its slots.
//!
//! A spike that survives raw-level averaging is still a spike: the detector
//! runs a second time over the bucket averages with a fresh trailing median,
//! so minute-level jumps get their own `invalid_datum` verdicts independent
//! of anything flagged at raw level.
//!
//! The head of the output covers the lookback region that only exists to
//! warm up rolling statistics; those buckets are dropped before returning.

use log::debug;

use crate::annotation::FaultTags;
use crate::average::{
    availability_fault, capped_positive_sum, mean, mean_with_faults, reconstruct_wind,
    valid_percentage, vector_mean, vector_mean_with_faults, wind_components, window_end_ms,
};
use crate::config::QuantityProfile;
use crate::constants::MS_PER_MINUTE;
use crate::detect::{scan_jumps, SpikeFlags};
use crate::errors::{QcError, QcResult};
use crate::median::TrailingWindow;
use crate::quantity::{AveragingKind, Quantity, StationType};
use crate::series::{MinuteBucket, RawCheckRow, WindVector};

/// Fold raw-check rows into minute buckets for one quantity.
///
/// Returns the input series back together with the bucket table, minus the
/// warm-up region at the head. Fails on an empty series for every quantity;
/// there is no timestamp to anchor a single window on.
pub fn aggregate_minute(
    mut series: Vec<RawCheckRow>,
    quantity: Quantity,
    profile: &QuantityProfile,
    station: StationType,
) -> QcResult<(Vec<RawCheckRow>, Vec<MinuteBucket>)> {
    if series.is_empty() {
        return Err(QcError::InsufficientData {
            required: 1,
            available: 0,
        });
    }
    series.sort_by_key(|r| r.timestamp);

    // Non-WS1000 rain gauges are held to the hourly availability bar even at
    // minute resolution.
    let availability = if quantity == Quantity::PrecipitationAccumulated
        && station != StationType::Ws1000
    {
        profile.precip_hourly_availability
    } else {
        profile.minute_availability
    };

    let period_ms = profile.averaging_period_min as i64 * MS_PER_MINUTE;
    let groups = group_by_window(&series, period_ms);

    let mut buckets = Vec::with_capacity(groups.len());
    for (end_ms, range) in &groups {
        let rows = &series[range.clone()];
        buckets.push(fold_bucket(*end_ms, rows, quantity, profile, availability)?);
    }

    if quantity.detects_jumps() {
        rescan_buckets(&mut buckets, profile);
    }

    for bucket in &mut buckets {
        bucket.total_fault = bucket.availability_fault || bucket.invalid_datum;
        bucket.total_fault_rewards =
            bucket.availability_fault_rewards || bucket.invalid_datum;
        bucket.annotation = bucket
            .annotation
            .tagged_if(bucket.invalid_datum, FaultTags::SPIKES)
            .tagged_if(
                bucket.unidentified_change,
                FaultTags::UNIDENTIFIED_ANOMALOUS_CHANGE,
            )
            .tagged_if(bucket.availability_fault, FaultTags::NO_DATA);
    }

    // Everything before this cutoff only existed to warm up the rolling
    // statistics; it must not reach the hour stage.
    let produced = buckets.len();
    let cutoff_ms = groups[0].0 + (profile.preprocess_window_min as i64 - 1) * MS_PER_MINUTE;
    buckets.retain(|b| b.window_end.timestamp_millis() > cutoff_ms);

    debug!(
        "minute aggregation: {} {} buckets ({} dropped as warm-up)",
        buckets.len(),
        quantity.name(),
        produced - buckets.len()
    );

    Ok((series, buckets))
}

/// Consecutive index ranges sharing a window end, oldest first
fn group_by_window(
    series: &[RawCheckRow],
    period_ms: i64,
) -> Vec<(i64, std::ops::Range<usize>)> {
    let mut groups: Vec<(i64, std::ops::Range<usize>)> = Vec::new();
    for (i, row) in series.iter().enumerate() {
        let end = window_end_ms(row.timestamp.timestamp_millis(), period_ms);
        match groups.last_mut() {
            Some((last_end, range)) if *last_end == end => range.end = i + 1,
            _ => groups.push((end, i..i + 1)),
        }
    }
    groups
}

/// Aggregate one window of raw rows into a bucket, detector fields zeroed
fn fold_bucket(
    end_ms: i64,
    rows: &[RawCheckRow],
    quantity: Quantity,
    profile: &QuantityProfile,
    availability: f32,
) -> QcResult<MinuteBucket> {
    let window_end = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(end_ms).ok_or(
        QcError::MalformedInput {
            reason: "window end outside representable time range",
        },
    )?;

    let slot_count = rows.len() as u32;
    let faulty_count = rows.iter().filter(|r| r.total_fault).count() as u32;
    let faulty_reward_count = rows.iter().filter(|r| r.reward_fault).count() as u32;
    let annotation = rows
        .iter()
        .fold(FaultTags::empty(), |acc, r| acc.union(r.annotation));

    let (value_avg, value_avg_corrected, wind) = match quantity.averaging() {
        AveragingKind::ScalarMean => {
            let avg = mean(rows.iter().filter_map(|r| r.value));
            let corrected = mean_with_faults(
                rows.iter().map(|r| (r.value, r.total_fault)),
                availability,
            );
            (avg, corrected, None)
        }
        AveragingKind::CircularVectorMean => {
            let components: Vec<Option<(f32, f32)>> =
                rows.iter().map(|r| slot_components(r, quantity)).collect();

            let (u, v) = vector_mean(components.iter().copied());
            let (speed_avg, direction_avg) = reconstruct_wind(u, v);

            let (cu, cv) = vector_mean_with_faults(
                components
                    .iter()
                    .zip(rows)
                    .map(|(c, r)| (*c, r.total_fault)),
                availability,
            );
            let (speed_corr, direction_corr) = reconstruct_wind(cu, cv);

            let wind = WindVector {
                u,
                v,
                speed_avg,
                direction_avg,
                speed_avg_corrected: speed_corr,
                direction_avg_corrected: direction_corr,
            };
            if quantity == Quantity::WindSpeed {
                (speed_avg, speed_corr, Some(wind))
            } else {
                (direction_avg, direction_corr, Some(wind))
            }
        }
        AveragingKind::MonotonicSum => {
            let sum = capped_positive_sum(
                rows.iter().map(|r| r.precip_delta),
                profile.rain_delta_cap(),
            );
            // Implausible increments never entered the sum, so the sum is
            // its own corrected value.
            (Some(sum), Some(sum), None)
        }
    };

    Ok(MinuteBucket {
        window_end,
        value_avg,
        value_avg_corrected,
        wind,
        slot_count,
        faulty_count,
        faulty_reward_count,
        valid_percentage: valid_percentage(slot_count, faulty_count),
        valid_percentage_rewards: valid_percentage(slot_count, faulty_reward_count),
        rolling_median: None,
        diff_abs: None,
        median_diff_abs: None,
        jump_couple: false,
        invalid_datum: false,
        unidentified_change: false,
        availability_fault: availability_fault(slot_count, faulty_count, availability),
        availability_fault_rewards: availability_fault(
            slot_count,
            faulty_reward_count,
            availability,
        ),
        total_fault: false,
        total_fault_rewards: false,
        annotation,
    })
}

/// u/v components of one raw slot, whichever wind channel is under test
fn slot_components(row: &RawCheckRow, quantity: Quantity) -> Option<(f32, f32)> {
    let (speed, direction) = if quantity == Quantity::WindSpeed {
        (row.value, row.paired_wind)
    } else {
        (row.paired_wind, row.value)
    };
    match (speed, direction) {
        (Some(s), Some(d)) => Some(wind_components(s, d)),
        _ => None,
    }
}

/// Second detection pass over the bucket-average series
fn rescan_buckets(buckets: &mut [MinuteBucket], profile: &QuantityProfile) {
    let mut window = TrailingWindow::new(
        profile.minute_median_window_min as i64 * MS_PER_MINUTE,
        profile.minute_window_capacity(),
        profile.minute_median_availability,
    );

    let values: Vec<Option<f32>> = buckets.iter().map(|b| b.value_avg).collect();
    let medians: Vec<Option<f32>> = buckets
        .iter()
        .map(|b| window.push(b.window_end.timestamp_millis(), b.value_avg))
        .collect();
    let flags: Vec<SpikeFlags> = scan_jumps(&values, &medians, profile.control_threshold);

    let mut prev: Option<f32> = None;
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.rolling_median = medians[i];
        bucket.diff_abs = match (values[i], prev) {
            (Some(curr), Some(p)) => Some((curr - p).abs()),
            _ => None,
        };
        bucket.median_diff_abs = match (values[i], medians[i]) {
            (Some(curr), Some(m)) => Some((curr - m).abs()),
            _ => None,
        };
        bucket.jump_couple = flags[i].jump_couple;
        bucket.invalid_datum = flags[i].invalid_datum;
        bucket.unidentified_change = flags[i].unidentified;
        prev = values[i];
    }
}
