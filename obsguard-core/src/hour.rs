//! Hour-Level Aggregation
//!
//! Final QC stage: fold minute buckets into hourly windows. Statistically it
//! is the minute stage one level up, minus the jump detector; at this
//! resolution only availability is scored. Wind re-averages the minute mean
//! vectors, precipitation sums the minute sums, everything else takes the
//! plain mean of minute averages.
//!
//! Precipitation is the one quantity whose hourly aggregation accepts an
//! empty input: a sum over zero rows is a perfectly defined empty table,
//! whereas a mean over zero rows has no anchor. The asymmetry is kept on
//! purpose so that a dry, silent gauge does not abort a whole day.

use log::debug;

use crate::annotation::FaultTags;
use crate::average::{
    availability_fault, mean, mean_with_faults, reconstruct_wind, valid_percentage,
    vector_mean, vector_mean_with_faults, wind_components, window_end_ms,
};
use crate::config::QuantityProfile;
use crate::constants::MS_PER_MINUTE;
use crate::errors::{QcError, QcResult};
use crate::quantity::{AveragingKind, Quantity};
use crate::series::{HourBucket, MinuteBucket, WindVector};

/// Fold minute buckets into hourly buckets for one quantity.
///
/// Fails on an empty input except for precipitation, which returns an empty
/// table instead.
pub fn aggregate_hour(
    mut minutes: Vec<MinuteBucket>,
    quantity: Quantity,
    profile: &QuantityProfile,
) -> QcResult<Vec<HourBucket>> {
    if minutes.is_empty() {
        if quantity == Quantity::PrecipitationAccumulated {
            return Ok(Vec::new());
        }
        return Err(QcError::InsufficientData {
            required: 1,
            available: 0,
        });
    }
    minutes.sort_by_key(|b| b.window_end);

    let period_ms = profile.hour_window_min as i64 * MS_PER_MINUTE;
    let mut hours: Vec<HourBucket> = Vec::new();
    let mut start = 0;
    while start < minutes.len() {
        let end_ms = window_end_ms(minutes[start].window_end.timestamp_millis(), period_ms);
        let mut stop = start + 1;
        while stop < minutes.len()
            && window_end_ms(minutes[stop].window_end.timestamp_millis(), period_ms) == end_ms
        {
            stop += 1;
        }
        hours.push(fold_hour(end_ms, &minutes[start..stop], quantity, profile)?);
        start = stop;
    }

    debug!(
        "hour aggregation: {} {} buckets from {} minutes",
        hours.len(),
        quantity.name(),
        minutes.len()
    );

    Ok(hours)
}

/// Aggregate one hour of minute buckets
fn fold_hour(
    end_ms: i64,
    minutes: &[MinuteBucket],
    quantity: Quantity,
    profile: &QuantityProfile,
) -> QcResult<HourBucket> {
    let window_end = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(end_ms).ok_or(
        QcError::MalformedInput {
            reason: "window end outside representable time range",
        },
    )?;

    let slot_count = minutes.len() as u32;
    let faulty_count = minutes.iter().filter(|m| m.total_fault).count() as u32;
    let faulty_reward_count =
        minutes.iter().filter(|m| m.total_fault_rewards).count() as u32;
    let annotation = minutes
        .iter()
        .fold(FaultTags::empty(), |acc, m| acc.union(m.annotation));

    let (value_avg, value_avg_corrected, wind) = match quantity.averaging() {
        AveragingKind::ScalarMean => {
            let avg = mean(minutes.iter().filter_map(|m| m.value_avg));
            let corrected = mean_with_faults(
                minutes
                    .iter()
                    .map(|m| (m.value_avg_corrected, m.total_fault)),
                profile.hour_availability,
            );
            (avg, corrected, None)
        }
        AveragingKind::CircularVectorMean => {
            // Re-project each minute's reconstructed speed and direction;
            // averaging the minute angles directly would reintroduce the
            // wraparound error the components exist to avoid.
            let components: Vec<Option<(f32, f32)>> = minutes
                .iter()
                .map(minute_components)
                .collect();

            let (u, v) = vector_mean(components.iter().copied());
            let (speed_avg, direction_avg) = reconstruct_wind(u, v);

            let (cu, cv) = vector_mean_with_faults(
                components
                    .iter()
                    .zip(minutes)
                    .map(|(c, m)| (*c, m.total_fault)),
                profile.hour_availability,
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
            // Implausible deltas were already rejected slot by slot; the
            // hour is a plain sum of minute sums.
            let sum: f32 = minutes.iter().filter_map(|m| m.value_avg).sum();
            (Some(sum), Some(sum), None)
        }
    };

    Ok(HourBucket {
        window_end,
        value_avg,
        value_avg_corrected,
        wind,
        slot_count,
        faulty_count,
        faulty_reward_count,
        valid_percentage: valid_percentage(slot_count, faulty_count),
        valid_percentage_rewards: valid_percentage(slot_count, faulty_reward_count),
        availability_fault: availability_fault(
            slot_count,
            faulty_count,
            profile.hour_availability,
        ),
        availability_fault_rewards: availability_fault(
            slot_count,
            faulty_reward_count,
            profile.hour_availability,
        ),
        annotation,
    })
}

/// u/v components of one minute bucket's mean wind
fn minute_components(minute: &MinuteBucket) -> Option<(f32, f32)> {
    let wind = minute.wind?;
    match (wind.speed_avg, wind.direction_avg) {
        (Some(speed), Some(direction)) => Some(wind_components(speed, direction)),
        _ => None,
    }
}
