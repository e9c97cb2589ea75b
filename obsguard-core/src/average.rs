//! Averaging Utilities Shared by the Minute and Hour Stages
//!
//! Pure helpers for the three averaging rules plus the availability
//! bookkeeping every bucket needs. No side effects, no allocation beyond the
//! iterator adapters, so they are trivially testable in isolation.
//!
//! ## Corrected averages
//!
//! A corrected average recomputes a bucket statistic after dropping faulty
//! inputs, but only when enough inputs survive: the valid fraction of the
//! window must reach the availability threshold, otherwise the corrected
//! value is reported as undefined rather than computed from scraps. The same
//! fraction drives the bucket's availability fault with a strict `<`, so a
//! bucket sitting exactly on the threshold keeps its corrected average and
//! does not fault.
//!
//! ## Wind vectors
//!
//! Wind is averaged as a vector. Each sample is projected to u/v components
//! with the meteorological convention (direction is where the wind comes
//! *from*):
//!
//! ```text
//! u = -speed * sin(direction)      east-west
//! v = -speed * cos(direction)      north-south
//! ```
//!
//! Components are averaged, then speed and direction are reconstructed from
//! the mean vector. A calm mean vector (zero magnitude) has no direction and
//! reconstructs to `None`.

use core::f32::consts::PI;

/// Arithmetic mean; `None` over an empty iterator
pub fn mean(values: impl IntoIterator<Item = f32>) -> Option<f32> {
    let mut sum = 0.0;
    let mut count = 0u32;
    for v in values {
        sum += v;
        count += 1;
    }
    (count > 0).then(|| sum / count as f32)
}

/// Availability-gated corrected mean.
///
/// `items` yields `(value, faulty)` per window member. The mean runs over
/// the values of non-faulty members; it is defined only when the non-faulty
/// fraction of the *whole* window reaches `threshold`.
pub fn mean_with_faults(
    items: impl IntoIterator<Item = (Option<f32>, bool)>,
    threshold: f32,
) -> Option<f32> {
    let mut total = 0u32;
    let mut valid = 0u32;
    let mut sum = 0.0;
    let mut populated = 0u32;
    for (value, faulty) in items {
        total += 1;
        if faulty {
            continue;
        }
        valid += 1;
        if let Some(v) = value {
            sum += v;
            populated += 1;
        }
    }

    if total == 0 || (valid as f32 / total as f32) < threshold {
        return None;
    }
    (populated > 0).then(|| sum / populated as f32)
}

/// Project a wind sample onto u/v components
pub fn wind_components(speed: f32, direction_deg: f32) -> (f32, f32) {
    let rad = direction_deg * PI / 180.0;
    (-speed * rad.sin(), -speed * rad.cos())
}

/// Magnitude of a mean wind vector
pub fn wind_speed_of(u: f32, v: f32) -> f32 {
    u.hypot(v)
}

/// Direction of a mean wind vector, degrees in [0, 360).
///
/// A calm vector reports `None`: there is no wind to have a direction.
pub fn wind_direction_of(u: f32, v: f32) -> Option<f32> {
    if u == 0.0 && v == 0.0 {
        return None;
    }
    Some((u.atan2(v).to_degrees() + 180.0) % 360.0)
}

/// Mean u/v over the populated components of a window
pub fn vector_mean(
    components: impl IntoIterator<Item = Option<(f32, f32)>>,
) -> (Option<f32>, Option<f32>) {
    let mut sum_u = 0.0;
    let mut sum_v = 0.0;
    let mut count = 0u32;
    for c in components.into_iter().flatten() {
        sum_u += c.0;
        sum_v += c.1;
        count += 1;
    }
    if count == 0 {
        (None, None)
    } else {
        (Some(sum_u / count as f32), Some(sum_v / count as f32))
    }
}

/// Availability-gated corrected mean vector.
///
/// Same gating contract as [`mean_with_faults`], applied to u/v pairs.
pub fn vector_mean_with_faults(
    items: impl IntoIterator<Item = (Option<(f32, f32)>, bool)>,
    threshold: f32,
) -> (Option<f32>, Option<f32>) {
    let mut total = 0u32;
    let mut valid = 0u32;
    let mut sum_u = 0.0;
    let mut sum_v = 0.0;
    let mut populated = 0u32;
    for (component, faulty) in items {
        total += 1;
        if faulty {
            continue;
        }
        valid += 1;
        if let Some((u, v)) = component {
            sum_u += u;
            sum_v += v;
            populated += 1;
        }
    }

    if total == 0 || (valid as f32 / total as f32) < threshold || populated == 0 {
        return (None, None);
    }
    (
        Some(sum_u / populated as f32),
        Some(sum_v / populated as f32),
    )
}

/// Speed and direction of a mean vector, when both components exist
pub fn reconstruct_wind(u: Option<f32>, v: Option<f32>) -> (Option<f32>, Option<f32>) {
    match (u, v) {
        (Some(u), Some(v)) => (Some(wind_speed_of(u, v)), wind_direction_of(u, v)),
        _ => (None, None),
    }
}

/// Sum of plausible accumulation increments.
///
/// Keeps deltas in `(0, cap]`: negative deltas are counter resets, anything
/// above the cap is a sensor artifact, and neither is rain.
pub fn capped_positive_sum(deltas: impl IntoIterator<Item = Option<f32>>, cap: f32) -> f32 {
    deltas
        .into_iter()
        .flatten()
        .filter(|&d| d > 0.0 && d <= cap)
        .sum()
}

/// Availability verdict for a bucket: too few non-faulty members.
///
/// Strict `<`: a bucket exactly on the threshold does not fault.
pub fn availability_fault(total: u32, faulty: u32, threshold: f32) -> bool {
    if total == 0 {
        return true;
    }
    ((total - faulty) as f32 / total as f32) < threshold
}

/// Percentage of non-faulty members in a bucket
pub fn valid_percentage(total: u32, faulty: u32) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (total - faulty) as f32 * 100.0 / total as f32
}

/// End of the right-closed window containing `ts_ms`.
///
/// A timestamp exactly on a boundary labels its own window.
pub(crate) fn window_end_ms(ts_ms: i64, period_ms: i64) -> i64 {
    let rem = ts_ms.rem_euclid(period_ms);
    if rem == 0 {
        ts_ms
    } else {
        ts_ms - rem + period_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mean_of_nothing_is_none() {
        let empty: [f32; 0] = [];
        assert_eq!(mean(empty), None);
        assert_eq!(mean([4.0, 6.0]), Some(5.0));
    }

    #[test]
    fn corrected_mean_skips_faulty_members() {
        // Seven slots, two unusable: the classic 26.2 window.
        let items = [
            (Some(25.0), false),
            (Some(27.0), true),
            (Some(23.0), false),
            (Some(22.0), true),
            (Some(26.0), false),
            (Some(28.0), false),
            (Some(29.0), false),
        ];
        // 5 of 7 valid: passes a 0.7 bar, fails a 0.8 bar.
        assert_eq!(mean_with_faults(items, 0.7), Some(26.2));
        assert_eq!(mean_with_faults(items, 0.8), None);
    }

    #[test]
    fn corrected_mean_on_the_threshold_is_defined() {
        let items = [
            (Some(10.0), false),
            (Some(10.0), false),
            (Some(99.0), true),
            (Some(99.0), true),
        ];
        // Exactly half valid at a 0.5 bar: defined, and no availability
        // fault either.
        assert_eq!(mean_with_faults(items, 0.5), Some(10.0));
        assert!(!availability_fault(4, 2, 0.5));
        assert!(availability_fault(4, 3, 0.5));
    }

    #[test]
    fn corrected_mean_of_empty_window_is_none() {
        let empty: [(Option<f32>, bool); 0] = [];
        assert_eq!(mean_with_faults(empty, 0.5), None);
        let all_missing = [(None::<f32>, false), (None, false)];
        assert_eq!(mean_with_faults(all_missing, 0.5), None);
    }

    #[test]
    fn wind_projection_roundtrip() {
        let (u, v) = wind_components(10.0, 90.0);
        assert!((u - -10.0).abs() < 1e-4);
        assert!(v.abs() < 1e-4);
        assert!((wind_speed_of(u, v) - 10.0).abs() < 1e-4);
        assert!((wind_direction_of(u, v).unwrap() - 90.0).abs() < 1e-3);
    }

    /// Smallest angular distance between two directions in degrees
    fn circular_delta(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn direction_reconstruction_quadrants() {
        for (u, v, expected) in [
            (0.0, -10.0, 0.0),
            (-10.0, 0.0, 90.0),
            (0.0, 10.0, 180.0),
            (10.0, 0.0, 270.0),
            (-4.0, 3.0, 126.87),
            (4.0, -3.0, 306.87),
        ] {
            let dir = wind_direction_of(u, v).unwrap();
            assert!(
                circular_delta(dir, expected) < 0.01,
                "({u}, {v}) reconstructed to {dir}, expected {expected}"
            );
            assert!((0.0..360.0).contains(&dir));
        }
    }

    #[test]
    fn calm_vector_has_no_direction() {
        assert_eq!(wind_direction_of(0.0, 0.0), None);
        assert_eq!(wind_speed_of(0.0, 0.0), 0.0);
    }

    #[test]
    fn corrected_vector_mean_matches_hand_calculation() {
        // u descending by 8, v by 6 across valid members; faulty members
        // carry wild values that must not leak in.
        let mut items = Vec::new();
        for i in 0..10 {
            items.push((Some(((-40 + i * 8) as f32, (30 - i * 6) as f32)), false));
            items.push((Some((500.0, 500.0)), true));
        }
        let (u, v) = vector_mean_with_faults(items.iter().copied(), 0.4);
        assert_eq!((u, v), (Some(-4.0), Some(3.0)));
        assert!((wind_speed_of(u.unwrap(), v.unwrap()) - 5.0).abs() < 1e-4);
        assert!(
            (wind_direction_of(u.unwrap(), v.unwrap()).unwrap() - 126.87).abs() < 0.01
        );

        // The same window under a stricter bar yields nothing.
        let (u, v) = vector_mean_with_faults(items.iter().copied(), 0.6);
        assert_eq!((u, v), (None, None));
    }

    #[test]
    fn rain_sum_rejects_resets_and_glitches() {
        let cap = 15.24;
        let deltas = [
            Some(0.2),
            Some(-3.0), // counter reset
            Some(500.0), // glitch
            Some(0.1),
            None,
            Some(0.0), // no rain is not an increment
        ];
        let total = capped_positive_sum(deltas, cap);
        assert!((total - 0.3).abs() < 1e-6);
    }

    #[test]
    fn window_end_labels_boundaries_inclusively() {
        let minute = 60_000;
        assert_eq!(window_end_ms(0, minute), 0);
        assert_eq!(window_end_ms(1, minute), minute);
        assert_eq!(window_end_ms(minute, minute), minute);
        assert_eq!(window_end_ms(minute + 1, minute), 2 * minute);
    }

    proptest! {
        /// Raising the availability bar can only add faults, never remove.
        #[test]
        fn availability_fault_is_monotone_in_threshold(
            total in 1u32..200,
            faulty_frac in 0.0f32..=1.0,
            t1 in 0.0f32..=1.0,
            t2 in 0.0f32..=1.0,
        ) {
            let faulty = ((total as f32) * faulty_frac) as u32;
            let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
            if availability_fault(total, faulty, lo) {
                prop_assert!(availability_fault(total, faulty, hi));
            }
        }

        /// With every member valid, correction changes nothing.
        #[test]
        fn fully_valid_window_roundtrips(
            values in proptest::collection::vec(-50.0f32..50.0, 1..60),
            threshold in 0.0f32..=1.0,
        ) {
            let plain = mean(values.iter().copied()).unwrap();
            let corrected = mean_with_faults(
                values.iter().map(|&v| (Some(v), false)),
                threshold,
            ).unwrap();
            prop_assert!((plain - corrected).abs() < 1e-5);
        }
    }
}
