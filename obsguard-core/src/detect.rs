//! Jump-Pair and Spike Detection Scan
//!
//! ## Overview
//!
//! The same scan runs twice in the pipeline: once over the raw 16s grid and
//! once over the minute-bucket averages. It flags three conditions:
//!
//! - **Jump couple**: two temporally adjacent samples whose absolute
//!   difference exceeds the control threshold. Both members are marked; the
//!   jump itself is suspicious, not yet a verdict.
//! - **Invalid datum**: of a jump couple, the member further from the
//!   trailing median. The median is the tiebreaker for "which side of the
//!   jump is wrong". Equal distances leave both members unattributed.
//! - **Unidentified spike**: a jump couple member whose trailing median is
//!   undefined. With no reference there is nothing to attribute against, so
//!   the sample is flagged as suspicious without a verdict.
//!
//! A fourth rule propagates verdicts forward: a sample exactly equal to its
//! predecessor inherits the predecessor's invalid flag. A sensor stuck at a
//! faulty value keeps producing faulty values, and comparing the repeats
//! against the median again would let them launder themselves clean.
//!
//! ## Why a single forward scan
//!
//! The contamination rule makes row `i` depend on the *final* flag of row
//! `i-1`, including flags set retroactively by the jump attribution at `i`.
//! Expressing that with whole-column operations takes shift/mask gymnastics
//! and still breaks on chains of repeats. One stateful left-to-right pass
//! over live flags is both the invariant and the implementation.

/// Per-row outcome of the detection scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpikeFlags {
    /// Member of a consecutive pair whose delta exceeds the control threshold
    pub jump_couple: bool,
    /// Jump member attributed as faulty via the median comparison, or a
    /// repeat of such a value
    pub invalid_datum: bool,
    /// Jump member with no defined median to attribute against
    pub unidentified: bool,
}

/// Scan a gridded series for jumps, attributed spikes and stuck repeats.
///
/// `values` and `medians` run in timestamp order and must be equally long;
/// `medians[i]` is the availability-gated trailing median at row `i`.
/// Missing values take no part in jump comparisons.
pub fn scan_jumps(
    values: &[Option<f32>],
    medians: &[Option<f32>],
    control_threshold: f32,
) -> Vec<SpikeFlags> {
    debug_assert_eq!(values.len(), medians.len());

    let mut flags = vec![SpikeFlags::default(); values.len()];

    // Distance from normal, defined only where both value and median are.
    let median_diff: Vec<Option<f32>> = values
        .iter()
        .zip(medians)
        .map(|(v, m)| match (v, m) {
            (Some(v), Some(m)) => Some((v - m).abs()),
            _ => None,
        })
        .collect();

    for i in 1..values.len() {
        let (Some(curr), Some(prev)) = (values[i], values[i - 1]) else {
            continue;
        };

        if (curr - prev).abs() > control_threshold {
            flags[i].jump_couple = true;
            flags[i - 1].jump_couple = true;

            // Attribution needs both distances; an undefined median on
            // either side leaves the couple unattributed here and the
            // unidentified pass below picks it up.
            if let (Some(curr_diff), Some(prev_diff)) = (median_diff[i], median_diff[i - 1]) {
                if prev_diff > curr_diff {
                    flags[i - 1].invalid_datum = true;
                } else if curr_diff > prev_diff {
                    flags[i].invalid_datum = true;
                }
            }
        }

        // Stuck-at-fault contamination, evaluated on live flag state so
        // chains of repeats stay flagged.
        if curr == prev && flags[i - 1].invalid_datum {
            flags[i].invalid_datum = true;
        }
    }

    for (flag, median) in flags.iter_mut().zip(medians) {
        if flag.jump_couple && median.is_none() {
            flag.unidentified = true;
        }
    }

    flags
}
