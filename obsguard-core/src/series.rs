//! Typed Rows and Buckets for the Three Pipeline Resolutions
//!
//! ## Overview
//!
//! Each stage consumes its input buffer and produces a new, independently
//! owned output buffer of a dedicated row type:
//!
//! ```text
//! Vec<RawSlot> → raw check → Vec<RawCheckRow> → minute → Vec<MinuteBucket>
//!                                                    ↓
//!                                           hour → Vec<HourBucket>
//! ```
//!
//! Columns accreted by a stage are named struct fields, never dynamic
//! lookups, so the coupling between stages is visible in the types. All
//! output types derive `Serialize`/`Deserialize`: these rows *are* the
//! persisted tables, keyed by slot timestamp or window end, with the
//! annotation column last.
//!
//! ## Grid invariants
//!
//! Timestamps inside one processing unit are strictly increasing and evenly
//! spaced at the configured cadence. Gaps are rows with `value: None`, never
//! omitted rows. Buckets are right-closed, left-open windows labelled by
//! their end: the 01:00 minute bucket covers samples after 00:59:00 up to
//! and including 01:00:00.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::annotation::FaultTags;

/// Annotations attached by the pre-processing stages upstream of the raw
/// check: constant-value runs and the on-board out-of-bounds check. Carried
/// through unchanged and merged into every fault verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreFlags {
    /// Short constant-value run
    pub constant: bool,
    /// Constant-value run longer than the long-run window
    pub constant_long: bool,
    /// Sensor frozen at one value across quantities
    pub constant_frozen: bool,
    /// Rejected by the on-board out-of-bounds check
    pub out_of_bounds: bool,
}

impl PreFlags {
    /// No pre-processing fault
    pub const fn clear() -> Self {
        Self {
            constant: false,
            constant_long: false,
            constant_frozen: false,
            out_of_bounds: false,
        }
    }

    /// True when any pre-processing detector fired
    pub const fn any(&self) -> bool {
        self.constant || self.constant_long || self.constant_frozen || self.out_of_bounds
    }

    /// Fault-reason tags for the flags that fired
    pub fn tags(&self) -> FaultTags {
        FaultTags::empty()
            .tagged_if(self.out_of_bounds, FaultTags::OBC)
            .tagged_if(self.constant, FaultTags::CONSTANT)
            .tagged_if(self.constant_long, FaultTags::CONSTANT_LONG)
            .tagged_if(self.constant_frozen, FaultTags::FROZEN_SENSOR)
    }
}

/// One fixed-cadence input slot for one quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSlot {
    /// Slot-aligned UTC timestamp
    pub timestamp: DateTime<Utc>,
    /// Measured value; `None` is a gap left by the time-grid normalizer
    pub value: Option<f32>,
    /// The opposite wind channel measured in the same slot: direction when
    /// `value` is speed, speed when `value` is direction. Required for
    /// vector averaging; `None` for every scalar quantity.
    pub paired_wind: Option<f32>,
    /// Pre-processing fault flags for this slot
    pub pre: PreFlags,
}

impl RawSlot {
    /// Slot with a measured value and no pre-processing faults
    pub fn new(timestamp: DateTime<Utc>, value: f32) -> Self {
        Self {
            timestamp,
            value: Some(value),
            paired_wind: None,
            pre: PreFlags::clear(),
        }
    }

    /// Gap slot left by the normalizer
    pub fn missing(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            value: None,
            paired_wind: None,
            pre: PreFlags::clear(),
        }
    }

    /// Attach the opposite wind channel
    #[must_use]
    pub fn with_paired_wind(mut self, paired: Option<f32>) -> Self {
        self.paired_wind = paired;
        self
    }

    /// Attach pre-processing flags
    #[must_use]
    pub fn with_pre(mut self, pre: PreFlags) -> Self {
        self.pre = pre;
        self
    }
}

/// Detector verdicts for one raw slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFlags {
    /// Member of a consecutive pair exceeding the control threshold
    pub jump_couple: bool,
    /// Attributed faulty via the median comparison or a stuck repeat
    pub invalid_datum: bool,
    /// Jump with no defined median to attribute against
    pub unidentified_spike: bool,
    /// No value in this slot
    pub no_datum: bool,
}

/// One row of the raw-check output table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCheckRow {
    /// Slot-aligned UTC timestamp
    pub timestamp: DateTime<Utc>,
    /// Measured value as received
    pub value: Option<f32>,
    /// Opposite wind channel, carried for the minute stage's vector math
    pub paired_wind: Option<f32>,
    /// Pre-processing fault flags, carried through
    pub pre: PreFlags,
    /// Availability-gated trailing median
    pub rolling_median: Option<f32>,
    /// Absolute difference from the previous sample
    pub consec_diff_abs: Option<f32>,
    /// Absolute difference from the trailing median
    pub median_diff_abs: Option<f32>,
    /// Consecutive-slot accumulation increment; precipitation only
    pub precip_delta: Option<f32>,
    /// Detector verdicts for this slot
    pub flags: RawFlags,
    /// Any detector or pre-processing fault fired
    pub total_fault: bool,
    /// Fault mask for the reward scoring track. Currently derived by the
    /// same formula as `total_fault` but kept as its own column.
    pub reward_fault: bool,
    /// Fault-reason tags, rendered last in exports
    pub annotation: FaultTags,
}

/// Vector-average results for the two wind channels of one bucket.
///
/// Wind is bucketed as a vector: per-slot u/v components are averaged and
/// speed/direction are reconstructed from the mean vector. Both channels are
/// carried on every wind bucket because the hour stage re-averages the
/// minute vectors, not the minute angles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindVector {
    /// Mean east-west component
    pub u: Option<f32>,
    /// Mean north-south component
    pub v: Option<f32>,
    /// Speed of the mean vector
    pub speed_avg: Option<f32>,
    /// Direction of the mean vector, degrees in [0, 360). `None` for a calm
    /// (zero-magnitude) mean vector, which has no meaningful direction.
    pub direction_avg: Option<f32>,
    /// Speed reconstructed from non-faulty slots only
    pub speed_avg_corrected: Option<f32>,
    /// Direction reconstructed from non-faulty slots only
    pub direction_avg_corrected: Option<f32>,
}

/// One minute-resolution bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinuteBucket {
    /// End of the right-closed window this bucket covers
    pub window_end: DateTime<Utc>,
    /// Bucket average: mean, reconstructed vector component, or capped sum
    pub value_avg: Option<f32>,
    /// Bucket average excluding faulty slots; `None` when too few valid
    /// slots remain
    pub value_avg_corrected: Option<f32>,
    /// Vector-average details; wind runs only
    pub wind: Option<WindVector>,
    /// Number of grid slots inside the window
    pub slot_count: u32,
    /// Slots with `total_fault` set
    pub faulty_count: u32,
    /// Slots with `reward_fault` set
    pub faulty_reward_count: u32,
    /// Percentage of non-faulty slots
    pub valid_percentage: f32,
    /// Percentage of slots clean on the reward track
    pub valid_percentage_rewards: f32,
    /// Availability-gated trailing median of bucket averages
    pub rolling_median: Option<f32>,
    /// Absolute difference from the previous bucket average
    pub diff_abs: Option<f32>,
    /// Absolute difference from the trailing median
    pub median_diff_abs: Option<f32>,
    /// Member of a bucket-level jump couple
    pub jump_couple: bool,
    /// Bucket average attributed faulty via the median comparison
    pub invalid_datum: bool,
    /// Bucket-level jump with no defined median to attribute against
    pub unidentified_change: bool,
    /// Too few non-faulty slots for a representative bucket
    pub availability_fault: bool,
    /// Availability verdict on the reward track
    pub availability_fault_rewards: bool,
    /// Bucket faulty for any reason
    pub total_fault: bool,
    /// Bucket faulty on the reward track
    pub total_fault_rewards: bool,
    /// Merged fault-reason tags of all slots plus bucket-level reasons
    pub annotation: FaultTags,
}

/// One hour-resolution bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourBucket {
    /// End of the right-closed window this bucket covers
    pub window_end: DateTime<Utc>,
    /// Hourly average of minute values; sum for precipitation
    pub value_avg: Option<f32>,
    /// Hourly average excluding faulty minutes
    pub value_avg_corrected: Option<f32>,
    /// Vector-average details; wind runs only
    pub wind: Option<WindVector>,
    /// Number of minute buckets inside the window
    pub slot_count: u32,
    /// Minutes with `total_fault` set
    pub faulty_count: u32,
    /// Minutes faulty on the reward track
    pub faulty_reward_count: u32,
    /// Percentage of non-faulty minutes
    pub valid_percentage: f32,
    /// Percentage of minutes clean on the reward track
    pub valid_percentage_rewards: f32,
    /// Too few non-faulty minutes for a representative hour
    pub availability_fault: bool,
    /// Availability verdict on the reward track
    pub availability_fault_rewards: bool,
    /// Union of all constituent minutes' fault-reason tags
    pub annotation: FaultTags,
}
