//! Fault-Reason Annotations
//!
//! Every row and bucket carries a machine-readable set of fault-reason tags
//! explaining *why* it was flagged. Downstream sinks persist the set as a
//! comma-delimited string in the last column of every exported table.
//!
//! ## Representation
//!
//! Tags form a closed set, so the whole annotation fits in a `u16` bit set.
//! That buys the two contracts the aggregation stages rely on structurally:
//!
//! - **Idempotence**: inserting a tag twice is a no-op (`x | t | t == x | t`)
//! - **Order-insensitive union**: merging bucket annotations is bitwise OR,
//!   so A∪B == B∪A and duplicates cannot exist
//!
//! The rendered string never contains empty tokens or leading/trailing
//! delimiters; an empty set renders as the empty string, not null.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::QcError;

/// Delimiter used in the persisted annotation column
pub const ANNOTATION_DELIMITER: char = ',';

/// All known fault-reason tokens, in rendering order.
///
/// The first four originate in the pre-processing stages upstream of the raw
/// check and are only carried through; the rest are produced here.
const TOKENS: [(u16, &str); 8] = [
    (FaultTags::OBC.0, "OBC"),
    (FaultTags::CONSTANT.0, "CONSTANT"),
    (FaultTags::CONSTANT_LONG.0, "CONSTANT_LONG"),
    (FaultTags::FROZEN_SENSOR.0, "FROZEN_SENSOR"),
    (FaultTags::SPIKES.0, "SPIKES"),
    (FaultTags::UNIDENTIFIED_SPIKE.0, "UNIDENTIFIED_SPIKE"),
    (
        FaultTags::UNIDENTIFIED_ANOMALOUS_CHANGE.0,
        "UNIDENTIFIED_ANOMALOUS_CHANGE",
    ),
    (FaultTags::NO_DATA.0, "NO_DATA"),
];

/// Deduplicated set of fault-reason tags for one row or bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FaultTags(u16);

impl FaultTags {
    /// Out-of-bounds reading rejected by the on-board check
    pub const OBC: Self = Self(1 << 0);
    /// Short run of constant readings
    pub const CONSTANT: Self = Self(1 << 1);
    /// Long run of constant readings
    pub const CONSTANT_LONG: Self = Self(1 << 2);
    /// Sensor frozen at one value across quantities
    pub const FROZEN_SENSOR: Self = Self(1 << 3);
    /// Jump attributed to this sample via the median comparison
    pub const SPIKES: Self = Self(1 << 4);
    /// Jump seen but no reliable median to attribute it with (raw level)
    pub const UNIDENTIFIED_SPIKE: Self = Self(1 << 5);
    /// Jump seen but no reliable median to attribute it with (minute level)
    pub const UNIDENTIFIED_ANOMALOUS_CHANGE: Self = Self(1 << 6);
    /// Missing datum, or too few valid slots to aggregate
    pub const NO_DATA: Self = Self(1 << 7);

    /// Empty tag set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// True when no tag is set
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Insert the given tags. Idempotent.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Insert `tags` only when `flag` is set, returning the updated set.
    ///
    /// This is the single write path every stage uses to attach a
    /// fault-reason text to a numeric fault flag.
    #[must_use]
    pub fn tagged_if(mut self, flag: bool, tags: Self) -> Self {
        if flag {
            self.insert(tags);
        }
        self
    }

    /// Union of two tag sets
    #[must_use]
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// True when every tag in `other` is present
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Iterate the rendered names of all set tags, in stable order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        let bits = self.0;
        TOKENS
            .iter()
            .filter(move |(bit, _)| bits & bit != 0)
            .map(|&(_, name)| name)
    }
}

impl fmt::Display for FaultTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for name in self.names() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for FaultTags {
    type Err = QcError;

    /// Parse a delimited annotation string, in any token order.
    ///
    /// Empty tokens (stray delimiters, surrounding whitespace) are ignored so
    /// that strings written by older exporters still round-trip.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tags = Self::empty();
        for token in s.split(ANNOTATION_DELIMITER) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let bit = TOKENS
                .iter()
                .find(|(_, name)| *name == token)
                .map(|&(bit, _)| bit)
                .ok_or(QcError::MalformedInput {
                    reason: "unknown annotation token",
                })?;
            tags.insert(Self(bit));
        }
        Ok(tags)
    }
}

impl Serialize for FaultTags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FaultTags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_renders_as_empty_string() {
        assert_eq!(FaultTags::empty().to_string(), "");
    }

    #[test]
    fn rendering_has_no_stray_delimiters() {
        let mut tags = FaultTags::empty();
        tags.insert(FaultTags::SPIKES);
        tags.insert(FaultTags::NO_DATA);
        assert_eq!(tags.to_string(), "SPIKES,NO_DATA");
    }

    #[test]
    fn tagged_if_is_idempotent() {
        let once = FaultTags::empty().tagged_if(true, FaultTags::SPIKES);
        let twice = once.tagged_if(true, FaultTags::SPIKES);
        assert_eq!(once, twice);

        let untouched = FaultTags::empty().tagged_if(false, FaultTags::SPIKES);
        assert!(untouched.is_empty());
    }

    #[test]
    fn parse_accepts_any_order_and_dedups() {
        let a: FaultTags = "NO_DATA,SPIKES".parse().unwrap();
        let b: FaultTags = "SPIKES,NO_DATA,SPIKES".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_ignores_empty_tokens() {
        let tags: FaultTags = ",SPIKES,,".parse().unwrap();
        assert_eq!(tags, FaultTags::SPIKES);
    }

    #[test]
    fn parse_rejects_unknown_tokens() {
        assert!("SPIKES,BOGUS".parse::<FaultTags>().is_err());
    }

    fn arb_tags() -> impl Strategy<Value = FaultTags> {
        // Mask to the bits that have tokens defined.
        (0u16..0x100).prop_map(FaultTags)
    }

    proptest! {
        #[test]
        fn union_is_commutative(a in arb_tags(), b in arb_tags()) {
            prop_assert_eq!(a.union(b), b.union(a));
        }

        #[test]
        fn union_is_idempotent(a in arb_tags(), b in arb_tags()) {
            prop_assert_eq!(a.union(b).union(b), a.union(b));
        }

        #[test]
        fn display_roundtrips(a in arb_tags()) {
            let rendered = a.to_string();
            let parsed: FaultTags = rendered.parse().unwrap();
            prop_assert_eq!(a, parsed);
        }
    }
}
