//! Per-Quantity Configuration Records
//!
//! Each aggregation call receives an explicit [`QuantityProfile`] instead of
//! reading from a global threshold table keyed by name. The presets in
//! [`Quantity::profile`] encode the fleet defaults from [`crate::constants`];
//! deployments with calibrated hardware override individual fields.

use crate::constants::*;
use crate::quantity::Quantity;

/// Thresholds and window lengths for one quantity across all three stages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityProfile {
    /// Fixed cadence of the normalized raw grid (seconds)
    pub slot_seconds: u32,
    /// Max plausible consecutive-sample delta before a jump couple is flagged
    pub control_threshold: f32,
    /// Trailing window for the raw-level rolling median (minutes)
    pub raw_median_window_min: u32,
    /// Fraction of the median window that must be populated, raw level
    pub raw_median_availability: f32,
    /// Minute-bucket width (minutes)
    pub averaging_period_min: u32,
    /// Fraction of minute-bucket slots that must be non-faulty
    pub minute_availability: f32,
    /// Trailing window for the minute-level rolling median (minutes)
    pub minute_median_window_min: u32,
    /// Fraction of the median window that must be populated, minute level
    pub minute_median_availability: f32,
    /// Hour-bucket width (minutes)
    pub hour_window_min: u32,
    /// Fraction of hour-bucket minutes that must be non-faulty
    pub hour_availability: f32,
    /// Warm-up minutes dropped from the head of the minute output
    pub preprocess_window_min: u32,
    /// Max plausible rainfall intensity (mm per second); precipitation only
    pub rain_intensity_limit: f32,
    /// Minute availability override for precipitation on non-WS1000 gauges
    pub precip_hourly_availability: f32,
}

impl QuantityProfile {
    /// Base profile shared by every quantity; presets adjust from here.
    const fn base(control_threshold: f32, availability: f32) -> Self {
        Self {
            slot_seconds: SLOT_SECONDS,
            control_threshold,
            raw_median_window_min: RAW_MEDIAN_WINDOW_MIN,
            raw_median_availability: MEDIAN_AVAILABILITY,
            averaging_period_min: AVERAGING_PERIOD_DEFAULT_MIN,
            minute_availability: availability,
            minute_median_window_min: MINUTE_MEDIAN_WINDOW_MIN,
            minute_median_availability: availability,
            hour_window_min: HOUR_WINDOW_MIN,
            hour_availability: availability,
            preprocess_window_min: PREPROCESS_WINDOW_MIN,
            rain_intensity_limit: RAIN_INTENSITY_LIMIT,
            precip_hourly_availability: AVAILABILITY_PRECIPITATION,
        }
    }

    /// Possible raw samples inside the raw median window
    pub fn raw_window_capacity(&self) -> f32 {
        (self.raw_median_window_min * 60) as f32 / self.slot_seconds as f32
    }

    /// Possible minute buckets inside the minute median window
    pub fn minute_window_capacity(&self) -> f32 {
        self.minute_median_window_min as f32 / self.averaging_period_min as f32
    }

    /// Largest credible accumulation delta inside one minute bucket (mm)
    pub fn rain_delta_cap(&self) -> f32 {
        (self.averaging_period_min * 60) as f32 * self.rain_intensity_limit
    }
}

impl Quantity {
    /// Fleet-default profile for this quantity
    pub const fn profile(&self) -> QuantityProfile {
        match self {
            Self::Temperature => QuantityProfile::base(
                CONTROL_THRESHOLD_TEMPERATURE,
                AVAILABILITY_DEFAULT,
            ),
            Self::Humidity => {
                QuantityProfile::base(CONTROL_THRESHOLD_HUMIDITY, AVAILABILITY_DEFAULT)
            }
            Self::WindSpeed => {
                let mut p =
                    QuantityProfile::base(CONTROL_THRESHOLD_WIND_SPEED, AVAILABILITY_WIND);
                p.averaging_period_min = AVERAGING_PERIOD_WIND_MIN;
                p
            }
            Self::WindDirection => {
                // Control threshold unused: the jump detector skips this channel.
                let mut p = QuantityProfile::base(0.0, AVAILABILITY_WIND);
                p.averaging_period_min = AVERAGING_PERIOD_WIND_MIN;
                p
            }
            Self::Pressure => {
                QuantityProfile::base(CONTROL_THRESHOLD_PRESSURE, AVAILABILITY_DEFAULT)
            }
            Self::Illuminance => {
                QuantityProfile::base(CONTROL_THRESHOLD_ILLUMINANCE, AVAILABILITY_DEFAULT)
            }
            Self::PrecipitationAccumulated => {
                QuantityProfile::base(0.0, AVAILABILITY_PRECIPITATION)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wind_uses_two_minute_buckets() {
        assert_eq!(Quantity::WindSpeed.profile().averaging_period_min, 2);
        assert_eq!(Quantity::WindDirection.profile().averaging_period_min, 2);
        assert_eq!(Quantity::Temperature.profile().averaging_period_min, 1);
    }

    #[test]
    fn raw_window_capacity_matches_grid() {
        let p = Quantity::Temperature.profile();
        assert_eq!(p.raw_window_capacity(), 37.5);
    }

    #[test]
    fn rain_cap_scales_with_period() {
        let p = Quantity::PrecipitationAccumulated.profile();
        assert!((p.rain_delta_cap() - 60.0 * 0.254).abs() < 1e-6);
    }
}
