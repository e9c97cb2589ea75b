//! Physical Quantities and Their Averaging Semantics
//!
//! The pipeline processes exactly the measurement channels a weather station
//! reports. Each quantity selects, once, the numeric semantics that all three
//! aggregation resolutions share:
//!
//! - **Scalar mean**: temperature, humidity, wind speed, pressure,
//!   illuminance. Plain arithmetic averaging is physically meaningful.
//! - **Circular vector mean**: wind direction (and wind speed when the two
//!   channels are combined into a vector). Averaging angles arithmetically
//!   fails at the 0°/360° wraparound, so samples are decomposed into u/v
//!   components first.
//! - **Monotonic sum**: accumulated precipitation. The sensor reports a
//!   running counter; buckets sum per-slot increments instead of averaging
//!   counter values.
//!
//! Jump detection compares consecutive samples against a trailing median,
//! which is meaningless for circular angles and for a monotonically growing
//! counter. Those two quantities therefore skip the jump detector entirely
//! and only pick up missing-data and pre-processing faults.

use serde::{Deserialize, Serialize};

/// One measurement channel of a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Quantity {
    Temperature = 0,
    Humidity = 1,
    WindSpeed = 2,
    WindDirection = 3,
    Pressure = 4,
    Illuminance = 5,
    PrecipitationAccumulated = 6,
}

/// Averaging rule a quantity uses at every aggregation resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AveragingKind {
    /// Arithmetic mean of available samples
    ScalarMean,
    /// u/v component decomposition, mean per component, then reconstruction
    CircularVectorMean,
    /// Sum of positive, capped per-slot increments
    MonotonicSum,
}

impl Quantity {
    /// All quantities, in processing order
    pub const ALL: [Self; 7] = [
        Self::Temperature,
        Self::Humidity,
        Self::WindSpeed,
        Self::WindDirection,
        Self::Pressure,
        Self::Illuminance,
        Self::PrecipitationAccumulated,
    ];

    /// Column name used in exported tables
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::WindSpeed => "wind_speed",
            Self::WindDirection => "wind_direction",
            Self::Pressure => "pressure",
            Self::Illuminance => "illuminance",
            Self::PrecipitationAccumulated => "precipitation_accumulated",
        }
    }

    /// Unit of measurement
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::WindSpeed => "m/s",
            Self::WindDirection => "°",
            Self::Pressure => "hPa",
            Self::Illuminance => "lux",
            Self::PrecipitationAccumulated => "mm",
        }
    }

    /// Averaging rule shared by the minute and hour stages
    pub const fn averaging(&self) -> AveragingKind {
        match self {
            Self::WindSpeed | Self::WindDirection => AveragingKind::CircularVectorMean,
            Self::PrecipitationAccumulated => AveragingKind::MonotonicSum,
            _ => AveragingKind::ScalarMean,
        }
    }

    /// Whether the jump/median detector applies to this quantity.
    ///
    /// False for wind direction (circular) and accumulated precipitation
    /// (monotonic counter); a consecutive-sample difference carries no fault
    /// signal for either.
    pub const fn detects_jumps(&self) -> bool {
        !matches!(self, Self::WindDirection | Self::PrecipitationAccumulated)
    }

    /// True for the two wind channels, which are averaged as one vector
    pub const fn is_wind(&self) -> bool {
        matches!(self, Self::WindSpeed | Self::WindDirection)
    }
}

/// Station hardware family.
///
/// The precipitation gauge on WS1000 units reports reliably enough at minute
/// resolution to keep the per-quantity availability threshold; other families
/// fall back to the stricter hourly availability for precipitation buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationType {
    /// Cellular flagship gauge
    Ws1000,
    /// WiFi successor family
    Ws2000,
    /// First-generation WiFi station
    M5,
}

impl StationType {
    /// Display name matching fleet inventory records
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ws1000 => "WS1000",
            Self::Ws2000 => "WS2000",
            Self::M5 => "M5",
        }
    }
}
