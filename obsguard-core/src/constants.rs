//! QC Thresholds and Time Constants
//!
//! Centralized, documented constants for the detection and aggregation
//! stages. All thresholds here are defaults; callers tune individual stations
//! through [`crate::config::QuantityProfile`].
//!
//! Keep magic numbers out of the stage code: every cadence, window length and
//! availability fraction lives here with its rationale.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: i64 = 1000;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: i64 = 60;

/// Milliseconds per minute.
pub const MS_PER_MINUTE: i64 = MS_PER_SECOND * SECONDS_PER_MINUTE;

/// Minutes per hour.
pub const MINUTES_PER_HOUR: u32 = 60;

// ===== TIME GRID =====

/// Fixed cadence of the normalized raw grid (seconds).
///
/// Stations report on an irregular 10-20s heartbeat; the normalizer snaps
/// readings onto this slot width and leaves gaps as missing rows.
pub const SLOT_SECONDS: u32 = 16;

/// Trailing window for the raw-level rolling median (minutes).
///
/// Ten minutes of 16s slots gives ~37 samples, enough for a robust median
/// while still tracking genuine weather fronts.
pub const RAW_MEDIAN_WINDOW_MIN: u32 = 10;

/// Trailing window for the minute-level rolling median (minutes).
pub const MINUTE_MEDIAN_WINDOW_MIN: u32 = 10;

/// Final aggregation window (minutes). Scores are settled per hour.
pub const HOUR_WINDOW_MIN: u32 = 60;

/// Warm-up region dropped from the head of the minute-level output (minutes).
///
/// The processing buffer starts six hours before the target day so rolling
/// statistics and the constant-value pre-checks are fully warmed up by the
/// first slot that actually gets scored.
pub const PREPROCESS_WINDOW_MIN: u32 = 360;

// ===== AVAILABILITY THRESHOLDS =====

/// Fraction of trailing-window slots required for a valid rolling median.
///
/// Below this the median is reported as undefined rather than computed from
/// a thin sample; a jump seen against an undefined median becomes an
/// unidentified spike instead of an attributed one.
pub const MEDIAN_AVAILABILITY: f32 = 0.67;

/// Bucket availability threshold for thermodynamic quantities.
///
/// Temperature, humidity, pressure and illuminance vary slowly; two thirds
/// of a window is enough to call its average representative.
pub const AVAILABILITY_DEFAULT: f32 = 0.67;

/// Bucket availability threshold for the wind channels.
///
/// Gusts make wind statistics noisier, so a larger share of the window must
/// be present before an average is trusted.
pub const AVAILABILITY_WIND: f32 = 0.75;

/// Bucket availability threshold for accumulated precipitation.
///
/// Sums cannot interpolate across gaps the way means can; a missing slot is
/// rain lost forever, so the bar is highest here.
pub const AVAILABILITY_PRECIPITATION: f32 = 0.85;

// ===== JUMP CONTROL THRESHOLDS =====
//
// Maximum plausible change between consecutive 16s samples. Anything larger
// is a jump couple and gets attributed against the trailing median.

/// Temperature control threshold (°C per slot).
pub const CONTROL_THRESHOLD_TEMPERATURE: f32 = 2.0;

/// Relative humidity control threshold (% per slot).
pub const CONTROL_THRESHOLD_HUMIDITY: f32 = 5.0;

/// Wind speed control threshold (m/s per slot).
pub const CONTROL_THRESHOLD_WIND_SPEED: f32 = 10.0;

/// Barometric pressure control threshold (hPa per slot).
pub const CONTROL_THRESHOLD_PRESSURE: f32 = 1.0;

/// Illuminance control threshold (lux per slot).
///
/// Cloud edges legitimately move tens of klux in seconds; only sensor
/// glitches exceed this.
pub const CONTROL_THRESHOLD_ILLUMINANCE: f32 = 20_000.0;

// ===== AVERAGING PERIODS =====

/// Minute-bucket width for scalar quantities and precipitation (minutes).
pub const AVERAGING_PERIOD_DEFAULT_MIN: u32 = 1;

/// Minute-bucket width for the wind channels (minutes).
///
/// WMO practice averages wind over at least two minutes to smooth gusts.
pub const AVERAGING_PERIOD_WIND_MIN: u32 = 2;

// ===== PRECIPITATION =====

/// Maximum plausible rainfall intensity (mm per second).
///
/// Roughly 915 mm/h, comfortably above any recorded cloudburst. Per-slot
/// accumulation deltas beyond `period * 60 * limit` are sensor artifacts
/// (counter resets, voltage glitches) and are excluded from bucket sums.
pub const RAIN_INTENSITY_LIMIT: f32 = 0.254;
