//! Trailing Rolling Median with Availability Gating
//!
//! ## Overview
//!
//! Jump attribution needs a robust estimate of "normal" at every row: the
//! median of the trailing time window. A plain median over whatever happens
//! to be present is misleading when most of the window is missing, so the
//! window also tracks how full it is and reports the median as undefined
//! below an availability threshold.
//!
//! The undefined state is deliberate output, not an error: rows keep a
//! `None` median and the detector downgrades attributed spikes to
//! unidentified ones there.
//!
//! ## Design
//!
//! One forward pass, one window: samples are pushed in timestamp order and
//! samples older than the window length are evicted from the front. The
//! window is time-based (not count-based) so it works unchanged for the 16s
//! raw grid and for 1-2 minute bucket series; the caller supplies the
//! theoretical slot capacity of the window, because availability is measured
//! against what *could* have been there, not against what arrived.

use std::collections::VecDeque;

/// Trailing time window over an evenly gridded series
pub struct TrailingWindow {
    /// Window length in milliseconds; the window covers `(t - len, t]`
    window_ms: i64,
    /// Theoretical number of slots in a full window
    capacity: f32,
    /// Minimum populated fraction for a defined median
    availability_threshold: f32,
    /// Samples currently inside the window, oldest first
    samples: VecDeque<(i64, Option<f32>)>,
    /// Count of populated samples inside the window
    populated: usize,
}

impl TrailingWindow {
    /// Create a window of `window_ms` holding up to `capacity` slots.
    pub fn new(window_ms: i64, capacity: f32, availability_threshold: f32) -> Self {
        Self {
            window_ms,
            capacity,
            availability_threshold,
            samples: VecDeque::new(),
            populated: 0,
        }
    }

    /// Push the sample at `ts_ms` and return the gated trailing median.
    ///
    /// The current sample is part of its own window. Returns `None` when the
    /// populated fraction of the window is below the availability threshold,
    /// or when nothing in the window is populated at all.
    pub fn push(&mut self, ts_ms: i64, value: Option<f32>) -> Option<f32> {
        self.samples.push_back((ts_ms, value));
        if value.is_some() {
            self.populated += 1;
        }

        // Evict everything at or before the left edge of (t - len, t].
        let cutoff = ts_ms - self.window_ms;
        while let Some(&(front_ts, front_val)) = self.samples.front() {
            if front_ts > cutoff {
                break;
            }
            if front_val.is_some() {
                self.populated -= 1;
            }
            self.samples.pop_front();
        }

        let fraction = self.populated as f32 / self.capacity;
        if fraction < self.availability_threshold {
            return None;
        }
        self.median()
    }

    fn median(&self) -> Option<f32> {
        let mut values: Vec<f32> = self
            .samples
            .iter()
            .filter_map(|&(_, v)| v)
            .collect();
        if values.is_empty() {
            return None;
        }
        values.sort_unstable_by(|a, b| a.total_cmp(b));

        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            Some((values[mid - 1] + values[mid]) / 2.0)
        } else {
            Some(values[mid])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1s slots, 10s window, two thirds required.
    fn window() -> TrailingWindow {
        TrailingWindow::new(10_000, 10.0, 0.67)
    }

    #[test]
    fn median_undefined_until_warm() {
        let mut w = window();
        // 6 samples of 10 possible: 0.6 < 0.67, still undefined.
        let mut last = None;
        for i in 0..6 {
            last = w.push(i * 1000, Some(i as f32));
        }
        assert_eq!(last, None);

        // Seventh sample crosses the threshold.
        let median = w.push(6_000, Some(6.0));
        assert_eq!(median, Some(3.0));
    }

    #[test]
    fn gaps_degrade_the_median() {
        let mut w = window();
        for i in 0..10 {
            w.push(i * 1000, Some(1.0));
        }
        // Window full of data, then a run of gaps pushes availability under
        // the threshold again.
        let mut median = Some(1.0);
        for i in 10..15 {
            median = w.push(i * 1000, None);
        }
        assert_eq!(median, None);
    }

    #[test]
    fn eviction_respects_left_open_edge() {
        let mut w = TrailingWindow::new(10_000, 10.0, 0.0);
        w.push(0, Some(100.0));
        // At t=10s the t=0 sample is exactly window length old and must be
        // gone; the median is over the remaining sample only.
        let median = w.push(10_000, Some(2.0));
        assert_eq!(median, Some(2.0));
    }

    #[test]
    fn even_count_averages_middle_pair() {
        let mut w = TrailingWindow::new(10_000, 4.0, 0.0);
        w.push(1000, Some(1.0));
        w.push(2000, Some(2.0));
        w.push(3000, Some(3.0));
        let median = w.push(4000, Some(4.0));
        assert_eq!(median, Some(2.5));
    }

    #[test]
    fn all_missing_window_has_no_median() {
        let mut w = TrailingWindow::new(10_000, 10.0, 0.0);
        let median = w.push(0, None);
        assert_eq!(median, None);
    }
}
