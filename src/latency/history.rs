//! Hash-seeded historical latency series.
//!
//! Each pair key maps to a fixed baseline and volatility; samples follow a
//! daily sine wave keyed on the UTC hour plus uniform noise.

use super::HistoricalLatency;
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;
use std::f64::consts::TAU;

/// Lowest latency a historical sample may take.
pub const LATENCY_FLOOR_MS: f64 = 10.0;

/// Per-pair constants derived from the pair key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairProfile {
    pub baseline: f64,
    pub volatility: f64,
}

impl PairProfile {
    pub fn from_key(pair_key: &str) -> Self {
        let seed = i64::from(pair_hash(pair_key)).unsigned_abs();
        Self {
            baseline: 20.0 + (seed % 200) as f64,
            volatility: 10.0 + (seed % 20) as f64,
        }
    }
}

/// Order-dependent 32-bit hash over UTF-16 code units (`h * 31 + c`, wrapping).
pub fn pair_hash(key: &str) -> i32 {
    key.encode_utf16().fold(0i32, |h, unit| {
        (h << 5).wrapping_sub(h).wrapping_add(i32::from(unit))
    })
}

/// Sampling cadence chosen from the lookback window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadence {
    pub points: usize,
    pub interval: Duration,
}

impl Cadence {
    pub fn for_window(window_hours: f64) -> Result<Self> {
        if !window_hours.is_finite() || window_hours <= 0.0 {
            return Err(Error::InvalidWindow(window_hours));
        }
        let cadence = if window_hours <= 1.0 {
            Cadence { points: 60, interval: Duration::minutes(1) }
        } else if window_hours <= 24.0 {
            Cadence { points: 24, interval: Duration::hours(1) }
        } else if window_hours <= 24.0 * 7.0 {
            Cadence { points: 24 * 7, interval: Duration::hours(1) }
        } else {
            // long windows average to one sample per day
            Cadence { points: 30, interval: Duration::days(1) }
        };
        Ok(cadence)
    }
}

/// Series for `pair_key` ending at the current time.
pub fn historical_series(pair_key: &str, window_hours: f64) -> Result<Vec<HistoricalLatency>> {
    historical_series_at(pair_key, window_hours, Utc::now(), &mut rand::thread_rng())
}

/// Series for `pair_key` ending at `now`, in ascending time order.
pub fn historical_series_at<R: Rng + ?Sized>(
    pair_key: &str,
    window_hours: f64,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<HistoricalLatency>> {
    let cadence = Cadence::for_window(window_hours)?;
    let profile = PairProfile::from_key(pair_key);

    let mut series: Vec<HistoricalLatency> = (0..cadence.points)
        .map(|i| {
            let time = now - cadence.interval * i as i32;
            let daily = (f64::from(time.hour()) / 24.0 * TAU).sin();
            let noise = (rng.gen::<f64>() - 0.5) * profile.volatility;
            let latency = profile.baseline + daily * profile.volatility + noise;
            HistoricalLatency { time, latency: latency.max(LATENCY_FLOOR_MS) }
        })
        .collect();
    series.reverse();
    Ok(series)
}
