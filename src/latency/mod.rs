//! Synthetic latency data: real-time snapshots and historical series.

pub mod feed;
pub mod history;
pub mod realtime;

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Latency value marking a logical (topology-only) link.
pub const LOGICAL_LINK_LATENCY: f64 = -1.0;

/// One directed latency sample between two node ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatencyData {
    pub from: String,
    pub to: String,
    /// Round-trip time in milliseconds; negative only for logical links.
    pub latency: f64,
}

impl LatencyData {
    pub fn new(from: impl Into<String>, to: impl Into<String>, latency: f64) -> Self {
        Self { from: from.into(), to: to.into(), latency }
    }

    pub fn is_logical(&self) -> bool {
        self.latency < 0.0
    }
}

/// Complete set of links at one instant. Built once and shared read-only.
#[derive(Clone, Debug, Serialize)]
pub struct LatencySnapshot {
    pub generated_at: DateTime<Utc>,
    pub links: Vec<LatencyData>,
}

impl LatencySnapshot {
    pub fn average_latency(&self) -> f64 {
        if self.links.is_empty() {
            return 0.0;
        }
        self.links.iter().map(|l| l.latency).sum::<f64>() / self.links.len() as f64
    }
}

/// One point of a historical series.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoricalLatency {
    #[serde(serialize_with = "serialize_iso_millis")]
    pub time: DateTime<Utc>,
    pub latency: f64,
}

fn serialize_iso_millis<S: serde::Serializer>(time: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

/// Uniform draw ranges (ms) for the real-time generator.
#[derive(Clone, Debug, PartialEq)]
pub struct LatencyRanges {
    pub same_provider: Range<f64>,
    pub cross_provider: Range<f64>,
}

impl Default for LatencyRanges {
    fn default() -> Self {
        Self {
            same_provider: 30.0..50.0,
            cross_provider: 50.0..250.0,
        }
    }
}

impl LatencyRanges {
    /// Build ranges from `[low, high]` pairs, rejecting empty or non-positive spans.
    pub fn from_bounds(same: [f64; 2], cross: [f64; 2]) -> Result<Self> {
        Ok(Self {
            same_provider: checked_range(same)?,
            cross_provider: checked_range(cross)?,
        })
    }
}

fn checked_range([low, high]: [f64; 2]) -> Result<Range<f64>> {
    if !(low.is_finite() && high.is_finite()) || low <= 0.0 || high <= low {
        return Err(Error::InvalidRange(low, high));
    }
    Ok(low..high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn range_validation() {
        assert!(LatencyRanges::from_bounds([30.0, 50.0], [50.0, 250.0]).is_ok());
        assert!(matches!(
            LatencyRanges::from_bounds([0.0, 50.0], [50.0, 250.0]),
            Err(Error::InvalidRange(..))
        ));
        assert!(LatencyRanges::from_bounds([30.0, 50.0], [90.0, 90.0]).is_err());
        assert!(LatencyRanges::from_bounds([f64::NAN, 50.0], [50.0, 250.0]).is_err());
    }

    #[test]
    fn historical_time_serializes_like_a_browser_iso_string() {
        let sample = HistoricalLatency {
            time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            latency: 42.5,
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"time":"2024-03-01T12:30:00.000Z","latency":42.5}"#);
    }

    #[test]
    fn snapshot_average() {
        let snap = LatencySnapshot {
            generated_at: Utc::now(),
            links: vec![LatencyData::new("a", "b", 10.0), LatencyData::new("a", "c", 30.0)],
        };
        assert_eq!(snap.average_latency(), 20.0);
    }
}
