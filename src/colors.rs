use crate::ai::flows::Severity;
use crate::scene::LatencyBucket;
use crate::terminal::rgb;
use crate::topology::Provider;
use crossterm::style::Color;

/// Number of base color schemes for the graticule and coastline.
pub const SCHEME_COUNT: u8 = 4;

/// Marker color for a cloud provider.
pub fn provider_color(provider: Provider) -> Color {
    match provider {
        Provider::Aws => rgb(0xFF, 0x99, 0x00),
        Provider::Gcp => rgb(0x42, 0x85, 0xF4),
        Provider::Azure => rgb(0x00, 0x78, 0xD4),
        Provider::Other => rgb(0x9E, 0x9E, 0x9E),
    }
}

/// Arc and pulse color for a latency bucket.
pub fn bucket_color(bucket: LatencyBucket) -> Color {
    match bucket {
        LatencyBucket::Logical => rgb(0xA8, 0x55, 0xF7),
        LatencyBucket::Low => Color::Green,
        LatencyBucket::Medium => Color::Yellow,
        LatencyBucket::High => Color::Red,
    }
}

/// Get color from scheme based on intensity (0-3)
pub fn scheme_color(scheme: u8, intensity: u8, bold: bool) -> (Color, bool) {
    match scheme {
        1 => match intensity {  // ice
            0 => (Color::DarkBlue, false),
            1 => (Color::Blue, false),
            2 => (Color::Cyan, bold),
            _ => (Color::Cyan, true),
        },
        2 => match intensity {  // mono
            0 => (Color::DarkGrey, false),
            1 => (Color::Grey, false),
            2 => (Color::White, bold),
            _ => (Color::White, true),
        },
        3 => match intensity {  // gold
            0 => (Color::DarkYellow, false),
            1 => (Color::Yellow, false),
            2 => (Color::Yellow, bold),
            _ => (Color::AnsiValue(11), true),
        },
        _ => match intensity {  // green
            0 => (Color::DarkGreen, false),
            1 => (Color::Green, false),
            2 => (Color::Green, true),
            _ => (Color::AnsiValue(10), true),
        },
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusColor {
    Good,
    Warning,
    Critical,
    Info,
    Muted,
}

impl StatusColor {
    pub fn color(self) -> Color {
        match self {
            StatusColor::Good => Color::Green,
            StatusColor::Warning => Color::Yellow,
            StatusColor::Critical => Color::Red,
            StatusColor::Info => Color::Cyan,
            StatusColor::Muted => Color::DarkGrey,
        }
    }

    /// Status for a mean latency in milliseconds.
    pub fn for_latency(ms: f64) -> Self {
        match LatencyBucket::from_latency(ms) {
            LatencyBucket::Logical => StatusColor::Muted,
            LatencyBucket::Low => StatusColor::Good,
            LatencyBucket::Medium => StatusColor::Warning,
            LatencyBucket::High => StatusColor::Critical,
        }
    }

    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::High => StatusColor::Critical,
            Severity::Medium => StatusColor::Warning,
            Severity::Low => StatusColor::Info,
        }
    }
}
