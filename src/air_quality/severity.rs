use serde::{Deserialize, Serialize};
use std::fmt;

/// AQI severity buckets, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityLabel {
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    #[serde(rename = "Unhealthy")]
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    #[serde(rename = "Hazardous")]
    Hazardous,
}

// Inclusive upper bound of each bucket; anything above the last is Hazardous.
const BUCKETS: [(f64, SeverityLabel); 5] = [
    (50.0, SeverityLabel::Good),
    (100.0, SeverityLabel::Moderate),
    (150.0, SeverityLabel::UnhealthyForSensitiveGroups),
    (200.0, SeverityLabel::Unhealthy),
    (300.0, SeverityLabel::VeryUnhealthy),
];

/// Maps an AQI or PM2.5-equivalent value onto its severity bucket.
///
/// Total over `f64`: negatives are `Good`, NaN falls through to `Hazardous`.
pub fn classify(value: f64) -> SeverityLabel {
    BUCKETS
        .iter()
        .find(|(upper, _)| value <= *upper)
        .map(|(_, label)| *label)
        .unwrap_or(SeverityLabel::Hazardous)
}

impl SeverityLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            SeverityLabel::Good => "Good",
            SeverityLabel::Moderate => "Moderate",
            SeverityLabel::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            SeverityLabel::Unhealthy => "Unhealthy",
            SeverityLabel::VeryUnhealthy => "Very Unhealthy",
            SeverityLabel::Hazardous => "Hazardous",
        }
    }

    /// Marker colour used on the station map.
    pub fn color_hex(self) -> &'static str {
        match self {
            SeverityLabel::Good => "#10b981",
            SeverityLabel::Moderate => "#f59e0b",
            SeverityLabel::UnhealthyForSensitiveGroups => "#f97316",
            SeverityLabel::Unhealthy => "#ef4444",
            SeverityLabel::VeryUnhealthy => "#9333ea",
            SeverityLabel::Hazardous => "#7f1d1d",
        }
    }

    pub fn health_advice(self) -> &'static str {
        match self {
            SeverityLabel::Good => "Air quality is satisfactory.",
            SeverityLabel::Moderate => "Unusually sensitive people should limit prolonged outdoor exertion.",
            SeverityLabel::UnhealthyForSensitiveGroups => {
                "Limit prolonged outdoor activities, especially for sensitive groups."
            }
            SeverityLabel::Unhealthy => "Reduce outdoor activity and run the air purifier.",
            SeverityLabel::VeryUnhealthy => "Avoid outdoor activity; keep windows closed.",
            SeverityLabel::Hazardous => {
                "Stay indoors, use air purifiers, wear N95 masks if going outside."
            }
        }
    }
}

impl fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
