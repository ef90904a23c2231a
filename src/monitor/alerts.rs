use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::devices::{RelayState, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub pm25_warning: f64,  // µg/m³
    pub pm25_critical: f64, // µg/m³
    pub gas_high: f64,      // raw ADC
    pub gas_hazardous: f64, // raw ADC
    pub temperature_high: f64, // °C
}

impl Default for AlertThresholds {
    fn default() -> Self {
        AlertThresholds {
            pm25_warning: 60.0,
            pm25_critical: 150.0,
            gas_high: 3000.0,
            gas_hazardous: 4000.0,
            temperature_high: 35.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AlertSeverity {
    Info,
    Low,
    Moderate,
    Severe,
    Hazardous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertKind {
    PollutionExceeded,
    AirQualityWarning,
    GasDetection,
    Environmental,
    DeviceStatus,
}

impl AlertKind {
    fn id_prefix(self) -> &'static str {
        match self {
            AlertKind::PollutionExceeded | AlertKind::GasDetection => "ALERT",
            AlertKind::AirQualityWarning => "WARN",
            AlertKind::Environmental => "INFO",
            AlertKind::DeviceStatus => "STATUS",
        }
    }
}

/// Caller-owned counter behind alert ids.
#[derive(Debug, Clone, Default)]
pub struct AlertSequence {
    next: u32,
}

impl AlertSequence {
    pub fn starting_at(next: u32) -> Self {
        AlertSequence { next }
    }

    fn next_id(&mut self, kind: AlertKind, at: DateTime<Utc>) -> String {
        self.next += 1;
        format!("{}-{}-{:03}", kind.id_prefix(), at.year(), self.next)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub measured: Option<String>,
    pub threshold: Option<String>,
    #[serde(serialize_with = "crate::timestamp::serialize")]
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:?}: {} - {}", self.id, self.severity, self.title, self.message)
    }
}

/// Notifications raised by one snapshot, most urgent checks first.
pub fn evaluate_alerts(
    snapshot: &Snapshot,
    thresholds: &AlertThresholds,
    sequence: &mut AlertSequence,
) -> Vec<Alert> {
    let reading = &snapshot.reading;
    let telemetry = &snapshot.telemetry;
    let at = reading.timestamp;
    let mut alerts = Vec::new();

    let mut push = |kind: AlertKind,
                    severity: AlertSeverity,
                    title: String,
                    message: String,
                    measured: Option<String>,
                    threshold: Option<String>| {
        alerts.push(Alert {
            id: sequence.next_id(kind, at),
            kind,
            severity,
            title,
            message,
            measured,
            threshold,
            timestamp: at,
        });
    };

    if reading.pm25 > thresholds.pm25_critical {
        let severity = if reading.aqi > 300 {
            AlertSeverity::Hazardous
        } else if reading.aqi > 200 {
            AlertSeverity::Severe
        } else {
            AlertSeverity::Moderate
        };
        push(
            AlertKind::PollutionExceeded,
            severity,
            "Critical PM2.5 Level".to_string(),
            format!("PM2.5 levels have reached {:.1} µg/m³, exceeding safe limits.", reading.pm25),
            Some(format!("{:.1} µg/m³", reading.pm25)),
            Some(format!("Safe ≤ {} µg/m³", thresholds.pm25_warning)),
        );
    } else if reading.pm25 > thresholds.pm25_warning {
        push(
            AlertKind::AirQualityWarning,
            AlertSeverity::Moderate,
            "Elevated PM2.5 Detected".to_string(),
            format!("PM2.5 levels are at {:.1} µg/m³, above recommended limits.", reading.pm25),
            Some(format!("{:.1} µg/m³", reading.pm25)),
            Some(format!("Recommended ≤ {} µg/m³", thresholds.pm25_warning)),
        );
    }

    if telemetry.gas > thresholds.gas_high {
        let severity = if telemetry.gas > thresholds.gas_hazardous {
            AlertSeverity::Hazardous
        } else {
            AlertSeverity::Severe
        };
        push(
            AlertKind::GasDetection,
            severity,
            "High Gas Concentration".to_string(),
            format!("Gas sensor reading is {}, indicating poor air quality.", telemetry.gas),
            Some(telemetry.gas.to_string()),
            Some(format!("Normal ≤ {}", thresholds.gas_high)),
        );
    }

    if telemetry.temperature > thresholds.temperature_high {
        push(
            AlertKind::Environmental,
            AlertSeverity::Low,
            "High Temperature Alert".to_string(),
            format!(
                "Temperature has reached {:.1}°C, which may affect air quality.",
                telemetry.temperature
            ),
            Some(format!("{:.1}°C", telemetry.temperature)),
            None,
        );
    }

    if telemetry.relay_status != RelayState::Unknown(String::new()) {
        push(
            AlertKind::DeviceStatus,
            AlertSeverity::Info,
            format!("Relay Status: {}", telemetry.relay_status),
            format!("Air purification relay is currently {}.", telemetry.relay_status),
            None,
            None,
        );
    }

    alerts
}
