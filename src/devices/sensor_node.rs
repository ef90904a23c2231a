use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ApiError, Result, build_client, get};
use crate::air_quality::{self, SeverityLabel};

/// Relay state as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayState {
    On,
    Off,
    /// Anything the firmware sent that is not ON/OFF, with surrounding whitespace removed.
    Unknown(String),
}

impl RelayState {
    /// Firmware casing is not guaranteed, so the match ignores case and padding.
    pub fn parse(raw: &str) -> RelayState {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("on") {
            RelayState::On
        } else if trimmed.eq_ignore_ascii_case("off") {
            RelayState::Off
        } else {
            RelayState::Unknown(trimmed.to_string())
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, RelayState::On)
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayState::On => f.write_str("ON"),
            RelayState::Off => f.write_str("OFF"),
            RelayState::Unknown(raw) if raw.is_empty() => f.write_str("UNKNOWN"),
            RelayState::Unknown(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for RelayState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One sample exactly as the node reports it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawTelemetry {
    pub gas: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub relay_status: RelayState,
}

// Wire shape: { "success": true, "data": { "Gas": .., "Humidity": .., "RelayStatus": .., "Temperature": .. } }
#[derive(Deserialize)]
struct SensorsResponse {
    success: bool,
    data: SensorsData,
}

#[derive(Deserialize)]
struct SensorsData {
    #[serde(rename = "Gas")]
    gas: f64,
    #[serde(rename = "Humidity")]
    humidity: f64,
    #[serde(rename = "Temperature")]
    temperature: f64,
    #[serde(rename = "RelayStatus", default)]
    relay_status: String,
}

/// Validates a sensors response body.
///
/// `success` must be `true`; gas, temperature and humidity must be numbers.
/// A missing `RelayStatus` becomes `RelayState::Unknown("")`.
pub fn parse_payload(body: &str) -> Result<RawTelemetry> {
    let response: SensorsResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;

    if !response.success {
        return Err(ApiError::Parse("sensor node reported success=false".to_string()));
    }

    let data = response.data;
    Ok(RawTelemetry {
        gas: data.gas,
        temperature: data.temperature,
        humidity: data.humidity,
        relay_status: RelayState::parse(&data.relay_status),
    })
}

/// Pollutant profile for one sample, recomputed on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedReading {
    pub aqi: u16,
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    pub o3: f64,
    pub co: f64,
    pub so2: f64,
    pub status: SeverityLabel,
    #[serde(serialize_with = "crate::timestamp::serialize")]
    pub timestamp: DateTime<Utc>,
}

impl DerivedReading {
    pub fn from_telemetry(telemetry: &RawTelemetry, timestamp: DateTime<Utc>) -> Self {
        let p = air_quality::derive(telemetry.gas, telemetry.temperature, telemetry.humidity);
        DerivedReading {
            aqi: p.aqi,
            pm25: p.pm25,
            pm10: p.pm10,
            no2: p.no2,
            o3: p.o3,
            co: p.co,
            so2: p.so2,
            status: air_quality::classify(p.aqi as f64),
            timestamp,
        }
    }

    pub fn pollutants(&self) -> air_quality::Pollutants {
        air_quality::Pollutants {
            aqi: self.aqi,
            pm25: self.pm25,
            pm10: self.pm10,
            no2: self.no2,
            o3: self.o3,
            co: self.co,
            so2: self.so2,
        }
    }
}

/// Raw sample together with what was derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub telemetry: RawTelemetry,
    pub reading: DerivedReading,
}

/// HTTP client for the sensor node's telemetry endpoint.
pub struct SensorNode {
    client: Client,
    url: String,
}

impl SensorNode {
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self> {
        info!("Initializing sensor node client for {}", url);
        Ok(SensorNode {
            client: build_client(timeout)?,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches and derives one sample. Exactly one request, no retries.
    pub fn fetch(&self) -> Result<Snapshot> {
        let (_, body) = get(&self.client, &self.url)?;
        let telemetry = parse_payload(&body).map_err(|e| {
            warn!("Rejected payload from {}: {}", self.url, e);
            e
        })?;
        debug!("Telemetry from {}: {:?}", self.url, telemetry);

        let reading = DerivedReading::from_telemetry(&telemetry, Utc::now());
        info!(
            "Sample: gas={} temp={}°C humidity={}% -> AQI {} ({})",
            telemetry.gas, telemetry.temperature, telemetry.humidity, reading.aqi, reading.status
        );
        Ok(Snapshot { telemetry, reading })
    }

    pub fn fetch_reading(&self) -> Result<DerivedReading> {
        self.fetch().map(|snapshot| snapshot.reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::stub::StubDevice;

    const SAMPLE: &str =
        r#"{"success":true,"data":{"Gas":2048,"Humidity":50,"RelayStatus":"ON","Temperature":25}}"#;

    #[test]
    fn test_parse_payload() {
        let t = parse_payload(SAMPLE).unwrap();
        assert_eq!(t.gas, 2048.0);
        assert_eq!(t.temperature, 25.0);
        assert_eq!(t.humidity, 50.0);
        assert_eq!(t.relay_status, RelayState::On);
    }

    #[test]
    fn test_parse_payload_rejects_missing_fields() {
        let body = r#"{"success":true,"data":{"Humidity":50,"RelayStatus":"ON","Temperature":25}}"#;
        let err = parse_payload(body).unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
        assert!(err.to_string().contains("Gas"));
    }

    #[test]
    fn test_parse_payload_rejects_wrong_types_and_garbage() {
        let body = r#"{"success":true,"data":{"Gas":"high","Humidity":50,"Temperature":25}}"#;
        assert!(matches!(parse_payload(body), Err(ApiError::Parse(_))));
        assert!(matches!(parse_payload("<html>oops</html>"), Err(ApiError::Parse(_))));
        assert!(matches!(parse_payload(r#"{"data":{}}"#), Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_parse_payload_rejects_unsuccessful_response() {
        let body = r#"{"success":false,"data":{"Gas":1,"Humidity":50,"Temperature":25}}"#;
        assert!(matches!(parse_payload(body), Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_missing_relay_status_defaults_to_unknown() {
        let body = r#"{"success":true,"data":{"Gas":100,"Humidity":40,"Temperature":22}}"#;
        let t = parse_payload(body).unwrap();
        assert_eq!(t.relay_status, RelayState::Unknown(String::new()));
        assert_eq!(t.relay_status.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_relay_state_parsing() {
        assert_eq!(RelayState::parse("ON"), RelayState::On);
        assert_eq!(RelayState::parse(" off\n"), RelayState::Off);
        assert_eq!(RelayState::parse("On"), RelayState::On);
        assert_eq!(RelayState::parse("TRIPPED"), RelayState::Unknown("TRIPPED".into()));
        assert_eq!(RelayState::parse("  Tripped\r\n"), RelayState::Unknown("Tripped".into()));
    }

    #[test]
    fn test_reading_from_telemetry() {
        let t = parse_payload(SAMPLE).unwrap();
        let now = Utc::now();
        let r = DerivedReading::from_telemetry(&t, now);
        assert_eq!(r.aqi, 250);
        assert_eq!(r.pm25, 125.0);
        assert_eq!(r.pm10, 200.0);
        assert_eq!(r.status, SeverityLabel::VeryUnhealthy);
        assert_eq!(r.timestamp, now);
        assert_eq!(r.pollutants(), air_quality::derive(2048.0, 25.0, 50.0));
    }

    #[test]
    fn test_reading_serializes_iso_timestamp() {
        let t = parse_payload(SAMPLE).unwrap();
        let ts = DateTime::parse_from_rfc3339("2025-10-22T08:30:00Z").unwrap().with_timezone(&Utc);
        let json = serde_json::to_value(DerivedReading::from_telemetry(&t, ts)).unwrap();
        assert_eq!(json["timestamp"], "2025-10-22T08:30:00.000Z");
        assert_eq!(json["status"], "Very Unhealthy");
    }

    #[test]
    fn test_fetch_from_node() {
        let device = StubDevice::start(&[("/sensors", 200, SAMPLE)]);
        let node = SensorNode::new(&device.url("/sensors"), None).unwrap();

        let snapshot = node.fetch().unwrap();
        assert_eq!(snapshot.reading.aqi, 250);
        assert_eq!(snapshot.telemetry.relay_status, RelayState::On);
        assert_eq!(device.hits(), vec![("GET".to_string(), "/sensors".to_string())]);
    }

    #[test]
    fn test_fetch_http_500_is_network_error() {
        let device = StubDevice::start(&[("/sensors", 500, r#"{"error":"boom"}"#)]);
        let node = SensorNode::new(&device.url("/sensors"), None).unwrap();

        let err = node.fetch_reading().unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_fetch_malformed_body_is_parse_error() {
        let device = StubDevice::start(&[("/sensors", 200, r#"{"success":true}"#)]);
        let node = SensorNode::new(&device.url("/sensors"), None).unwrap();

        assert!(matches!(node.fetch(), Err(ApiError::Parse(_))));
    }
}
