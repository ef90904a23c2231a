use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::alerts::Alert;
use super::history::{History, SeriesSummary};
use crate::air_quality::Pollutant;
use crate::devices::{DerivedReading, Snapshot};
use crate::timestamp;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingRecord {
    pub timestamp: String, // UTC ISO timestamp
    pub gas: f64,          // raw ADC
    #[serde(rename = "temperature_C")]
    pub temperature: f64,
    #[serde(rename = "humidity_pct")]
    pub humidity: f64,
    pub relay_status: String,
    pub aqi: u16,
    #[serde(rename = "pm25_ugm3")]
    pub pm25: f64,
    #[serde(rename = "pm10_ugm3")]
    pub pm10: f64,
    #[serde(rename = "no2_ppb")]
    pub no2: f64,
    #[serde(rename = "o3_ppb")]
    pub o3: f64,
    #[serde(rename = "co_ppm")]
    pub co: f64,
    #[serde(rename = "so2_ppb")]
    pub so2: f64,
    pub status: String,
}

impl ReadingRecord {
    /// Column names, in field order, as serde writes them.
    pub const HEADERS: [&'static str; 13] = [
        "timestamp",
        "gas",
        "temperature_C",
        "humidity_pct",
        "relay_status",
        "aqi",
        "pm25_ugm3",
        "pm10_ugm3",
        "no2_ppb",
        "o3_ppb",
        "co_ppm",
        "so2_ppb",
        "status",
    ];
}

impl From<&Snapshot> for ReadingRecord {
    fn from(snapshot: &Snapshot) -> Self {
        let t = &snapshot.telemetry;
        let r = &snapshot.reading;
        ReadingRecord {
            timestamp: timestamp::iso8601(&r.timestamp),
            gas: t.gas,
            temperature: t.temperature,
            humidity: t.humidity,
            relay_status: t.relay_status.to_string(),
            aqi: r.aqi,
            pm25: r.pm25,
            pm10: r.pm10,
            no2: r.no2,
            o3: r.o3,
            co: r.co,
            so2: r.so2,
            status: r.status.to_string(),
        }
    }
}

/// Summary written at the end of a monitoring session.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(serialize_with = "crate::timestamp::serialize")]
    pub generated_at: DateTime<Utc>,
    pub sensors_url: String,
    pub sample_count: usize,
    pub failed_polls: usize,
    pub aqi: Option<SeriesSummary>,
    pub pollutants: BTreeMap<&'static str, SeriesSummary>,
    pub latest: Option<Snapshot>,
    pub alerts: Vec<Alert>,
}

impl Report {
    pub fn build(
        sensors_url: &str,
        history: &History<DerivedReading>,
        latest: Option<Snapshot>,
        sample_count: usize,
        failed_polls: usize,
        alerts: Vec<Alert>,
    ) -> Self {
        let pollutants = Pollutant::ALL
            .iter()
            .filter_map(|p| history.summary(*p).map(|s| (p.label(), s)))
            .collect();
        Report {
            generated_at: Utc::now(),
            sensors_url: sensors_url.to_string(),
            sample_count,
            failed_polls,
            aqi: history.aqi_summary(),
            pollutants,
            latest,
            alerts,
        }
    }
}
