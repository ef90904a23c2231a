//! Client side of the AirPulse air-quality node.
//!
//! The node exposes a raw gas-sensor reading plus temperature and humidity
//! over HTTP, and a relay (normally an air purifier) that can be switched
//! on or off. This crate fetches those readings, derives the synthetic
//! pollutant profile and AQI from them, classifies the result, and drives
//! the relay. Presentation is left to the caller; `monitor` is a ready-made
//! polling session for command-line use.

pub mod air_quality;
pub mod config;
pub mod devices;
pub mod logging;
pub mod monitor;
pub mod timestamp;

pub use air_quality::{Pollutant, Pollutants, SeverityLabel, classify, derive};
pub use config::ApiConfig;
pub use devices::{
    ApiError, DerivedReading, RawTelemetry, Relay, RelayAck, RelayCommand, RelayState, SensorNode,
    Snapshot,
};
