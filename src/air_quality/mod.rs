//! Synthetic pollutant profile derived from a single gas-sensor reading.
//!
//! The node only carries one resistive gas sensor sampled by a 12-bit ADC.
//! Everything shown on the dashboard (AQI and the six pollutant estimates) is
//! scaled out of that one value, nudged by temperature and humidity.

pub mod severity;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use severity::{SeverityLabel, classify};

/// Full scale of the gas sensor ADC.
pub const GAS_ADC_MAX: f64 = 4095.0;
/// Upper end of the AQI scale.
pub const AQI_MAX: u16 = 500;

/// Pollutant estimates computed from one telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pollutants {
    pub aqi: u16,
    pub pm25: f64, // µg/m³
    pub pm10: f64, // µg/m³
    pub no2: f64,  // ppb
    pub o3: f64,   // ppb
    pub co: f64,   // ppm
    pub so2: f64,  // ppb
}

impl Pollutants {
    pub fn get(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
            Pollutant::No2 => self.no2,
            Pollutant::O3 => self.o3,
            Pollutant::Co => self.co,
            Pollutant::So2 => self.so2,
        }
    }

    /// Label for one pollutant's raw value on the AQI ladder, as the gauges show it.
    pub fn severity(&self, pollutant: Pollutant) -> SeverityLabel {
        classify(self.get(pollutant))
    }
}

/// Pollutants shown on the dashboard gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    Pm25,
    Pm10,
    No2,
    O3,
    Co,
    So2,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::Co,
        Pollutant::So2,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO2",
            Pollutant::O3 => "O3",
            Pollutant::Co => "CO",
            Pollutant::So2 => "SO2",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Pollutant::Pm25 | Pollutant::Pm10 => "µg/m³",
            Pollutant::No2 | Pollutant::O3 | Pollutant::So2 => "ppb",
            Pollutant::Co => "ppm",
        }
    }

    /// Value at which the dashboard gauge reads 100%.
    pub fn gauge_max(self) -> f64 {
        match self {
            Pollutant::Pm25 => 60.0,
            Pollutant::Pm10 => 100.0,
            Pollutant::No2 => 200.0,
            Pollutant::O3 => 180.0,
            Pollutant::Co => 10.0,
            Pollutant::So2 => 80.0,
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rounds half-way cases towards positive infinity, so `-2.5` becomes `-2`.
///
/// The dashboard figures were historically produced with this rule;
/// `f64::round` differs on negative halves.
pub fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

fn round_tenth(x: f64) -> f64 {
    round_half_up(x * 10.0) / 10.0
}

/// Rescales the raw ADC value onto the AQI range, clamped to `[0, 500]`.
///
/// A NaN reading saturates to 0.
pub fn gas_to_aqi(gas: f64) -> u16 {
    let scaled = round_half_up((gas / GAS_ADC_MAX) * AQI_MAX as f64);
    scaled.clamp(0.0, AQI_MAX as f64) as u16
}

/// Derives the pollutant profile from one raw sample.
///
/// Pure: identical input always yields identical output. `pm10` is chained
/// off the already rounded `pm25`; every other value scales from `aqi`.
/// Temperature and humidity factors are not clamped.
pub fn derive(gas: f64, temperature: f64, humidity: f64) -> Pollutants {
    let aqi = gas_to_aqi(gas);
    let ratio = aqi as f64 / AQI_MAX as f64;

    let pm25 = round_tenth(ratio * 250.0);
    let pm10 = round_tenth(pm25 * 1.6);

    let temp_factor = temperature / 30.0;
    let humidity_factor = humidity / 100.0;

    let no2 = round_tenth(ratio * 100.0 * (1.0 + temp_factor * 0.3));
    let o3 = round_tenth(ratio * 120.0 * (1.0 - humidity_factor * 0.2));
    let co = round_tenth(ratio * 15.0 * (1.0 + temp_factor * 0.4));
    let so2 = round_tenth(ratio * 80.0 * (1.0 + humidity_factor * 0.1));

    Pollutants { aqi, pm25, pm10, no2, o3, co, so2 }
}

/// Share of the gauge filled by `value`, capped at 100.
pub fn gauge_percentage(value: f64, max: f64) -> u8 {
    let pct = round_half_up((value / max) * 100.0).min(100.0);
    pct.max(0.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aqi_tracks_gas_over_full_adc_range() {
        for raw in 0..=4095u16 {
            let gas = raw as f64;
            let aqi = gas_to_aqi(gas);
            assert_eq!(aqi as f64, ((gas / 4095.0) * 500.0).round(), "gas {raw}");
            assert!(aqi <= 500);
        }
    }

    #[test]
    fn test_aqi_endpoints() {
        assert_eq!(gas_to_aqi(0.0), 0);
        assert_eq!(gas_to_aqi(4095.0), 500);
    }

    #[test]
    fn test_aqi_is_clamped_outside_adc_range() {
        assert_eq!(gas_to_aqi(9000.0), 500);
        assert_eq!(gas_to_aqi(-300.0), 0);
        assert_eq!(gas_to_aqi(f64::NAN), 0);
    }

    #[test]
    fn test_reference_sample() {
        let p = derive(2048.0, 25.0, 50.0);
        assert_eq!(p.aqi, 250);
        assert_eq!(p.pm25, 125.0);
        assert_eq!(p.pm10, 200.0);
        assert_eq!(p.no2, 62.5);
        assert_eq!(p.o3, 54.0);
        assert_eq!(p.co, 10.0);
        assert_eq!(p.so2, 42.0);
    }

    #[test]
    fn test_pm10_chains_from_rounded_pm25() {
        for raw in (0..=4095u16).step_by(7) {
            let p = derive(raw as f64, 21.0, 40.0);
            assert_eq!(p.pm10, round_half_up(p.pm25 * 1.6 * 10.0) / 10.0);
        }
    }

    #[test]
    fn test_zero_gas_gives_clean_air() {
        let p = derive(0.0, 40.0, 90.0);
        assert_eq!(p.aqi, 0);
        for pollutant in Pollutant::ALL {
            assert_eq!(p.get(pollutant), 0.0, "{pollutant}");
        }
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = derive(1234.0, 18.5, 63.0);
        let b = derive(1234.0, 18.5, 63.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_extreme_ambient_factors_are_not_clamped() {
        // humidity 600% flips the ozone factor negative
        let p = derive(4095.0, 25.0, 600.0);
        assert!(p.o3 < 0.0);
        let p = derive(4095.0, f64::NAN, 50.0);
        assert!(p.no2.is_nan());
        assert!(p.co.is_nan());
        assert_eq!(p.pm25, 250.0);
    }

    #[test]
    fn test_round_half_up_matches_reference_rule() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
        assert_eq!(round_half_up(0.49999999999999994), 0.0);
    }

    #[test]
    fn test_gauge_percentage() {
        assert_eq!(gauge_percentage(30.0, 60.0), 50);
        assert_eq!(gauge_percentage(125.0, 60.0), 100);
        assert_eq!(gauge_percentage(0.0, 10.0), 0);
        assert_eq!(gauge_percentage(Pollutant::Co.gauge_max(), Pollutant::Co.gauge_max()), 100);
    }

    #[test]
    fn test_per_pollutant_severity() {
        let p = derive(2048.0, 25.0, 50.0);
        assert_eq!(p.severity(Pollutant::Pm25), SeverityLabel::UnhealthyForSensitiveGroups);
        assert_eq!(p.severity(Pollutant::Pm10), SeverityLabel::Unhealthy);
        assert_eq!(p.severity(Pollutant::No2), SeverityLabel::Moderate);
        assert_eq!(p.severity(Pollutant::Co), SeverityLabel::Good);
        assert_eq!(classify(p.aqi as f64), SeverityLabel::VeryUnhealthy);
    }
}
