use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://10.96.203.117:3000/";

pub const ENV_BASE_URL: &str = "AIRPULSE_API_BASE_URL";
pub const ENV_SENSORS: &str = "AIRPULSE_API_SENSORS";
pub const ENV_RELAY_ON: &str = "AIRPULSE_API_RELAY_ON";
pub const ENV_RELAY_OFF: &str = "AIRPULSE_API_RELAY_OFF";

/// Endpoints of the sensor node API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub sensors_url: String,
    pub relay_on_url: String,
    pub relay_off_url: String,
    /// Per-request deadline; `None` means requests may wait indefinitely.
    #[serde(default, with = "opt_secs")]
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig::from_base_url(DEFAULT_BASE_URL)
    }
}

impl ApiConfig {
    pub fn from_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        ApiConfig {
            sensors_url: format!("{base}/sensors"),
            relay_on_url: format!("{base}/relay/on"),
            relay_off_url: format!("{base}/relay/off"),
            timeout: None,
        }
    }

    /// Builds the configuration from `lookup`, which maps a variable name to its value.
    ///
    /// Values are trimmed and blank ones ignored. Per-endpoint variables win
    /// over the base URL.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| non_blank(lookup(key));

        let mut config = match value(ENV_BASE_URL) {
            Some(base) => ApiConfig::from_base_url(&base),
            None => ApiConfig::default(),
        };
        if let Some(url) = value(ENV_SENSORS) {
            config.sensors_url = url;
        }
        if let Some(url) = value(ENV_RELAY_ON) {
            config.relay_on_url = url;
        }
        if let Some(url) = value(ENV_RELAY_OFF) {
            config.relay_off_url = url;
        }
        config
    }

    /// Like [`ApiConfig::from_lookup`], reading `overrides` first and
    /// `fallback` for keys the overrides leave unset or blank.
    pub fn from_layers<O, F>(overrides: O, fallback: F) -> Self
    where
        O: Fn(&str) -> Option<String>,
        F: Fn(&str) -> Option<String>,
    {
        ApiConfig::from_lookup(|key| non_blank(overrides(key)).or_else(|| fallback(key)))
    }

    /// Explicit values (e.g. command-line flags) over the environment over defaults.
    pub fn from_env_with<O>(overrides: O) -> Self
    where
        O: Fn(&str) -> Option<String>,
    {
        ApiConfig::from_layers(overrides, |key| std::env::var(key).ok())
    }

    pub fn from_env() -> Self {
        ApiConfig::from_env_with(|_| None)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

mod opt_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<f64>::deserialize(deserializer)?;
        Ok(secs.filter(|s| *s > 0.0).map(Duration::from_secs_f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_endpoints() {
        let config = ApiConfig::default();
        assert_eq!(config.sensors_url, "http://10.96.203.117:3000/sensors");
        assert_eq!(config.relay_on_url, "http://10.96.203.117:3000/relay/on");
        assert_eq!(config.relay_off_url, "http://10.96.203.117:3000/relay/off");
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_base_url_without_trailing_slash() {
        let config = ApiConfig::from_base_url("http://node.local:8080");
        assert_eq!(config.sensors_url, "http://node.local:8080/sensors");
    }

    #[test]
    fn test_endpoint_variables_override_base() {
        let config = ApiConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://192.168.4.1/"),
            (ENV_RELAY_OFF, "http://192.168.4.2/off"),
            (ENV_SENSORS, "  "),
        ]));
        assert_eq!(config.sensors_url, "http://192.168.4.1/sensors");
        assert_eq!(config.relay_on_url, "http://192.168.4.1/relay/on");
        assert_eq!(config.relay_off_url, "http://192.168.4.2/off");
    }

    #[test]
    fn test_lookup_values_are_trimmed() {
        let config = ApiConfig::from_lookup(lookup(&[(ENV_SENSORS, " http://node/s \n")]));
        assert_eq!(config.sensors_url, "http://node/s");
    }

    #[test]
    fn test_overrides_win_over_fallback() {
        let env = lookup(&[
            (ENV_BASE_URL, "http://env-node/"),
            (ENV_RELAY_ON, "http://env-node/on"),
        ]);
        let flags = lookup(&[(ENV_BASE_URL, "http://flag-node")]);
        let config = ApiConfig::from_layers(flags, env);
        assert_eq!(config.sensors_url, "http://flag-node/sensors");
        assert_eq!(config.relay_on_url, "http://env-node/on");
        assert_eq!(config.relay_off_url, "http://flag-node/relay/off");
    }

    #[test]
    fn test_blank_override_falls_through() {
        let env = lookup(&[(ENV_SENSORS, "http://env-node/sensors")]);
        let flags = lookup(&[(ENV_SENSORS, "   ")]);
        let config = ApiConfig::from_layers(flags, env);
        assert_eq!(config.sensors_url, "http://env-node/sensors");

        let config = ApiConfig::from_layers(lookup(&[(ENV_SENSORS, "  ")]), lookup(&[]));
        assert_eq!(config, ApiConfig::default());
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(ApiConfig::from_lookup(lookup(&[])), ApiConfig::default());
    }

    #[test]
    fn test_config_json_timeout() {
        let json = r#"{"sensors_url":"a","relay_on_url":"b","relay_off_url":"c","timeout":2.5}"#;
        let config: ApiConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));

        let json = r#"{"sensors_url":"a","relay_on_url":"b","relay_off_url":"c"}"#;
        let config: ApiConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeout, None);
    }
}
