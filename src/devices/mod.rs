pub mod relay;
pub mod sensor_node;

pub use relay::{Relay, RelayAck, RelayCommand};
pub use sensor_node::{DerivedReading, RawTelemetry, RelayState, SensorNode, Snapshot};

use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: HTTP status {status}")]
    Http { status: u16 },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// True for both non-2xx responses and transport failures.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Http { .. } | ApiError::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Parse(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// `None` leaves requests without a deadline.
fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(client)
}

/// Issues one GET and returns the status and body of a 2xx response.
fn get(client: &Client, url: &str) -> Result<(u16, String)> {
    info!("GET {}", url);
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()?;

    let status = response.status();
    if !status.is_success() {
        error!("GET {} failed with HTTP status {}", url, status.as_u16());
        return Err(ApiError::Http { status: status.as_u16() });
    }

    let body = response.text()?;
    info!("GET {} -> {} ({} bytes)", url, status.as_u16(), body.len());
    Ok((status.as_u16(), body))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let http = ApiError::Http { status: 503 };
        assert!(http.is_network());
        assert_eq!(http.status(), Some(503));

        let parse = ApiError::Parse("missing field `Gas`".into());
        assert!(!parse.is_network());
        assert_eq!(parse.status(), None);
        assert_eq!(parse.to_string(), "Parse error: missing field `Gas`");
    }

    #[test]
    fn test_transport_failure_is_network_error() {
        let client = build_client(Some(Duration::from_secs(2))).unwrap();
        // port 9 on loopback is the discard service; nothing listens there in CI
        let err = get(&client, "http://127.0.0.1:9/sensors").unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(err.is_network());
    }
}
