use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::{ApiError, Result, build_client, get};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayCommand {
    On,
    Off,
}

impl FromStr for RelayCommand {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(RelayCommand::On),
            "off" => Ok(RelayCommand::Off),
            other => Err(ApiError::Parse(format!("Invalid relay command: {other}. Expected 'on' or 'off'."))),
        }
    }
}

impl fmt::Display for RelayCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayCommand::On => f.write_str("on"),
            RelayCommand::Off => f.write_str("off"),
        }
    }
}

/// Acknowledgement returned by the relay endpoint.
///
/// Only the 2xx status is meaningful; the body is kept for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayAck {
    pub command: RelayCommand,
    pub status: u16,
    pub body: Value,
}

/// Remote relay driving the purifier. Holds no state about the relay itself.
pub struct Relay {
    client: Client,
    on_url: String,
    off_url: String,
}

impl Relay {
    pub fn new(on_url: &str, off_url: &str, timeout: Option<Duration>) -> Result<Self> {
        info!("Initializing relay client (on: {}, off: {})", on_url, off_url);
        Ok(Relay {
            client: build_client(timeout)?,
            on_url: on_url.to_string(),
            off_url: off_url.to_string(),
        })
    }

    pub fn endpoint(&self, command: RelayCommand) -> &str {
        match command {
            RelayCommand::On => &self.on_url,
            RelayCommand::Off => &self.off_url,
        }
    }

    /// Sends one GET to the command's endpoint. Success means a 2xx reply,
    /// not that the relay actually switched.
    pub fn set(&self, command: RelayCommand) -> Result<RelayAck> {
        info!("Switching relay {}", command);
        let (status, body) = get(&self.client, self.endpoint(command))?;
        let ack = RelayAck { command, status, body: ack_body(&body) };
        info!("Relay {} acknowledged with HTTP {}", command, status);
        Ok(ack)
    }

    pub fn turn_on(&self) -> Result<RelayAck> {
        self.set(RelayCommand::On)
    }

    pub fn turn_off(&self) -> Result<RelayAck> {
        self.set(RelayCommand::Off)
    }
}

fn ack_body(body: &str) -> Value {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|e| {
        debug!("Relay acknowledgement is not JSON ({}), keeping raw text", e);
        Value::String(trimmed.to_string())
    })
}
