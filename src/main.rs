use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use airpulse::air_quality::{self, Pollutant, gauge_percentage};
use airpulse::config::{ApiConfig, ENV_BASE_URL, ENV_RELAY_OFF, ENV_RELAY_ON, ENV_SENSORS};
use airpulse::devices::{Relay, RelayCommand, SensorNode};
use airpulse::logging::setup_logging;
use airpulse::monitor::{self, MonitorConfig};
use clap::{Parser, Subcommand};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "airpulse", version, about = "Air-quality node client and relay control")]
struct Cli {
    /// Base URL of the node API; endpoints default to <base>/sensors, <base>/relay/on, <base>/relay/off
    /// [env: AIRPULSE_API_BASE_URL]
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// [env: AIRPULSE_API_SENSORS]
    #[arg(long, global = true)]
    sensors_url: Option<String>,

    /// [env: AIRPULSE_API_RELAY_ON]
    #[arg(long, global = true)]
    relay_on_url: Option<String>,

    /// [env: AIRPULSE_API_RELAY_OFF]
    #[arg(long, global = true)]
    relay_off_url: Option<String>,

    /// Per-request timeout in seconds (default: none)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Directory for the rolling log file
    #[arg(long, default_value = "logs", global = true)]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one reading and print it as JSON
    Read,
    /// Switch the relay on or off
    Relay {
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
    /// Derive the pollutant profile from raw values without contacting the node
    Derive {
        #[arg(long, allow_negative_numbers = true)]
        gas: f64,
        #[arg(long, allow_negative_numbers = true)]
        temperature: f64,
        #[arg(long, allow_negative_numbers = true)]
        humidity: f64,
    },
    /// Poll the node, print each sample and alert, then export CSV and a JSON report
    Watch {
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
        /// Stop after this many polls (default: run until interrupted)
        #[arg(long)]
        samples: Option<usize>,
        /// Readings kept in the rolling summary window
        #[arg(long, default_value_t = 20)]
        history: usize,
        #[arg(long, default_value = "logs")]
        out: PathBuf,
    },
}

impl Cli {
    /// Flags over environment over defaults.
    fn api_config(&self) -> ApiConfig {
        let mut config = ApiConfig::from_env_with(|key| match key {
            ENV_BASE_URL => self.base_url.clone(),
            ENV_SENSORS => self.sensors_url.clone(),
            ENV_RELAY_ON => self.relay_on_url.clone(),
            ENV_RELAY_OFF => self.relay_off_url.clone(),
            _ => None,
        });
        config.timeout = self.timeout_secs.map(Duration::from_secs);
        config
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let _guard = setup_logging(&cli.log_dir);
    info!("Starting airpulse: {:?}", cli.command);

    let config = cli.api_config();
    let result = run(&cli.command, &config);
    if let Err(e) = &result {
        error!("Command failed: {}", e);
        eprintln!("ERROR: {}", e);
    }

    info!("Application shutting down");
    result
}

fn run(command: &Command, config: &ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Read => {
            let node = SensorNode::new(&config.sensors_url, config.timeout)?;
            let snapshot = node.fetch()?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }

        Command::Relay { state } => {
            let command: RelayCommand = state.parse()?;
            let relay = Relay::new(&config.relay_on_url, &config.relay_off_url, config.timeout)?;
            let ack = relay.set(command)?;
            println!("Relay turned {} (HTTP {})", ack.command, ack.status);
            println!("{}", serde_json::to_string_pretty(&ack.body)?);
        }

        Command::Derive { gas, temperature, humidity } => {
            let p = air_quality::derive(*gas, *temperature, *humidity);
            let status = air_quality::classify(p.aqi as f64);
            println!("AQI {:>3}  {} ({})", p.aqi, status, status.color_hex());
            for pollutant in Pollutant::ALL {
                let value = p.get(pollutant);
                println!(
                    "  {:<6} {:>7.1} {:<6} {:>3}%  {}",
                    pollutant.label(),
                    value,
                    pollutant.unit(),
                    gauge_percentage(value, pollutant.gauge_max()),
                    p.severity(pollutant)
                );
            }
            println!("{}", status.health_advice());
        }

        Command::Watch { interval_secs, samples, history, out } => {
            let node = SensorNode::new(&config.sensors_url, config.timeout)?;
            let monitor_config = MonitorConfig {
                interval: Duration::from_secs(*interval_secs),
                samples: *samples,
                history_len: *history,
                output_dir: out.clone(),
                ..MonitorConfig::default()
            };
            let stop = monitor::stop_on_ctrl_c()?;
            if samples.is_none() {
                println!("Polling {} every {}s, Ctrl-C to stop", node.url(), interval_secs);
            }

            let outcome = monitor::run_monitor(&node, &monitor_config, &stop, |snapshot, alerts, window| {
                let r = &snapshot.reading;
                let avg = window.aqi_summary().map(|s| s.average).unwrap_or(r.aqi as f64);
                println!(
                    "{}  AQI {:>3} ({})  PM2.5 {:.1}  PM10 {:.1}  {:.1}°C {:.0}%  relay {}  avg AQI {:.1}",
                    r.timestamp.format("%H:%M:%S"),
                    r.aqi,
                    r.status,
                    r.pm25,
                    r.pm10,
                    snapshot.telemetry.temperature,
                    snapshot.telemetry.humidity,
                    snapshot.telemetry.relay_status,
                    avg
                );
                for alert in alerts {
                    println!("    {}", alert);
                }
                if stop.load(Ordering::SeqCst) {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })?;

            println!(
                "{} polls ({} failed). Readings: {}, report: {}",
                outcome.polls,
                outcome.failed_polls,
                outcome.csv_path.display(),
                outcome.report_path.display()
            );
        }
    }
    Ok(())
}
