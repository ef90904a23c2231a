pub mod alerts;
pub mod data;
pub mod history;

use alerts::{Alert, AlertSequence, AlertThresholds, evaluate_alerts};
use chrono::Local;
use csv::{Writer, WriterBuilder};
use data::{ReadingRecord, Report};
use history::History;
use std::fs::File;
use std::io::{self, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::devices::{DerivedReading, SensorNode, Snapshot};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for a monitoring session
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub interval: Duration,          // Delay between polls
    pub samples: Option<usize>,      // Number of polls, None = until the callback stops it
    pub history_len: usize,          // Rolling window kept for the summary
    pub alert_history_len: usize,    // Most recent alerts kept for the report
    pub output_dir: PathBuf,         // Where the CSV and JSON report land
    pub thresholds: AlertThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            samples: None,
            history_len: 20,
            alert_history_len: 50,
            output_dir: PathBuf::from("logs"),
            thresholds: AlertThresholds::default(),
        }
    }
}

#[derive(Debug)]
pub struct MonitorOutcome {
    pub csv_path: PathBuf,
    pub report_path: PathBuf,
    pub polls: usize,
    pub failed_polls: usize,
}

// Granularity at which a pending stop request interrupts the poll interval.
const STOP_CHECK: Duration = Duration::from_millis(100);

/// Polls the sensor node until `config.samples` polls were made, `stop` is
/// set, or `on_sample` breaks, then writes the session report.
///
/// Failed polls are logged and skipped; the next poll is a fresh request.
pub fn run_monitor<F>(
    node: &SensorNode,
    config: &MonitorConfig,
    stop: &AtomicBool,
    mut on_sample: F,
) -> Result<MonitorOutcome, MonitorError>
where
    F: FnMut(&Snapshot, &[Alert], &History<DerivedReading>) -> ControlFlow<()>,
{
    info!("Starting monitor session with configuration: {:?}", config);

    std::fs::create_dir_all(&config.output_dir)?;
    let csv_path = config.output_dir.join(
        Local::now()
            .format("airpulse_readings_%Y-%m-%d_%H-%M-%S.csv")
            .to_string(),
    );
    let mut writer = readings_writer(File::create(&csv_path)?)?;

    let mut history = History::new(config.history_len);
    let mut recent_alerts = History::new(config.alert_history_len);
    let mut sequence = AlertSequence::default();
    let mut latest = None;
    let mut polls = 0;
    let mut failed_polls = 0;

    loop {
        if config.samples.is_some_and(|n| polls >= n) {
            break;
        }
        let stopped = if polls > 0 {
            !sleep_unless_stopped(config.interval, stop)
        } else {
            stop.load(Ordering::SeqCst)
        };
        if stopped {
            info!("Monitor stop requested after {} polls", polls);
            break;
        }
        polls += 1;

        let snapshot = match node.fetch() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                failed_polls += 1;
                warn!("Poll {} of {} failed: {}", polls, node.url(), e);
                continue;
            }
        };

        writer.serialize(ReadingRecord::from(&snapshot))?;
        writer.flush()?;

        history.push(snapshot.reading.clone());
        let alerts = evaluate_alerts(&snapshot, &config.thresholds, &mut sequence);
        for alert in &alerts {
            warn!("{}", alert);
            recent_alerts.push(alert.clone());
        }

        let flow = on_sample(&snapshot, &alerts, &history);
        latest = Some(snapshot);
        if flow.is_break() {
            info!("Monitor stopped by caller after {} polls", polls);
            break;
        }
    }

    if failed_polls > 0 {
        error!("{} of {} polls failed", failed_polls, polls);
    }

    let report = Report::build(
        node.url(),
        &history,
        latest,
        polls - failed_polls,
        failed_polls,
        recent_alerts.iter().cloned().collect(),
    );
    let report_path = save_report_json(&config.output_dir, &report)?;

    info!("Monitor session finished. Readings: {:?}, report: {:?}", csv_path, report_path);
    Ok(MonitorOutcome { csv_path, report_path, polls, failed_polls })
}

/// Returns a flag that is set on the first Ctrl-C.
///
/// The handler runs on its own thread with a single-threaded runtime. A
/// second Ctrl-C exits the process, for when a poll is stuck in a request.
pub fn stop_on_ctrl_c() -> io::Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    let flag = stop.clone();
    std::thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                info!("Ctrl-C received, finishing the session");
                flag.store(true, Ordering::SeqCst);

                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Second Ctrl-C received, exiting without a report");
                    std::process::exit(130);
                }
            })
        })?;

    Ok(stop)
}

/// Sleeps for `interval`, returning `false` early once `stop` is set.
fn sleep_unless_stopped(interval: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(STOP_CHECK.min(deadline - now));
    }
}

/// CSV writer with the header already written, so even an empty export has one.
fn readings_writer<W: Write>(out: W) -> Result<Writer<W>, MonitorError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(ReadingRecord::HEADERS)?;
    writer.flush()?;
    Ok(writer)
}

/// Write readings as CSV rows (header first) to any writer
pub fn write_readings_csv<W: Write>(out: W, data: &[Snapshot]) -> Result<(), MonitorError> {
    let mut writer = readings_writer(out)?;
    for snapshot in data {
        writer.serialize(ReadingRecord::from(snapshot))?;
    }
    writer.flush()?;
    Ok(())
}

/// Save readings to a timestamped CSV file in `dir`
pub fn save_readings_csv(dir: &Path, data: &[Snapshot]) -> Result<PathBuf, MonitorError> {
    let name = Local::now()
        .format("airpulse_readings_%Y-%m-%d_%H-%M-%S.csv")
        .to_string();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);

    write_readings_csv(File::create(&path)?, data)?;

    info!("Readings saved to {}", path.display());
    Ok(path)
}

pub fn save_report_json(dir: &Path, report: &Report) -> Result<PathBuf, MonitorError> {
    let name = Local::now()
        .format("airpulse_report_%Y-%m-%d_%H-%M-%S.json")
        .to_string();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);

    let file = File::create(&path)?;
    serde_json::to_writer_pretty(file, report)?;

    info!("Report saved to {}", path.display());
    Ok(path)
}
