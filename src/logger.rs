use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::format::csv_field;
use crate::system::collector::Collector;
use crate::system::process::ProcessRecord;

const CSV_FILE: &str = "process_monitor.csv";
const JSON_FILE: &str = "process_monitor.json";

// Column order is an external contract; rows appended across runs must line
// up under this exact header.
const CSV_HEADER: &str = "timestamp,pid,name,status,cpu_percent,memory_mb,\
parent_pid,username,disk_read_bytes,disk_write_bytes,disk_read_count,\
disk_write_count,network_connections,network_established,network_listening";

#[derive(Debug, Serialize, Deserialize)]
pub struct LogDocument {
    pub log_start_time: String,
    pub log_interval_seconds: u64,
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub process_count: usize,
    pub processes: Vec<LogProcess>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogProcess {
    pub pid: u32,
    pub name: String,
    pub status: String,
    pub cpu_percent: f64,
    pub memory_mb: f64,
    pub parent_pid: Option<u32>,
    pub username: String,
    /// `null` when the I/O sub-query failed, as opposed to observed zeros.
    pub disk_io: Option<LogDiskIo>,
    pub network_io: Option<LogNetworkIo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogDiskIo {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_count: u64,
    pub write_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogNetworkIo {
    pub connections: usize,
    pub established: usize,
    pub listening: usize,
    pub connection_states: std::collections::BTreeMap<String, usize>,
}

/// Read-only view over the state of both log files.
#[derive(Debug)]
pub struct LogSummary {
    pub csv_file: PathBuf,
    pub json_file: PathBuf,
    pub csv_exists: bool,
    pub json_exists: bool,
    pub interval_secs: u64,
    pub csv_rows: usize,
    pub json_entries: usize,
    pub log_start_time: Option<String>,
}

/// Appends periodic process snapshots to a CSV row file and a JSON document
/// file under one output directory. Construction initializes whichever file
/// is missing and leaves existing files untouched, so a later run resumes
/// logging into the same history.
pub struct ProcessLogger {
    output_dir: PathBuf,
    interval_secs: u64,
    csv_path: PathBuf,
    json_path: PathBuf,
}

impl ProcessLogger {
    pub fn new(output_dir: impl Into<PathBuf>, interval_secs: u64) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .wrap_err_with(|| format!("creating log directory {}", output_dir.display()))?;

        let logger = ProcessLogger {
            csv_path: output_dir.join(CSV_FILE),
            json_path: output_dir.join(JSON_FILE),
            output_dir,
            interval_secs,
        };

        if !logger.csv_path.exists() {
            fs::write(&logger.csv_path, format!("{CSV_HEADER}\n"))
                .wrap_err("initializing CSV log file")?;
        }
        if !logger.json_path.exists() {
            let document = LogDocument {
                log_start_time: Local::now().to_rfc3339(),
                log_interval_seconds: interval_secs,
                entries: Vec::new(),
            };
            logger
                .write_document(&document)
                .wrap_err("initializing JSON log file")?;
        }

        Ok(logger)
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    /// Append one tick: one CSV row per record, and one entry grouping all
    /// records under the shared timestamp in the JSON document.
    pub fn record(&self, records: &[ProcessRecord], timestamp: DateTime<Local>) -> Result<()> {
        let ts = timestamp.to_rfc3339();
        self.append_csv(records, &ts)?;
        self.append_json(records, &ts)?;
        Ok(())
    }

    fn append_csv(&self, records: &[ProcessRecord], timestamp: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)
            .wrap_err("opening CSV log file for append")?;

        for record in records {
            let disk = record.disk_io.unwrap_or_default();
            let (connections, established, listening) = record
                .network_io
                .as_ref()
                .map(|net| {
                    (
                        net.connection_count,
                        net.established_count,
                        net.listening_count,
                    )
                })
                .unwrap_or((0, 0, 0));

            writeln!(
                file,
                "{timestamp},{},{},{},{:.2},{:.2},{},{},{},{},{},{},{},{},{}",
                record.pid,
                csv_field(&record.name),
                csv_field(&record.status),
                record.cpu_percent,
                record.memory_mb,
                record
                    .parent_pid
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
                csv_field(&record.username),
                disk.read_bytes,
                disk.write_bytes,
                disk.read_count,
                disk.write_count,
                connections,
                established,
                listening,
            )?;
        }

        Ok(())
    }

    fn append_json(&self, records: &[ProcessRecord], timestamp: &str) -> Result<()> {
        let mut document = self.read_document()?;

        let processes = records
            .iter()
            .map(|record| LogProcess {
                pid: record.pid,
                name: record.name.clone(),
                status: record.status.clone(),
                cpu_percent: round2(f64::from(record.cpu_percent)),
                memory_mb: round2(record.memory_mb),
                parent_pid: record.parent_pid,
                username: record.username.clone(),
                disk_io: record.disk_io.map(|io| LogDiskIo {
                    read_bytes: io.read_bytes,
                    write_bytes: io.write_bytes,
                    read_count: io.read_count,
                    write_count: io.write_count,
                }),
                network_io: record.network_io.as_ref().map(|net| LogNetworkIo {
                    connections: net.connection_count,
                    established: net.established_count,
                    listening: net.listening_count,
                    connection_states: net.connection_states.clone(),
                }),
            })
            .collect::<Vec<_>>();

        document.entries.push(LogEntry {
            timestamp: timestamp.to_string(),
            process_count: processes.len(),
            processes,
        });

        self.write_document(&document)
    }

    fn read_document(&self) -> Result<LogDocument> {
        let contents = fs::read_to_string(&self.json_path)
            .wrap_err_with(|| format!("reading {}", self.json_path.display()))?;
        serde_json::from_str(&contents)
            .wrap_err_with(|| format!("parsing {}", self.json_path.display()))
    }

    /// Full-document rewrite through a temp file and rename, so a crash
    /// mid-write cannot leave a truncated document behind.
    fn write_document(&self, document: &LogDocument) -> Result<()> {
        let tmp_path = self.json_path.with_extension("json.tmp");
        let payload = serde_json::to_vec_pretty(document)?;
        fs::write(&tmp_path, payload)
            .wrap_err_with(|| format!("writing {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.json_path)
            .wrap_err_with(|| format!("replacing {}", self.json_path.display()))?;
        Ok(())
    }

    /// Sample and append once per interval until the duration elapses or the
    /// operator interrupts. Interruption is honored at the wait boundary;
    /// every completed tick is already on disk by then.
    pub async fn run_loop(
        &self,
        collector: &mut Collector,
        duration: Option<Duration>,
    ) -> Result<()> {
        info!(
            dir = %self.output_dir.display(),
            interval_secs = self.interval_secs,
            "starting continuous logging (press Ctrl+C to stop)"
        );
        info!(csv = %self.csv_path.display(), json = %self.json_path.display(), "log files");

        let started = Instant::now();
        loop {
            let snapshot = collector.snapshot(true);
            self.record(&snapshot.records, Local::now())?;

            if let Some(limit) = duration
                && started.elapsed() >= limit
            {
                info!(seconds = limit.as_secs(), "logging duration reached");
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(self.interval_secs)) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!(dir = %self.output_dir.display(), "logging stopped by user, data saved");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Diagnostic view of both files; never mutates state.
    pub fn summary(&self) -> LogSummary {
        let csv_rows = fs::read_to_string(&self.csv_path)
            .map(|contents| contents.lines().count().saturating_sub(1))
            .unwrap_or(0);

        let (json_entries, log_start_time) = match self.read_document() {
            Ok(document) => (document.entries.len(), Some(document.log_start_time)),
            Err(_) => (0, None),
        };

        LogSummary {
            csv_file: self.csv_path.clone(),
            json_file: self.json_path.clone(),
            csv_exists: self.csv_path.exists(),
            json_exists: self.json_path.exists(),
            interval_secs: self.interval_secs,
            csv_rows,
            json_entries,
            log_start_time,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::process::{DiskIoStats, NetworkIoStats};

    fn record(pid: u32, name: &str, disk_io: Option<DiskIoStats>) -> ProcessRecord {
        ProcessRecord {
            pid,
            name: name.to_string(),
            status: "Sleep".into(),
            cpu_percent: 1.234,
            memory_mb: 56.789,
            parent_pid: (pid > 1).then_some(1),
            create_time: Local::now(),
            username: "tester".into(),
            disk_io,
            network_io: None,
        }
    }

    #[test]
    fn initialization_writes_header_and_metadata_once() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ProcessLogger::new(dir.path(), 5).unwrap();

        let summary = logger.summary();
        assert!(summary.csv_exists);
        assert!(summary.json_exists);
        assert_eq!(summary.csv_rows, 0);
        assert_eq!(summary.json_entries, 0);

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("timestamp,pid,name,"));
    }

    #[test]
    fn reinitialization_preserves_existing_history() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ProcessLogger::new(dir.path(), 5).unwrap();
        logger
            .record(&[record(1, "init", None), record(2, "worker", None)], Local::now())
            .unwrap();
        let start_time = logger.summary().log_start_time;

        // Same directory, fresh construction.
        let reopened = ProcessLogger::new(dir.path(), 5).unwrap();
        let summary = reopened.summary();
        assert_eq!(summary.csv_rows, 2);
        assert_eq!(summary.json_entries, 1);
        assert_eq!(summary.log_start_time, start_time);
    }

    #[test]
    fn appends_are_monotonic_across_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ProcessLogger::new(dir.path(), 1).unwrap();
        let records = [record(1, "a", None), record(2, "b", None), record(3, "c", None)];

        for _ in 0..4 {
            logger.record(&records, Local::now()).unwrap();
        }

        let summary = logger.summary();
        assert_eq!(summary.csv_rows, 12);
        assert_eq!(summary.json_entries, 4);

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(
            csv.lines().filter(|l| l.starts_with("timestamp,")).count(),
            1
        );
    }

    #[test]
    fn csv_rows_format_resources_with_two_decimals() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ProcessLogger::new(dir.path(), 5).unwrap();
        let io = DiskIoStats {
            read_bytes: 1024,
            write_bytes: 2048,
            read_count: 3,
            write_count: 4,
        };
        logger.record(&[record(7, "svc", Some(io))], Local::now()).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(",1.23,56.79,"), "unexpected row: {row}");
        assert!(row.ends_with(",1024,2048,3,4,0,0,0"), "unexpected row: {row}");
    }

    #[test]
    fn csv_quotes_names_containing_delimiters() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ProcessLogger::new(dir.path(), 5).unwrap();
        logger
            .record(&[record(7, "svc, with comma", None)], Local::now())
            .unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert!(csv.contains("\"svc, with comma\""));
    }

    #[test]
    fn absent_parent_is_empty_csv_field() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ProcessLogger::new(dir.path(), 5).unwrap();
        logger.record(&[record(1, "init", None)], Local::now()).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let row = csv.lines().nth(1).unwrap();
        // ...,cpu,mem,<empty parent>,username,...
        assert!(row.contains(",1.23,56.79,,tester,"), "unexpected row: {row}");
    }

    #[test]
    fn document_keeps_absent_io_distinct_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ProcessLogger::new(dir.path(), 5).unwrap();
        let zero_io = DiskIoStats::default();
        logger
            .record(
                &[record(1, "no-io", None), record(2, "zero-io", Some(zero_io))],
                Local::now(),
            )
            .unwrap();

        let raw = fs::read_to_string(logger.json_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let processes = &value["entries"][0]["processes"];
        assert!(processes[0]["disk_io"].is_null());
        assert_eq!(processes[1]["disk_io"]["read_bytes"], 0);
    }

    #[test]
    fn document_start_time_is_stable_across_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ProcessLogger::new(dir.path(), 5).unwrap();
        let before = logger.summary().log_start_time.unwrap();
        logger.record(&[record(1, "init", None)], Local::now()).unwrap();
        logger.record(&[record(1, "init", None)], Local::now()).unwrap();
        assert_eq!(logger.summary().log_start_time.unwrap(), before);
    }

    #[test]
    fn network_io_round_trips_through_document() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ProcessLogger::new(dir.path(), 5).unwrap();
        let states: Vec<String> = ["ESTABLISHED", "LISTEN"].iter().map(|s| s.to_string()).collect();
        let mut rec = record(9, "netd", None);
        rec.network_io = NetworkIoStats::from_states(&states);
        logger.record(&[rec], Local::now()).unwrap();

        let raw = fs::read_to_string(logger.json_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let net = &value["entries"][0]["processes"][0]["network_io"];
        assert_eq!(net["connections"], 2);
        assert_eq!(net["established"], 1);
        assert_eq!(net["listening"], 1);
        assert_eq!(net["connection_states"]["LISTEN"], 1);
    }
}
