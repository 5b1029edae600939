use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Local};
use sysinfo::{Disks, ProcessRefreshKind, ProcessesToUpdate, System, Users};
use tracing::{info, warn};

use super::platform;
use super::process::{NetworkIoStats, ProcessRecord, ProcessSnapshot, ScanSkips};
use super::snapshot::SystemSummary;

#[cfg(target_os = "windows")]
const BOOT_MOUNT: &str = "C:\\";
#[cfg(not(target_os = "windows"))]
const BOOT_MOUNT: &str = "/";

/// Why a process observed during enumeration was excluded from the snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SkipReason {
    AccessDenied,
    Vanished,
}

pub struct Collector {
    sys: System,
    users: Users,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );
        let users = Users::new_with_refreshed_list();
        Collector { sys, users }
    }

    /// Enumerate every visible process into a fresh snapshot. With
    /// `include_io`, each record is additionally enriched with disk I/O
    /// counters and network connection stats; either enrichment failing
    /// leaves the field absent, never zero.
    pub fn snapshot(&mut self, include_io: bool) -> ProcessSnapshot {
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );

        // One pass over the OS socket tables serves every record below.
        let socket_table = if include_io {
            platform::socket_table()
        } else {
            HashMap::new()
        };

        let mut records = Vec::new();
        let mut skips = ScanSkips::default();

        for (pid, process) in self.sys.processes() {
            let pid = pid.as_u32();
            let mut record = match self.normalize(pid, process) {
                Ok(record) => record,
                Err(SkipReason::AccessDenied) => {
                    skips.access_denied += 1;
                    continue;
                }
                Err(SkipReason::Vanished) => {
                    skips.vanished += 1;
                    continue;
                }
            };

            if include_io {
                record.disk_io = platform::process_disk_io(pid);
                record.network_io = socket_table
                    .get(&pid)
                    .and_then(|states| NetworkIoStats::from_states(states));
            }

            records.push(record);
        }

        if skips.access_denied > 0 {
            warn!(
                count = skips.access_denied,
                "processes could not be accessed (permission denied)"
            );
            if skips.access_denied > records.len() / 2 {
                warn!("consider running with elevated privileges for full process access");
            }
        }
        if skips.vanished > 0 {
            info!(count = skips.vanished, "processes exited during scan");
        }

        ProcessSnapshot::from_records(records, skips)
    }

    fn normalize(
        &self,
        pid: u32,
        process: &sysinfo::Process,
    ) -> Result<ProcessRecord, SkipReason> {
        if let Some(reason) = probe_access(pid) {
            return Err(reason);
        }

        let username = process
            .user_id()
            .and_then(|uid| self.users.get_user_by_id(uid))
            .map(|user| user.name().to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(ProcessRecord {
            pid,
            name: process.name().to_string_lossy().to_string(),
            status: process.status().to_string(),
            cpu_percent: process.cpu_usage().max(0.0),
            memory_mb: process.memory() as f64 / (1024.0 * 1024.0),
            parent_pid: process.parent().map(|p| p.as_u32()),
            create_time: timestamp_to_local(process.start_time()),
            username,
            disk_io: None,
            network_io: None,
        })
    }

    /// Aggregate CPU, memory, and boot-volume disk usage. Every metric
    /// degrades to zero on its own rather than failing the summary.
    pub fn system_summary(&mut self) -> SystemSummary {
        self.sys.refresh_cpu_all();
        // CPU usage is a delta between two refreshes.
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        self.sys.refresh_cpu_all();
        self.sys.refresh_memory();

        let total = self.sys.total_memory();
        let available = self.sys.available_memory();
        let memory_percent = if total > 0 {
            (total.saturating_sub(available)) as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        const GB: f64 = 1024.0 * 1024.0 * 1024.0;

        SystemSummary {
            cpu_percent: f64::from(self.sys.global_cpu_usage()),
            memory_percent,
            memory_available_gb: available as f64 / GB,
            memory_total_gb: total as f64 / GB,
            disk_usage_percent: boot_disk_usage_percent(),
        }
    }
}

fn timestamp_to_local(secs: u64) -> DateTime<Local> {
    DateTime::from_timestamp(secs as i64, 0)
        .map(|utc| utc.with_timezone(&Local))
        .unwrap_or_else(Local::now)
}

fn boot_disk_usage_percent() -> f64 {
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .find(|disk| disk.mount_point() == Path::new(BOOT_MOUNT))
        .map(|disk| {
            let total = disk.total_space();
            if total == 0 {
                return 0.0;
            }
            let used = total.saturating_sub(disk.available_space());
            used as f64 / total as f64 * 100.0
        })
        .unwrap_or(0.0)
}

/// Cheap liveness/permission probe for one pid. Only procfs platforms can
/// distinguish the two failure modes; elsewhere nothing is excluded.
#[cfg(target_os = "linux")]
fn probe_access(pid: u32) -> Option<SkipReason> {
    use std::io::ErrorKind;

    match std::fs::metadata(format!("/proc/{pid}/stat")) {
        Ok(_) => None,
        Err(err) if err.kind() == ErrorKind::NotFound => Some(SkipReason::Vanished),
        Err(err) if err.kind() == ErrorKind::PermissionDenied => Some(SkipReason::AccessDenied),
        Err(_) => None,
    }
}

#[cfg(not(target_os = "linux"))]
fn probe_access(_pid: u32) -> Option<SkipReason> {
    None
}
