use std::collections::HashMap;

use crate::system::process::DiskIoStats;

/// Per-OS data sources that sysinfo does not cover.
pub trait PlatformExtensions {
    /// Disk I/O counters for one process. `None` when the OS denies access,
    /// the process is gone, or the platform does not expose counters.
    fn process_disk_io(pid: u32) -> Option<DiskIoStats>;

    /// All visible sockets, grouped by owning pid, as connection state names
    /// ("ESTABLISHED", "LISTEN", ...). Pids without sockets have no entry.
    fn socket_table() -> HashMap<u32, Vec<String>>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn process_disk_io(pid: u32) -> Option<DiskIoStats> {
    platform_impl::Platform::process_disk_io(pid)
}

pub fn socket_table() -> HashMap<u32, Vec<String>> {
    platform_impl::Platform::socket_table()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrappers_do_not_panic_for_current_pid() {
        let pid = std::process::id();
        let _ = process_disk_io(pid);
        let _ = socket_table();
    }
}
