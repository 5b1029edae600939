use std::collections::HashMap;

use super::PlatformExtensions;
use crate::system::process::DiskIoStats;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn process_disk_io(_pid: u32) -> Option<DiskIoStats> {
        // macOS doesn't expose per-process I/O counters without entitlements.
        None
    }

    fn socket_table() -> HashMap<u32, Vec<String>> {
        // No procfs equivalent; connection stats are reported as absent.
        HashMap::new()
    }
}
