use std::collections::HashMap;

use super::PlatformExtensions;
use crate::system::process::DiskIoStats;

pub struct Platform;

#[cfg(target_os = "windows")]
use windows_sys::Win32::{
    Foundation::CloseHandle,
    System::Threading::{
        GetProcessIoCounters, IO_COUNTERS, OpenProcess, PROCESS_QUERY_INFORMATION,
    },
};

impl PlatformExtensions for Platform {
    #[cfg(target_os = "windows")]
    fn process_disk_io(pid: u32) -> Option<DiskIoStats> {
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_INFORMATION, 0, pid);
            if handle.is_null() {
                return None;
            }
            let mut counters = std::mem::zeroed::<IO_COUNTERS>();
            let ok = GetProcessIoCounters(handle, &mut counters);
            CloseHandle(handle);
            if ok == 0 {
                return None;
            }
            Some(DiskIoStats {
                read_bytes: counters.ReadTransferCount,
                write_bytes: counters.WriteTransferCount,
                read_count: counters.ReadOperationCount,
                write_count: counters.WriteOperationCount,
            })
        }
    }

    #[cfg(not(target_os = "windows"))]
    fn process_disk_io(_pid: u32) -> Option<DiskIoStats> {
        None
    }

    fn socket_table() -> HashMap<u32, Vec<String>> {
        // Per-process TCP tables need GetExtendedTcpTable; connection stats
        // are reported as absent until that is wired up.
        HashMap::new()
    }
}
