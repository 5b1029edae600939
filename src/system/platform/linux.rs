use std::collections::HashMap;

use super::PlatformExtensions;
use crate::system::process::DiskIoStats;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn process_disk_io(pid: u32) -> Option<DiskIoStats> {
        // Read /proc/{pid}/io; requires same-uid or elevated privileges.
        let path = format!("/proc/{pid}/io");
        let contents = std::fs::read_to_string(path).ok()?;
        parse_proc_io(&contents)
    }

    fn socket_table() -> HashMap<u32, Vec<String>> {
        let inode_to_pid = build_inode_pid_map();
        let mut table: HashMap<u32, Vec<String>> = HashMap::new();

        for path in ["/proc/net/tcp", "/proc/net/tcp6"] {
            let Ok(contents) = std::fs::read_to_string(path) else {
                continue;
            };
            for line in contents.lines().skip(1) {
                if let Some((inode, state)) = parse_proc_net_line(line)
                    && let Some(&pid) = inode_to_pid.get(&inode)
                {
                    table.entry(pid).or_default().push(state);
                }
            }
        }

        table
    }
}

fn parse_proc_io(contents: &str) -> Option<DiskIoStats> {
    let mut read_bytes = None;
    let mut write_bytes = None;
    let mut read_count = None;
    let mut write_count = None;
    for line in contents.lines() {
        if let Some(val) = line.strip_prefix("read_bytes: ") {
            read_bytes = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("write_bytes: ") {
            write_bytes = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("syscr: ") {
            read_count = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("syscw: ") {
            write_count = val.trim().parse().ok();
        }
    }
    Some(DiskIoStats {
        read_bytes: read_bytes?,
        write_bytes: write_bytes?,
        read_count: read_count?,
        write_count: write_count?,
    })
}

/// Parse one /proc/net/tcp row into (socket inode, state name).
///
/// Format: `sl local_address rem_address st tx_queue:rx_queue tr:tm->when
/// retrnsmt uid timeout inode ...`
fn parse_proc_net_line(line: &str) -> Option<(u64, String)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 10 {
        return None;
    }

    let state_hex = u8::from_str_radix(fields[3], 16).ok()?;
    let inode: u64 = fields[9].parse().ok()?;
    if inode == 0 {
        // Sockets in TIME_WAIT etc. may no longer belong to any fd.
        return None;
    }

    Some((inode, tcp_state_name(state_hex).to_string()))
}

fn tcp_state_name(state: u8) -> &'static str {
    match state {
        0x01 => "ESTABLISHED",
        0x02 => "SYN_SENT",
        0x03 => "SYN_RECV",
        0x04 => "FIN_WAIT1",
        0x05 => "FIN_WAIT2",
        0x06 => "TIME_WAIT",
        0x07 => "CLOSE",
        0x08 => "CLOSE_WAIT",
        0x09 => "LAST_ACK",
        0x0A => "LISTEN",
        0x0B => "CLOSING",
        _ => "UNKNOWN",
    }
}

/// Map socket inode -> owning pid by scanning /proc/<pid>/fd symlinks.
/// Entries for processes we cannot read are simply missing.
fn build_inode_pid_map() -> HashMap<u64, u32> {
    let mut map = HashMap::new();

    let Ok(proc_dir) = std::fs::read_dir("/proc") else {
        return map;
    };

    for entry in proc_dir.flatten() {
        let name = entry.file_name();
        let Ok(pid) = name.to_string_lossy().parse::<u32>() else {
            continue;
        };

        let fd_dir = format!("/proc/{pid}/fd");
        let Ok(fds) = std::fs::read_dir(fd_dir) else {
            continue;
        };

        for fd in fds.flatten() {
            if let Ok(target) = std::fs::read_link(fd.path()) {
                let target = target.to_string_lossy();
                // Socket fds link to "socket:[12345]".
                if let Some(inode) = target
                    .strip_prefix("socket:[")
                    .and_then(|rest| rest.strip_suffix(']'))
                    .and_then(|num| num.parse::<u64>().ok())
                {
                    map.insert(inode, pid);
                }
            }
        }
    }

    map
}
