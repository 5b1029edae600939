use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Local};

/// Cumulative disk I/O counters for one process, as reported by the OS.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiskIoStats {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_count: u64,
    pub write_count: u64,
}

impl DiskIoStats {
    pub fn total_bytes(&self) -> u64 {
        self.read_bytes + self.write_bytes
    }

    pub fn total_operations(&self) -> u64 {
        self.read_count + self.write_count
    }
}

/// Network connection tally for one process, grouped by reported socket state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkIoStats {
    pub connection_count: usize,
    pub established_count: usize,
    pub listening_count: usize,
    pub connection_states: BTreeMap<String, usize>,
}

impl NetworkIoStats {
    /// Tally a list of connection state names into per-state counts.
    ///
    /// Returns `None` for an empty list so callers keep the distinction
    /// between "no connections observed" and "could not observe".
    pub fn from_states(states: &[String]) -> Option<Self> {
        if states.is_empty() {
            return None;
        }

        let mut stats = NetworkIoStats {
            connection_count: states.len(),
            ..Default::default()
        };
        for state in states {
            *stats.connection_states.entry(state.clone()).or_insert(0) += 1;
            match state.as_str() {
                "ESTABLISHED" => stats.established_count += 1,
                "LISTEN" => stats.listening_count += 1,
                _ => {}
            }
        }
        Some(stats)
    }

    pub fn connection_summary(&self) -> String {
        let parts: Vec<String> = self
            .connection_states
            .iter()
            .filter(|&(_, &count)| count > 0)
            .map(|(state, count)| format!("{count} {state}"))
            .collect();
        if parts.is_empty() {
            format!("{} connections", self.connection_count)
        } else {
            parts.join(", ")
        }
    }
}

/// One observation of a process within a single snapshot. Immutable once
/// built; records from different snapshots are independent values.
#[derive(Clone, Debug)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub status: String,
    pub cpu_percent: f32,
    pub memory_mb: f64,
    pub parent_pid: Option<u32>,
    pub create_time: DateTime<Local>,
    pub username: String,
    pub disk_io: Option<DiskIoStats>,
    pub network_io: Option<NetworkIoStats>,
}

/// Processes that the scan observed but could not read.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScanSkips {
    pub access_denied: usize,
    pub vanished: usize,
}

impl ScanSkips {
    pub fn total(&self) -> usize {
        self.access_denied + self.vanished
    }
}

/// A point-in-time enumeration of all visible processes, together with the
/// parent -> children adjacency map derived from the same pass.
#[derive(Clone, Debug)]
pub struct ProcessSnapshot {
    pub records: Vec<ProcessRecord>,
    pub children: HashMap<u32, Vec<u32>>,
    pub skipped: ScanSkips,
}

// Hierarchy expansion stops here even if the adjacency map somehow loops
// deeper; OS process trees are nowhere near this depth.
const MAX_TREE_DEPTH: usize = 512;

impl ProcessSnapshot {
    /// Build a snapshot from a flat record list. Records are sorted by pid so
    /// adjacency lists and rendering order are deterministic.
    pub fn from_records(mut records: Vec<ProcessRecord>, skipped: ScanSkips) -> Self {
        records.sort_unstable_by_key(|r| r.pid);

        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for record in &records {
            if let Some(ppid) = record.parent_pid {
                children.entry(ppid).or_default().push(record.pid);
            }
        }

        ProcessSnapshot {
            records,
            children,
            skipped,
        }
    }

    pub fn record_for(&self, pid: u32) -> Option<&ProcessRecord> {
        self.records
            .binary_search_by_key(&pid, |r| r.pid)
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Pids used as hierarchy roots when no explicit root is requested:
    /// every parentless process plus pid 1 if present, falling back to the
    /// smallest pid when neither exists.
    pub fn roots(&self) -> Vec<u32> {
        let mut roots: Vec<u32> = self
            .records
            .iter()
            .filter(|r| r.parent_pid.is_none() || r.pid == 1)
            .map(|r| r.pid)
            .collect();

        if roots.is_empty()
            && let Some(min_pid) = self.records.iter().map(|r| r.pid).min()
        {
            roots.push(min_pid);
        }

        roots
    }

    /// Expand the subtree reachable from `root` (or from all default roots)
    /// into a parent -> children mapping. Leaves contribute no entries.
    pub fn hierarchy(&self, root: Option<u32>) -> HashMap<u32, Vec<u32>> {
        let roots = match root {
            Some(pid) => vec![pid],
            None => self.roots(),
        };

        let mut hierarchy = HashMap::new();
        let mut visited = HashSet::new();
        // Depth tracked alongside each pid; the adjacency map comes from
        // the OS and should be acyclic, but is not trusted to be.
        let mut stack: Vec<(u32, usize)> = roots.into_iter().map(|pid| (pid, 0)).collect();

        while let Some((pid, depth)) = stack.pop() {
            if depth >= MAX_TREE_DEPTH || !visited.insert(pid) {
                continue;
            }
            if let Some(kids) = self.children.get(&pid) {
                hierarchy.insert(pid, kids.clone());
                for &child in kids {
                    stack.push((child, depth + 1));
                }
            }
        }

        hierarchy
    }
}
