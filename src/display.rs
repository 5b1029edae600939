use std::collections::{HashMap, HashSet};

use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::warn;

use crate::config::DisplayConfig;
use crate::format::truncate_unicode;
use crate::logger::LogSummary;
use crate::system::process::ProcessSnapshot;
use crate::system::snapshot::SystemSummary;

#[derive(Tabled)]
struct ProcessRow {
    #[tabled(rename = "PID")]
    pid: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "CPU %")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Parent PID")]
    parent: String,
    #[tabled(rename = "User")]
    user: String,
}

#[derive(Tabled)]
struct TopRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "PID")]
    pid: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "CPU %")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "User")]
    user: String,
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(80));
    println!("{title}");
    println!("{}", "=".repeat(80));
}

pub fn print_process_list(snapshot: &ProcessSnapshot, display: &DisplayConfig) {
    banner("PROCESS LIST");

    let rows: Vec<ProcessRow> = snapshot
        .records
        .iter()
        .map(|record| ProcessRow {
            pid: record.pid,
            name: truncate_unicode(&record.name, display.name_width),
            status: record.status.clone(),
            cpu: format!("{:.1}%", record.cpu_percent),
            memory: format!("{:.1} MB", record.memory_mb),
            parent: record
                .parent_pid
                .map(|p| p.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            user: record.username.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
    println!("\nTotal processes: {}", snapshot.records.len());
}

/// Requests beyond the number of available processes are clamped with a
/// warning rather than rejected.
fn clamp_count(requested: usize, available: usize) -> usize {
    if requested > available {
        warn!(
            requested,
            available, "fewer processes available than requested, clamping"
        );
        available
    } else {
        requested
    }
}

pub fn print_top_processes(snapshot: &ProcessSnapshot, count: usize, display: &DisplayConfig) {
    let count = clamp_count(count, snapshot.records.len());

    banner(&format!("TOP {count} PROCESSES BY CPU USAGE"));

    let mut by_cpu: Vec<_> = snapshot.records.iter().collect();
    by_cpu.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));

    let rows: Vec<TopRow> = by_cpu
        .iter()
        .take(count)
        .enumerate()
        .map(|(idx, record)| TopRow {
            rank: idx + 1,
            pid: record.pid,
            name: truncate_unicode(&record.name, display.name_width),
            cpu: format!("{:.1}%", record.cpu_percent),
            memory: format!("{:.1} MB", record.memory_mb),
            user: record.username.clone(),
        })
        .collect();

    if rows.is_empty() {
        println!("No processes found to display");
        return;
    }

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}

pub fn print_system_summary(
    summary: &SystemSummary,
    snapshot: &ProcessSnapshot,
    display: &DisplayConfig,
) {
    banner("SYSTEM RESOURCE SUMMARY");

    println!("CPU Usage: {:.1}%", summary.cpu_percent);
    println!("Memory Usage: {:.1}%", summary.memory_percent);
    println!("Available Memory: {:.2} GB", summary.memory_available_gb);
    println!("Total Memory: {:.2} GB", summary.memory_total_gb);
    println!("Disk Usage: {:.1}%", summary.disk_usage_percent);

    println!("\nTop {} Memory Consumers:", display.top_memory_count);
    let mut by_memory: Vec<_> = snapshot.records.iter().collect();
    by_memory.sort_by(|a, b| b.memory_mb.total_cmp(&a.memory_mb));

    for (idx, record) in by_memory.iter().take(display.top_memory_count).enumerate() {
        println!(
            "{}. {} (PID: {}) - {:.1} MB",
            idx + 1,
            record.name,
            record.pid,
            record.memory_mb
        );
    }
}

pub fn print_hierarchy(snapshot: &ProcessSnapshot) {
    banner("PROCESS HIERARCHY");

    let hierarchy = snapshot.hierarchy(None);
    if hierarchy.is_empty() {
        println!("No parent-child relationships found.");
        return;
    }

    let mut visited = HashSet::new();
    for root in snapshot.roots() {
        if hierarchy.contains_key(&root) {
            print_subtree(snapshot, &hierarchy, root, 0, &mut visited);
        }
    }
}

fn print_subtree(
    snapshot: &ProcessSnapshot,
    hierarchy: &HashMap<u32, Vec<u32>>,
    pid: u32,
    depth: usize,
    visited: &mut HashSet<u32>,
) {
    if !visited.insert(pid) {
        return;
    }

    let name = snapshot
        .record_for(pid)
        .map(|record| record.name.as_str())
        .unwrap_or("Unknown");

    if depth == 0 {
        println!("\n{pid} ({name})");
    } else {
        println!("{:indent$}└── {pid} ({name})", "", indent = 4 * depth - 2);
    }

    if let Some(children) = hierarchy.get(&pid) {
        for &child in children {
            print_subtree(snapshot, hierarchy, child, depth + 1, visited);
        }
    }
}

pub fn print_log_summary(summary: &LogSummary) {
    banner("LOG SUMMARY");

    println!("CSV file: {}", summary.csv_file.display());
    println!("JSON file: {}", summary.json_file.display());
    println!("Log interval: {} seconds", summary.interval_secs);
    println!("CSV rows: {}", summary.csv_rows);
    println!("JSON entries: {}", summary.json_entries);
    if let Some(start) = &summary.log_start_time {
        println!("Log started: {start}");
    }
}
