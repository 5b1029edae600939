use chrono::Local;
use procwatch::format::csv_field;
use procwatch::system::process::{NetworkIoStats, ProcessRecord, ProcessSnapshot, ScanSkips};
use proptest::prelude::*;

fn mock_record(pid: u32, parent: Option<u32>) -> ProcessRecord {
    ProcessRecord {
        pid,
        name: format!("proc{pid}"),
        status: "Sleep".into(),
        cpu_percent: 0.0,
        memory_mb: 1.0,
        parent_pid: parent,
        create_time: Local::now(),
        username: "tester".into(),
        disk_io: None,
        network_io: None,
    }
}

fn state_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "ESTABLISHED",
        "LISTEN",
        "TIME_WAIT",
        "CLOSE_WAIT",
        "SYN_SENT",
        "FIN_WAIT1",
    ])
    .prop_map(String::from)
}

proptest! {
    #[test]
    fn network_tallies_hold_their_invariants(states in prop::collection::vec(state_name(), 0..60)) {
        match NetworkIoStats::from_states(&states) {
            Some(stats) => {
                prop_assert_eq!(stats.connection_count, states.len());
                prop_assert!(stats.established_count + stats.listening_count <= stats.connection_count);
                prop_assert_eq!(
                    stats.connection_states.values().sum::<usize>(),
                    stats.connection_count
                );
            }
            None => prop_assert!(states.is_empty()),
        }
    }

    #[test]
    fn hierarchy_is_idempotent_and_consistent_with_adjacency(
        seeds in prop::collection::vec(any::<u64>(), 1..40)
    ) {
        // Pids 1..=n; each later process either parentless or parented to an
        // earlier pid, which keeps the forest acyclic like a real process table.
        let records: Vec<ProcessRecord> = seeds
            .iter()
            .enumerate()
            .map(|(i, &seed)| {
                let parent = if i == 0 || seed % 4 == 0 {
                    None
                } else {
                    Some(((seed as usize % i) + 1) as u32)
                };
                mock_record((i + 1) as u32, parent)
            })
            .collect();

        let snapshot = ProcessSnapshot::from_records(records, ScanSkips::default());
        let first = snapshot.hierarchy(None);
        prop_assert_eq!(&first, &snapshot.hierarchy(None));

        // Every expanded entry must mirror the adjacency map exactly.
        for (parent, kids) in &first {
            prop_assert_eq!(kids, &snapshot.children[parent]);
        }
    }

    #[test]
    fn csv_escaping_round_trips(value in "[a-zA-Z0-9 ,\"']{0,24}") {
        let escaped = csv_field(&value);
        let restored = if escaped.starts_with('"') && escaped.ends_with('"') && escaped.len() >= 2 {
            escaped[1..escaped.len() - 1].replace("\"\"", "\"")
        } else {
            escaped.clone()
        };
        prop_assert_eq!(restored, value);
    }
}
