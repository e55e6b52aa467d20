// tests/event_collector.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use proptest::prelude::*;

use changetar::observe::{BatchOutcome, ChangeEvent, EventCollector, EventFlags, ExcludeSet};

const SENTINEL: &str = ".__observe_files_break_now__";

fn collector() -> EventCollector {
    EventCollector::new("/work", SENTINEL, ExcludeSet::default())
}

#[test]
fn file_events_are_recorded_once() {
    let mut c = collector();

    let outcome = c.consume_batch(&[
        ChangeEvent::file("/work/a.txt"),
        ChangeEvent::file("/work/a.txt"),
        ChangeEvent::file("/work/sub/b.txt"),
    ]);

    assert_eq!(outcome, BatchOutcome::Continue);
    let paths = c.into_paths();
    assert_eq!(paths.len(), 2);
    assert!(paths.contains("/work/a.txt"));
    assert!(paths.contains("/work/sub/b.txt"));
}

#[test]
fn directory_events_are_dropped() {
    let mut c = collector();

    c.consume_batch(&[
        ChangeEvent::dir("/work/sub"),
        ChangeEvent::file("/work/sub/b.txt"),
    ]);

    let paths = c.into_paths();
    assert!(!paths.contains("/work/sub"));
    assert!(paths.contains("/work/sub/b.txt"));
}

#[test]
fn created_directories_are_queued_for_scanning_once() {
    let mut c = collector();

    c.consume_batch(&[
        ChangeEvent::created_dir("/work/new"),
        ChangeEvent::dir("/work/old"),
        ChangeEvent::created_dir("/elsewhere/new"),
    ]);

    assert_eq!(c.take_pending_scans(), vec![PathBuf::from("/work/new")]);
    assert!(c.take_pending_scans().is_empty());
}

#[test]
fn sentinel_ends_observation_but_rest_of_batch_counts() {
    let mut c = collector();

    let outcome = c.consume_batch(&[
        ChangeEvent::file("/work/before.txt"),
        ChangeEvent::file(format!("/work/{SENTINEL}")),
        ChangeEvent::file("/work/same-batch.txt"),
    ]);

    assert_eq!(outcome, BatchOutcome::SentinelSeen);
    assert!(c.sentinel_seen());

    let paths = c.into_paths();
    assert!(paths.contains("/work/before.txt"));
    assert!(paths.contains("/work/same-batch.txt"));
    assert!(!paths.contains(format!("/work/{SENTINEL}")));
}

#[test]
fn sentinel_name_in_a_subdirectory_is_an_ordinary_file() {
    let mut c = collector();

    let outcome = c.consume_batch(&[ChangeEvent::file(format!("/work/sub/{SENTINEL}"))]);

    assert_eq!(outcome, BatchOutcome::Continue);
    assert!(c.into_paths().contains(format!("/work/sub/{SENTINEL}")));
}

#[test]
fn paths_outside_root_and_root_itself_are_ignored() {
    let mut c = collector();

    c.consume_batch(&[
        ChangeEvent::file("/workshop/x.txt"),
        ChangeEvent::file("/other/y.txt"),
        ChangeEvent::file("/work"),
    ]);

    assert!(c.into_paths().is_empty());
}

#[test]
fn excluded_globs_are_not_recorded() {
    let exclude = ExcludeSet::new(&["target/**".to_string(), "*.swp".to_string()])
        .expect("valid globs");
    let mut c = EventCollector::new("/work", SENTINEL, exclude);

    c.consume_batch(&[
        ChangeEvent::file("/work/target/debug/app"),
        ChangeEvent::file("/work/.main.rs.swp"),
        ChangeEvent::file("/work/src/main.rs"),
    ]);

    let paths: Vec<PathBuf> = c.into_paths().into_paths().into_iter().collect();
    assert_eq!(paths, vec![PathBuf::from("/work/src/main.rs")]);
}

#[test]
fn record_file_applies_the_same_filters() {
    let mut c = collector();

    assert!(c.record_file(Path::new("/work/new/file.txt")));
    assert!(!c.record_file(Path::new("/outside/file.txt")));
    assert!(!c.record_file(&Path::new("/work").join(SENTINEL)));
}

#[test]
fn renamed_directory_is_not_mistaken_for_a_file() {
    let mut c = collector();
    c.remember_dir(Path::new("/work/old"));

    // The old path is gone by the time the batch is handled, so its events
    // carry no directory flag. Backends report it on its own and again
    // paired with the new path.
    c.consume_batch(&[ChangeEvent::removed("/work/old")]);
    c.consume_batch(&[
        ChangeEvent::removed("/work/old"),
        ChangeEvent::created_dir("/work/new"),
    ]);

    assert!(c.is_known_dir(Path::new("/work/new")));
    assert_eq!(c.take_pending_scans(), vec![PathBuf::from("/work/new")]);
    assert!(c.into_paths().is_empty());
}

#[test]
fn unflagged_event_on_a_known_directory_is_dropped() {
    let mut c = collector();
    c.remember_dir(Path::new("/work/sub"));

    c.consume_batch(&[ChangeEvent::file("/work/sub"), ChangeEvent::file("/work/sub/x.txt")]);

    let paths = c.into_paths();
    assert!(!paths.contains("/work/sub"));
    assert!(paths.contains("/work/sub/x.txt"));
}

#[test]
fn file_created_where_a_directory_was_is_recorded() {
    let mut c = collector();
    c.remember_dir(Path::new("/work/a"));
    c.remember_dir(Path::new("/work/a/nested"));

    let mut created_file = ChangeEvent::file("/work/a");
    created_file.flags.created = true;

    c.consume_batch(&[ChangeEvent::removed("/work/a"), created_file]);

    assert!(!c.is_known_dir(Path::new("/work/a")));
    assert!(!c.is_known_dir(Path::new("/work/a/nested")));
    assert!(c.into_paths().contains("/work/a"));
}

#[test]
fn only_directories_under_the_root_are_remembered() {
    let mut c = collector();
    c.remember_dir(Path::new("/work"));
    c.remember_dir(Path::new("/elsewhere/dir"));

    assert!(!c.is_known_dir(Path::new("/work")));
    assert!(!c.is_known_dir(Path::new("/elsewhere/dir")));
}

// Small alphabets so generated batches collide on paths and hit the
// sentinel. Directory and file names never overlap, so a path that was once
// reported as a directory is never later expected as a file.
fn event_strategy() -> impl Strategy<Value = ChangeEvent> {
    let file_name = prop_oneof![
        Just("a.txt".to_string()),
        Just("b/c.txt".to_string()),
        Just(SENTINEL.to_string()),
        "[a-z]{1,4}(/[a-z]{1,4})?\\.txt",
    ];
    let dir_name = prop_oneof![Just("b".to_string()), "[a-z]{1,4}(/[a-z]{1,4})?"];
    let name_and_kind = prop_oneof![
        3 => file_name.prop_map(|name| (name, false)),
        1 => dir_name.prop_map(|name| (name, true)),
    ];
    let base = prop_oneof![4 => Just("/work"), 1 => Just("/other")];

    (base, name_and_kind, any::<bool>(), any::<bool>()).prop_map(
        |(base, (name, is_dir), created, removed)| ChangeEvent {
            path: Path::new(base).join(name),
            flags: EventFlags {
                is_dir,
                created,
                removed,
            },
        },
    )
}

proptest! {
    #[test]
    fn recorded_paths_are_exactly_in_root_file_events(
        batches in proptest::collection::vec(
            proptest::collection::vec(event_strategy(), 0..8),
            0..6,
        )
    ) {
        let mut c = collector();
        let sentinel = Path::new("/work").join(SENTINEL);
        let mut saw_sentinel = false;

        for batch in batches.iter() {
            let outcome = c.consume_batch(batch);
            saw_sentinel |= batch.iter().any(|e| !e.flags.is_dir && e.path == sentinel);
            prop_assert_eq!(outcome == BatchOutcome::SentinelSeen, saw_sentinel);
        }

        let expected: BTreeSet<PathBuf> = batches
            .iter()
            .flatten()
            .filter(|e| !e.flags.is_dir)
            .filter(|e| e.path.starts_with("/work") && e.path != sentinel)
            .map(|e| e.path.clone())
            .collect();

        let paths = c.into_paths().into_paths();
        prop_assert_eq!(paths, expected);
    }
}
