use std::collections::BTreeSet;

use jobwatch_core::{
    recent_snapshot, reconcile, BoundedIdSet, Client, Job, ProcessedJob,
};
use pretty_assertions::assert_eq;

fn processed(id: &str) -> ProcessedJob {
    ProcessedJob::unannotated(Job {
        id: id.to_string(),
        ciphertext: Some(id.to_string()),
        title: format!("Job {id}"),
        description: String::new(),
        posted_on: None,
        applied: false,
        budget: None,
        client: Client::default(),
        skills: Vec::new(),
    })
}

fn title_excluded(id: &str) -> ProcessedJob {
    ProcessedJob {
        is_excluded_by_title_filter: true,
        ..processed(id)
    }
}

#[test]
fn new_notifiable_excluded_and_seen_batch() {
    let mut seen = BoundedIdSet::from_ids(10, ["C"]);
    let deleted = BoundedIdSet::new(10);
    let mut collapsed = BTreeSet::new();
    let batch = vec![processed("A"), title_excluded("B"), processed("C")];

    let outcome = reconcile(&batch, &mut seen, &deleted, &mut collapsed);

    assert_eq!(outcome.new_count, 2);
    assert_eq!(outcome.notifiable_count, 1);
    assert_eq!(outcome.notifiable[0].id(), "A");
    assert!(seen.contains("A"));
    assert!(seen.contains("B"));
    assert_eq!(outcome.newly_seen, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(collapsed.into_iter().collect::<Vec<_>>(), vec!["B".to_string()]);
}

#[test]
fn deleted_ids_are_not_new_but_still_recorded_as_seen() {
    let mut seen = BoundedIdSet::new(10);
    let deleted = BoundedIdSet::from_ids(10, ["D"]);
    let mut collapsed = BTreeSet::new();

    let outcome = reconcile(&[processed("D")], &mut seen, &deleted, &mut collapsed);

    assert_eq!(outcome.new_count, 0);
    assert_eq!(outcome.notifiable_count, 0);
    assert!(seen.contains("D"));
}

#[test]
fn applied_jobs_are_new_but_not_notifiable() {
    let mut seen = BoundedIdSet::new(10);
    let mut applied = processed("E");
    applied.job.applied = true;

    let outcome = reconcile(
        &[applied],
        &mut seen,
        &BoundedIdSet::new(10),
        &mut BTreeSet::new(),
    );

    assert_eq!(outcome.new_count, 1);
    assert_eq!(outcome.notifiable_count, 0);
}

#[test]
fn duplicate_ids_in_one_batch_count_once() {
    let mut seen = BoundedIdSet::new(10);

    let outcome = reconcile(
        &[processed("A"), processed("A")],
        &mut seen,
        &BoundedIdSet::new(10),
        &mut BTreeSet::new(),
    );

    assert_eq!(outcome.new_count, 1);
    assert_eq!(outcome.notifiable_count, 1);
    assert_eq!(seen.len(), 1);
}

#[test]
fn seen_ids_survive_until_capacity_newer_ids_arrive() {
    let mut seen = BoundedIdSet::new(3);
    let deleted = BoundedIdSet::new(3);
    let mut collapsed = BTreeSet::new();

    reconcile(&[processed("old")], &mut seen, &deleted, &mut collapsed);
    let again = reconcile(&[processed("old")], &mut seen, &deleted, &mut collapsed);
    assert_eq!(again.new_count, 0);
    assert!(seen.contains("old"));

    let newer: Vec<_> = ["n1", "n2", "n3"].into_iter().map(processed).collect();
    reconcile(&newer, &mut seen, &deleted, &mut collapsed);

    assert!(!seen.contains("old"));
    assert_eq!(seen.to_vec(), vec!["n1", "n2", "n3"]);
    let returned = reconcile(&[processed("old")], &mut seen, &deleted, &mut collapsed);
    assert_eq!(returned.new_count, 1);
}

#[test]
fn recent_snapshot_drops_deleted_and_caps_length() {
    let batch: Vec<_> = ["a", "b", "c", "d"].into_iter().map(processed).collect();
    let deleted = BoundedIdSet::from_ids(10, ["b"]);

    let recent = recent_snapshot(&batch, &deleted, 2);

    let ids: Vec<_> = recent.iter().map(ProcessedJob::id).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[test]
fn bounded_set_remove_and_reinsert_moves_to_newest() {
    let mut set = BoundedIdSet::from_ids(2, ["a", "b"]);
    assert!(set.remove("a"));
    assert!(!set.remove("a"));
    assert!(set.insert("a"));
    assert!(set.insert("c"));

    assert_eq!(set.to_vec(), vec!["a", "c"]);
    assert_eq!(set.capacity(), 2);
}
