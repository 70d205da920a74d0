//! Contract Test: Reconciliation decisions
//!
//! Verifies the per-pass state machine:
//! - no record → exactly one create with the resolved IP
//! - record with the same value → no mutation
//! - record with a different value → exactly one update keyed by its id
//! - lookup errors abort the pass without mutation, except "not found"

mod common;

use aliddns_core::traits::{DnsRecord, RecordType};
use aliddns_core::{Error, RecordTarget, RecordTypePolicy, ReconcileOutcome, Reconciler};
use common::*;

fn www() -> RecordTarget {
    RecordTarget::new("www", "example.com")
}

#[tokio::test]
async fn missing_record_is_created() {
    let mock = MockDnsProvider::new();
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    let outcome = reconciler.reconcile(&www(), ip("1.2.3.4")).await.unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Created { .. }));
    assert_eq!(
        mock.mutations(),
        vec![Mutation::Create {
            rr: "www".to_string(),
            zone: "example.com".to_string(),
            record_type: RecordType::A,
            ip: "1.2.3.4".to_string(),
        }]
    );
}

#[tokio::test]
async fn matching_record_is_left_alone() {
    let mock = MockDnsProvider::new().with_a_record("rec1", "www", "example.com", "1.2.3.4");
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    let outcome = reconciler.reconcile(&www(), ip("1.2.3.4")).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Unchanged { ip: ip("1.2.3.4") });
    assert!(mock.mutations().is_empty());
    assert_eq!(mock.lookup_count(), 1);
}

#[tokio::test]
async fn changed_ip_updates_existing_record() {
    let mock = MockDnsProvider::new().with_a_record("rec1", "www", "example.com", "1.2.3.4");
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    let outcome = reconciler.reconcile(&www(), ip("5.6.7.8")).await.unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome::Updated {
            record_id: "rec1".to_string(),
            previous: "1.2.3.4".to_string(),
            ip: ip("5.6.7.8"),
        }
    );
    assert_eq!(
        mock.mutations(),
        vec![Mutation::Update {
            record_id: "rec1".to_string(),
            rr: "www".to_string(),
            record_type: RecordType::A,
            ip: "5.6.7.8".to_string(),
        }]
    );
    assert_eq!(mock.creates(), 0);
}

#[tokio::test]
async fn second_pass_with_same_ip_is_a_no_op() {
    let mock = MockDnsProvider::new();
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    let first = reconciler.reconcile(&www(), ip("1.2.3.4")).await.unwrap();
    let second = reconciler.reconcile(&www(), ip("1.2.3.4")).await.unwrap();

    assert!(first.mutated());
    assert!(!second.mutated());
    assert_eq!(mock.mutations().len(), 1, "at most one mutation across two passes");
}

#[tokio::test]
async fn created_record_is_updated_not_recreated() {
    let mock = MockDnsProvider::new();
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    reconciler.reconcile(&www(), ip("1.2.3.4")).await.unwrap();
    let outcome = reconciler.reconcile(&www(), ip("5.6.7.8")).await.unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Updated { .. }));
    assert_eq!(mock.creates(), 1);
    assert_eq!(mock.updates(), 1);
    assert_eq!(mock.records().len(), 1);
}

#[tokio::test]
async fn lookup_failure_aborts_without_mutation() {
    let mock = MockDnsProvider::new().with_lookup(LookupBehavior::Fail);
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    let err = reconciler.reconcile(&www(), ip("1.2.3.4")).await.unwrap_err();

    assert!(matches!(err, Error::Provider { .. }));
    assert!(mock.mutations().is_empty());
}

#[tokio::test]
async fn not_found_lookup_error_routes_to_create() {
    let mock = MockDnsProvider::new().with_lookup(LookupBehavior::NotFoundError);
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    let outcome = reconciler.reconcile(&www(), ip("1.2.3.4")).await.unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Created { .. }));
    assert_eq!(mock.creates(), 1);
}

#[tokio::test]
async fn failed_create_is_reported_once() {
    let mock = MockDnsProvider::new().failing_mutations();
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    let result = reconciler.reconcile(&www(), ip("1.2.3.4")).await;

    assert!(result.is_err());
    assert_eq!(mock.creates(), 1, "no retry after a failed create");
}

#[tokio::test]
async fn failed_update_is_reported_once() {
    let mock = MockDnsProvider::new()
        .with_a_record("rec1", "www", "example.com", "1.2.3.4")
        .failing_mutations();
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    let result = reconciler.reconcile(&www(), ip("5.6.7.8")).await;

    assert!(result.is_err());
    assert_eq!(mock.updates(), 1, "no retry after a failed update");
    assert_eq!(mock.creates(), 0);
}

#[tokio::test]
async fn records_with_other_labels_are_ignored() {
    // The provider hands back a sibling label's record for the "home" query
    let mock = MockDnsProvider::new()
        .with_a_record("rec9", "www", "example.com", "9.9.9.9")
        .with_lookup(LookupBehavior::Unfiltered);
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    let outcome = reconciler
        .reconcile(&RecordTarget::new("home", "example.com"), ip("1.2.3.4"))
        .await
        .unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Created { .. }));
    assert_eq!(
        mock.mutations(),
        vec![Mutation::Create {
            rr: "home".to_string(),
            zone: "example.com".to_string(),
            record_type: RecordType::A,
            ip: "1.2.3.4".to_string(),
        }]
    );
    assert_eq!(mock.updates(), 0);
}

#[tokio::test]
async fn records_of_another_type_are_ignored() {
    let mock = MockDnsProvider::new()
        .with_record(DnsRecord {
            id: "rec6".to_string(),
            rr: "www".to_string(),
            domain_name: "example.com".to_string(),
            record_type: Some(RecordType::Aaaa),
            value: "2001:db8::1".to_string(),
            ttl: Some(600),
            line: Some("default".to_string()),
        })
        .with_lookup(LookupBehavior::Unfiltered);
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    let outcome = reconciler.reconcile(&www(), ip("1.2.3.4")).await.unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Created { .. }));
    assert_eq!(mock.creates(), 1);
    assert_eq!(mock.updates(), 0);
}

#[tokio::test]
async fn apex_record_is_looked_up_by_zone_name() {
    let mock = MockDnsProvider::new().with_a_record("rec1", "@", "example.com", "1.2.3.4");
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    let outcome = reconciler
        .reconcile(&RecordTarget::new("@", "example.com"), ip("1.2.3.4"))
        .await
        .unwrap();

    assert!(!outcome.mutated());
}

#[tokio::test]
async fn ipv6_rejected_for_a_policy_before_any_call() {
    let mock = MockDnsProvider::new();
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    let err = reconciler.reconcile(&www(), ip("2001:db8::1")).await.unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(mock.lookup_count(), 0);
}

#[tokio::test]
async fn auto_policy_manages_aaaa_separately() {
    let mock = MockDnsProvider::new().with_a_record("rec1", "www", "example.com", "1.2.3.4");
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::Auto,
    );

    let outcome = reconciler.reconcile(&www(), ip("2001:db8::1")).await.unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Created { .. }));
    assert_eq!(
        mock.mutations(),
        vec![Mutation::Create {
            rr: "www".to_string(),
            zone: "example.com".to_string(),
            record_type: RecordType::Aaaa,
            ip: "2001:db8::1".to_string(),
        }]
    );
}

#[tokio::test]
async fn only_first_duplicate_record_is_updated() {
    let duplicate = DnsRecord {
        id: "rec2".to_string(),
        rr: "www".to_string(),
        domain_name: "example.com".to_string(),
        record_type: Some(RecordType::A),
        value: "4.4.4.4".to_string(),
        ttl: None,
        line: None,
    };
    let mock = MockDnsProvider::new()
        .with_a_record("rec1", "www", "example.com", "1.2.3.4")
        .with_record(duplicate);
    let reconciler = Reconciler::new(
        Box::new(MockDnsProvider::sharing_state_with(&mock)),
        RecordTypePolicy::A,
    );

    reconciler.reconcile(&www(), ip("5.6.7.8")).await.unwrap();

    assert_eq!(
        mock.mutations(),
        vec![Mutation::Update {
            record_id: "rec1".to_string(),
            rr: "www".to_string(),
            record_type: RecordType::A,
            ip: "5.6.7.8".to_string(),
        }]
    );
}
