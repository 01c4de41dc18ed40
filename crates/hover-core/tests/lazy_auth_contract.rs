//! Contract: authentication is lazy, single, and run-fatal on failure
//!
//! Verified here:
//! - Across N hosts all requiring updates, login happens exactly once
//! - A login failure abandons the remainder of the run; no host after the
//!   failing one is mutated
//! - A fresh run starts unauthenticated again (sessions never outlive a run)

mod common;

use std::net::IpAddr;

use common::*;
use hover_core::config::RecordType;
use hover_core::ReconcileEngine;

fn divergent_setup(hosts: &[&str]) -> (FixedIpResolver, TableChecker, ScriptedClient) {
    let published: IpAddr = "203.0.113.5".parse().unwrap();
    let resolver = FixedIpResolver::new(Some("203.0.113.9".parse().unwrap()), None);
    let checker = TableChecker::new(
        hosts
            .iter()
            .map(|h| (format!("{h}.example.com"), RecordType::A, published))
            .collect(),
    );
    let client = ScriptedClient::new(vec![("example.com", "d1")]);
    (resolver, checker, client)
}

#[tokio::test]
async fn login_happens_exactly_once_across_many_hosts() {
    let hosts = ["home", "vpn", "nas"];
    let (resolver, checker, client) = divergent_setup(&hosts);
    let client_probe = ScriptedClient::sharing_counters_with(&client);

    let engine = ReconcileEngine::new(
        v4_settings("example.com", &hosts),
        Box::new(resolver),
        Box::new(checker),
        Box::new(client),
    );

    let report = engine.run_once().await;

    assert_eq!(client_probe.login_calls(), 1, "one session per run");
    assert_eq!(client_probe.upserts().len(), 3);
    assert!(!report.has_failures());
}

#[tokio::test]
async fn login_failure_abandons_the_rest_of_the_run() {
    let hosts = ["home", "vpn", "nas"];
    let (resolver, checker, client) = divergent_setup(&hosts);
    let client = client.with_failing_login();
    let client_probe = ScriptedClient::sharing_counters_with(&client);

    let engine = ReconcileEngine::new(
        v4_settings("example.com", &hosts),
        Box::new(resolver),
        Box::new(checker),
        Box::new(client),
    );

    let report = engine.run_once().await;

    assert!(report.aborted.is_some(), "run must record the abort");
    assert!(report.has_failures());
    assert!(client_probe.upserts().is_empty(), "nothing can be mutated");
    // Only the record that triggered the login attempt gets an outcome;
    // hosts after it are not visited at all.
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(client_probe.login_calls(), 1, "login is never retried");
}

#[tokio::test]
async fn each_run_establishes_its_own_session() {
    let hosts = ["home"];
    let (resolver, checker, client) = divergent_setup(&hosts);
    let client_probe = ScriptedClient::sharing_counters_with(&client);

    let engine = ReconcileEngine::new(
        v4_settings("example.com", &hosts),
        Box::new(resolver),
        Box::new(checker),
        Box::new(client),
    );

    engine.run_once().await;
    engine.run_once().await;

    assert_eq!(
        client_probe.login_calls(),
        2,
        "a session never carries over into the next run"
    );
}
