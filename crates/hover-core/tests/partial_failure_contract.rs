//! Contract: failures are contained to the offending host and family
//!
//! Verified here:
//! - A failed upsert for one family does not stop the other family of the
//!   same host, nor any later host
//! - A domain that cannot be resolved fails only its own hosts; the run
//!   carries on with the next domain, without retrying

mod common;

use std::net::IpAddr;

use common::*;
use hover_core::config::{DomainTarget, RecordType};
use hover_core::engine::EngineSettings;
use hover_core::report::Outcome;
use hover_core::ReconcileEngine;

#[tokio::test]
async fn one_failed_family_does_not_stop_the_rest() {
    let published_v4: IpAddr = "203.0.113.5".parse().unwrap();
    let published_v6: IpAddr = "2001:db8::5".parse().unwrap();

    let mut settings = v4_settings("example.com", &["home", "vpn"]);
    settings.ipv6 = true;

    let resolver = FixedIpResolver::new(
        Some("203.0.113.9".parse().unwrap()),
        Some("2001:db8::9".parse().unwrap()),
    );
    let checker = TableChecker::new(vec![
        ("home.example.com".to_string(), RecordType::A, published_v4),
        ("home.example.com".to_string(), RecordType::Aaaa, published_v6),
        ("vpn.example.com".to_string(), RecordType::A, published_v4),
        ("vpn.example.com".to_string(), RecordType::Aaaa, published_v6),
    ]);
    let client =
        ScriptedClient::new(vec![("example.com", "d1")]).with_failing_upsert("home", RecordType::A);
    let client_probe = ScriptedClient::sharing_counters_with(&client);

    let engine = ReconcileEngine::new(
        settings,
        Box::new(resolver),
        Box::new(checker),
        Box::new(client),
    );

    let report = engine.run_once().await;

    // All four records were attempted despite the first one failing.
    assert_eq!(client_probe.upserts().len(), 4);
    assert_eq!(report.outcomes.len(), 4);
    assert!(matches!(
        report.outcomes[0].outcome,
        Outcome::Failed { .. }
    ));
    for outcome in &report.outcomes[1..] {
        assert!(
            matches!(outcome.outcome, Outcome::Updated { .. }),
            "later records must still be updated: {outcome:?}"
        );
    }
    assert!(report.has_failures());
    assert!(report.aborted.is_none(), "an upsert failure never aborts");
}

#[tokio::test]
async fn unresolvable_domain_fails_only_its_own_hosts() {
    let published: IpAddr = "203.0.113.5".parse().unwrap();

    let settings = EngineSettings {
        domains: vec![
            DomainTarget::new("missing.test", vec!["home".to_string(), "vpn".to_string()]),
            DomainTarget::new("example.com", vec!["home".to_string()]),
        ],
        force_update: false,
        dry_run: false,
        ipv4: true,
        ipv6: false,
        ipv4_override: None,
        ipv6_override: None,
    };

    let resolver = FixedIpResolver::new(Some("203.0.113.9".parse().unwrap()), None);
    let checker = TableChecker::new(vec![
        ("home.missing.test".to_string(), RecordType::A, published),
        ("vpn.missing.test".to_string(), RecordType::A, published),
        ("home.example.com".to_string(), RecordType::A, published),
    ]);
    // The scripted client only knows example.com.
    let client = ScriptedClient::new(vec![("example.com", "d2")]);
    let client_probe = ScriptedClient::sharing_counters_with(&client);

    let engine = ReconcileEngine::new(
        settings,
        Box::new(resolver),
        Box::new(checker),
        Box::new(client),
    );

    let report = engine.run_once().await;

    // Both hosts of the missing domain failed, but the resolution itself
    // was attempted only once for that domain.
    assert_eq!(report.outcomes.len(), 3);
    assert!(matches!(report.outcomes[0].outcome, Outcome::Failed { .. }));
    assert!(matches!(report.outcomes[1].outcome, Outcome::Failed { .. }));
    assert!(matches!(report.outcomes[2].outcome, Outcome::Updated { .. }));
    assert_eq!(client_probe.domain_calls(), 2, "one resolution per domain");
    assert_eq!(
        client_probe.upserts(),
        vec![(
            "d2".to_string(),
            "home".to_string(),
            "203.0.113.9".parse::<IpAddr>().unwrap(),
            RecordType::A
        )]
    );
}
