//! Resolution property tests
//!
//! Tie-breaking between wildcard tiers, inheritance short-circuiting, cycle
//! safety, default fallback and payload normalization through the public API.

use anyhow::Result;
use lightacl::prelude::*;
use serde_json::{Value, json};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_guest_admin_scenario() -> Result<()> {
    init_tracing();

    let mut acl = Acl::parse(&json!({
        "Guest": [null, "routes!*", {"routes!profile": false}],
        "Admin": ["Guest", "*!*"]
    }))?;
    acl.set_default_action(false).set_audit_logging(true);

    assert!(acl.is_allowed("Guest", "routes", "list"));
    assert!(!acl.is_allowed("Guest", "routes", "profile"));
    assert!(acl.is_allowed("Admin", "routes", "profile"));
    assert!(!acl.is_allowed("Guest", "other", "x"));
    assert!(acl.is_allowed("Admin", "other", "x"));
    Ok(())
}

#[test]
fn test_tier_order_within_a_role() {
    let mut acl = Acl::new();
    acl.set_default_action(false)
        .allow("R", "*", "*")
        .deny("R", "*", "read")
        .allow("R", "docs", "*")
        .deny("R", "docs", "read");

    // exact > resource wildcard > action wildcard > both
    assert!(!acl.evaluate("R", "docs", "read").allowed);
    assert!(acl.evaluate("R", "docs", "write").allowed);
    assert!(!acl.evaluate("R", "logs", "read").allowed);
    assert!(acl.evaluate("R", "logs", "write").allowed);

    acl.revoke("R", "docs", "read");
    let decision = acl.evaluate("R", "docs", "read");
    assert!(decision.allowed);
    assert_eq!(decision.matched.unwrap().key, &GrantKey::new("R", "docs", "*"));
}

#[test]
fn test_own_grant_beats_any_parent_grant() {
    let mut acl = Acl::new();
    acl.register_role("Child", "Parent")
        .deny("Child", "*", "*")
        .allow("Parent", "docs", "read");

    assert!(!acl.evaluate("Child", "docs", "read").allowed);
    assert!(acl.evaluate("Parent", "docs", "read").allowed);
}

#[test]
fn test_first_parent_with_any_grant_decides() {
    let mut acl = Acl::new();
    acl.set_default_action(true)
        .register_role("Child", ["Strict", "Lenient"])
        .deny("Strict", "docs", "*")
        .allow("Lenient", "docs", "read");

    let decision = acl.evaluate("Child", "docs", "read");
    assert!(!decision.allowed);
    assert_eq!(decision.matched.unwrap().key.role, "Strict");

    // Swapping declaration order swaps the outcome.
    let mut swapped = Acl::new();
    swapped
        .register_role("Child", ["Lenient", "Strict"])
        .deny("Strict", "docs", "*")
        .allow("Lenient", "docs", "read");
    assert!(swapped.evaluate("Child", "docs", "read").allowed);
}

#[test]
fn test_cycles_terminate() {
    let mut acl = Acl::new();
    acl.add_inherit("A", "B")
        .add_inherit("B", "C")
        .add_inherit("C", "A")
        .add_inherit("A", "A");

    for default_action in [true, false] {
        acl.set_default_action(default_action);
        assert_eq!(acl.is_allowed("A", "x", "y"), default_action);
        assert!(acl.matched_access_key().is_none());
    }

    acl.allow("C", "x", "*");
    assert!(acl.is_allowed("A", "x", "y"));
    assert_eq!(acl.parents("A"), ["B".to_string()]);
}

#[test]
fn test_unknown_names_fall_back_to_default() {
    let mut acl = Acl::new();
    acl.allow("Guest", "routes", "list");

    assert!(acl.evaluate("Ghost", "routes", "list").allowed);
    acl.set_default_action(false);
    let decision = acl.evaluate("Guest", "nowhere", "nothing");
    assert!(!decision.allowed);
    assert!(decision.is_default());
    assert_eq!(acl.roles().count(), 1);
}

#[test]
fn test_payload_normalization() {
    let mut acl = Acl::new();
    acl.allow_with("R", "a", "null", json!(null))
        .allow_with("R", "a", "true", json!(true))
        .allow_with("R", "a", "false", json!(false))
        .allow_with("R", "a", "empty", json!([]))
        .allow_with("R", "a", "flags", json!(["own", "audit"]))
        .allow_with("R", "a", "map", json!({"limit": 10}))
        .allow_with("R", "a", "scalar", json!(3));

    assert_eq!(acl.lookup("R", "a", "null"), Some(&Grant::Allow));
    assert_eq!(acl.lookup("R", "a", "true"), Some(&Grant::Allow));
    assert_eq!(acl.lookup("R", "a", "false"), Some(&Grant::Deny));
    assert_eq!(acl.lookup("R", "a", "empty"), Some(&Grant::Allow));

    assert!(acl.is_allowed("R", "a", "flags"));
    assert_eq!(acl.matched_rules(), Some(&json!({"own": true, "audit": true})));
    assert!(acl.is_allowed("R", "a", "map"));
    assert_eq!(acl.matched_rules(), Some(&json!({"limit": 10})));
    assert!(acl.is_allowed("R", "a", "scalar"));
    assert_eq!(acl.matched_rules(), Some(&json!(3)));
}

#[test]
fn test_regrant_replaces_previous() {
    let mut acl = Acl::new();
    acl.allow("R", "docs", "read");
    acl.deny("R", "docs", "read");

    assert_eq!(acl.lookup("R", "docs", "read"), Some(&Grant::Deny));
    assert_eq!(acl.table().len(), 1);
    assert_eq!(acl.revoke("R", "docs", "read"), Some(Grant::Deny));
    assert_eq!(acl.revoke("R", "docs", "read"), None);
    assert!(acl.roles().any(|role| role == "R"));
}

#[test]
fn test_builder_matches_incremental_construction() -> Result<()> {
    let built = Acl::builder()
        .with_default_action(false)
        .with_role("Admin", "Guest")
        .with_allow("Guest", "routes", "*")
        .with_deny("Guest", "routes", "profile")
        .with_allow("Admin", "*", "*")
        .build()?;

    let mut manual = Acl::new();
    manual
        .set_default_action(false)
        .register_role("Admin", "Guest")
        .allow("Guest", "routes", "*")
        .deny("Guest", "routes", "profile")
        .allow("Admin", "*", "*");

    assert_eq!(built, manual);
    Ok(())
}

#[test]
fn test_separator_in_names() -> Result<()> {
    let mut acl = Acl::new();
    acl.allow("R", "docs", "read!all");
    let exported = acl.to_config()?;
    assert_eq!(Acl::from_config(&exported)?, acl);

    acl.allow("R", "weird!resource", "read");
    assert!(acl.evaluate("R", "weird!resource", "read").allowed);
    assert!(matches!(
        acl.to_config(),
        Err(AclError::UnrepresentableEndpoint { .. })
    ));
    Ok(())
}

#[test]
fn test_invalid_configurations_are_rejected() {
    let cases = [
        json!(["not", "a", "map"]),
        json!({"Guest": "routes!*"}),
        json!({"Guest": []}),
        json!({"Guest": [null, "no-separator"]}),
        json!({"Guest": [null, 42]}),
        json!({"Guest": [7, "routes!*"]}),
    ];

    for case in cases {
        assert!(Acl::parse(&case).is_err(), "accepted {case}");
    }
}

#[test]
fn test_raw_payload_grants_survive_export() -> Result<()> {
    let raw_payloads = [
        json!(false),
        json!(true),
        Value::Null,
        json!({}),
        json!([]),
        json!(["own", {"limit": 5}]),
        json!({"only": "Guest"}),
        json!("summary"),
        json!(12),
    ];

    let mut acl = Acl::new();
    acl.set_default_action(false);
    for (i, payload) in raw_payloads.iter().enumerate() {
        acl.grant(
            "R",
            "docs",
            &format!("a{i}"),
            Grant::AllowWithPayload(payload.clone()),
        );
    }
    let mut builder = Acl::builder().with_default_action(false);
    for (i, payload) in raw_payloads.iter().enumerate() {
        builder = builder.with_grant(
            "R",
            "docs",
            &format!("a{i}"),
            Grant::AllowWithPayload(payload.clone()),
        );
    }
    assert_eq!(builder.build()?, acl);

    let mut reimported = Acl::from_config(&acl.to_config()?)?;
    reimported.set_default_action(false);
    assert_eq!(reimported, acl);

    for i in 0..raw_payloads.len() {
        let action = format!("a{i}");
        let before = acl.evaluate("R", "docs", &action);
        let after = reimported.evaluate("R", "docs", &action);
        assert!(before.allowed, "a{i} should allow");
        assert_eq!(before.allowed, after.allowed, "answer changed for a{i}");
        assert_eq!(before.payload(), after.payload(), "payload changed for a{i}");
    }
    Ok(())
}

#[test]
fn test_empty_payloads_kept_on_import() -> Result<()> {
    let mut acl = Acl::parse(&json!({
        "Guest": [null, {"docs!read": []}, {"docs!list": {}}, {"docs!view": null}]
    }))?;

    assert!(acl.is_allowed("Guest", "docs", "read"));
    assert_eq!(acl.matched_rules(), Some(&json!({})));
    assert!(acl.is_allowed("Guest", "docs", "list"));
    assert_eq!(acl.matched_rules(), Some(&json!({})));
    assert!(acl.is_allowed("Guest", "docs", "view"));
    assert_eq!(acl.matched_rules(), None);

    acl.allow_with("Guest", "docs", "read", json!([]));
    assert_eq!(acl.lookup("Guest", "docs", "read"), Some(&Grant::Allow));
    Ok(())
}

#[test]
fn test_null_payload_decides_without_parents() -> Result<()> {
    let mut acl = Acl::parse(&json!({
        "Parent": [null, {"docs!read": false}],
        "Child": ["Parent", {"docs!read": null}]
    }))?;
    acl.set_default_action(false);

    assert!(acl.is_allowed("Child", "docs", "read"));
    assert_eq!(
        acl.matched_access_key(),
        Some(&GrantKey::new("Child", "docs", "read"))
    );
    assert!(!acl.is_allowed("Parent", "docs", "read"));
    Ok(())
}

#[test]
fn test_reverse_query_is_audited() {
    let mut acl = Acl::new();
    acl.set_default_action(false)
        .set_audit_logging(true)
        .allow("Guest", "routes", "*")
        .register_role("Admin", "Guest")
        .deny("Admin", "routes", "*")
        .add_role("Visitor");

    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();

    let holders: Vec<String> = tracing::subscriber::with_default(subscriber, || {
        acl.which_roles_have_access("routes", "list")
            .keys()
            .map(|role| role.to_string())
            .collect()
    });
    assert_eq!(holders, vec!["Guest".to_string()]);

    let output = logs.contents();
    assert_eq!(output.matches("Access check").count(), 3);
    assert_eq!(output.matches("granted").count(), 1);
    assert_eq!(output.matches("denied").count(), 2);
}
