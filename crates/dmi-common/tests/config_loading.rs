//! ---
//! dmi_section: "15-testing"
//! dmi_subsection: "integration"
//! dmi_type: "source"
//! dmi_scope: "test"
//! dmi_description: "Configuration file resolution tests."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use std::path::Path;
use std::time::Duration;

use dmi_common::AppConfig;

#[test]
fn first_existing_candidate_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing.toml");
    let present = dir.path().join("dmi.toml");
    std::fs::write(&present, "[invocation]\nresponse_timeout = 42\n").expect("write config");

    let loaded = AppConfig::load_with_source(&[missing, present.clone()]).expect("config loads");
    assert_eq!(loaded.source.as_deref(), Some(present.as_path()));
    assert_eq!(
        loaded.config.invocation.response_timeout,
        Duration::from_secs(42)
    );
}

#[test]
fn no_candidate_is_an_error_for_strict_loading() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = AppConfig::load(&[dir.path().join("nope.toml")]).expect_err("nothing to load");
    assert!(err.to_string().contains("no configuration files found"));
}

#[test]
fn lenient_loading_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = AppConfig::load_or_default(None, &[dir.path().join("nope.toml")])
        .expect("defaults used");
    assert!(loaded.source.is_none());
    assert_eq!(loaded.config.runtime.queue_capacity, 64);
}

#[test]
fn explicit_path_must_exist_and_parse() {
    let dir = tempfile::tempdir().expect("tempdir");
    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "[service\n").expect("write config");

    let candidates: [&Path; 0] = [];
    let err = AppConfig::load_or_default(Some(broken.as_path()), &candidates).expect_err("parse fails");
    assert!(format!("{err:#}").contains("failed to parse config file"));

    let missing = dir.path().join("missing.toml");
    assert!(AppConfig::load_or_default(Some(missing.as_path()), &candidates).is_err());
}

#[test]
fn shipped_sample_parses() {
    let config: AppConfig = include_str!("../../../configs/dmi.example.toml")
        .parse()
        .expect("sample config parses");
    assert!(config.invocation.connection_string.is_none());
    assert_eq!(config.service.endpoint.as_str(), "http://127.0.0.1:8081/");
    assert_eq!(config.service.request_timeout, Duration::from_secs(30));
    assert_eq!(config.runtime.queue_capacity, 64);
}
