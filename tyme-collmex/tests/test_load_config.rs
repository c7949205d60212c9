use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::NamedTempFile;
use tyme_collmex::load_config::{load_config, DEFAULT_BASE_URL, PASSWORD_ENV};
use tyme_collmex_core::marker::IdMarkers;
use tyme_collmex_core::record::LoginRecord;
use tyme_collmex_core::span::MidnightEnd;

fn config_file(yaml: &str) -> NamedTempFile {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), yaml).unwrap();
    config_file
}

/// A complete config loads, and the password is taken from the environment.
#[test]
#[serial]
fn test_load_config_success_with_password_from_env() {
    let config_yaml = r#"
collmex:
  customer_id: "111111"
  user: "2222222"
  use_api: true
  base_url: http://localhost:8080/
conversion:
  employee_id: 7
  company_id: 2
  id_marker:
    start: "("
    end: ")"
  break_time: "00:30"
  strict: false
  midnight_end: drop
"#;
    let file = config_file(config_yaml);
    env::set_var(PASSWORD_ENV, "secret");

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.collmex.customer_id, "111111");
    assert!(config.collmex.use_api);
    assert_eq!(
        config.collmex.endpoint(),
        "http://localhost:8080/cgi-bin/cgi.exe?111111,0,data_exchange"
    );
    assert_eq!(
        config.collmex.login().unwrap(),
        LoginRecord::new("2222222", "secret")
    );
    assert_eq!(config.conversion.employee_id, 7);
    assert_eq!(config.conversion.company_id, 2);
    assert_eq!(config.conversion.markers, IdMarkers::new('(', ')'));
    assert_eq!(config.conversion.break_time, "00:30");
    assert!(!config.conversion.strict);
    assert_eq!(config.conversion.midnight_end, MidnightEnd::Drop);

    env::remove_var(PASSWORD_ENV);
}

/// Optional keys fall back to their defaults and unquoted numbers are accepted.
#[test]
#[serial]
fn test_load_config_defaults() {
    let config_yaml = r#"
collmex:
  customer_id: 111111
  user: 2222222
conversion:
  employee_id: 1
  company_id: 1
"#;
    let file = config_file(config_yaml);
    env::remove_var(PASSWORD_ENV);

    let config = load_config(file.path()).expect("Config should load with defaults");

    assert_eq!(config.collmex.customer_id, "111111");
    assert_eq!(config.collmex.user, "2222222");
    assert!(!config.collmex.use_api);
    assert_eq!(config.collmex.base_url, DEFAULT_BASE_URL);
    assert!(config.collmex.password.is_none());
    assert_eq!(config.conversion.markers, IdMarkers::default());
    assert_eq!(config.conversion.break_time, "00:00");
    assert!(config.conversion.strict);
    assert_eq!(config.conversion.midnight_end, MidnightEnd::Keep);

    let err = config.collmex.login().unwrap_err();
    assert!(err.to_string().contains(PASSWORD_ENV));
}

/// If the config file is not valid YAML, load_config errors and reports as such.
#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    let file = config_file("not-yaml: [:::");
    let err = load_config(file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_load_config_errors_for_missing_file() {
    let err = load_config("does/not/exist.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
#[serial]
fn test_load_config_rejects_long_markers() {
    let config_yaml = r#"
collmex:
  customer_id: "111111"
  user: "2222222"
conversion:
  employee_id: 1
  company_id: 1
  id_marker:
    start: "[["
    end: "]"
"#;
    let file = config_file(config_yaml);
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("id_marker.start"));
}

#[test]
#[serial]
fn test_load_config_rejects_zero_ids() {
    let config_yaml = r#"
collmex:
  customer_id: "111111"
  user: "2222222"
conversion:
  employee_id: 0
  company_id: 1
"#;
    let file = config_file(config_yaml);
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("must be positive"));
}

#[test]
#[serial]
fn test_load_config_rejects_bad_break_time() {
    for break_time in ["30", "0:30", "24:00", "half an hour"] {
        let config_yaml = format!(
            "collmex:\n  customer_id: \"111111\"\n  user: \"2222222\"\nconversion:\n  employee_id: 1\n  company_id: 1\n  break_time: \"{break_time}\"\n"
        );
        let file = config_file(&config_yaml);
        let err = load_config(file.path()).unwrap_err();
        assert!(
            err.to_string().contains("conversion.break_time"),
            "break_time {break_time:?} should be rejected, got: {err}"
        );
    }
}

#[test]
#[serial]
fn test_load_config_rejects_unknown_midnight_end() {
    let config_yaml = r#"
collmex:
  customer_id: "111111"
  user: "2222222"
conversion:
  employee_id: 1
  company_id: 1
  midnight_end: sometimes
"#;
    let file = config_file(config_yaml);
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config YAML"));
}
