use memoir_domain::config::{Config, ConfigSeverity};

#[test]
fn default_history_cap_is_ten() {
    let config = Config::default();
    assert_eq!(config.history.max_history_length, 10);
    assert!(config.history.auto_review);
    assert_eq!(config.history.summary_char_limit, 500);
    assert_eq!(config.history.max_retries, 3);
}

#[test]
fn empty_toml_fills_every_section() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.history.base_backoff_ms, 1_000);
    assert_eq!(config.names.human, "User");
    assert!(config.identities.is_empty());
}

#[test]
fn identity_log_override_parses() {
    let toml_str = r#"
[names]
human = "主人"

[identities.lanlan]
log_path = "/var/lib/memoir/lanlan.json"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.names.human, "主人");
    assert_eq!(config.names.system, "System");
    assert_eq!(
        config.identities["lanlan"].log_path.as_deref(),
        Some(std::path::Path::new("/var/lib/memoir/lanlan.json"))
    );
    assert!(!config.identities.contains_key("other"));
}

#[test]
fn auto_review_can_be_disabled() {
    let toml_str = r#"
[history]
auto_review = false
max_history_length = 4
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(!config.history.auto_review);
    assert_eq!(config.history.max_history_length, 4);
}

#[test]
fn empty_model_fails_validation() {
    let toml_str = r#"
[llm]
summary_model = ""
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.severity == ConfigSeverity::Error && i.field == "llm.summary_model"));
}
