use memoir_cli::cli::{config, load_config, open_manager};

#[test]
fn validate_flags_bad_cap() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[history]\nmax_history_length = 1\n").unwrap();

    let (cfg, used) = load_config(Some(&path)).unwrap();
    assert!(!config::validate(&cfg, &used));
    assert!(open_manager(&cfg, &used).is_err());
}

#[tokio::test]
async fn manager_reads_history_from_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        format!("[history]\nstate_dir = {:?}\n", state.display().to_string()),
    )
    .unwrap();
    std::fs::create_dir_all(&state).unwrap();
    std::fs::write(
        state.join("lanlan.json"),
        r#"[{"role": "human", "content": "hi"}, {"role": "ai", "content": "hello"}]"#,
    )
    .unwrap();

    let (cfg, used) = load_config(Some(&path)).unwrap();
    assert!(config::validate(&cfg, &used));
    let manager = open_manager(&cfg, &used).unwrap();
    let history = manager.get_recent_history("lanlan").await;
    assert_eq!(history.len(), 2);
}
