use scoutlite::config::ScoutConfig;
use scoutlite::ScoutError;
use std::collections::HashMap;

#[test]
fn file_then_env_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scoutlite.toml");
    std::fs::write(
        &path,
        "[pagination]\ndefault_limit = 10\nmax_limit = 40\n\n[telemetry]\nslow_query_ms = 50\n\n[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();
    let mut cfg = ScoutConfig::from_file(&path).unwrap();
    assert_eq!(cfg.pagination.default_limit, 10);
    assert_eq!(cfg.telemetry.slow_query_ms, 50);
    assert_eq!(cfg.logging.level.as_deref(), Some("debug"));

    let env: HashMap<&str, &str> = [("SCOUTLITE_MAX_LIMIT", "60"), ("SCOUTLITE_SLOW_QUERY_MS", "5")].into();
    cfg.apply_env(|k| env.get(k).map(|v| (*v).to_string())).unwrap();
    assert_eq!(cfg.pagination.max_limit, 60);
    assert_eq!(cfg.pagination.default_limit, 10);
    assert_eq!(cfg.telemetry.slow_query_ms, 5);
}

#[test]
fn explicit_path_wins_and_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[pagination]\ndefault_limit = 3\n").unwrap();
    let cfg = ScoutConfig::load(Some(&path)).unwrap();
    assert_eq!(cfg.pagination.default_limit, 3);
    assert_eq!(cfg.pagination.max_limit, 100);

    let err = ScoutConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
    assert!(matches!(err, ScoutError::Config(_)));
}

#[test]
fn inconsistent_values_are_rejected() {
    assert!(matches!(
        ScoutConfig::from_toml_str("[pagination]\ndefault_limit = 50\nmax_limit = 10\n"),
        Err(ScoutError::Config(_))
    ));
    assert!(matches!(ScoutConfig::from_toml_str("[pagination]\nmax_limit = 0\n"), Err(ScoutError::Config(_))));
    assert!(matches!(ScoutConfig::from_toml_str("[pagination\n"), Err(ScoutError::Toml(_))));

    let mut cfg = ScoutConfig::default();
    let err = cfg.apply_env(|k| (k == "SCOUTLITE_DEFAULT_LIMIT").then(|| "many".to_string())).unwrap_err();
    assert!(matches!(err, ScoutError::Config(_)));
}
