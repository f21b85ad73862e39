use super::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(prefix: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("duration")
        .as_nanos();
    std::env::temp_dir().join(format!("turtle-world-tests-{prefix}-{unique}.toml"))
}

fn overrides(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn partial_toml_keeps_defaults_for_missing_keys() {
    let config: TurtleConfig = toml::from_str(
        r#"
fuel_required = false
normal_fuel_limit = 500

[fuel_values]
blaze_rod = 120
"#,
    )
    .expect("parse config");

    assert!(!config.fuel_required);
    assert_eq!(config.normal_fuel_limit, 500);
    assert_eq!(config.advanced_fuel_limit, DEFAULT_ADVANCED_FUEL_LIMIT);
    assert_eq!(config.animation_duration_ticks, DEFAULT_ANIMATION_DURATION_TICKS);
    assert_eq!(config.fuel_value("blaze_rod"), Some(120));
    assert_eq!(config.fuel_value("coal"), None);
}

#[test]
fn overrides_replace_individual_keys() {
    let env = overrides(&[
        (ENV_FUEL_REQUIRED, "off"),
        (ENV_FUEL_LIMIT, " 1200 "),
        (ENV_TICK_BUDGET_MS, "0"),
        (ENV_TICK_RATE_HZ, ""),
    ]);
    let config = TurtleConfig::default()
        .with_overrides(|key| env.get(key).cloned())
        .expect("apply overrides");

    assert!(!config.fuel_required);
    assert_eq!(config.normal_fuel_limit, 1200);
    assert_eq!(config.tick_work_budget_ms, 0);
    assert_eq!(config.tick_rate_hz, DEFAULT_TICK_RATE_HZ);
}

#[test]
fn malformed_override_is_rejected() {
    let env = overrides(&[(ENV_ADVANCED_FUEL_LIMIT, "lots")]);
    let err = TurtleConfig::default()
        .with_overrides(|key| env.get(key).cloned())
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidValue {
            key: ENV_ADVANCED_FUEL_LIMIT,
            value: "lots".to_string(),
        }
    );

    let env = overrides(&[(ENV_FUEL_REQUIRED, "maybe")]);
    assert!(TurtleConfig::default()
        .with_overrides(|key| env.get(key).cloned())
        .is_err());
}

#[test]
fn sanitized_clamps_limits_and_animation() {
    let config = TurtleConfig {
        normal_fuel_limit: 5_000,
        advanced_fuel_limit: 90_000,
        max_fuel_limit: 10_000,
        animation_duration_ticks: 5,
        event_capacity: 0,
        tick_rate_hz: 0,
        fuel_values: [("coal".to_string(), 80), ("dirt".to_string(), 0)]
            .into_iter()
            .collect(),
        ..TurtleConfig::default()
    }
    .sanitized();

    assert_eq!(config.normal_fuel_limit, 5_000);
    assert_eq!(config.advanced_fuel_limit, 10_000);
    assert_eq!(config.fuel_limit(TurtleTier::Advanced), 10_000);
    assert_eq!(config.animation_duration_ticks, 6);
    assert_eq!(config.event_capacity, 1);
    assert_eq!(config.tick_rate_hz, 1);
    assert_eq!(config.fuel_value("dirt"), None);

    let tiny = TurtleConfig {
        animation_duration_ticks: 0,
        max_fuel_limit: 0,
        ..TurtleConfig::default()
    }
    .sanitized();
    assert_eq!(tiny.animation_duration_ticks, 2);
    assert_eq!(tiny.max_fuel_limit, DEFAULT_MAX_FUEL_LIMIT);
}

#[test]
fn config_file_round_trips_through_disk() {
    let path = temp_path("config");
    std::fs::write(
        &path,
        "advanced_fuel_limit = 64000\nanimation_duration_ticks = 4\n",
    )
    .expect("write config");

    let config = TurtleConfig::from_config_file(&path).expect("load config");
    let _ = std::fs::remove_file(&path);

    assert_eq!(config.advanced_fuel_limit, 64_000);
    assert_eq!(config.animation_duration_ticks, 4);
    assert!(config.fuel_value("coal").is_some());
}

#[test]
fn missing_or_broken_config_file_is_reported() {
    let missing = temp_path("missing");
    assert!(matches!(
        TurtleConfig::from_config_file(&missing),
        Err(ConfigError::ReadConfigFile { .. })
    ));

    let broken = temp_path("broken");
    std::fs::write(&broken, "normal_fuel_limit = \"plenty\"\n").expect("write config");
    let result = TurtleConfig::from_config_file(&broken);
    let _ = std::fs::remove_file(&broken);
    assert!(matches!(result, Err(ConfigError::ParseConfigFile { .. })));
}

#[test]
fn kernel_applies_configured_animation_duration() {
    let config = TurtleConfig {
        animation_duration_ticks: 4,
        ..TurtleConfig::default()
    };
    let mut harness = Harness::with_config(config, Box::new(TickWorkBudget::unlimited()));
    harness.spawn("t-1", start_pos(), 10);
    harness
        .kernel
        .submit_command("t-1", TurtleCommand::Turn(TurnDirection::Left))
        .unwrap();

    harness.tick_n(4);
    assert!(harness.responses("t-1").is_empty());
    harness.tick();
    assert_eq!(harness.responses("t-1").len(), 1);
}
