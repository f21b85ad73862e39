use super::*;

#[test]
fn consume_within_level_subtracts_exactly() {
    for level in [0u32, 1, 7, 80, 20_000] {
        for amount in 0..=level.min(100) {
            let mut ledger = FuelLedger::new(level, 20_000, true);
            assert!(ledger.consume(amount));
            assert_eq!(ledger.level(), level - amount);
        }
    }
}

#[test]
fn consume_beyond_level_fails_without_mutation() {
    for level in [0u32, 1, 79] {
        let mut ledger = FuelLedger::new(level, 20_000, true);
        assert!(!ledger.consume(level + 1));
        assert!(!ledger.consume(u32::MAX));
        assert_eq!(ledger.level(), level);
    }
}

#[test]
fn consume_always_succeeds_when_fuel_not_required() {
    let mut ledger = FuelLedger::new(0, 20_000, false);
    assert!(ledger.has(1_000));
    assert!(ledger.consume(1_000));
    assert_eq!(ledger.level(), 0);
}

#[test]
fn add_is_capped() {
    let mut ledger = FuelLedger::new(19_990, 20_000, true);
    assert_eq!(ledger.add(5), 5);
    assert_eq!(ledger.add(100), 5);
    assert_eq!(ledger.level(), 20_000);
    assert_eq!(ledger.remaining_capacity(), 0);
    assert_eq!(ledger.add(u32::MAX), 0);
}

#[test]
fn tier_caps_follow_config_and_global_maximum() {
    let config = TurtleConfig {
        normal_fuel_limit: 500,
        advanced_fuel_limit: 5_000_000,
        max_fuel_limit: 1_000,
        ..TurtleConfig::default()
    }
    .sanitized();
    assert_eq!(FuelLedger::for_tier(TurtleTier::Normal, &config).cap(), 500);
    assert_eq!(FuelLedger::for_tier(TurtleTier::Advanced, &config).cap(), 1_000);
}

#[test]
fn reconfigure_clamps_level_to_new_cap() {
    let config = TurtleConfig::default();
    let mut ledger = FuelLedger::for_tier(TurtleTier::Advanced, &config);
    ledger.add(50_000);
    ledger.reconfigure(TurtleTier::Normal, &config);
    assert_eq!(ledger.cap(), config.normal_fuel_limit);
    assert_eq!(ledger.level(), config.normal_fuel_limit);
}
