//! Fuel accounting for a single turtle.

use serde::{Deserialize, Serialize};

use super::config::TurtleConfig;
use super::types::TurtleTier;

/// Consumable fuel level and its cap.
///
/// When `fuel_required` is false every `consume` succeeds without touching
/// the level, which is then purely cosmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelLedger {
    level: u32,
    cap: u32,
    fuel_required: bool,
}

impl FuelLedger {
    pub fn new(level: u32, cap: u32, fuel_required: bool) -> Self {
        Self {
            level: level.min(cap),
            cap,
            fuel_required,
        }
    }

    /// Empty ledger sized for the tier.
    pub fn for_tier(tier: TurtleTier, config: &TurtleConfig) -> Self {
        Self::new(0, config.fuel_limit(tier), config.fuel_required)
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn fuel_required(&self) -> bool {
        self.fuel_required
    }

    pub fn remaining_capacity(&self) -> u32 {
        self.cap.saturating_sub(self.level)
    }

    /// Returns true when `amount` could be consumed right now.
    pub fn has(&self, amount: u32) -> bool {
        !self.fuel_required || self.level >= amount
    }

    pub fn consume(&mut self, amount: u32) -> bool {
        if !self.fuel_required {
            return true;
        }
        if self.level >= amount {
            self.level -= amount;
            true
        } else {
            false
        }
    }

    /// Adds fuel, clamped at the cap. Returns the amount actually added.
    pub fn add(&mut self, amount: u32) -> u32 {
        let before = self.level;
        self.level = self.level.saturating_add(amount).min(self.cap);
        self.level - before
    }

    /// Re-applies tier limits, e.g. after config reload or tier change.
    pub fn reconfigure(&mut self, tier: TurtleTier, config: &TurtleConfig) {
        self.cap = config.fuel_limit(tier);
        self.level = self.level.min(self.cap);
        self.fuel_required = config.fuel_required;
    }
}
