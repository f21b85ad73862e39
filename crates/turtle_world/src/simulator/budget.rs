//! Per-tick command work budget: the dispatcher's only backpressure valve.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::config::TurtleConfig;

/// Decides whether more command work fits into the current tick.
pub trait WorkMonitor: Send {
    /// Called once at the start of every tick.
    fn begin_tick(&mut self) {}

    fn can_work(&self) -> bool;

    /// Records the execution time of one command.
    fn track_work(&mut self, nanos: u64);

    fn stats(&self) -> WorkStats {
        WorkStats::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WorkStats {
    pub ticks: u64,
    pub commands_executed: u64,
    pub total_work_nanos: u64,
    pub max_work_nanos: u64,
    pub last_tick_work_nanos: u64,
    /// Ticks in which the budget ran out and commands were deferred.
    pub exhausted_ticks: u64,
}

impl WorkStats {
    pub fn avg_work_nanos(&self) -> u64 {
        if self.commands_executed == 0 {
            return 0;
        }
        self.total_work_nanos / self.commands_executed
    }
}

/// Aggregate time allowance shared by every turtle in one tick.
#[derive(Debug, Clone)]
pub struct TickWorkBudget {
    /// `None` means unlimited.
    budget_nanos: Option<u64>,
    spent_nanos: u64,
    exhausted: bool,
    stats: WorkStats,
}

impl Default for TickWorkBudget {
    fn default() -> Self {
        Self::from_config(&TurtleConfig::default())
    }
}

impl TickWorkBudget {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget_nanos: Some(u64::try_from(budget.as_nanos()).unwrap_or(u64::MAX)),
            spent_nanos: 0,
            exhausted: false,
            stats: WorkStats::default(),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            budget_nanos: None,
            ..Self::new(Duration::ZERO)
        }
    }

    /// A zero budget disables throttling.
    pub fn from_config(config: &TurtleConfig) -> Self {
        if config.tick_work_budget_ms == 0 {
            return Self::unlimited();
        }
        Self::new(Duration::from_millis(config.tick_work_budget_ms))
    }

    pub fn remaining_nanos(&self) -> Option<u64> {
        self.budget_nanos
            .map(|budget| budget.saturating_sub(self.spent_nanos))
    }
}

impl WorkMonitor for TickWorkBudget {
    fn begin_tick(&mut self) {
        self.stats.ticks = self.stats.ticks.saturating_add(1);
        self.spent_nanos = 0;
        self.exhausted = false;
    }

    fn can_work(&self) -> bool {
        match self.budget_nanos {
            Some(budget) => self.spent_nanos < budget,
            None => true,
        }
    }

    fn track_work(&mut self, nanos: u64) {
        self.spent_nanos = self.spent_nanos.saturating_add(nanos);
        self.stats.commands_executed = self.stats.commands_executed.saturating_add(1);
        self.stats.total_work_nanos = self.stats.total_work_nanos.saturating_add(nanos);
        self.stats.max_work_nanos = self.stats.max_work_nanos.max(nanos);
        self.stats.last_tick_work_nanos = self.spent_nanos;
        if !self.exhausted && !self.can_work() {
            self.exhausted = true;
            self.stats.exhausted_ticks = self.stats.exhausted_ticks.saturating_add(1);
        }
    }

    fn stats(&self) -> WorkStats {
        self.stats
    }
}
