//! Side upgrades and the peripheral handles derived from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::types::{TurtleId, TurtleSide, WorldTime};
use super::world::PeripheralRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    Tool,
    Peripheral,
}

/// Handle registered with the attached computer for one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeripheralHandle {
    pub turtle_id: TurtleId,
    pub side: TurtleSide,
    pub upgrade_id: String,
    pub peripheral_type: String,
    /// Changes every time the handle is regenerated.
    pub generation: u64,
}

pub struct UpgradeTickContext<'a> {
    pub turtle_id: &'a TurtleId,
    pub side: TurtleSide,
    pub time: WorldTime,
}

/// Capability module that occupies one side of a turtle.
pub trait TurtleUpgrade: Send + Sync + fmt::Debug {
    /// Stable identifier, also the item id used when equipping.
    fn id(&self) -> &str;

    fn kind(&self) -> UpgradeKind;

    fn can_dig(&self) -> bool {
        false
    }

    /// Peripheral type exposed to the computer, if any.
    fn peripheral_type(&self) -> Option<&str> {
        None
    }

    /// Called once per tick while installed.
    fn update(&self, _ctx: &UpgradeTickContext<'_>) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolUpgrade {
    id: String,
}

impl ToolUpgrade {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl TurtleUpgrade for ToolUpgrade {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> UpgradeKind {
        UpgradeKind::Tool
    }

    fn can_dig(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModemUpgrade {
    id: String,
}

impl ModemUpgrade {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl TurtleUpgrade for ModemUpgrade {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> UpgradeKind {
        UpgradeKind::Peripheral
    }

    fn peripheral_type(&self) -> Option<&str> {
        Some("modem")
    }
}

/// Item id → upgrade lookup used by `Equip`.
#[derive(Debug, Clone, Default)]
pub struct UpgradeCatalog {
    upgrades: BTreeMap<String, Arc<dyn TurtleUpgrade>>,
}

impl UpgradeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.register(Arc::new(ToolUpgrade::new("diamond_pickaxe")));
        catalog.register(Arc::new(ModemUpgrade::new("wireless_modem")));
        catalog
    }

    pub fn register(&mut self, upgrade: Arc<dyn TurtleUpgrade>) {
        self.upgrades.insert(upgrade.id().to_string(), upgrade);
    }

    pub fn get(&self, item_id: &str) -> Option<Arc<dyn TurtleUpgrade>> {
        self.upgrades.get(item_id).cloned()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeIds {
    pub left: Option<String>,
    pub right: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct UpgradeSlot {
    upgrade: Option<Arc<dyn TurtleUpgrade>>,
    peripheral: Option<PeripheralHandle>,
    /// Peripheral must be regenerated once a computer is attached.
    stale: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpgradeManager {
    left: UpgradeSlot,
    right: UpgradeSlot,
    next_generation: u64,
}

impl UpgradeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, side: TurtleSide) -> Option<&Arc<dyn TurtleUpgrade>> {
        self.slot(side).upgrade.as_ref()
    }

    pub fn peripheral(&self, side: TurtleSide) -> Option<&PeripheralHandle> {
        self.slot(side).peripheral.as_ref()
    }

    pub fn ids(&self) -> UpgradeIds {
        UpgradeIds {
            left: self.get(TurtleSide::Left).map(|up| up.id().to_string()),
            right: self.get(TurtleSide::Right).map(|up| up.id().to_string()),
        }
    }

    /// Installs or clears an upgrade. Returns false when nothing changed.
    ///
    /// `registry` is `Some` only while a computer is attached; the peripheral
    /// handle is then regenerated immediately, otherwise on the next `update`
    /// after attachment.
    pub fn set_upgrade(
        &mut self,
        side: TurtleSide,
        upgrade: Option<Arc<dyn TurtleUpgrade>>,
        turtle_id: &TurtleId,
        registry: Option<&mut dyn PeripheralRegistry>,
    ) -> bool {
        let unchanged = match (&self.slot(side).upgrade, &upgrade) {
            (None, None) => true,
            (Some(current), Some(next)) => current.id() == next.id(),
            _ => false,
        };
        if unchanged {
            return false;
        }

        let slot = self.slot_mut(side);
        slot.upgrade = upgrade;
        slot.peripheral = None;
        slot.stale = true;
        if let Some(registry) = registry {
            self.refresh_peripheral(side, turtle_id, registry);
        }
        true
    }

    /// Per-tick notification, independent of command dispatch.
    pub fn update(
        &mut self,
        turtle_id: &TurtleId,
        time: WorldTime,
        mut registry: Option<&mut dyn PeripheralRegistry>,
    ) {
        for side in TurtleSide::ALL {
            if let Some(upgrade) = &self.slot(side).upgrade {
                upgrade.update(&UpgradeTickContext {
                    turtle_id,
                    side,
                    time,
                });
            }
            if self.slot(side).stale {
                if let Some(registry) = registry.as_deref_mut() {
                    self.refresh_peripheral(side, turtle_id, registry);
                }
            }
        }
    }

    /// Drops cached handles, e.g. when the computer shuts down.
    pub fn invalidate_peripherals(&mut self) {
        for side in TurtleSide::ALL {
            let slot = self.slot_mut(side);
            slot.peripheral = None;
            slot.stale = true;
        }
    }

    fn refresh_peripheral(
        &mut self,
        side: TurtleSide,
        turtle_id: &TurtleId,
        registry: &mut dyn PeripheralRegistry,
    ) {
        let generation = self.next_generation;
        let handle = self.slot(side).upgrade.as_ref().and_then(|upgrade| {
            upgrade
                .peripheral_type()
                .map(|peripheral_type| PeripheralHandle {
                    turtle_id: turtle_id.clone(),
                    side,
                    upgrade_id: upgrade.id().to_string(),
                    peripheral_type: peripheral_type.to_string(),
                    generation,
                })
        });
        if handle.is_some() {
            self.next_generation = self.next_generation.wrapping_add(1);
        }
        let slot = self.slot_mut(side);
        slot.peripheral = handle.clone();
        slot.stale = false;
        registry.set_peripheral(turtle_id, side, handle);
    }

    fn slot(&self, side: TurtleSide) -> &UpgradeSlot {
        match side {
            TurtleSide::Left => &self.left,
            TurtleSide::Right => &self.right,
        }
    }

    fn slot_mut(&mut self, side: TurtleSide) -> &mut UpgradeSlot {
        match side {
            TurtleSide::Left => &mut self.left,
            TurtleSide::Right => &mut self.right,
        }
    }
}
