//! Tests for the simulator module.

use super::*;
use crate::geometry::{BlockPos, ChunkPos, Facing};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const WORLD: &str = "overworld";
const FLOOR_Y: i32 = 63;

fn start_pos() -> BlockPos {
    BlockPos::new(0, FLOOR_Y + 1, 0)
}

fn flat_world() -> MemoryWorld {
    MemoryWorld::flat(WORLD, 2, FLOOR_Y, Block::solid("stone"))
}

/// Event sink that keeps every published event.
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<TurtleEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<TurtleEvent> {
        self.events.lock().unwrap().clone()
    }

    fn responses(&self, turtle_id: &str) -> Vec<CommandResponse> {
        self.events()
            .iter()
            .filter(|event| event.turtle_id == turtle_id)
            .filter_map(CommandResponse::from_event)
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, turtle_id: &str, name: &str, args: Vec<serde_json::Value>) {
        self.events.lock().unwrap().push(TurtleEvent {
            turtle_id: turtle_id.to_string(),
            name: name.to_string(),
            args,
        });
    }
}

type PeripheralCall = (TurtleId, TurtleSide, Option<PeripheralHandle>);

/// Peripheral registry whose calls stay observable after it is boxed.
#[derive(Clone, Default)]
struct RecordingPeripherals {
    calls: Arc<Mutex<Vec<PeripheralCall>>>,
}

impl RecordingPeripherals {
    fn calls(&self) -> Vec<PeripheralCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl PeripheralRegistry for RecordingPeripherals {
    fn set_peripheral(
        &mut self,
        turtle_id: &TurtleId,
        side: TurtleSide,
        handle: Option<PeripheralHandle>,
    ) {
        self.calls
            .lock()
            .unwrap()
            .push((turtle_id.clone(), side, handle));
    }
}

/// Allows a fixed number of commands per tick, adjustable from the test.
#[derive(Clone)]
struct CommandsPerTick {
    limit: Arc<AtomicUsize>,
    used: usize,
}

impl CommandsPerTick {
    fn new(limit: usize) -> Self {
        Self {
            limit: Arc::new(AtomicUsize::new(limit)),
            used: 0,
        }
    }
}

impl WorkMonitor for CommandsPerTick {
    fn begin_tick(&mut self) {
        self.used = 0;
    }

    fn can_work(&self) -> bool {
        self.used < self.limit.load(Ordering::SeqCst)
    }

    fn track_work(&mut self, _nanos: u64) {
        self.used += 1;
    }
}

struct Harness {
    kernel: TurtleKernel,
    world: MemoryWorld,
    sink: Arc<RecordingSink>,
    peripherals: RecordingPeripherals,
}

impl Harness {
    fn new() -> Self {
        Self::with_monitor(Box::new(TickWorkBudget::unlimited()))
    }

    fn with_monitor(monitor: Box<dyn WorkMonitor>) -> Self {
        Self::with_config(TurtleConfig::default(), monitor)
    }

    fn with_config(config: TurtleConfig, monitor: Box<dyn WorkMonitor>) -> Self {
        let sink = Arc::new(RecordingSink::default());
        let peripherals = RecordingPeripherals::default();
        let kernel = TurtleKernel::new(
            config,
            sink.clone(),
            Box::new(peripherals.clone()),
            monitor,
        );
        Self {
            kernel,
            world: flat_world(),
            sink,
            peripherals,
        }
    }

    fn spawn(&mut self, turtle_id: &str, pos: BlockPos, fuel_level: u32) -> CommandSubmitter {
        let mut spec = TurtleSpawnConfig::new(turtle_id, WORLD, pos);
        spec.fuel_level = fuel_level;
        self.register(spec)
    }

    fn register(&mut self, spec: TurtleSpawnConfig) -> CommandSubmitter {
        self.kernel
            .register_turtle(spec, &mut self.world)
            .expect("register turtle")
    }

    /// Registers a fuelled turtle at the start position with `items` loaded.
    fn spawn_with_items(&mut self, turtle_id: &str, items: &[(usize, ItemStack)]) {
        let mut spec = TurtleSpawnConfig::new(turtle_id, WORLD, start_pos());
        spec.fuel_level = 100;
        for (slot, stack) in items {
            spec.inventory.set(*slot, Some(stack.clone()));
        }
        self.register(spec);
    }

    fn tick(&mut self) -> TickReport {
        self.kernel.tick(&mut self.world)
    }

    fn tick_n(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    fn responses(&self, turtle_id: &str) -> Vec<CommandResponse> {
        self.sink.responses(turtle_id)
    }

    /// Submits one command and ticks until its response is published.
    fn run<C: Command + 'static>(&mut self, turtle_id: &str, command: C) -> CommandResponse {
        let correlation_id = self
            .kernel
            .submit_command(turtle_id, command)
            .expect("submit command");
        for _ in 0..64 {
            self.tick();
            if let Some(response) = self
                .responses(turtle_id)
                .into_iter()
                .find(|response| response.correlation_id == correlation_id)
            {
                return response;
            }
        }
        panic!("no response for command {correlation_id}");
    }

    fn turtle(&self, turtle_id: &str) -> &Turtle {
        self.kernel.turtle(turtle_id).expect("turtle registered")
    }

    fn equip_tool(&mut self, turtle_id: &str, side: TurtleSide) {
        self.kernel
            .set_upgrade(
                turtle_id,
                side,
                Some(Arc::new(ToolUpgrade::new("diamond_pickaxe"))),
            )
            .expect("set upgrade");
    }
}

/// Builds a turtle backed by an entity spawned in `world`.
fn spawn_turtle(world: &mut MemoryWorld, turtle_id: &str, pos: BlockPos, fuel_level: u32) -> Turtle {
    let config = TurtleConfig::default();
    let mut spec = TurtleSpawnConfig::new(turtle_id, WORLD, pos);
    spec.fuel_level = fuel_level;
    let placeholder = EntityRef {
        world: WORLD.to_string(),
        pos,
        kind: EntityKind::Turtle,
        serial: 0,
    };
    let mut turtle = Turtle::new(spec, placeholder, &config);
    let template = turtle.snapshot();
    let entity = world
        .spawn_entity_like(WORLD, pos, &template)
        .expect("spawn initial entity");
    turtle.replace_entity(entity);
    turtle
}

/// Returns its payload, optionally starting an animation.
struct EchoCommand {
    payload: serde_json::Value,
    animation: AnimationKind,
}

impl Command for EchoCommand {
    fn name(&self) -> &str {
        "echo"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        if self.animation != AnimationKind::None {
            ctx.turtle.animation_mut().begin(self.animation);
        }
        Ok(vec![self.payload.clone()])
    }
}

fn echo(payload: impl Into<serde_json::Value>) -> EchoCommand {
    EchoCommand {
        payload: payload.into(),
        animation: AnimationKind::None,
    }
}

struct PanickingCommand;

impl Command for PanickingCommand {
    fn name(&self) -> &str {
        "panic"
    }

    fn execute(&self, _ctx: &mut CommandContext<'_>) -> CommandResult {
        panic!("boom");
    }
}

mod animation;
mod config;
mod fuel;
mod relocation;
