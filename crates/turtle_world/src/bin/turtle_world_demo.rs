use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use turtle_world::simulator::{Block, MoveDirection, NoPeripherals, TurnDirection};
use turtle_world::{
    BlockPos, BroadcastEventBus, EventSink, MemoryWorld, TickWorkBudget, TurtleClient,
    TurtleCommand, TurtleConfig, TurtleKernel, TurtleSpawnConfig,
};

const WORLD: &str = "overworld";
const FLOOR_Y: i32 = 63;

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    turtles: usize,
    steps: usize,
    config_path: Option<PathBuf>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            turtles: 2,
            steps: 6,
            config_path: None,
        }
    }
}

struct Simulation {
    kernel: TurtleKernel,
    world: MemoryWorld,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    let args: Vec<String> = env::args().collect();
    let options = match parse_options(args.iter().skip(1).map(|arg| arg.as_str())) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}");
            print_help();
            process::exit(1);
        }
    };

    let loaded = match &options.config_path {
        Some(path) => TurtleConfig::from_config_file(path),
        None => TurtleConfig::from_default_sources(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load config: {err}");
            process::exit(1);
        }
    };
    let tick_interval = Duration::from_secs(1) / config.tick_rate_hz.max(1);

    let bus = Arc::new(BroadcastEventBus::from_config(&config));
    let sink: Arc<dyn EventSink> = bus.clone();
    let budget = TickWorkBudget::from_config(&config);
    let mut kernel = TurtleKernel::new(config, sink, Box::new(NoPeripherals), Box::new(budget));
    let mut world = MemoryWorld::flat(WORLD, 2, FLOOR_Y, Block::solid("stone"));
    for x in 0..3 {
        world.put_block(WORLD, BlockPos::new(x * 3, FLOOR_Y + 1, -4), Block::solid("cobblestone"));
    }

    let mut clients = Vec::with_capacity(options.turtles);
    for idx in 0..options.turtles {
        let turtle_id = format!("turtle-{}", idx + 1);
        let x = i32::try_from(idx * 3).unwrap_or(i32::MAX);
        let mut spec = TurtleSpawnConfig::new(turtle_id.clone(), WORLD, BlockPos::new(x, FLOOR_Y + 1, 0));
        spec.fuel_level = 100;
        match kernel.register_turtle(spec, &mut world) {
            Ok(submitter) => clients.push(TurtleClient::connect(&bus, submitter)),
            Err(err) => {
                eprintln!("failed to register {turtle_id}: {err}");
                process::exit(1);
            }
        }
    }

    println!("turtles: {}", options.turtles);
    println!("steps: {}", options.steps);
    println!("tick_interval_ms: {}", tick_interval.as_millis());

    let sim = Arc::new(Mutex::new(Simulation { kernel, world }));
    let stop = Arc::new(AtomicBool::new(false));
    let ticker = {
        let sim = Arc::clone(&sim);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                if let Ok(mut guard) = sim.lock() {
                    let Simulation { kernel, world } = &mut *guard;
                    kernel.tick(world);
                }
                thread::sleep(tick_interval);
            }
        })
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            process::exit(1);
        }
    };
    runtime.block_on(async {
        let workers: Vec<_> = clients
            .into_iter()
            .map(|client| tokio::spawn(patrol(client, options.steps)))
            .collect();
        for worker in workers {
            if let Err(err) = worker.await {
                eprintln!("script worker failed: {err}");
            }
        }
    });

    stop.store(true, Ordering::SeqCst);
    if ticker.join().is_err() {
        eprintln!("tick thread panicked");
    }

    let Ok(guard) = sim.lock() else {
        eprintln!("simulation state poisoned");
        process::exit(1);
    };
    let stats = guard.kernel.work_stats();
    println!("world_time: {}", guard.kernel.time());
    println!("commands_executed: {}", stats.commands_executed);
    println!("exhausted_ticks: {}", stats.exhausted_ticks);
    for turtle_id in guard.kernel.turtle_ids() {
        if let Some(snapshot) = guard.kernel.snapshot(turtle_id) {
            match serde_json::to_string(&snapshot) {
                Ok(json) => println!("snapshot {turtle_id}: {json}"),
                Err(err) => eprintln!("failed to encode snapshot of {turtle_id}: {err}"),
            }
        }
    }
}

/// Walks forward, turning right whenever the way is blocked.
async fn patrol(mut client: TurtleClient, steps: usize) {
    let turtle_id = client.turtle_id().clone();
    for step in 0..steps {
        let moved = match client.call(TurtleCommand::Move(MoveDirection::Forward)).await {
            Ok(response) => response,
            Err(err) => {
                eprintln!("turtle={turtle_id} stopped: {err}");
                return;
            }
        };
        println!(
            "turtle={} step={} success={} message={}",
            turtle_id,
            step + 1,
            moved.success,
            moved.message.as_deref().unwrap_or("-")
        );
        if !moved.success {
            if let Err(err) = client.call(TurtleCommand::Turn(TurnDirection::Right)).await {
                eprintln!("turtle={turtle_id} stopped: {err}");
                return;
            }
        }
    }
    if let Ok(fuel) = client.call(TurtleCommand::GetFuelLevel).await {
        println!("turtle={} fuel={:?}", turtle_id, fuel.payload);
    }
}

fn parse_options<'a>(args: impl Iterator<Item = &'a str>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut iter = args.peekable();
    while let Some(arg) = iter.next() {
        match arg {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--turtles" => {
                options.turtles = parse_positive(iter.next(), "--turtles")?;
            }
            "--steps" => {
                options.steps = parse_positive(iter.next(), "--steps")?;
            }
            "--config" => {
                let raw = iter
                    .next()
                    .ok_or_else(|| "--config requires a file path".to_string())?;
                options.config_path = Some(PathBuf::from(raw));
            }
            _ => return Err(format!("unexpected argument: {arg}")),
        }
    }
    Ok(options)
}

fn parse_positive(raw: Option<&str>, flag: &str) -> Result<usize, String> {
    raw.and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .ok_or_else(|| format!("{flag} requires a positive integer"))
}

fn print_help() {
    println!("Usage: turtle_world_demo [--turtles <n>] [--steps <n>] [--config <path>]");
    println!("Options:");
    println!("  --turtles <n>    Turtles to register (default: 2)");
    println!("  --steps <n>      Forward moves per turtle (default: 6)");
    println!("  --config <path>  TOML config file (default: turtle_world.toml or env)");
}
