pub mod geometry;
pub mod simulator;

pub use geometry::{BlockPos, ChunkPos, Facing, CHUNK_SIZE_X, CHUNK_SIZE_Z};

// Kernel and script-worker interface (submit → tick → correlated response)
pub use simulator::{
    BroadcastEventBus, ClientError, Command, CommandContext, CommandError, CommandResponse,
    CommandSubmitter, EventSink, KernelError, TickReport, TurtleClient, TurtleCommand,
    TurtleEvent, TurtleKernel,
};

// Turtle state
pub use simulator::{
    AnimationKind, AnimationProgress, FuelLedger, Turtle, TurtleSnapshot, TurtleSpawnConfig,
    UpgradeManager,
};

// Collaborators and configuration
pub use simulator::{
    MemoryWorld, PeripheralRegistry, TickWorkBudget, TurtleConfig, TurtleWorld, WorkMonitor,
};
