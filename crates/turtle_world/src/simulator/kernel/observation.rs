use super::super::animation::AnimationProgress;
use super::super::budget::WorkStats;
use super::super::turtle::{Turtle, TurtleSnapshot};
use super::super::types::TurtleId;
use super::TurtleKernel;

impl TurtleKernel {
    /// Current animation of a turtle, for presentation layers.
    pub fn animation_progress(&self, turtle_id: &str) -> Option<AnimationProgress> {
        self.turtles
            .get(turtle_id)
            .map(|brain| brain.turtle.animation().snapshot())
    }

    pub fn turtle(&self, turtle_id: &str) -> Option<&Turtle> {
        self.turtles.get(turtle_id).map(|brain| &brain.turtle)
    }

    pub fn snapshot(&self, turtle_id: &str) -> Option<TurtleSnapshot> {
        self.turtle(turtle_id).map(Turtle::snapshot)
    }

    pub fn turtle_ids(&self) -> impl Iterator<Item = &TurtleId> {
        self.turtles.keys()
    }

    pub fn turtle_count(&self) -> usize {
        self.turtles.len()
    }

    /// Commands submitted but not yet started.
    pub fn queued_commands(&self, turtle_id: &str) -> Option<usize> {
        self.turtles.get(turtle_id).map(|brain| brain.queue.len())
    }

    /// True while a finished command waits for its animation to end.
    pub fn has_pending_response(&self, turtle_id: &str) -> bool {
        self.turtles
            .get(turtle_id)
            .is_some_and(|brain| brain.pending.is_some())
    }

    pub fn work_stats(&self) -> WorkStats {
        self.work_monitor.stats()
    }
}
