//! Multi-tick animation state machine.

use serde::{Deserialize, Serialize};

use super::types::DEFAULT_ANIMATION_DURATION_TICKS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    #[default]
    None,
    MoveForward,
    MoveBack,
    MoveUp,
    MoveDown,
    TurnLeft,
    TurnRight,
    SwingLeftTool,
    SwingRightTool,
    Wait,
    ShortWait,
}

impl AnimationKind {
    pub fn is_movement(&self) -> bool {
        matches!(
            self,
            AnimationKind::MoveForward
                | AnimationKind::MoveBack
                | AnimationKind::MoveUp
                | AnimationKind::MoveDown
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationKind::None => "none",
            AnimationKind::MoveForward => "move_forward",
            AnimationKind::MoveBack => "move_back",
            AnimationKind::MoveUp => "move_up",
            AnimationKind::MoveDown => "move_down",
            AnimationKind::TurnLeft => "turn_left",
            AnimationKind::TurnRight => "turn_right",
            AnimationKind::SwingLeftTool => "swing_left_tool",
            AnimationKind::SwingRightTool => "swing_right_tool",
            AnimationKind::Wait => "wait",
            AnimationKind::ShortWait => "short_wait",
        }
    }
}

/// Read-only view of the current animation for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationProgress {
    pub kind: AnimationKind,
    /// Completed fraction in `[0, 1)`; zero when idle.
    pub fraction: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationController {
    kind: AnimationKind,
    progress: u32,
    duration: u32,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::with_duration(DEFAULT_ANIMATION_DURATION_TICKS)
    }
}

impl AnimationController {
    pub fn with_duration(duration: u32) -> Self {
        Self {
            kind: AnimationKind::None,
            progress: 0,
            duration: duration.max(1),
        }
    }

    pub fn kind(&self) -> AnimationKind {
        self.kind
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn is_animating(&self) -> bool {
        self.kind != AnimationKind::None
    }

    /// Starts a new animation.
    ///
    /// Must not be called while another animation is playing.
    pub fn begin(&mut self, kind: AnimationKind) {
        debug_assert!(
            !self.is_animating(),
            "animation {:?} started while {:?} is still playing",
            kind,
            self.kind
        );
        if kind == AnimationKind::None {
            self.reset();
            return;
        }
        self.kind = kind;
        self.progress = if kind == AnimationKind::ShortWait {
            self.duration / 2
        } else {
            0
        };
    }

    /// Advances one tick. Returns true while the animation is still running.
    pub fn tick(&mut self) -> bool {
        if !self.is_animating() {
            return false;
        }
        self.progress = self.progress.saturating_add(1);
        if self.progress >= self.duration {
            self.reset();
            return false;
        }
        true
    }

    pub fn snapshot(&self) -> AnimationProgress {
        let fraction = if self.is_animating() {
            self.progress as f32 / self.duration as f32
        } else {
            0.0
        };
        AnimationProgress {
            kind: self.kind,
            fraction,
        }
    }

    fn reset(&mut self) {
        self.kind = AnimationKind::None;
        self.progress = 0;
    }
}
