use std::collections::VecDeque;

use crate::math::Vec2;

/// Discrete input events from the host. They are queued and applied at the start of
/// the next tick, never while the flock is being scanned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    ToggleFormation,
    ForceFormation,
    Spawn { point: Vec2, count: usize },
    SetPalette(usize),
    /// `Some` while the pointer is held down, `None` once released.
    SetPointer(Option<Vec2>),
    ToggleDebug,
    Resize { width: f32, height: f32 },
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Hands over everything queued so far in submission order, leaving the queue empty.
    pub fn take_pending(&mut self) -> VecDeque<Command> {
        std::mem::take(&mut self.pending)
    }
}
