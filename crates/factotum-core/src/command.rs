//! Discrete input commands and the queue that holds them until the next tick.
//!
//! The input layer turns raw device state into edge-triggered [`Command`]s.
//! They can run immediately through `Engine::execute` or be submitted and
//! drained, in submission order, at the start of the next tick.

use serde::{Deserialize, Serialize};

use crate::id::ObjectId;
use crate::object::BuildingKind;
use crate::placement::Ray;
use crate::validation::PlacementRejection;

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    BeginPlacement,
    EndPlacement,
    TogglePlacement,
    /// Change the building kind shown in the preview.
    SelectBuilding(BuildingKind),
    /// Turn the preview by 90 degrees.
    RotatePreview,
    /// Update the view ray the preview follows.
    Aim(Ray),
    /// Place the selected building where the ray meets the ground.
    CommitPlacement(Ray),
    /// Remove the building anchored where the ray meets the ground.
    RemoveAt(Ray),
}

/// What an executed command did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandOutcome {
    /// Placement mode is now on or off.
    PlacementMode { active: bool },
    /// Kind, rotation, or aim of the preview changed.
    PreviewUpdated,
    Placed(ObjectId),
    Rejected(PlacementRejection),
    Removed(ObjectId),
    /// Nothing is anchored at the targeted cell.
    NothingToRemove,
    /// The ray never reaches the ground.
    NoGroundPoint,
    /// Commit and remove only act while placement mode is on.
    NotInPlacementMode,
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// Commands waiting for the next tick boundary, with optional bounded history.
#[derive(Debug)]
pub struct CommandQueue {
    pending: Vec<Command>,
    /// Executed commands as (tick, command).
    history: Vec<(u64, Command)>,
    /// 0 = no history.
    max_history: usize,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::with_max_history(0)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            pending: Vec::new(),
            history: Vec::new(),
            max_history,
        }
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    pub fn push_batch(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.pending.extend(commands);
    }

    /// Take every pending command in submission order, recording them in
    /// history under `tick`.
    pub fn drain(&mut self, tick: u64) -> Vec<Command> {
        let commands: Vec<Command> = self.pending.drain(..).collect();

        if self.max_history > 0 {
            self.history
                .extend(commands.iter().map(|cmd| (tick, cmd.clone())));
            let excess = self.history.len().saturating_sub(self.max_history);
            if excess > 0 {
                self.history.drain(..excess);
            }
        }

        commands
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn history(&self) -> &[(u64, Command)] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
