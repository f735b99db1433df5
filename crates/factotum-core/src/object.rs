//! Placed buildings: a closed set of kinds, each with its own payload.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::id::{MineralId, ObjectId};

/// The three kinds of building a player can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Mines a claimed deposit and emits particles onto a connecting belt.
    Extractor,
    /// A one-cell belt segment that steers particles.
    Transporter,
    /// Swallows particles and records their arrival.
    Processor,
}

impl BuildingKind {
    pub fn all() -> [BuildingKind; 3] {
        [
            BuildingKind::Extractor,
            BuildingKind::Transporter,
            BuildingKind::Processor,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            BuildingKind::Extractor => "extractor",
            BuildingKind::Transporter => "transporter",
            BuildingKind::Processor => "processor",
        }
    }
}

impl std::fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Runtime state of an extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorState {
    /// Simulation time of the last emitted particle.
    pub last_spawn_time: f32,
    /// The deposit this extractor holds a claim on.
    pub claimed: Option<MineralId>,
}

/// Runtime state of a processor. Arrival logs grow without bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessorState {
    /// Simulation time of every ore particle consumed, oldest first.
    pub ore_arrivals: Vec<f32>,
    /// Reserved for a second input; nothing feeds it yet.
    pub coal_arrivals: Vec<f32>,
}

/// Kind-specific payload of a placed building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BuildingState {
    Extractor(ExtractorState),
    Transporter,
    Processor(ProcessorState),
}

impl BuildingState {
    /// Fresh payload for a newly placed building.
    pub fn new(kind: BuildingKind, claimed: Option<MineralId>) -> Self {
        match kind {
            BuildingKind::Extractor => BuildingState::Extractor(ExtractorState {
                last_spawn_time: 0.0,
                claimed,
            }),
            BuildingKind::Transporter => BuildingState::Transporter,
            BuildingKind::Processor => BuildingState::Processor(ProcessorState::default()),
        }
    }

    pub fn kind(&self) -> BuildingKind {
        match self {
            BuildingState::Extractor(_) => BuildingKind::Extractor,
            BuildingState::Transporter => BuildingKind::Transporter,
            BuildingState::Processor(_) => BuildingKind::Processor,
        }
    }
}

/// A building committed to the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub id: ObjectId,
    /// Grid-aligned anchor position (y = 0).
    pub position: Vec3,
    /// Rotation around +y in radians; snapped to a cardinal when read.
    pub rotation: f32,
    pub state: BuildingState,
}

impl PlacedObject {
    pub fn kind(&self) -> BuildingKind {
        self.state.kind()
    }

    pub fn as_extractor(&self) -> Option<&ExtractorState> {
        match &self.state {
            BuildingState::Extractor(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_processor(&self) -> Option<&ProcessorState> {
        match &self.state {
            BuildingState::Processor(state) => Some(state),
            _ => None,
        }
    }
}
