//! Read-only snapshot types for the renderer.
//!
//! A [`RenderSnapshot`] is an owned copy of everything a frame needs to draw:
//! building transforms with per-kind instance data, particle positions, the
//! placement preview, and deposit markers. Nothing in it refers back into
//! engine storage.

use glam::{Mat4, Vec3};

use crate::id::{MineralId, ObjectId};
use crate::object::{BuildingKind, BuildingState, PlacedObject};

/// Model transform for a building: translate to the anchor, then turn around +y.
pub fn object_transform(position: Vec3, rotation: f32) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_rotation_y(rotation)
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// Per-kind data passed alongside each instance transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstanceData {
    Extractor {
        last_spawn_time: f32,
        claimed: Option<MineralId>,
    },
    Transporter {
        direction: Vec3,
    },
    Processor {
        ore_count: usize,
        coal_count: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub kind: BuildingKind,
    pub transform: Mat4,
    pub instance: InstanceData,
}

impl ObjectSnapshot {
    /// `direction` is the belt direction for transporters and is ignored otherwise.
    pub fn from_object(object: &PlacedObject, direction: Vec3) -> Self {
        let instance = match &object.state {
            BuildingState::Extractor(state) => InstanceData::Extractor {
                last_spawn_time: state.last_spawn_time,
                claimed: state.claimed,
            },
            BuildingState::Transporter => InstanceData::Transporter { direction },
            BuildingState::Processor(state) => InstanceData::Processor {
                ore_count: state.ore_arrivals.len(),
                coal_count: state.coal_arrivals.len(),
            },
        };
        Self {
            id: object.id,
            kind: object.kind(),
            transform: object_transform(object.position, object.rotation),
            instance,
        }
    }
}

// ---------------------------------------------------------------------------
// Preview & deposits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewSnapshot {
    pub kind: BuildingKind,
    /// `None` when the aim ray misses the ground; nothing should be drawn.
    pub transform: Option<Mat4>,
    /// Picks the highlight color.
    pub valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MineralSnapshot {
    pub id: MineralId,
    pub position: Vec3,
    pub remaining_amount: f32,
    pub is_being_mined: bool,
}

// ---------------------------------------------------------------------------
// Frame snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSnapshot {
    pub tick: u64,
    pub time: f32,
    /// Every building in placement order.
    pub objects: Vec<ObjectSnapshot>,
    pub particles: Vec<Vec3>,
    /// Present only while placement mode is on.
    pub preview: Option<PreviewSnapshot>,
    pub minerals: Vec<MineralSnapshot>,
}

impl RenderSnapshot {
    /// Instances of one kind, for batching one draw call per kind.
    pub fn instances_of(&self, kind: BuildingKind) -> impl Iterator<Item = &ObjectSnapshot> {
        self.objects.iter().filter(move |o| o.kind == kind)
    }
}
