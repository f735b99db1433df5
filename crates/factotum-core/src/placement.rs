//! Placement mode: the building the player is about to place and where.
//!
//! The preview is recomputed from the stored aim ray whenever the world or
//! the aim changes, so the renderer always sees a current validity flag.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::grid::{CardinalRotation, GridGeometry};
use crate::mineral::MineralRegistry;
use crate::object::BuildingKind;
use crate::registry::ObjectRegistry;
use crate::validation::{validate, PlacementRejection};

/// A view ray: camera position and looking direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub camera: Vec3,
    pub look: Vec3,
}

impl Ray {
    pub fn new(camera: Vec3, look: Vec3) -> Self {
        Self { camera, look }
    }
}

/// Where the selected building would land and whether it may go there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementPreview {
    pub kind: BuildingKind,
    /// `None` when the aim ray never reaches the ground.
    pub position: Option<Vec3>,
    pub rotation: f32,
    /// Why the placement would be refused, if it would.
    pub rejection: Option<PlacementRejection>,
}

impl PlacementPreview {
    pub fn is_valid(&self) -> bool {
        self.position.is_some() && self.rejection.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementState {
    active: bool,
    kind: BuildingKind,
    rotation: CardinalRotation,
    aim: Option<Ray>,
}

impl Default for PlacementState {
    fn default() -> Self {
        Self {
            active: false,
            kind: BuildingKind::Extractor,
            rotation: CardinalRotation::Deg0,
            aim: None,
        }
    }
}

impl PlacementState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn kind(&self) -> BuildingKind {
        self.kind
    }

    /// Preview rotation in radians, always in `[0, 2π)`.
    pub fn rotation(&self) -> f32 {
        self.rotation.radians()
    }

    pub fn aim(&self) -> Option<Ray> {
        self.aim
    }

    pub fn begin(&mut self) {
        self.active = true;
    }

    pub fn end(&mut self) {
        self.active = false;
    }

    /// Flip placement mode. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    pub fn select(&mut self, kind: BuildingKind) {
        self.kind = kind;
    }

    /// Turn the preview a quarter turn, wrapping back to zero after a full turn.
    pub fn rotate(&mut self) -> f32 {
        self.rotation = match self.rotation {
            CardinalRotation::Deg0 => CardinalRotation::Deg90,
            CardinalRotation::Deg90 => CardinalRotation::Deg180,
            CardinalRotation::Deg180 => CardinalRotation::Deg270,
            CardinalRotation::Deg270 => CardinalRotation::Deg0,
        };
        self.rotation()
    }

    pub fn set_aim(&mut self, ray: Ray) {
        self.aim = Some(ray);
    }

    /// The preview for the current aim, or `None` outside placement mode.
    pub fn preview(
        &self,
        geometry: &GridGeometry,
        objects: &ObjectRegistry,
        minerals: &MineralRegistry,
    ) -> Option<PlacementPreview> {
        if !self.active {
            return None;
        }
        let position = self
            .aim
            .and_then(|ray| geometry.ground_intersection(ray.camera, ray.look));
        let rejection = position.and_then(|p| {
            validate(geometry, self.kind, p, self.rotation(), objects, minerals).err()
        });
        Some(PlacementPreview {
            kind: self.kind,
            position,
            rotation: self.rotation(),
            rejection,
        })
    }
}
