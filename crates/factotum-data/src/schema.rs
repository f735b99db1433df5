//! Serde structs for scene files.
//!
//! A scene lists the mineral deposits of a map, optional simulation
//! parameter overrides, and optional buildings placed before the first tick.
//! Scenes are deserialized from RON, JSON, or TOML and then turned into an
//! engine by the loader.

use factotum_core::config::SimConfig;
use factotum_core::object::BuildingKind;
use glam::Vec3;
use serde::Deserialize;

/// Top-level scene file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneData {
    #[serde(default)]
    pub minerals: Vec<MineralData>,
    /// Fields left out keep their defaults.
    #[serde(default)]
    pub simulation: SimConfig,
    /// Placed in file order, each through the placement validator.
    #[serde(default)]
    pub buildings: Vec<BuildingData>,
}

/// One mineral deposit.
#[derive(Debug, Clone, Deserialize)]
pub struct MineralData {
    pub position: Vec3,
}

/// A building placed when the scene loads.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingData {
    pub kind: BuildingKind,
    pub position: Vec3,
    /// Rotation around +y in degrees. Should be a multiple of 90.
    #[serde(default)]
    pub rotation_degrees: f32,
}

impl BuildingData {
    pub fn rotation_radians(&self) -> f32 {
        self.rotation_degrees.to_radians()
    }
}
