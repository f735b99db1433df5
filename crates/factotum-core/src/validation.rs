//! Placement validation: a pure decision over the current world state.
//!
//! [`validate`] never mutates anything. Deposit claims are taken later, when
//! the registry commits the placement.

use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::grid::{GridCell, GridGeometry};
use crate::id::ObjectId;
use crate::mineral::MineralRegistry;
use crate::object::BuildingKind;
use crate::registry::ObjectRegistry;

/// Why a placement was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementRejection {
    /// The footprint shares a cell with an existing building.
    #[error("footprint overlaps object {existing:?} at cell {cell:?}")]
    Overlap { existing: ObjectId, cell: GridCell },

    /// Extractors must sit on a deposit.
    #[error("no mineral deposit under the extractor")]
    NoMineral,

    /// Another extractor already mines this deposit.
    #[error("mineral deposit is already being mined")]
    MineralClaimed,

    /// Only extractors may be built on a deposit.
    #[error("only an extractor can be built on a mineral deposit")]
    MineralBlocksNonExtractor,
}

impl PlacementRejection {
    /// Short tag for logs and UI.
    pub fn tag(&self) -> &'static str {
        match self {
            PlacementRejection::Overlap { .. } => "Overlap",
            PlacementRejection::NoMineral => "NoMineral",
            PlacementRejection::MineralClaimed => "MineralClaimed",
            PlacementRejection::MineralBlocksNonExtractor => "MineralBlocksNonExtractor",
        }
    }
}

/// Decide whether a `kind` building may be committed at `position`.
///
/// Checks, in order: footprint overlap against every placed object (first
/// conflict in placement order is reported), then the deposit rule for the
/// cell under `position`.
pub fn validate(
    geometry: &GridGeometry,
    kind: BuildingKind,
    position: Vec3,
    rotation: f32,
    objects: &ObjectRegistry,
    minerals: &MineralRegistry,
) -> Result<(), PlacementRejection> {
    let candidate: BTreeSet<GridCell> = geometry
        .footprint(kind, position, rotation)
        .into_iter()
        .collect();

    for existing in objects.iter() {
        let cells = geometry.footprint(existing.kind(), existing.position, existing.rotation);
        if let Some(cell) = cells.into_iter().find(|c| candidate.contains(c)) {
            return Err(PlacementRejection::Overlap {
                existing: existing.id,
                cell,
            });
        }
    }

    let deposit = minerals.at(position);
    match (kind, deposit) {
        (BuildingKind::Extractor, None) => Err(PlacementRejection::NoMineral),
        (BuildingKind::Extractor, Some(node)) if node.is_being_mined => {
            Err(PlacementRejection::MineralClaimed)
        }
        (BuildingKind::Extractor, Some(_)) => Ok(()),
        (_, Some(_)) => Err(PlacementRejection::MineralBlocksNonExtractor),
        (_, None) => Ok(()),
    }
}
