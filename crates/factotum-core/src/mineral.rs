//! Mineral deposits and their exclusive extractor claims.
//!
//! The deposit list is fixed when the scene loads. Claims only change through
//! explicit [`MineralRegistry::claim`] / [`MineralRegistry::release`] calls;
//! placement validation reads claim state but never writes it.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::id::MineralId;

/// Errors from claim bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MineralError {
    #[error("no mineral deposit with id {0:?}")]
    UnknownNode(MineralId),
    #[error("mineral deposit {0:?} is already being mined")]
    AlreadyClaimed(MineralId),
    #[error("mineral deposit {0:?} is not being mined")]
    NotClaimed(MineralId),
}

/// A resource deposit an extractor can sit on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineralNode {
    pub id: MineralId,
    pub position: Vec3,
    /// Informational only; extraction does not draw it down.
    pub remaining_amount: f32,
    pub is_being_mined: bool,
}

/// The fixed set of deposits in the world.
#[derive(Debug, Clone, Default)]
pub struct MineralRegistry {
    nodes: Vec<MineralNode>,
}

impl MineralRegistry {
    /// Build the registry from deposit positions, all unclaimed.
    pub fn new(positions: impl IntoIterator<Item = Vec3>, amount: f32) -> Self {
        let nodes = positions
            .into_iter()
            .enumerate()
            .map(|(i, position)| MineralNode {
                id: MineralId(i as u32),
                position,
                remaining_amount: amount,
                is_being_mined: false,
            })
            .collect();
        Self { nodes }
    }

    /// The deposit whose position equals `position` exactly.
    pub fn at(&self, position: Vec3) -> Option<&MineralNode> {
        self.nodes.iter().find(|n| n.position == position)
    }

    pub fn get(&self, id: MineralId) -> Option<&MineralNode> {
        self.nodes.get(id.0 as usize)
    }

    /// Mark a deposit as mined by an extractor.
    pub fn claim(&mut self, id: MineralId) -> Result<(), MineralError> {
        let node = self.node_mut(id)?;
        if node.is_being_mined {
            return Err(MineralError::AlreadyClaimed(id));
        }
        node.is_being_mined = true;
        Ok(())
    }

    /// Drop an extractor's claim on a deposit.
    pub fn release(&mut self, id: MineralId) -> Result<(), MineralError> {
        let node = self.node_mut(id)?;
        if !node.is_being_mined {
            return Err(MineralError::NotClaimed(id));
        }
        node.is_being_mined = false;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MineralNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of deposits currently claimed.
    pub fn claimed_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_being_mined).count()
    }

    fn node_mut(&mut self, id: MineralId) -> Result<&mut MineralNode, MineralError> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or(MineralError::UnknownNode(id))
    }
}
