//! Ownership of every placed building.
//!
//! Objects live in a [`SlotMap`] arena. A separate insertion-order list keeps
//! iteration stable (first-placed wins every tie-break downstream), and an
//! id index resolves the public monotonic [`ObjectId`] to its arena slot.

use std::collections::BTreeMap;

use glam::Vec3;
use slotmap::SlotMap;

use crate::id::{MineralId, ObjectId, ObjectKey};
use crate::mineral::{MineralError, MineralRegistry};
use crate::object::{BuildingKind, BuildingState, PlacedObject};

#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: SlotMap<ObjectKey, PlacedObject>,
    order: Vec<ObjectKey>,
    index: BTreeMap<ObjectId, ObjectKey>,
    next_id: u64,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Mutation --

    /// Commit a building. The caller is expected to have validated the
    /// placement first.
    ///
    /// An extractor claims the deposit under its position. If that deposit
    /// is already claimed nothing is placed and the claim error is returned.
    pub fn place(
        &mut self,
        kind: BuildingKind,
        position: Vec3,
        rotation: f32,
        minerals: &mut MineralRegistry,
    ) -> Result<ObjectId, MineralError> {
        let claimed = match kind {
            BuildingKind::Extractor => match minerals.at(position).map(|n| n.id) {
                Some(mineral) => {
                    minerals.claim(mineral)?;
                    Some(mineral)
                }
                None => {
                    tracing::warn!(?position, "extractor placed without a deposit to mine");
                    None
                }
            },
            _ => None,
        };

        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let key = self.objects.insert(PlacedObject {
            id,
            position,
            rotation,
            state: BuildingState::new(kind, claimed),
        });
        self.order.push(key);
        self.index.insert(id, key);
        Ok(id)
    }

    /// Remove the first object whose stored position equals `position`.
    ///
    /// Only the anchor position matches; other cells of a multi-cell
    /// footprint do not. An extractor's deposit claim is released. Returns
    /// `None` when nothing is anchored there.
    pub fn remove_at(
        &mut self,
        position: Vec3,
        minerals: &mut MineralRegistry,
    ) -> Option<PlacedObject> {
        let slot = self
            .order
            .iter()
            .position(|key| self.objects[*key].position == position)?;
        let key = self.order.remove(slot);
        let removed = self.objects.remove(key)?;
        self.index.remove(&removed.id);

        if let Some(mineral) = removed.as_extractor().and_then(|e| e.claimed) {
            if let Err(err) = minerals.release(mineral) {
                tracing::warn!(%err, "releasing deposit of removed extractor");
            }
        }
        Some(removed)
    }

    // -- Lookup --

    pub fn get(&self, id: ObjectId) -> Option<&PlacedObject> {
        self.index.get(&id).and_then(|key| self.objects.get(*key))
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut PlacedObject> {
        let key = *self.index.get(&id)?;
        self.objects.get_mut(key)
    }

    pub(crate) fn get_by_key(&self, key: ObjectKey) -> Option<&PlacedObject> {
        self.objects.get(key)
    }

    pub(crate) fn get_by_key_mut(&mut self, key: ObjectKey) -> Option<&mut PlacedObject> {
        self.objects.get_mut(key)
    }

    /// The first object anchored exactly at `position`.
    pub fn object_at(&self, position: Vec3) -> Option<&PlacedObject> {
        self.iter().find(|o| o.position == position)
    }

    /// The extractor holding a claim on `mineral`, if any.
    pub fn claimant_of(&self, mineral: MineralId) -> Option<&PlacedObject> {
        self.extractors()
            .find(|o| o.as_extractor().and_then(|e| e.claimed) == Some(mineral))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The id the next placement will receive.
    pub fn next_id(&self) -> ObjectId {
        ObjectId(self.next_id)
    }

    // -- Views --

    /// All objects in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &PlacedObject> {
        self.order.iter().map(|key| &self.objects[*key])
    }

    pub fn of_kind(&self, kind: BuildingKind) -> impl Iterator<Item = &PlacedObject> {
        self.iter().filter(move |o| o.kind() == kind)
    }

    pub fn extractors(&self) -> impl Iterator<Item = &PlacedObject> {
        self.of_kind(BuildingKind::Extractor)
    }

    pub fn transporters(&self) -> impl Iterator<Item = &PlacedObject> {
        self.of_kind(BuildingKind::Transporter)
    }

    pub fn processors(&self) -> impl Iterator<Item = &PlacedObject> {
        self.of_kind(BuildingKind::Processor)
    }

    /// Arena keys of every object of `kind`, in placement order.
    pub(crate) fn keys_of(&self, kind: BuildingKind) -> Vec<ObjectKey> {
        self.order
            .iter()
            .copied()
            .filter(|key| self.objects[*key].kind() == kind)
            .collect()
    }
}
