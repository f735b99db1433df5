//! Extractor spawn scheduling.
//!
//! Each extractor hands its output to the cell just outside its intake field
//! (its anchor). When a belt sits exactly on that anchor and the spawn
//! interval has elapsed, a particle is emitted one cell upstream of the belt,
//! travelling in the belt's direction.

use glam::Vec3;

use crate::config::SimConfig;
use crate::grid::GridGeometry;
use crate::id::ObjectId;
use crate::object::{BuildingKind, BuildingState};
use crate::registry::ObjectRegistry;
use crate::transport::{ParticleField, TransportParticle};

/// One particle emitted by [`MiningScheduler::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRecord {
    pub extractor: ObjectId,
    pub transporter: ObjectId,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiningScheduler {
    spawn_interval: f32,
}

impl MiningScheduler {
    pub fn new(spawn_interval: f32) -> Self {
        Self { spawn_interval }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.spawn_interval)
    }

    pub fn spawn_interval(&self) -> f32 {
        self.spawn_interval
    }

    /// Emit particles for every extractor that is due at time `now`.
    ///
    /// An extractor is due when strictly more than the spawn interval has
    /// passed since its last spawn. Extractors with no belt on their anchor
    /// keep their timer and try again next tick. When several belts share the
    /// anchor the first placed one is used.
    pub fn run(
        &self,
        objects: &mut ObjectRegistry,
        particles: &mut ParticleField,
        geometry: &GridGeometry,
        now: f32,
    ) -> Vec<SpawnRecord> {
        let mut spawned = Vec::new();

        for key in objects.keys_of(BuildingKind::Extractor) {
            let Some(extractor) = objects.get_by_key(key) else {
                continue;
            };
            let BuildingState::Extractor(state) = &extractor.state else {
                continue;
            };
            if now - state.last_spawn_time <= self.spawn_interval {
                continue;
            }
            let extractor_id = extractor.id;
            let anchor = geometry.extractor_anchor(extractor.position, extractor.rotation);

            let Some((belt_id, direction)) = objects
                .transporters()
                .find(|belt| belt.position == anchor)
                .map(|belt| (belt.id, geometry.belt_direction(belt.rotation)))
            else {
                continue;
            };

            let position = anchor - direction * geometry.grid_size();
            particles.spawn(TransportParticle::new(position, direction, now));

            if let Some(BuildingState::Extractor(state)) =
                objects.get_by_key_mut(key).map(|o| &mut o.state)
            {
                state.last_spawn_time = now;
            }

            tracing::debug!(
                extractor = ?extractor_id,
                belt = ?belt_id,
                ?position,
                now,
                "particle spawned"
            );
            spawned.push(SpawnRecord {
                extractor: extractor_id,
                transporter: belt_id,
                position,
            });
        }

        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mineral::MineralRegistry;
    use std::f32::consts::FRAC_PI_2;

    fn scheduler() -> MiningScheduler {
        MiningScheduler::from_config(&SimConfig::default())
    }

    fn connected_world(belt_rotation: f32) -> (ObjectRegistry, ObjectId, ObjectId) {
        let g = GridGeometry::default();
        let mut minerals = MineralRegistry::new([Vec3::ZERO], 100.0);
        let mut objects = ObjectRegistry::new();
        let extractor = objects
            .place(BuildingKind::Extractor, Vec3::ZERO, 0.0, &mut minerals)
            .unwrap();
        let belt = objects
            .place(
                BuildingKind::Transporter,
                g.extractor_anchor(Vec3::ZERO, 0.0),
                belt_rotation,
                &mut minerals,
            )
            .unwrap();
        (objects, extractor, belt)
    }

    #[test]
    fn no_spawn_until_interval_strictly_exceeded() {
        let g = GridGeometry::default();
        let (mut objects, _, _) = connected_world(0.0);
        let mut particles = ParticleField::new();

        assert!(scheduler().run(&mut objects, &mut particles, &g, 5.0).is_empty());
        assert!(particles.is_empty());
    }

    #[test]
    fn spawns_one_cell_upstream_of_the_belt() {
        let g = GridGeometry::default();
        let (mut objects, extractor, belt) = connected_world(0.0);
        let mut particles = ParticleField::new();

        let spawned = scheduler().run(&mut objects, &mut particles, &g, 5.5);
        assert_eq!(
            spawned,
            vec![SpawnRecord {
                extractor,
                transporter: belt,
                position: Vec3::new(-10.0, 0.0, 4.0),
            }]
        );
        let p = particles.iter().next().unwrap();
        assert_eq!(p.direction, Vec3::Z);
        assert_eq!(p.spawn_time, 5.5);
        assert_eq!(p.initial_position, p.position);
        assert_eq!(
            objects.get(extractor).unwrap().as_extractor().unwrap().last_spawn_time,
            5.5
        );
    }

    #[test]
    fn spawn_direction_follows_the_belt() {
        let g = GridGeometry::default();
        let (mut objects, _, _) = connected_world(FRAC_PI_2);
        let mut particles = ParticleField::new();

        scheduler().run(&mut objects, &mut particles, &g, 6.0);
        let p = particles.iter().next().unwrap();
        assert_eq!(p.direction, Vec3::X);
        assert_eq!(p.position, Vec3::new(-12.0, 0.0, 6.0));
    }

    #[test]
    fn timer_resets_after_spawn() {
        let g = GridGeometry::default();
        let (mut objects, _, _) = connected_world(0.0);
        let mut particles = ParticleField::new();
        let s = scheduler();

        assert_eq!(s.run(&mut objects, &mut particles, &g, 6.0).len(), 1);
        assert!(s.run(&mut objects, &mut particles, &g, 11.0).is_empty());
        assert_eq!(s.run(&mut objects, &mut particles, &g, 11.5).len(), 1);
        assert_eq!(particles.len(), 2);
    }

    #[test]
    fn unconnected_extractor_keeps_waiting() {
        let g = GridGeometry::default();
        let mut minerals = MineralRegistry::new([Vec3::ZERO], 100.0);
        let mut objects = ObjectRegistry::new();
        let extractor = objects
            .place(BuildingKind::Extractor, Vec3::ZERO, 0.0, &mut minerals)
            .unwrap();
        // A belt near, but not on, the anchor.
        objects
            .place(
                BuildingKind::Transporter,
                Vec3::new(-10.0, 0.0, 8.0),
                0.0,
                &mut minerals,
            )
            .unwrap();
        let mut particles = ParticleField::new();

        assert!(scheduler().run(&mut objects, &mut particles, &g, 100.0).is_empty());
        assert_eq!(
            objects.get(extractor).unwrap().as_extractor().unwrap().last_spawn_time,
            0.0
        );
    }
}
