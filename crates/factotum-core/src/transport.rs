//! Resource particles in flight and the per-tick routing rules that move them.
//!
//! A particle survives a tick only while it is "on path": close enough to a
//! belt that it either snaps onto it or will reach it on the next step.
//! On-path particles that touch a processor cell are consumed there; every
//! other particle falls off the belt and is removed.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::grid::GridGeometry;
use crate::id::ObjectId;
use crate::object::{BuildingKind, BuildingState};
use crate::registry::ObjectRegistry;

// ---------------------------------------------------------------------------
// Particles
// ---------------------------------------------------------------------------

/// A unit of mined resource travelling along the belts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportParticle {
    pub initial_position: Vec3,
    pub position: Vec3,
    /// Unit direction on the ground plane. Changes only when a belt redirects it.
    pub direction: Vec3,
    pub spawn_time: f32,
}

impl TransportParticle {
    pub fn new(position: Vec3, direction: Vec3, spawn_time: f32) -> Self {
        Self {
            initial_position: position,
            position,
            direction,
            spawn_time,
        }
    }
}

/// Every particle currently in flight, in spawn order.
#[derive(Debug, Clone, Default)]
pub struct ParticleField {
    particles: Vec<TransportParticle>,
}

impl ParticleField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, particle: TransportParticle) {
        self.particles.push(particle);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransportParticle> {
        self.particles.iter()
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.particles.iter().map(|p| p.position).collect()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

// ---------------------------------------------------------------------------
// Transport step
// ---------------------------------------------------------------------------

/// What happened to particles during one transport step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportResult {
    /// Processor that swallowed each consumed particle, with the particle's last position.
    pub consumed: Vec<(ObjectId, Vec3)>,
    /// Last position of every particle that fell off the belt.
    pub dropped: Vec<Vec3>,
    /// Number of particles that snapped onto a belt this step.
    pub redirected: usize,
}

/// Moves and routes particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportEngine {
    speed: f32,
    capture_radius: f32,
    look_ahead_radius: f32,
}

impl TransportEngine {
    pub fn new(speed: f32, capture_radius: f32, look_ahead_radius: f32) -> Self {
        Self {
            speed,
            capture_radius,
            look_ahead_radius,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(
            config.particle_speed,
            config.capture_radius(),
            config.grid_size,
        )
    }

    /// Advance every particle by `dt` and apply belt, processor, and
    /// fall-off rules. Consumed particles are stamped with `now`.
    ///
    /// Belts and processors are scanned in placement order; the first match wins.
    pub fn step(
        &self,
        particles: &mut ParticleField,
        objects: &mut ObjectRegistry,
        geometry: &GridGeometry,
        dt: f32,
        now: f32,
    ) -> TransportResult {
        let mut result = TransportResult::default();
        if particles.is_empty() {
            return result;
        }

        let belts: Vec<(Vec3, Vec3)> = objects
            .transporters()
            .map(|o| (o.position, geometry.belt_direction(o.rotation)))
            .collect();
        let sinks: Vec<_> = objects
            .keys_of(BuildingKind::Processor)
            .into_iter()
            .filter_map(|key| {
                let obj = objects.get_by_key(key)?;
                let cells: Vec<Vec3> = geometry
                    .processor_footprint(obj.position, obj.rotation)
                    .into_iter()
                    .map(|c| c.to_world(geometry.grid_size()))
                    .collect();
                Some((key, obj.id, cells))
            })
            .collect();

        let travel = self.speed * dt;

        particles.particles.retain_mut(|particle| {
            particle.position += particle.direction * travel;

            let mut on_path = false;
            for &(belt, direction) in &belts {
                if particle.position.distance(belt) <= self.capture_radius {
                    particle.direction = direction;
                    result.redirected += 1;
                    on_path = true;
                    break;
                }
                let next = particle.position + particle.direction * travel;
                if next.distance(belt) <= self.look_ahead_radius {
                    on_path = true;
                    break;
                }
            }

            if !on_path {
                result.dropped.push(particle.position);
                return false;
            }

            for (key, id, cells) in &sinks {
                let touches = cells
                    .iter()
                    .any(|cell| cell.distance(particle.position) <= self.capture_radius);
                if !touches {
                    continue;
                }
                if let Some(obj) = objects.get_by_key_mut(*key) {
                    if let BuildingState::Processor(state) = &mut obj.state {
                        state.ore_arrivals.push(now);
                    }
                }
                result.consumed.push((*id, particle.position));
                return false;
            }

            true
        });

        result
    }
}
