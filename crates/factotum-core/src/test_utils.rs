//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use glam::Vec3;

use crate::config::SimConfig;
use crate::engine::Engine;
use crate::id::ObjectId;
use crate::object::BuildingKind;
use crate::placement::Ray;

/// Grid spacing used by every helper below.
pub const GRID: f32 = 2.0;

// ===========================================================================
// Geometry helpers
// ===========================================================================

/// World position of cell (x, z) on the default grid.
pub fn cell(x: i32, z: i32) -> Vec3 {
    Vec3::new(x as f32 * GRID, 0.0, z as f32 * GRID)
}

pub fn deg(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// A ray looking straight down onto `position` from 10 units up.
pub fn down_ray(position: Vec3) -> Ray {
    Ray::new(position + Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y)
}

// ===========================================================================
// Engine setup
// ===========================================================================

pub fn engine_with_minerals(positions: &[Vec3]) -> Engine {
    Engine::with_deposits(SimConfig::default(), positions.iter().copied())
        .expect("default config is valid")
}

pub fn inject_particle(engine: &mut Engine, position: Vec3, direction: Vec3) {
    engine.inject_particle(position, direction);
}

pub fn run_ticks(engine: &mut Engine, ticks: usize, dt: f32) {
    for _ in 0..ticks {
        engine.tick(dt);
    }
}

// ===========================================================================
// Queries
// ===========================================================================

/// Number of ore particles a processor has consumed.
pub fn ore_count(engine: &Engine, processor: ObjectId) -> usize {
    engine
        .objects()
        .get(processor)
        .and_then(|o| o.as_processor())
        .map_or(0, |p| p.ore_arrivals.len())
}

// ===========================================================================
// Factory builders
// ===========================================================================

/// Ids of a built extractor -> belts -> processor line.
#[derive(Debug, Clone)]
pub struct MiningChain {
    pub extractor: ObjectId,
    pub belts: Vec<ObjectId>,
    pub processor: ObjectId,
}

/// An extractor on a deposit at the origin, `belt_count` belts running +z
/// from its anchor at (-10, 0, 6), and a processor right after the last belt.
pub fn build_mining_chain(belt_count: usize) -> (Engine, MiningChain) {
    let mut engine = engine_with_minerals(&[Vec3::ZERO]);
    let extractor = engine
        .place(BuildingKind::Extractor, Vec3::ZERO, 0.0)
        .expect("extractor on free deposit");

    let belts = (0..belt_count as i32)
        .map(|i| {
            engine
                .place(BuildingKind::Transporter, cell(-5, 3 + i), 0.0)
                .expect("belt on free cell")
        })
        .collect();
    let processor = engine
        .place(BuildingKind::Processor, cell(-5, 3 + belt_count as i32), 0.0)
        .expect("processor on free cells");

    (
        engine,
        MiningChain {
            extractor,
            belts,
            processor,
        },
    )
}

/// `lines` parallel belt lines of `length` belts each, running +z, with a
/// particle entering every line. No deposits.
pub fn build_belt_field(lines: usize, length: usize) -> Engine {
    let mut engine = engine_with_minerals(&[]);
    for line in 0..lines as i32 {
        let x = line * 2;
        for z in 0..length as i32 {
            engine
                .place(BuildingKind::Transporter, cell(x, z), 0.0)
                .expect("belt on free cell");
        }
        engine.inject_particle(cell(x, 0), Vec3::Z);
    }
    engine
}
