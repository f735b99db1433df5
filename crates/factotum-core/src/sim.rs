//! Simulation clock and determinism hash.

use glam::Vec3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable clock tracked by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimState {
    /// Number of completed ticks.
    pub tick: u64,
    /// Accumulated simulation time. Each tick adds its `dt` unclamped.
    pub time: f32,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by one tick of length `dt`. Returns the new time.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.tick += 1;
        self.time += dt;
        self.time
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A deterministic hash of simulation state for desync detection.
///
/// Uses FNV-1a (64-bit). Not cryptographic. Floats are hashed by bit pattern,
/// so `0.0` and `-0.0` differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn write_vec3(&mut self, v: Vec3) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_state_starts_at_zero() {
        let state = SimState::new();
        assert_eq!(state.tick, 0);
        assert_eq!(state.time, 0.0);
    }

    #[test]
    fn advance_accumulates_unclamped() {
        let mut state = SimState::new();
        state.advance(0.5);
        assert_eq!(state.advance(30.0), 30.5);
        assert_eq!(state.tick, 2);
    }

    #[test]
    fn state_hash_deterministic() {
        let mut h1 = StateHash::new();
        h1.write_u64(42);
        h1.write_vec3(Vec3::new(1.0, 0.0, -2.0));

        let mut h2 = StateHash::new();
        h2.write_u64(42);
        h2.write_vec3(Vec3::new(1.0, 0.0, -2.0));

        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_order_matters() {
        let mut h1 = StateHash::new();
        h1.write_u32(1);
        h1.write_u32(2);

        let mut h2 = StateHash::new();
        h2.write_u32(2);
        h2.write_u32(1);

        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn float_bits_are_hashed() {
        let mut h1 = StateHash::new();
        h1.write_f32(0.0);
        let mut h2 = StateHash::new();
        h2.write_f32(-0.0);
        assert_ne!(h1.finish(), h2.finish());
    }
}
