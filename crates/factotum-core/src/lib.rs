//! Factotum Core -- grid placement and resource transport for a factory
//! automation game.
//!
//! Players place extractors, belts (transporters) and processors on a
//! world-aligned grid. Extractors sitting on a mineral deposit emit resource
//! particles onto a connecting belt; particles follow belts until a processor
//! swallows them or they fall off.
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::Engine::tick`] runs:
//!
//! 1. **Commands** -- Apply queued input commands in submission order.
//! 2. **Clock** -- Advance tick counter and simulation time.
//! 3. **Mining** -- Due extractors spawn particles at their belt.
//! 4. **Transport** -- Move, redirect, consume and drop particles.
//! 5. **Post-tick** -- Refresh the placement preview and deliver events.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Owns the world and orchestrates the pipeline.
//! - [`grid::GridGeometry`] -- Footprints, cardinal snapping, ground picking.
//! - [`validation::validate`] -- Pure placement decision.
//! - [`registry::ObjectRegistry`] -- Arena of placed buildings.
//! - [`mineral::MineralRegistry`] -- Deposits and exclusive claims.
//! - [`mining::MiningScheduler`] / [`transport::TransportEngine`] -- The
//!   two simulation phases.
//! - [`query::RenderSnapshot`] -- Owned, read-only frame data for rendering.

pub mod command;
pub mod config;
pub mod dirty;
pub mod engine;
pub mod event;
pub mod grid;
pub mod id;
pub mod mineral;
pub mod mining;
pub mod object;
pub mod placement;
pub mod query;
pub mod registry;
pub mod sim;
pub mod transport;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
