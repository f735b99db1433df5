//! The simulation engine: owns the world and drives the per-tick pipeline.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - An [`ObjectRegistry`] of placed buildings
//! - A [`MineralRegistry`] of deposits and their claims
//! - A [`ParticleField`] of resources in flight
//! - A [`PlacementState`] for the preview and its cached validity
//! - A [`CommandQueue`], an [`EventBus`] and a [`DirtyTracker`]
//!
//! # Tick Pipeline
//!
//! Each [`Engine::tick`] runs:
//! 1. **Commands** -- drain submitted commands in submission order
//! 2. **Clock** -- advance tick counter and simulation time by `dt`
//! 3. **Mining** -- due extractors emit particles onto their belts
//! 4. **Transport** -- particles move, turn, enter processors, or fall off
//! 5. **Post-tick** -- refresh the preview, deliver buffered events

use glam::Vec3;

use crate::command::{Command, CommandOutcome, CommandQueue};
use crate::config::{ConfigError, SimConfig};
use crate::dirty::DirtyTracker;
use crate::event::{Event, EventBus, EventKind, PassiveListener};
use crate::grid::GridGeometry;
use crate::id::ObjectId;
use crate::mineral::{MineralError, MineralRegistry};
use crate::mining::{MiningScheduler, SpawnRecord};
use crate::object::{BuildingKind, BuildingState, PlacedObject};
use crate::placement::{PlacementPreview, PlacementState, Ray};
use crate::query::{object_transform, MineralSnapshot, ObjectSnapshot, PreviewSnapshot, RenderSnapshot};
use crate::registry::ObjectRegistry;
use crate::sim::{SimState, StateHash};
use crate::transport::{ParticleField, TransportEngine, TransportParticle, TransportResult};
use crate::validation::{validate, PlacementRejection};

/// Everything that happened during one [`Engine::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub time: f32,
    /// Outcomes of queued commands, in submission order.
    pub commands: Vec<CommandOutcome>,
    pub spawned: Vec<SpawnRecord>,
    pub transport: TransportResult,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Engine {
    config: SimConfig,
    geometry: GridGeometry,
    mining: MiningScheduler,
    transport: TransportEngine,

    pub sim_state: SimState,

    pub(crate) objects: ObjectRegistry,
    pub(crate) minerals: MineralRegistry,
    pub(crate) particles: ParticleField,

    placement: PlacementState,
    /// Preview as of the last refresh; `None` outside placement mode.
    preview: Option<PlacementPreview>,

    commands: CommandQueue,

    /// Typed event bus for simulation events.
    pub event_bus: EventBus,

    pub(crate) dirty: DirtyTracker,
}

impl Engine {
    /// Create an engine over a fixed set of deposits.
    pub fn new(config: SimConfig, minerals: MineralRegistry) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::debug!(deposits = minerals.len(), ?config, "engine created");
        Ok(Self {
            geometry: GridGeometry::from_config(&config),
            mining: MiningScheduler::from_config(&config),
            transport: TransportEngine::from_config(&config),
            sim_state: SimState::new(),
            objects: ObjectRegistry::new(),
            minerals,
            particles: ParticleField::new(),
            placement: PlacementState::new(),
            preview: None,
            commands: CommandQueue::new(),
            event_bus: EventBus::new(config.event_capacity),
            dirty: DirtyTracker::all_dirty(),
            config,
        })
    }

    /// Create an engine with one deposit at each position, each holding
    /// `config.mineral_amount`.
    pub fn with_deposits(
        config: SimConfig,
        positions: impl IntoIterator<Item = Vec3>,
    ) -> Result<Self, ConfigError> {
        let minerals = MineralRegistry::new(positions, config.mineral_amount);
        Self::new(config, minerals)
    }

    /// Keep up to `max` executed commands for replay and debugging.
    pub fn with_command_history(mut self, max: usize) -> Self {
        let mut queue = CommandQueue::with_max_history(max);
        queue.push_batch(self.commands.drain(self.sim_state.tick));
        self.commands = queue;
        self
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Decide whether a building could be placed, without changing anything.
    pub fn validate_placement(
        &self,
        kind: BuildingKind,
        position: Vec3,
        rotation: f32,
    ) -> Result<(), PlacementRejection> {
        validate(
            &self.geometry,
            kind,
            position,
            rotation,
            &self.objects,
            &self.minerals,
        )
    }

    /// Validate and commit a building. A rejected placement changes nothing
    /// apart from emitting a `PlacementRejected` event.
    pub fn place(
        &mut self,
        kind: BuildingKind,
        position: Vec3,
        rotation: f32,
    ) -> Result<ObjectId, PlacementRejection> {
        let time = self.sim_state.time;
        let result = self
            .validate_placement(kind, position, rotation)
            .and_then(|()| {
                self.objects
                    .place(kind, position, rotation, &mut self.minerals)
                    .map_err(rejection_for)
            });

        let id = match result {
            Ok(id) => id,
            Err(reason) => {
                tracing::info!(%kind, ?position, reason = reason.tag(), "placement rejected");
                self.event_bus.emit(Event::PlacementRejected {
                    kind,
                    position,
                    reason,
                    time,
                });
                return Err(reason);
            }
        };

        tracing::info!(%kind, ?id, ?position, rotation, "placed");
        self.event_bus.emit(Event::ObjectPlaced {
            object: id,
            kind,
            position,
            time,
        });
        if let Some(mineral) = self
            .objects
            .get(id)
            .and_then(PlacedObject::as_extractor)
            .and_then(|e| e.claimed)
        {
            self.event_bus.emit(Event::MineralClaimed {
                mineral,
                extractor: id,
                time,
            });
            self.dirty.mark_minerals();
        }
        self.dirty.mark_objects();
        self.refresh_preview();
        Ok(id)
    }

    /// Remove the building anchored exactly at `position`, releasing its
    /// deposit claim. Returns `None` (and changes nothing) when no building
    /// is anchored there.
    pub fn remove_at(&mut self, position: Vec3) -> Option<PlacedObject> {
        let Some(removed) = self.objects.remove_at(position, &mut self.minerals) else {
            tracing::info!(?position, "nothing to remove");
            return None;
        };
        let time = self.sim_state.time;

        tracing::info!(kind = %removed.kind(), id = ?removed.id, ?position, "removed");
        self.event_bus.emit(Event::ObjectRemoved {
            object: removed.id,
            kind: removed.kind(),
            position,
            time,
        });
        if let Some(mineral) = removed.as_extractor().and_then(|e| e.claimed) {
            tracing::info!(?mineral, "deposit released");
            self.event_bus.emit(Event::MineralReleased { mineral, time });
            self.dirty.mark_minerals();
        }
        self.dirty.mark_objects();
        self.refresh_preview();
        Some(removed)
    }

    /// Where a view ray meets the ground, snapped to the grid.
    pub fn ground_point(&self, ray: Ray) -> Option<Vec3> {
        self.geometry.ground_intersection(ray.camera, ray.look)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Run a command right away.
    pub fn execute(&mut self, command: Command) -> CommandOutcome {
        let outcome = match command {
            Command::BeginPlacement => {
                self.placement.begin();
                self.placement_mode_changed()
            }
            Command::EndPlacement => {
                self.placement.end();
                self.placement_mode_changed()
            }
            Command::TogglePlacement => {
                self.placement.toggle();
                self.placement_mode_changed()
            }
            Command::SelectBuilding(kind) => {
                self.placement.select(kind);
                tracing::debug!(%kind, "building selected");
                CommandOutcome::PreviewUpdated
            }
            Command::RotatePreview => {
                let rotation = self.placement.rotate();
                tracing::debug!(degrees = rotation.to_degrees(), "preview rotated");
                CommandOutcome::PreviewUpdated
            }
            Command::Aim(ray) => {
                self.placement.set_aim(ray);
                CommandOutcome::PreviewUpdated
            }
            Command::CommitPlacement(ray) => self.commit_at(ray),
            Command::RemoveAt(ray) => self.remove_with_ray(ray),
        };
        self.refresh_preview();
        outcome
    }

    /// Queue a command for the start of the next tick.
    pub fn submit(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.pending_count()
    }

    pub fn command_history(&self) -> &[(u64, Command)] {
        self.commands.history()
    }

    fn placement_mode_changed(&mut self) -> CommandOutcome {
        let active = self.placement.is_active();
        tracing::info!(active, "placement mode");
        CommandOutcome::PlacementMode { active }
    }

    fn commit_at(&mut self, ray: Ray) -> CommandOutcome {
        if !self.placement.is_active() {
            return CommandOutcome::NotInPlacementMode;
        }
        self.placement.set_aim(ray);
        let Some(position) = self.ground_point(ray) else {
            return CommandOutcome::NoGroundPoint;
        };
        match self.place(self.placement.kind(), position, self.placement.rotation()) {
            Ok(id) => CommandOutcome::Placed(id),
            Err(reason) => CommandOutcome::Rejected(reason),
        }
    }

    fn remove_with_ray(&mut self, ray: Ray) -> CommandOutcome {
        if !self.placement.is_active() {
            return CommandOutcome::NotInPlacementMode;
        }
        self.placement.set_aim(ray);
        let Some(position) = self.ground_point(ray) else {
            return CommandOutcome::NoGroundPoint;
        };
        match self.remove_at(position) {
            Some(removed) => CommandOutcome::Removed(removed.id),
            None => CommandOutcome::NothingToRemove,
        }
    }

    fn refresh_preview(&mut self) {
        let preview = self
            .placement
            .preview(&self.geometry, &self.objects, &self.minerals);
        if preview != self.preview {
            self.preview = preview;
            self.dirty.mark_preview();
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the simulation by `dt` time units. `dt` is not clamped; a
    /// large step moves particles proportionally far.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let queued = self.commands.drain(self.sim_state.tick);
        let mut commands = Vec::with_capacity(queued.len());
        for command in queued {
            commands.push(self.execute(command));
        }

        let now = self.sim_state.advance(dt);
        let had_particles = !self.particles.is_empty();

        let spawned = self
            .mining
            .run(&mut self.objects, &mut self.particles, &self.geometry, now);
        for record in &spawned {
            self.event_bus.emit(Event::ParticleSpawned {
                extractor: record.extractor,
                transporter: record.transporter,
                position: record.position,
                time: now,
            });
        }

        let transport =
            self.transport
                .step(&mut self.particles, &mut self.objects, &self.geometry, dt, now);
        for &(processor, position) in &transport.consumed {
            tracing::info!(?processor, ?position, now, "particle consumed");
            self.event_bus.emit(Event::ParticleConsumed {
                processor,
                position,
                time: now,
            });
        }
        for &position in &transport.dropped {
            tracing::debug!(?position, now, "particle fell off the belt");
            self.event_bus
                .emit(Event::ParticleDropped { position, time: now });
        }

        if !spawned.is_empty() || !transport.consumed.is_empty() {
            self.dirty.mark_objects();
        }
        if had_particles || !spawned.is_empty() {
            self.dirty.mark_particles();
        }

        self.refresh_preview();
        self.event_bus.deliver();

        TickReport {
            tick: self.sim_state.tick,
            time: now,
            commands,
            spawned,
            transport,
        }
    }

    /// Put a particle into the world at the current time.
    pub fn inject_particle(&mut self, position: Vec3, direction: Vec3) {
        self.particles.spawn(TransportParticle::new(
            position,
            direction,
            self.sim_state.time,
        ));
        self.dirty.mark_particles();
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn suppress_event(&mut self, kind: EventKind) {
        self.event_bus.suppress(kind);
    }

    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.event_bus.on_passive(kind, listener);
    }

    // -----------------------------------------------------------------------
    // Snapshots & dirty tracking
    // -----------------------------------------------------------------------

    /// Build the renderer's view of the current state and mark everything clean.
    pub fn snapshot(&mut self) -> RenderSnapshot {
        let snapshot = self.render_snapshot();
        self.dirty.mark_clean();
        snapshot
    }

    /// Like [`snapshot`](Self::snapshot), but `None` when nothing changed
    /// since the last one.
    pub fn snapshot_if_dirty(&mut self) -> Option<RenderSnapshot> {
        self.dirty.is_dirty().then(|| self.snapshot())
    }

    /// Build the renderer's view without touching dirty state.
    pub fn render_snapshot(&self) -> RenderSnapshot {
        let objects = self
            .objects
            .iter()
            .map(|o| ObjectSnapshot::from_object(o, self.geometry.belt_direction(o.rotation)))
            .collect();
        let preview = self.preview.map(|p| PreviewSnapshot {
            kind: p.kind,
            transform: p.position.map(|pos| object_transform(pos, p.rotation)),
            valid: p.is_valid(),
        });
        let minerals = self
            .minerals
            .iter()
            .map(|n| MineralSnapshot {
                id: n.id,
                position: n.position,
                remaining_amount: n.remaining_amount,
                is_being_mined: n.is_being_mined,
            })
            .collect();

        RenderSnapshot {
            tick: self.sim_state.tick,
            time: self.sim_state.time,
            objects,
            particles: self.particles.positions(),
            preview,
            minerals,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    pub fn dirty_tracker(&self) -> &DirtyTracker {
        &self.dirty
    }

    // -----------------------------------------------------------------------
    // State hash
    // -----------------------------------------------------------------------

    /// Deterministic hash over the clock, buildings, claims and particles.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.sim_state.tick);
        hasher.write_f32(self.sim_state.time);

        for object in self.objects.iter() {
            hasher.write_u64(object.id.0);
            hasher.write_u32(object.kind() as u32);
            hasher.write_vec3(object.position);
            hasher.write_f32(object.rotation);
            match &object.state {
                BuildingState::Extractor(state) => {
                    hasher.write_f32(state.last_spawn_time);
                    hasher.write_u32(state.claimed.map_or(u32::MAX, |m| m.0));
                }
                BuildingState::Transporter => {}
                BuildingState::Processor(state) => {
                    hasher.write_u64(state.ore_arrivals.len() as u64);
                    for &t in &state.ore_arrivals {
                        hasher.write_f32(t);
                    }
                    hasher.write_u64(state.coal_arrivals.len() as u64);
                }
            }
        }

        for node in self.minerals.iter() {
            hasher.write(&[node.is_being_mined as u8]);
        }

        for particle in self.particles.iter() {
            hasher.write_vec3(particle.position);
            hasher.write_vec3(particle.direction);
        }

        hasher.finish()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    pub fn minerals(&self) -> &MineralRegistry {
        &self.minerals
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn placement(&self) -> &PlacementState {
        &self.placement
    }

    /// The preview as of the last command or tick.
    pub fn preview(&self) -> Option<&PlacementPreview> {
        self.preview.as_ref()
    }

    pub fn time(&self) -> f32 {
        self.sim_state.time
    }

    pub fn tick_count(&self) -> u64 {
        self.sim_state.tick
    }
}

/// A claim that fails after validation passed means the deposit state moved
/// underneath us; report it the way validation would have.
fn rejection_for(err: MineralError) -> PlacementRejection {
    tracing::warn!(%err, "deposit claim failed after validation");
    match err {
        MineralError::AlreadyClaimed(_) => PlacementRejection::MineralClaimed,
        MineralError::UnknownNode(_) | MineralError::NotClaimed(_) => PlacementRejection::NoMineral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::MineralId;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine() -> Engine {
        Engine::with_deposits(SimConfig::default(), [Vec3::ZERO]).unwrap()
    }

    fn down_at(x: f32, z: f32) -> Ray {
        Ray::new(Vec3::new(x, 10.0, z), Vec3::NEG_Y)
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = SimConfig {
            grid_size: 0.0,
            ..SimConfig::default()
        };
        assert!(Engine::with_deposits(config, []).is_err());
    }

    #[test]
    fn place_claims_and_remove_releases() {
        let mut e = engine();
        let id = e.place(BuildingKind::Extractor, Vec3::ZERO, 0.0).unwrap();
        assert!(e.minerals().get(MineralId(0)).unwrap().is_being_mined);

        let removed = e.remove_at(Vec3::ZERO).unwrap();
        assert_eq!(removed.id, id);
        assert!(!e.minerals().get(MineralId(0)).unwrap().is_being_mined);
    }

    #[test]
    fn rejected_place_changes_nothing() {
        let mut e = engine();
        let before = e.state_hash();
        assert_eq!(
            e.place(BuildingKind::Transporter, Vec3::ZERO, 0.0),
            Err(PlacementRejection::MineralBlocksNonExtractor)
        );
        assert!(e.objects().is_empty());
        assert_eq!(e.state_hash(), before);
    }

    #[test]
    fn commit_ignored_outside_placement_mode() {
        let mut e = engine();
        assert_eq!(
            e.execute(Command::CommitPlacement(down_at(0.0, 0.0))),
            CommandOutcome::NotInPlacementMode
        );
        assert_eq!(
            e.execute(Command::RemoveAt(down_at(0.0, 0.0))),
            CommandOutcome::NotInPlacementMode
        );
        assert!(e.objects().is_empty());
    }

    #[test]
    fn commit_places_selected_kind_with_preview_rotation() {
        let mut e = engine();
        e.execute(Command::BeginPlacement);
        e.execute(Command::SelectBuilding(BuildingKind::Transporter));
        e.execute(Command::RotatePreview);
        let outcome = e.execute(Command::CommitPlacement(down_at(8.1, 8.2)));

        let CommandOutcome::Placed(id) = outcome else {
            panic!("expected placement, got {outcome:?}");
        };
        let obj = e.objects().get(id).unwrap();
        assert_eq!(obj.kind(), BuildingKind::Transporter);
        assert_eq!(obj.position, Vec3::new(8.0, 0.0, 8.0));
        assert_eq!(obj.rotation, std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn commit_without_ground_point() {
        let mut e = engine();
        e.execute(Command::BeginPlacement);
        let up = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::Y);
        assert_eq!(
            e.execute(Command::CommitPlacement(up)),
            CommandOutcome::NoGroundPoint
        );
    }

    #[test]
    fn remove_with_nothing_there() {
        let mut e = engine();
        e.execute(Command::TogglePlacement);
        assert_eq!(
            e.execute(Command::RemoveAt(down_at(20.0, 20.0))),
            CommandOutcome::NothingToRemove
        );
    }

    #[test]
    fn preview_tracks_validity() {
        let mut e = engine();
        e.execute(Command::BeginPlacement);
        e.execute(Command::Aim(down_at(0.0, 0.0)));
        assert!(e.preview().unwrap().is_valid());

        e.place(BuildingKind::Extractor, Vec3::ZERO, 0.0).unwrap();
        let preview = e.preview().unwrap();
        assert!(!preview.is_valid());

        e.execute(Command::EndPlacement);
        assert!(e.preview().is_none());
    }

    #[test]
    fn submitted_commands_run_on_next_tick() {
        let mut e = engine();
        e.submit(Command::BeginPlacement);
        e.submit(Command::CommitPlacement(down_at(0.0, 0.0)));
        assert_eq!(e.pending_commands(), 2);
        assert!(e.objects().is_empty());

        let report = e.tick(0.1);
        assert_eq!(report.commands.len(), 2);
        assert!(matches!(report.commands[1], CommandOutcome::Placed(_)));
        assert_eq!(e.objects().len(), 1);
        assert_eq!(e.pending_commands(), 0);
    }

    #[test]
    fn command_history_is_recorded() {
        let mut e = engine().with_command_history(8);
        e.submit(Command::TogglePlacement);
        e.tick(0.1);
        assert_eq!(e.command_history(), &[(0, Command::TogglePlacement)]);
    }

    #[test]
    fn tick_advances_clock() {
        let mut e = engine();
        e.tick(0.25);
        let report = e.tick(0.25);
        assert_eq!(report.tick, 2);
        assert_eq!(report.time, 0.5);
        assert_eq!(e.time(), 0.5);
    }

    #[test]
    fn snapshot_if_dirty_skips_unchanged_frames() {
        let mut e = engine();
        assert!(e.snapshot_if_dirty().is_some());
        assert!(e.snapshot_if_dirty().is_none());

        e.tick(0.1);
        assert!(e.snapshot_if_dirty().is_none());

        e.place(BuildingKind::Extractor, Vec3::ZERO, 0.0).unwrap();
        let snap = e.snapshot_if_dirty().unwrap();
        assert_eq!(snap.objects.len(), 1);
        assert!(snap.minerals[0].is_being_mined);
    }

    #[test]
    fn snapshot_contains_preview_transform() {
        let mut e = engine();
        e.execute(Command::BeginPlacement);
        e.execute(Command::Aim(down_at(4.0, -2.0)));
        let snap = e.snapshot();
        let preview = snap.preview.unwrap();
        assert!(!preview.valid);
        assert_eq!(
            preview.transform,
            Some(object_transform(Vec3::new(4.0, 0.0, -2.0), 0.0))
        );
    }

    #[test]
    fn events_are_delivered_at_end_of_tick() {
        let mut e = engine();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        e.on_passive(
            EventKind::ObjectPlaced,
            Box::new(move |ev| sink.borrow_mut().push(ev.clone())),
        );

        e.place(BuildingKind::Extractor, Vec3::ZERO, 0.0).unwrap();
        assert!(seen.borrow().is_empty());
        e.tick(0.1);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn suppressed_events_are_not_buffered() {
        let mut e = engine();
        e.suppress_event(EventKind::PlacementRejected);
        let _ = e.place(BuildingKind::Processor, Vec3::ZERO, 0.0);
        assert_eq!(e.event_bus.pending_count(), 0);
    }

    #[test]
    fn injected_particle_without_belts_drops() {
        let mut e = engine();
        e.inject_particle(Vec3::new(10.0, 0.0, 10.0), Vec3::X);
        let report = e.tick(0.1);
        assert_eq!(report.transport.dropped.len(), 1);
        assert!(e.particles().is_empty());
    }

    #[test]
    fn state_hash_is_deterministic() {
        let run = || {
            let mut e = engine();
            e.place(BuildingKind::Extractor, Vec3::ZERO, 0.0).unwrap();
            e.place(BuildingKind::Transporter, Vec3::new(-10.0, 0.0, 6.0), 0.0)
                .unwrap();
            for _ in 0..20 {
                e.tick(0.5);
            }
            e.state_hash()
        };
        assert_eq!(run(), run());
    }
}
