//! Typed simulation events with pre-allocated ring buffers.
//!
//! Events are emitted while commands run and during the mining and transport
//! phases of a tick, then delivered in one batch at the end of the tick.
//! Each event kind has its own [`EventBuffer`] with a fixed capacity.
//!
//! # Suppression
//!
//! Event kinds can be suppressed via [`EventBus::suppress`]. A suppressed
//! kind is never buffered and never reaches listeners.

use std::collections::VecDeque;

use glam::Vec3;

use crate::id::{MineralId, ObjectId};
use crate::object::BuildingKind;
use crate::validation::PlacementRejection;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. Every event carries the simulation time it occurred at.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // -- Placement --
    ObjectPlaced {
        object: ObjectId,
        kind: BuildingKind,
        position: Vec3,
        time: f32,
    },
    ObjectRemoved {
        object: ObjectId,
        kind: BuildingKind,
        position: Vec3,
        time: f32,
    },
    PlacementRejected {
        kind: BuildingKind,
        position: Vec3,
        reason: PlacementRejection,
        time: f32,
    },

    // -- Deposits --
    MineralClaimed {
        mineral: MineralId,
        extractor: ObjectId,
        time: f32,
    },
    MineralReleased {
        mineral: MineralId,
        time: f32,
    },

    // -- Particles --
    ParticleSpawned {
        extractor: ObjectId,
        transporter: ObjectId,
        position: Vec3,
        time: f32,
    },
    ParticleConsumed {
        processor: ObjectId,
        position: Vec3,
        time: f32,
    },
    ParticleDropped {
        position: Vec3,
        time: f32,
    },
}

/// Discriminant tag for event types, used for suppression and subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ObjectPlaced,
    ObjectRemoved,
    PlacementRejected,
    MineralClaimed,
    MineralReleased,
    ParticleSpawned,
    ParticleConsumed,
    ParticleDropped,
}

const EVENT_KIND_COUNT: usize = 8;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ObjectPlaced { .. } => EventKind::ObjectPlaced,
            Event::ObjectRemoved { .. } => EventKind::ObjectRemoved,
            Event::PlacementRejected { .. } => EventKind::PlacementRejected,
            Event::MineralClaimed { .. } => EventKind::MineralClaimed,
            Event::MineralReleased { .. } => EventKind::MineralReleased,
            Event::ParticleSpawned { .. } => EventKind::ParticleSpawned,
            Event::ParticleConsumed { .. } => EventKind::ParticleConsumed,
            Event::ParticleDropped { .. } => EventKind::ParticleDropped,
        }
    }

    pub fn time(&self) -> f32 {
        match self {
            Event::ObjectPlaced { time, .. }
            | Event::ObjectRemoved { time, .. }
            | Event::PlacementRejected { time, .. }
            | Event::MineralClaimed { time, .. }
            | Event::MineralReleased { time, .. }
            | Event::ParticleSpawned { time, .. }
            | Event::ParticleConsumed { time, .. }
            | Event::ParticleDropped { time, .. } => *time,
        }
    }
}

impl EventKind {
    pub fn all() -> [EventKind; EVENT_KIND_COUNT] {
        [
            EventKind::ObjectPlaced,
            EventKind::ObjectRemoved,
            EventKind::PlacementRejected,
            EventKind::MineralClaimed,
            EventKind::MineralReleased,
            EventKind::ParticleSpawned,
            EventKind::ParticleConsumed,
            EventKind::ParticleDropped,
        ]
    }

    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// Bounded FIFO of events. Once full, each push evicts the oldest entry.
#[derive(Debug)]
pub struct EventBuffer {
    events: VecDeque<Event>,
    capacity: usize,
    total_written: u64,
    dropped: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Every event ever pushed, evicted ones included.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events evicted before anyone read them.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Remove and return everything buffered, oldest first.
    pub fn take(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// A read-only subscriber, e.g. for UI or logging.
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// One ring buffer per event kind, plus listeners and suppression flags.
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    /// Bit `i` set means kind `i` is suppressed.
    suppressed: u16,
    listeners: [Vec<PassiveListener>; EVENT_KIND_COUNT],
    default_capacity: usize,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: 0,
            listeners: Default::default(),
            default_capacity,
        }
    }

    /// Stop recording `kind`. Any events already buffered for it are discarded.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed |= 1 << kind.index();
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed & (1 << kind.index()) != 0
    }

    /// Buffer an event until the next [`deliver`](Self::deliver). No-op for
    /// suppressed kinds.
    pub fn emit(&mut self, event: Event) {
        let kind = event.kind();
        if self.is_suppressed(kind) {
            return;
        }
        let idx = kind.index();
        let capacity = self.default_capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    /// Register a listener for `kind`. Listeners run in registration order.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.listeners[kind.index()].push(listener);
    }

    /// Events of `kind` waiting for delivery, oldest first.
    pub fn pending(&self, kind: EventKind) -> impl Iterator<Item = &Event> {
        self.buffers[kind.index()].iter().flat_map(|b| b.iter())
    }

    /// Number of buffered events across every kind.
    pub fn pending_count(&self) -> usize {
        self.buffers.iter().flatten().map(EventBuffer::len).sum()
    }

    /// Hand every buffered event to its listeners, then clear the buffers.
    /// Kinds are visited in declaration order. Returns the number of events
    /// delivered.
    pub fn deliver(&mut self) -> usize {
        let mut delivered = 0;
        for kind in EventKind::all() {
            let idx = kind.index();
            let events = match self.buffers[idx].as_mut() {
                Some(buffer) if !buffer.is_empty() => buffer.take(),
                _ => continue,
            };
            delivered += events.len();
            for listener in &mut self.listeners[idx] {
                events.iter().for_each(|event| listener(event));
            }
        }
        delivered
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
