/// Tracks which parts of the world changed since the last clean point.
///
/// The engine uses this to skip rebuilding render snapshots when nothing has
/// changed. Call [`mark_clean`](DirtyTracker::mark_clean) after consuming a
/// snapshot to reset every flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyTracker {
    objects: bool,
    particles: bool,
    preview: bool,
    minerals: bool,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start fully dirty so the first snapshot is always produced.
    pub fn all_dirty() -> Self {
        Self {
            objects: true,
            particles: true,
            preview: true,
            minerals: true,
        }
    }

    /// A building was placed or removed, or its payload changed.
    pub fn mark_objects(&mut self) {
        self.objects = true;
    }

    /// A particle was spawned, moved, or removed.
    pub fn mark_particles(&mut self) {
        self.particles = true;
    }

    /// Placement mode, the selected kind, rotation, or aim changed.
    pub fn mark_preview(&mut self) {
        self.preview = true;
    }

    /// A deposit was claimed or released.
    pub fn mark_minerals(&mut self) {
        self.minerals = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.objects || self.particles || self.preview || self.minerals
    }

    pub fn objects_dirty(&self) -> bool {
        self.objects
    }

    pub fn particles_dirty(&self) -> bool {
        self.particles
    }

    pub fn preview_dirty(&self) -> bool {
        self.preview
    }

    pub fn minerals_dirty(&self) -> bool {
        self.minerals
    }

    pub fn mark_clean(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_initially_clean() {
        let tracker = DirtyTracker::new();
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn each_flag_makes_dirty() {
        let mut t = DirtyTracker::new();
        t.mark_objects();
        assert!(t.is_dirty() && t.objects_dirty() && !t.particles_dirty());

        let mut t = DirtyTracker::new();
        t.mark_particles();
        assert!(t.is_dirty() && t.particles_dirty());

        let mut t = DirtyTracker::new();
        t.mark_preview();
        assert!(t.is_dirty() && t.preview_dirty());

        let mut t = DirtyTracker::new();
        t.mark_minerals();
        assert!(t.is_dirty() && t.minerals_dirty());
    }

    #[test]
    fn mark_clean_resets_all() {
        let mut t = DirtyTracker::all_dirty();
        assert!(t.is_dirty());
        t.mark_clean();
        assert_eq!(t, DirtyTracker::new());
    }
}
