//! Grid geometry: cardinal rotations, building footprints and ground picking.
//!
//! World positions live on the y = 0 plane and are quantized to multiples of
//! the grid size. Footprints are expressed as [`GridCell`]s so overlap checks
//! compare integers instead of floats.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::object::BuildingKind;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A quantized (x, z) position on the ground grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub z: i32,
}

impl GridCell {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The cell containing a world position.
    pub fn from_world(position: Vec3, grid_size: f32) -> Self {
        Self {
            x: (position.x / grid_size).round() as i32,
            z: (position.z / grid_size).round() as i32,
        }
    }

    /// Center of this cell in world space (y = 0).
    pub fn to_world(self, grid_size: f32) -> Vec3 {
        Vec3::new(self.x as f32 * grid_size, 0.0, self.z as f32 * grid_size)
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }
}

/// One of the four rotations a building can snap to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CardinalRotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl CardinalRotation {
    /// All four rotation values.
    pub fn all() -> [CardinalRotation; 4] {
        [
            CardinalRotation::Deg0,
            CardinalRotation::Deg90,
            CardinalRotation::Deg180,
            CardinalRotation::Deg270,
        ]
    }

    /// Snap a rotation in radians to a cardinal.
    ///
    /// Rotations further than `tolerance_degrees` from every cardinal resolve
    /// to [`CardinalRotation::Deg270`].
    pub fn from_radians(radians: f32, tolerance_degrees: f32) -> Self {
        let degrees = radians.to_degrees().rem_euclid(360.0);
        let near = |target: f32| (degrees - target).abs() < tolerance_degrees;

        if near(0.0) || near(360.0) {
            CardinalRotation::Deg0
        } else if near(90.0) {
            CardinalRotation::Deg90
        } else if near(180.0) {
            CardinalRotation::Deg180
        } else {
            CardinalRotation::Deg270
        }
    }

    pub fn radians(self) -> f32 {
        match self {
            CardinalRotation::Deg0 => 0.0,
            CardinalRotation::Deg90 => std::f32::consts::FRAC_PI_2,
            CardinalRotation::Deg180 => std::f32::consts::PI,
            CardinalRotation::Deg270 => 3.0 * std::f32::consts::FRAC_PI_2,
        }
    }

    /// Forward axis as a cell offset in (x, z).
    pub fn forward(self) -> (i32, i32) {
        match self {
            CardinalRotation::Deg0 => (1, 0),
            CardinalRotation::Deg90 => (0, -1),
            CardinalRotation::Deg180 => (-1, 0),
            CardinalRotation::Deg270 => (0, 1),
        }
    }

    /// Travel direction of a belt with this rotation, in (x, z).
    pub fn belt_direction(self) -> (i32, i32) {
        let (fx, fz) = self.forward();
        (-fz, fx)
    }
}

// ---------------------------------------------------------------------------
// GridGeometry
// ---------------------------------------------------------------------------

/// Converts world positions and rotations into the cells a building occupies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    grid_size: f32,
    snap_tolerance_degrees: f32,
}

impl GridGeometry {
    pub fn new(grid_size: f32, snap_tolerance_degrees: f32) -> Self {
        Self {
            grid_size,
            snap_tolerance_degrees,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.grid_size, config.snap_tolerance_degrees)
    }

    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    pub fn cardinal(&self, rotation: f32) -> CardinalRotation {
        CardinalRotation::from_radians(rotation, self.snap_tolerance_degrees)
    }

    /// Unit forward vector (x, z) for a rotation.
    pub fn forward_vector(&self, rotation: f32) -> Vec2 {
        let (fx, fz) = self.cardinal(rotation).forward();
        Vec2::new(fx as f32, fz as f32)
    }

    /// Direction a particle travels after snapping onto a belt with this rotation.
    pub fn belt_direction(&self, rotation: f32) -> Vec3 {
        let (dx, dz) = self.cardinal(rotation).belt_direction();
        Vec3::new(dx as f32, 0.0, dz as f32)
    }

    pub fn cell_of(&self, position: Vec3) -> GridCell {
        GridCell::from_world(position, self.grid_size)
    }

    /// Footprint of a building of `kind` at `position`.
    pub fn footprint(&self, kind: BuildingKind, position: Vec3, rotation: f32) -> Vec<GridCell> {
        match kind {
            BuildingKind::Extractor => self.extractor_footprint(position, rotation),
            BuildingKind::Transporter => self.transporter_footprint(position, rotation),
            BuildingKind::Processor => self.processor_footprint(position, rotation),
        }
    }

    /// A 3-cell body followed by a 5x5 intake field, 28 cells in total.
    pub fn extractor_footprint(&self, position: Vec3, rotation: f32) -> Vec<GridCell> {
        let origin = self.cell_of(position);
        let (fx, fz) = self.cardinal(rotation).forward();
        let mut cells = Vec::with_capacity(28);

        for i in 0..3 {
            cells.push(origin.offset(-i * fx, -i * fz));
        }
        for i in 3..8 {
            for j in -2..=2 {
                cells.push(origin.offset(-i * fx + j * fz, -i * fz + j * fx));
            }
        }
        cells
    }

    /// The anchor cell plus the cell directly behind it.
    pub fn processor_footprint(&self, position: Vec3, rotation: f32) -> Vec<GridCell> {
        let origin = self.cell_of(position);
        let (fx, fz) = self.cardinal(rotation).forward();
        vec![origin, origin.offset(-fx, -fz)]
    }

    pub fn transporter_footprint(&self, position: Vec3, _rotation: f32) -> Vec<GridCell> {
        vec![self.cell_of(position)]
    }

    /// World position of the cell an extractor hands its output to. Lies just
    /// outside the extractor's own footprint, beside the intake field.
    pub fn extractor_anchor(&self, position: Vec3, rotation: f32) -> Vec3 {
        let (fx, fz) = self.cardinal(rotation).forward();
        let dx = (-5 * fx - 3 * fz) as f32;
        let dz = (-5 * fz + 3 * fx) as f32;
        Vec3::new(
            position.x + dx * self.grid_size,
            0.0,
            position.z + dz * self.grid_size,
        )
    }

    /// Quantize a world point onto the grid (y forced to 0).
    pub fn snap(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            (point.x / self.grid_size).round() * self.grid_size,
            0.0,
            (point.z / self.grid_size).round() * self.grid_size,
        )
    }

    /// Where a view ray hits the ground, snapped to the grid.
    ///
    /// Returns `None` when the ray never reaches the y = 0 plane going
    /// forward (`t <= 0`, or a ray parallel to the plane).
    pub fn ground_intersection(&self, camera_pos: Vec3, looking: Vec3) -> Option<Vec3> {
        let t = -camera_pos.y / looking.y;
        if !t.is_finite() || t <= 0.0 {
            return None;
        }
        Some(self.snap(camera_pos + looking * t))
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn geometry() -> GridGeometry {
        GridGeometry::default()
    }

    // -----------------------------------------------------------------------
    // Rotation snapping
    // -----------------------------------------------------------------------

    #[test]
    fn forward_vectors_for_cardinals() {
        let g = geometry();
        assert_eq!(g.forward_vector(0.0), Vec2::new(1.0, 0.0));
        assert_eq!(g.forward_vector(FRAC_PI_2), Vec2::new(0.0, -1.0));
        assert_eq!(g.forward_vector(PI), Vec2::new(-1.0, 0.0));
        assert_eq!(g.forward_vector(3.0 * FRAC_PI_2), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn rotation_within_tolerance_snaps() {
        let g = geometry();
        assert_eq!(g.cardinal(0.5_f32.to_radians()), CardinalRotation::Deg0);
        assert_eq!(g.cardinal(359.5_f32.to_radians()), CardinalRotation::Deg0);
        assert_eq!(g.cardinal(90.9_f32.to_radians()), CardinalRotation::Deg90);
        assert_eq!(g.cardinal(-90.0_f32.to_radians()), CardinalRotation::Deg270);
        assert_eq!(g.cardinal(450.0_f32.to_radians()), CardinalRotation::Deg90);
    }

    #[test]
    fn off_cardinal_falls_back_to_270() {
        let g = geometry();
        assert_eq!(g.cardinal(45.0_f32.to_radians()), CardinalRotation::Deg270);
        assert_eq!(g.forward_vector(10.0_f32.to_radians()), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn belt_direction_is_perpendicular_to_forward() {
        let g = geometry();
        assert_eq!(g.belt_direction(0.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(g.belt_direction(FRAC_PI_2), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(g.belt_direction(PI), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(g.belt_direction(3.0 * FRAC_PI_2), Vec3::new(-1.0, 0.0, 0.0));
    }

    // -----------------------------------------------------------------------
    // Footprints
    // -----------------------------------------------------------------------

    #[test]
    fn extractor_footprint_has_28_distinct_cells() {
        let g = geometry();
        for rot in CardinalRotation::all() {
            let cells = g.extractor_footprint(Vec3::new(4.0, 0.0, -6.0), rot.radians());
            assert_eq!(cells.len(), 28);
            let unique: BTreeSet<_> = cells.iter().copied().collect();
            assert_eq!(unique.len(), 28, "duplicate cells for {rot:?}");
        }
    }

    #[test]
    fn extractor_footprint_layout_at_zero_rotation() {
        let g = geometry();
        let cells = g.extractor_footprint(Vec3::ZERO, 0.0);
        assert_eq!(
            cells[..3],
            [GridCell::new(0, 0), GridCell::new(-1, 0), GridCell::new(-2, 0)]
        );
        assert!(cells.contains(&GridCell::new(-3, -2)));
        assert!(cells.contains(&GridCell::new(-7, 2)));
        assert!(!cells.contains(&GridCell::new(-8, 0)));
        assert!(!cells.contains(&GridCell::new(-3, 3)));
    }

    #[test]
    fn anchor_sits_outside_the_extractor() {
        let g = geometry();
        for rot in CardinalRotation::all() {
            let anchor = g.extractor_anchor(Vec3::ZERO, rot.radians());
            let cells = g.extractor_footprint(Vec3::ZERO, rot.radians());
            assert!(!cells.contains(&g.cell_of(anchor)), "anchor overlaps at {rot:?}");
        }
        assert_eq!(
            g.extractor_anchor(Vec3::ZERO, 0.0),
            Vec3::new(-10.0, 0.0, 6.0)
        );
    }

    #[test]
    fn processor_footprint_is_two_cells() {
        let g = geometry();
        let cells = g.processor_footprint(Vec3::new(2.0, 0.0, 2.0), 0.0);
        assert_eq!(cells, vec![GridCell::new(1, 1), GridCell::new(0, 1)]);
        let cells = g.processor_footprint(Vec3::ZERO, FRAC_PI_2);
        assert_eq!(cells, vec![GridCell::new(0, 0), GridCell::new(0, 1)]);
    }

    #[test]
    fn transporter_footprint_is_its_cell() {
        let g = geometry();
        let cells = g.footprint(BuildingKind::Transporter, Vec3::new(-4.0, 0.0, 8.0), PI);
        assert_eq!(cells, vec![GridCell::new(-2, 4)]);
    }

    // -----------------------------------------------------------------------
    // Ground picking
    // -----------------------------------------------------------------------

    #[test]
    fn ground_intersection_snaps_to_grid() {
        let g = geometry();
        let hit = g
            .ground_intersection(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.7, -1.0, 0.3))
            .unwrap();
        // Raw hit is (3.5, 0, 1.5).
        assert_eq!(hit, Vec3::new(4.0, 0.0, 2.0));
    }

    #[test]
    fn ground_intersection_fails_looking_up() {
        let g = geometry();
        assert!(g
            .ground_intersection(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 1.0, 0.0))
            .is_none());
    }

    #[test]
    fn ground_intersection_fails_parallel_to_ground() {
        let g = geometry();
        assert!(g
            .ground_intersection(Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, 0.0, 0.0))
            .is_none());
    }

    #[test]
    fn ground_intersection_fails_below_ground_looking_down() {
        let g = geometry();
        assert!(g
            .ground_intersection(Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, -1.0, 0.0))
            .is_none());
    }

    #[test]
    fn cell_round_trip() {
        let cell = GridCell::new(-3, 7);
        assert_eq!(GridCell::from_world(cell.to_world(2.0), 2.0), cell);
    }
}
