//! The battle grid: a fixed 16 × 30 board of terrain cells.
//!
//! The grid is built once per match and never mutated afterwards. Terrain
//! only constrains deployment; movement walks straight through it.

use serde::{Deserialize, Serialize};

use crate::factions::Faction;
use crate::installations::{self, InstallationId, SECONDARY_COLUMNS};
use crate::math::GridPos;

/// Standard board width in cells.
pub const GRID_WIDTH: i32 = 16;
/// Standard board height in cells.
pub const GRID_HEIGHT: i32 = 30;

/// Terrain kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// Plain ground.
    #[default]
    Open,
    /// Fortification. Units cannot deploy here.
    Wall,
    /// Light debris.
    Rubble,
    /// Heavy field obstacle.
    Barricade,
    /// Lane that vehicles follow toward enemy outposts.
    VehicleLane,
}

impl Terrain {
    /// Whether units may be deployed onto this terrain.
    #[must_use]
    pub const fn is_deployable(self) -> bool {
        !matches!(self, Self::Wall)
    }
}

/// One board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Terrain kind.
    pub terrain: Terrain,
    /// Installation anchored on this cell, if any.
    pub installation: Option<InstallationId>,
}

/// Rectangular board of cells stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a grid of open cells.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is not positive.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0, "Grid width must be positive");
        assert!(height > 0, "Grid height must be positive");

        let cell_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![Cell::default(); cell_count],
        }
    }

    /// The standard battlefield.
    ///
    /// Both halves mirror each other across the centre line: installations
    /// near the back rows, vehicle lanes down the outpost columns, a broken
    /// wall line on rows 14 and 15, and scattered obstacles.
    #[must_use]
    pub fn standard() -> Self {
        let mut grid = Self::new(GRID_WIDTH, GRID_HEIGHT);
        let mirror = |y: i32| GRID_HEIGHT - 1 - y;

        for x in SECONDARY_COLUMNS {
            for y in 4..=mirror(4) {
                grid.set_terrain(GridPos::new(x, y), Terrain::VehicleLane);
            }
        }

        for x in [0, 1, 5, 6, 10, 14, 15] {
            for y in [14, 15] {
                grid.set_terrain(GridPos::new(x, y), Terrain::Wall);
            }
        }

        for (x, y, terrain) in [
            (4, 10, Terrain::Rubble),
            (11, 10, Terrain::Rubble),
            (6, 8, Terrain::Barricade),
            (9, 8, Terrain::Barricade),
        ] {
            grid.set_terrain(GridPos::new(x, y), terrain);
            grid.set_terrain(GridPos::new(x, mirror(y)), terrain);
        }

        for id in installations::standard_ids() {
            grid.place_installation(installations::standard_anchor(id, GRID_HEIGHT), id);
        }

        grid
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn index(&self, pos: GridPos) -> usize {
        (pos.y as usize) * (self.width as usize) + (pos.x as usize)
    }

    /// Check if a position lies on the board.
    #[must_use]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Get the cell at `pos`, or `None` if out of bounds.
    #[must_use]
    pub fn cell(&self, pos: GridPos) -> Option<&Cell> {
        if self.in_bounds(pos) {
            Some(&self.cells[self.index(pos)])
        } else {
            None
        }
    }

    /// Terrain at `pos`, or `None` if out of bounds.
    #[must_use]
    pub fn terrain(&self, pos: GridPos) -> Option<Terrain> {
        self.cell(pos).map(|c| c.terrain)
    }

    /// Installation anchored at `pos`.
    #[must_use]
    pub fn installation_at(&self, pos: GridPos) -> Option<InstallationId> {
        self.cell(pos).and_then(|c| c.installation)
    }

    /// Set terrain at `pos`. Returns `false` if out of bounds.
    pub fn set_terrain(&mut self, pos: GridPos, terrain: Terrain) -> bool {
        if self.in_bounds(pos) {
            let index = self.index(pos);
            self.cells[index].terrain = terrain;
            true
        } else {
            false
        }
    }

    /// Anchor an installation at `pos`. Returns `false` if out of bounds.
    pub fn place_installation(&mut self, pos: GridPos, id: InstallationId) -> bool {
        if self.in_bounds(pos) {
            let index = self.index(pos);
            self.cells[index].installation = Some(id);
            true
        } else {
            false
        }
    }

    /// Whether a unit may be deployed at `pos`: on the board, not a wall,
    /// and not an installation cell.
    #[must_use]
    pub fn is_deployable(&self, pos: GridPos) -> bool {
        self.cell(pos)
            .is_some_and(|c| c.terrain.is_deployable() && c.installation.is_none())
    }

    /// Clamp a position onto the board.
    #[must_use]
    pub fn clamp(&self, pos: GridPos) -> GridPos {
        GridPos::new(pos.x.clamp(0, self.width - 1), pos.y.clamp(0, self.height - 1))
    }

    /// Rows `faction` may deploy into: its own half, excluding the two
    /// centre rows.
    #[must_use]
    pub fn deployment_rows(&self, faction: Faction) -> std::ops::RangeInclusive<i32> {
        let half = self.height / 2;
        match faction {
            Faction::North => 0..=half - 2,
            Faction::South => half + 1..=self.height - 1,
        }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installations::InstallationTier;

    #[test]
    fn test_grid_bounds() {
        let grid = Grid::new(16, 30);
        assert!(grid.in_bounds(GridPos::new(0, 0)));
        assert!(grid.in_bounds(GridPos::new(15, 29)));
        assert!(!grid.in_bounds(GridPos::new(16, 0)));
        assert!(!grid.in_bounds(GridPos::new(0, -1)));
        assert!(grid.cell(GridPos::new(-1, 5)).is_none());
    }

    #[test]
    fn test_set_terrain_out_of_bounds() {
        let mut grid = Grid::new(4, 4);
        assert!(grid.set_terrain(GridPos::new(1, 1), Terrain::Wall));
        assert!(!grid.set_terrain(GridPos::new(4, 1), Terrain::Wall));
        assert_eq!(grid.terrain(GridPos::new(1, 1)), Some(Terrain::Wall));
    }

    #[test]
    fn test_standard_board_installations() {
        let grid = Grid::standard();
        assert_eq!(grid.width(), GRID_WIDTH);
        assert_eq!(grid.height(), GRID_HEIGHT);

        let id = grid.installation_at(GridPos::new(7, 1)).unwrap();
        assert_eq!(id.faction, Faction::North);
        assert_eq!(id.tier, InstallationTier::Primary);

        let id = grid.installation_at(GridPos::new(8, 26)).unwrap();
        assert_eq!(id, InstallationId::secondary(Faction::South, 2));
        assert!(!grid.is_deployable(GridPos::new(8, 26)));
    }

    #[test]
    fn test_standard_board_is_mirrored() {
        let grid = Grid::standard();
        for y in 0..GRID_HEIGHT {
            for x in 0..GRID_WIDTH {
                let a = grid.terrain(GridPos::new(x, y));
                let b = grid.terrain(GridPos::new(x, GRID_HEIGHT - 1 - y));
                assert_eq!(a, b, "terrain differs at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_deployment_rows() {
        let grid = Grid::standard();
        assert_eq!(grid.deployment_rows(Faction::North), 0..=13);
        assert_eq!(grid.deployment_rows(Faction::South), 16..=29);
        assert!(!grid.is_deployable(GridPos::new(0, 14)));
        assert!(grid.is_deployable(GridPos::new(3, 14)));
    }

    #[test]
    fn test_clamp() {
        let grid = Grid::standard();
        assert_eq!(grid.clamp(GridPos::new(-3, 40)), GridPos::new(0, 29));
        assert_eq!(grid.clamp(GridPos::new(5, 5)), GridPos::new(5, 5));
    }
}
