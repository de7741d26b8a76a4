use serde::{Deserialize, Serialize};

use super::GridPosition;

/// Battlefield terrain. One value per cell, fixed for the whole scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Open ground - no cover, easy movement
    Plain,
    /// Woods - some cover, slows movement
    Forest,
    /// High ground - heavy cover, very slow
    Mountain,
    /// Impassable for every unit
    Water,
}

impl Terrain {
    pub fn name(&self) -> &'static str {
        match self {
            Terrain::Plain => "Plain",
            Terrain::Forest => "Forest",
            Terrain::Mountain => "Mountain",
            Terrain::Water => "Water",
        }
    }

    /// Fraction of incoming damage absorbed by a unit standing here.
    pub fn defense_reduction(&self) -> f64 {
        match self {
            Terrain::Plain => 0.0,
            Terrain::Forest => 0.2,
            Terrain::Mountain => 0.4,
            Terrain::Water => 0.0,
        }
    }

    /// Movement points spent entering this cell. `None` means impassable.
    pub fn movement_cost(&self) -> Option<u32> {
        match self {
            Terrain::Plain => Some(1),
            Terrain::Forest => Some(2),
            Terrain::Mountain => Some(3),
            Terrain::Water => None,
        }
    }

    pub fn is_passable(&self) -> bool {
        self.movement_cost().is_some()
    }

    pub fn symbol(&self) -> char {
        match self {
            Terrain::Plain => '.',
            Terrain::Forest => 'F',
            Terrain::Mountain => 'M',
            Terrain::Water => '~',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Terrain> {
        match symbol {
            '.' => Some(Terrain::Plain),
            'F' => Some(Terrain::Forest),
            'M' => Some(Terrain::Mountain),
            '~' => Some(Terrain::Water),
            _ => None,
        }
    }
}

/// The terrain grid, row-major (`tiles[y][x]`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameMap {
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<Vec<Terrain>>,
}

impl GameMap {
    /// Create a map filled with plains
    pub fn new(width: u32, height: u32) -> Self {
        let tiles = vec![vec![Terrain::Plain; width as usize]; height as usize];
        Self { width, height, tiles }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Terrain> {
        if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
            Some(self.tiles[y as usize][x as usize])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: i32, y: i32, terrain: Terrain) {
        if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
            self.tiles[y as usize][x as usize] = terrain;
        }
    }

    pub fn terrain_at(&self, pos: GridPosition) -> Option<Terrain> {
        self.get(pos.x, pos.y)
    }

    pub fn contains(&self, pos: GridPosition) -> bool {
        self.terrain_at(pos).is_some()
    }

    /// Render the grid as symbol rows (inverse of the scenario terrain format)
    pub fn to_rows(&self) -> Vec<String> {
        self.tiles
            .iter()
            .map(|row| row.iter().map(Terrain::symbol).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_tables() {
        assert_eq!(Terrain::Plain.defense_reduction(), 0.0);
        assert_eq!(Terrain::Forest.defense_reduction(), 0.2);
        assert_eq!(Terrain::Mountain.defense_reduction(), 0.4);
        assert_eq!(Terrain::Water.defense_reduction(), 0.0);

        assert_eq!(Terrain::Plain.movement_cost(), Some(1));
        assert_eq!(Terrain::Forest.movement_cost(), Some(2));
        assert_eq!(Terrain::Mountain.movement_cost(), Some(3));
        assert!(!Terrain::Water.is_passable());
    }

    #[test]
    fn test_symbols_round_trip_for_every_terrain() {
        for terrain in [Terrain::Plain, Terrain::Forest, Terrain::Mountain, Terrain::Water] {
            assert_eq!(Terrain::from_symbol(terrain.symbol()), Some(terrain));
        }
        assert_eq!(Terrain::from_symbol('x'), None);
    }

    #[test]
    fn test_get_is_none_off_grid() {
        let mut map = GameMap::new(3, 2);
        map.set(2, 1, Terrain::Forest);

        assert_eq!(map.get(2, 1), Some(Terrain::Forest));
        assert_eq!(map.get(0, 0), Some(Terrain::Plain));
        assert_eq!(map.get(3, 0), None);
        assert_eq!(map.get(0, 2), None);
        assert_eq!(map.get(-1, 0), None);
        assert_eq!(map.to_rows(), vec!["...".to_string(), "..F".to_string()]);
    }
}
