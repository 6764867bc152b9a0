//! Per-cell references into the arenas. Pure storage: nothing here checks
//! that the references agree with the entities they point at.

use crate::coord::{Coord, GXM, GYM};
use crate::entity::{ItemId, MonsterId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapCell {
    pub item_head: Option<ItemId>,
    pub monster: Option<MonsterId>,
}

pub struct LocationIndex {
    cells: Vec<MapCell>,
}

impl LocationIndex {
    pub fn new() -> Self {
        Self {
            cells: vec![MapCell::default(); (GXM * GYM) as usize],
        }
    }

    pub fn item_stack_head(&self, cell: Coord) -> Option<ItemId> {
        self.cell(cell).item_head
    }

    pub fn set_item_stack_head(&mut self, cell: Coord, head: Option<ItemId>) {
        self.cell_mut(cell).item_head = head;
    }

    pub fn monster_at(&self, cell: Coord) -> Option<MonsterId> {
        self.cell(cell).monster
    }

    pub fn set_monster_at(&mut self, cell: Coord, monster: Option<MonsterId>) {
        self.cell_mut(cell).monster = monster;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, &MapCell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(index, cell)| (Coord::from_index(index), cell))
    }

    pub fn clear(&mut self) {
        self.cells.fill(MapCell::default());
    }

    fn cell(&self, cell: Coord) -> &MapCell {
        let index = cell
            .index()
            .unwrap_or_else(|| panic!("cell {cell} is outside the map"));
        &self.cells[index]
    }

    fn cell_mut(&mut self, cell: Coord) -> &mut MapCell {
        let index = cell
            .index()
            .unwrap_or_else(|| panic!("cell {cell} is outside the map"));
        &mut self.cells[index]
    }
}

impl Default for LocationIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Handle;

    #[test]
    fn test_cells_start_empty() {
        let grid = LocationIndex::new();
        assert_eq!(grid.iter().count(), (GXM * GYM) as usize);
        assert!(grid
            .iter()
            .all(|(_, cell)| cell.item_head.is_none() && cell.monster.is_none()));
    }

    #[test]
    fn test_set_and_clear() {
        let mut grid = LocationIndex::new();
        let c = Coord::new(3, 4);
        grid.set_item_stack_head(c, Some(Handle::from_raw(1, 0)));
        grid.set_monster_at(c, Some(Handle::from_raw(2, 0)));
        assert_eq!(grid.item_stack_head(c), Some(Handle::from_raw(1, 0)));
        assert_eq!(grid.monster_at(c), Some(Handle::from_raw(2, 0)));
        assert_eq!(grid.monster_at(Coord::new(4, 3)), None);

        grid.clear();
        assert_eq!(grid.item_stack_head(c), None);
        assert_eq!(grid.monster_at(c), None);
    }

    #[test]
    #[should_panic(expected = "outside the map")]
    fn test_off_map_access_panics() {
        LocationIndex::new().monster_at(Coord::new(GXM, 0));
    }
}
