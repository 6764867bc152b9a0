use std::fmt;

use serde::{Deserialize, Serialize};

/// Map width in cells.
pub const GXM: i32 = 80;
/// Map height in cells.
pub const GYM: i32 = 70;

/// A map cell coordinate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(self) -> bool {
        (0..GXM).contains(&self.x) && (0..GYM).contains(&self.y)
    }

    /// Row-major position in a `GXM * GYM` buffer, if the coordinate is on the map.
    pub fn index(self) -> Option<usize> {
        self.in_bounds()
            .then(|| (self.y * GXM + self.x) as usize)
    }

    pub fn from_index(index: usize) -> Self {
        let index = index as i32;
        Self::new(index % GXM, index / GXM)
    }

    /// Chebyshev adjacency; a cell is not adjacent to itself.
    pub fn adjacent(self, other: Coord) -> bool {
        self != other && (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }

    /// The in-bounds cells around this one (8-connectivity).
    pub fn neighbours(self) -> impl Iterator<Item = Coord> {
        (-1..=1)
            .flat_map(move |dy| (-1..=1).map(move |dx| Coord::new(self.x + dx, self.y + dy)))
            .filter(move |c| *c != self && c.in_bounds())
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_and_index() {
        assert!(Coord::new(0, 0).in_bounds());
        assert!(Coord::new(GXM - 1, GYM - 1).in_bounds());
        assert!(!Coord::new(GXM, 0).in_bounds());
        assert!(!Coord::new(-1, 3).in_bounds());

        let c = Coord::new(5, 7);
        let index = c.index().unwrap();
        assert_eq!(Coord::from_index(index), c);
        assert_eq!(Coord::new(-1, 0).index(), None);
    }

    #[test]
    fn test_neighbours() {
        assert_eq!(Coord::new(5, 5).neighbours().count(), 8);
        assert_eq!(Coord::new(0, 0).neighbours().count(), 3);
        assert!(Coord::new(5, 5).neighbours().all(|n| n.adjacent(Coord::new(5, 5))));
        assert!(!Coord::new(5, 5).adjacent(Coord::new(5, 5)));
        assert!(!Coord::new(5, 5).adjacent(Coord::new(7, 5)));
    }
}
