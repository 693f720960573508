use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The eight compass directions plus a stay-in-place value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
    Center,
}

impl Direction {
    /// The eight movement directions, diagonals first. Flood fills iterate
    /// this array, so its order decides BFS discovery-order tie-breaking.
    pub const ALL: [Direction; 8] = [
        Direction::Northeast,
        Direction::Southeast,
        Direction::Southwest,
        Direction::Northwest,
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::Northeast => (1, 1),
            Direction::East => (1, 0),
            Direction::Southeast => (1, -1),
            Direction::South => (0, -1),
            Direction::Southwest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::Northwest => (-1, 1),
            Direction::Center => (0, 0),
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::Northeast => Direction::Southwest,
            Direction::East => Direction::West,
            Direction::Southeast => Direction::Northwest,
            Direction::South => Direction::North,
            Direction::Southwest => Direction::Northeast,
            Direction::West => Direction::East,
            Direction::Northwest => Direction::Southeast,
            Direction::Center => Direction::Center,
        }
    }

    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::Northeast
                | Direction::Southeast
                | Direction::Southwest
                | Direction::Northwest
        )
    }

    /// Counterpart when the map is reflected across a vertical axis (x flips).
    pub const fn mirror_horizontal(self) -> Direction {
        match self {
            Direction::North => Direction::North,
            Direction::Northeast => Direction::Northwest,
            Direction::East => Direction::West,
            Direction::Southeast => Direction::Southwest,
            Direction::South => Direction::South,
            Direction::Southwest => Direction::Southeast,
            Direction::West => Direction::East,
            Direction::Northwest => Direction::Northeast,
            Direction::Center => Direction::Center,
        }
    }

    /// Counterpart when the map is reflected across a horizontal axis (y flips).
    pub const fn mirror_vertical(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::Northeast => Direction::Southeast,
            Direction::East => Direction::East,
            Direction::Southeast => Direction::Northeast,
            Direction::South => Direction::North,
            Direction::Southwest => Direction::Northwest,
            Direction::West => Direction::West,
            Direction::Northwest => Direction::Southwest,
            Direction::Center => Direction::Center,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::Northeast => "northeast",
            Direction::East => "east",
            Direction::Southeast => "southeast",
            Direction::South => "south",
            Direction::Southwest => "southwest",
            Direction::West => "west",
            Direction::Northwest => "northwest",
            Direction::Center => "center",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "north" | "n" => Ok(Direction::North),
            "northeast" | "ne" => Ok(Direction::Northeast),
            "east" | "e" => Ok(Direction::East),
            "southeast" | "se" => Ok(Direction::Southeast),
            "south" | "s" => Ok(Direction::South),
            "southwest" | "sw" => Ok(Direction::Southwest),
            "west" | "w" => Ok(Direction::West),
            "northwest" | "nw" => Ok(Direction::Northwest),
            "center" | "c" => Ok(Direction::Center),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposites_are_involutions() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            let (dx, dy) = dir.delta();
            let (ox, oy) = dir.opposite().delta();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn mirrors_are_involutions() {
        for dir in Direction::ALL {
            assert_eq!(dir.mirror_horizontal().mirror_horizontal(), dir);
            assert_eq!(dir.mirror_vertical().mirror_vertical(), dir);
        }
    }

    #[test]
    fn horizontal_mirror_flips_x_only() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            let (mx, my) = dir.mirror_horizontal().delta();
            assert_eq!((mx, my), (-dx, dy));
        }
    }

    #[test]
    fn vertical_mirror_flips_y_only() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            let (mx, my) = dir.mirror_vertical().delta();
            assert_eq!((mx, my), (dx, -dy));
        }
    }

    #[test]
    fn diagonals_move_on_both_axes() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            assert_eq!(dir.is_diagonal(), dx != 0 && dy != 0);
        }
    }
}
