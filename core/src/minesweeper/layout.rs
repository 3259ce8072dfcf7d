use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Mine positions of a board together with the neighbor counts derived from them.
///
/// Counts are computed once, when the layout is built, and never change afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    neighbor_counts: Array2<u8>,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Result<Self> {
        let (rows, cols) = mine_mask.dim();
        if rows == 0 || cols == 0 || rows > Coord::MAX.into() || cols > Coord::MAX.into() {
            return Err(GameError::InvalidConfig("board size out of range"));
        }

        let mine_count = mine_mask.iter().filter(|&&is_mine| is_mine).count() as CellCount;
        let mut neighbor_counts = Array2::zeros(mine_mask.dim());
        for ((row, col), count) in neighbor_counts.indexed_iter_mut() {
            // bounded by the size check above
            let coords = (row as Coord, col as Coord);
            *count = mine_mask
                .iter_neighbors(coords)
                .filter(|pos| mine_mask[pos.to_nd_index()])
                .count() as u8;
        }

        Ok(Self {
            mine_mask,
            neighbor_counts,
            mine_count,
        })
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Self::from_mine_mask(mine_mask)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.mine_mask.dim();
        (rows as Coord, cols as Coord)
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.size().0, self.size().1)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn neighbor_mines(&self, coords: Coord2) -> u8 {
        self.neighbor_counts[coords.to_nd_index()]
    }

    pub fn mine_coords(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.mine_mask
            .indexed_iter()
            .filter(|&(_, &is_mine)| is_mine)
            .map(|((row, col), _)| (row as Coord, col as Coord))
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.mine_mask.iter_neighbors(coords)
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_match_brute_force() {
        let mines = [(0, 0), (0, 2), (1, 1), (3, 3), (2, 4)];
        let layout = MineLayout::from_mine_coords((4, 5), &mines).unwrap();

        for row in 0..4u8 {
            for col in 0..5u8 {
                let expected = mines
                    .iter()
                    .filter(|&&mine| mine != (row, col) && is_within_one(mine, (row, col)))
                    .count() as u8;
                assert_eq!(layout.neighbor_mines((row, col)), expected, "at {:?}", (row, col));
            }
        }
        assert_eq!(layout.mine_count(), 5);
        assert_eq!(layout.safe_cell_count(), 15);
    }

    #[test]
    fn rejects_out_of_range_mines() {
        assert_eq!(
            MineLayout::from_mine_coords((2, 2), &[(2, 0)]),
            Err(GameError::InvalidCoords)
        );
    }

    #[test]
    fn rejects_empty_board() {
        assert!(MineLayout::from_mine_mask(Array2::default([0, 3])).is_err());
    }
}
