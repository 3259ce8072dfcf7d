use ndarray::Array2;
use rand::prelude::*;
use rand::rngs::SmallRng;

use super::{Difficulty, MineLayout};
use crate::*;

pub trait MineGenerator {
    fn generate(self, difficulty: Difficulty) -> Result<MineLayout>;
}

/// Random placement that keeps the first revealed cell and its neighbors clear, so the opening
/// move always uncovers a zero.
///
/// Positions are sampled uniformly and resampled whenever they land on a mine or inside the
/// protected block.
#[derive(Clone, Debug, PartialEq)]
pub struct SafeOpeningGenerator {
    seed: u64,
    start: Coord2,
}

impl SafeOpeningGenerator {
    pub fn new(seed: u64, start: Coord2) -> Self {
        Self { seed, start }
    }
}

impl MineGenerator for SafeOpeningGenerator {
    fn generate(self, difficulty: Difficulty) -> Result<MineLayout> {
        let (rows, cols) = difficulty.size();
        if self.start.0 >= rows || self.start.1 >= cols {
            return Err(GameError::InvalidCoords);
        }

        let protected = 1 + NeighborIter::new(self.start, (rows, cols)).count() as CellCount;
        let free_cells = difficulty.total_cells().saturating_sub(protected);
        if difficulty.mines > free_cells {
            log::warn!(
                "Cannot keep the opening clear, requested {} mines but only {} cells are free",
                difficulty.mines,
                free_cells
            );
            return Err(GameError::TooManyMines);
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut mine_mask: Array2<bool> = Array2::default(difficulty.size().to_nd_index());
        let mut placed: CellCount = 0;
        let mut samples: u32 = 0;

        while placed < difficulty.mines {
            let coords = (rng.random_range(0..rows), rng.random_range(0..cols));
            samples += 1;
            if mine_mask[coords.to_nd_index()] || is_within_one(coords, self.start) {
                continue;
            }
            mine_mask[coords.to_nd_index()] = true;
            placed += 1;
        }

        log::debug!(
            "Placed {} mines around opening {:?} after {} samples",
            placed,
            self.start,
            samples
        );
        MineLayout::from_mine_mask(mine_mask)
    }
}
