use std::collections::VecDeque;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{Difficulty, MineLayout};
use crate::*;

/// Player-visible state of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Hidden,
    Flagged,
    Revealed(u8),
    /// A mine shown after the game was lost.
    Mine,
    /// The mine that ended the game.
    Exploded,
    /// A flag that turned out to be on a safe cell.
    WrongFlag,
}

impl CellState {
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::Hidden
    }
}

/// Flattened view of a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    /// Only meaningful once mines are placed.
    pub neighbor_mines: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardState {
    Ready,
    Active,
    Won,
    Lost,
}

impl BoardState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::Ready
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

/// A minesweeper board from the first click to the end of the game.
///
/// Mines are not known until [`Board::place_mines`] is called, which normally happens right
/// before the first reveal so the opening can be kept clear.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    difficulty: Difficulty,
    layout: Option<MineLayout>,
    cells: Array2<CellState>,
    revealed_count: CellCount,
    flagged_count: CellCount,
    state: BoardState,
    triggered_mine: Option<Coord2>,
}

impl Board {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            layout: None,
            cells: Array2::default(difficulty.size().to_nd_index()),
            revealed_count: 0,
            flagged_count: 0,
            state: Default::default(),
            triggered_mine: None,
        }
    }

    pub fn with_layout(layout: MineLayout) -> Self {
        let (rows, cols) = layout.size();
        let mut board = Self::new(Difficulty {
            rows,
            cols,
            mines: layout.mine_count(),
        });
        board.layout = Some(layout);
        board
    }

    pub fn place_mines(&mut self, layout: MineLayout) -> Result<()> {
        if self.layout.is_some() {
            return Err(GameError::InvalidConfig("mines already placed"));
        }
        if layout.size() != self.size() {
            return Err(GameError::InvalidConfig("layout does not match the board"));
        }
        self.layout = Some(layout);
        Ok(())
    }

    pub fn has_mines(&self) -> bool {
        self.layout.is_some()
    }

    pub fn layout(&self) -> Option<&MineLayout> {
        self.layout.as_ref()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn size(&self) -> Coord2 {
        self.difficulty.size()
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn mines_left(&self) -> isize {
        (self.difficulty.mines as isize) - (self.flagged_count as isize)
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn cell_state(&self, coords: Coord2) -> CellState {
        self.cells[coords.to_nd_index()]
    }

    pub fn cell(&self, coords: Coord2) -> Cell {
        let state = self.cell_state(coords);
        let (is_mine, neighbor_mines) = match &self.layout {
            Some(layout) => (layout.contains_mine(coords), layout.neighbor_mines(coords)),
            None => (false, 0),
        };
        Cell {
            is_mine,
            is_revealed: !state.is_unrevealed(),
            is_flagged: matches!(state, CellState::Flagged),
            neighbor_mines,
        }
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        use CellState::*;
        use MarkOutcome::*;

        let coords = self.validate_coords(coords)?;
        self.check_not_finished()?;

        Ok(match self.cells[coords.to_nd_index()] {
            Hidden => {
                self.cells[coords.to_nd_index()] = Flagged;
                self.flagged_count += 1;
                Changed
            }
            Flagged => {
                self.cells[coords.to_nd_index()] = Hidden;
                self.flagged_count -= 1;
                Changed
            }
            _ => NoChange,
        })
    }

    /// Reveals a hidden cell, flood-revealing around zeros. Flagged and revealed cells are left
    /// untouched.
    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;
        self.check_not_finished()?;

        if !matches!(self.cells[coords.to_nd_index()], CellState::Hidden) {
            return Ok(RevealOutcome::NoChange);
        }
        let Some(layout) = self.layout.take() else {
            return Err(GameError::InvalidConfig("mines have not been placed"));
        };
        let outcome = self.reveal_hidden_cell(&layout, coords);
        self.layout = Some(layout);
        Ok(outcome)
    }

    fn reveal_hidden_cell(&mut self, layout: &MineLayout, coords: Coord2) -> RevealOutcome {
        if layout.contains_mine(coords) {
            self.triggered_mine = Some(coords);
            self.end_game(layout, false);
            return RevealOutcome::HitMine;
        }

        self.open(layout, coords);
        let mut opened: CellCount = 1;

        // every queued cell is already revealed, so no cell is queued twice
        let mut to_visit = VecDeque::from([coords]);
        while let Some(visit_coords) = to_visit.pop_front() {
            if layout.neighbor_mines(visit_coords) != 0 {
                continue;
            }
            for neighbor in layout.iter_neighbors(visit_coords) {
                if matches!(self.cells[neighbor.to_nd_index()], CellState::Hidden) {
                    self.open(layout, neighbor);
                    opened += 1;
                    to_visit.push_back(neighbor);
                }
            }
        }
        log::trace!("Reveal at {:?} opened {} cells", coords, opened);

        if self.revealed_count == layout.safe_cell_count() {
            self.end_game(layout, true);
            RevealOutcome::Won
        } else {
            if matches!(self.state, BoardState::Ready) {
                self.state = BoardState::Active;
            }
            RevealOutcome::Revealed
        }
    }

    fn open(&mut self, layout: &MineLayout, coords: Coord2) {
        self.cells[coords.to_nd_index()] = CellState::Revealed(layout.neighbor_mines(coords));
        self.revealed_count += 1;
    }

    /// Marks the end state and uncovers the mines: flags them all on a win, shows them on a loss.
    fn end_game(&mut self, layout: &MineLayout, won: bool) {
        if self.state.is_finished() {
            return;
        }
        self.state = if won { BoardState::Won } else { BoardState::Lost };
        log::debug!("Board finished: {:?}", self.state);

        for (index, cell) in self.cells.indexed_iter_mut() {
            let coords = (index.0 as Coord, index.1 as Coord);
            let is_mine = layout.contains_mine(coords);
            *cell = match (*cell, is_mine, won) {
                (CellState::Hidden, true, true) => {
                    self.flagged_count += 1;
                    CellState::Flagged
                }
                (CellState::Hidden, true, false) if self.triggered_mine == Some(coords) => {
                    CellState::Exploded
                }
                (CellState::Hidden, true, false) => CellState::Mine,
                (CellState::Flagged, false, false) => CellState::WrongFlag,
                (cell, _, _) => cell,
            };
        }
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.state.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(size: Coord2, mines: &[Coord2]) -> Board {
        Board::with_layout(MineLayout::from_mine_coords(size, mines).unwrap())
    }

    fn count_revealed(board: &Board) -> CellCount {
        board
            .cells
            .iter()
            .filter(|cell| matches!(cell, CellState::Revealed(_)))
            .count() as CellCount
    }

    #[test]
    fn reveal_hits_mine_and_sets_triggered_cell() {
        let mut board = board((2, 2), &[(0, 0)]);

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(board.state(), BoardState::Lost);
        assert_eq!(board.triggered_mine(), Some((0, 0)));
        assert_eq!(board.cell_state((0, 0)), CellState::Exploded);
    }

    #[test]
    fn reveal_flood_fill_opens_zero_region() {
        let mut board = board((3, 3), &[(2, 2)]);

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(board.cell_state((0, 0)), CellState::Revealed(0));
        assert_eq!(board.cell_state((1, 1)), CellState::Revealed(1));
        assert_eq!(board.cell_state((2, 2)), CellState::Flagged);
    }

    #[test]
    fn flood_fill_on_mine_free_board_terminates_and_counts_each_cell_once() {
        let mut board = Board::with_layout(
            MineLayout::from_mine_mask(Array2::default([40, 40])).unwrap(),
        );

        assert_eq!(board.reveal((20, 20)).unwrap(), RevealOutcome::Won);
        assert_eq!(board.revealed_count(), 1600);
        assert_eq!(count_revealed(&board), 1600);
    }

    #[test]
    fn flood_fill_stops_at_flags() {
        let mut board = board((1, 5), &[(0, 4)]);
        board.toggle_flag((0, 2)).unwrap();

        assert_eq!(board.reveal((0, 0)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(board.cell_state((0, 1)), CellState::Revealed(0));
        assert_eq!(board.cell_state((0, 2)), CellState::Flagged);
        assert_eq!(board.cell_state((0, 3)), CellState::Hidden);
        assert_eq!(board.revealed_count(), count_revealed(&board));
    }

    #[test]
    fn flagged_cells_cannot_be_revealed() {
        let mut board = board((2, 2), &[(0, 0)]);
        assert_eq!(board.toggle_flag((0, 0)).unwrap(), MarkOutcome::Changed);

        assert_eq!(board.reveal((0, 0)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(board.state(), BoardState::Ready);
        assert_eq!(board.mines_left(), 0);
    }

    #[test]
    fn revealed_cells_cannot_be_flagged() {
        let mut board = board((2, 2), &[(0, 0)]);
        board.reveal((1, 1)).unwrap();

        assert_eq!(board.toggle_flag((1, 1)).unwrap(), MarkOutcome::NoChange);
        assert!(!board.cell((1, 1)).is_flagged);
        assert!(board.cell((1, 1)).is_revealed);
    }

    #[test]
    fn moves_after_the_end_are_rejected() {
        let mut board = board((2, 1), &[(0, 0)]);
        assert_eq!(board.reveal((1, 0)).unwrap(), RevealOutcome::Won);

        assert_eq!(board.reveal((0, 0)), Err(GameError::AlreadyEnded));
        assert_eq!(board.toggle_flag((0, 0)), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn out_of_range_is_an_error() {
        let mut board = board((2, 2), &[(0, 0)]);
        assert_eq!(board.reveal((2, 0)), Err(GameError::InvalidCoords));
        assert_eq!(board.toggle_flag((0, 9)), Err(GameError::InvalidCoords));
    }

    #[test]
    fn loss_shows_mines_and_wrong_flags() {
        let mut board = board((2, 2), &[(0, 0), (1, 1)]);
        board.toggle_flag((0, 1)).unwrap();

        assert_eq!(board.reveal((1, 1)).unwrap(), RevealOutcome::HitMine);
        assert_eq!(board.cell_state((1, 1)), CellState::Exploded);
        assert_eq!(board.cell_state((0, 0)), CellState::Mine);
        assert_eq!(board.cell_state((0, 1)), CellState::WrongFlag);
    }

    #[test]
    fn reveal_before_placement_is_an_error() {
        let mut board = Board::new(Difficulty::EASY);
        assert!(board.reveal((0, 0)).is_err());
        assert!(!board.has_mines());
    }
}
