//! Classic minesweeper with a guaranteed safe opening and a seconds clock.

use core::convert::Infallible;
use core::time::Duration;
use rand::prelude::*;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

pub use engine::*;
pub use generator::*;
pub use layout::*;

use crate::*;

mod engine;
mod generator;
mod layout;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difficulty {
    pub rows: Coord,
    pub cols: Coord,
    pub mines: CellCount,
}

impl Difficulty {
    pub const EASY: Self = Self {
        rows: 9,
        cols: 9,
        mines: 10,
    };

    pub const MEDIUM: Self = Self {
        rows: 16,
        cols: 16,
        mines: 40,
    };

    pub const HARD: Self = Self {
        rows: 16,
        cols: 30,
        mines: 99,
    };

    pub fn new(rows: Coord, cols: Coord, mines: CellCount) -> Result<Self> {
        let difficulty = Self { rows, cols, mines };
        difficulty.validate()?;
        Ok(difficulty)
    }

    /// Checks that mines fit on the board whatever the opening cell is.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GameError::InvalidConfig("board needs at least one row and column"));
        }
        if self.mines == 0 {
            return Err(GameError::InvalidConfig("board needs at least one mine"));
        }
        if self.mines.saturating_add(9) > self.total_cells() {
            return Err(GameError::TooManyMines);
        }
        Ok(())
    }

    pub const fn size(&self) -> Coord2 {
        (self.rows, self.cols)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.rows, self.cols)
    }

    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells().saturating_sub(self.mines)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::EASY
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinesMove {
    Reveal(Coord2),
    ToggleFlag(Coord2),
}

#[derive(Clone, Debug)]
pub struct Minesweeper {
    board: Board,
    rng: SmallRng,
    elapsed_secs: u32,
    signals: Vec<Signal<Infallible>>,
}

impl Minesweeper {
    pub const CLOCK_PERIOD: Duration = Duration::from_secs(1);

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn difficulty(&self) -> Difficulty {
        self.board.difficulty()
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn mines_left(&self) -> isize {
        self.board.mines_left()
    }

    /// Best times are kept per board shape.
    pub fn score_key_for(difficulty: Difficulty) -> String {
        let Difficulty { rows, cols, mines } = difficulty;
        format!("{}:{}x{}x{}", keys::best_score(Self::KIND), rows, cols, mines)
    }

    fn reveal(&mut self, coords: Coord2) -> Result<MoveResult> {
        let coords = self.board.validate_coords(coords)?;
        if self.board.cell_state(coords) != CellState::Hidden {
            return Ok(MoveResult::NO_CHANGE);
        }
        if !self.board.has_mines() {
            let layout =
                SafeOpeningGenerator::new(self.rng.random(), coords).generate(self.difficulty())?;
            self.board.place_mines(layout)?;
        }

        Ok(match self.board.reveal(coords)? {
            RevealOutcome::NoChange => MoveResult::NO_CHANGE,
            RevealOutcome::Revealed => MoveResult::CHANGED,
            RevealOutcome::HitMine => {
                self.signals.push(Signal::Cue(Cue::Lose));
                MoveResult::finished(Outcome::Loss)
            }
            RevealOutcome::Won => MoveResult::finished(Outcome::Win),
        })
    }

    fn toggle_flag(&mut self, coords: Coord2) -> Result<MoveResult> {
        let outcome = self.board.toggle_flag(coords)?;
        Ok(MoveResult::changed_if(outcome == MarkOutcome::Changed))
    }
}

impl Game for Minesweeper {
    type Config = Difficulty;
    type Move = MinesMove;
    type Effect = Infallible;

    const KIND: GameKind = GameKind::Minesweeper;

    fn new(difficulty: Difficulty, seed: u64) -> Result<Self> {
        difficulty.validate()?;
        Ok(Self {
            board: Board::new(difficulty),
            rng: SmallRng::seed_from_u64(seed),
            elapsed_secs: 0,
            signals: Vec::new(),
        })
    }

    fn tick_period(&self) -> Option<Duration> {
        Some(Self::CLOCK_PERIOD)
    }

    fn map_input(&self, input: RawInput) -> Option<MinesMove> {
        let (at, intent) = input.cell_target()?;
        let (rows, cols) = self.board.size();
        if at.0 >= rows || at.1 >= cols {
            return None;
        }
        Some(match intent {
            CellIntent::Primary => MinesMove::Reveal(at),
            CellIntent::Secondary => MinesMove::ToggleFlag(at),
        })
    }

    fn apply_move(&mut self, mv: MinesMove) -> MoveResult {
        let result = match mv {
            MinesMove::Reveal(coords) => self.reveal(coords),
            MinesMove::ToggleFlag(coords) => self.toggle_flag(coords),
        };
        result.unwrap_or_else(|err| {
            log::debug!("Ignoring {:?}: {}", mv, err);
            MoveResult::NO_CHANGE
        })
    }

    /// Advances the clock while a game is in progress.
    fn tick(&mut self) -> MoveResult {
        if self.board.state() == BoardState::Active {
            self.elapsed_secs = self.elapsed_secs.saturating_add(1);
            MoveResult::CHANGED
        } else {
            MoveResult::NO_CHANGE
        }
    }

    fn resolve(&mut self, effect: Infallible) -> MoveResult {
        match effect {}
    }

    fn outcome(&self) -> Option<Outcome> {
        match self.board.state() {
            BoardState::Won => Some(Outcome::Win),
            BoardState::Lost => Some(Outcome::Loss),
            BoardState::Ready | BoardState::Active => None,
        }
    }

    fn take_signals(&mut self) -> Vec<Signal<Infallible>> {
        core::mem::take(&mut self.signals)
    }

    fn score(&self) -> Option<Score> {
        (self.board.state() == BoardState::Won).then_some(Score::Seconds(self.elapsed_secs))
    }

    fn score_key(&self) -> String {
        Self::score_key_for(self.difficulty())
    }

    fn restart(&mut self) {
        self.board = Board::new(self.difficulty());
        self.elapsed_secs = 0;
        self.signals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn safe_cells(game: &Minesweeper) -> Vec<Coord2> {
        let layout = game.board().layout().unwrap();
        let (rows, cols) = layout.size();
        (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .filter(|&coords| !layout.contains_mine(coords))
            .collect()
    }

    fn with_mines(mines: &[Coord2]) -> Minesweeper {
        let mut game = Minesweeper::new(Difficulty::EASY, 0).unwrap();
        game.board = Board::with_layout(MineLayout::from_mine_coords((9, 9), mines).unwrap());
        game
    }

    #[test]
    fn presets_are_valid() {
        for difficulty in [Difficulty::EASY, Difficulty::MEDIUM, Difficulty::HARD] {
            assert_eq!(difficulty.validate(), Ok(()));
        }
        assert_eq!(Difficulty::HARD.safe_cells(), 381);
    }

    #[test]
    fn rejects_crowded_boards() {
        assert_eq!(Difficulty::new(3, 3, 1), Err(GameError::TooManyMines));
        assert!(matches!(Difficulty::new(0, 3, 1), Err(GameError::InvalidConfig(_))));
        assert!(matches!(Difficulty::new(9, 9, 0), Err(GameError::InvalidConfig(_))));
        assert!(Minesweeper::new(Difficulty { rows: 4, cols: 4, mines: 8 }, 0).is_err());
    }

    #[test]
    fn first_click_places_mines_and_opens_a_zero() {
        let mut game = Minesweeper::new(Difficulty::EASY, 3).unwrap();
        assert!(!game.board().has_mines());

        let result = game.apply_move(MinesMove::Reveal((4, 4)));

        assert!(result.changed);
        assert_eq!(game.board().cell_state((4, 4)), CellState::Revealed(0));
        assert!(game.board().revealed_count() >= 9);
    }

    #[test]
    fn flagging_before_first_click_is_allowed() {
        let mut game = Minesweeper::new(Difficulty::EASY, 3).unwrap();

        assert!(game.apply_move(MinesMove::ToggleFlag((0, 0))).changed);
        assert_eq!(game.mines_left(), 9);
        assert_eq!(game.apply_move(MinesMove::Reveal((0, 0))), MoveResult::NO_CHANGE);
        assert!(!game.board().has_mines());
    }

    #[test]
    fn invalid_moves_are_no_ops() {
        let mut game = Minesweeper::new(Difficulty::EASY, 3).unwrap();
        assert_eq!(game.apply_move(MinesMove::Reveal((9, 0))), MoveResult::NO_CHANGE);
        assert_eq!(game.apply_move(MinesMove::ToggleFlag((0, 200))), MoveResult::NO_CHANGE);
    }

    #[test]
    fn clock_runs_only_while_active() {
        let mut game = with_mines(&[(0, 0), (0, 8), (8, 0), (8, 8), (4, 0)]);
        assert_eq!(game.tick(), MoveResult::NO_CHANGE);

        game.apply_move(MinesMove::Reveal((0, 1)));
        game.tick();
        game.tick();
        assert_eq!(game.elapsed_secs(), 2);

        for coords in safe_cells(&game) {
            game.apply_move(MinesMove::Reveal(coords));
        }
        assert_eq!(game.outcome(), Some(Outcome::Win));
        assert_eq!(game.tick(), MoveResult::NO_CHANGE);
        assert_eq!(game.score(), Some(Score::Seconds(2)));
    }

    #[test]
    fn hitting_a_mine_loses_and_cues_audio() {
        let mut game = with_mines(&[(0, 0), (8, 8)]);
        game.apply_move(MinesMove::Reveal((0, 1)));
        let mine = (8, 8);

        let result = game.apply_move(MinesMove::Reveal(mine));

        assert_eq!(result.outcome, Some(Outcome::Loss));
        assert_eq!(game.take_signals(), vec![Signal::Cue(Cue::Lose)]);
        assert_eq!(game.score(), None);
        assert_eq!(game.apply_move(MinesMove::Reveal(mine)), MoveResult::NO_CHANGE);
    }

    #[test]
    fn input_mapping() {
        let game = Minesweeper::new(Difficulty::EASY, 0).unwrap();
        assert_eq!(game.map_input(RawInput::Tap((1, 2))), Some(MinesMove::Reveal((1, 2))));
        assert_eq!(
            game.map_input(RawInput::LongPress((1, 2))),
            Some(MinesMove::ToggleFlag((1, 2)))
        );
        assert_eq!(game.map_input(RawInput::Arrow(Direction::Up)), None);
        assert_eq!(game.map_input(RawInput::Tap((9, 0))), None);
        assert_eq!(game.map_input(RawInput::LongPress((0, 9))), None);
    }

    #[test]
    fn restart_clears_the_board() {
        let mut game = Minesweeper::new(Difficulty::MEDIUM, 9).unwrap();
        game.apply_move(MinesMove::Reveal((8, 8)));
        game.tick();

        game.restart();

        assert!(!game.board().has_mines());
        assert_eq!(game.elapsed_secs(), 0);
        assert_eq!(game.board().difficulty(), Difficulty::MEDIUM);
        assert_eq!(game.score_key(), "arcade:best:minesweeper:16x16x40");
    }
}
