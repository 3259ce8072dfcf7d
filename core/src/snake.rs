//! Snake on a walled grid, growing by one segment per food eaten.

use core::convert::Infallible;
use core::time::Duration;
use std::collections::VecDeque;

use rand::prelude::*;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeConfig {
    pub rows: Coord,
    pub cols: Coord,
    pub initial_length: u8,
    pub tick_ms: u64,
    pub food_points: u32,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            rows: 15,
            cols: 15,
            initial_length: 3,
            tick_ms: 300,
            food_points: 10,
        }
    }
}

impl SnakeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GameError::InvalidConfig("board needs at least one row and column"));
        }
        if self.initial_length == 0 {
            return Err(GameError::InvalidConfig("snake needs at least one segment"));
        }
        // the snake starts centered and extends to the left
        if self.cols / 2 + 1 < self.initial_length {
            return Err(GameError::InvalidConfig("snake does not fit on the board"));
        }
        if mult(self.rows, self.cols) <= CellCount::from(self.initial_length) {
            return Err(GameError::InvalidConfig("no room left for food"));
        }
        if self.tick_ms == 0 {
            return Err(GameError::InvalidConfig("tick period must be positive"));
        }
        Ok(())
    }

    pub const fn size(&self) -> Coord2 {
        (self.rows, self.cols)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnakeMove {
    Turn(Direction),
}

#[derive(Clone, Debug)]
pub struct Snake {
    config: SnakeConfig,
    /// Head first.
    segments: VecDeque<Coord2>,
    direction: Direction,
    next_direction: Direction,
    food: Coord2,
    score: u32,
    outcome: Option<Outcome>,
    rng: SmallRng,
    signals: Vec<Signal<Infallible>>,
}

impl Snake {
    pub fn config(&self) -> &SnakeConfig {
        &self.config
    }

    pub fn segments(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.segments.iter().copied()
    }

    pub fn head(&self) -> Coord2 {
        self.segments[0]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn food(&self) -> Coord2 {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn next_direction(&self) -> Direction {
        self.next_direction
    }

    pub fn occupies(&self, coords: Coord2) -> bool {
        self.segments.contains(&coords)
    }

    fn reset(&mut self) {
        let (rows, cols) = self.config.size();
        let head = (rows / 2, cols / 2);
        self.segments = (0..self.config.initial_length)
            .map(|offset| (head.0, head.1 - offset))
            .collect();
        self.direction = Direction::Right;
        self.next_direction = Direction::Right;
        self.score = 0;
        self.outcome = None;
        self.signals.clear();
        // validated config always leaves a free cell
        self.place_food();
    }

    /// Samples cells until one is not covered by the snake, returns `false` when none is left.
    fn place_food(&mut self) -> bool {
        let (rows, cols) = self.config.size();
        if self.segments.len() >= usize::from(mult(rows, cols)) {
            return false;
        }
        loop {
            let coords = (self.rng.random_range(0..rows), self.rng.random_range(0..cols));
            if !self.occupies(coords) {
                log::trace!("Food placed at {:?}", coords);
                self.food = coords;
                return true;
            }
        }
    }

    fn turn(&mut self, direction: Direction) -> MoveResult {
        if self.outcome.is_some() || direction == self.direction.opposite() {
            return MoveResult::NO_CHANGE;
        }
        let changed = self.next_direction != direction;
        self.next_direction = direction;
        MoveResult::changed_if(changed)
    }

    fn crash(&mut self, reason: &str) -> MoveResult {
        log::debug!("Snake crashed into {} at {:?}, score {}", reason, self.head(), self.score);
        self.outcome = Some(Outcome::Loss);
        self.signals.push(Signal::Cue(Cue::Lose));
        MoveResult::finished(Outcome::Loss)
    }
}

impl Game for Snake {
    type Config = SnakeConfig;
    type Move = SnakeMove;
    type Effect = Infallible;

    const KIND: GameKind = GameKind::Snake;

    fn new(config: SnakeConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut snake = Self {
            config,
            segments: VecDeque::new(),
            direction: Direction::Right,
            next_direction: Direction::Right,
            food: (0, 0),
            score: 0,
            outcome: None,
            rng: SmallRng::seed_from_u64(seed),
            signals: Vec::new(),
        };
        snake.reset();
        Ok(snake)
    }

    fn tick_period(&self) -> Option<Duration> {
        Some(Duration::from_millis(self.config.tick_ms))
    }

    fn map_input(&self, input: RawInput) -> Option<SnakeMove> {
        input.direction().map(SnakeMove::Turn)
    }

    fn apply_move(&mut self, mv: SnakeMove) -> MoveResult {
        match mv {
            SnakeMove::Turn(direction) => self.turn(direction),
        }
    }

    /// Moves one cell, checking walls before the body.
    fn tick(&mut self) -> MoveResult {
        if self.outcome.is_some() {
            return MoveResult::NO_CHANGE;
        }

        self.direction = self.next_direction;
        let Some(new_head) = apply_delta(self.head(), self.direction.delta(), self.config.size())
        else {
            return self.crash("a wall");
        };

        let eating = new_head == self.food;
        self.segments.push_front(new_head);
        if !eating {
            self.segments.pop_back();
        }

        if self.segments.iter().skip(1).any(|&segment| segment == new_head) {
            return self.crash("itself");
        }

        if eating {
            self.score += self.config.food_points;
            log::debug!("Snake ate at {:?}, score {}", new_head, self.score);
            if !self.place_food() {
                self.outcome = Some(Outcome::Win);
                return MoveResult::finished(Outcome::Win);
            }
        }
        MoveResult::CHANGED
    }

    fn resolve(&mut self, effect: Infallible) -> MoveResult {
        match effect {}
    }

    fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    fn take_signals(&mut self) -> Vec<Signal<Infallible>> {
        core::mem::take(&mut self.signals)
    }

    fn score(&self) -> Option<Score> {
        (self.score > 0).then_some(Score::Points(self.score))
    }

    fn restart(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snake() -> Snake {
        let mut snake = Snake::new(SnakeConfig::default(), 1).unwrap();
        snake.food = (0, 0);
        snake
    }

    fn with_segments(segments: &[Coord2], direction: Direction) -> Snake {
        let mut snake = snake();
        snake.segments = segments.iter().copied().collect();
        snake.direction = direction;
        snake.next_direction = direction;
        snake
    }

    #[test]
    fn starts_centered_heading_right() {
        let snake = snake();
        assert_eq!(snake.segments().collect::<Vec<_>>(), vec![(7, 7), (7, 6), (7, 5)]);
        assert_eq!(snake.direction(), Direction::Right);
    }

    #[test]
    fn one_tick_moves_head_and_drops_tail() {
        let mut snake = snake();
        let old_head = snake.head();

        assert_eq!(snake.tick(), MoveResult::CHANGED);

        assert_eq!(snake.head(), (old_head.0, old_head.1 + 1));
        assert_eq!(snake.len(), 3);
        assert!(!snake.occupies((7, 5)));
    }

    #[test]
    fn reversal_is_ignored() {
        let mut snake = snake();

        assert_eq!(snake.apply_move(SnakeMove::Turn(Direction::Left)), MoveResult::NO_CHANGE);
        assert_eq!(snake.next_direction(), Direction::Right);

        snake.tick();
        assert_eq!(snake.head(), (7, 8));
    }

    #[test]
    fn turn_takes_effect_on_next_tick() {
        let mut snake = snake();

        assert!(snake.apply_move(SnakeMove::Turn(Direction::Up)).changed);
        assert_eq!(snake.direction(), Direction::Right);

        snake.tick();
        assert_eq!(snake.direction(), Direction::Up);
        assert_eq!(snake.head(), (6, 7));
    }

    #[test]
    fn quick_turns_cannot_reverse_within_a_tick() {
        let mut snake = snake();

        snake.apply_move(SnakeMove::Turn(Direction::Up));
        snake.apply_move(SnakeMove::Turn(Direction::Left));

        assert_eq!(snake.next_direction(), Direction::Up);
    }

    #[test]
    fn wall_ends_the_game() {
        let mut snake = snake();

        for _ in 0..7 {
            assert_eq!(snake.tick(), MoveResult::CHANGED);
        }
        assert_eq!(snake.head(), (7, 14));

        assert_eq!(snake.tick(), MoveResult::finished(Outcome::Loss));
        assert_eq!(snake.outcome(), Some(Outcome::Loss));
        assert_eq!(snake.take_signals(), vec![Signal::Cue(Cue::Lose)]);
        assert_eq!(snake.tick(), MoveResult::NO_CHANGE);
    }

    #[test]
    fn biting_the_body_ends_the_game() {
        let mut snake = with_segments(&[(2, 2), (2, 3), (1, 3), (1, 2), (1, 1)], Direction::Left);

        snake.apply_move(SnakeMove::Turn(Direction::Up));

        assert_eq!(snake.tick(), MoveResult::finished(Outcome::Loss));
    }

    #[test]
    fn chasing_the_tail_is_safe() {
        let mut snake = with_segments(&[(1, 1), (1, 2), (2, 2), (2, 1)], Direction::Left);

        snake.apply_move(SnakeMove::Turn(Direction::Down));

        assert_eq!(snake.tick(), MoveResult::CHANGED);
        assert_eq!(snake.head(), (2, 1));
        assert_eq!(snake.len(), 4);
    }

    #[test]
    fn eating_grows_and_scores() {
        let mut snake = snake();
        snake.food = (7, 8);

        snake.tick();

        assert_eq!(snake.len(), 4);
        assert_eq!(snake.score(), 10);
        assert!(!snake.occupies(snake.food()));
        assert_eq!(Game::score(&snake), Some(Score::Points(10)));
    }

    #[test]
    fn food_never_lands_on_the_snake() {
        for seed in 0..100 {
            let snake = Snake::new(SnakeConfig::default(), seed).unwrap();
            assert!(!snake.occupies(snake.food()));
        }
    }

    #[test]
    fn filling_the_board_wins() {
        let config = SnakeConfig {
            rows: 1,
            cols: 4,
            ..Default::default()
        };
        let mut snake = Snake::new(config, 0).unwrap();
        assert_eq!(snake.food(), (0, 3));

        assert_eq!(snake.tick(), MoveResult::finished(Outcome::Win));
        assert_eq!(snake.len(), 4);
    }

    #[test]
    fn config_validation() {
        let too_long = SnakeConfig {
            cols: 4,
            initial_length: 4,
            ..Default::default()
        };
        assert!(matches!(Snake::new(too_long, 0), Err(GameError::InvalidConfig(_))));
        let no_room = SnakeConfig {
            rows: 1,
            cols: 3,
            initial_length: 3,
            ..Default::default()
        };
        assert!(Snake::new(no_room, 0).is_err());
    }

    #[test]
    fn swipes_and_arrows_turn() {
        let snake = snake();
        assert_eq!(
            snake.map_input(RawInput::Swipe(Direction::Down)),
            Some(SnakeMove::Turn(Direction::Down))
        );
        assert_eq!(snake.map_input(RawInput::Tap((0, 0))), None);
    }

    #[test]
    fn restart_resets_score_and_position() {
        let mut snake = snake();
        snake.food = (7, 8);
        snake.tick();
        snake.restart();

        assert_eq!(snake.score(), 0);
        assert_eq!(snake.head(), (7, 7));
        assert_eq!(snake.outcome(), None);
    }
}
