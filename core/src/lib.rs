use core::fmt;
use core::ops::BitOr;
use core::time::Duration;
use serde::{Deserialize, Serialize};

pub use audio::*;
pub use deferred::*;
pub use error::*;
pub use input::*;
pub use prefs::*;
pub use session::*;
pub use ticker::*;
pub use types::*;

pub mod minesweeper;
pub mod pairs;
pub mod snake;
pub mod tennis;

mod audio;
mod deferred;
mod error;
mod input;
mod prefs;
mod session;
mod ticker;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Minesweeper,
    Snake,
    Tennis,
    Pairs,
}

impl GameKind {
    pub const ALL: [GameKind; 4] = [Self::Minesweeper, Self::Snake, Self::Tennis, Self::Pairs];

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Minesweeper => "minesweeper",
            Self::Snake => "snake",
            Self::Tennis => "tennis",
            Self::Pairs => "pairs",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

/// What a single move, tick or deferred effect did to a game.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoveResult {
    pub changed: bool,
    pub outcome: Option<Outcome>,
}

impl MoveResult {
    pub const NO_CHANGE: Self = Self {
        changed: false,
        outcome: None,
    };

    pub const CHANGED: Self = Self {
        changed: true,
        outcome: None,
    };

    pub const fn finished(outcome: Outcome) -> Self {
        Self {
            changed: true,
            outcome: Some(outcome),
        }
    }

    pub const fn changed_if(changed: bool) -> Self {
        Self {
            changed,
            outcome: None,
        }
    }

    pub const fn has_update(self) -> bool {
        self.changed || self.outcome.is_some()
    }
}

/// Merges results of several steps, a loss takes priority over a win.
impl BitOr for MoveResult {
    type Output = MoveResult;

    fn bitor(self, rhs: Self) -> Self::Output {
        use Outcome::*;
        let outcome = match (self.outcome, rhs.outcome) {
            (Some(Loss), _) | (_, Some(Loss)) => Some(Loss),
            (Some(Win), _) | (_, Some(Win)) => Some(Win),
            (None, None) => None,
        };
        MoveResult {
            changed: self.changed || rhs.changed,
            outcome,
        }
    }
}

/// A value worth keeping across sessions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    /// Higher is better.
    Points(u32),
    /// Lower is better.
    Seconds(u32),
}

impl Score {
    pub const fn value(self) -> u32 {
        match self {
            Self::Points(value) | Self::Seconds(value) => value,
        }
    }

    pub fn improves_on(self, previous: Option<i64>) -> bool {
        let Some(previous) = previous else {
            return true;
        };
        let value = i64::from(self.value());
        match self {
            Self::Points(_) => value > previous,
            Self::Seconds(_) => value < previous,
        }
    }
}

/// Side effects a game asks its session to carry out.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal<E> {
    Cue(Cue),
    After(Duration, E),
}

/// A tick-driven game state machine.
///
/// A game is built fully validated by [`Game::new`], advanced by [`Game::apply_move`] and
/// [`Game::tick`], and reports a terminal [`Outcome`] once it is over. Delays are never slept
/// through: a game emits [`Signal::After`] and the owning session hands the effect back to
/// [`Game::resolve`] once the delay has elapsed, unless the game ended or restarted meanwhile.
pub trait Game: Sized {
    type Config;
    type Move: Copy + fmt::Debug;
    type Effect: fmt::Debug;

    const KIND: GameKind;

    fn new(config: Self::Config, seed: u64) -> Result<Self>;

    /// Period of [`Game::tick`], `None` for games that only react to input.
    fn tick_period(&self) -> Option<Duration>;

    fn map_input(&self, input: RawInput) -> Option<Self::Move>;

    /// Applies a move, invalid moves are no-ops.
    fn apply_move(&mut self, mv: Self::Move) -> MoveResult;

    fn tick(&mut self) -> MoveResult {
        MoveResult::NO_CHANGE
    }

    fn resolve(&mut self, effect: Self::Effect) -> MoveResult;

    fn outcome(&self) -> Option<Outcome>;

    /// Whether a transient state is being resolved, primary input is dropped meanwhile.
    fn is_resolving(&self) -> bool {
        false
    }

    fn take_signals(&mut self) -> Vec<Signal<Self::Effect>> {
        Vec::new()
    }

    fn score(&self) -> Option<Score>;

    fn score_key(&self) -> String {
        keys::best_score(Self::KIND)
    }

    /// Rebuilds the board from the original configuration.
    fn restart(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_wins_the_merge() {
        let merged = MoveResult::finished(Outcome::Win) | MoveResult::finished(Outcome::Loss);
        assert_eq!(merged, MoveResult::finished(Outcome::Loss));
        assert_eq!(MoveResult::NO_CHANGE | MoveResult::CHANGED, MoveResult::CHANGED);
        assert!(!(MoveResult::NO_CHANGE | MoveResult::NO_CHANGE).has_update());
    }

    #[test]
    fn seconds_improve_downwards() {
        assert!(Score::Seconds(30).improves_on(Some(45)));
        assert!(!Score::Seconds(50).improves_on(Some(45)));
        assert!(Score::Points(10).improves_on(None));
        assert!(!Score::Points(10).improves_on(Some(10)));
    }
}
