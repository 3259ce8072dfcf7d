//! Memory pairs: flip two cards, keep them if their faces match.

use core::time::Duration;

use rand::prelude::*;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairsConfig {
    pub pairs: u8,
    pub columns: Coord,
    pub lives: u8,
    pub mismatch_delay_ms: u64,
}

impl Default for PairsConfig {
    fn default() -> Self {
        Self {
            pairs: 8,
            columns: 4,
            lives: 10,
            mismatch_delay_ms: 1000,
        }
    }
}

impl PairsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.pairs == 0 {
            return Err(GameError::InvalidConfig("deck needs at least one pair"));
        }
        if self.columns == 0 {
            return Err(GameError::InvalidConfig("grid needs at least one column"));
        }
        if self.rows() > CellCount::from(Coord::MAX) {
            return Err(GameError::InvalidConfig("too many rows for the grid"));
        }
        if self.lives == 0 {
            return Err(GameError::InvalidConfig("player needs at least one life"));
        }
        Ok(())
    }

    pub fn card_count(&self) -> usize {
        usize::from(self.pairs) * 2
    }

    pub fn rows(&self) -> CellCount {
        (CellCount::from(self.pairs) * 2).div_ceil(CellCount::from(self.columns))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardState {
    #[default]
    Hidden,
    Shown,
    Matched,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub face: u8,
    pub state: CardState,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairsMove {
    Flip(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PairsEffect {
    /// Turns a mismatched pair face down again.
    Conceal(usize, usize),
}

#[derive(Clone, Debug)]
pub struct Pairs {
    config: PairsConfig,
    cards: Vec<Card>,
    first: Option<usize>,
    busy: bool,
    pairs_found: u8,
    lives: u8,
    outcome: Option<Outcome>,
    rng: SmallRng,
    signals: Vec<Signal<PairsEffect>>,
}

impl Pairs {
    pub fn config(&self) -> &PairsConfig {
        &self.config
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    /// Card under grid position `(row, col)`, if any.
    pub fn index_of(&self, (row, col): Coord2) -> Option<usize> {
        if col >= self.config.columns {
            return None;
        }
        let index = usize::from(row) * usize::from(self.config.columns) + usize::from(col);
        (index < self.cards.len()).then_some(index)
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn pairs_found(&self) -> u8 {
        self.pairs_found
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    fn deal(&mut self) {
        self.cards = (0..self.config.pairs)
            .flat_map(|face| [face, face])
            .map(|face| Card {
                face,
                state: CardState::Hidden,
            })
            .collect();
        self.cards.shuffle(&mut self.rng);
        self.first = None;
        self.busy = false;
        self.pairs_found = 0;
        self.lives = self.config.lives;
        self.outcome = None;
        self.signals.clear();
    }

    fn flip(&mut self, index: usize) -> MoveResult {
        if self.outcome.is_some() || self.busy {
            return MoveResult::NO_CHANGE;
        }
        // also rejects the first card of the pair being picked again
        match self.cards.get(index) {
            Some(card) if card.state == CardState::Hidden => {}
            _ => return MoveResult::NO_CHANGE,
        }
        self.cards[index].state = CardState::Shown;

        let Some(first) = self.first.take() else {
            self.first = Some(index);
            return MoveResult::CHANGED;
        };

        if self.cards[first].face == self.cards[index].face {
            self.matched(first, index)
        } else {
            self.mismatched(first, index)
        }
    }

    fn matched(&mut self, a: usize, b: usize) -> MoveResult {
        self.cards[a].state = CardState::Matched;
        self.cards[b].state = CardState::Matched;
        self.pairs_found += 1;
        log::debug!("Matched face {} ({}/{})", self.cards[a].face, self.pairs_found, self.config.pairs);

        if self.pairs_found == self.config.pairs {
            self.outcome = Some(Outcome::Win);
            return MoveResult::finished(Outcome::Win);
        }
        MoveResult::CHANGED
    }

    fn mismatched(&mut self, a: usize, b: usize) -> MoveResult {
        self.lives = self.lives.saturating_sub(1);
        self.signals.push(Signal::Cue(Cue::Lose));
        log::debug!("Mismatch at {} and {}, {} lives left", a, b, self.lives);

        if self.lives == 0 {
            self.outcome = Some(Outcome::Loss);
            return MoveResult::finished(Outcome::Loss);
        }
        self.busy = true;
        self.signals.push(Signal::After(
            Duration::from_millis(self.config.mismatch_delay_ms),
            PairsEffect::Conceal(a, b),
        ));
        MoveResult::CHANGED
    }
}

impl Game for Pairs {
    type Config = PairsConfig;
    type Move = PairsMove;
    type Effect = PairsEffect;

    const KIND: GameKind = GameKind::Pairs;

    fn new(config: PairsConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut pairs = Self {
            config,
            cards: Vec::with_capacity(config.card_count()),
            first: None,
            busy: false,
            pairs_found: 0,
            lives: 0,
            outcome: None,
            rng: SmallRng::seed_from_u64(seed),
            signals: Vec::new(),
        };
        pairs.deal();
        Ok(pairs)
    }

    fn tick_period(&self) -> Option<Duration> {
        None
    }

    fn map_input(&self, input: RawInput) -> Option<PairsMove> {
        match input.cell_target()? {
            (at, CellIntent::Primary) => self.index_of(at).map(PairsMove::Flip),
            (_, CellIntent::Secondary) => None,
        }
    }

    fn apply_move(&mut self, mv: PairsMove) -> MoveResult {
        match mv {
            PairsMove::Flip(index) => self.flip(index),
        }
    }

    fn resolve(&mut self, effect: PairsEffect) -> MoveResult {
        if self.outcome.is_some() {
            return MoveResult::NO_CHANGE;
        }
        match effect {
            PairsEffect::Conceal(a, b) => {
                for index in [a, b] {
                    if let Some(card) = self.cards.get_mut(index)
                        && card.state == CardState::Shown
                    {
                        card.state = CardState::Hidden;
                    }
                }
                self.busy = false;
                MoveResult::CHANGED
            }
        }
    }

    fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    fn is_resolving(&self) -> bool {
        self.busy
    }

    fn take_signals(&mut self) -> Vec<Signal<PairsEffect>> {
        core::mem::take(&mut self.signals)
    }

    /// Lives left over on a won game.
    fn score(&self) -> Option<Score> {
        (self.outcome == Some(Outcome::Win)).then_some(Score::Points(self.lives.into()))
    }

    fn restart(&mut self) {
        self.deal();
    }
}
