use web_time::Instant;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameStatus {
    NotStarted,
    Running,
    Paused,
    Over(Outcome),
}

impl GameStatus {
    pub const fn is_over(self) -> bool {
        matches!(self, Self::Over(_))
    }
}

/// Presentation layer of a session, told about every visible change.
pub trait Presenter<G> {
    fn render(&mut self, game: &G, status: GameStatus);

    /// Called once when a game reaches its outcome, after the final render.
    fn announce(&mut self, _game: &G, _outcome: Outcome) {}
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoPresenter;

impl<G> Presenter<G> for NoPresenter {
    fn render(&mut self, _game: &G, _status: GameStatus) {}
}

/// Owns one game for as long as its screen is shown.
///
/// The session drives the game from two sources: input forwarded by the front-end and the
/// passage of time, reported through [`Session::advance`]. It never blocks or sleeps, the owner
/// asks for [`Session::next_deadline`] and calls back once it is reached. Deferred effects are
/// dropped whenever the game they belong to ends or restarts, so a stale effect can never touch
/// a newer board. Dropping the session cancels the ticker and stores the best score.
pub struct Session<G: Game> {
    game: G,
    status: GameStatus,
    ticker: Option<Ticker>,
    deferred: DeferredQueue<G::Effect>,
    prefs: Box<dyn Preferences>,
    audio: Box<dyn AudioCue>,
    presenter: Box<dyn Presenter<G>>,
}

impl<G: Game> Session<G> {
    pub fn new(game: G, prefs: Box<dyn Preferences>) -> Self {
        let ticker = game.tick_period().map(Ticker::new);
        Self {
            game,
            status: GameStatus::NotStarted,
            ticker,
            deferred: DeferredQueue::new(),
            prefs,
            audio: Box::new(Silent),
            presenter: Box::new(NoPresenter),
        }
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioCue>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_presenter(mut self, presenter: Box<dyn Presenter<G>>) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn pending_effects(&self) -> usize {
        self.deferred.len()
    }

    /// Redraws the current state, for changes the game itself does not track.
    pub fn refresh(&mut self) {
        self.render();
    }

    pub fn start(&mut self, now: Instant) {
        if self.status != GameStatus::NotStarted {
            return;
        }
        self.status = GameStatus::Running;
        if let Some(ticker) = &mut self.ticker {
            ticker.start(now);
        }
        log::info!("Started {}", G::KIND);
        self.play(Cue::Start);
        self.render();
    }

    pub fn pause(&mut self) {
        if self.status != GameStatus::Running {
            return;
        }
        self.status = GameStatus::Paused;
        if let Some(ticker) = &mut self.ticker {
            ticker.pause();
        }
        log::debug!("Paused {}", G::KIND);
        self.render();
    }

    pub fn resume(&mut self, now: Instant) {
        if self.status != GameStatus::Paused {
            return;
        }
        self.status = GameStatus::Running;
        if let Some(ticker) = &mut self.ticker {
            ticker.resume(now);
        }
        log::debug!("Resumed {}", G::KIND);
        self.render();
    }

    /// Starts over with a fresh board, keeping any score worth keeping.
    pub fn restart(&mut self) {
        if !self.status.is_over() {
            self.save_score();
        }
        self.deferred.clear();
        if let Some(ticker) = &mut self.ticker {
            ticker.stop();
        }
        self.game.restart();
        self.game.take_signals();
        self.status = GameStatus::NotStarted;
        log::info!("Restarted {}", G::KIND);
        self.render();
    }

    /// Feeds one input to the game, the first one that maps to a move starts the session.
    pub fn handle_input(&mut self, now: Instant, input: RawInput) -> MoveResult {
        if matches!(self.status, GameStatus::Over(_) | GameStatus::Paused) {
            return MoveResult::NO_CHANGE;
        }
        if input.is_primary() && self.game.is_resolving() {
            log::trace!("Dropping {:?} while {} is resolving", input, G::KIND);
            return MoveResult::NO_CHANGE;
        }
        let Some(mv) = self.game.map_input(input) else {
            return MoveResult::NO_CHANGE;
        };
        self.start(now);

        let result = self.game.apply_move(mv);
        let result = self.absorb(now, result);
        self.present(result);
        result
    }

    /// Carries out everything that became due by `now`: deferred effects first, then a tick.
    pub fn advance(&mut self, now: Instant) -> MoveResult {
        let mut result = MoveResult::NO_CHANGE;

        while self.status == GameStatus::Running {
            let Some(effect) = self.deferred.pop_due(now) else {
                break;
            };
            log::trace!("Resolving {:?}", effect);
            let step = self.game.resolve(effect);
            result = result | self.absorb(now, step);
        }

        let tick_due = self.status == GameStatus::Running
            && self.ticker.as_mut().is_some_and(|ticker| ticker.poll(now));
        if tick_due {
            let step = self.game.tick();
            result = result | self.absorb(now, step);
        }

        self.present(result);
        result
    }

    /// Earliest instant at which [`Session::advance`] has something to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.status != GameStatus::Running {
            return None;
        }
        let tick = self.ticker.as_ref().and_then(Ticker::next_due);
        [tick, self.deferred.next_due()].into_iter().flatten().min()
    }

    pub fn best_score(&self) -> Option<i64> {
        self.prefs.get_int_opt(&self.game.score_key())
    }

    /// Stores the current score if it beats the stored one, returns whether it did.
    pub fn save_score(&mut self) -> bool {
        let Some(score) = self.game.score() else {
            return false;
        };
        let key = self.game.score_key();
        if !score.improves_on(self.prefs.get_int_opt(&key)) {
            return false;
        }
        match self.prefs.set_int(&key, i64::from(score.value())) {
            Ok(()) => {
                log::info!("New best {:?} for {}", score, key);
                true
            }
            Err(err) => {
                log::error!("Could not save high score: {}", err);
                false
            }
        }
    }

    /// Handles the signals raised by the last step and notices a terminal outcome.
    fn absorb(&mut self, now: Instant, result: MoveResult) -> MoveResult {
        for signal in self.game.take_signals() {
            match signal {
                Signal::Cue(cue) => self.play(cue),
                Signal::After(delay, effect) => self.deferred.schedule(now + delay, effect),
            }
        }
        if !self.status.is_over()
            && let Some(outcome) = result.outcome.or_else(|| self.game.outcome())
        {
            self.finish(outcome);
        }
        result
    }

    fn finish(&mut self, outcome: Outcome) {
        self.status = GameStatus::Over(outcome);
        if let Some(ticker) = &mut self.ticker {
            ticker.stop();
        }
        self.deferred.clear();
        log::info!("{} ended with a {:?}", G::KIND, outcome);
        self.save_score();
    }

    fn present(&mut self, result: MoveResult) {
        if !result.has_update() {
            return;
        }
        self.render();
        if let (Some(outcome), GameStatus::Over(_)) = (result.outcome, self.status) {
            self.presenter.announce(&self.game, outcome);
        }
    }

    fn render(&mut self) {
        self.presenter.render(&self.game, self.status);
    }

    fn play(&mut self, cue: Cue) {
        if let Err(err) = self.audio.play(cue) {
            log::warn!("Could not play {:?}: {}", cue, err);
        }
    }
}

impl<G: Game> Drop for Session<G> {
    fn drop(&mut self) {
        if let Some(ticker) = &mut self.ticker {
            ticker.cancel();
        }
        self.deferred.clear();
        if !self.status.is_over() {
            self.save_score();
        }
        log::debug!("Closed {} session", G::KIND);
    }
}
