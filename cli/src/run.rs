use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use arcade_core::{
    Coord2, Direction, Game, GameStatus, Preferences, RawInput, Session, apply_delta,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use web_time::Instant;

use crate::render::{Draw, TerminalPresenter};
use crate::terminal::{RawTerminal, TerminalBell};

/// Poll timeout while nothing is scheduled, paused or between games.
const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Copy, Clone, Debug, PartialEq)]
enum Control {
    Quit,
    TogglePause,
    Restart,
    MoveCursor(Direction),
    Input(RawInput),
}

fn arrow(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up => Some(Direction::Up),
        KeyCode::Down => Some(Direction::Down),
        KeyCode::Left => Some(Direction::Left),
        KeyCode::Right => Some(Direction::Right),
        _ => None,
    }
}

/// Grid games move a cursor with the arrows, the others get the arrows as input.
fn control(key: KeyEvent, cursor: Option<Coord2>) -> Option<Control> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Control::Quit);
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Control::Quit),
        KeyCode::Char('p') => Some(Control::TogglePause),
        KeyCode::Char('r') => Some(Control::Restart),
        KeyCode::Char(' ') | KeyCode::Enter => cursor.map(|at| Control::Input(RawInput::Tap(at))),
        KeyCode::Char('f') => cursor.map(|at| Control::Input(RawInput::LongPress(at))),
        code => {
            let direction = arrow(code)?;
            Some(match cursor {
                Some(_) => Control::MoveCursor(direction),
                None => Control::Input(RawInput::Arrow(direction)),
            })
        }
    }
}

/// Plays one game in the terminal until the player quits.
pub fn play<G>(game: G, prefs: Box<dyn Preferences>, player: &str) -> Result<()>
where
    G: Game + Draw + 'static,
{
    let grid = game.grid();
    let cursor = Rc::new(Cell::new((0, 0)));
    let title = format!("{} playing {}", player, G::KIND);
    let presenter = TerminalPresenter::new(title, Rc::clone(&cursor));

    let _terminal = RawTerminal::enter()?;
    let mut session = Session::new(game, prefs)
        .with_audio(Box::new(TerminalBell))
        .with_presenter(Box::new(presenter));
    session.refresh();

    loop {
        let now = Instant::now();
        let timeout = session
            .next_deadline()
            .map_or(IDLE_POLL, |deadline| deadline.saturating_duration_since(now));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let at = grid.map(|_| cursor.get());
                    match control(key, at) {
                        Some(Control::Quit) => break,
                        Some(Control::TogglePause) => {
                            if session.status() == GameStatus::Paused {
                                session.resume(Instant::now());
                            } else {
                                session.pause();
                            }
                        }
                        Some(Control::Restart) => session.restart(),
                        Some(Control::MoveCursor(direction)) => {
                            if let Some(bounds) = grid
                                && let Some(next) = apply_delta(cursor.get(), direction.delta(), bounds)
                            {
                                cursor.set(next);
                                session.refresh();
                            }
                        }
                        Some(Control::Input(input)) => {
                            session.handle_input(Instant::now(), input);
                        }
                        None => {}
                    }
                }
                Event::Resize(..) => session.refresh(),
                _ => {}
            }
        }

        session.advance(Instant::now());
    }

    log::debug!("Leaving {}", G::KIND);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn grid_games_steer_the_cursor() {
        let at = Some((2, 3));
        assert_eq!(
            control(key(KeyCode::Left), at),
            Some(Control::MoveCursor(Direction::Left))
        );
        assert_eq!(
            control(key(KeyCode::Char(' ')), at),
            Some(Control::Input(RawInput::Tap((2, 3))))
        );
        assert_eq!(
            control(key(KeyCode::Char('f')), at),
            Some(Control::Input(RawInput::LongPress((2, 3))))
        );
    }

    #[test]
    fn arrow_games_get_the_arrows() {
        assert_eq!(
            control(key(KeyCode::Up), None),
            Some(Control::Input(RawInput::Arrow(Direction::Up)))
        );
        assert_eq!(control(key(KeyCode::Enter), None), None);
        assert_eq!(control(key(KeyCode::Char('x')), None), None);
    }

    #[test]
    fn session_keys() {
        assert_eq!(control(key(KeyCode::Esc), None), Some(Control::Quit));
        assert_eq!(
            control(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), None),
            Some(Control::Quit)
        );
        assert_eq!(control(key(KeyCode::Char('p')), None), Some(Control::TogglePause));
        assert_eq!(control(key(KeyCode::Char('r')), Some((0, 0))), Some(Control::Restart));
    }
}
