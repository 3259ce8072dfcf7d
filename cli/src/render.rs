use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;

use arcade_core::minesweeper::{CellState, Minesweeper};
use arcade_core::pairs::{CardState, Pairs};
use arcade_core::snake::Snake;
use arcade_core::tennis::{Rect, Side, Tennis};
use arcade_core::{Coord, Coord2, Game, GameStatus, Outcome, Presenter};
use crossterm::{QueueableCommand, cursor, style, terminal};

const TENNIS_COLS: usize = 40;
const TENNIS_ROWS: usize = 30;

/// Text rendering of a game for the terminal.
pub trait Draw {
    /// Size of the cursor grid, `None` for games steered with arrows only.
    fn grid(&self) -> Option<Coord2> {
        None
    }

    fn draw(&self, cursor: Option<Coord2>) -> Vec<String>;

    fn status(&self) -> String;

    fn help(&self) -> &'static str;
}

/// Lays out cells three characters wide, bracketing the one under the cursor.
fn grid_line(row: Coord, cells: impl Iterator<Item = char>, cursor: Option<Coord2>) -> String {
    cells
        .enumerate()
        .map(|(col, symbol)| {
            if cursor == Some((row, col as Coord)) {
                format!("[{symbol}]")
            } else {
                format!(" {symbol} ")
            }
        })
        .collect()
}

impl Draw for Minesweeper {
    fn grid(&self) -> Option<Coord2> {
        Some(self.board().size())
    }

    fn draw(&self, cursor: Option<Coord2>) -> Vec<String> {
        let (rows, cols) = self.board().size();
        (0..rows)
            .map(|row| {
                let cells = (0..cols).map(|col| match self.board().cell_state((row, col)) {
                    CellState::Hidden => '.',
                    CellState::Flagged => 'F',
                    CellState::Revealed(0) => ' ',
                    CellState::Revealed(count) => char::from(b'0' + count),
                    CellState::Mine => '*',
                    CellState::Exploded => 'X',
                    CellState::WrongFlag => 'x',
                });
                grid_line(row, cells, cursor)
            })
            .collect()
    }

    fn status(&self) -> String {
        format!("Mines left: {}  Time: {}s", self.mines_left(), self.elapsed_secs())
    }

    fn help(&self) -> &'static str {
        "arrows move, space reveals, f flags, p pause, r restart, q quit"
    }
}

impl Draw for Snake {
    fn draw(&self, _cursor: Option<Coord2>) -> Vec<String> {
        let (rows, cols) = self.config().size();
        let mut canvas = vec![vec!['.'; usize::from(cols)]; usize::from(rows)];
        let (food_row, food_col) = self.food();
        canvas[usize::from(food_row)][usize::from(food_col)] = '*';
        for (index, (row, col)) in self.segments().enumerate() {
            canvas[usize::from(row)][usize::from(col)] = if index == 0 { '@' } else { 'o' };
        }
        canvas
            .into_iter()
            .map(|line| line.into_iter().flat_map(|c| [c, ' ']).collect())
            .collect()
    }

    fn status(&self) -> String {
        format!("Score: {}  Length: {}", self.score(), self.len())
    }

    fn help(&self) -> &'static str {
        "arrows steer, p pause, r restart, q quit"
    }
}

impl Draw for Tennis {
    fn draw(&self, _cursor: Option<Coord2>) -> Vec<String> {
        let config = self.config();
        let scale_x = config.width / TENNIS_COLS as f32;
        let scale_y = config.height / TENNIS_ROWS as f32;
        let mut canvas = vec![vec![' '; TENNIS_COLS]; TENNIS_ROWS];

        let mut fill = |rect: Rect, symbol: char| {
            let left = (rect.x / scale_x).floor().max(0.0) as usize;
            let right = ((rect.x + rect.width) / scale_x).ceil() as usize;
            let top = (rect.y / scale_y).floor().max(0.0) as usize;
            let bottom = ((rect.y + rect.height) / scale_y).ceil() as usize;
            for line in canvas.iter_mut().take(bottom.min(TENNIS_ROWS)).skip(top) {
                for cell in line.iter_mut().take(right.min(TENNIS_COLS)).skip(left) {
                    *cell = symbol;
                }
            }
        };
        fill(self.paddle(Side::Ai), '=');
        fill(self.paddle(Side::Player), '=');
        if self.ball_active() {
            fill(self.ball(), 'o');
        }

        let border = format!("+{}+", "-".repeat(TENNIS_COLS));
        let mut lines = vec![border.clone()];
        lines.extend(
            canvas
                .into_iter()
                .map(|line| format!("|{}|", line.into_iter().collect::<String>())),
        );
        lines.push(border);
        lines
    }

    fn status(&self) -> String {
        format!(
            "You: {} lives, {} points  |  AI: {} lives, {} points",
            self.lives(Side::Player),
            self.points(Side::Player),
            self.lives(Side::Ai),
            self.points(Side::Ai),
        )
    }

    fn help(&self) -> &'static str {
        "left/right move the paddle, p pause, r restart, q quit"
    }
}

impl Draw for Pairs {
    fn grid(&self) -> Option<Coord2> {
        let config = self.config();
        // row count is bounded by config validation
        Some((config.rows() as Coord, config.columns))
    }

    fn draw(&self, cursor: Option<Coord2>) -> Vec<String> {
        let columns = usize::from(self.config().columns);
        self.cards()
            .chunks(columns)
            .enumerate()
            .map(|(row, cards)| {
                let cells = cards.iter().map(|card| {
                    let face = char::from(b'A' + card.face % 26);
                    match card.state {
                        CardState::Hidden => '#',
                        CardState::Shown => face,
                        CardState::Matched => face.to_ascii_lowercase(),
                    }
                });
                grid_line(row as Coord, cells, cursor)
            })
            .collect()
    }

    fn status(&self) -> String {
        format!(
            "Lives: {}  Pairs: {}/{}",
            self.lives(),
            self.pairs_found(),
            self.config().pairs
        )
    }

    fn help(&self) -> &'static str {
        "arrows move, space flips, p pause, r restart, q quit"
    }
}

fn status_label(status: GameStatus) -> &'static str {
    match status {
        GameStatus::NotStarted => "Ready",
        GameStatus::Running => "Playing",
        GameStatus::Paused => "Paused",
        GameStatus::Over(Outcome::Win) => "Won",
        GameStatus::Over(Outcome::Loss) => "Lost",
    }
}

/// Redraws the whole screen on every change.
pub struct TerminalPresenter {
    title: String,
    cursor: Rc<Cell<Coord2>>,
    message: Option<&'static str>,
    last_status: GameStatus,
    stdout: io::Stdout,
}

impl TerminalPresenter {
    pub fn new(title: String, cursor: Rc<Cell<Coord2>>) -> Self {
        Self {
            title,
            cursor,
            message: None,
            last_status: GameStatus::NotStarted,
            stdout: io::stdout(),
        }
    }

    fn draw<G: Draw>(&mut self, game: &G, status: GameStatus) -> io::Result<()> {
        let cursor = game.grid().map(|_| self.cursor.get());
        let mut lines = vec![
            format!("{}  [{}]", self.title, status_label(status)),
            game.status(),
            String::new(),
        ];
        lines.extend(game.draw(cursor));
        lines.push(String::new());
        if let Some(message) = self.message {
            lines.push(message.to_owned());
        }
        lines.push(game.help().to_owned());

        self.stdout.queue(cursor::MoveTo(0, 0))?;
        self.stdout.queue(terminal::Clear(terminal::ClearType::All))?;
        for line in lines {
            self.stdout.queue(style::Print(line))?;
            self.stdout.queue(cursor::MoveToNextLine(1))?;
        }
        self.stdout.flush()
    }
}

impl<G: Game + Draw> Presenter<G> for TerminalPresenter {
    fn render(&mut self, game: &G, status: GameStatus) {
        if status == GameStatus::NotStarted {
            self.message = None;
        }
        self.last_status = status;
        if let Err(err) = self.draw(game, status) {
            log::warn!("Could not draw {}: {}", G::KIND, err);
        }
    }

    fn announce(&mut self, game: &G, outcome: Outcome) {
        self.message = Some(match outcome {
            Outcome::Win => "You won! Press r to play again.",
            Outcome::Loss => "Game over. Press r to try again.",
        });
        let status = self.last_status;
        if let Err(err) = self.draw(game, status) {
            log::warn!("Could not draw {}: {}", G::KIND, err);
        }
    }
}
