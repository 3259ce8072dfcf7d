use std::io::{self, Write};

use anyhow::Result;
use arcade_core::{AudioCue, AudioError, Cue};
use crossterm::{QueueableCommand, cursor, style, terminal};

/// Raw mode on an alternate screen, restored when dropped.
pub struct RawTerminal {
    stdout: io::Stdout,
}

impl RawTerminal {
    pub fn enter() -> Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        stdout.queue(terminal::EnterAlternateScreen)?;
        stdout.queue(cursor::Hide)?;
        stdout.flush()?;
        Ok(Self { stdout })
    }

    fn restore(&mut self) -> io::Result<()> {
        self.stdout.queue(style::ResetColor)?;
        self.stdout.queue(cursor::Show)?;
        self.stdout.queue(terminal::LeaveAlternateScreen)?;
        self.stdout.flush()?;
        terminal::disable_raw_mode()
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            log::error!("Could not restore terminal: {}", err);
        }
    }
}

/// Plays cues on the terminal bell.
#[derive(Copy, Clone, Debug, Default)]
pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError> {
        let rings = match cue {
            Cue::Start => 1,
            Cue::Lose => 2,
        };
        let mut stdout = io::stdout();
        for _ in 0..rings {
            stdout.write_all(b"\x07")?;
        }
        stdout.flush()?;
        Ok(())
    }
}
