use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    Start,
    Lose,
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio cue {0:?} is not available")]
    Unavailable(Cue),
    #[error("Audio device failed: {0}")]
    Device(#[from] std::io::Error),
}

/// Fire-and-forget sound effects, a failure never affects gameplay.
pub trait AudioCue {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError>;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Silent;

impl AudioCue for Silent {
    fn play(&mut self, _cue: Cue) -> Result<(), AudioError> {
        Ok(())
    }
}
