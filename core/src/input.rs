use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::*;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PointerButtons: u8 {
        const PRIMARY   = 1;
        const SECONDARY = 1 << 1;
    }
}

/// Raw event coming from the presentation layer, before a game gives it meaning.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RawInput {
    Tap(Coord2),
    LongPress(Coord2),
    Press { at: Coord2, buttons: PointerButtons },
    Arrow(Direction),
    Swipe(Direction),
    /// Horizontal pointer position in playfield units.
    Drag { x: f32 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellIntent {
    Primary,
    Secondary,
}

impl RawInput {
    pub fn intent(&self) -> CellIntent {
        match self {
            Self::LongPress(_) => CellIntent::Secondary,
            Self::Press { buttons, .. } if *buttons == PointerButtons::SECONDARY => {
                CellIntent::Secondary
            }
            _ => CellIntent::Primary,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.intent() == CellIntent::Primary
    }

    /// Cell targeted by a positional event, along with what kind of action it asks for.
    pub fn cell_target(&self) -> Option<(Coord2, CellIntent)> {
        match *self {
            Self::Tap(at) | Self::LongPress(at) => Some((at, self.intent())),
            Self::Press { at, buttons } if buttons.contains(PointerButtons::PRIMARY) => {
                Some((at, CellIntent::Primary))
            }
            Self::Press { at, buttons } if buttons.contains(PointerButtons::SECONDARY) => {
                Some((at, CellIntent::Secondary))
            }
            _ => None,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match *self {
            Self::Arrow(dir) | Self::Swipe(dir) => Some(dir),
            _ => None,
        }
    }
}
