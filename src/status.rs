//! Abstract status code shown on the single status LED.
//!
//! Each machine state maps to an 8-slot blink pattern.  The pattern is
//! played over one blink interval (2.5 s by default), most significant
//! bit first: slot `i` is lit when bit `7 - i` is set.
//!
//! | State          | Code        | Pattern     |
//! |----------------|-------------|-------------|
//! | Off            | `Off`       | `0000_0000` |
//! | Sleep          | `Half`      | `1111_0000` |
//! | HeatingToBrew  | `Quarter`   | `1100_0000` |
//! | IdleBrew       | `Solid`     | `1111_1111` |
//! | HeatingToSteam | `Sixteenth` | `1000_1000` |
//! | IdleSteam      | `Eighth`    | `1000_0000` |
//! | CoolingDown    | `Trot`      | `1010_0000` |
//! | Error          | `Gallop`    | `1010_1000` |

use serde::Serialize;

use crate::fsm::MachineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusCode {
    Off,
    Solid,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    Trot,
    Gallop,
}

impl StatusCode {
    /// One code per state.
    pub const fn for_state(state: MachineState) -> Self {
        match state {
            MachineState::Off => Self::Off,
            MachineState::Sleep => Self::Half,
            MachineState::HeatingToBrew => Self::Quarter,
            MachineState::IdleBrew => Self::Solid,
            MachineState::HeatingToSteam => Self::Sixteenth,
            MachineState::IdleSteam => Self::Eighth,
            MachineState::CoolingDown => Self::Trot,
            MachineState::Error => Self::Gallop,
        }
    }

    /// 8-slot blink mask.
    pub const fn pattern(self) -> u8 {
        match self {
            Self::Off => 0x00,
            Self::Solid => 0xFF,
            Self::Half => 0xF0,
            Self::Quarter => 0xC0,
            Self::Eighth => 0x80,
            Self::Sixteenth => 0x88,
            Self::Trot => 0xA0,
            Self::Gallop => 0xA8,
        }
    }

    /// LED level at `now_ms` for a pattern period of `interval_ms`.
    pub fn level_at(self, now_ms: u32, interval_ms: u32) -> bool {
        let slot_ms = (interval_ms / 8).max(1);
        let slot = ((now_ms % interval_ms.max(8)) / slot_ms).min(7);
        self.pattern() & (0x80 >> slot) != 0
    }
}
