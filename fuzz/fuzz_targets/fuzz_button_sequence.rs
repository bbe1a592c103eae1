//! Fuzz target: `ButtonInput` classification
//!
//! Each input byte pair is `(edges, dt)`: the low two bits of `edges`
//! select press/release, `dt` advances the clock in 64 ms steps.
//! Verifies that hold commands within one press never step backwards.
//!
//! cargo fuzz run fuzz_button_sequence

#![no_main]

use libfuzzer_sys::fuzz_target;
use vbm::config::MachineConfig;
use vbm::drivers::button::{ButtonCommand, ButtonInput, ButtonSample};

fuzz_target!(|data: &[u8]| {
    let cfg = MachineConfig::default();
    let mut button = ButtonInput::new(&cfg);
    let mut now: u32 = 0;
    let mut rank = 0u8;

    for pair in data.chunks_exact(2) {
        let sample = ButtonSample {
            pressed: pair[0] & 0b01 != 0,
            released: pair[0] & 0b10 != 0,
        };
        now = now.wrapping_add(u32::from(pair[1]) * 64);
        button.update(now, sample);

        let next = match button.take_command() {
            ButtonCommand::ShortHold => Some(1),
            ButtonCommand::LongHold => Some(2),
            ButtonCommand::Error => Some(3),
            ButtonCommand::Click => {
                assert_eq!(rank, 0, "click after a hold");
                None
            }
            ButtonCommand::Nothing => None,
        };
        if let Some(next) = next {
            assert!(next > rank, "hold level went from {rank} to {next}");
            rank = next;
        }
        if sample.released {
            rank = 0;
        }
    }
});
