//! Push-button debounce and press classification.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up. The raw signal reaches
//! [`ButtonInput`] as a [`ButtonSample`] of edges seen since the last
//! poll, from one of two sources:
//!
//! - [`IsrButtonLatch`]: the GPIO any-edge ISR sets bits in an atomic,
//!   the main loop swaps them out once per poll.
//! - [`PolledButton`]: the main loop samples the pin level and turns
//!   level changes into edges.
//!
//! ## Classification
//!
//! | Held for            | Command     | When emitted            |
//! |---------------------|-------------|-------------------------|
//! | `< short`           | `Click`     | on release              |
//! | `short ..< long`    | `ShortHold` | while held, once        |
//! | `long ..< stuck`    | `LongHold`  | while held, once        |
//! | `>= stuck`          | `Error`     | while held, once        |
//!
//! Hold levels only move forward within one press, so the sequence of
//! commands emitted for a press is non-decreasing.

use core::sync::atomic::{AtomicU8, Ordering};

use embedded_hal::digital::InputPin;
use log::{debug, warn};

use crate::app::ports::ButtonPort;
use crate::config::MachineConfig;

/// Classified button command, delivered at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonCommand {
    #[default]
    Nothing,
    Click,
    ShortHold,
    LongHold,
    Error,
}

/// Edges observed since the previous poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonSample {
    pub pressed: bool,
    pub released: bool,
}

impl ButtonSample {
    pub const NONE: Self = Self {
        pressed: false,
        released: false,
    };
    pub const PRESS: Self = Self {
        pressed: true,
        released: false,
    };
    pub const RELEASE: Self = Self {
        pressed: false,
        released: true,
    };
    pub const CLICK: Self = Self {
        pressed: true,
        released: true,
    };
}

// ═══════════════════════════════════════════════════════════════
//  Debounce + classification
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum HoldLevel {
    None,
    Short,
    Long,
    Stuck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Held { since_ms: u32, level: HoldLevel },
}

pub struct ButtonInput {
    short_ms: u32,
    long_ms: u32,
    debounce_ms: u32,
    grace_ms: u32,
    stuck_ms: u32,
    armed: bool,
    phase: Phase,
    released_at: Option<u32>,
    pending: ButtonCommand,
}

impl ButtonInput {
    pub fn new(cfg: &MachineConfig) -> Self {
        Self {
            short_ms: cfg.short_hold_ms,
            long_ms: cfg.long_hold_ms,
            debounce_ms: cfg.debounce_ms,
            grace_ms: cfg.startup_grace_ms,
            stuck_ms: cfg.stuck_after_ms,
            armed: false,
            phase: Phase::Idle,
            released_at: None,
            pending: ButtonCommand::Nothing,
        }
    }

    /// Advance the state machine.  Call once per poll with the edges
    /// collected since the previous call.
    pub fn update(&mut self, now_ms: u32, sample: ButtonSample) {
        if !self.armed {
            if now_ms < self.grace_ms {
                return;
            }
            self.armed = true;
        }

        match self.phase {
            Phase::Idle => {
                if !sample.pressed {
                    return;
                }
                let settled = self
                    .released_at
                    .is_none_or(|at| now_ms.wrapping_sub(at) >= self.debounce_ms);
                if !settled {
                    debug!("Button: press within {}ms of release ignored", self.debounce_ms);
                    return;
                }
                if sample.released {
                    // Whole press happened between two polls.
                    self.released_at = Some(now_ms);
                    self.emit(ButtonCommand::Click);
                } else {
                    self.phase = Phase::Held {
                        since_ms: now_ms,
                        level: HoldLevel::None,
                    };
                }
            }

            Phase::Held { since_ms, level } => {
                if sample.released {
                    if level == HoldLevel::None {
                        self.emit(ButtonCommand::Click);
                    }
                    self.phase = Phase::Idle;
                    self.released_at = Some(now_ms);
                    return;
                }

                let held = now_ms.wrapping_sub(since_ms);
                let reached = self.level_for(held);
                if reached > level {
                    self.phase = Phase::Held {
                        since_ms,
                        level: reached,
                    };
                    match reached {
                        HoldLevel::Short => self.emit(ButtonCommand::ShortHold),
                        HoldLevel::Long => self.emit(ButtonCommand::LongHold),
                        HoldLevel::Stuck => {
                            warn!("Button: held for {}ms, contact stuck?", held);
                            self.emit(ButtonCommand::Error);
                        }
                        HoldLevel::None => {}
                    }
                }
            }
        }
    }

    /// Return the pending command and clear it.
    pub fn take_command(&mut self) -> ButtonCommand {
        core::mem::take(&mut self.pending)
    }

    /// True while a press is in progress.
    pub fn is_held(&self) -> bool {
        matches!(self.phase, Phase::Held { .. })
    }

    fn level_for(&self, held_ms: u32) -> HoldLevel {
        if held_ms >= self.stuck_ms {
            HoldLevel::Stuck
        } else if held_ms >= self.long_ms {
            HoldLevel::Long
        } else if held_ms >= self.short_ms {
            HoldLevel::Short
        } else {
            HoldLevel::None
        }
    }

    fn emit(&mut self, cmd: ButtonCommand) {
        debug!("Button: {:?}", cmd);
        self.pending = cmd;
    }
}

// ═══════════════════════════════════════════════════════════════
//  ISR edge latch
// ═══════════════════════════════════════════════════════════════

const EDGE_PRESSED: u8 = 0b01;
const EDGE_RELEASED: u8 = 0b10;

/// Single-producer / single-consumer edge latch shared with the GPIO ISR.
pub struct IsrButtonLatch {
    edges: AtomicU8,
}

/// The latch wired to the front-panel button ISR.
pub static BUTTON_LATCH: IsrButtonLatch = IsrButtonLatch::new();

impl IsrButtonLatch {
    pub const fn new() -> Self {
        Self {
            edges: AtomicU8::new(0),
        }
    }

    /// Record an edge.  Lock-free; safe in interrupt context.
    ///
    /// A press clears any earlier release so a release-then-press pair
    /// between two polls reads as a fresh press.
    pub fn record_edge(&self, pressed: bool) {
        if pressed {
            self.edges.store(EDGE_PRESSED, Ordering::Release);
        } else {
            self.edges.fetch_or(EDGE_RELEASED, Ordering::AcqRel);
        }
    }

    /// Take every edge recorded since the last call.
    pub fn take(&self) -> ButtonSample {
        let bits = self.edges.swap(0, Ordering::AcqRel);
        ButtonSample {
            pressed: bits & EDGE_PRESSED != 0,
            released: bits & EDGE_RELEASED != 0,
        }
    }
}

impl Default for IsrButtonLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonPort for &IsrButtonLatch {
    fn sample(&mut self) -> ButtonSample {
        self.take()
    }
}

/// ISR handler.  Register on the button GPIO, any edge.
/// `level_low` is the pin level read inside the ISR (active-low).
pub fn button_isr_handler(level_low: bool) {
    BUTTON_LATCH.record_edge(level_low);
}

// ═══════════════════════════════════════════════════════════════
//  Polled pin source
// ═══════════════════════════════════════════════════════════════

/// Level-sampled button on an active-low input pin.
pub struct PolledButton<P> {
    pin: P,
    was_pressed: bool,
}

impl<P: InputPin> PolledButton<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            was_pressed: false,
        }
    }
}

impl<P: InputPin> ButtonPort for PolledButton<P> {
    fn sample(&mut self) -> ButtonSample {
        let pressed = match self.pin.is_low() {
            Ok(level) => level,
            Err(e) => {
                warn!("Button: pin read failed: {:?}", e);
                return ButtonSample::NONE;
            }
        };
        let sample = ButtonSample {
            pressed: pressed && !self.was_pressed,
            released: !pressed && self.was_pressed,
        };
        self.was_pressed = pressed;
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ButtonInput {
        ButtonInput::new(&MachineConfig::default())
    }

    /// Drive a full press of `held_ms` starting at `t0`, polling every 10ms.
    fn press_for(btn: &mut ButtonInput, t0: u32, held_ms: u32) -> Vec<ButtonCommand> {
        let mut out = Vec::new();
        btn.update(t0, ButtonSample::PRESS);
        let mut t = t0;
        while t < t0 + held_ms {
            t += 10;
            btn.update(t, ButtonSample::NONE);
            let c = btn.take_command();
            if c != ButtonCommand::Nothing {
                out.push(c);
            }
        }
        btn.update(t0 + held_ms, ButtonSample::RELEASE);
        let c = btn.take_command();
        if c != ButtonCommand::Nothing {
            out.push(c);
        }
        out
    }

    #[test]
    fn no_events_without_press() {
        let mut btn = input();
        btn.update(2000, ButtonSample::NONE);
        assert_eq!(btn.take_command(), ButtonCommand::Nothing);
    }

    #[test]
    fn short_release_is_click() {
        let mut btn = input();
        assert_eq!(press_for(&mut btn, 2000, 300), vec![ButtonCommand::Click]);
    }

    #[test]
    fn hold_past_short_is_short_hold_only() {
        let mut btn = input();
        assert_eq!(
            press_for(&mut btn, 2000, 3000),
            vec![ButtonCommand::ShortHold]
        );
    }

    #[test]
    fn hold_past_long_emits_short_then_long() {
        let mut btn = input();
        assert_eq!(
            press_for(&mut btn, 2000, 6000),
            vec![ButtonCommand::ShortHold, ButtonCommand::LongHold]
        );
    }

    #[test]
    fn slow_poll_jumps_straight_to_long() {
        let mut btn = input();
        btn.update(2000, ButtonSample::PRESS);
        btn.update(7500, ButtonSample::NONE);
        assert_eq!(btn.take_command(), ButtonCommand::LongHold);
        btn.update(7600, ButtonSample::RELEASE);
        assert_eq!(btn.take_command(), ButtonCommand::Nothing);
    }

    #[test]
    fn command_delivered_once() {
        let mut btn = input();
        btn.update(2000, ButtonSample::CLICK);
        assert_eq!(btn.take_command(), ButtonCommand::Click);
        assert_eq!(btn.take_command(), ButtonCommand::Nothing);
    }

    #[test]
    fn presses_ignored_during_startup_grace() {
        let mut btn = input();
        btn.update(500, ButtonSample::PRESS);
        btn.update(600, ButtonSample::RELEASE);
        assert_eq!(btn.take_command(), ButtonCommand::Nothing);
        assert!(!btn.is_held());
    }

    #[test]
    fn bounce_after_release_is_ignored() {
        let mut btn = input();
        press_for(&mut btn, 2000, 200);
        btn.update(2220, ButtonSample::PRESS);
        assert!(!btn.is_held());
        btn.update(2260, ButtonSample::PRESS);
        assert!(btn.is_held());
    }

    #[test]
    fn stuck_contact_reports_error_once() {
        let mut btn = input();
        btn.update(2000, ButtonSample::PRESS);
        btn.update(40_000, ButtonSample::NONE);
        assert_eq!(btn.take_command(), ButtonCommand::Error);
        btn.update(50_000, ButtonSample::NONE);
        assert_eq!(btn.take_command(), ButtonCommand::Nothing);
    }

    #[test]
    fn isr_latch_coalesces_edges() {
        let latch = IsrButtonLatch::new();
        latch.record_edge(true);
        latch.record_edge(false);
        assert_eq!(latch.take(), ButtonSample::CLICK);
        assert_eq!(latch.take(), ButtonSample::NONE);

        // Release then press reads as a fresh press.
        latch.record_edge(false);
        latch.record_edge(true);
        assert_eq!(latch.take(), ButtonSample::PRESS);
    }

    struct FakePin {
        low: bool,
    }

    impl embedded_hal::digital::ErrorType for FakePin {
        type Error = core::convert::Infallible;
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.low)
        }
        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(self.low)
        }
    }

    #[test]
    fn polled_button_converts_levels_to_edges() {
        let mut btn = PolledButton::new(FakePin { low: false });
        assert_eq!(btn.sample(), ButtonSample::NONE);
        btn.pin.low = true;
        assert_eq!(btn.sample(), ButtonSample::PRESS);
        assert_eq!(btn.sample(), ButtonSample::NONE);
        btn.pin.low = false;
        assert_eq!(btn.sample(), ButtonSample::RELEASE);
    }
}
