//! Daily on/off timer.
//!
//! Turns the machine on at a configured minute of the day on selected
//! weekdays, off again at a later minute, and supports a one-shot
//! "turn off in N minutes" deadline.  The scheduler only *decides*; the
//! controller reads [`DailyScheduler::has_changed`] and
//! [`DailyScheduler::state`] each poll and acts on them.
//!
//! ```text
//!   WallTime ──▶ DailyScheduler.update() ──▶ has_changed()? ──▶ state()
//!                   │                                             │
//!                   ├─ day latch (on-timer fires once per day)    ▼
//!                   ├─ daily off-timer (only if off > on)   MachineController
//!                   └─ one-shot off deadline
//! ```

use chrono::{DateTime, Datelike, Timelike};
use log::{info, warn};

use crate::config::MINUTES_PER_DAY;

// ═══════════════════════════════════════════════════════════════
//  Wall-clock time
// ═══════════════════════════════════════════════════════════════

/// Calendar view of the current time, as the scheduler needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    /// Seconds since the unix epoch.
    pub unix_secs: i64,
    /// Day of week, 0 = Sunday … 6 = Saturday.
    pub weekday: u8,
    /// Minutes since midnight, `0..1440`.
    pub minute_of_day: u16,
}

impl WallTime {
    /// Break a unix timestamp down into weekday and minute of day.
    /// Returns `None` for timestamps chrono cannot represent.
    pub fn from_unix(unix_secs: i64) -> Option<Self> {
        let dt = DateTime::from_timestamp(unix_secs, 0)?;
        Some(Self {
            unix_secs,
            weekday: dt.weekday().num_days_from_sunday() as u8,
            minute_of_day: (dt.hour() * 60 + dt.minute()) as u16,
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// What the schedule currently asks of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    On,
    Off,
}

/// Configured schedule.  Times are minutes from midnight; 0 means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleConfig {
    /// Bit 0 = Sunday … bit 6 = Saturday.
    pub days_mask: u8,
    pub turn_on_at: u16,
    pub turn_off_at: u16,
    /// Absolute unix time of the one-shot off deadline.
    pub off_deadline: Option<i64>,
}

impl ScheduleConfig {
    fn day_enabled(&self, weekday: u8) -> bool {
        weekday < 7 && self.days_mask & (1 << weekday) != 0
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

pub struct DailyScheduler {
    config: ScheduleConfig,
    state: ScheduleState,
    /// Weekday on which the on-timer last fired.
    latched_day: Option<u8>,
    changed: bool,
    /// Suppresses repeated warnings about an off-time that is not after the on-time.
    misorder_warned: bool,
}

impl Default for DailyScheduler {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl DailyScheduler {
    pub fn new(days_mask: u8, turn_on_at: u16, turn_off_at: u16) -> Self {
        Self {
            config: ScheduleConfig {
                days_mask: days_mask & 0x7F,
                turn_on_at: normalize_minute(turn_on_at),
                turn_off_at: normalize_minute(turn_off_at),
                off_deadline: None,
            },
            state: ScheduleState::Off,
            latched_day: None,
            changed: false,
            misorder_warned: false,
        }
    }

    /// Re-evaluate the schedule for `now`.  Call once per poll.
    pub fn update(&mut self, now: &WallTime) {
        // 1. New day: the on-timer may fire again.
        if self.latched_day.is_some_and(|d| d != now.weekday) {
            self.latched_day = None;
        }

        let cfg = self.config;
        let today = cfg.day_enabled(now.weekday);

        // 2. Daily off-timer, honoured only when it comes after the on-time.
        let off_due = cfg.turn_off_at != 0 && today && now.minute_of_day >= cfg.turn_off_at;
        let would_turn_off = off_due && cfg.turn_off_at > cfg.turn_on_at;
        if off_due && !would_turn_off && !self.misorder_warned {
            warn!(
                "Scheduler: off-time {} is not after on-time {}, ignoring off-timer",
                cfg.turn_off_at, cfg.turn_on_at
            );
            self.misorder_warned = true;
        }

        // 3. Daily on-timer.
        if self.latched_day.is_none()
            && self.state != ScheduleState::On
            && cfg.turn_on_at != 0
            && today
            && now.minute_of_day >= cfg.turn_on_at
            && !would_turn_off
        {
            info!("Scheduler: on-timer fired at minute {}", now.minute_of_day);
            self.set_state(ScheduleState::On);
            self.latched_day = Some(now.weekday);
        }

        // 4. One-shot deadline.  Always reported, even if already off, so a
        //    manually started machine still shuts down.
        if let Some(deadline) = cfg.off_deadline {
            if now.unix_secs >= deadline {
                info!("Scheduler: off deadline reached");
                self.config.off_deadline = None;
                self.state = ScheduleState::Off;
                self.changed = true;
            }
        }

        // 5. Daily off-timer.
        if would_turn_off && self.state != ScheduleState::Off {
            info!("Scheduler: off-timer fired at minute {}", now.minute_of_day);
            self.set_state(ScheduleState::Off);
        }
    }

    /// True once after a schedule action fired; reading clears it.
    pub fn has_changed(&mut self) -> bool {
        core::mem::take(&mut self.changed)
    }

    pub fn state(&self) -> ScheduleState {
        self.state
    }

    pub fn config(&self) -> ScheduleConfig {
        self.config
    }

    // ── Configuration ─────────────────────────────────────────

    pub fn set_days(&mut self, days_mask: u8) {
        self.config.days_mask = days_mask & 0x7F;
        self.reconfigured();
    }

    pub fn set_turn_on_at(&mut self, minute: u16) {
        self.config.turn_on_at = normalize_minute(minute);
        self.reconfigured();
    }

    pub fn set_turn_off_at(&mut self, minute: u16) {
        self.config.turn_off_at = normalize_minute(minute);
        self.reconfigured();
    }

    /// Arm the one-shot deadline `minutes` from `now_unix`.  Zero clears it.
    pub fn turn_off_in(&mut self, minutes: u32, now_unix: i64) {
        if minutes == 0 {
            self.clear_off_deadline();
            return;
        }
        let deadline = now_unix.saturating_add(i64::from(minutes) * 60);
        info!("Scheduler: turning off in {} min (at {})", minutes, deadline);
        self.config.off_deadline = Some(deadline);
    }

    pub fn clear_off_deadline(&mut self) {
        self.config.off_deadline = None;
    }

    // ── Internal ──────────────────────────────────────────────

    fn set_state(&mut self, state: ScheduleState) {
        self.state = state;
        self.changed = true;
    }

    /// Any edit re-arms the on-timer and drops the schedule's claim on
    /// the machine without reporting a change.
    fn reconfigured(&mut self) {
        self.latched_day = None;
        self.state = ScheduleState::Off;
        self.misorder_warned = false;
    }
}

/// Wrap an out-of-range minute into the day.
fn normalize_minute(minute: u16) -> u16 {
    if minute >= MINUTES_PER_DAY {
        warn!("Scheduler: minute {} out of range, wrapping", minute);
        minute % MINUTES_PER_DAY
    } else {
        minute
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
