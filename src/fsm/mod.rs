//! Function-pointer finite state machine engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                      │
//! │  ┌────────────────┬───────────┬──────────┬─────────────────────┐ │
//! │  │ MachineState   │ on_enter  │ on_exit  │ on_event            │ │
//! │  ├────────────────┼───────────┼──────────┼─────────────────────┤ │
//! │  │ Off            │ fn(ctx)   │ —        │ fn(ctx,ev)->Option  │ │
//! │  │ Sleep          │ fn(ctx)   │ —        │ fn(ctx,ev)->Option  │ │
//! │  │ HeatingToBrew  │ fn(ctx)   │ —        │ fn(ctx,ev)->Option  │ │
//! │  │ IdleBrew       │ fn(ctx)   │ —        │ fn(ctx,ev)->Option  │ │
//! │  │ HeatingToSteam │ fn(ctx)   │ —        │ fn(ctx,ev)->Option  │ │
//! │  │ IdleSteam      │ fn(ctx)   │ —        │ fn(ctx,ev)->Option  │ │
//! │  │ CoolingDown    │ fn(ctx)   │ —        │ fn(ctx,ev)->Option  │ │
//! │  │ Error          │ fn(ctx)   │ fn(ctx)  │ fn(ctx,ev)->Option  │ │
//! │  └────────────────┴───────────┴──────────┴─────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The machine is event driven: the controller turns each poll's inputs
//! into [`MachineEvent`]s and feeds them to [`Fsm::dispatch`] one at a
//! time.  If the current state's `on_event` returns `Some(next)`, the
//! engine runs `on_exit` for the current state, then `on_enter` for the
//! next.  All functions receive `&mut FsmContext`, which holds the
//! configuration, latest temperature, and heater/pump requests.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every state the machine can be in.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MachineState {
    Off = 0,
    Sleep = 1,
    HeatingToBrew = 2,
    IdleBrew = 3,
    HeatingToSteam = 4,
    IdleSteam = 5,
    CoolingDown = 6,
    Error = 7,
}

impl MachineState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 8;

    /// Convert an index back to `MachineState`.  Asserts in debug builds;
    /// returns `Error` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Off,
            1 => Self::Sleep,
            2 => Self::HeatingToBrew,
            3 => Self::IdleBrew,
            4 => Self::HeatingToSteam,
            5 => Self::IdleSteam,
            6 => Self::CoolingDown,
            7 => Self::Error,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Error
            }
        }
    }

    /// The machine counts as "turned on" in every state except these.
    pub fn is_on(self) -> bool {
        !matches!(self, Self::Off | Self::Sleep | Self::Error)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Inputs that can move the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineEvent {
    /// Short press released before the short-hold threshold.
    Click,
    ShortHold,
    LongHold,
    /// The button input reported a malformed or stuck press.
    ButtonError,
    /// Remote "turn on" command.
    TurnOn,
    /// Remote "turn off" command.
    TurnOff,
    /// The daily schedule wants the machine on.
    ScheduleOn,
    /// The daily schedule or the off deadline wants the machine off.
    ScheduleOff,
    /// The boiler is within the band of the current setpoint.
    TemperatureReady,
    /// The safety supervisor raised faults (bitmask).
    Fault(u8),
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the event handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateEventFn = fn(&mut FsmContext, MachineEvent) -> Option<MachineState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: MachineState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_event: StateEventFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// A transition that happened during dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: MachineState,
    pub to: MachineState,
}

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `MachineState as usize`.
    table: [StateDescriptor; MachineState::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Number of transitions since start.
    transitions: u32,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; MachineState::COUNT], initial: MachineState) -> Self {
        Self {
            table,
            current: initial as usize,
            transitions: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `dispatch()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Feed one event to the current state.
    pub fn dispatch(&mut self, event: MachineEvent, ctx: &mut FsmContext) -> Option<Transition> {
        let next = (self.table[self.current].on_event)(ctx, event)?;
        self.force_transition(next, ctx)
    }

    /// Jump straight to `next`, running exit/enter actions.  No-op if
    /// `next` is already current.
    pub fn force_transition(
        &mut self,
        next: MachineState,
        ctx: &mut FsmContext,
    ) -> Option<Transition> {
        if next as usize == self.current {
            return None;
        }
        let from = self.current_state();
        self.transition(next, ctx);
        Some(Transition { from, to: next })
    }

    /// The current state's identity.
    pub fn current_state(&self) -> MachineState {
        MachineState::from_index(self.current)
    }

    /// Transitions executed since start.
    pub fn transition_count(&self) -> u32 {
        self.transitions
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: MachineState, ctx: &mut FsmContext) {
        let next_idx = next as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.transitions = self.transitions.wrapping_add(1);

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
