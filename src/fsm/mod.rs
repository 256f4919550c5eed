//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌────────────┬───────────┬──────────┬───────────────────┐   │
//! │  │ StateId    │ on_enter  │ on_exit  │ on_update         │   │
//! │  ├────────────┼───────────┼──────────┼───────────────────┤   │
//! │  │ Menu       │ fn(ctx)   │    —     │ fn(ctx)->Option<> │   │
//! │  │ Scan       │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │   │
//! │  │ ShowCount  │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │   │
//! │  │ ResetFlash │    —      │    —     │ fn(ctx)->Option<> │   │
//! │  └────────────┴───────────┴──────────┴───────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(event)`, the pure [`next_state`] function decides
//! where the event leads.  When that differs from the current state the
//! engine runs `on_exit` for the current state, then `on_enter` for the
//! next, and updates the current pointer.  All functions receive the same
//! `&mut` context (see [`context::FsmContext`]).

pub mod context;
pub mod states;

use log::{info, warn};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all application states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Menu = 0,
    Scan = 1,
    ShowCount = 2,
    ResetFlash = 3,
}

impl StateId {
    /// Total number of states: used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `StateId`.  Out-of-range indices fall back
    /// to `Menu`, the only state that holds no resources.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Menu,
            1 => Self::Scan,
            2 => Self::ShowCount,
            3 => Self::ResetFlash,
            _ => {
                warn!("invalid state index {}, falling back to Menu", idx);
                Self::Menu
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Operator selection from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    StartScan,
    ShowCount,
    ResetFlash,
}

impl MenuChoice {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'1' => Some(Self::StartScan),
            b'2' => Some(Self::ShowCount),
            b'3' => Some(Self::ResetFlash),
            _ => None,
        }
    }
}

/// Why a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// Hardware button (abort flag).
    Button,
    /// `q` / `Q` typed on the console.
    Console,
}

/// Outcome reported by an `on_update` handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    MenuSelected(MenuChoice),
    InvalidChoice,
    ScanStopped(StopCause),
    SensorUnavailable,
    BlinkFinished,
    CounterUnreadable,
    ResetFinished,
}

/// The transition function.  Events that make no sense in `state` leave
/// it unchanged.
pub fn next_state(state: StateId, event: Event) -> StateId {
    use StateId::{Menu, ResetFlash, Scan, ShowCount};

    match (state, event) {
        (Menu, Event::MenuSelected(MenuChoice::StartScan)) => Scan,
        (Menu, Event::MenuSelected(MenuChoice::ShowCount)) => ShowCount,
        (Menu, Event::MenuSelected(MenuChoice::ResetFlash)) => ResetFlash,
        (Scan, Event::ScanStopped(_) | Event::SensorUnavailable) => Menu,
        (ShowCount, Event::BlinkFinished | Event::CounterUnreadable) => Menu,
        (ResetFlash, Event::ResetFinished) => Menu,
        (s, _) => s,
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn<C> = fn(&mut C);

/// Signature for the per-tick update handler.
/// Returns `Some(event)` when something happened, or `None` to stay.
pub type StateUpdateFn<C> = fn(&mut C) -> Option<Event>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor<C> {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn<C>>,
    pub on_exit: Option<StateActionFn<C>>,
    pub on_update: StateUpdateFn<C>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]); the context is
/// threaded through every handler call by the owner.
pub struct Fsm<C> {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor<C>; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Monotonically increasing tick counter.
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl<C> Fsm<C> {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor<C>; StateId::COUNT], initial: StateId) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, d)| d.id as usize == i),
            "state table out of order"
        );
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut C) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(event)`, map it through [`next_state`] and,
    ///    if the state changes, run `on_exit(current)` → update pointer →
    ///    `on_enter(next)`.
    /// 3. Return the event for the caller's diagnostics.
    pub fn tick(&mut self, ctx: &mut C) -> Option<Event> {
        self.tick_count += 1;

        let event = (self.table[self.current].on_update)(ctx)?;
        let next = next_state(self.current_state(), event);
        if next as usize != self.current {
            self.transition(next, ctx);
        }
        Some(event)
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// How many ticks the FSM has been in the current state.
    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut C) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.state_entry_tick = self.tick_count;

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
