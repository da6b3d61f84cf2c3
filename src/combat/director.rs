//! Combat Director
//!
//! Tracks the Idle/Combat mood and drives the music cues. Entering
//! Combat plays the buildup immediately and queues the loop behind it;
//! entering Idle cuts to the ambient theme. State changes are idempotent
//! unless forced, so re-entering the current state emits nothing.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::combat::events::{CombatEvent, Theme};
use crate::combat::world::ScheduledAction;
use crate::core::timer::{TimerHandle, TimerWheel};

/// Ticks from level start until combat auto-escalates (10 s at 60 Hz).
pub const AUTO_ESCALATE_TICKS: u32 = 600;

/// Director mood.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DirectorState {
    /// Exploration: ambient music, no pressure.
    #[default]
    Idle = 0,
    /// Combat: buildup then loop.
    Combat = 1,
}

/// The level mood controller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CombatDirector {
    state: DirectorState,
    escalation_timer: Option<TimerHandle>,
}

impl Default for CombatDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatDirector {
    /// Create a director in the Idle mood.
    pub fn new() -> Self {
        Self {
            state: DirectorState::Idle,
            escalation_timer: None,
        }
    }

    /// Current mood.
    pub fn state(&self) -> DirectorState {
        self.state
    }

    /// Level start: force the Idle mood (so the ambient cue always plays)
    /// and arm the escalation timer.
    ///
    /// TODO: the fixed timer stands in for a stage trigger; wire the
    /// elevator arrival through [`CombatDirector::cancel_auto_escalation`]
    /// once stage scripting lands.
    pub fn start(
        &mut self,
        tick: u32,
        timers: &mut TimerWheel<ScheduledAction>,
        events: &mut Vec<CombatEvent>,
    ) {
        self.apply_state(DirectorState::Idle, tick, events);
        self.escalation_timer = Some(timers.schedule_after(
            tick,
            AUTO_ESCALATE_TICKS,
            ScheduledAction::EscalateCombat,
        ));
    }

    /// Change the mood. No-op when already in `state` unless `force`.
    pub fn set_state(
        &mut self,
        state: DirectorState,
        force: bool,
        tick: u32,
        events: &mut Vec<CombatEvent>,
    ) {
        if !force && state == self.state {
            return;
        }
        self.apply_state(state, tick, events);
    }

    /// Disarm the pending auto-escalation, if any.
    pub fn cancel_auto_escalation(&mut self, timers: &mut TimerWheel<ScheduledAction>) {
        if let Some(handle) = self.escalation_timer.take() {
            timers.cancel(handle);
        }
    }

    fn apply_state(&mut self, state: DirectorState, tick: u32, events: &mut Vec<CombatEvent>) {
        self.state = state;
        info!(state = ?state, tick, "director mood change");
        match state {
            DirectorState::Idle => {
                events.push(CombatEvent::music(tick, Theme::Idle, false));
            }
            DirectorState::Combat => {
                self.escalation_timer = None;
                events.push(CombatEvent::music(tick, Theme::CombatBuildup, false));
                events.push(CombatEvent::music(tick, Theme::CombatLoop, true));
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
