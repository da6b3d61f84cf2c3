//! Letter-Depletion Health
//!
//! A health track is a word: each accepted hit consumes the next pending
//! letter, and damage is only accepted when the incoming letter matches it
//! (unless the track ignores letters or the packet forces a match). A
//! transient "recently damaged" window keeps just-consumed letters visually
//! distinct before they settle into the consumed zone.
//!
//! The resolver never faults: mismatches and hits on dead tracks are
//! rejected (`false`), not errors.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combat::events::{CombatEvent, CombatEventData};
use crate::combat::world::ScheduledAction;
use crate::core::id::EntityId;
use crate::core::timer::{TimerHandle, TimerWheel};

/// Ticks a just-consumed letter stays in the recently-damaged zone (0.5 s).
pub const RECENT_DAMAGE_HOLD_TICKS: u32 = 30;

/// Ticks after the recent-damage window drains before the text hides (0.5 s).
pub const TEXT_SETTLE_DELAY_TICKS: u32 = 30;

/// One hit attempt. Immutable; built once per resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamagePacket {
    /// Who dealt the hit.
    pub instigator: EntityId,
    /// The incoming letter.
    pub letter: char,
    /// Accept regardless of the pending letter.
    pub force_letter_match: bool,
}

/// Visual zone of a single letter in the track display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LetterZone {
    /// Already consumed and settled (dimmed).
    Consumed,
    /// Consumed within the recent-damage window (highlighted).
    RecentlyDamaged,
    /// Not yet consumed (default).
    Pending,
}

/// A damageable entity's letter sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthTrack {
    id: EntityId,
    letters: Vec<char>,
    remaining: usize,
    recently_damaged: usize,
    text_visible: bool,

    /// Case-fold comparisons (and stored letters) to uppercase.
    pub force_caps: bool,
    /// Accept any letter: identity is ignored.
    pub ignore_letters: bool,
    /// Track text never hides.
    pub always_visible: bool,
    /// Excluded from reticle targeting/highlighting.
    pub untargetable: bool,
    /// Delay before a dead entity is removed from the world.
    /// None = never auto-remove.
    pub removal_delay_ticks: Option<u32>,

    /// Handles for this track's pending decay/settle timers,
    /// cancelled wholesale on reset.
    pending_timers: Vec<TimerHandle>,
}

impl HealthTrack {
    /// Create a track over `letters` at full health.
    pub fn new(id: EntityId, letters: &str) -> Self {
        let mut track = Self {
            id,
            letters: Vec::new(),
            remaining: 0,
            recently_damaged: 0,
            text_visible: false,
            force_caps: true,
            ignore_letters: false,
            always_visible: false,
            untargetable: false,
            removal_delay_ticks: Some(6),
            pending_timers: Vec::new(),
        };
        track.reset_letters(letters);
        track
    }

    /// The owning entity.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The full letter sequence.
    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    /// Letters still pending.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Size of the recent-damage window.
    pub fn recently_damaged(&self) -> usize {
        self.recently_damaged
    }

    /// A track is alive while any letter is pending.
    pub fn is_alive(&self) -> bool {
        self.remaining > 0
    }

    /// Whether the floating text is currently shown.
    pub fn is_text_visible(&self) -> bool {
        self.text_visible
    }

    /// The letter the next accepted hit would consume, if any.
    pub fn next_pending_letter(&self) -> Option<char> {
        self.letters.get(self.letters.len() - self.remaining).copied()
    }

    // -------------------------------------------------------------------------
    // Damage resolution
    // -------------------------------------------------------------------------

    /// Resolve one hit attempt. Returns true when the damage was accepted.
    ///
    /// Resolution order: dead tracks reject; non-letter fillers at the
    /// pending position are skipped without consuming the hit; case folding
    /// applies when `force_caps`; `ignore_letters` or the packet's force
    /// flag auto-match; otherwise the letters must be equal. Acceptance
    /// consumes the letter plus any trailing fillers, opens the
    /// recent-damage window, and fires the death event when the track
    /// empties. A track whose pending tail is all fillers dies without
    /// consuming the hit.
    pub fn take_damage(
        &mut self,
        packet: &DamagePacket,
        tick: u32,
        timers: &mut TimerWheel<ScheduledAction>,
        events: &mut Vec<CombatEvent>,
    ) -> bool {
        if self.remaining == 0 {
            return false;
        }

        // Fillers are never damage targets
        self.skip_pending_fillers();
        if self.remaining == 0 {
            events.push(CombatEvent::death(tick, self.id, packet.instigator));
            return false;
        }
        let Some(mut next_letter) = self.next_pending_letter() else {
            return false;
        };

        let mut incoming = packet.letter;
        if self.force_caps {
            incoming = incoming.to_ascii_uppercase();
            next_letter = next_letter.to_ascii_uppercase();
        }
        if self.ignore_letters || packet.force_letter_match {
            incoming = next_letter;
        }
        if incoming != next_letter {
            return false;
        }

        self.remaining -= 1;
        // A trailing-filler tail must not leave the track dead-but-pending
        self.skip_pending_fillers();
        self.recently_damaged += 1;
        let handle = timers.schedule_after(
            tick,
            RECENT_DAMAGE_HOLD_TICKS,
            ScheduledAction::RecentDamageDecay { entity: self.id },
        );
        self.pending_timers.push(handle);
        self.show_text(tick, events);

        debug!(
            entity = %self.id.short(),
            letter = %incoming,
            remaining = self.remaining,
            "took damage"
        );
        events.push(CombatEvent::damage(tick, self.id, incoming, self.remaining));
        if self.remaining == 0 {
            events.push(CombatEvent::death(tick, self.id, packet.instigator));
        }
        true
    }

    fn pending_is_letter(&self) -> bool {
        self.next_pending_letter()
            .is_some_and(|c| c.is_alphabetic())
    }

    fn skip_pending_fillers(&mut self) {
        while self.remaining > 0 && !self.pending_is_letter() {
            self.remaining -= 1;
        }
    }

    // -------------------------------------------------------------------------
    // Timed effects (driven by the world's timer drain)
    // -------------------------------------------------------------------------

    /// A recent-damage hold elapsed: shrink the window and, once drained,
    /// arm the text-settle timer.
    pub fn on_recent_damage_decay(&mut self, tick: u32, timers: &mut TimerWheel<ScheduledAction>) {
        self.recently_damaged = self.recently_damaged.saturating_sub(1);
        if self.recently_damaged == 0 && !self.always_visible {
            let handle = timers.schedule_after(
                tick,
                TEXT_SETTLE_DELAY_TICKS,
                ScheduledAction::TextSettle { entity: self.id },
            );
            self.pending_timers.push(handle);
        }
    }

    /// The settle delay elapsed: hide the text unless damage re-opened the
    /// window in the meantime.
    pub fn on_text_settle(&mut self, tick: u32, events: &mut Vec<CombatEvent>) {
        if self.recently_damaged == 0 && !self.always_visible && self.text_visible {
            self.text_visible = false;
            events.push(CombatEvent::new(
                tick,
                CombatEventData::HealthTextVisible {
                    entity: self.id,
                    visible: false,
                },
            ));
        }
    }

    fn show_text(&mut self, tick: u32, events: &mut Vec<CombatEvent>) {
        if !self.text_visible {
            self.text_visible = true;
            events.push(CombatEvent::new(
                tick,
                CombatEventData::HealthTextVisible {
                    entity: self.id,
                    visible: true,
                },
            ));
        }
    }

    // -------------------------------------------------------------------------
    // Reset
    // -------------------------------------------------------------------------

    /// Replace the letter sequence and reset to full health.
    ///
    /// Filters to letters and whitespace, cancels every pending decay and
    /// settle timer this track owns, and clears the recent-damage window.
    pub fn set_letters(
        &mut self,
        letters: &str,
        tick: u32,
        timers: &mut TimerWheel<ScheduledAction>,
        events: &mut Vec<CombatEvent>,
    ) {
        timers.cancel_all(&self.pending_timers);
        self.pending_timers.clear();
        self.reset_letters(letters);

        let visible = self.always_visible;
        if self.text_visible != visible {
            self.text_visible = visible;
        }
        events.push(CombatEvent::new(
            tick,
            CombatEventData::HealthTextVisible {
                entity: self.id,
                visible,
            },
        ));
    }

    fn reset_letters(&mut self, letters: &str) {
        self.letters = letters
            .chars()
            .filter(|c| c.is_alphabetic() || c.is_whitespace())
            .map(|c| {
                if self.force_caps {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect();
        self.remaining = self.letters.len();
        self.recently_damaged = 0;
        self.text_visible = self.always_visible;
    }

    // -------------------------------------------------------------------------
    // Display
    // -------------------------------------------------------------------------

    /// Zone each letter into consumed / recently-damaged / pending for the
    /// display collaborator.
    pub fn display_spans(&self) -> Vec<(LetterZone, char)> {
        let next_index = self.letters.len() - self.remaining;
        let settled = next_index.saturating_sub(self.recently_damaged);
        self.letters
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let zone = if i < settled {
                    LetterZone::Consumed
                } else if i < next_index {
                    LetterZone::RecentlyDamaged
                } else {
                    LetterZone::Pending
                };
                (zone, c)
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
