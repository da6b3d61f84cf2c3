//! Gun Control
//!
//! The typing gun: a four-state raise/lower machine, a letter magazine,
//! and the reload typing minigame. Firing pops the front letter; reloading
//! appends typed letters until the display slots are full, with a
//! key-repeat rule for the delete key.
//!
//! Raise/lower completion is animation-driven on the engine side, so the
//! transient Raising/Lowering states resolve only when the collaborator
//! calls [`Gun::on_raise_complete`] / [`Gun::on_lower_complete`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::combat::events::{CombatEvent, CombatEventData};

/// Default delete key-repeat delay (0.5 s at 60 Hz).
pub const DELETE_REPEAT_DELAY_TICKS: u32 = 30;

/// Default delete key-repeat rate (0.3 s at 60 Hz).
pub const DELETE_REPEAT_RATE_TICKS: u32 = 18;

/// Gun readiness state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum GunState {
    /// Holstered, crosshair hidden
    #[default]
    Down = 0,
    /// Transitioning up (animation in flight)
    Raising = 1,
    /// Ready: fire and reload permitted
    Up = 2,
    /// Transitioning down (animation in flight)
    Lowering = 3,
}

/// Configuration invariant violation, reported once at init.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Initial loadout does not fit the display slots.
    #[error("initial ammo holds {loaded} letters but the display has {slots} slots")]
    CapacityMismatch {
        /// Letters in the configured loadout
        loaded: usize,
        /// Configured display slot count
        slots: usize,
    },
}

/// Gun tunables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GunConfig {
    /// Word loaded at equip time.
    pub initial_ammo: String,
    /// Fixed-width ammo display slot count; also the magazine capacity.
    pub display_slots: usize,
    /// Glyph shown in unloaded display slots.
    pub empty_slot_char: char,
    /// Ticks between the first deletion and the first repeat.
    pub delete_repeat_delay: u32,
    /// Ticks between repeats while delete stays held.
    pub delete_repeat_rate: u32,
}

impl Default for GunConfig {
    fn default() -> Self {
        Self {
            initial_ammo: "PUNCTUATOR".to_string(),
            display_slots: 10,
            empty_slot_char: ' ',
            delete_repeat_delay: DELETE_REPEAT_DELAY_TICKS,
            delete_repeat_rate: DELETE_REPEAT_RATE_TICKS,
        }
    }
}

impl GunConfig {
    /// Check the capacity invariant: the initial loadout must fit the
    /// display slots (the slot count is the magazine capacity).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let loaded = self
            .initial_ammo
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .count();
        if loaded > self.display_slots {
            return Err(ConfigError::CapacityMismatch {
                loaded,
                slots: self.display_slots,
            });
        }
        Ok(())
    }
}

// =============================================================================
// AMMO MAGAZINE
// =============================================================================

/// Ordered letter magazine. Front = next fired, back = most recently typed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AmmoMagazine {
    capacity: usize,
    loaded: VecDeque<char>,
}

impl AmmoMagazine {
    /// Create an empty magazine.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            loaded: VecDeque::with_capacity(capacity),
        }
    }

    /// Maximum letters this magazine holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Letters currently loaded.
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    /// True when no letters are loaded.
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// True when every slot is loaded.
    pub fn is_full(&self) -> bool {
        self.loaded.len() >= self.capacity
    }

    /// The letter the next shot would fire.
    pub fn peek_next(&self) -> Option<char> {
        self.loaded.front().copied()
    }

    /// Append a letter (uppercased). Returns false when full or non-letter.
    pub fn push(&mut self, letter: char) -> bool {
        if self.is_full() || !letter.is_ascii_alphabetic() {
            return false;
        }
        self.loaded.push_back(letter.to_ascii_uppercase());
        true
    }

    /// Pop the front letter (the round being fired).
    pub fn pop_front(&mut self) -> Option<char> {
        self.loaded.pop_front()
    }

    /// Remove the most recently typed letter (delete key).
    pub fn pop_back(&mut self) -> Option<char> {
        self.loaded.pop_back()
    }

    /// Drop every loaded letter.
    pub fn clear(&mut self) {
        self.loaded.clear();
    }

    /// Iterate loaded letters front to back.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.loaded.iter().copied()
    }
}

// =============================================================================
// GUN
// =============================================================================

/// The player's typing gun.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Gun {
    config: GunConfig,
    state: GunState,
    magazine: AmmoMagazine,
    reloading: bool,
    /// Countdown to the next repeat deletion; meaningful only while the
    /// delete key is held during a reload.
    ticks_to_next_delete: u32,
    enabled: bool,
}

impl Gun {
    /// Create a gun from config.
    ///
    /// A capacity mismatch is a diagnostic, not a failure: the loadout is
    /// truncated to the display slots and the error is logged once.
    pub fn new(config: GunConfig) -> Self {
        if let Err(err) = config.validate() {
            warn!("gun config invariant violated, truncating loadout: {err}");
        }
        let mut magazine = AmmoMagazine::new(config.display_slots);
        for letter in config.initial_ammo.chars() {
            if magazine.is_full() {
                break;
            }
            magazine.push(letter);
        }
        Self {
            config,
            state: GunState::Down,
            magazine,
            reloading: false,
            ticks_to_next_delete: 0,
            enabled: true,
        }
    }

    /// Current state.
    pub fn state(&self) -> GunState {
        self.state
    }

    /// True when the gun is fully raised.
    pub fn is_up(&self) -> bool {
        self.state == GunState::Up
    }

    /// True while the reload typing minigame is active.
    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    /// The magazine.
    pub fn magazine(&self) -> &AmmoMagazine {
        &self.magazine
    }

    /// Enable or disable the weapon entirely (e.g. on player death).
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the weapon accepts input at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Fire is permitted only when up and not reloading.
    pub fn can_fire(&self) -> bool {
        self.enabled && !self.reloading && self.is_up()
    }

    /// Reload is permitted only when up and not already reloading.
    pub fn can_reload(&self) -> bool {
        self.enabled && !self.reloading && self.is_up()
    }

    // -------------------------------------------------------------------------
    // Raise / lower
    // -------------------------------------------------------------------------

    /// Request the raise transition. No-op when already up or raising.
    /// `force` suppresses the audio cue (used at equip time).
    pub fn request_up(&mut self, tick: u32, force: bool, events: &mut Vec<CombatEvent>) {
        if matches!(self.state, GunState::Up | GunState::Raising) {
            return;
        }
        self.state = GunState::Raising;
        if !force {
            events.push(CombatEvent::new(tick, CombatEventData::GunRaising));
        }
    }

    /// Request the lower transition. No-op when already down or lowering.
    pub fn request_down(&mut self, tick: u32, force: bool, events: &mut Vec<CombatEvent>) {
        if matches!(self.state, GunState::Down | GunState::Lowering) {
            return;
        }
        self.state = GunState::Lowering;
        if !force {
            events.push(CombatEvent::new(tick, CombatEventData::GunLowering));
        }
    }

    /// Animation-completion callback: the raise finished.
    /// Entering Up shows the crosshair.
    pub fn on_raise_complete(&mut self, tick: u32, events: &mut Vec<CombatEvent>) {
        if self.state != GunState::Raising {
            return;
        }
        self.state = GunState::Up;
        events.push(CombatEvent::new(tick, CombatEventData::GunUp));
        events.push(CombatEvent::new(
            tick,
            CombatEventData::CrosshairVisible { visible: true },
        ));
    }

    /// Animation-completion callback: the lower finished.
    /// Entering Down hides the crosshair.
    pub fn on_lower_complete(&mut self, tick: u32, events: &mut Vec<CombatEvent>) {
        if self.state != GunState::Lowering {
            return;
        }
        self.state = GunState::Down;
        events.push(CombatEvent::new(tick, CombatEventData::GunDown));
        events.push(CombatEvent::new(
            tick,
            CombatEventData::CrosshairVisible { visible: false },
        ));
    }

    // -------------------------------------------------------------------------
    // Fire
    // -------------------------------------------------------------------------

    /// Attempt to fire. Returns the letter that left the barrel, if any.
    ///
    /// Empty magazine while otherwise able to fire is a dry fire (event,
    /// not an error); a gun that is not up ignores the trigger entirely.
    pub fn try_fire(&mut self, tick: u32, events: &mut Vec<CombatEvent>) -> Option<char> {
        if !self.can_fire() {
            return None;
        }
        match self.magazine.pop_front() {
            Some(letter) => {
                let last_round = self.magazine.is_empty();
                events.push(CombatEvent::fired(tick, letter, last_round));
                self.push_display_event(tick, events);
                Some(letter)
            }
            None => {
                events.push(CombatEvent::new(tick, CombatEventData::DryFire));
                events.push(CombatEvent::new(tick, CombatEventData::OutOfAmmo));
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Reload typing
    // -------------------------------------------------------------------------

    /// Begin the reload typing minigame. Returns false when not permitted.
    pub fn begin_reload(&mut self, tick: u32, events: &mut Vec<CombatEvent>) -> bool {
        if !self.can_reload() {
            return false;
        }
        self.reloading = true;
        self.ticks_to_next_delete = 0;
        events.push(CombatEvent::new(tick, CombatEventData::ReloadStarted));
        true
    }

    /// Confirm and end the reload. No-op when not reloading.
    pub fn end_reload(&mut self, tick: u32, events: &mut Vec<CombatEvent>) {
        if !self.reloading {
            return;
        }
        self.reloading = false;
        events.push(CombatEvent::new(tick, CombatEventData::ReloadEnded));
    }

    /// A letter key went down this frame. Appends to the magazine while
    /// reloading and not full; ignored otherwise.
    pub fn on_key_typed(&mut self, letter: char, tick: u32, events: &mut Vec<CombatEvent>) -> bool {
        if !self.reloading || !self.enabled {
            return false;
        }
        if !self.magazine.push(letter) {
            return false;
        }
        events.push(CombatEvent::new(
            tick,
            CombatEventData::ReloadKeyPress {
                letter: Some(letter.to_ascii_uppercase()),
            },
        ));
        self.push_display_event(tick, events);
        true
    }

    /// Per-frame delete key handling while reloading.
    ///
    /// The press frame removes one letter immediately and arms the repeat
    /// delay; while held, further removals fire at the repeat rate until
    /// the magazine empties or the key is released.
    pub fn on_delete_held(
        &mut self,
        pressed_this_frame: bool,
        tick: u32,
        events: &mut Vec<CombatEvent>,
    ) {
        if !self.reloading || !self.enabled {
            return;
        }
        if pressed_this_frame {
            self.remove_last(tick, events);
            self.ticks_to_next_delete = self.config.delete_repeat_delay;
        } else {
            self.ticks_to_next_delete = self.ticks_to_next_delete.saturating_sub(1);
            if self.ticks_to_next_delete == 0 {
                self.remove_last(tick, events);
                self.ticks_to_next_delete = self.config.delete_repeat_rate;
            }
        }
    }

    /// Drop every loaded letter (full reload abort).
    pub fn clear_ammo(&mut self, tick: u32, events: &mut Vec<CombatEvent>) {
        if self.magazine.is_empty() {
            return;
        }
        self.magazine.clear();
        self.push_display_event(tick, events);
    }

    fn remove_last(&mut self, tick: u32, events: &mut Vec<CombatEvent>) {
        if self.magazine.pop_back().is_some() {
            events.push(CombatEvent::new(
                tick,
                CombatEventData::ReloadKeyPress { letter: None },
            ));
            self.push_display_event(tick, events);
        }
    }

    // -------------------------------------------------------------------------
    // Display
    // -------------------------------------------------------------------------

    /// Render the fixed-width slot string: loaded letters uppercased,
    /// remaining slots as the empty glyph.
    pub fn ammo_display(&self) -> String {
        let mut text = String::with_capacity(self.config.display_slots);
        text.extend(self.magazine.iter());
        // Slots are chars, not bytes: the empty glyph may be multi-byte
        for _ in self.magazine.len()..self.config.display_slots {
            text.push(self.config.empty_slot_char);
        }
        text
    }

    fn push_display_event(&self, tick: u32, events: &mut Vec<CombatEvent>) {
        events.push(CombatEvent::new(
            tick,
            CombatEventData::AmmoDisplayChanged {
                text: self.ammo_display(),
            },
        ));
    }
}

// =============================================================================
// TESTS
// =============================================================================
