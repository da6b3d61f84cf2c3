//! Per-Frame Input Snapshot
//!
//! The embedding engine polls its input devices and hands the core one
//! [`FrameInput`] per tick. Edge flags ("pressed") are true only on the
//! frame the key went down; "held" flags are true for every frame the key
//! stays down.

use serde::{Deserialize, Serialize};

/// Input state for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Action flags (packed bits):
    /// - Bit 0: Fire pressed this frame
    /// - Bit 1: Reload key pressed this frame
    /// - Bit 2: Confirm (reload-end) pressed this frame
    /// - Bit 3: Delete pressed this frame
    /// - Bit 4: Delete held
    /// - Bit 5-7: Reserved
    pub flags: u8,

    /// Letter keys pressed this frame, bit 0 = 'A' .. bit 25 = 'Z'.
    pub letters: u32,
}

impl FrameInput {
    /// Fire flag bit
    pub const FLAG_FIRE: u8 = 0x01;
    /// Reload flag bit
    pub const FLAG_RELOAD: u8 = 0x02;
    /// Confirm flag bit
    pub const FLAG_CONFIRM: u8 = 0x04;
    /// Delete-pressed flag bit
    pub const FLAG_DELETE_PRESSED: u8 = 0x08;
    /// Delete-held flag bit
    pub const FLAG_DELETE_HELD: u8 = 0x10;

    /// Create a new empty input frame.
    pub const fn new() -> Self {
        Self {
            flags: 0,
            letters: 0,
        }
    }

    /// Check if fire was pressed this frame.
    #[inline]
    pub fn fire_pressed(&self) -> bool {
        self.flags & Self::FLAG_FIRE != 0
    }

    /// Check if the reload key was pressed this frame.
    #[inline]
    pub fn reload_pressed(&self) -> bool {
        self.flags & Self::FLAG_RELOAD != 0
    }

    /// Check if confirm was pressed this frame.
    #[inline]
    pub fn confirm_pressed(&self) -> bool {
        self.flags & Self::FLAG_CONFIRM != 0
    }

    /// Check if delete went down this frame.
    #[inline]
    pub fn delete_pressed(&self) -> bool {
        self.flags & Self::FLAG_DELETE_PRESSED != 0
    }

    /// Check if delete is held (including the press frame).
    #[inline]
    pub fn delete_held(&self) -> bool {
        self.flags & Self::FLAG_DELETE_HELD != 0
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0 && self.letters == 0
    }

    /// Record a letter key press. Non-ASCII-alphabetic chars are ignored.
    pub fn press_letter(&mut self, letter: char) {
        if let Some(bit) = letter_bit(letter) {
            self.letters |= 1 << bit;
        }
    }

    /// Check whether a specific letter was pressed this frame.
    pub fn letter_pressed(&self, letter: char) -> bool {
        letter_bit(letter).is_some_and(|bit| self.letters & (1 << bit) != 0)
    }

    /// Iterate the letters pressed this frame in A..Z order (uppercased).
    pub fn pressed_letters(&self) -> impl Iterator<Item = char> + '_ {
        let letters = self.letters;
        (0u32..26).filter_map(move |bit| {
            if letters & (1 << bit) != 0 {
                char::from_u32('A' as u32 + bit)
            } else {
                None
            }
        })
    }

    /// Set an action flag.
    #[inline]
    pub fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Builder: fire pressed.
    pub fn with_fire() -> Self {
        let mut input = Self::new();
        input.set_flag(Self::FLAG_FIRE, true);
        input
    }

    /// Builder: reload key pressed.
    pub fn with_reload() -> Self {
        let mut input = Self::new();
        input.set_flag(Self::FLAG_RELOAD, true);
        input
    }

    /// Builder: confirm pressed.
    pub fn with_confirm() -> Self {
        let mut input = Self::new();
        input.set_flag(Self::FLAG_CONFIRM, true);
        input
    }

    /// Builder: a batch of letter presses.
    pub fn with_letters(letters: &str) -> Self {
        let mut input = Self::new();
        for c in letters.chars() {
            input.press_letter(c);
        }
        input
    }

    /// Builder: delete key state.
    pub fn with_delete(pressed_this_frame: bool) -> Self {
        let mut input = Self::new();
        input.set_flag(Self::FLAG_DELETE_PRESSED, pressed_this_frame);
        input.set_flag(Self::FLAG_DELETE_HELD, true);
        input
    }
}

/// Map a char to its letter bit (0..26), case-insensitive.
fn letter_bit(letter: char) -> Option<u32> {
    if letter.is_ascii_alphabetic() {
        Some(letter.to_ascii_uppercase() as u32 - 'A' as u32)
    } else {
        None
    }
}

// =============================================================================
// TESTS
// =============================================================================
