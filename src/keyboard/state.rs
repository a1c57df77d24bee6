// SPDX-License-Identifier: GPL-3.0-only

//! Keyboard state machine: shift cycling, mode switching and key resolution.
//!
//! The machine renders nothing. It decides what a key press turns into and
//! how the shift and mode state change, so it can be tested without any
//! surface. Time is passed in by the caller; there are no timers, and a
//! one-shot shift that is never followed by another press stays active.
//!
//! # Shift Transitions
//!
//! ```text
//! Off ──press──▶ Single ──press < Δ──▶ CapsLock ──press──▶ Off
//!                  │
//!                  └──press ≥ Δ──▶ Off
//! ```
//!
//! Typing a character while `Single` uppercases it and returns to `Off`.
//! `CapsLock` is only left by another shift press.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::app_settings::DOUBLE_TAP_THRESHOLD_MS;

/// Shift state of the virtual keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftState {
    /// Lowercase input
    #[default]
    Off,
    /// Uppercase for the next character only
    Single,
    /// Uppercase until shift is pressed again
    CapsLock,
}

impl ShiftState {
    /// Returns `true` if typed characters are uppercased.
    #[must_use]
    pub fn is_uppercase(self) -> bool {
        self != ShiftState::Off
    }
}

/// Which character rows the keyboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardMode {
    /// Alphabet rows
    #[default]
    Letters,
    /// Digits and punctuation rows
    Numbers,
}

/// Control keys that map to fixed values regardless of shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKey {
    /// Delete backward
    Backspace,
    /// Delete forward
    DeleteForward,
    /// Insert a space
    Space,
    /// Move caret left
    Left,
    /// Move caret right
    Right,
}

impl SpecialKey {
    /// The value published for this key, using `KeyboardEvent.key` names.
    #[must_use]
    pub fn value(self) -> &'static str {
        match self {
            SpecialKey::Backspace => "Backspace",
            SpecialKey::DeleteForward => "Delete",
            SpecialKey::Space => " ",
            SpecialKey::Left => "ArrowLeft",
            SpecialKey::Right => "ArrowRight",
        }
    }

    /// The button identifier for this key.
    #[must_use]
    pub fn identifier(self) -> &'static str {
        match self {
            SpecialKey::Backspace => "backspace",
            SpecialKey::DeleteForward => "delete-forward",
            SpecialKey::Space => "space",
            SpecialKey::Left => "left",
            SpecialKey::Right => "right",
        }
    }
}

/// A pressed key, parsed from its button identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// The shift key
    Shift,
    /// Mode toggle to a specific mode (`ABC` or `123`)
    Mode(KeyboardMode),
    /// A control key
    Special(SpecialKey),
    /// A character key; the identifier is the character itself
    Char(String),
}

impl Key {
    /// Parses a button identifier.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Self {
        match identifier {
            "shift" => Key::Shift,
            "ABC" => Key::Mode(KeyboardMode::Letters),
            "123" => Key::Mode(KeyboardMode::Numbers),
            "backspace" => Key::Special(SpecialKey::Backspace),
            "delete-forward" => Key::Special(SpecialKey::DeleteForward),
            "space" => Key::Special(SpecialKey::Space),
            "left" => Key::Special(SpecialKey::Left),
            "right" => Key::Special(SpecialKey::Right),
            other => Key::Char(other.to_string()),
        }
    }
}

/// Shift state, mode, and the time of the last shift press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardState {
    /// Current shift state
    pub shift: ShiftState,
    /// Current row set
    pub mode: KeyboardMode,
    /// When shift was last pressed, if ever
    pub last_shift_press: Option<Instant>,
}

/// Result of resolving a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The key produced a value to publish as `keyboardPressed`.
    Emit(String),
    /// The key only changed keyboard state (shift or mode).
    StateChanged,
}

// ============================================================================
// Pure Transitions
// ============================================================================

/// Applies a shift press at `now`.
#[must_use]
pub fn press_shift(state: KeyboardState, now: Instant, threshold: Duration) -> KeyboardState {
    let is_double_tap = state
        .last_shift_press
        .map(|prev| now.saturating_duration_since(prev) < threshold)
        .unwrap_or(false);

    let shift = match state.shift {
        ShiftState::Single if is_double_tap => ShiftState::CapsLock,
        ShiftState::Off => ShiftState::Single,
        ShiftState::Single | ShiftState::CapsLock => ShiftState::Off,
    };

    KeyboardState {
        shift,
        last_shift_press: Some(now),
        ..state
    }
}

/// Switches the row set without touching shift.
#[must_use]
pub fn set_mode(state: KeyboardState, mode: KeyboardMode) -> KeyboardState {
    KeyboardState { mode, ..state }
}

/// Resolves a character or control key to the value it publishes.
#[must_use]
pub fn resolve(state: &KeyboardState, key: &Key) -> Option<String> {
    match key {
        Key::Special(special) => Some(special.value().to_string()),
        Key::Char(c) if state.shift.is_uppercase() => Some(c.to_uppercase()),
        Key::Char(c) => Some(c.clone()),
        Key::Shift | Key::Mode(_) => None,
    }
}

/// Drops a one-shot shift after a character key.
#[must_use]
pub fn after_key(state: KeyboardState, key: &Key) -> KeyboardState {
    match key {
        Key::Char(_) if state.shift == ShiftState::Single => KeyboardState {
            shift: ShiftState::Off,
            ..state
        },
        _ => state,
    }
}

/// State after the keyboard becomes visible.
#[must_use]
pub fn on_show(state: KeyboardState) -> KeyboardState {
    KeyboardState {
        shift: ShiftState::Off,
        mode: KeyboardMode::Letters,
        ..state
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// Owns a [`KeyboardState`] and applies key presses to it.
#[derive(Debug, Clone)]
pub struct KeyboardStateMachine {
    state: KeyboardState,
    double_tap_threshold: Duration,
}

impl Default for KeyboardStateMachine {
    fn default() -> Self {
        Self::new(Duration::from_millis(DOUBLE_TAP_THRESHOLD_MS))
    }
}

impl KeyboardStateMachine {
    /// Creates a machine in `{Off, Letters}` with the given double-tap window.
    #[must_use]
    pub fn new(double_tap_threshold: Duration) -> Self {
        Self {
            state: KeyboardState::default(),
            double_tap_threshold,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> KeyboardState {
        self.state
    }

    /// Current shift state.
    #[must_use]
    pub fn shift(&self) -> ShiftState {
        self.state.shift
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> KeyboardMode {
        self.state.mode
    }

    /// Handles a key press at `now`.
    pub fn press(&mut self, key: &Key, now: Instant) -> KeyOutcome {
        match key {
            Key::Shift => {
                self.state = press_shift(self.state, now, self.double_tap_threshold);
                tracing::debug!("shift is now {:?}", self.state.shift);
                KeyOutcome::StateChanged
            }
            Key::Mode(mode) => {
                self.state = set_mode(self.state, *mode);
                tracing::debug!("keyboard mode is now {:?}", mode);
                KeyOutcome::StateChanged
            }
            Key::Special(_) | Key::Char(_) => {
                let value = resolve(&self.state, key).unwrap_or_default();
                self.state = after_key(self.state, key);
                KeyOutcome::Emit(value)
            }
        }
    }

    /// Resets shift and mode; called when the keyboard is shown.
    pub fn reset_for_show(&mut self) {
        self.state = on_show(self.state);
    }
}
