// SPDX-License-Identifier: GPL-3.0-only

//! Character layouts for the virtual keyboard.
//!
//! A layout holds the character rows of both keyboard modes. The bottom row
//! with the control keys is fixed and not part of the layout; see
//! [`crate::keyboard::render`].

use serde::{Deserialize, Serialize};

use crate::keyboard::state::KeyboardMode;

/// Key identifiers owned by the fixed control row and the close control.
///
/// Layout rows may not reuse them, otherwise a character key would be
/// resolved as a control key.
pub const RESERVED_IDENTIFIERS: [&str; 9] = [
    "shift",
    "ABC",
    "123",
    "space",
    "backspace",
    "delete-forward",
    "left",
    "right",
    "close",
];

/// Character rows for the letters and numbers modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardLayout {
    /// Rows shown in letters mode
    pub letters: Vec<Vec<String>>,
    /// Rows shown in numbers mode
    pub numbers: Vec<Vec<String>>,
}

impl Default for KeyboardLayout {
    /// Polish alphabet and punctuation rows.
    fn default() -> Self {
        Self {
            letters: rows(&[
                &["a", "ą", "b", "c", "ć", "d", "e", "ę", "f", "g", "h"],
                &["i", "j", "k", "l", "ł", "m", "n", "ń", "o", "ó", "p"],
                &["r", "s", "ś", "t", "u", "w", "x", "y", "z", "ź", "ż"],
            ]),
            numbers: rows(&[
                &["1", "2", "3", "4", "5", "6", "7", "8", "9", "0"],
                &["-", "/", ":", ";", ",", ".", "?", "!", "(", ")"],
                &["\"", "•", "+", "*", "<", ">", "="],
            ]),
        }
    }
}

impl KeyboardLayout {
    /// Returns the character rows for a mode.
    #[must_use]
    pub fn rows(&self, mode: KeyboardMode) -> &[Vec<String>] {
        match mode {
            KeyboardMode::Letters => &self.letters,
            KeyboardMode::Numbers => &self.numbers,
        }
    }

    /// Checks that both modes have at least one row, that no row is empty,
    /// and that no key is blank or collides with a control identifier.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        for (name, rows) in [("letters", &self.letters), ("numbers", &self.numbers)] {
            if rows.is_empty() {
                return Err(format!("layout mode '{}' has no rows", name));
            }

            for (row_index, row) in rows.iter().enumerate() {
                if row.is_empty() {
                    return Err(format!("{}[{}] is an empty row", name, row_index));
                }

                for (key_index, key) in row.iter().enumerate() {
                    if key.is_empty() {
                        return Err(format!("{}[{}][{}] is blank", name, row_index, key_index));
                    }
                    if RESERVED_IDENTIFIERS.contains(&key.as_str()) {
                        return Err(format!(
                            "{}[{}][{}] uses reserved identifier '{}'",
                            name, row_index, key_index, key
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

fn rows(source: &[&[&str]]) -> Vec<Vec<String>> {
    source
        .iter()
        .map(|row| row.iter().map(|key| (*key).to_string()).collect())
        .collect()
}
