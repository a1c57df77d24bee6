// SPDX-License-Identifier: GPL-3.0-only

//! View model of the keyboard surface.
//!
//! [`render`] turns the layout and the current [`KeyboardState`] into rows of
//! [`KeyButton`]s. A front end draws them and reports presses back by button
//! identifier; nothing here touches a real surface.

use crate::fl;
use crate::keyboard::layout::KeyboardLayout;
use crate::keyboard::state::{KeyboardMode, KeyboardState, ShiftState, SpecialKey};

/// CSS class of every key button.
pub const KEY_CLASS: &str = "virtual-keyboard__key";

/// CSS class of the close control in the panel corner.
pub const CLOSE_CLASS: &str = "virtual-keyboard__close";

/// Identifier the close control reports on press.
pub const CLOSE_IDENTIFIER: &str = "close";

/// Visual size class of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyVariant {
    Default,
    Wide,
    Space,
    Action,
    /// The panel's close control, styled apart from the keys
    Close,
}

impl KeyVariant {
    fn modifier_class(self) -> Option<&'static str> {
        match self {
            KeyVariant::Default => None,
            KeyVariant::Wide => Some("virtual-keyboard__key--wide"),
            KeyVariant::Space => Some("virtual-keyboard__key--space"),
            KeyVariant::Action => Some("virtual-keyboard__key--action"),
            KeyVariant::Close => None,
        }
    }
}

/// Icon shown instead of a text label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyIcon {
    /// Shift arrow; outline, filled, or filled with a bar for caps lock
    Shift(ShiftState),
    Backspace,
    DeleteForward,
    ArrowLeft,
    ArrowRight,
    Close,
}

impl KeyIcon {
    /// Icon font classes for this icon.
    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            KeyIcon::Shift(ShiftState::Off) => "ph ph-arrow-fat-up",
            KeyIcon::Shift(ShiftState::Single) => "ph-fill ph-arrow-fat-up",
            KeyIcon::Shift(ShiftState::CapsLock) => "ph-fill ph-arrow-fat-lines-up",
            KeyIcon::Backspace => "ph-fill ph-backspace",
            KeyIcon::DeleteForward => "ph-fill ph-backspace ph-rotate-180",
            KeyIcon::ArrowLeft => "ph ph-arrow-left",
            KeyIcon::ArrowRight => "ph ph-arrow-right",
            KeyIcon::Close => "ph-bold ph-x",
        }
    }
}

/// One rendered button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyButton {
    /// Text shown on the button (also the accessible name for icon keys)
    pub label: String,
    /// Identifier reported back on press
    pub identifier: String,
    pub variant: KeyVariant,
    pub icon: Option<KeyIcon>,
    /// Highlighted, e.g. shift while active
    pub active: bool,
}

impl KeyButton {
    fn text(label: impl Into<String>, identifier: impl Into<String>, variant: KeyVariant) -> Self {
        Self {
            label: label.into(),
            identifier: identifier.into(),
            variant,
            icon: None,
            active: false,
        }
    }

    fn icon(label: impl Into<String>, identifier: impl Into<String>, icon: KeyIcon) -> Self {
        Self {
            icon: Some(icon),
            ..Self::text(label, identifier, KeyVariant::Action)
        }
    }

    /// CSS classes for the button element.
    #[must_use]
    pub fn css_classes(&self) -> Vec<&'static str> {
        if self.variant == KeyVariant::Close {
            return vec![CLOSE_CLASS];
        }

        let mut classes = vec![KEY_CLASS];
        classes.extend(self.variant.modifier_class());
        if self.active {
            classes.push("virtual-keyboard__key--shift-active");
        }
        classes
    }
}

/// Localized labels of the control keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLabels {
    /// Mode toggle shown in letters mode
    pub mode_numbers: String,
    /// Mode toggle shown in numbers mode
    pub mode_letters: String,
    pub space: String,
    pub shift: String,
    pub backspace: String,
    pub delete_forward: String,
    pub left: String,
    pub right: String,
    pub close: String,
}

impl KeyLabels {
    /// Labels in the currently selected locale.
    #[must_use]
    pub fn localized() -> Self {
        Self {
            mode_numbers: fl!("mode-numbers"),
            mode_letters: fl!("mode-letters"),
            space: fl!("space"),
            shift: fl!("shift"),
            backspace: fl!("backspace"),
            delete_forward: fl!("delete-forward"),
            left: fl!("arrow-left"),
            right: fl!("arrow-right"),
            close: fl!("close-keyboard"),
        }
    }
}

/// The rendered keyboard: character rows followed by the control row, plus
/// the close control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedKeyboard {
    pub rows: Vec<Vec<KeyButton>>,
    pub close: KeyButton,
}

impl RenderedKeyboard {
    /// Finds a button by identifier, the close control included.
    #[must_use]
    pub fn button(&self, identifier: &str) -> Option<&KeyButton> {
        self.rows
            .iter()
            .flatten()
            .chain(std::iter::once(&self.close))
            .find(|b| b.identifier == identifier)
    }

    /// Labels of one row, mostly useful in tests and logs.
    #[must_use]
    pub fn row_labels(&self, row: usize) -> Vec<&str> {
        self.rows
            .get(row)
            .map(|r| r.iter().map(|b| b.label.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Builds the button grid for a state.
///
/// Character labels are uppercased only in letters mode while shift is
/// active; identifiers always stay as written in the layout.
#[must_use]
pub fn render(layout: &KeyboardLayout, state: &KeyboardState, labels: &KeyLabels) -> RenderedKeyboard {
    let uppercase = state.mode == KeyboardMode::Letters && state.shift.is_uppercase();

    let mut rows: Vec<Vec<KeyButton>> = layout
        .rows(state.mode)
        .iter()
        .map(|row| {
            row.iter()
                .map(|key| {
                    let label = if uppercase { key.to_uppercase() } else { key.clone() };
                    KeyButton::text(label, key.clone(), KeyVariant::Default)
                })
                .collect()
        })
        .collect();

    rows.push(control_row(state, labels));

    let mut close = KeyButton::icon(labels.close.clone(), CLOSE_IDENTIFIER, KeyIcon::Close);
    close.variant = KeyVariant::Close;

    RenderedKeyboard { rows, close }
}

fn control_row(state: &KeyboardState, labels: &KeyLabels) -> Vec<KeyButton> {
    let (mode_label, mode_identifier) = match state.mode {
        KeyboardMode::Letters => (&labels.mode_numbers, "123"),
        KeyboardMode::Numbers => (&labels.mode_letters, "ABC"),
    };

    let mut shift = KeyButton::icon(labels.shift.clone(), "shift", KeyIcon::Shift(state.shift));
    shift.variant = KeyVariant::Wide;
    shift.active = state.shift.is_uppercase();

    vec![
        KeyButton::text(mode_label.clone(), mode_identifier, KeyVariant::Wide),
        shift,
        KeyButton::text(labels.space.clone(), SpecialKey::Space.identifier(), KeyVariant::Space),
        KeyButton::icon(
            labels.backspace.clone(),
            SpecialKey::Backspace.identifier(),
            KeyIcon::Backspace,
        ),
        KeyButton::icon(
            labels.delete_forward.clone(),
            SpecialKey::DeleteForward.identifier(),
            KeyIcon::DeleteForward,
        ),
        KeyButton::icon(labels.left.clone(), SpecialKey::Left.identifier(), KeyIcon::ArrowLeft),
        KeyButton::icon(labels.right.clone(), SpecialKey::Right.identifier(), KeyIcon::ArrowRight),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> KeyLabels {
        KeyLabels {
            mode_numbers: "123".into(),
            mode_letters: "ABC".into(),
            space: "space".into(),
            shift: "Shift".into(),
            backspace: "bs".into(),
            delete_forward: "del".into(),
            left: "left".into(),
            right: "right".into(),
            close: "close".into(),
        }
    }

    fn state(shift: ShiftState, mode: KeyboardMode) -> KeyboardState {
        KeyboardState {
            shift,
            mode,
            last_shift_press: None,
        }
    }

    #[test]
    fn test_letters_lowercase_with_control_row() {
        let view = render(
            &KeyboardLayout::default(),
            &state(ShiftState::Off, KeyboardMode::Letters),
            &labels(),
        );

        assert_eq!(view.rows.len(), 4);
        assert_eq!(view.row_labels(0)[..3], ["a", "ą", "b"]);

        let identifiers: Vec<&str> = view.rows[3].iter().map(|b| b.identifier.as_str()).collect();
        assert_eq!(
            identifiers,
            ["123", "shift", "space", "backspace", "delete-forward", "left", "right"]
        );
        assert!(!view.button("shift").unwrap().active);
    }

    #[test]
    fn test_shift_uppercases_labels_not_identifiers() {
        let view = render(
            &KeyboardLayout::default(),
            &state(ShiftState::CapsLock, KeyboardMode::Letters),
            &labels(),
        );

        let first = &view.rows[0][1];
        assert_eq!(first.label, "Ą");
        assert_eq!(first.identifier, "ą");

        let shift = view.button("shift").unwrap();
        assert!(shift.active);
        assert_eq!(shift.icon, Some(KeyIcon::Shift(ShiftState::CapsLock)));
        assert!(shift.css_classes().contains(&"virtual-keyboard__key--shift-active"));
    }

    #[test]
    fn test_numbers_mode_ignores_shift_for_labels() {
        let view = render(
            &KeyboardLayout::default(),
            &state(ShiftState::Single, KeyboardMode::Numbers),
            &labels(),
        );

        assert_eq!(view.row_labels(0)[0], "1");
        assert!(view.button("ABC").is_some());
        assert!(view.button("123").is_none());
    }

    #[test]
    fn test_css_classes_by_variant() {
        let view = render(
            &KeyboardLayout::default(),
            &state(ShiftState::Off, KeyboardMode::Letters),
            &labels(),
        );

        assert_eq!(view.button("a").unwrap().css_classes(), vec![KEY_CLASS]);
        assert_eq!(
            view.button("space").unwrap().css_classes(),
            vec![KEY_CLASS, "virtual-keyboard__key--space"]
        );
        assert_eq!(
            view.button("left").unwrap().css_classes(),
            vec![KEY_CLASS, "virtual-keyboard__key--action"]
        );
    }

    #[test]
    fn test_mode_toggle_uses_localized_label() {
        let mut custom = labels();
        custom.mode_numbers = "?123".into();
        custom.mode_letters = "abc".into();

        let letters = render(
            &KeyboardLayout::default(),
            &state(ShiftState::Off, KeyboardMode::Letters),
            &custom,
        );
        assert_eq!(letters.button("123").unwrap().label, "?123");

        let numbers = render(
            &KeyboardLayout::default(),
            &state(ShiftState::Off, KeyboardMode::Numbers),
            &custom,
        );
        assert_eq!(numbers.button("ABC").unwrap().label, "abc");
    }

    #[test]
    fn test_close_control_rendered_apart_from_rows() {
        let view = render(
            &KeyboardLayout::default(),
            &state(ShiftState::Off, KeyboardMode::Letters),
            &labels(),
        );

        assert_eq!(view.close.identifier, CLOSE_IDENTIFIER);
        assert_eq!(view.close.label, "close");
        assert_eq!(view.close.icon, Some(KeyIcon::Close));
        assert_eq!(view.close.css_classes(), vec![CLOSE_CLASS]);
        assert_eq!(KeyIcon::Close.css_class(), "ph-bold ph-x");
        assert!(view.rows.iter().flatten().all(|b| b.identifier != CLOSE_IDENTIFIER));
        assert_eq!(view.button(CLOSE_IDENTIFIER), Some(&view.close));
    }

    #[test]
    fn test_shift_icon_classes() {
        assert_eq!(KeyIcon::Shift(ShiftState::Off).css_class(), "ph ph-arrow-fat-up");
        assert_eq!(
            KeyIcon::Shift(ShiftState::CapsLock).css_class(),
            "ph-fill ph-arrow-fat-lines-up"
        );
    }
}
