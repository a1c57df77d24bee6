// SPDX-License-Identifier: GPL-3.0-only

//! Editable text regions driven through selection primitives.
//!
//! [`EditableRegion`] is the small subset of a document selection API the
//! bridge needs: focus, read/replace the selection, delete a range, insert
//! text, and step one character. [`TextRegion`] implements it over a plain
//! string with grapheme-cluster character units.

use std::collections::BTreeMap;
use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use crate::dom::{CONTENT_EDITABLE_ATTRIBUTE, INPUT_MODE_ATTRIBUTE};

/// Direction of a one-character step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// A selection as anchor and focus byte offsets.
///
/// The anchor stays put while the focus moves, so `focus < anchor` is a
/// backward selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSelection {
    pub anchor: usize,
    pub focus: usize,
}

impl TextSelection {
    /// A collapsed selection (caret) at `offset`.
    #[must_use]
    pub const fn caret(offset: usize) -> Self {
        Self {
            anchor: offset,
            focus: offset,
        }
    }

    #[must_use]
    pub const fn new(anchor: usize, focus: usize) -> Self {
        Self { anchor, focus }
    }

    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.anchor.min(self.focus)
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.anchor.max(self.focus)
    }

    /// Covered byte range, start to end.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start()..self.end()
    }
}

/// A text surface that can be edited through its selection.
pub trait EditableRegion {
    /// Makes the region editable while keeping the native on-screen keyboard
    /// away, so only the virtual keyboard types into it.
    fn prepare_for_virtual_input(&mut self);

    /// Gives the region input focus, establishing a selection if it can.
    fn focus(&mut self);

    /// The current selection, read fresh on every call.
    fn selection(&self) -> Option<TextSelection>;

    /// Replaces the selection.
    fn set_selection(&mut self, selection: TextSelection);

    /// Removes the text in `range`.
    fn delete_range(&mut self, range: Range<usize>);

    /// Inserts `text` at `offset`.
    fn insert_at(&mut self, offset: usize, text: &str);

    /// Offset one character before or after `offset`, stopping at the ends.
    fn step(&self, offset: usize, direction: Direction) -> usize;
}

/// String-backed editable region.
///
/// Focusing a region without a selection places the caret at the start, the
/// way a focused `contenteditable` does. A disabled region never gets a
/// selection from focusing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRegion {
    text: String,
    selection: Option<TextSelection>,
    focused: bool,
    disabled: bool,
    attributes: BTreeMap<String, String>,
}

impl TextRegion {
    /// Creates an unfocused region without a selection.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Creates a region that refuses focus.
    pub fn disabled(text: impl Into<String>) -> Self {
        Self {
            disabled: true,
            ..Self::new(text)
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Value of a presentation attribute set on the region.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Caret offset when the selection is collapsed.
    #[must_use]
    pub fn caret(&self) -> Option<usize> {
        self.selection.filter(TextSelection::is_collapsed).map(|s| s.focus)
    }

    /// A user click at `offset`: focuses and places the caret there.
    pub fn click(&mut self, offset: usize) {
        if self.disabled {
            return;
        }
        self.focused = true;
        self.selection = Some(TextSelection::caret(self.snap(offset)));
    }

    /// Sets a selection directly, e.g. from a user drag.
    pub fn select(&mut self, anchor: usize, focus: usize) {
        self.selection = Some(TextSelection::new(self.snap(anchor), self.snap(focus)));
    }

    /// Clamps to the text and rounds down to a grapheme boundary.
    fn snap(&self, offset: usize) -> usize {
        if offset >= self.text.len() {
            return self.text.len();
        }

        self.text
            .grapheme_indices(true)
            .map(|(i, _)| i)
            .take_while(|&i| i <= offset)
            .last()
            .unwrap_or(0)
    }
}

impl EditableRegion for TextRegion {
    fn prepare_for_virtual_input(&mut self) {
        self.attributes
            .insert(CONTENT_EDITABLE_ATTRIBUTE.to_string(), "true".to_string());
        self.attributes
            .insert(INPUT_MODE_ATTRIBUTE.to_string(), "none".to_string());
    }

    fn focus(&mut self) {
        if self.disabled {
            return;
        }
        self.focused = true;
        if self.selection.is_none() {
            self.selection = Some(TextSelection::caret(0));
        }
    }

    fn selection(&self) -> Option<TextSelection> {
        self.selection
    }

    fn set_selection(&mut self, selection: TextSelection) {
        self.select(selection.anchor, selection.focus);
    }

    fn delete_range(&mut self, range: Range<usize>) {
        let start = self.snap(range.start);
        let end = self.snap(range.end.max(range.start));
        self.text.replace_range(start..end, "");
    }

    fn insert_at(&mut self, offset: usize, text: &str) {
        let offset = self.snap(offset);
        self.text.insert_str(offset, text);
    }

    fn step(&self, offset: usize, direction: Direction) -> usize {
        let offset = self.snap(offset);
        match direction {
            Direction::Backward => self
                .text
                .grapheme_indices(true)
                .map(|(i, _)| i)
                .take_while(|&i| i < offset)
                .last()
                .unwrap_or(0),
            Direction::Forward => self
                .text
                .grapheme_indices(true)
                .map(|(i, g)| i + g.len())
                .find(|&end| end > offset)
                .unwrap_or(self.text.len()),
        }
    }
}
