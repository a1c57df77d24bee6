// SPDX-License-Identifier: GPL-3.0-only

//! Minimal model of the document elements a click travels through.
//!
//! Delegated click handling only needs the target element and its ancestors,
//! plus their attributes. A [`ClickPath`] lists them target first, the same
//! order `Element.closest()` walks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Marks an element that navigates to a page; the value is the page number.
pub const PAGE_MARKER: &str = "data-page";

/// Marks an element that activates a tool; the value is the tool id.
pub const TOOL_MARKER: &str = "data-tool-id";

/// Marks an element that closes the host modal.
pub const MODAL_CLOSE_MARKER: &str = "data-modal-close";

/// Marks an element that opens the virtual keyboard.
pub const KEYBOARD_OPEN_MARKER: &str = "data-keyboard-open";

/// Marks an element that closes the virtual keyboard.
pub const KEYBOARD_CLOSE_MARKER: &str = "data-keyboard-close";

/// Attribute making an element editable.
pub const CONTENT_EDITABLE_ATTRIBUTE: &str = "contenteditable";

/// Attribute choosing the native on-screen keyboard; `none` suppresses it.
pub const INPUT_MODE_ATTRIBUTE: &str = "inputmode";

/// A document element reduced to its tag name and attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Lowercase tag name, e.g. `"button"`
    #[serde(default)]
    pub tag: String,
    /// Attribute name to value
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    /// Creates an element without attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns the value of an attribute, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns `true` if the attribute is present, whatever its value.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

/// The clicked element followed by its ancestors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClickPath {
    elements: Vec<Element>,
}

impl ClickPath {
    /// Creates a path from the target outward.
    #[must_use]
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// Returns the nearest element (the target included) carrying `attribute`.
    #[must_use]
    pub fn closest(&self, attribute: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.has_attribute(attribute))
    }

    /// Returns `true` if the target is a button or sits inside one.
    #[must_use]
    pub fn is_within_button(&self) -> bool {
        self.elements.iter().any(|e| e.tag.eq_ignore_ascii_case("button"))
    }
}
