// SPDX-License-Identifier: GPL-3.0-only

//! Delegated click handling that turns marked elements into host events.

use serde_json::json;

use super::{EventBus, EVENT_CLOSE_MODAL, EVENT_GO_TO_PAGE, EVENT_TOOL_CLICKED};
use crate::dom::{ClickPath, MODAL_CLOSE_MARKER, PAGE_MARKER, TOOL_MARKER};

impl EventBus {
    /// Handles a document click.
    ///
    /// Markers are checked in precedence order (page, tool, modal close) and
    /// only the first marker kind found on the path is acted upon.
    pub fn handle_click(&self, path: &ClickPath) {
        if let Some(target) = path.closest(PAGE_MARKER) {
            let raw = target.attribute(PAGE_MARKER).unwrap_or_default();
            match parse_page(raw) {
                Some(page) => self.emit(EVENT_GO_TO_PAGE, json!({ "page": page })),
                None => tracing::debug!("ignoring page marker with value {:?}", raw),
            }
            return;
        }

        if let Some(target) = path.closest(TOOL_MARKER) {
            let tool_id = target.attribute(TOOL_MARKER).unwrap_or_default();
            match self.find_tool(tool_id) {
                Some(tool) => self.emit(EVENT_TOOL_CLICKED, json!({ "tool": tool })),
                None => tracing::debug!("no tool with id {:?}", tool_id),
            }
            return;
        }

        if path.closest(MODAL_CLOSE_MARKER).is_some() {
            self.emit_empty(EVENT_CLOSE_MODAL);
        }
    }
}

/// Parses a page number, accepting integral decimal forms like `"3.0"`.
fn parse_page(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(page) = raw.parse::<i64>() {
        return Some(page);
    }

    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}
