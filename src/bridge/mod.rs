// SPDX-License-Identifier: GPL-3.0-only

//! Applies virtual key presses to an editable text region.
//!
//! The bridge listens for `keyboardPressed {key}` on the bus and turns each
//! value into an edit through the region's selection primitives, without
//! native input focus. The selection is read fresh for every edit because
//! the user may move the caret between virtual key presses.
//!
//! It also wires the page's keyboard open/close controls, which notify the
//! host; the host answers with `keyboardOpen`/`keyboardClose` for the panel.

pub mod region;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::bus::{
    EventBus, Subscription, EVENT_KEYBOARD_CLOSE, EVENT_KEYBOARD_OPEN, EVENT_KEYBOARD_PRESSED,
};
use crate::dom::{ClickPath, KEYBOARD_CLOSE_MARKER, KEYBOARD_OPEN_MARKER};

pub use region::{Direction, EditableRegion, TextRegion, TextSelection};

/// Edit derived from a published key value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    Delete(Direction),
    MoveCaret(Direction),
    Insert(String),
}

impl EditAction {
    /// Maps a `keyboardPressed` value to an edit.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        match key {
            "Backspace" => EditAction::Delete(Direction::Backward),
            "Delete" => EditAction::Delete(Direction::Forward),
            "ArrowLeft" => EditAction::MoveCaret(Direction::Backward),
            "ArrowRight" => EditAction::MoveCaret(Direction::Forward),
            text => EditAction::Insert(text.to_string()),
        }
    }
}

/// Focuses the region and applies one key value to it.
///
/// Returns `false` when there was no selection to edit.
pub fn apply_key(region: &mut dyn EditableRegion, key: &str) -> bool {
    region.focus();

    let Some(selection) = region.selection() else {
        tracing::debug!("no selection in editable region, ignoring {:?}", key);
        return false;
    };

    match EditAction::from_key(key) {
        EditAction::Delete(direction) => delete(region, selection, direction),
        EditAction::MoveCaret(direction) => move_caret(region, selection, direction),
        EditAction::Insert(text) => insert(region, selection, &text),
    }
    true
}

fn delete(region: &mut dyn EditableRegion, selection: TextSelection, direction: Direction) {
    let range = if selection.is_collapsed() {
        // Extend by one character, then delete the extended range
        let extended = TextSelection::new(selection.focus, region.step(selection.focus, direction));
        region.set_selection(extended);
        extended
    } else {
        selection
    };

    region.delete_range(range.range());
    region.set_selection(TextSelection::caret(range.start()));
}

fn move_caret(region: &mut dyn EditableRegion, selection: TextSelection, direction: Direction) {
    let caret = if selection.is_collapsed() {
        region.step(selection.focus, direction)
    } else {
        match direction {
            Direction::Backward => selection.start(),
            Direction::Forward => selection.end(),
        }
    };

    region.set_selection(TextSelection::caret(caret));
}

fn insert(region: &mut dyn EditableRegion, selection: TextSelection, text: &str) {
    let start = selection.start();
    if !selection.is_collapsed() {
        region.delete_range(selection.range());
    }

    region.insert_at(start, text);
    region.set_selection(TextSelection::caret(start + text.len()));
}

/// Connects `keyboardPressed` events to an editable region.
#[derive(Debug)]
pub struct TextEditingBridge {
    bus: Rc<EventBus>,
    subscription: Subscription,
}

impl TextEditingBridge {
    /// Prepares `region` for virtual input, then subscribes to
    /// `keyboardPressed` and edits it.
    ///
    /// Without a region the bridge still subscribes, but every press is a
    /// no-op, as when the page has no editable output element.
    pub fn attach<R>(bus: Rc<EventBus>, region: Option<Rc<RefCell<R>>>) -> Self
    where
        R: EditableRegion + 'static,
    {
        match region.as_ref().map(|r| r.try_borrow_mut()) {
            Some(Ok(mut region)) => region.prepare_for_virtual_input(),
            Some(Err(_)) => tracing::warn!("editable region busy, not prepared for virtual input"),
            None => tracing::info!("no editable region found, key presses will be ignored"),
        }

        let weak = region.as_ref().map(Rc::downgrade);
        let subscription = bus.on(EVENT_KEYBOARD_PRESSED, move |payload: &Value| {
            let Some(key) = payload.get("key").and_then(Value::as_str) else {
                tracing::debug!("keyboardPressed without a string key");
                return;
            };

            let Some(region) = weak.as_ref().and_then(|w| w.upgrade()) else {
                return;
            };

            match region.try_borrow_mut() {
                Ok(mut region) => {
                    apply_key(&mut *region, key);
                }
                Err(_) => tracing::warn!("editable region busy, dropping key {:?}", key),
            };
        });

        Self { bus, subscription }
    }

    /// Handles a document click on the keyboard open/close controls.
    ///
    /// Returns `true` if the click hit one of them.
    pub fn handle_click(&self, path: &ClickPath) -> bool {
        if path.closest(KEYBOARD_OPEN_MARKER).is_some() {
            self.bus.emit_empty(EVENT_KEYBOARD_OPEN);
            return true;
        }

        if path.closest(KEYBOARD_CLOSE_MARKER).is_some() {
            self.bus.emit_empty(EVENT_KEYBOARD_CLOSE);
            return true;
        }

        false
    }

    /// Stops listening for key presses.
    pub fn detach(&self) {
        self.subscription.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{MemoryChannel, MessageEnvelope};
    use crate::dom::{Element, CONTENT_EDITABLE_ATTRIBUTE, INPUT_MODE_ATTRIBUTE};
    use serde_json::json;

    fn press(bus: &EventBus, key: &str) {
        bus.publish_local(EVENT_KEYBOARD_PRESSED, json!({ "key": key }));
    }

    fn setup(text: &str) -> (Rc<EventBus>, MemoryChannel, Rc<RefCell<TextRegion>>, TextEditingBridge) {
        let channel = MemoryChannel::new();
        let bus = EventBus::new(channel.clone());
        channel.take();

        let region = Rc::new(RefCell::new(TextRegion::new(text)));
        let bridge = TextEditingBridge::attach(Rc::clone(&bus), Some(Rc::clone(&region)));
        (bus, channel, region, bridge)
    }

    #[test]
    fn test_attach_prepares_region() {
        let (_bus, _channel, region, _bridge) = setup("hello");
        let region = region.borrow();

        assert_eq!(region.attribute(CONTENT_EDITABLE_ATTRIBUTE), Some("true"));
        assert_eq!(region.attribute(INPUT_MODE_ATTRIBUTE), Some("none"));
    }

    #[test]
    fn test_backspace_with_caret() {
        let (bus, _channel, region, _bridge) = setup("hello world");
        region.borrow_mut().click(5);

        press(&bus, "Backspace");

        assert_eq!(region.borrow().text(), "hell world");
        assert_eq!(region.borrow().caret(), Some(4));
    }

    #[test]
    fn test_delete_forward_with_caret() {
        let (bus, _channel, region, _bridge) = setup("hello world");
        region.borrow_mut().click(5);

        press(&bus, "Delete");

        assert_eq!(region.borrow().text(), "helloworld");
        assert_eq!(region.borrow().caret(), Some(5));
    }

    #[test]
    fn test_delete_with_selection_collapses_to_start() {
        for key in ["Backspace", "Delete"] {
            let (bus, _channel, region, _bridge) = setup("hello world");
            region.borrow_mut().select(9, 3);

            press(&bus, key);

            assert_eq!(region.borrow().text(), "helld");
            assert_eq!(region.borrow().caret(), Some(3));
        }
    }

    #[test]
    fn test_delete_at_edges_is_harmless() {
        let (bus, _channel, region, _bridge) = setup("ab");
        region.borrow_mut().click(0);
        press(&bus, "Backspace");
        assert_eq!(region.borrow().text(), "ab");

        region.borrow_mut().click(2);
        press(&bus, "Delete");
        assert_eq!(region.borrow().text(), "ab");
        assert_eq!(region.borrow().caret(), Some(2));
    }

    #[test]
    fn test_backspace_removes_whole_cluster() {
        let (bus, _channel, region, _bridge) = setup("że\u{301}");
        region.borrow_mut().click(100);

        press(&bus, "Backspace");

        assert_eq!(region.borrow().text(), "ż");
        assert_eq!(region.borrow().caret(), Some("ż".len()));
    }

    #[test]
    fn test_arrows_move_and_collapse() {
        let (bus, _channel, region, _bridge) = setup("hello");
        region.borrow_mut().click(2);

        press(&bus, "ArrowLeft");
        assert_eq!(region.borrow().caret(), Some(1));
        press(&bus, "ArrowRight");
        press(&bus, "ArrowRight");
        assert_eq!(region.borrow().caret(), Some(3));

        region.borrow_mut().select(4, 1);
        press(&bus, "ArrowLeft");
        assert_eq!(region.borrow().caret(), Some(1));

        region.borrow_mut().select(4, 1);
        press(&bus, "ArrowRight");
        assert_eq!(region.borrow().caret(), Some(4));
        assert_eq!(region.borrow().text(), "hello");
    }

    #[test]
    fn test_insert_replaces_selection() {
        let (bus, _channel, region, _bridge) = setup("hello world");
        region.borrow_mut().select(6, 11);

        press(&bus, "Ł");
        press(&bus, " ");

        assert_eq!(region.borrow().text(), "hello Ł ");
        assert_eq!(region.borrow().caret(), Some("hello Ł ".len()));
    }

    #[test]
    fn test_unfocused_region_gets_caret_at_start() {
        let (bus, _channel, region, _bridge) = setup("bc");
        press(&bus, "a");

        assert!(region.borrow().is_focused());
        assert_eq!(region.borrow().text(), "abc");
        assert_eq!(region.borrow().caret(), Some(1));
    }

    #[test]
    fn test_no_selection_after_focus_is_noop() {
        let mut region = TextRegion::disabled("abc");
        assert!(!apply_key(&mut region, "x"));
        assert!(!apply_key(&mut region, "Backspace"));
        assert_eq!(region.text(), "abc");
    }

    #[test]
    fn test_missing_region_or_key_is_noop() {
        let channel = MemoryChannel::new();
        let bus = EventBus::new(channel);
        let _bridge = TextEditingBridge::attach::<TextRegion>(Rc::clone(&bus), None);
        press(&bus, "a");

        let (bus, _channel, region, _bridge) = setup("abc");
        bus.publish_local(EVENT_KEYBOARD_PRESSED, json!({}));
        bus.publish_local(EVENT_KEYBOARD_PRESSED, json!({"key": 5}));
        assert_eq!(region.borrow().text(), "abc");
    }

    #[test]
    fn test_detach_stops_editing() {
        let (bus, _channel, region, bridge) = setup("abc");
        bridge.detach();
        press(&bus, "x");
        assert_eq!(region.borrow().text(), "abc");
    }

    #[test]
    fn test_keyboard_controls_notify_host() {
        let (_bus, channel, _region, bridge) = setup("");

        let open = ClickPath::new(vec![Element::new("button").with_attribute(KEYBOARD_OPEN_MARKER, "")]);
        let close = ClickPath::new(vec![
            Element::new("i"),
            Element::new("button").with_attribute(KEYBOARD_CLOSE_MARKER, ""),
        ]);

        assert!(bridge.handle_click(&open));
        assert!(bridge.handle_click(&close));
        assert!(!bridge.handle_click(&ClickPath::new(vec![Element::new("p")])));

        assert_eq!(
            channel.sent(),
            vec![
                MessageEnvelope::new("keyboardOpen", json!({})),
                MessageEnvelope::new("keyboardClose", json!({})),
            ]
        );
    }

    #[test]
    fn test_edit_action_mapping() {
        assert_eq!(EditAction::from_key("Backspace"), EditAction::Delete(Direction::Backward));
        assert_eq!(EditAction::from_key("Delete"), EditAction::Delete(Direction::Forward));
        assert_eq!(EditAction::from_key("ArrowLeft"), EditAction::MoveCaret(Direction::Backward));
        assert_eq!(EditAction::from_key("ArrowRight"), EditAction::MoveCaret(Direction::Forward));
        assert_eq!(EditAction::from_key("x"), EditAction::Insert("x".to_string()));
    }
}
