// SPDX-License-Identifier: GPL-3.0-only

//! The floating keyboard panel.
//!
//! The panel ties the state machine, the drag controller and the event bus
//! together. It owns visibility and takes part in the open/close handshake
//! with the host:
//!
//! - `keyboardOpen` from the host shows the panel.
//! - `keyboardClose` from the host hides it **silently**.
//! - The panel's own close control hides it and tells the host with one
//!   outbound `keyboardClose`.
//!
//! Answering a host close with another close would bounce the message back
//! and forth forever, hence the asymmetry.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use serde_json::json;

use crate::app_settings::{DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH};
use crate::bus::{
    EventBus, Subscription, EVENT_KEYBOARD_CLOSE, EVENT_KEYBOARD_OPEN, EVENT_KEYBOARD_PRESSED,
};
use crate::config::Config;
use crate::dom::ClickPath;
use crate::keyboard::drag::{DragController, Point, Size};
use crate::keyboard::layout::KeyboardLayout;
use crate::keyboard::render::{render, KeyLabels, RenderedKeyboard, CLOSE_IDENTIFIER};
use crate::keyboard::state::{Key, KeyOutcome, KeyboardState, KeyboardStateMachine};

/// CSS class of the panel root.
pub const ROOT_CLASS: &str = "virtual-keyboard";

/// CSS class added to the panel root while hidden.
pub const HIDDEN_CLASS: &str = "virtual-keyboard--hidden";

/// Keyboard surface with visibility, key handling and dragging.
#[derive(Debug)]
pub struct KeyboardPanel {
    bus: Rc<EventBus>,
    layout: KeyboardLayout,
    labels: KeyLabels,
    machine: KeyboardStateMachine,
    drag: DragController,
    visible: bool,
    viewport: Size,
    default_size: Size,
    measured_size: Option<Size>,
    subscriptions: Vec<Subscription>,
}

impl KeyboardPanel {
    /// Creates a hidden panel with localized labels.
    pub fn new(bus: Rc<EventBus>, config: &Config) -> Self {
        Self::with_labels(bus, config, KeyLabels::localized())
    }

    /// Creates a hidden panel with explicit labels.
    pub fn with_labels(bus: Rc<EventBus>, config: &Config, labels: KeyLabels) -> Self {
        Self {
            bus,
            layout: config.layout.clone(),
            labels,
            machine: KeyboardStateMachine::new(config.double_tap_threshold()),
            drag: DragController::new(config.drag_margin, config.bottom_offset),
            visible: false,
            viewport: Size::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT),
            default_size: Size::new(config.panel_width, config.panel_height),
            measured_size: None,
            subscriptions: Vec::new(),
        }
    }

    /// Creates a panel and subscribes it to the host's open/close events.
    pub fn attached(bus: Rc<EventBus>, config: &Config) -> Rc<RefCell<Self>> {
        let panel = Rc::new(RefCell::new(Self::new(bus, config)));
        Self::attach(&panel);
        panel
    }

    /// Subscribes a shared panel to `keyboardOpen` and `keyboardClose`.
    ///
    /// The callbacks hold a weak reference, so the subscriptions do not keep
    /// the panel alive.
    pub fn attach(panel: &Rc<RefCell<Self>>) {
        let bus = Rc::clone(&panel.borrow().bus);

        let weak = Rc::downgrade(panel);
        let open = bus.on(EVENT_KEYBOARD_OPEN, move |_| {
            with_panel(&weak, |panel| {
                panel.show();
            });
        });

        let weak = Rc::downgrade(panel);
        let close = bus.on(EVENT_KEYBOARD_CLOSE, move |_| {
            with_panel(&weak, |panel| {
                panel.hide_silently();
            });
        });

        panel.borrow_mut().subscriptions.extend([open, close]);
    }

    /// Removes the panel's bus subscriptions.
    pub fn detach(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }

    // ========================================================================
    // Visibility
    // ========================================================================

    /// Shows the panel at its default position with a fresh keyboard state.
    ///
    /// Returns `false` if it was already visible.
    pub fn show(&mut self) -> bool {
        if self.visible {
            return false;
        }

        self.visible = true;
        self.drag.reset(self.viewport, self.default_size);
        self.machine.reset_for_show();
        tracing::info!("keyboard shown at {:?}", self.drag.position());
        true
    }

    /// Hides the panel without notifying the host.
    ///
    /// Used when the host itself asked for the close. Returns `false` if the
    /// panel was already hidden.
    pub fn hide_silently(&mut self) -> bool {
        if !self.visible {
            return false;
        }

        self.visible = false;
        self.drag.pointer_up();
        tracing::info!("keyboard hidden");
        true
    }

    /// Handles the panel's own close control: hides and notifies the host.
    ///
    /// Nothing is sent if the panel was already hidden.
    pub fn close(&mut self) {
        if self.hide_silently() {
            self.bus.emit_empty(EVENT_KEYBOARD_CLOSE);
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// CSS classes of the panel root.
    #[must_use]
    pub fn root_classes(&self) -> Vec<&'static str> {
        if self.visible {
            vec![ROOT_CLASS]
        } else {
            vec![ROOT_CLASS, HIDDEN_CLASS]
        }
    }

    /// Cursor shown over the panel background.
    #[must_use]
    pub fn cursor(&self) -> &'static str {
        if self.drag.is_dragging() {
            "grabbing"
        } else {
            "grab"
        }
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Handles a button press by identifier.
    ///
    /// Keys that produce a value are published locally as
    /// `keyboardPressed {key}`. The close control closes the panel.
    pub fn press(&mut self, identifier: &str, now: Instant) {
        if identifier == CLOSE_IDENTIFIER {
            self.close();
            return;
        }

        let key = Key::from_identifier(identifier);

        match self.machine.press(&key, now) {
            KeyOutcome::Emit(value) => {
                tracing::debug!("key {:?} resolved to {:?}", identifier, value);
                self.bus
                    .publish_local(EVENT_KEYBOARD_PRESSED, json!({ "key": value }));
            }
            KeyOutcome::StateChanged => {}
        }
    }

    /// Current button grid.
    #[must_use]
    pub fn render(&self) -> RenderedKeyboard {
        render(&self.layout, &self.machine.state(), &self.labels)
    }

    /// Current keyboard state.
    #[must_use]
    pub fn keyboard_state(&self) -> KeyboardState {
        self.machine.state()
    }

    // ========================================================================
    // Geometry And Dragging
    // ========================================================================

    /// Updates the viewport size used for placement and clamping.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Records the panel's rendered size; used for clamping while dragging.
    pub fn set_measured_size(&mut self, size: Size) {
        self.measured_size = Some(size);
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.drag.position()
    }

    /// Pointer pressed on the panel. `path` is the pressed element and its
    /// ancestors inside the panel; presses on buttons never start a drag, and
    /// a hidden panel cannot be grabbed.
    pub fn pointer_down(&mut self, pointer: Point, path: &ClickPath) -> bool {
        if !self.visible {
            return false;
        }
        self.drag.pointer_down(pointer, path.is_within_button())
    }

    /// Pointer moved anywhere in the document.
    pub fn pointer_move(&mut self, pointer: Point) -> Option<Point> {
        let panel = self.measured_size.unwrap_or(self.default_size);
        self.drag.pointer_move(pointer, self.viewport, panel)
    }

    /// Pointer released anywhere in the document.
    pub fn pointer_up(&mut self) -> bool {
        self.drag.pointer_up()
    }
}

fn with_panel(weak: &Weak<RefCell<KeyboardPanel>>, f: impl FnOnce(&mut KeyboardPanel)) {
    let Some(panel) = weak.upgrade() else {
        return;
    };

    match panel.try_borrow_mut() {
        Ok(mut panel) => f(&mut panel),
        Err(_) => tracing::warn!("keyboard panel busy, dropping host event"),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{MemoryChannel, MessageEnvelope};
    use crate::dom::Element;
    use crate::keyboard::state::{KeyboardMode, ShiftState};
    use serde_json::Value;
    use std::time::Duration;

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

    fn setup() -> (Rc<EventBus>, MemoryChannel, Rc<RefCell<KeyboardPanel>>) {
        let channel = MemoryChannel::new();
        let bus = EventBus::new(channel.clone());
        channel.take();

        let panel = Rc::new(RefCell::new(KeyboardPanel::with_labels(
            Rc::clone(&bus),
            &Config::default(),
            labels(),
        )));
        KeyboardPanel::attach(&panel);
        panel.borrow_mut().set_viewport(Size::new(1000.0, 800.0));
        (bus, channel, panel)
    }

    fn from_host(bus: &EventBus, event: &str) {
        bus.receive(MessageEnvelope::new(event, json!({})));
    }

    fn pressed_keys(bus: &EventBus) -> Rc<RefCell<Vec<String>>> {
        let keys = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&keys);
        bus.on(EVENT_KEYBOARD_PRESSED, move |payload: &Value| {
            if let Some(key) = payload["key"].as_str() {
                log.borrow_mut().push(key.to_string());
            }
        });
        keys
    }

    #[test]
    fn test_host_open_shows_panel() {
        let (bus, channel, panel) = setup();
        assert!(!panel.borrow().is_visible());
        assert_eq!(panel.borrow().root_classes(), vec![ROOT_CLASS, HIDDEN_CLASS]);

        from_host(&bus, EVENT_KEYBOARD_OPEN);

        assert!(panel.borrow().is_visible());
        assert_eq!(panel.borrow().root_classes(), vec![ROOT_CLASS]);
        assert_eq!(panel.borrow().position(), Point::new(172.0, 450.0));
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn test_host_close_never_echoes() {
        let (bus, channel, panel) = setup();
        from_host(&bus, EVENT_KEYBOARD_OPEN);
        from_host(&bus, EVENT_KEYBOARD_CLOSE);
        from_host(&bus, EVENT_KEYBOARD_CLOSE);

        assert!(!panel.borrow().is_visible());
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn test_user_close_emits_exactly_once() {
        let (bus, channel, panel) = setup();
        from_host(&bus, EVENT_KEYBOARD_OPEN);

        panel.borrow_mut().close();
        panel.borrow_mut().close();

        assert!(!panel.borrow().is_visible());
        assert_eq!(channel.sent(), vec![MessageEnvelope::new("keyboardClose", json!({}))]);
    }

    #[test]
    fn test_show_is_idempotent_and_resets_state() {
        let (_bus, _channel, panel) = setup();
        let t0 = Instant::now();
        let mut panel = panel.borrow_mut();

        panel.show();
        panel.press("shift", t0);
        panel.press("shift", t0 + Duration::from_millis(50));
        panel.press("123", t0);
        panel.pointer_down(Point::new(200.0, 460.0), &ClickPath::default());
        panel.pointer_move(Point::new(100.0, 100.0));
        panel.pointer_up();
        let moved = panel.position();

        // Already visible: nothing is reset
        assert!(!panel.show());
        assert_eq!(panel.keyboard_state().shift, ShiftState::CapsLock);
        assert_eq!(panel.position(), moved);

        panel.hide_silently();
        assert!(panel.show());
        let state = panel.keyboard_state();
        assert_eq!(state.shift, ShiftState::Off);
        assert_eq!(state.mode, KeyboardMode::Letters);
        assert_eq!(panel.position(), Point::new(172.0, 450.0));
    }

    #[test]
    fn test_press_publishes_resolved_value() {
        let (bus, channel, panel) = setup();
        let keys = pressed_keys(&bus);
        let t0 = Instant::now();

        {
            let mut panel = panel.borrow_mut();
            panel.show();
            panel.press("shift", t0);
            panel.press("ż", t0 + Duration::from_millis(500));
            panel.press("a", t0 + Duration::from_millis(600));
            panel.press("space", t0 + Duration::from_millis(700));
            panel.press("backspace", t0 + Duration::from_millis(800));
            panel.press("123", t0 + Duration::from_millis(900));
        }

        assert_eq!(*keys.borrow(), vec!["Ż", "a", " ", "Backspace"]);
        // Key presses stay local
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn test_render_tracks_state() {
        let (_bus, _channel, panel) = setup();
        let mut panel = panel.borrow_mut();
        panel.show();
        panel.press("shift", Instant::now());

        let view = panel.render();
        assert_eq!(view.rows[0][0].label, "A");
        assert!(view.button("shift").unwrap().active);

        panel.press("123", Instant::now());
        assert_eq!(panel.render().rows[0][0].label, "1");
    }

    #[test]
    fn test_drag_ignores_buttons_and_updates_cursor() {
        let (_bus, _channel, panel) = setup();
        let mut panel = panel.borrow_mut();
        panel.show();

        let on_key = ClickPath::new(vec![Element::new("span"), Element::new("button")]);
        assert!(!panel.pointer_down(Point::new(200.0, 460.0), &on_key));
        assert_eq!(panel.cursor(), "grab");

        let on_background = ClickPath::new(vec![Element::new("div")]);
        assert!(panel.pointer_down(Point::new(200.0, 460.0), &on_background));
        assert_eq!(panel.cursor(), "grabbing");

        // Measured size is used for clamping
        panel.set_measured_size(Size::new(700.0, 320.0));
        let pos = panel.pointer_move(Point::new(5000.0, 5000.0)).unwrap();
        assert_eq!(pos, Point::new(290.0, 470.0));

        assert!(panel.pointer_up());
        assert_eq!(panel.cursor(), "grab");
    }

    #[test]
    fn test_close_control_press_closes_and_notifies() {
        let (bus, channel, panel) = setup();
        let keys = pressed_keys(&bus);
        from_host(&bus, EVENT_KEYBOARD_OPEN);

        let close = panel.borrow().render().close;
        panel.borrow_mut().press(&close.identifier, Instant::now());

        assert!(!panel.borrow().is_visible());
        assert!(keys.borrow().is_empty());
        assert_eq!(channel.sent(), vec![MessageEnvelope::new("keyboardClose", json!({}))]);
    }

    #[test]
    fn test_hidden_panel_cannot_be_dragged() {
        let (_bus, _channel, panel) = setup();
        let mut panel = panel.borrow_mut();
        let before = panel.position();

        assert!(!panel.pointer_down(Point::new(200.0, 460.0), &ClickPath::default()));
        assert_eq!(panel.pointer_move(Point::new(300.0, 300.0)), None);
        assert_eq!(panel.cursor(), "grab");
        assert_eq!(panel.position(), before);
    }

    #[test]
    fn test_detach_stops_host_events() {
        let (bus, _channel, panel) = setup();
        panel.borrow_mut().detach();
        assert_eq!(bus.listener_count(EVENT_KEYBOARD_OPEN), 0);

        from_host(&bus, EVENT_KEYBOARD_OPEN);
        assert!(!panel.borrow().is_visible());
    }

    #[test]
    fn test_dropped_panel_ignores_host_events() {
        let (bus, _channel, panel) = setup();
        drop(panel);
        from_host(&bus, EVENT_KEYBOARD_OPEN);
        from_host(&bus, EVENT_KEYBOARD_CLOSE);
    }
}
