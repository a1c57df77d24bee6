// SPDX-License-Identifier: GPL-3.0-only

//! Application model wiring the embedded document together.
//!
//! [`Application`] builds the bus, the keyboard panel and the editing bridge
//! once per document and routes document-level input to them. The harness
//! binary feeds it [`HarnessInput`] lines; a browser binding would call the
//! same methods from its event listeners.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::{TextEditingBridge, TextRegion};
use crate::bus::EventBus;
use crate::channel::Channel;
use crate::config::Config;
use crate::dom::{ClickPath, Element};
use crate::keyboard::{KeyboardMode, KeyboardPanel, Point, ShiftState, Size};

/// One line of harness input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarnessInput {
    /// A raw message from the host context
    Message(Value),
    /// A document click, target element first
    Click(ClickPath),
    /// A virtual key button press by identifier
    Press(String),
    /// The keyboard's own close control
    Close,
    /// Pointer pressed on the keyboard panel
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        on_button: bool,
    },
    /// Pointer moved in the document
    PointerMove { x: f64, y: f64 },
    /// Pointer released in the document
    PointerUp,
    /// The viewport was resized
    Viewport { width: f64, height: f64 },
    /// A user click inside the editable region at a byte offset
    RegionClick { offset: usize },
    /// A user selection inside the editable region
    Select { anchor: usize, focus: usize },
    /// Request a [`Snapshot`]
    Snapshot,
}

/// Observable state, printed by the harness on request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub text: Option<String>,
    pub caret: Option<usize>,
    pub keyboard_visible: bool,
    pub shift: ShiftState,
    pub mode: KeyboardMode,
    pub position: (f64, f64),
}

/// The embedded document: bus, keyboard panel and editing bridge.
#[derive(Debug)]
pub struct Application {
    bus: Rc<EventBus>,
    panel: Rc<RefCell<KeyboardPanel>>,
    bridge: TextEditingBridge,
    region: Option<Rc<RefCell<TextRegion>>>,
}

impl Application {
    /// Builds the document components. The bus announces `ready` here.
    ///
    /// Without a `region` the keyboard still works but edits nothing.
    pub fn start(channel: impl Channel + 'static, config: &Config, region: Option<TextRegion>) -> Self {
        let bus = EventBus::new(channel);
        let panel = KeyboardPanel::attached(Rc::clone(&bus), config);
        let region = region.map(|r| Rc::new(RefCell::new(r)));
        let bridge = TextEditingBridge::attach(Rc::clone(&bus), region.clone());

        tracing::info!("embedded document initialized");
        Self {
            bus,
            panel,
            bridge,
            region,
        }
    }

    #[must_use]
    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    #[must_use]
    pub fn panel(&self) -> &Rc<RefCell<KeyboardPanel>> {
        &self.panel
    }

    #[must_use]
    pub fn region(&self) -> Option<&Rc<RefCell<TextRegion>>> {
        self.region.as_ref()
    }

    /// Routes a document click to every delegated click handler.
    pub fn click(&self, path: &ClickPath) {
        self.bus.handle_click(path);
        self.bridge.handle_click(path);
    }

    /// Applies one harness input. Returns a snapshot when one was requested.
    pub fn apply(&self, input: HarnessInput, now: Instant) -> Option<Snapshot> {
        match input {
            HarnessInput::Message(value) => self.bus.receive_value(value),
            HarnessInput::Click(path) => self.click(&path),
            HarnessInput::Press(identifier) => self.panel.borrow_mut().press(&identifier, now),
            HarnessInput::Close => self.panel.borrow_mut().close(),
            HarnessInput::PointerDown { x, y, on_button } => {
                let path = if on_button {
                    ClickPath::new(vec![Element::new("button")])
                } else {
                    ClickPath::default()
                };
                self.panel.borrow_mut().pointer_down(Point::new(x, y), &path);
            }
            HarnessInput::PointerMove { x, y } => {
                self.panel.borrow_mut().pointer_move(Point::new(x, y));
            }
            HarnessInput::PointerUp => {
                self.panel.borrow_mut().pointer_up();
            }
            HarnessInput::Viewport { width, height } => {
                self.panel.borrow_mut().set_viewport(Size::new(width, height));
            }
            HarnessInput::RegionClick { offset } => {
                if let Some(region) = &self.region {
                    region.borrow_mut().click(offset);
                }
            }
            HarnessInput::Select { anchor, focus } => {
                if let Some(region) = &self.region {
                    region.borrow_mut().select(anchor, focus);
                }
            }
            HarnessInput::Snapshot => return Some(self.snapshot()),
        }
        None
    }

    /// Current observable state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let panel = self.panel.borrow();
        let state = panel.keyboard_state();
        let position = panel.position();
        let region = self.region.as_ref().map(|r| r.borrow());

        Snapshot {
            text: region.as_ref().map(|r| r.text().to_string()),
            caret: region.as_ref().and_then(|r| r.caret()),
            keyboard_visible: panel.is_visible(),
            shift: state.shift,
            mode: state.mode,
            position: (position.x, position.y),
        }
    }
}
