// SPDX-License-Identifier: GPL-3.0-only

//! Event bus between the embedded document and its host page.
//!
//! The bus sits on top of a [`Channel`]. Outbound events are wrapped in a
//! [`MessageEnvelope`] and handed to the channel; inbound envelopes are fanned
//! out to the callbacks registered for their event name.
//!
//! # Init Replay
//!
//! The host sends `init` once, possibly before every consumer has
//! subscribed. The bus keeps the last `init` payload and hands it to any
//! callback that subscribes to `init` afterwards, immediately and in
//! addition to registering it.
//!
//! # Re-entrancy
//!
//! Fan-out works on a snapshot of the listeners taken when dispatch starts,
//! so callbacks may subscribe, unsubscribe or publish while being invoked.
//! Callbacks added during dispatch wait for the next event; callbacks removed
//! during dispatch are skipped if they have not run yet.
//!
//! # Example
//!
//! ```rust,ignore
//! use multibook::bus::EventBus;
//! use multibook::channel::MemoryChannel;
//!
//! let bus = EventBus::new(MemoryChannel::new()); // sends `ready`
//! let sub = bus.on("init", |payload| println!("init: {}", payload));
//! bus.emit("goToPage", serde_json::json!({"page": 3}));
//! sub.unsubscribe();
//! ```

mod navigation;
pub mod registry;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::channel::{empty_payload, Channel, MessageEnvelope};

pub use registry::{Callback, ListenerId, ListenerRegistry};

// ============================================================================
// Event Names
// ============================================================================

/// Embedded document finished initializing.
pub const EVENT_READY: &str = "ready";
/// Host configuration: tools and table of contents.
pub const EVENT_INIT: &str = "init";
/// Request to navigate to a page.
pub const EVENT_GO_TO_PAGE: &str = "goToPage";
/// A tool element was clicked.
pub const EVENT_TOOL_CLICKED: &str = "toolClicked";
/// Request to close the host modal.
pub const EVENT_CLOSE_MODAL: &str = "closeModal";
/// Open the virtual keyboard.
pub const EVENT_KEYBOARD_OPEN: &str = "keyboardOpen";
/// Close the virtual keyboard.
pub const EVENT_KEYBOARD_CLOSE: &str = "keyboardClose";
/// A virtual key resolved to a value.
pub const EVENT_KEYBOARD_PRESSED: &str = "keyboardPressed";

/// State derived from the last `init` message.
#[derive(Debug, Default)]
struct InitState {
    payload: Option<Value>,
    tools: Vec<Value>,
    table_of_content: Vec<Value>,
}

/// Publish/subscribe bus over a cross-context [`Channel`].
///
/// Construct one per document with [`EventBus::new`] and share the returned
/// `Rc` with every consumer.
pub struct EventBus {
    channel: Box<dyn Channel>,
    registry: Rc<RefCell<ListenerRegistry>>,
    init: RefCell<InitState>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("registry", &self.registry.borrow())
            .field("init", &self.init.borrow())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Creates the bus and announces `ready` to the host.
    pub fn new(channel: impl Channel + 'static) -> Rc<Self> {
        let bus = Rc::new(Self {
            channel: Box::new(channel),
            registry: Rc::new(RefCell::new(ListenerRegistry::new())),
            init: RefCell::new(InitState::default()),
        });

        tracing::info!("event bus created, announcing ready");
        bus.emit_empty(EVENT_READY);
        bus
    }

    // ========================================================================
    // Outbound
    // ========================================================================

    /// Sends an event to the host context.
    ///
    /// Delivery is fire-and-forget: channel failures are logged and dropped.
    pub fn emit(&self, event: &str, payload: Value) {
        let envelope = MessageEnvelope::new(event, payload);
        tracing::debug!("emit {}", event);

        if let Err(e) = self.channel.send(&envelope) {
            tracing::warn!("failed to deliver {} to host: {}", event, e);
        }
    }

    /// Sends an event with an empty `{}` payload.
    pub fn emit_empty(&self, event: &str) {
        self.emit(event, empty_payload());
    }

    /// Delivers an event to this document's own subscribers.
    ///
    /// The envelope goes through the same path as host messages, so it is
    /// subject to the same tag check and `init` bookkeeping.
    pub fn publish_local(&self, event: &str, payload: Value) {
        self.receive(MessageEnvelope::new(event, payload));
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Registers a callback for an event.
    ///
    /// Subscribing to `init` after an `init` message was received also
    /// invokes the callback right away with the stored payload.
    pub fn on(&self, event: &str, callback: impl Fn(&Value) + 'static) -> Subscription {
        self.on_shared(event, Rc::new(callback))
    }

    /// Registers a shared callback for an event.
    ///
    /// Registering the same `Rc` twice for one event keeps a single
    /// registration; both returned handles refer to it.
    pub fn on_shared(&self, event: &str, callback: Callback) -> Subscription {
        let id = self.registry.borrow_mut().insert(event, Rc::clone(&callback));
        tracing::trace!("subscribed to {}", event);

        if event == EVENT_INIT {
            let replay = self.init.borrow().payload.clone();
            if let Some(payload) = replay {
                tracing::debug!("replaying init payload to late subscriber");
                callback(&payload);
            }
        }

        Subscription {
            registry: Rc::downgrade(&self.registry),
            event: event.to_string(),
            id,
            active: Cell::new(true),
        }
    }

    /// Number of callbacks registered for an event.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.registry.borrow().len(event)
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Handles an envelope received from the channel.
    ///
    /// Envelopes with a foreign tag are ignored. Every callback registered
    /// for the event when dispatch starts, and still registered when its
    /// turn comes, is invoked once, in order.
    pub fn receive(&self, envelope: MessageEnvelope) {
        if !envelope.has_expected_kind() {
            tracing::trace!("ignoring message with foreign tag {:?}", envelope.kind);
            return;
        }

        let MessageEnvelope { event, payload, .. } = envelope;

        if event == EVENT_INIT {
            self.store_init(&payload);
        }

        let callbacks = self.registry.borrow().snapshot(&event);
        if callbacks.is_empty() {
            tracing::trace!("no subscribers for {}", event);
            return;
        }

        tracing::debug!("dispatching {} to {} subscriber(s)", event, callbacks.len());
        for (id, callback) in callbacks {
            // An earlier callback may have unsubscribed this one
            if !self.registry.borrow().contains(&event, id) {
                continue;
            }
            callback(&payload);
        }
    }

    /// Handles a raw message value; anything not shaped like an envelope is
    /// ignored.
    pub fn receive_value(&self, value: Value) {
        match MessageEnvelope::from_value(value) {
            Some(envelope) => self.receive(envelope),
            None => tracing::trace!("ignoring malformed message"),
        }
    }

    /// Handles a message serialized as JSON text.
    pub fn receive_json(&self, text: &str) {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.receive_value(value),
            Err(e) => tracing::trace!("ignoring unparsable message: {}", e),
        }
    }

    fn store_init(&self, payload: &Value) {
        let mut init = self.init.borrow_mut();

        init.tools = array_field(payload, "tools");
        init.table_of_content = array_field(payload, "table_of_content");
        init.payload = Some(if payload.is_null() {
            empty_payload()
        } else {
            payload.clone()
        });

        tracing::info!(
            "received init with {} tool(s) and {} table of content entries",
            init.tools.len(),
            init.table_of_content.len()
        );
    }

    // ========================================================================
    // Init Accessors
    // ========================================================================

    /// The last `init` payload, if one was received.
    #[must_use]
    pub fn init_payload(&self) -> Option<Value> {
        self.init.borrow().payload.clone()
    }

    /// Tools from the last `init` payload.
    #[must_use]
    pub fn tools(&self) -> Vec<Value> {
        self.init.borrow().tools.clone()
    }

    /// Table of contents from the last `init` payload.
    #[must_use]
    pub fn table_of_content(&self) -> Vec<Value> {
        self.init.borrow().table_of_content.clone()
    }

    fn find_tool(&self, tool_id: &str) -> Option<Value> {
        self.init
            .borrow()
            .tools
            .iter()
            .find(|tool| tool.get("id").and_then(id_string).as_deref() == Some(tool_id))
            .cloned()
    }
}

/// Handle to one bus registration.
///
/// Dropping the handle leaves the callback registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<RefCell<ListenerRegistry>>,
    event: String,
    id: ListenerId,
    active: Cell<bool>,
}

impl Subscription {
    /// Removes this registration. Later calls do nothing.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }

        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(&self.event, self.id);
            tracing::trace!("unsubscribed from {}", self.event);
        }
    }
}

fn array_field(payload: &Value, field: &str) -> Vec<Value> {
    payload
        .get(field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// String form of a tool id, matching how ids appear in attributes.
fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
