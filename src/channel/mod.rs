// SPDX-License-Identifier: GPL-3.0-only

//! Cross-context message channel.
//!
//! The embedded document talks to its host page through tagged envelopes.
//! This module defines the envelope wire format and the [`Channel`] seam the
//! [`EventBus`](crate::bus::EventBus) sends through, so the transport can be a
//! real `postMessage` binding, an in-process queue, or a test recorder.
//!
//! # Wire Format
//!
//! ```json
//! { "type": "multibook:event", "event": "goToPage", "payload": { "page": 3 } }
//! ```
//!
//! The tag is written as `type`; `kind` is accepted as an alias on input.
//! The two name one field, so a message carrying both keys does not decode
//! and is ignored like any other malformed message.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::app_settings::MESSAGE_KIND;

/// A single message exchanged with the host context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Constant tag identifying multibook traffic
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    /// Event name (see the event catalog in the crate docs)
    pub event: String,
    /// Structured payload, `{}` when absent
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

impl MessageEnvelope {
    /// Creates an envelope carrying the multibook tag.
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: MESSAGE_KIND.to_string(),
            event: event.into(),
            payload,
        }
    }

    /// Returns `true` if the envelope carries the multibook tag.
    #[must_use]
    pub fn has_expected_kind(&self) -> bool {
        self.kind == MESSAGE_KIND
    }

    /// Decodes an envelope from an arbitrary message value.
    ///
    /// Returns `None` for anything that is not shaped like an envelope.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

/// An empty JSON object, the default payload.
#[must_use]
pub fn empty_payload() -> Value {
    Value::Object(Map::new())
}

/// Errors reported by a channel when delivery fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The receiving side is gone.
    Closed,
    /// The envelope could not be encoded for the transport.
    Encode(String),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Closed => write!(f, "channel closed"),
            ChannelError::Encode(msg) => write!(f, "failed to encode envelope: {}", msg),
        }
    }
}

impl std::error::Error for ChannelError {}

/// Outbound half of the cross-context transport.
///
/// Inbound traffic does not go through this trait: the owner of the
/// transport hands received envelopes to
/// [`EventBus::receive`](crate::bus::EventBus::receive).
pub trait Channel {
    /// Delivers an envelope to the host context.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] when the transport cannot deliver. Callers
    /// on the event bus treat delivery as fire-and-forget.
    fn send(&self, envelope: &MessageEnvelope) -> Result<(), ChannelError>;
}

// ============================================================================
// In-Memory Channel
// ============================================================================

/// Channel that records every sent envelope.
///
/// Clones share the same record, so a test can keep one clone and hand the
/// other to the bus.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    sent: Rc<RefCell<Vec<MessageEnvelope>>>,
}

impl MemoryChannel {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<MessageEnvelope> {
        self.sent.borrow().clone()
    }

    /// Returns the event names sent so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|e| e.event.clone()).collect()
    }

    /// Drains the record.
    pub fn take(&self) -> Vec<MessageEnvelope> {
        std::mem::take(&mut *self.sent.borrow_mut())
    }
}

impl Channel for MemoryChannel {
    fn send(&self, envelope: &MessageEnvelope) -> Result<(), ChannelError> {
        self.sent.borrow_mut().push(envelope.clone());
        Ok(())
    }
}

// ============================================================================
// Queue Channel
// ============================================================================

/// Channel backed by an unbounded futures queue.
///
/// The receiver is drained by whatever owns the real transport, e.g. the
/// harness writing envelopes to stdout.
#[derive(Debug, Clone)]
pub struct QueueChannel {
    tx: mpsc::UnboundedSender<MessageEnvelope>,
}

impl QueueChannel {
    /// Creates the channel and the receiver of outbound envelopes.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MessageEnvelope>) {
        let (tx, rx) = mpsc::unbounded();
        (Self { tx }, rx)
    }
}

impl Channel for QueueChannel {
    fn send(&self, envelope: &MessageEnvelope) -> Result<(), ChannelError> {
        self.tx
            .unbounded_send(envelope.clone())
            .map_err(|_| ChannelError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_format() {
        let envelope = MessageEnvelope::new("goToPage", json!({"page": 3}));
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            value,
            json!({"type": "multibook:event", "event": "goToPage", "payload": {"page": 3}})
        );
    }

    #[test]
    fn test_envelope_accepts_kind_alias_and_missing_payload() {
        let envelope =
            MessageEnvelope::from_value(json!({"kind": "multibook:event", "event": "ready"}))
                .unwrap();

        assert!(envelope.has_expected_kind());
        assert_eq!(envelope.payload, json!({}));
    }

    #[test]
    fn test_malformed_values_do_not_decode() {
        assert!(MessageEnvelope::from_value(json!("hello")).is_none());
        assert!(MessageEnvelope::from_value(json!({"type": "multibook:event"})).is_none());
        assert!(MessageEnvelope::from_value(json!(null)).is_none());
    }

    #[test]
    fn test_both_tag_keys_do_not_decode() {
        let value = json!({
            "type": "multibook:event",
            "kind": "multibook:event",
            "event": "ready"
        });
        assert!(MessageEnvelope::from_value(value).is_none());
    }

    #[test]
    fn test_memory_channel_records_in_order() {
        let channel = MemoryChannel::new();
        let observer = channel.clone();

        channel.send(&MessageEnvelope::new("ready", empty_payload())).unwrap();
        channel.send(&MessageEnvelope::new("closeModal", empty_payload())).unwrap();

        assert_eq!(observer.events(), vec!["ready", "closeModal"]);
        assert_eq!(observer.take().len(), 2);
        assert!(observer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_queue_channel_delivers_and_reports_closed() {
        let (channel, mut rx) = QueueChannel::new();

        channel.send(&MessageEnvelope::new("ready", empty_payload())).unwrap();
        let received = rx.next().await.unwrap();
        assert_eq!(received.event, "ready");

        drop(rx);
        let err = channel
            .send(&MessageEnvelope::new("ready", empty_payload()))
            .unwrap_err();
        assert_eq!(err, ChannelError::Closed);
    }
}
