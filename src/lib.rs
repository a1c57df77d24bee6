// SPDX-License-Identifier: GPL-3.0-only

//! Multibook - embedded document runtime for an interactive book reader
//!
//! A document runs inside a host context (an iframe in the reader) and talks
//! to it only through tagged messages. This crate provides the document side:
//!
//! 1. **Event bus** (`bus`): named events to the host and from the host,
//!    the late-subscriber `init` replay, and delegated navigation clicks.
//!
//! 2. **Virtual keyboard** (`keyboard`): a Polish on-screen keyboard with
//!    one-shot shift and caps lock, a letters/numbers mode, and a panel the
//!    user can drag around the viewport.
//!
//! 3. **Text editing bridge** (`bridge`): applies published key values to an
//!    editable region through its selection.
//!
//! Everything is single-threaded and driven by the host's event delivery.
//!
//! # Modules
//!
//! - `app`: Composition of bus, keyboard and bridge, plus harness input
//! - `app_settings`: Centralized constants
//! - `bridge`: Key values to text edits
//! - `bus`: Cross-window event bus
//! - `channel`: Message envelope and outbound transports
//! - `config`: JSON configuration file
//! - `dom`: Element and click path model for delegated clicks
//! - `i18n`: Localization support using fluent translations
//! - `keyboard`: Virtual keyboard state, rendering, panel and dragging

pub mod app;
pub mod app_settings;
pub mod bridge;
pub mod bus;
pub mod channel;
pub mod config;
pub mod dom;
pub mod i18n;
pub mod keyboard;

pub use crate::i18n::LANGUAGE_LOADER;

// ============================================================================
// Integration Tests
// ============================================================================
