// SPDX-License-Identifier: GPL-3.0-only

//! Virtual keyboard for the embedded document.
//!
//! # Features
//!
//! - **State machine**: one-shot shift, double-tap caps lock, letters/numbers
//!   modes, resolution of button presses into key values
//! - **Panel**: visibility, the open/close handshake with the host, and the
//!   button grid view model
//! - **Dragging**: free placement of the panel, clamped to the viewport
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use multibook::keyboard::KeyboardPanel;
//!
//! let panel = KeyboardPanel::attached(bus.clone(), &config);
//! panel.borrow_mut().show();
//! panel.borrow_mut().press("shift", Instant::now());
//! panel.borrow_mut().press("a", Instant::now()); // publishes keyboardPressed {key: "A"}
//! ```

pub mod drag;
pub mod layout;
pub mod panel;
pub mod render;
pub mod state;

pub use drag::{DragController, DragState, Point, Size};
pub use layout::KeyboardLayout;
pub use panel::KeyboardPanel;
pub use render::{KeyButton, KeyLabels, RenderedKeyboard};
pub use state::{Key, KeyOutcome, KeyboardMode, KeyboardState, KeyboardStateMachine, ShiftState};
