// SPDX-License-Identifier: GPL-3.0-only

//! Centralized application settings and constants.

/// Tag carried by every envelope exchanged with the host page.
pub const MESSAGE_KIND: &str = "multibook:event";

/// Maximum time between two shift presses that still counts as a double tap.
pub const DOUBLE_TAP_THRESHOLD_MS: u64 = 300;

/// Minimum distance kept between the dragged keyboard and the viewport edges.
pub const DRAG_MARGIN: f64 = 10.0;

/// Keyboard width used to compute the default position on show.
pub const DEFAULT_PANEL_WIDTH: f64 = 656.0;

/// Keyboard height used to compute the default position on show.
pub const DEFAULT_PANEL_HEIGHT: f64 = 300.0;

/// Gap between the bottom of the viewport and the keyboard on show.
pub const DEFAULT_BOTTOM_OFFSET: f64 = 50.0;

/// Viewport assumed until the host reports a real one.
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1280.0;

/// Viewport assumed until the host reports a real one.
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;

/// Locale used for key labels when nothing else is requested.
pub const DEFAULT_LOCALE: &str = "pl";
