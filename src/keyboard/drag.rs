// SPDX-License-Identifier: GPL-3.0-only

//! Free dragging of the keyboard panel with viewport clamping.

use crate::app_settings::{DEFAULT_BOTTOM_OFFSET, DRAG_MARGIN};

/// A point or offset in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Drag session state and the panel position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragState {
    /// Whether a drag is in progress
    pub dragging: bool,
    /// Pointer position relative to the panel origin at drag start
    pub pointer_offset: Point,
    /// Panel top-left corner
    pub position: Point,
}

/// Moves the panel along with the pointer, keeping it inside the viewport.
#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    margin: f64,
    bottom_offset: f64,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(DRAG_MARGIN, DEFAULT_BOTTOM_OFFSET)
    }
}

impl DragController {
    #[must_use]
    pub fn new(margin: f64, bottom_offset: f64) -> Self {
        Self {
            state: DragState::default(),
            margin,
            bottom_offset,
        }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.state.position
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.state.dragging
    }

    /// Places the panel centered horizontally near the viewport bottom and
    /// ends any drag in progress.
    ///
    /// The default placement is not clamped.
    pub fn reset(&mut self, viewport: Size, panel: Size) {
        self.state = DragState {
            dragging: false,
            pointer_offset: Point::default(),
            position: Point::new(
                (viewport.width - panel.width) / 2.0,
                viewport.height - panel.height - self.bottom_offset,
            ),
        };
    }

    /// Starts a drag unless the pointer is on one of the panel's buttons.
    ///
    /// Returns `true` if a drag started.
    pub fn pointer_down(&mut self, pointer: Point, on_button: bool) -> bool {
        if on_button {
            return false;
        }

        self.state.dragging = true;
        self.state.pointer_offset = Point::new(
            pointer.x - self.state.position.x,
            pointer.y - self.state.position.y,
        );
        tracing::trace!("drag started at {:?}", pointer);
        true
    }

    /// Follows the pointer while dragging.
    ///
    /// `panel` is the live size of the panel; each axis is clamped to
    /// `[margin, viewport - panel - margin]`. Returns the new position, or
    /// `None` when no drag is in progress.
    pub fn pointer_move(&mut self, pointer: Point, viewport: Size, panel: Size) -> Option<Point> {
        if !self.state.dragging {
            return None;
        }

        let candidate = Point::new(
            pointer.x - self.state.pointer_offset.x,
            pointer.y - self.state.pointer_offset.y,
        );

        self.state.position = Point::new(
            clamp_axis(candidate.x, viewport.width - panel.width, self.margin),
            clamp_axis(candidate.y, viewport.height - panel.height, self.margin),
        );
        Some(self.state.position)
    }

    /// Ends the drag. Returns `true` if one was in progress.
    pub fn pointer_up(&mut self) -> bool {
        std::mem::replace(&mut self.state.dragging, false)
    }
}

/// Clamps one axis to `[margin, free_space - margin]`.
///
/// When the panel does not fit, the lower bound wins; `f64::clamp` would
/// panic on the inverted range.
fn clamp_axis(candidate: f64, free_space: f64, margin: f64) -> f64 {
    let max = free_space - margin;
    margin.max(candidate.min(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size::new(1000.0, 800.0);
    const PANEL: Size = Size::new(656.0, 300.0);

    fn placed() -> DragController {
        let mut drag = DragController::default();
        drag.reset(VIEWPORT, PANEL);
        drag
    }

    #[test]
    fn test_default_position() {
        let drag = placed();
        assert_eq!(drag.position(), Point::new(172.0, 450.0));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_drag_follows_pointer_offset() {
        let mut drag = placed();
        assert!(drag.pointer_down(Point::new(200.0, 460.0), false));

        let pos = drag.pointer_move(Point::new(250.0, 400.0), VIEWPORT, PANEL);
        assert_eq!(pos, Some(Point::new(222.0, 390.0)));

        assert!(drag.pointer_up());
        assert!(!drag.pointer_up());
        assert_eq!(drag.pointer_move(Point::new(0.0, 0.0), VIEWPORT, PANEL), None);
        assert_eq!(drag.position(), Point::new(222.0, 390.0));
    }

    #[test]
    fn test_pointer_down_on_button_is_ignored() {
        let mut drag = placed();
        assert!(!drag.pointer_down(Point::new(200.0, 460.0), true));
        assert_eq!(drag.pointer_move(Point::new(500.0, 500.0), VIEWPORT, PANEL), None);
    }

    #[test]
    fn test_clamped_for_far_trajectories() {
        let mut drag = placed();
        drag.pointer_down(Point::new(300.0, 500.0), false);

        let max_x = VIEWPORT.width - PANEL.width - DRAG_MARGIN;
        let max_y = VIEWPORT.height - PANEL.height - DRAG_MARGIN;

        let trajectory = [
            (-1.0e6, -1.0e6),
            (1.0e6, 1.0e6),
            (-5000.0, 400.0),
            (500.0, 99_999.0),
            (f64::MAX / 2.0, f64::MIN / 2.0),
            (420.0, 420.0),
        ];

        for (x, y) in trajectory {
            let pos = drag.pointer_move(Point::new(x, y), VIEWPORT, PANEL).unwrap();
            assert!(pos.x >= DRAG_MARGIN && pos.x <= max_x, "x out of bounds: {:?}", pos);
            assert!(pos.y >= DRAG_MARGIN && pos.y <= max_y, "y out of bounds: {:?}", pos);
        }
    }

    #[test]
    fn test_viewport_smaller_than_panel_pins_to_margin() {
        let mut drag = placed();
        drag.pointer_down(Point::new(300.0, 500.0), false);

        let tiny = Size::new(320.0, 200.0);
        let pos = drag.pointer_move(Point::new(900.0, 900.0), tiny, PANEL).unwrap();
        assert_eq!(pos, Point::new(DRAG_MARGIN, DRAG_MARGIN));
    }

    #[test]
    fn test_position_persists_across_drags_until_reset() {
        let mut drag = placed();
        drag.pointer_down(Point::new(172.0, 450.0), false);
        drag.pointer_move(Point::new(100.0, 100.0), VIEWPORT, PANEL);
        drag.pointer_up();

        // Second drag starts from the moved position
        drag.pointer_down(Point::new(110.0, 110.0), false);
        let pos = drag.pointer_move(Point::new(120.0, 130.0), VIEWPORT, PANEL).unwrap();
        assert_eq!(pos, Point::new(110.0, 120.0));

        drag.reset(VIEWPORT, PANEL);
        assert_eq!(drag.position(), Point::new(172.0, 450.0));
    }
}
