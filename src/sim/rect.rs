//! Axis-aligned rectangle geometry for paddles and balls
//!
//! Integer pixel space, origin at the top-left, +y pointing down.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle (top-left position + size)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: IVec2,
    pub size: IVec2,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            pos: IVec2::new(x, y),
            size: IVec2::new(w, h),
        }
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.size.y
    }

    /// Vertical midpoint (integer division rounds toward the top)
    pub fn center_y(&self) -> i32 {
        self.pos.y + self.size.y / 2
    }

    /// Strict overlap test; rectangles that only share an edge do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Shift vertically so the rectangle lies within [0, max_y]
    pub fn clamp_y(&mut self, max_y: i32) {
        self.pos.y = self.pos.y.clamp(0, (max_y - self.size.y).max(0));
    }

    /// Shift horizontally so the rectangle lies within [0, max_x]
    pub fn clamp_x(&mut self, max_x: i32) {
        self.pos.x = self.pos.x.clamp(0, (max_x - self.size.x).max(0));
    }
}
