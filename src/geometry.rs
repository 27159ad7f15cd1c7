//! Integer planar geometry shared by every layer of the model.

use serde::{Deserialize, Serialize};

/// A point on the drawing plane (can be negative for infinite-canvas feel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// This point shifted by a delta
    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// An axis-aligned rectangle with non-negative extent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Exclusive right edge
    pub fn max_x(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn max_y(&self) -> i32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.max_x() && p.y >= self.y && p.y < self.max_y()
    }

    /// Smallest rectangle enclosing both
    pub fn union(&self, other: Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Rect::new(x, y, max_x - x, max_y - y)
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive_of_origin_exclusive_of_far_edge() {
        let r = Rect::new(10, 0, 80, 120);
        assert!(r.contains(Point::new(10, 0)));
        assert!(r.contains(Point::new(89, 119)));
        assert!(!r.contains(Point::new(90, 0)));
        assert!(!r.contains(Point::new(10, 120)));
    }

    #[test]
    fn union_encloses_both() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 5, 10, 30);
        assert_eq!(a.union(b), Rect::new(0, 0, 30, 35));
        assert_eq!(b.union(a), a.union(b));
    }

    #[test]
    fn translated_preserves_extent() {
        let r = Rect::new(1, 2, 3, 4);
        assert_eq!(r.translated(-1, -2), Rect::new(0, 0, 3, 4));
    }
}
