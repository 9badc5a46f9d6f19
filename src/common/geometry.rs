use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Numeric coordinate types the geometry primitives are generic over.
pub trait Coord:
    Copy + PartialOrd + PartialEq + Add<Output = Self> + Sub<Output = Self> + Default + fmt::Debug
{
}

impl<T> Coord for T where
    T: Copy + PartialOrd + PartialEq + Add<Output = T> + Sub<Output = T> + Default + fmt::Debug
{
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T: Coord> Point<T> {
    pub fn new(x: T, y: T) -> Self { Point { x, y } }
}

impl<T: fmt::Debug> fmt::Debug for Point<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

/// Axis-aligned rectangle. Width and height are non-negative in any valid
/// state; callers may transiently construct zero-area rectangles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T: fmt::Debug> fmt::Debug for Rect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}x{:?}@({:?}, {:?})",
            self.width, self.height, self.x, self.y
        )
    }
}

impl<T: Coord> Rect<T> {
    pub fn new(x: T, y: T, width: T, height: T) -> Self { Rect { x, y, width, height } }

    pub fn origin(&self) -> Point<T> { Point::new(self.x, self.y) }

    /// Exclusive right edge.
    pub fn max_x(&self) -> T { self.x + self.width }

    /// Exclusive bottom edge.
    pub fn max_y(&self) -> T { self.y + self.height }

    /// Half-open containment: a point on the right or bottom edge is outside.
    pub fn contains(&self, p: Point<T>) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.max_x() && p.y < self.max_y()
    }

    pub fn translate(&self, dx: T, dy: T) -> Self {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= T::default() || self.height <= T::default()
    }
}

/// Per-edge margins, used by gap and bar decorators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Insets {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl Insets {
    pub fn uniform(v: i32) -> Self {
        Insets { top: v, left: v, bottom: v, right: v }
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0 && self.left == 0 && self.bottom == 0 && self.right == 0
    }
}

impl Rect<i32> {
    /// Shrinks the rectangle by the given margins, clamping to zero area.
    pub fn inset(&self, m: Insets) -> Rect<i32> {
        Rect::new(
            self.x + m.left,
            self.y + m.top,
            (self.width - m.left - m.right).max(0),
            (self.height - m.top - m.bottom).max(0),
        )
    }

    pub fn center(&self) -> Point<i32> {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn intersects(&self, other: &Rect<i32>) -> bool {
        self.x < other.max_x()
            && other.x < self.max_x()
            && self.y < other.max_y()
            && other.y < self.max_y()
    }
}

/// A rectangle expressed as fractions (0.0..=1.0) of a reference work area.
/// Used by the persistence snapshot so layouts survive resolution changes.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct FracRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FracRect {
    pub fn from_pixels(rect: Rect<i32>, work_area: Rect<i32>) -> Option<FracRect> {
        if work_area.is_empty() {
            return None;
        }
        let w = f64::from(work_area.width);
        let h = f64::from(work_area.height);
        Some(FracRect {
            x: f64::from(rect.x - work_area.x) / w,
            y: f64::from(rect.y - work_area.y) / h,
            width: f64::from(rect.width) / w,
            height: f64::from(rect.height) / h,
        })
    }

    pub fn to_pixels(&self, work_area: Rect<i32>) -> Rect<i32> {
        let w = f64::from(work_area.width);
        let h = f64::from(work_area.height);
        Rect::new(
            work_area.x + (self.x * w).round() as i32,
            work_area.y + (self.y * h).round() as i32,
            (self.width * w).round() as i32,
            (self.height * h).round() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn containment_is_half_open() {
        let r = Rect::new(10, 20, 100, 50);
        assert!(r.contains(Point::new(10, 20)));
        assert!(r.contains(Point::new(109, 69)));
        assert!(!r.contains(Point::new(110, 70)));
        assert!(!r.contains(Point::new(110, 20)));
        assert!(!r.contains(Point::new(10, 70)));
        assert!(!r.contains(Point::new(9, 20)));
    }

    #[test]
    fn equality_is_componentwise() {
        assert_eq!(Rect::new(0, 0, 10, 10), Rect::new(0, 0, 10, 10));
        assert_ne!(Rect::new(0, 0, 10, 10), Rect::new(0, 1, 10, 10));
    }

    #[test]
    fn inset_clamps_to_zero_area() {
        let r = Rect::new(0, 0, 10, 10);
        let shrunk = r.inset(Insets::uniform(20));
        assert_eq!(shrunk.width, 0);
        assert_eq!(shrunk.height, 0);
        assert!(shrunk.is_empty());
    }

    #[test]
    fn frac_rect_round_trips_against_work_area() {
        let work_area = Rect::new(0, 30, 1920, 1050);
        let rect = Rect::new(960, 30, 960, 525);
        let frac = FracRect::from_pixels(rect, work_area).unwrap();
        assert_eq!(frac.to_pixels(work_area), rect);

        // Scaling against a different work area keeps the proportions.
        let other = Rect::new(0, 0, 1280, 720);
        let scaled = frac.to_pixels(other);
        assert_eq!(scaled, Rect::new(640, 0, 640, 360));
    }

    #[test]
    fn frac_rect_rejects_empty_work_area() {
        assert_eq!(
            FracRect::from_pixels(Rect::new(0, 0, 1, 1), Rect::new(0, 0, 0, 0)),
            None
        );
    }
}
