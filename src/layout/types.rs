use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

use crate::model::SortAxis;

/// A point in drawing space. Units are millimetres; Z is carried along but
/// never used for layout.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Coordinate along the layout axis.
    pub fn along(&self, axis: SortAxis) -> f64 {
        match axis {
            SortAxis::Horizontal => self.x,
            SortAxis::Vertical => self.y,
        }
    }

    /// Coordinate across the layout axis.
    pub fn across(&self, axis: SortAxis) -> f64 {
        match axis {
            SortAxis::Horizontal => self.y,
            SortAxis::Vertical => self.x,
        }
    }

    /// Copy of this point with the along-axis coordinate replaced.
    pub fn with_along(self, axis: SortAxis, value: f64) -> Self {
        match axis {
            SortAxis::Horizontal => Self { x: value, ..self },
            SortAxis::Vertical => Self { y: value, ..self },
        }
    }

    /// Copy of this point with the across-axis coordinate replaced.
    pub fn with_across(self, axis: SortAxis, value: f64) -> Self {
        match axis {
            SortAxis::Horizontal => Self { y: value, ..self },
            SortAxis::Vertical => Self { x: value, ..self },
        }
    }

    /// Planar distance, ignoring Z.
    pub fn distance_xy(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Axis-aligned bounding box in the drawing plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self {
            min: Point::new(min.x.min(max.x), min.y.min(max.y), min.z.min(max.z)),
            max: Point::new(min.x.max(max.x), min.y.max(max.y), min.z.max(max.z)),
        }
    }

    /// Zero-size box sitting on `at`.
    pub fn degenerate(at: Point) -> Self {
        Self { min: at, max: at }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    pub fn translate(&self, delta: Point) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    pub fn inflate(&self, pad: f64) -> Self {
        if pad <= 0.0 {
            return *self;
        }
        Self {
            min: Point::new(self.min.x - pad, self.min.y - pad, self.min.z),
            max: Point::new(self.max.x + pad, self.max.y + pad, self.max.z),
        }
    }

    /// Closed-interval test: boxes that merely touch are treated as overlapping.
    pub fn intersects(&self, other: &BBox) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    /// `(low, high)` extent of the box along `axis`.
    pub fn span(&self, axis: SortAxis) -> (f64, f64) {
        (self.min.along(axis), self.max.along(axis))
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            min: Point::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }
}
