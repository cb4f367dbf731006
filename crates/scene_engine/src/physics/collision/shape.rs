//! Collision shapes
//!
//! Shapes are stored in local space, centred on the origin. A collider places
//! its shape at `entity position + local offset`; [`Shape::at`] produces the
//! world-space view the narrow phase works on.

use thiserror::Error;

use crate::foundation::math::{Rect, Vec2};

/// Shape construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// Fewer than three distinct points
    #[error("a polygon needs at least 3 points, got {0}")]
    DegeneratePolygon(usize),

    /// Zero, negative or non-finite size
    #[error("invalid shape size: {0}")]
    InvalidSize(f32),
}

/// Convex collision shape in local space
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Axis-aligned box
    Box {
        /// Half width and half height
        half_extents: Vec2,
    },
    /// Circle
    Circle {
        /// Radius
        radius: f32,
    },
    /// Convex polygon, vertices in either winding, centroid at the origin
    Polygon {
        /// Vertices relative to the centroid
        points: Vec<Vec2>,
    },
}

impl Shape {
    /// Axis-aligned box of the given size
    pub fn rect(width: f32, height: f32) -> Result<Self, ShapeError> {
        for size in [width, height] {
            if !(size.is_finite() && size > 0.0) {
                return Err(ShapeError::InvalidSize(size));
            }
        }
        Ok(Self::Box { half_extents: Vec2::new(width, height) * 0.5 })
    }

    /// Circle of the given radius
    pub fn circle(radius: f32) -> Result<Self, ShapeError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ShapeError::InvalidSize(radius));
        }
        Ok(Self::Circle { radius })
    }

    /// Convex polygon from arbitrary points
    ///
    /// The points are recentred on their centroid; the returned offset is
    /// where that centroid sat relative to the input origin and belongs in
    /// the collider's local offset. A closing point equal to the first is
    /// dropped.
    pub fn polygon(points: &[Vec2]) -> Result<(Self, Vec2), ShapeError> {
        let mut points = points.to_vec();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            return Err(ShapeError::DegeneratePolygon(points.len()));
        }

        let center = points.iter().sum::<Vec2>() / points.len() as f32;
        for point in &mut points {
            *point -= center;
        }
        Ok((Self::Polygon { points }, center))
    }

    /// Regular polygon with `vertex_count` corners on a circle of `radius`
    pub fn regular_polygon(vertex_count: usize, radius: f32) -> Result<Self, ShapeError> {
        if vertex_count < 3 {
            return Err(ShapeError::DegeneratePolygon(vertex_count));
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ShapeError::InvalidSize(radius));
        }
        let step = std::f32::consts::TAU / vertex_count as f32;
        let points = (0..vertex_count)
            .map(|i| {
                let angle = step * i as f32;
                Vec2::new(angle.cos(), angle.sin()) * radius
            })
            .collect();
        Ok(Self::Polygon { points })
    }

    /// Bounds when centred at `center`
    pub fn bounds_at(&self, center: Vec2) -> Rect {
        match self {
            Self::Box { half_extents } => Rect::from_center_extents(center, *half_extents),
            Self::Circle { radius } => Rect::from_center_extents(center, Vec2::new(*radius, *radius)),
            Self::Polygon { points } => Rect::from_points(points)
                .map_or_else(|| Rect::new(center, center), |local| local.translated(center)),
        }
    }

    /// World-space view centred at `center`
    pub fn at(&self, center: Vec2) -> WorldShape<'_> {
        match self {
            Self::Box { half_extents } => {
                let (x, y) = (half_extents.x, half_extents.y);
                WorldShape::Polygon {
                    center,
                    points: Points::Quad([
                        Vec2::new(-x, -y),
                        Vec2::new(x, -y),
                        Vec2::new(x, y),
                        Vec2::new(-x, y),
                    ]),
                }
            }
            Self::Circle { radius } => WorldShape::Circle { center, radius: *radius },
            Self::Polygon { points } => WorldShape::Polygon { center, points: Points::Slice(points) },
        }
    }
}

/// Polygon vertices, relative to the polygon's center
#[derive(Debug, Clone, Copy)]
pub enum Points<'a> {
    /// Box corners
    Quad([Vec2; 4]),
    /// Borrowed polygon vertices
    Slice(&'a [Vec2]),
}

impl Points<'_> {
    /// Vertices as a slice
    pub fn as_slice(&self) -> &[Vec2] {
        match self {
            Self::Quad(points) => points,
            Self::Slice(points) => points,
        }
    }
}

/// A shape placed in the world
#[derive(Debug, Clone, Copy)]
pub enum WorldShape<'a> {
    /// Circle
    Circle {
        /// World center
        center: Vec2,
        /// Radius
        radius: f32,
    },
    /// Convex polygon (boxes included)
    Polygon {
        /// World center
        center: Vec2,
        /// Vertices relative to `center`
        points: Points<'a>,
    },
}

impl WorldShape<'_> {
    /// World center
    pub fn center(&self) -> Vec2 {
        match self {
            Self::Circle { center, .. } | Self::Polygon { center, .. } => *center,
        }
    }

    /// Same shape moved by `offset`
    pub fn translated(self, offset: Vec2) -> Self {
        match self {
            Self::Circle { center, radius } => Self::Circle { center: center + offset, radius },
            Self::Polygon { center, points } => Self::Polygon { center: center + offset, points },
        }
    }
}
