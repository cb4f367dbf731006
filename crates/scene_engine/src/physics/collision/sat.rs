//! Separating-axis narrow phase
//!
//! Every test is strict: shapes whose projections only touch are separated.
//! The returned minimum translation vector (MTV) is expressed from the first
//! shape's point of view, so `motion - mtv` moves it out of the second.

use crate::foundation::math::{perpendicular, Vec2};
use crate::physics::collision::shape::WorldShape;

const AXIS_EPSILON: f32 = 1e-6;

/// MTV separating `a` from `b`, or `None` when they do not overlap
pub fn collide(a: &WorldShape<'_>, b: &WorldShape<'_>) -> Option<Vec2> {
    if let (
        WorldShape::Circle { center: a_center, radius: a_radius },
        WorldShape::Circle { center: b_center, radius: b_radius },
    ) = (a, b)
    {
        return circle_circle(*a_center, *a_radius, *b_center, *b_radius);
    }

    let mut best = None;
    for shape in [a, b] {
        if let WorldShape::Polygon { points, .. } = shape {
            for axis in edge_normals(points.as_slice()) {
                if !test_axis(a, b, axis, &mut best) {
                    return None;
                }
            }
        }
    }
    for (circle, polygon) in [(a, b), (b, a)] {
        if let (
            WorldShape::Circle { center, .. },
            WorldShape::Polygon { center: polygon_center, points },
        ) = (circle, polygon)
        {
            if let Some(axis) = closest_vertex_axis(*center, *polygon_center, points.as_slice()) {
                if !test_axis(a, b, axis, &mut best) {
                    return None;
                }
            }
        }
    }

    best.map(|(depth, direction)| direction * depth)
}

/// Whether the two shapes overlap
pub fn overlaps(a: &WorldShape<'_>, b: &WorldShape<'_>) -> bool {
    collide(a, b).is_some()
}

fn circle_circle(a_center: Vec2, a_radius: f32, b_center: Vec2, b_radius: f32) -> Option<Vec2> {
    let offset = b_center - a_center;
    let reach = a_radius + b_radius;
    let distance_sq = offset.norm_squared();
    if distance_sq >= reach * reach {
        return None;
    }
    let distance = distance_sq.sqrt();
    let direction = if distance > AXIS_EPSILON { offset / distance } else { Vec2::x() };
    Some(direction * (reach - distance))
}

fn edge_normals(points: &[Vec2]) -> impl Iterator<Item = Vec2> + '_ {
    (0..points.len()).filter_map(move |i| {
        let edge = points[(i + 1) % points.len()] - points[i];
        let normal = perpendicular(&edge);
        let length = normal.norm();
        (length > AXIS_EPSILON).then(|| normal / length)
    })
}

fn closest_vertex_axis(circle_center: Vec2, polygon_center: Vec2, points: &[Vec2]) -> Option<Vec2> {
    let closest = points
        .iter()
        .map(|point| polygon_center + point)
        .min_by(|a, b| {
            (a - circle_center)
                .norm_squared()
                .total_cmp(&(b - circle_center).norm_squared())
        })?;
    let axis = closest - circle_center;
    let length = axis.norm();
    (length > AXIS_EPSILON).then(|| axis / length)
}

fn project(shape: &WorldShape<'_>, axis: &Vec2) -> (f32, f32) {
    match shape {
        WorldShape::Circle { center, radius } => {
            let c = center.dot(axis);
            (c - radius, c + radius)
        }
        WorldShape::Polygon { center, points } => points
            .as_slice()
            .iter()
            .map(|point| (center + point).dot(axis))
            .fold((f32::MAX, f32::MIN), |(min, max), p| (min.min(p), max.max(p))),
    }
}

/// Returns false when `axis` separates the shapes; otherwise keeps the
/// shallowest push seen so far in `best`
fn test_axis(a: &WorldShape<'_>, b: &WorldShape<'_>, axis: Vec2, best: &mut Option<(f32, Vec2)>) -> bool {
    let (a_min, a_max) = project(a, &axis);
    let (b_min, b_max) = project(b, &axis);

    // distance `a` must travel against / along the axis to clear `b`
    let push_back = a_max - b_min;
    let push_forward = b_max - a_min;
    if push_back <= 0.0 || push_forward <= 0.0 {
        return false;
    }

    let (depth, direction) = if push_back <= push_forward {
        (push_back, axis)
    } else {
        (push_forward, -axis)
    };
    if best.map_or(true, |(current, _)| depth < current) {
        *best = Some((depth, direction));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::shape::Shape;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_push_out_along_motion() {
        let a = Shape::rect(10.0, 10.0).unwrap();
        let b = Shape::rect(10.0, 10.0).unwrap();

        // a moved from x=5 to x=15, b sits at x=20
        let mtv = collide(&a.at(Vec2::new(15.0, 5.0)), &b.at(Vec2::new(20.0, 5.0))).unwrap();
        assert_relative_eq!(mtv, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_touching_boxes_do_not_overlap() {
        let a = Shape::rect(10.0, 10.0).unwrap();
        let b = Shape::rect(10.0, 10.0).unwrap();

        assert!(!overlaps(&a.at(Vec2::new(5.0, 5.0)), &b.at(Vec2::new(15.0, 5.0))));
        assert!(overlaps(&a.at(Vec2::new(5.1, 5.0)), &b.at(Vec2::new(15.0, 5.0))));
    }

    #[test]
    fn test_circles() {
        let a = Shape::circle(2.0).unwrap();
        let b = Shape::circle(3.0).unwrap();

        let mtv = collide(&a.at(Vec2::zeros()), &b.at(Vec2::new(4.0, 0.0))).unwrap();
        assert_relative_eq!(mtv, Vec2::new(1.0, 0.0));
        assert!(!overlaps(&a.at(Vec2::zeros()), &b.at(Vec2::new(5.0, 0.0))));
    }

    #[test]
    fn test_circle_against_box_corner() {
        let circle = Shape::circle(1.0).unwrap();
        let square = Shape::rect(2.0, 2.0).unwrap();

        // both box axes overlap; only the axis through the corner (1, 1) separates
        let far = circle.at(Vec2::new(1.8, 1.8));
        assert!(!overlaps(&far, &square.at(Vec2::zeros())));

        let near = circle.at(Vec2::new(1.5, 1.5));
        assert!(overlaps(&near, &square.at(Vec2::zeros())));
    }

    #[test]
    fn test_mtv_separates_when_subtracted() {
        let a = Shape::regular_polygon(5, 3.0).unwrap();
        let b = Shape::rect(4.0, 4.0).unwrap();
        let start = Vec2::new(-10.0, 0.5);
        let motion = Vec2::new(9.0, 0.0);

        let b_world = b.at(Vec2::zeros());
        let mtv = collide(&a.at(start + motion), &b_world).unwrap();
        let corrected = motion - mtv;

        let settled = a.at(start + corrected);
        assert!(collide(&settled, &b_world).map_or(true, |rest| rest.norm() < 1e-3));
    }
}
