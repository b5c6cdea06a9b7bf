use glam::Vec2;

use crate::api::ShapeApi;
use crate::types::{Primitive, ShapeDesc};

/// Shape model: local descriptor + live transform -> world-space primitive.
pub struct Shape;

impl ShapeApi for Shape {
    fn build(
        desc: &ShapeDesc,
        pos: Vec2,
        scale: Vec2,
        rotation: f32,
        ellipse_vertices: usize,
    ) -> Primitive {
        let rot = Vec2::from_angle(rotation);
        let xform = |p: Vec2| pos + rot.rotate(p * scale);

        match desc {
            ShapeDesc::Rect { left, top, right, bottom } => {
                if rotation == 0.0 {
                    let a = pos + Vec2::new(*left, *top) * scale;
                    let b = pos + Vec2::new(*right, *bottom) * scale;
                    // Negative scale flips corners; normalize the box.
                    Primitive::Aabb { min: a.min(b), max: a.max(b) }
                } else {
                    Primitive::Polygon(vec![
                        xform(Vec2::new(*left, *top)),
                        xform(Vec2::new(*right, *top)),
                        xform(Vec2::new(*right, *bottom)),
                        xform(Vec2::new(*left, *bottom)),
                    ])
                }
            }
            ShapeDesc::Circle { radius } => {
                if scale.x.abs() == scale.y.abs() {
                    Primitive::Circle { center: pos, radius: radius * scale.x.abs() }
                } else {
                    // Anisotropic scale turns the circle into an ellipse;
                    // approximate it with a fixed-count convex polygon.
                    let n = ellipse_vertices.max(3);
                    let pts = (0..n)
                        .map(|i| {
                            let theta = std::f32::consts::TAU * i as f32 / n as f32;
                            xform(Vec2::new(theta.cos(), theta.sin()) * *radius)
                        })
                        .collect();
                    Primitive::Polygon(pts)
                }
            }
            ShapeDesc::Strip { points, closed } => Primitive::Polyline {
                points: points.iter().map(|&p| xform(p)).collect(),
                closed: *closed,
            },
            ShapeDesc::Line { a, b } => Primitive::Segment { a: xform(*a), b: xform(*b) },
            ShapeDesc::Point => Primitive::Point(pos),
        }
    }

    fn aabb(prim: &Primitive) -> (Vec2, Vec2) {
        match prim {
            Primitive::Aabb { min, max } => (*min, *max),
            Primitive::Polygon(pts) | Primitive::Polyline { points: pts, .. } => {
                let mut min = Vec2::splat(f32::INFINITY);
                let mut max = Vec2::splat(f32::NEG_INFINITY);
                for &p in pts {
                    min = min.min(p);
                    max = max.max(p);
                }
                if pts.is_empty() {
                    (Vec2::ZERO, Vec2::ZERO)
                } else {
                    (min, max)
                }
            }
            Primitive::Circle { center, radius } => {
                (*center - Vec2::splat(*radius), *center + Vec2::splat(*radius))
            }
            Primitive::Segment { a, b } => (a.min(*b), a.max(*b)),
            Primitive::Point(p) => (*p, *p),
        }
    }
}
