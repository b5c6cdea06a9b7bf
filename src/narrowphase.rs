use glam::Vec2;

use crate::api::{NarrowphaseApi, ShapeApi};
use crate::shape::Shape;
use crate::types::Primitive;

/// Exact primitive-pair intersection tests.
///
/// Boundary convention is inclusive throughout: two shapes whose edges are
/// exactly coincident report a collision, so "flush against a wall" reads as
/// blocked.
pub struct Narrowphase;

/// Signed area of the triangle (a, b, c); zero means collinear.
fn orient(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// Assumes `p` collinear with (a, b); is it within the segment's bounds?
fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Iterate the edges of a strip, wrapping last-to-first when closed.
fn strip_edges(points: &[Vec2], closed: bool) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let n = points.len();
    let wrap = closed && n > 2;
    (0..n.saturating_sub(1))
        .map(move |i| (points[i], points[i + 1]))
        .chain(wrap.then(|| (points[n - 1], points[0])))
}

/// Is there a separating axis among the edge normals of `axes_src`?
fn separated_on_axes_of(axes_src: &[Vec2], a: &[Vec2], b: &[Vec2]) -> bool {
    let n = axes_src.len();
    for i in 0..n {
        let edge = axes_src[(i + 1) % n] - axes_src[i];
        let axis = edge.perp();
        let (mut amin, mut amax) = (f32::INFINITY, f32::NEG_INFINITY);
        for &p in a {
            let d = p.dot(axis);
            amin = amin.min(d);
            amax = amax.max(d);
        }
        let (mut bmin, mut bmax) = (f32::INFINITY, f32::NEG_INFINITY);
        for &p in b {
            let d = p.dot(axis);
            bmin = bmin.min(d);
            bmax = bmax.max(d);
        }
        if amax < bmin || bmax < amin {
            return true;
        }
    }
    false
}

impl NarrowphaseApi for Narrowphase {
    fn intersects(a: &Primitive, b: &Primitive) -> bool {
        // Cheap bounds pre-check whenever either side carries a vertex list;
        // rejected pairs never reach the exact math.
        let complex = |p: &Primitive| {
            matches!(p, Primitive::Polygon(_) | Primitive::Polyline { .. })
        };
        if complex(a) || complex(b) {
            let (amin, amax) = Shape::aabb(a);
            let (bmin, bmax) = Shape::aabb(b);
            if !Self::aabb_aabb(amin, amax, bmin, bmax) {
                return false;
            }
        }
        Self::pair(a, b)
    }

    fn aabb_aabb(min0: Vec2, max0: Vec2, min1: Vec2, max1: Vec2) -> bool {
        min0.x <= max1.x && min1.x <= max0.x && min0.y <= max1.y && min1.y <= max0.y
    }

    fn aabb_circle(min: Vec2, max: Vec2, center: Vec2, r: f32) -> bool {
        let closest = center.clamp(min, max);
        (closest - center).length_squared() <= r * r
    }

    fn circle_circle(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> bool {
        let rsum = r0 + r1;
        (c1 - c0).length_squared() <= rsum * rsum
    }

    fn point_in_aabb(p: Vec2, min: Vec2, max: Vec2) -> bool {
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    fn point_in_circle(p: Vec2, c: Vec2, r: f32) -> bool {
        (p - c).length_squared() <= r * r
    }

    fn point_in_convex_polygon(p: Vec2, poly: &[Vec2]) -> bool {
        if poly.len() < 3 {
            return false;
        }
        // Sign consistency over all edges; zeros (on the boundary) pass.
        let mut pos = false;
        let mut neg = false;
        for i in 0..poly.len() {
            let o = orient(poly[i], poly[(i + 1) % poly.len()], p);
            if o > 0.0 {
                pos = true;
            } else if o < 0.0 {
                neg = true;
            }
            if pos && neg {
                return false;
            }
        }
        true
    }

    fn seg_seg(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> bool {
        let d1 = orient(b0, b1, a0);
        let d2 = orient(b0, b1, a1);
        let d3 = orient(a0, a1, b0);
        let d4 = orient(a0, a1, b1);
        if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
        {
            return true;
        }
        // Collinear / endpoint-touching cases count as contact.
        (d1 == 0.0 && on_segment(b0, b1, a0))
            || (d2 == 0.0 && on_segment(b0, b1, a1))
            || (d3 == 0.0 && on_segment(a0, a1, b0))
            || (d4 == 0.0 && on_segment(a0, a1, b1))
    }

    fn seg_circle(a: Vec2, b: Vec2, c: Vec2, r: f32) -> bool {
        let d = b - a;
        let len2 = d.length_squared();
        let t = if len2 <= f32::EPSILON {
            0.0
        } else {
            ((c - a).dot(d) / len2).clamp(0.0, 1.0)
        };
        (a + d * t - c).length_squared() <= r * r
    }

    fn seg_aabb(a: Vec2, b: Vec2, min: Vec2, max: Vec2) -> bool {
        // Slab test clamped to the segment's parameter range.
        let d = b - a;
        let mut tmin = 0.0f32;
        let mut tmax = 1.0f32;

        if d.x.abs() < f32::EPSILON {
            if a.x < min.x || a.x > max.x {
                return false;
            }
        } else {
            let inv = 1.0 / d.x;
            let mut t1 = (min.x - a.x) * inv;
            let mut t2 = (max.x - a.x) * inv;
            if t1 > t2 {
                core::mem::swap(&mut t1, &mut t2);
            }
            tmin = tmin.max(t1);
            tmax = tmax.min(t2);
            if tmin > tmax {
                return false;
            }
        }

        if d.y.abs() < f32::EPSILON {
            if a.y < min.y || a.y > max.y {
                return false;
            }
        } else {
            let inv = 1.0 / d.y;
            let mut t1 = (min.y - a.y) * inv;
            let mut t2 = (max.y - a.y) * inv;
            if t1 > t2 {
                core::mem::swap(&mut t1, &mut t2);
            }
            tmin = tmin.max(t1);
            tmax = tmax.min(t2);
            if tmin > tmax {
                return false;
            }
        }

        true
    }

    fn seg_polygon(a: Vec2, b: Vec2, poly: &[Vec2]) -> bool {
        if Self::point_in_convex_polygon(a, poly) {
            return true;
        }
        strip_edges(poly, true).any(|(p0, p1)| Self::seg_seg(a, b, p0, p1))
    }

    fn polygon_polygon(p0: &[Vec2], p1: &[Vec2]) -> bool {
        if p0.len() < 3 || p1.len() < 3 {
            return false;
        }
        !separated_on_axes_of(p0, p0, p1) && !separated_on_axes_of(p1, p0, p1)
    }

    fn polygon_aabb(poly: &[Vec2], min: Vec2, max: Vec2) -> bool {
        let corners = [
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ];
        Self::polygon_polygon(poly, &corners)
    }

    fn polygon_circle(poly: &[Vec2], c: Vec2, r: f32) -> bool {
        if Self::point_in_convex_polygon(c, poly) {
            return true;
        }
        strip_edges(poly, true).any(|(a, b)| Self::seg_circle(a, b, c, r))
    }
}

impl Narrowphase {
    /// Exhaustive dispatch over the closed primitive vocabulary. Mirrored
    /// pairs fall through to the swapped arm.
    fn pair(a: &Primitive, b: &Primitive) -> bool {
        use Primitive::*;
        match (a, b) {
            (Aabb { min: m0, max: x0 }, Aabb { min: m1, max: x1 }) => {
                Self::aabb_aabb(*m0, *x0, *m1, *x1)
            }
            (Aabb { min, max }, Circle { center, radius }) => {
                Self::aabb_circle(*min, *max, *center, *radius)
            }
            (Aabb { min, max }, Polygon(pts)) => Self::polygon_aabb(pts, *min, *max),
            (Aabb { min, max }, Segment { a, b }) => Self::seg_aabb(*a, *b, *min, *max),
            (Aabb { min, max }, Point(p)) => Self::point_in_aabb(*p, *min, *max),
            (Aabb { min, max }, Polyline { points, closed }) => {
                strip_edges(points, *closed).any(|(s0, s1)| Self::seg_aabb(s0, s1, *min, *max))
            }

            (Circle { center: c0, radius: r0 }, Circle { center: c1, radius: r1 }) => {
                Self::circle_circle(*c0, *r0, *c1, *r1)
            }
            (Circle { center, radius }, Polygon(pts)) => {
                Self::polygon_circle(pts, *center, *radius)
            }
            (Circle { center, radius }, Segment { a, b }) => {
                Self::seg_circle(*a, *b, *center, *radius)
            }
            (Circle { center, radius }, Point(p)) => Self::point_in_circle(*p, *center, *radius),
            (Circle { center, radius }, Polyline { points, closed }) => strip_edges(points, *closed)
                .any(|(s0, s1)| Self::seg_circle(s0, s1, *center, *radius)),

            (Polygon(p0), Polygon(p1)) => Self::polygon_polygon(p0, p1),
            (Polygon(pts), Segment { a, b }) => Self::seg_polygon(*a, *b, pts),
            (Polygon(pts), Point(p)) => Self::point_in_convex_polygon(*p, pts),
            (Polygon(pts), Polyline { points, closed }) => {
                strip_edges(points, *closed).any(|(s0, s1)| Self::seg_polygon(s0, s1, pts))
            }

            (Segment { a: a0, b: a1 }, Segment { a: b0, b: b1 }) => {
                Self::seg_seg(*a0, *a1, *b0, *b1)
            }
            (Segment { a, b }, Point(p)) => Self::seg_circle(*a, *b, *p, 0.0),
            (Segment { a, b }, Polyline { points, closed }) => {
                strip_edges(points, *closed).any(|(s0, s1)| Self::seg_seg(*a, *b, s0, s1))
            }

            (Polyline { points: pa, closed: ca }, Polyline { points: pb, closed: cb }) => {
                strip_edges(pa, *ca).any(|(a0, a1)| {
                    strip_edges(pb, *cb).any(|(b0, b1)| Self::seg_seg(a0, a1, b0, b1))
                })
            }
            (Polyline { points, closed }, Point(p)) => {
                strip_edges(points, *closed).any(|(s0, s1)| Self::seg_circle(s0, s1, *p, 0.0))
            }

            (Point(p0), Point(p1)) => p0 == p1,

            // Mirrored pairs: swap once into the canonical arm above.
            _ => Self::pair(b, a),
        }
    }
}
