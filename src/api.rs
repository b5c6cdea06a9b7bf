use glam::Vec2;

use crate::motion::AvoidBias;
use crate::types::*;
use crate::world::{Entity, Tile};

/// Public API contract for the collision world.
pub trait CollisionWorldApi {
    /// Construct a new world with the given configuration.
    fn new(cfg: WorldConfig) -> Self
    where
        Self: Sized;

    // --- Lifecycle ---------------------------------------------------------

    /// Spawn a mobile entity and register it in the mobile grid.
    fn spawn(&mut self, desc: EntityDesc) -> EntityKey;

    /// Remove an entity from every bucket it occupies and from the world.
    fn despawn(&mut self, key: EntityKey) -> Option<Entity>;

    /// Bake a static layer's tiles into the tile grid. A layer name may be
    /// baked at most once.
    fn enable_tile_collisions(
        &mut self,
        layer: &TileLayer,
        group: Option<&str>,
    ) -> Result<Vec<TileKey>, WorldError>;

    /// Discard every baked tile and layer record (room teardown).
    fn clear_tiles(&mut self);

    // --- Transform mutation ------------------------------------------------
    //
    // Mutators rebuild the cached primitive and swap bucket membership before
    // returning, so any query issued later in the frame observes the move.

    fn set_pos(&mut self, key: EntityKey, pos: Vec2);
    fn set_scale(&mut self, key: EntityKey, scale: Vec2);
    fn set_rotation(&mut self, key: EntityKey, rotation: f32);
    fn set_shape(&mut self, key: EntityKey, shape: ShapeDesc);

    // --- Access ------------------------------------------------------------

    fn entity(&self, key: EntityKey) -> Option<&Entity>;
    fn tile(&self, key: TileKey) -> Option<&Tile>;

    // --- Occupancy queries -------------------------------------------------
    //
    // `at` probes a hypothetical position without moving the entity; `None`
    // queries in place. Probes never leave observable side effects on the
    // target.

    /// First blocker at the (possibly hypothetical) position: mobile grid
    /// first, tile grid only when the mobile grid found nothing.
    fn occupied(&self, key: EntityKey, at: Option<Vec2>, group: Option<&str>) -> Option<Occupant>;

    /// Every blocker at the position, across both grids.
    fn occupied_all(&self, key: EntityKey, at: Option<Vec2>, group: Option<&str>) -> Vec<Occupant>;

    /// First overlapping entity of the given kind. Unknown kinds are a
    /// configuration error.
    fn meet(
        &self,
        key: EntityKey,
        at: Option<Vec2>,
        kind: &str,
    ) -> Result<Option<EntityKey>, WorldError>;

    /// Every overlapping entity of the given kind.
    fn meet_all(
        &self,
        key: EntityKey,
        at: Option<Vec2>,
        kind: &str,
    ) -> Result<Vec<EntityKey>, WorldError>;

    /// First overlapping entity in the given collision group.
    fn copies(&self, key: EntityKey, at: Option<Vec2>, group: Option<&str>) -> Option<EntityKey>;

    /// Every overlapping entity in the given collision group.
    fn copies_all(&self, key: EntityKey, at: Option<Vec2>, group: Option<&str>) -> Vec<EntityKey>;

    /// First overlapping baked tile.
    fn tiles(&self, key: EntityKey, at: Option<Vec2>, group: Option<&str>) -> Option<TileKey>;

    /// Every overlapping baked tile.
    fn tiles_all(&self, key: EntityKey, at: Option<Vec2>, group: Option<&str>) -> Vec<TileKey>;

    // --- Ad-hoc shape traces -----------------------------------------------
    //
    // Hit-scans and area checks not tied to any entity. Shapes wider than one
    // grid cell fall back to a linear scan over both populations.

    fn trace_line(&self, a: Vec2, b: Vec2, group: Option<&str>) -> Option<Occupant>;
    fn trace_line_all(&self, a: Vec2, b: Vec2, group: Option<&str>) -> Vec<Occupant>;
    fn trace_rect(&self, min: Vec2, max: Vec2, group: Option<&str>) -> Option<Occupant>;
    fn trace_rect_all(&self, min: Vec2, max: Vec2, group: Option<&str>) -> Vec<Occupant>;
    fn trace_circle(&self, center: Vec2, radius: f32, group: Option<&str>) -> Option<Occupant>;
    fn trace_circle_all(&self, center: Vec2, radius: f32, group: Option<&str>) -> Vec<Occupant>;
    fn trace_polyline(&self, points: &[Vec2], closed: bool, group: Option<&str>)
    -> Option<Occupant>;
    fn trace_polyline_all(
        &self,
        points: &[Vec2],
        closed: bool,
        group: Option<&str>,
    ) -> Vec<Occupant>;
    fn trace_point(&self, p: Vec2, group: Option<&str>) -> Option<Occupant>;
    fn trace_point_all(&self, p: Vec2, group: Option<&str>) -> Vec<Occupant>;
}

/// Discrete movement resolution built on top of the occupancy queries.
pub trait MotionApi {
    /// Resolve a displacement independently on X then Y in `precision`-sized
    /// steps. Returns `None` when neither axis was blocked.
    fn move_by_axes(
        &mut self,
        key: EntityKey,
        dx: f32,
        dy: f32,
        group: Option<&str>,
        precision: f32,
    ) -> Option<AxisBlock>;

    /// Advance along a bearing (radians) in `precision`-sized sub-steps,
    /// stopping at the first blocked sub-step.
    fn move_along(
        &mut self,
        key: EntityKey,
        direction: f32,
        length: f32,
        group: Option<&str>,
        precision: f32,
    ) -> Option<Occupant>;

    /// Greedy seek-with-avoidance toward a target point. Probes alternative
    /// bearings at ±30°..±120° when the straight bearing is blocked, the side
    /// order picked by the shared `bias` sign.
    fn go(
        &mut self,
        key: EntityKey,
        target: Vec2,
        step_length: f32,
        group: Option<&str>,
        bias: &AvoidBias,
    );
}

/// Shape model contract.
pub trait ShapeApi {
    /// Combine a local descriptor with a live transform into world-space
    /// geometry.
    fn build(
        desc: &ShapeDesc,
        pos: Vec2,
        scale: Vec2,
        rotation: f32,
        ellipse_vertices: usize,
    ) -> Primitive;

    /// Tight axis-aligned bounds of a primitive.
    fn aabb(prim: &Primitive) -> (Vec2, Vec2);
}

/// Narrowphase primitive intersection contract. All predicates use inclusive
/// boundaries: exact edge contact counts as a collision.
pub trait NarrowphaseApi {
    /// Exact intersection test between two world-space primitives.
    fn intersects(a: &Primitive, b: &Primitive) -> bool;

    // Low-level predicates ---------------------------------------------------

    fn aabb_aabb(min0: Vec2, max0: Vec2, min1: Vec2, max1: Vec2) -> bool;
    fn aabb_circle(min: Vec2, max: Vec2, center: Vec2, r: f32) -> bool;
    fn circle_circle(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> bool;
    fn point_in_aabb(p: Vec2, min: Vec2, max: Vec2) -> bool;
    fn point_in_circle(p: Vec2, c: Vec2, r: f32) -> bool;
    fn point_in_convex_polygon(p: Vec2, poly: &[Vec2]) -> bool;
    fn seg_seg(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> bool;
    fn seg_circle(a: Vec2, b: Vec2, c: Vec2, r: f32) -> bool;
    fn seg_aabb(a: Vec2, b: Vec2, min: Vec2, max: Vec2) -> bool;
    fn seg_polygon(a: Vec2, b: Vec2, poly: &[Vec2]) -> bool;
    fn polygon_polygon(p0: &[Vec2], p1: &[Vec2]) -> bool;
    fn polygon_aabb(poly: &[Vec2], min: Vec2, max: Vec2) -> bool;
    fn polygon_circle(poly: &[Vec2], c: Vec2, r: f32) -> bool;
}
