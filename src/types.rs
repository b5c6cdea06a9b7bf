use glam::Vec2;
use slotmap::new_key_type;

new_key_type! {
    /// Generational handle for a mobile entity tracked by the world.
    pub struct EntityKey;
    /// Generational handle for a baked tile.
    pub struct TileKey;
}

/// Author-time shape description, local to the entity's own coordinate frame.
///
/// Combined with the entity's live transform (position, scale, rotation) to
/// produce a world-space [`Primitive`] on demand. An unset shape degrades to
/// `Point` so decorative entities never collide with anything but an exact
/// position match.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ShapeDesc {
    /// Axis-aligned box in local coordinates (before rotation).
    Rect { left: f32, top: f32, right: f32, bottom: f32 },
    /// Circle centered on the entity origin.
    Circle { radius: f32 },
    /// Chain of line segments through the given local points; `closed` joins
    /// the last point back to the first. The strip has no interior.
    Strip { points: Vec<Vec2>, closed: bool },
    /// Single line segment between two local points.
    Line { a: Vec2, b: Vec2 },
    /// Degenerate zero-radius circle at the entity origin.
    #[default]
    Point,
}

/// Concrete world-space geometry produced by the shape model.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// Axis-aligned box (unrotated rects).
    Aabb { min: Vec2, max: Vec2 },
    /// Convex polygon, counter-clockwise winding (rotated rects, ellipses).
    Polygon(Vec<Vec2>),
    Circle { center: Vec2, radius: f32 },
    /// Bare segment chain; collides along its edges only, no interior.
    Polyline { points: Vec<Vec2>, closed: bool },
    Segment { a: Vec2, b: Vec2 },
    Point(Vec2),
}

/// Parameters for spawning a mobile entity.
#[derive(Clone, Debug)]
pub struct EntityDesc {
    /// Type identity, matched exactly by kind filters.
    pub kind: String,
    pub pos: Vec2,
    pub scale: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    pub shape: ShapeDesc,
    /// Opaque collision-group tag; `None` means ungrouped.
    pub cgroup: Option<String>,
}

impl Default for EntityDesc {
    fn default() -> Self {
        Self {
            kind: String::new(),
            pos: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            shape: ShapeDesc::Point,
            cgroup: None,
        }
    }
}

/// One static collider inside a [`TileLayer`].
#[derive(Clone, Debug)]
pub struct TileDef {
    pub pos: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    pub shape: ShapeDesc,
}

impl Default for TileDef {
    fn default() -> Self {
        Self { pos: Vec2::ZERO, scale: Vec2::ONE, rotation: 0.0, shape: ShapeDesc::Point }
    }
}

impl TileDef {
    /// Convenience: an unrotated world-space rect tile.
    pub fn rect(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            pos: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            shape: ShapeDesc::Rect { left, top, right, bottom },
        }
    }
}

/// Caller-built description of a static layer, baked at most once.
#[derive(Clone, Debug)]
pub struct TileLayer {
    /// Bake identity; baking the same name twice is a configuration error.
    pub name: String,
    pub tiles: Vec<TileDef>,
}

/// What an occupancy query or movement probe ran into.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Occupant {
    Entity(EntityKey),
    Tile(TileKey),
}

/// Per-axis blockers reported by `move_by_axes`. At least one axis is set.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisBlock {
    pub x: Option<Occupant>,
    pub y: Option<Occupant>,
}

/// Candidate pre-filter applied before the narrow phase. Filters are cheap
/// rejection only; geometry always has the final say.
#[derive(Copy, Clone, Debug)]
pub enum Filter<'a> {
    /// Match every candidate.
    Any,
    /// Candidate's collision group must equal the tag exactly.
    Group(&'a str),
    /// Candidate's declared kind must equal the name exactly.
    Kind(&'a str),
}

impl<'a> Filter<'a> {
    /// Group filter from an optional tag; `None` matches everything.
    pub fn group(tag: Option<&'a str>) -> Self {
        match tag {
            Some(g) => Filter::Group(g),
            None => Filter::Any,
        }
    }
}

/// World-level configuration.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Grid cell edge in world units. Buckets are cell_size × cell_size.
    pub cell_size: f32,
    /// Vertex count for the polygon approximating an anisotropically scaled
    /// circle.
    pub ellipse_vertices: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { cell_size: 64.0, ellipse_vertices: 16 }
    }
}

/// Configuration errors. Degenerate geometry is never an error; it degrades
/// to a zero-radius point instead.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("tile layer `{0}` has already been baked")]
    LayerAlreadyBaked(String),
    #[error("unknown entity kind `{0}` used in a filter")]
    UnknownKind(String),
}
