use glam::Vec2;
use slotmap::SlotMap;

use std::collections::HashSet;

use crate::api::{CollisionWorldApi, NarrowphaseApi, ShapeApi};
use crate::grid::SpatialGrid;
use crate::narrowphase::Narrowphase;
use crate::shape::Shape;
use crate::types::*;

/// A mobile entity tracked by the world.
///
/// Transform fields are private: every change must go through the world's
/// mutators so the cached primitive and the grid membership stay in sync.
#[derive(Debug)]
pub struct Entity {
    pub(crate) kind: String,
    pub(crate) cgroup: Option<String>,
    pub(crate) shape: ShapeDesc,
    pub(crate) pos: Vec2,
    pub(crate) scale: Vec2,
    pub(crate) rotation: f32,
    /// Facing in radians, updated by `go` when it commits a move.
    pub(crate) direction: f32,
    pub(crate) prim: Primitive,
    pub(crate) dirty: bool,
    pub(crate) buckets: Vec<(i32, i32)>,
}

impl Entity {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn cgroup(&self) -> Option<&str> {
        self.cgroup.as_deref()
    }

    pub fn shape(&self) -> &ShapeDesc {
        &self.shape
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    /// The cached world-space primitive.
    pub fn primitive(&self) -> &Primitive {
        &self.prim
    }
}

/// A baked static collider. Indexed once at bake time, never moved.
#[derive(Debug)]
pub struct Tile {
    pub(crate) prim: Primitive,
    pub(crate) cgroup: Option<String>,
}

impl Tile {
    pub fn cgroup(&self) -> Option<&str> {
        self.cgroup.as_deref()
    }

    pub fn primitive(&self) -> &Primitive {
        &self.prim
    }
}

/// Broad+narrow phase collision world over two independent uniform grids:
/// one for mobile entities, one for baked tile geometry.
pub struct CollisionWorld {
    cfg: WorldConfig,
    entities: SlotMap<EntityKey, Entity>,
    tiles: SlotMap<TileKey, Tile>,
    mobile: SpatialGrid<EntityKey>,
    tile_grid: SpatialGrid<TileKey>,
    kinds: HashSet<String>,
    baked_layers: HashSet<String>,
}

impl CollisionWorldApi for CollisionWorld {
    fn new(cfg: WorldConfig) -> Self {
        let cs = cfg.cell_size;
        Self {
            cfg,
            entities: SlotMap::with_key(),
            tiles: SlotMap::with_key(),
            mobile: SpatialGrid::new(cs),
            tile_grid: SpatialGrid::new(cs),
            kinds: HashSet::new(),
            baked_layers: HashSet::new(),
        }
    }

    fn spawn(&mut self, desc: EntityDesc) -> EntityKey {
        let prim =
            Shape::build(&desc.shape, desc.pos, desc.scale, desc.rotation, self.cfg.ellipse_vertices);
        let (min, max) = Shape::aabb(&prim);
        let cells = self.mobile.cells_for(min, max);
        self.kinds.insert(desc.kind.clone());
        log::debug!("spawn `{}` at {} in {} buckets", desc.kind, desc.pos, cells.len());
        let key = self.entities.insert(Entity {
            kind: desc.kind,
            cgroup: desc.cgroup,
            shape: desc.shape,
            pos: desc.pos,
            scale: desc.scale,
            rotation: desc.rotation,
            direction: 0.0,
            prim,
            dirty: false,
            buckets: cells.clone(),
        });
        self.mobile.insert(key, &cells);
        key
    }

    fn despawn(&mut self, key: EntityKey) -> Option<Entity> {
        let e = self.entities.remove(key)?;
        self.mobile.remove(key, &e.buckets);
        log::debug!("despawned `{}`", e.kind);
        Some(e)
    }

    fn enable_tile_collisions(
        &mut self,
        layer: &TileLayer,
        group: Option<&str>,
    ) -> Result<Vec<TileKey>, WorldError> {
        if !self.baked_layers.insert(layer.name.clone()) {
            return Err(WorldError::LayerAlreadyBaked(layer.name.clone()));
        }
        let mut keys = Vec::with_capacity(layer.tiles.len());
        for def in &layer.tiles {
            let prim = Shape::build(
                &def.shape,
                def.pos,
                def.scale,
                def.rotation,
                self.cfg.ellipse_vertices,
            );
            let (min, max) = Shape::aabb(&prim);
            let cells = self.tile_grid.cells_for(min, max);
            let key = self.tiles.insert(Tile { prim, cgroup: group.map(str::to_owned) });
            self.tile_grid.insert(key, &cells);
            keys.push(key);
        }
        log::debug!("baked tile layer `{}` ({} tiles)", layer.name, keys.len());
        Ok(keys)
    }

    fn clear_tiles(&mut self) {
        self.tiles.clear();
        self.tile_grid.clear();
        self.baked_layers.clear();
        log::debug!("cleared all baked tile layers");
    }

    fn set_pos(&mut self, key: EntityKey, pos: Vec2) {
        if let Some(e) = self.entities.get_mut(key) {
            if e.pos == pos {
                return;
            }
            e.pos = pos;
            e.dirty = true;
            self.refresh(key);
        }
    }

    fn set_scale(&mut self, key: EntityKey, scale: Vec2) {
        if let Some(e) = self.entities.get_mut(key) {
            if e.scale == scale {
                return;
            }
            e.scale = scale;
            e.dirty = true;
            self.refresh(key);
        }
    }

    fn set_rotation(&mut self, key: EntityKey, rotation: f32) {
        if let Some(e) = self.entities.get_mut(key) {
            if e.rotation == rotation {
                return;
            }
            e.rotation = rotation;
            e.dirty = true;
            self.refresh(key);
        }
    }

    fn set_shape(&mut self, key: EntityKey, shape: ShapeDesc) {
        if let Some(e) = self.entities.get_mut(key) {
            e.shape = shape;
            e.dirty = true;
            self.refresh(key);
        }
    }

    fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    fn tile(&self, key: TileKey) -> Option<&Tile> {
        self.tiles.get(key)
    }

    fn occupied(&self, key: EntityKey, at: Option<Vec2>, group: Option<&str>) -> Option<Occupant> {
        let e = self.entities.get(key)?;
        let probe = self.probe_primitive(e, at);
        let prim = probe.as_ref().unwrap_or(&e.prim);
        let filter = Filter::group(group);
        // Mobile grid first; the tile grid is scanned only when nothing
        // mobile matched.
        if let Some(hit) = self.scan_mobile(prim, Some(key), &filter, false).into_iter().next() {
            return Some(Occupant::Entity(hit));
        }
        self.scan_tiles(prim, group, false).into_iter().next().map(Occupant::Tile)
    }

    fn occupied_all(&self, key: EntityKey, at: Option<Vec2>, group: Option<&str>) -> Vec<Occupant> {
        let Some(e) = self.entities.get(key) else { return Vec::new() };
        let probe = self.probe_primitive(e, at);
        let prim = probe.as_ref().unwrap_or(&e.prim);
        let filter = Filter::group(group);
        let mut out: Vec<Occupant> = self
            .scan_mobile(prim, Some(key), &filter, true)
            .into_iter()
            .map(Occupant::Entity)
            .collect();
        out.extend(self.scan_tiles(prim, group, true).into_iter().map(Occupant::Tile));
        out
    }

    fn meet(
        &self,
        key: EntityKey,
        at: Option<Vec2>,
        kind: &str,
    ) -> Result<Option<EntityKey>, WorldError> {
        self.check_kind(kind)?;
        let Some(e) = self.entities.get(key) else { return Ok(None) };
        let probe = self.probe_primitive(e, at);
        let prim = probe.as_ref().unwrap_or(&e.prim);
        Ok(self.scan_mobile(prim, Some(key), &Filter::Kind(kind), false).into_iter().next())
    }

    fn meet_all(
        &self,
        key: EntityKey,
        at: Option<Vec2>,
        kind: &str,
    ) -> Result<Vec<EntityKey>, WorldError> {
        self.check_kind(kind)?;
        let Some(e) = self.entities.get(key) else { return Ok(Vec::new()) };
        let probe = self.probe_primitive(e, at);
        let prim = probe.as_ref().unwrap_or(&e.prim);
        Ok(self.scan_mobile(prim, Some(key), &Filter::Kind(kind), true))
    }

    fn copies(&self, key: EntityKey, at: Option<Vec2>, group: Option<&str>) -> Option<EntityKey> {
        let e = self.entities.get(key)?;
        let probe = self.probe_primitive(e, at);
        let prim = probe.as_ref().unwrap_or(&e.prim);
        self.scan_mobile(prim, Some(key), &Filter::group(group), false).into_iter().next()
    }

    fn copies_all(&self, key: EntityKey, at: Option<Vec2>, group: Option<&str>) -> Vec<EntityKey> {
        let Some(e) = self.entities.get(key) else { return Vec::new() };
        let probe = self.probe_primitive(e, at);
        let prim = probe.as_ref().unwrap_or(&e.prim);
        self.scan_mobile(prim, Some(key), &Filter::group(group), true)
    }

    fn tiles(&self, key: EntityKey, at: Option<Vec2>, group: Option<&str>) -> Option<TileKey> {
        let e = self.entities.get(key)?;
        let probe = self.probe_primitive(e, at);
        let prim = probe.as_ref().unwrap_or(&e.prim);
        self.scan_tiles(prim, group, false).into_iter().next()
    }

    fn tiles_all(&self, key: EntityKey, at: Option<Vec2>, group: Option<&str>) -> Vec<TileKey> {
        let Some(e) = self.entities.get(key) else { return Vec::new() };
        let probe = self.probe_primitive(e, at);
        let prim = probe.as_ref().unwrap_or(&e.prim);
        self.scan_tiles(prim, group, true)
    }

    fn trace_line(&self, a: Vec2, b: Vec2, group: Option<&str>) -> Option<Occupant> {
        self.trace(&Primitive::Segment { a, b }, group, false).into_iter().next()
    }

    fn trace_line_all(&self, a: Vec2, b: Vec2, group: Option<&str>) -> Vec<Occupant> {
        self.trace(&Primitive::Segment { a, b }, group, true)
    }

    fn trace_rect(&self, min: Vec2, max: Vec2, group: Option<&str>) -> Option<Occupant> {
        self.trace(&Primitive::Aabb { min, max }, group, false).into_iter().next()
    }

    fn trace_rect_all(&self, min: Vec2, max: Vec2, group: Option<&str>) -> Vec<Occupant> {
        self.trace(&Primitive::Aabb { min, max }, group, true)
    }

    fn trace_circle(&self, center: Vec2, radius: f32, group: Option<&str>) -> Option<Occupant> {
        self.trace(&Primitive::Circle { center, radius }, group, false).into_iter().next()
    }

    fn trace_circle_all(&self, center: Vec2, radius: f32, group: Option<&str>) -> Vec<Occupant> {
        self.trace(&Primitive::Circle { center, radius }, group, true)
    }

    fn trace_polyline(
        &self,
        points: &[Vec2],
        closed: bool,
        group: Option<&str>,
    ) -> Option<Occupant> {
        self.trace(&Primitive::Polyline { points: points.to_vec(), closed }, group, false)
            .into_iter()
            .next()
    }

    fn trace_polyline_all(
        &self,
        points: &[Vec2],
        closed: bool,
        group: Option<&str>,
    ) -> Vec<Occupant> {
        self.trace(&Primitive::Polyline { points: points.to_vec(), closed }, group, true)
    }

    fn trace_point(&self, p: Vec2, group: Option<&str>) -> Option<Occupant> {
        self.trace(&Primitive::Point(p), group, false).into_iter().next()
    }

    fn trace_point_all(&self, p: Vec2, group: Option<&str>) -> Vec<Occupant> {
        self.trace(&Primitive::Point(p), group, true)
    }
}

impl CollisionWorld {
    pub fn config(&self) -> &WorldConfig {
        &self.cfg
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Rebuild the cached primitive and swap bucket membership. Runs inside
    /// every mutator, so queries later in the frame observe the move.
    fn refresh(&mut self, key: EntityKey) {
        let Self { entities, mobile, cfg, .. } = self;
        let Some(e) = entities.get_mut(key) else { return };
        if !e.dirty {
            return;
        }
        e.prim = Shape::build(&e.shape, e.pos, e.scale, e.rotation, cfg.ellipse_vertices);
        e.dirty = false;
        let (min, max) = Shape::aabb(&e.prim);
        let cells = mobile.cells_for(min, max);
        mobile.retrack(key, &e.buckets, &cells);
        e.buckets = cells;
    }

    /// Record a new facing without touching the collision footprint.
    pub(crate) fn set_direction(&mut self, key: EntityKey, direction: f32) {
        if let Some(e) = self.entities.get_mut(key) {
            e.direction = direction;
        }
    }

    /// Throwaway primitive for a hypothetical probe position, or `None` to
    /// use the target's cached primitive. Never touches the real entity.
    fn probe_primitive(&self, e: &Entity, at: Option<Vec2>) -> Option<Primitive> {
        match at {
            Some(p) if p != e.pos => {
                Some(Shape::build(&e.shape, p, e.scale, e.rotation, self.cfg.ellipse_vertices))
            }
            _ => {
                debug_assert!(!e.dirty, "cached primitive observed stale");
                None
            }
        }
    }

    fn check_kind(&self, kind: &str) -> Result<(), WorldError> {
        if self.kinds.contains(kind) {
            Ok(())
        } else {
            Err(WorldError::UnknownKind(kind.to_owned()))
        }
    }

    fn filter_matches(filter: &Filter, cand: &Entity) -> bool {
        match filter {
            Filter::Any => true,
            Filter::Group(g) => cand.cgroup.as_deref() == Some(*g),
            Filter::Kind(k) => cand.kind == *k,
        }
    }

    /// Broad phase over the mobile grid, then filter, then narrow phase.
    /// Single-result mode stops at the first hit.
    fn scan_mobile(
        &self,
        prim: &Primitive,
        skip: Option<EntityKey>,
        filter: &Filter,
        all: bool,
    ) -> Vec<EntityKey> {
        let (min, max) = Shape::aabb(prim);
        let mut seen: HashSet<EntityKey> = HashSet::new();
        let mut out = Vec::new();
        for cell in self.mobile.cells_for(min, max) {
            let Some(bucket) = self.mobile.bucket(cell) else { continue };
            for &k in bucket {
                if Some(k) == skip || !seen.insert(k) {
                    continue;
                }
                let Some(cand) = self.entities.get(k) else { continue };
                if !Self::filter_matches(filter, cand) {
                    continue;
                }
                if Narrowphase::intersects(prim, &cand.prim) {
                    out.push(k);
                    if !all {
                        return out;
                    }
                }
            }
        }
        out
    }

    fn scan_tiles(&self, prim: &Primitive, group: Option<&str>, all: bool) -> Vec<TileKey> {
        let (min, max) = Shape::aabb(prim);
        let mut seen: HashSet<TileKey> = HashSet::new();
        let mut out = Vec::new();
        for cell in self.tile_grid.cells_for(min, max) {
            let Some(bucket) = self.tile_grid.bucket(cell) else { continue };
            for &k in bucket {
                if !seen.insert(k) {
                    continue;
                }
                let Some(tile) = self.tiles.get(k) else { continue };
                if let Some(g) = group {
                    if tile.cgroup.as_deref() != Some(g) {
                        continue;
                    }
                }
                if Narrowphase::intersects(prim, &tile.prim) {
                    out.push(k);
                    if !all {
                        return out;
                    }
                }
            }
        }
        out
    }

    /// Ad-hoc shape query over both populations. A probe wider than one grid
    /// cell skips the index and scans every entity and tile linearly.
    fn trace(&self, prim: &Primitive, group: Option<&str>, all: bool) -> Vec<Occupant> {
        let (min, max) = Shape::aabb(prim);
        let size = max - min;
        let cs = self.cfg.cell_size;
        let mut out = Vec::new();
        if size.x > cs || size.y > cs {
            for (k, e) in &self.entities {
                if let Some(g) = group {
                    if e.cgroup.as_deref() != Some(g) {
                        continue;
                    }
                }
                if Narrowphase::intersects(prim, &e.prim) {
                    out.push(Occupant::Entity(k));
                    if !all {
                        return out;
                    }
                }
            }
            for (k, t) in &self.tiles {
                if let Some(g) = group {
                    if t.cgroup.as_deref() != Some(g) {
                        continue;
                    }
                }
                if Narrowphase::intersects(prim, &t.prim) {
                    out.push(Occupant::Tile(k));
                    if !all {
                        return out;
                    }
                }
            }
        } else {
            let filter = Filter::group(group);
            out.extend(self.scan_mobile(prim, None, &filter, all).into_iter().map(Occupant::Entity));
            if !all && !out.is_empty() {
                return out;
            }
            out.extend(self.scan_tiles(prim, group, all).into_iter().map(Occupant::Tile));
        }
        out
    }
}
