use glam::Vec2;

use crate::api::{CollisionWorldApi, MotionApi};
use crate::types::*;
use crate::world::CollisionWorld;

/// Shared avoidance side for [`MotionApi::go`].
///
/// The frame scheduler owns one of these and flips it on a fixed interval.
/// Every seeker probing in the same slice of time turns the same way, and the
/// periodic flip keeps crowds from all committing to one side forever.
#[derive(Copy, Clone, Debug)]
pub struct AvoidBias {
    sign: f32,
}

impl AvoidBias {
    pub fn new() -> Self {
        Self { sign: 1.0 }
    }

    /// Reverse the side probed first.
    pub fn flip(&mut self) {
        self.sign = -self.sign;
    }

    pub fn sign(&self) -> f32 {
        self.sign
    }
}

impl Default for AvoidBias {
    fn default() -> Self {
        Self::new()
    }
}

const DEG_30: f32 = std::f32::consts::FRAC_PI_6;

impl MotionApi for CollisionWorld {
    fn move_by_axes(
        &mut self,
        key: EntityKey,
        dx: f32,
        dy: f32,
        group: Option<&str>,
        precision: f32,
    ) -> Option<AxisBlock> {
        let step = if precision != 0.0 { precision.abs() } else { 1.0 };
        let mut pos = self.entity(key)?.pos();
        let start = pos;
        let mut block = AxisBlock { x: None, y: None };

        // X, then Y, each resolved independently: the classic slide-along-
        // walls behavior without continuous response.
        let mut rem = dx;
        while rem.abs() > step {
            let next = pos + Vec2::new(step.copysign(rem), 0.0);
            match self.occupied(key, Some(next), group) {
                None => {
                    pos = next;
                    rem -= step.copysign(rem);
                }
                Some(o) => {
                    block.x = Some(o);
                    rem = 0.0;
                }
            }
        }
        if block.x.is_none() && rem != 0.0 {
            let next = pos + Vec2::new(rem, 0.0);
            match self.occupied(key, Some(next), group) {
                None => pos = next,
                Some(o) => block.x = Some(o),
            }
        }

        let mut rem = dy;
        while rem.abs() > step {
            let next = pos + Vec2::new(0.0, step.copysign(rem));
            match self.occupied(key, Some(next), group) {
                None => {
                    pos = next;
                    rem -= step.copysign(rem);
                }
                Some(o) => {
                    block.y = Some(o);
                    rem = 0.0;
                }
            }
        }
        if block.y.is_none() && rem != 0.0 {
            let next = pos + Vec2::new(0.0, rem);
            match self.occupied(key, Some(next), group) {
                None => pos = next,
                Some(o) => block.y = Some(o),
            }
        }

        if pos != start {
            self.set_pos(key, pos);
        }
        if block.x.is_none() && block.y.is_none() { None } else { Some(block) }
    }

    fn move_along(
        &mut self,
        key: EntityKey,
        direction: f32,
        length: f32,
        group: Option<&str>,
        precision: f32,
    ) -> Option<Occupant> {
        let step = if precision != 0.0 { precision.abs() } else { 1.0 };
        let dir = Vec2::from_angle(direction);
        let mut pos = self.entity(key)?.pos();
        let start = pos;
        let mut rem = length;
        let mut hit = None;

        while rem > step {
            let next = pos + dir * step;
            if let Some(o) = self.occupied(key, Some(next), group) {
                hit = Some(o);
                rem = 0.0;
                break;
            }
            pos = next;
            rem -= step;
        }
        if hit.is_none() && rem > 0.0 {
            // Final sub-step scaled to the residual length.
            let next = pos + dir * rem;
            match self.occupied(key, Some(next), group) {
                None => pos = next,
                Some(o) => hit = Some(o),
            }
        }

        if pos != start {
            self.set_pos(key, pos);
        }
        hit
    }

    fn go(
        &mut self,
        key: EntityKey,
        target: Vec2,
        step_length: f32,
        group: Option<&str>,
        bias: &AvoidBias,
    ) {
        let Some(e) = self.entity(key) else { return };
        let pos = e.pos();
        let to = target - pos;
        let dist = to.length();

        if dist <= step_length && self.occupied(key, Some(target), group).is_none() {
            self.set_pos(key, target);
            if dist > 0.0 {
                self.set_direction(key, to.to_angle());
            }
            return;
        }
        if dist == 0.0 {
            // Sitting on a blocked target; no bearing to probe.
            return;
        }

        // A blocked nearby target is handled like any other obstacle: probe
        // the straight bearing at full step length, then the alternatives.
        let bearing = to.to_angle();
        let s = bias.sign();
        // Straight line first, then ±30°..±120° in broadening order; the
        // shared bias picks which side each pair tries first.
        let offsets =
            [0.0, s, -s, 2.0 * s, -2.0 * s, 3.0 * s, -3.0 * s, 4.0 * s, -4.0 * s];
        for mult in offsets {
            let angle = bearing + mult * DEG_30;
            let next = pos + Vec2::from_angle(angle) * step_length;
            if self.occupied(key, Some(next), group).is_none() {
                self.set_pos(key, next);
                self.set_direction(key, angle);
                return;
            }
        }
        log::trace!("go: all bearings blocked, holding position {pos}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn world() -> CollisionWorld {
        CollisionWorld::new(WorldConfig { cell_size: 10.0, ellipse_vertices: 16 })
    }

    fn point_entity(w: &mut CollisionWorld, kind: &str, x: f32, y: f32) -> EntityKey {
        w.spawn(EntityDesc { kind: kind.to_owned(), pos: Vec2::new(x, y), ..Default::default() })
    }

    fn wall(w: &mut CollisionWorld, l: f32, t: f32, r: f32, b: f32) -> EntityKey {
        w.spawn(EntityDesc {
            kind: "Wall".to_owned(),
            pos: Vec2::ZERO,
            shape: ShapeDesc::Rect { left: l, top: t, right: r, bottom: b },
            ..Default::default()
        })
    }

    #[test]
    fn test_move_by_axes_stops_before_wall() {
        let mut w = world();
        let hero = point_entity(&mut w, "Hero", 0.0, 0.0);
        let wall = wall(&mut w, 20.0, -5.0, 30.0, 5.0);

        let block = w.move_by_axes(hero, 50.0, 0.0, None, 1.0).unwrap();
        assert_eq!(block.x, Some(Occupant::Entity(wall)));
        assert_eq!(block.y, None);
        let pos = w.entity(hero).unwrap().pos();
        assert_relative_eq!(pos.x, 19.0, epsilon = 1e-4);
        assert_relative_eq!(pos.y, 0.0);
    }

    #[test]
    fn test_move_by_axes_axis_independence() {
        let mut w = world();
        let hero = point_entity(&mut w, "Hero", 0.0, 0.0);
        let _wall = wall(&mut w, 5.0, -50.0, 8.0, 50.0);

        // X hits the wall, Y keeps its full displacement.
        let block = w.move_by_axes(hero, 10.0, 10.0, None, 1.0).unwrap();
        assert!(block.x.is_some());
        assert_eq!(block.y, None);
        let pos = w.entity(hero).unwrap().pos();
        assert_relative_eq!(pos.x, 4.0, epsilon = 1e-4);
        assert_relative_eq!(pos.y, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_move_by_axes_free_applies_fraction() {
        let mut w = world();
        let hero = point_entity(&mut w, "Hero", 0.0, 0.0);
        assert!(w.move_by_axes(hero, 2.5, -1.25, None, 1.0).is_none());
        let pos = w.entity(hero).unwrap().pos();
        assert_relative_eq!(pos.x, 2.5, epsilon = 1e-5);
        assert_relative_eq!(pos.y, -1.25, epsilon = 1e-5);
    }

    #[test]
    fn test_move_by_axes_respects_group_filter() {
        let mut w = world();
        let hero = point_entity(&mut w, "Hero", 0.0, 0.0);
        let _ghost = wall(&mut w, 3.0, -5.0, 6.0, 5.0);
        // The wall is ungrouped; moving against the "Solid" group passes
        // straight through it.
        assert!(w.move_by_axes(hero, 10.0, 0.0, Some("Solid"), 1.0).is_none());
        assert_relative_eq!(w.entity(hero).unwrap().pos().x, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_move_along_stops_at_first_blocked_substep() {
        let mut w = world();
        let hero = point_entity(&mut w, "Hero", 0.0, 0.0);
        let wall = wall(&mut w, 8.0, -5.0, 12.0, 5.0);

        let hit = w.move_along(hero, 0.0, 15.0, None, 1.0);
        assert_eq!(hit, Some(Occupant::Entity(wall)));
        assert_relative_eq!(w.entity(hero).unwrap().pos().x, 7.0, epsilon = 1e-4);
    }

    #[test]
    fn test_move_along_traverses_full_length() {
        let mut w = world();
        let hero = point_entity(&mut w, "Hero", 0.0, 0.0);
        let dir = std::f32::consts::FRAC_PI_2;
        assert!(w.move_along(hero, dir, 2.5, None, 1.0).is_none());
        let pos = w.entity(hero).unwrap().pos();
        assert_relative_eq!(pos.y, 2.5, epsilon = 1e-5);
        assert_relative_eq!(pos.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_go_reaches_target_in_ten_steps() {
        let mut w = world();
        let hero = point_entity(&mut w, "Hero", 0.0, 0.0);
        let bias = AvoidBias::new();
        for _ in 0..10 {
            w.go(hero, Vec2::new(100.0, 0.0), 10.0, None, &bias);
        }
        assert_eq!(w.entity(hero).unwrap().pos(), Vec2::new(100.0, 0.0));
    }

    #[test]
    fn test_go_sidesteps_wall_by_bias_side() {
        let mut w = world();
        let hero = point_entity(&mut w, "Hero", 0.0, 0.0);
        let _wall = wall(&mut w, 8.0, -20.0, 12.0, 20.0);

        let bias = AvoidBias::new();
        w.go(hero, Vec2::new(40.0, 0.0), 10.0, None, &bias);
        let up = w.entity(hero).unwrap().pos();
        assert!(up.y > 0.0, "bias +1 probes the +30° side first, got {up}");

        // Same setup with the flipped bias turns the other way.
        let hero2 = point_entity(&mut w, "Hero", 0.0, 0.0);
        let mut bias = AvoidBias::new();
        bias.flip();
        w.go(hero2, Vec2::new(40.0, 0.0), 10.0, None, &bias);
        let down = w.entity(hero2).unwrap().pos();
        assert!(down.y < 0.0, "bias -1 probes the -30° side first, got {down}");
    }

    #[test]
    fn test_go_within_step_but_blocked_target_still_avoids() {
        let mut w = world();
        let hero = point_entity(&mut w, "Hero", 0.0, 0.0);
        // Target sits 5 units away, inside a blocker; the snap is denied but
        // the bearing sweep still has to produce a move.
        let _blocker = w.spawn(EntityDesc {
            kind: "Blocker".to_owned(),
            pos: Vec2::new(5.0, 0.0),
            shape: ShapeDesc::Circle { radius: 2.0 },
            ..Default::default()
        });
        let bias = AvoidBias::new();
        w.go(hero, Vec2::new(5.0, 0.0), 10.0, None, &bias);
        let pos = w.entity(hero).unwrap().pos();
        assert_ne!(pos, Vec2::ZERO, "blocked nearby target must not stall the seeker");
        // Straight bearing at full step length clears the blocker.
        assert_relative_eq!(pos.x, 10.0, epsilon = 1e-4);
        assert_relative_eq!(w.entity(hero).unwrap().direction(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_negative_precision_steps_by_magnitude() {
        let mut w = world();
        let hero = point_entity(&mut w, "Hero", 0.0, 0.0);
        let wall = wall(&mut w, 20.0, -5.0, 30.0, 5.0);

        let block = w.move_by_axes(hero, 50.0, 0.0, None, -1.0).unwrap();
        assert_eq!(block.x, Some(Occupant::Entity(wall)));
        assert_relative_eq!(w.entity(hero).unwrap().pos().x, 19.0, epsilon = 1e-4);

        let hero2 = point_entity(&mut w, "Hero", 0.0, 40.0);
        assert!(w.move_along(hero2, 0.0, 2.5, None, -1.0).is_none());
        assert_relative_eq!(w.entity(hero2).unwrap().pos().x, 2.5, epsilon = 1e-5);
    }

    #[test]
    fn test_go_updates_facing_direction() {
        let mut w = world();
        let hero = point_entity(&mut w, "Hero", 0.0, 0.0);
        let bias = AvoidBias::new();
        w.go(hero, Vec2::new(0.0, 100.0), 10.0, None, &bias);
        assert_relative_eq!(
            w.entity(hero).unwrap().direction(),
            std::f32::consts::FRAC_PI_2,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_go_holds_position_when_fully_boxed_in() {
        let mut w = world();
        let hero = point_entity(&mut w, "Hero", 0.0, 0.0);
        // Ring of walls well inside the probe radius on every bearing.
        let _ring = w.spawn(EntityDesc {
            kind: "Ring".to_owned(),
            pos: Vec2::ZERO,
            shape: ShapeDesc::Rect { left: -15.0, top: -15.0, right: 15.0, bottom: 15.0 },
            ..Default::default()
        });
        let bias = AvoidBias::new();
        w.go(hero, Vec2::new(100.0, 0.0), 10.0, None, &bias);
        assert_eq!(w.entity(hero).unwrap().pos(), Vec2::ZERO);
    }
}
