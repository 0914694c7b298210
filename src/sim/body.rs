//! Point-mass body physics against the height field and hit-groups
//!
//! One call to [`Entity::update_body`] per step does, in order: speed clamp,
//! integration with the split gravity term, entity contacts, per-axis wall
//! sweeps, and floor resolution. Bodies have a radius but no rotation.

use std::ops::RangeInclusive;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::{Behavior, Entity};
use super::groups::GroupMask;
use super::terrain::{HeightField, cell_of, cells_covering, clip_cells, saturate};
use super::world::StepContext;
use crate::consts::{FLOOR_TOLERANCE, GRAVITY, MAX_VELOCITY, STEP_HEIGHT};

/// Slack when deciding which cell a leading edge already touches
const EDGE_EPSILON: f32 = 1e-4;

/// Dynamic state of a physics-driven entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    pub vel: Vec3,
    pub gravity_scale: f32,
    /// Skips integration and self-side collision; still a valid target
    pub sleeping: bool,
    /// Climbs ledges up to `STEP_HEIGHT` and rides the floor
    pub can_step: bool,
    /// Resting on walkable ground; gravity is suspended while set
    pub floor_locked: bool,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            vel: Vec3::ZERO,
            gravity_scale: 1.0,
            sleeping: false,
            can_step: false,
            floor_locked: false,
        }
    }
}

impl PhysicsBody {
    pub fn new(vel: Vec3) -> Self {
        Self {
            vel,
            ..Default::default()
        }
    }

    pub fn stepping(mut self) -> Self {
        self.can_step = true;
        self
    }

    pub fn with_gravity_scale(mut self, gravity_scale: f32) -> Self {
        self.gravity_scale = gravity_scale;
        self
    }

    /// Scale velocity down uniformly to the speed cap
    #[inline]
    pub fn clamp_velocity(&mut self) {
        self.vel = self.vel.clamp_length_max(MAX_VELOCITY);
    }
}

impl Entity {
    /// Advance this entity's body by one step
    ///
    /// `mask` selects the hit-groups tested for entity contacts. Does nothing
    /// for entities without a body or with a sleeping one.
    pub fn update_body<B: Behavior + ?Sized>(
        &mut self,
        hooks: &mut B,
        ctx: &mut StepContext<'_>,
        mask: GroupMask,
    ) {
        let dt = ctx.dt;
        let Some(body) = self.body.as_mut() else {
            return;
        };
        if body.sleeping {
            return;
        }

        body.clamp_velocity();
        let start = self.pos;
        let mut pos = start + body.vel * dt;
        if !body.floor_locked {
            // Position term uses the pre-update velocity
            let accel = body.gravity_scale * GRAVITY;
            pos.z += 0.5 * accel * dt * dt;
            body.vel.z += accel * dt;
            body.clamp_velocity();
        }
        let can_step = body.can_step;
        self.pos = pos;

        if !mask.is_empty() {
            ctx.collide_groups(self, hooks, mask);
            if self.dead || self.revert_non_finite(start) {
                return;
            }
        }

        let tolerance = if can_step { STEP_HEIGHT } else { FLOOR_TOLERANCE };
        let reach = start.z.max(self.pos.z) - self.half_height() + tolerance;
        let terrain = ctx.terrain;
        self.collide_walls(hooks, ctx, terrain, start, reach);
        if can_step {
            self.ride_floor(terrain);
        } else {
            self.land_on_floor(hooks, ctx, terrain, reach);
        }
        self.revert_non_finite(start);
    }

    fn collide_walls<B: Behavior + ?Sized>(
        &mut self,
        hooks: &mut B,
        ctx: &mut StepContext<'_>,
        terrain: &HeightField,
        start: Vec3,
        reach: f32,
    ) {
        let r = self.radius;
        let (x0, y0) = (start.x, start.y);
        let (x1, y1) = (self.pos.x, self.pos.y);
        let blocks = |gx: i32, gy: i32| terrain.height_at(gx, gy) > reach;

        let (span_x, span_y) = (terrain.span_x(), terrain.span_y());
        let xs = entered_cells(x0, x1, r, &span_x);
        let ys = entered_cells(y0, y1, r, &span_y);

        let rows = clip_cells(cells_covering(y0 - r, y0 + r), span_y);
        let mut x_wall = xs
            .iter()
            .copied()
            .find(|&cx| rows.clone().any(|cy| blocks(cx, cy)));
        let cols = clip_cells(cells_covering(x0 - r, x0 + r), span_x);
        let mut y_wall = ys
            .iter()
            .copied()
            .find(|&cy| cols.clone().any(|cx| blocks(cx, cy)));

        if x_wall.is_none() && y_wall.is_none() {
            // Only the diagonal cell is solid: block the axis that crossed into
            // it last so the other one can slide past the corner
            let corner = xs
                .iter()
                .flat_map(|&cx| ys.iter().map(move |&cy| (cx, cy)))
                .find(|&(cx, cy)| blocks(cx, cy));
            if let Some((cx, cy)) = corner {
                if penetration(x0, x1, r, cx) <= penetration(y0, y1, r, cy) {
                    x_wall = Some(cx);
                } else {
                    y_wall = Some(cy);
                }
            }
        }

        if let Some(cx) = x_wall {
            let (edge, normal) = wall_edge(x0, x1, r, cx);
            self.pos.x = edge;
            self.hit_surface(hooks, ctx, Vec3::new(normal, 0.0, 0.0));
        }
        if let Some(cy) = y_wall {
            let (edge, normal) = wall_edge(y0, y1, r, cy);
            self.pos.y = edge;
            self.hit_surface(hooks, ctx, Vec3::new(0.0, normal, 0.0));
        }
    }

    /// Floor handling for stepping bodies: follow a smoothed floor while locked
    fn ride_floor(&mut self, terrain: &HeightField) {
        let floor = stepping_floor(terrain, self.pos.x, self.pos.y);
        let feet = self.feet();
        let half_height = self.half_height();
        let Some(body) = self.body.as_mut() else {
            return;
        };
        body.floor_locked = if body.floor_locked {
            body.vel.z < 1.0 && feet - floor < STEP_HEIGHT
        } else {
            feet < floor
        };
        if body.floor_locked {
            body.vel.z = 0.0;
            self.pos.z = floor + half_height;
        }
    }

    /// Floor handling for non-stepping bodies: land on the highest reachable cell
    fn land_on_floor<B: Behavior + ?Sized>(
        &mut self,
        hooks: &mut B,
        ctx: &mut StepContext<'_>,
        terrain: &HeightField,
        reach: f32,
    ) {
        let floor = footprint_floor(terrain, self.pos, self.radius, reach);
        if self.feet() < floor {
            self.pos.z = floor + self.half_height();
            self.hit_surface(hooks, ctx, Vec3::Z);
        }
    }

    /// Run the world-contact hook, then drop any velocity still driving into
    /// the surface
    fn hit_surface<B: Behavior + ?Sized>(
        &mut self,
        hooks: &mut B,
        ctx: &mut StepContext<'_>,
        normal: Vec3,
    ) {
        hooks.collide_world(self, normal, ctx);
        if let Some(body) = self.body.as_mut() {
            let into = body.vel.dot(normal);
            if into < 0.0 {
                body.vel -= normal * into;
            }
        }
    }

    /// Returns whether the state had to be reverted
    fn revert_non_finite(&mut self, start: Vec3) -> bool {
        let Some(body) = self.body.as_mut() else {
            return false;
        };
        if self.pos.is_finite() && body.vel.is_finite() {
            return false;
        }
        log::warn!(
            "Non-finite body state (pos {:?}, vel {:?}), reverting",
            self.pos,
            body.vel
        );
        self.pos = if start.is_finite() { start } else { Vec3::ZERO };
        body.vel = Vec3::ZERO;
        true
    }
}

/// Cells newly entered by the leading edge moving from `from` to `to`,
/// nearest first
///
/// Past the edge of `span` every cell reads as the same open ground, so only
/// the nearest cell beyond it is listed.
fn entered_cells(from: f32, to: f32, radius: f32, span: &RangeInclusive<i32>) -> Vec<i32> {
    let (lo, hi) = (i64::from(*span.start()), i64::from(*span.end()));
    let mut cells = Vec::new();
    if to > from {
        let first = (from + radius - EDGE_EPSILON).ceil() as i64;
        let last = ((to + radius).ceil() as i64).saturating_sub(1);
        if first <= last {
            cells.push(first);
            cells.extend(first.saturating_add(1).max(lo)..=last.min(hi));
        }
    } else if to < from {
        let first = ((from - radius + EDGE_EPSILON).floor() as i64).saturating_sub(1);
        let last = (to - radius).floor() as i64;
        if first >= last {
            cells.push(first);
            cells.extend((last.max(lo)..=first.saturating_sub(1).min(hi)).rev());
        }
    }
    cells.into_iter().map(saturate).collect()
}

/// Fraction of this step's motion spent past the near edge of `cell`
fn penetration(from: f32, to: f32, radius: f32, cell: i32) -> f32 {
    let (lead, boundary) = if to > from {
        (to + radius, cell as f32)
    } else {
        (to - radius, cell as f32 + 1.0)
    };
    (lead - boundary).abs() / (to - from).abs()
}

/// Snapped centre coordinate and outward normal sign for a blocking cell
fn wall_edge(from: f32, to: f32, radius: f32, cell: i32) -> (f32, f32) {
    if to > from {
        (cell as f32 - radius, -1.0)
    } else {
        (cell as f32 + 1.0 + radius, 1.0)
    }
}

/// Bilinear floor from the four cells nearest `(x, y)`, ignoring cells more
/// than a step away from the cell directly below
fn stepping_floor(terrain: &HeightField, x: f32, y: f32) -> f32 {
    let below = terrain.height_below(x, y);
    let (fx, fy) = (x - 0.5, y - 0.5);
    let (bx, by) = (fx.floor(), fy.floor());
    let (tx, ty) = (fx - bx, fy - by);
    let (cx, cy) = (bx as i32, by as i32);

    let (nx, ny) = (cx.saturating_add(1), cy.saturating_add(1));
    let samples = [
        (cx, cy, (1.0 - tx) * (1.0 - ty)),
        (nx, cy, tx * (1.0 - ty)),
        (cx, ny, (1.0 - tx) * ty),
        (nx, ny, tx * ty),
    ];
    let mut sum = 0.0;
    let mut weight = 0.0;
    for (gx, gy, w) in samples {
        let h = terrain.height_at(gx, gy);
        if (h - below).abs() <= STEP_HEIGHT {
            sum += w * h;
            weight += w;
        }
    }
    if weight > 1e-6 { sum / weight } else { below }
}

/// Highest cell under the footprint that is within reach; the overall highest
/// if none is
fn footprint_floor(terrain: &HeightField, pos: Vec3, radius: f32, reach: f32) -> f32 {
    let mut reachable: Option<f32> = None;
    let mut highest = f32::NEG_INFINITY;
    let cols = clip_cells(cells_covering(pos.x - radius, pos.x + radius), terrain.span_x());
    let rows = clip_cells(cells_covering(pos.y - radius, pos.y + radius), terrain.span_y());
    for gx in cols {
        for gy in rows.clone() {
            let h = terrain.height_at(gx, gy);
            highest = highest.max(h);
            if h <= reach {
                reachable = Some(reachable.map_or(h, |best| best.max(h)));
            }
        }
    }
    reachable.unwrap_or_else(|| {
        if highest.is_finite() {
            highest
        } else {
            terrain.height_at(cell_of(pos.x), cell_of(pos.y))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Actor, HitGroup, World};
    use std::cell::Cell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    /// Moves its body every update against the given mask, counting hooks
    #[derive(Default)]
    struct Recorder {
        mask: GroupMask,
        world_hits: Rc<Cell<u32>>,
        entity_hits: Rc<Cell<u32>>,
        die_on_contact: bool,
    }

    impl Behavior for Recorder {
        fn update(&mut self, entity: &mut Entity, _parent: Vec3, ctx: &mut StepContext<'_>) {
            let mask = self.mask;
            entity.update_body(self, ctx, mask);
        }

        fn collide_world(&mut self, _entity: &mut Entity, _normal: Vec3, _ctx: &mut StepContext<'_>) {
            self.world_hits.set(self.world_hits.get() + 1);
        }

        fn collide_entity(
            &mut self,
            entity: &mut Entity,
            _other: &Entity,
            _dir: Vec3,
            _ctx: &mut StepContext<'_>,
        ) {
            self.entity_hits.set(self.entity_hits.get() + 1);
            if self.die_on_contact {
                entity.mark_dead();
            }
        }
    }

    fn body_at(pos: Vec3, radius: f32, body: PhysicsBody) -> Entity {
        Entity::new(pos, radius).with_body(body)
    }

    fn bump_world() -> World {
        let mut world = World::new(1);
        let mut heights = vec![0.0; 9];
        heights[4] = 1.0;
        world.set_height_field(3, 3, -1, -1, heights).unwrap();
        world
    }

    #[test]
    fn test_sleeping_body_is_untouched() {
        let mut world = World::new(1);
        let mut body = PhysicsBody::new(Vec3::new(50.0, 0.0, 3.0));
        body.sleeping = true;
        let id = world.spawn(
            Actor::new(body_at(Vec3::new(0.0, 0.0, 5.0), 0.5, body), Recorder::default()),
            None,
        );
        world.step(0.1);
        let entity = world.get(id).unwrap();
        assert_eq!(entity.pos, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(entity.velocity(), Vec3::new(50.0, 0.0, 3.0));
    }

    #[test]
    fn test_gravity_split_matches_closed_form() {
        let mut world = World::new(1);
        let id = world.spawn(
            Actor::new(
                body_at(Vec3::new(0.0, 0.0, 5.0), 0.5, PhysicsBody::new(Vec3::new(1.0, 0.0, 0.0))),
                Recorder::default(),
            ),
            None,
        );
        world.step(0.2);
        let entity = world.get(id).unwrap();
        // z = z0 + 0.5 * g * dt², vz = g * dt
        assert!((entity.pos.z - (5.0 - 0.2)).abs() < 1e-5);
        assert!((entity.pos.x - 0.2).abs() < 1e-6);
        assert!((entity.velocity().z + 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_dt_does_not_move() {
        let mut world = World::new(1);
        let start = Vec3::new(0.5, 0.5, 3.0);
        let id = world.spawn(
            Actor::new(
                body_at(start, 0.5, PhysicsBody::new(Vec3::new(2.0, -1.0, 0.5))),
                Recorder::default(),
            ),
            None,
        );
        world.step(0.0);
        let entity = world.get(id).unwrap();
        assert_eq!(entity.pos, start);
        assert_eq!(entity.velocity(), Vec3::new(2.0, -1.0, 0.5));
    }

    #[test]
    fn test_rest_on_flat_floor() {
        let mut world = World::new(1);
        world.set_height_field(6, 6, -3, -3, vec![0.5; 36]).unwrap();
        let id = world.spawn(
            Actor::new(
                body_at(Vec3::new(0.0, 0.0, 2.0), 0.25, PhysicsBody::default()),
                Recorder::default(),
            ),
            None,
        );
        for _ in 0..240 {
            world.step(DT);
        }
        let entity = world.get(id).unwrap();
        assert_eq!(entity.pos.z, 0.75);
        assert_eq!(entity.velocity().z, 0.0);
    }

    #[test]
    fn test_wall_blocks_x_only() {
        let mut world = bump_world();
        let hits = Rc::new(Cell::new(0));
        let recorder = Recorder {
            world_hits: hits.clone(),
            ..Default::default()
        };
        let id = world.spawn(
            Actor::new(
                body_at(
                    Vec3::new(-1.0, 0.5, 0.4),
                    0.4,
                    PhysicsBody::new(Vec3::new(2.0, 0.0, 0.0)),
                ),
                recorder,
            ),
            None,
        );
        for _ in 0..20 {
            world.step(0.05);
        }
        let entity = world.get(id).unwrap();
        assert!((entity.pos.x - (0.0 - 0.4)).abs() < 1e-5, "x = {}", entity.pos.x);
        assert_eq!(entity.pos.y, 0.5);
        assert!((entity.pos.z - 0.4).abs() < 1e-6);
        assert!(hits.get() > 0);
    }

    #[test]
    fn test_wall_blocks_negative_direction() {
        let mut world = bump_world();
        let id = world.spawn(
            Actor::new(
                body_at(
                    Vec3::new(2.0, 0.5, 0.4),
                    0.4,
                    PhysicsBody::new(Vec3::new(-2.0, 0.0, 0.0)),
                ),
                Recorder::default(),
            ),
            None,
        );
        for _ in 0..20 {
            world.step(0.05);
        }
        let x = world.get(id).unwrap().pos.x;
        assert!((x - 1.4).abs() < 1e-5, "x = {x}");
    }

    #[test]
    fn test_corner_does_not_lock_both_axes() {
        let mut world = bump_world();
        // Neither axis alone reaches the block; only the diagonal cell (0, 0) does
        let id = world.spawn(
            Actor::new(
                body_at(
                    Vec3::new(-0.32, -0.4, 0.3),
                    0.3,
                    PhysicsBody::new(Vec3::new(2.0, 4.0, 0.0)),
                ),
                Recorder::default(),
            ),
            None,
        );
        world.step(0.05);
        let entity = world.get(id).unwrap();
        // x crossed into the block's column earlier in the step, so y is blocked
        assert!((entity.pos.x - (-0.22)).abs() < 1e-5, "x = {}", entity.pos.x);
        assert!((entity.pos.y - (-0.3)).abs() < 1e-5, "y = {}", entity.pos.y);
    }

    #[test]
    fn test_low_ledge_is_climbed_by_stepper() {
        let mut world = World::new(1);
        // Column x = 1 is a 0.2 high ledge
        let mut heights = vec![0.0; 16];
        for gy in 0..4 {
            heights[1 + gy * 4] = 0.2;
        }
        world.set_height_field(4, 4, 0, 0, heights).unwrap();
        let mut body = PhysicsBody::new(Vec3::new(2.0, 0.0, 0.0)).stepping();
        body.floor_locked = true;
        let id = world.spawn(
            Actor::new(
                body_at(Vec3::new(0.5, 2.5, 0.2), 0.2, body),
                Recorder::default(),
            ),
            None,
        );
        for _ in 0..20 {
            world.step(0.025);
        }
        let entity = world.get(id).unwrap();
        assert!(entity.pos.x > 1.3, "x = {}", entity.pos.x);
        assert!((entity.pos.z - 0.4).abs() < 1e-4, "z = {}", entity.pos.z);
        assert!(entity.body.unwrap().floor_locked);
    }

    #[test]
    fn test_tall_ledge_blocks_stepper() {
        let mut world = World::new(1);
        let mut heights = vec![0.0; 16];
        for gy in 0..4 {
            heights[2 + gy * 4] = 0.6;
        }
        world.set_height_field(4, 4, 0, 0, heights).unwrap();
        let mut body = PhysicsBody::new(Vec3::new(2.0, 0.0, 0.0)).stepping();
        body.floor_locked = true;
        let id = world.spawn(
            Actor::new(body_at(Vec3::new(1.0, 2.5, 0.2), 0.2, body), Recorder::default()),
            None,
        );
        for _ in 0..20 {
            world.step(0.025);
        }
        let x = world.get(id).unwrap().pos.x;
        assert!((x - 1.8).abs() < 1e-5, "x = {x}");
    }

    #[test]
    fn test_stepper_falls_off_tall_drop() {
        let mut world = World::new(1);
        world.set_height_field(1, 1, 0, 0, vec![2.0]).unwrap();
        let mut body = PhysicsBody::new(Vec3::new(4.0, 0.0, 0.0)).stepping();
        body.floor_locked = true;
        let id = world.spawn(
            Actor::new(body_at(Vec3::new(0.5, 0.5, 2.2), 0.2, body), Recorder::default()),
            None,
        );
        for _ in 0..10 {
            world.step(0.05);
        }
        let entity = world.get(id).unwrap();
        assert!(entity.pos.x > 1.0);
        assert!(entity.pos.z < 2.2);
        assert!(!entity.body.unwrap().floor_locked);
    }

    #[test]
    fn test_footprint_floor_falls_back_to_highest() {
        let field = HeightField::new(2, 1, 0, 0, vec![3.0, 2.0]).unwrap();
        assert_eq!(footprint_floor(&field, Vec3::new(1.0, 0.5, 0.0), 0.3, 0.0), 3.0);
        assert_eq!(footprint_floor(&field, Vec3::new(1.0, 0.5, 0.0), 0.3, 2.5), 2.0);
    }

    #[test]
    fn test_entered_cells_order() {
        let all = i32::MIN..=i32::MAX;
        assert_eq!(entered_cells(0.0, 2.0, 0.25, &all), vec![1, 2]);
        assert_eq!(entered_cells(0.0, -2.0, 0.25, &all), vec![-2, -3]);
        assert!(entered_cells(0.5, 0.6, 0.25, &all).is_empty());
        assert!(entered_cells(0.5, 0.5, 0.25, &all).is_empty());
    }

    #[test]
    fn test_entered_cells_skip_open_ground_past_span() {
        // Only the nearest cell beyond the span is listed on each side
        assert_eq!(entered_cells(-10.0, 10.0, 0.25, &(-2..=2)), vec![-9, -2, -1, 0, 1, 2]);
        assert_eq!(entered_cells(10.0, -10.0, 0.25, &(-2..=2)), vec![8, 2, 1, 0, -1, -2]);
        assert_eq!(entered_cells(50.0, 60.0, 0.25, &(-2..=2)), vec![51]);
        assert_eq!(
            entered_cells(-3.0e9, f32::NEG_INFINITY, 0.4, &(-2..=2)),
            vec![i32::MIN]
        );
    }

    #[test]
    fn test_far_out_body_falls_on_open_ground() {
        let mut world = bump_world();
        let start = Vec3::new(-3.0e9, 0.5, 5.0);
        let id = world.spawn(
            Actor::new(
                body_at(start, 0.4, PhysicsBody::new(Vec3::new(-1.0, 0.0, 0.0))),
                Recorder::default(),
            ),
            None,
        );
        world.step(0.016);
        let entity = world.get(id).unwrap();
        assert!(entity.pos.is_finite());
        assert!(entity.pos.z < 5.0);
        assert_eq!(entity.pos.y, 0.5);

        // Resting on the open ground outside the level
        world.get_mut(id).unwrap().pos.z = 0.4;
        world.step(0.016);
        assert!((world.get(id).unwrap().pos.z - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_far_out_stepper_rides_open_ground() {
        let mut world = bump_world();
        let mut body = PhysicsBody::new(Vec3::new(1.0, 0.0, 0.0)).stepping();
        body.floor_locked = true;
        let id = world.spawn(
            Actor::new(body_at(Vec3::new(3.0e9, 3.0e9, 0.4), 0.4, body), Recorder::default()),
            None,
        );
        world.step(DT);
        let entity = world.get(id).unwrap();
        assert!(entity.body.unwrap().floor_locked);
        assert!((entity.pos.z - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_position_from_contact_is_reverted() {
        struct Launcher;
        impl Behavior for Launcher {
            fn update(&mut self, entity: &mut Entity, _p: Vec3, ctx: &mut StepContext<'_>) {
                entity.update_body(self, ctx, HitGroup::Monster.mask());
            }
            fn collide_entity(
                &mut self,
                entity: &mut Entity,
                _other: &Entity,
                _dir: Vec3,
                _ctx: &mut StepContext<'_>,
            ) {
                entity.pos.x = f32::NEG_INFINITY;
            }
        }
        let mut world = bump_world();
        world.spawn(
            Actor::inert(Entity::new(Vec3::new(0.0, 0.0, 5.0), 0.3)),
            Some(HitGroup::Monster),
        );
        let start = Vec3::new(0.1, 0.0, 5.0);
        let body = PhysicsBody::new(Vec3::X).with_gravity_scale(0.0);
        let id = world.spawn(Actor::new(body_at(start, 0.3, body), Launcher), None);
        world.step(DT);
        let entity = world.get(id).unwrap();
        assert_eq!(entity.pos, start);
        assert_eq!(entity.velocity(), Vec3::ZERO);
    }

    #[test]
    fn test_entity_contact_stops_on_death() {
        let mut world = World::new(1);
        for x in [0.2, -0.2] {
            world.spawn(
                Actor::inert(Entity::new(Vec3::new(x, 0.0, 5.0), 0.3)),
                Some(HitGroup::Monster),
            );
        }
        world.spawn(
            Actor::inert(Entity::new(Vec3::new(0.0, 0.2, 5.0), 0.3)),
            Some(HitGroup::Person),
        );
        let hits = Rc::new(Cell::new(0));
        let recorder = Recorder {
            mask: HitGroup::Monster | HitGroup::Person,
            entity_hits: hits.clone(),
            die_on_contact: true,
            ..Default::default()
        };
        let body = PhysicsBody::default().with_gravity_scale(0.0);
        world.spawn(
            Actor::new(body_at(Vec3::new(0.0, 0.0, 5.0), 0.3, body), recorder),
            Some(HitGroup::PlayerShot),
        );
        world.step(DT);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_non_finite_velocity_is_reverted() {
        struct Poison;
        impl Behavior for Poison {
            fn update(&mut self, entity: &mut Entity, _p: Vec3, ctx: &mut StepContext<'_>) {
                entity.update_body(self, ctx, GroupMask::NONE);
            }
            fn collide_world(&mut self, entity: &mut Entity, _n: Vec3, _ctx: &mut StepContext<'_>) {
                entity.set_velocity(Vec3::splat(f32::NAN));
            }
        }
        let mut world = World::new(1);
        let start = Vec3::new(0.0, 0.0, 0.5);
        let id = world.spawn(
            Actor::new(body_at(start, 0.5, PhysicsBody::default()), Poison),
            None,
        );
        world.step(DT);
        let entity = world.get(id).unwrap();
        assert_eq!(entity.pos, start);
        assert_eq!(entity.velocity(), Vec3::ZERO);
    }

    proptest::proptest! {
        #[test]
        fn prop_sleeping_body_unchanged(
            dt in 0.0f32..0.25,
            vx in -100.0f32..100.0,
            vz in -100.0f32..100.0,
        ) {
            let mut world = bump_world();
            let mut body = PhysicsBody::new(Vec3::new(vx, 0.0, vz));
            body.sleeping = true;
            let start = Vec3::new(-0.5, 0.5, 0.2);
            let id = world.spawn(Actor::new(body_at(start, 0.4, body), Recorder::default()), None);
            world.step(dt);
            let entity = world.get(id).unwrap();
            proptest::prop_assert_eq!(entity.pos, start);
            proptest::prop_assert_eq!(entity.velocity(), Vec3::new(vx, 0.0, vz));
        }

        #[test]
        fn prop_speed_capped_after_step(
            dt in 0.0f32..0.25,
            vx in -1000.0f32..1000.0,
            vy in -1000.0f32..1000.0,
            vz in -1000.0f32..1000.0,
            z in 0.0f32..4.0,
            stepping in proptest::bool::ANY,
        ) {
            let mut world = bump_world();
            let mut body = PhysicsBody::new(Vec3::new(vx, vy, vz));
            body.can_step = stepping;
            let id = world.spawn(
                Actor::new(body_at(Vec3::new(-2.0, 0.5, z), 0.4, body), Recorder::default()),
                None,
            );
            world.step(dt);
            let speed = world.get(id).unwrap().velocity().length();
            proptest::prop_assert!(speed <= MAX_VELOCITY + 1e-4, "speed {}", speed);
        }
    }
}
