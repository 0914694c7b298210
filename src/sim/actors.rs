//! Gameplay entity kinds built on the core hooks
//!
//! - `Chaff`: bouncing debris left behind when something is destroyed
//! - `Projectile`: straight-line shot that dies on any contact
//! - `Swarm`: composite monster (one brain, orbiting faces) that shoots at the player
//! - `Walker`: a stepping pedestrian

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use rand::Rng;

use super::body::PhysicsBody;
use super::entity::{Actor, Behavior, Entity, Sprite, pack_color};
use super::groups::{GroupMask, HitGroup};
use super::world::StepContext;

/// Sprite sheet indices
pub mod sprites {
    pub const SHOT: u32 = 0;
    pub const PERSON: u32 = 8;
    pub const BRAIN: u32 = 16;
    pub const FACE: u32 = 17;
    pub const FACE_VARIANTS: u32 = 6;
}

/// Seconds before debris disappears
pub const CHAFF_LIFETIME: f32 = 5.0;
/// Floor bounces before debris comes to rest
pub const CHAFF_BOUNCES: u32 = 2;

pub const SHOT_SPEED: f32 = 4.0;
pub const SHOT_RADIUS: f32 = 0.1;
pub const SHOT_LIFETIME: f32 = 4.0;

pub const SWARM_RADIUS: f32 = 0.9;
/// Delay between the brain dying and the first child being shed
pub const SWARM_DEATH_DELAY: f32 = 0.5;
/// Delay between consecutive children being shed
pub const SWARM_SHED_INTERVAL: f32 = 0.05;
pub const SWARM_FIRE_INTERVAL: f32 = 1.0;

pub const WALKER_RADIUS: f32 = 0.2;
pub const WALKER_HALF_HEIGHT: f32 = 0.5;
pub const WALKER_SPEED: f32 = 1.0;

#[inline]
fn reflect(v: Vec3, normal: Vec3) -> Vec3 {
    v - 2.0 * v.dot(normal) * normal
}

/// Bouncing debris
#[derive(Debug, Clone)]
pub struct Chaff {
    expiry: f32,
    /// Sprite spin, degrees per second
    spin: f32,
    bounces: u32,
}

impl Chaff {
    /// Debris with the shape and first sprite of `src`
    pub fn actor(src: &Entity, vel: Vec3, time: f32, rng: &mut impl Rng) -> Actor {
        let mut entity = Entity::new(src.pos, src.radius).with_body(PhysicsBody::new(vel));
        if let Some(sprite) = src.sprites.first() {
            entity.sprites.push(*sprite);
        }
        Actor::new(
            entity,
            Chaff {
                expiry: time + CHAFF_LIFETIME,
                spin: rng.random_range(-500.0..500.0),
                bounces: 0,
            },
        )
    }
}

impl Behavior for Chaff {
    fn update(&mut self, entity: &mut Entity, _parent_pos: Vec3, ctx: &mut StepContext<'_>) {
        if ctx.time > self.expiry {
            entity.mark_dead();
            return;
        }
        let frac = (self.expiry - ctx.time) / CHAFF_LIFETIME;
        let sleeping = entity.body.is_some_and(|b| b.sleeping);
        if let Some(sprite) = entity.sprites.first_mut() {
            sprite.color = pack_color(frac * 3.0, frac, frac, frac * 4.0 - 3.0);
            sprite.size = entity.radius * (frac * 5.0).min(1.0);
            if !sleeping {
                sprite.rotate = (sprite.rotate + self.spin * ctx.dt) % 360.0;
            }
        }
        entity.update_body(self, ctx, GroupMask::NONE);
    }

    fn collide_world(&mut self, entity: &mut Entity, normal: Vec3, _ctx: &mut StepContext<'_>) {
        let Some(body) = entity.body.as_mut() else {
            return;
        };
        if normal.z > 0.5 {
            self.bounces += 1;
            if self.bounces > CHAFF_BOUNCES {
                body.sleeping = true;
                body.vel = Vec3::ZERO;
                return;
            }
        }
        body.vel = reflect(body.vel, normal) * 0.5;
        self.spin *= -0.5;
    }
}

/// Straight-line shot
#[derive(Debug, Clone)]
pub struct Projectile {
    mask: GroupMask,
    expiry: f32,
}

impl Projectile {
    /// A shot from `origin` along `direction` that dies on touching `mask`
    pub fn actor(origin: Vec3, direction: Vec3, mask: GroupMask, time: f32) -> Actor {
        let body = PhysicsBody::new(direction.normalize_or_zero() * SHOT_SPEED).with_gravity_scale(0.0);
        let entity = Entity::new(origin, SHOT_RADIUS)
            .with_body(body)
            .with_sprite(Sprite::new(sprites::SHOT, 0.2));
        Actor::new(
            entity,
            Projectile {
                mask,
                expiry: time + SHOT_LIFETIME,
            },
        )
    }
}

impl Behavior for Projectile {
    fn update(&mut self, entity: &mut Entity, _parent_pos: Vec3, ctx: &mut StepContext<'_>) {
        if ctx.time > self.expiry {
            entity.mark_dead();
            return;
        }
        let mask = self.mask;
        entity.update_body(self, ctx, mask);
    }

    fn collide_world(&mut self, entity: &mut Entity, _normal: Vec3, _ctx: &mut StepContext<'_>) {
        entity.mark_dead();
    }

    fn collide_entity(
        &mut self,
        entity: &mut Entity,
        _other: &Entity,
        _dir: Vec3,
        _ctx: &mut StepContext<'_>,
    ) {
        entity.mark_dead();
    }
}

/// Composite monster
///
/// Children are the brain followed by the faces. Killing the brain makes the
/// swarm shed the rest one by one, then die.
#[derive(Debug, Clone)]
pub struct Swarm {
    count: usize,
    next_shot: f32,
    shed_at: Option<f32>,
    /// Fraction of children still attached, drives the swarm light
    pub glow: f32,
}

impl Swarm {
    pub fn actor(pos: Vec3, faces: usize, rng: &mut impl Rng) -> Actor {
        let mut entity = Entity::new(pos, SWARM_RADIUS).with_child(Brain::actor());
        for i in 0..faces {
            let dist = 0.5 + 0.2 * i as f32 / faces as f32;
            entity.children.push(Face::actor(dist, rng));
        }
        Actor::new(
            entity,
            Swarm {
                count: faces + 1,
                next_shot: 0.0,
                shed_at: None,
                glow: 1.0,
            },
        )
    }

    pub fn is_dying(&self) -> bool {
        self.shed_at.is_some()
    }
}

impl Behavior for Swarm {
    fn update(&mut self, entity: &mut Entity, _parent_pos: Vec3, ctx: &mut StepContext<'_>) {
        self.glow = entity.children.len() as f32 / self.count as f32;

        if let Some(mut shed_at) = self.shed_at {
            while ctx.time > shed_at {
                let Some(mut child) = entity.children.pop() else {
                    entity.mark_dead();
                    break;
                };
                child.damage(ctx);
                shed_at += SWARM_SHED_INTERVAL;
            }
            self.shed_at = Some(shed_at);
            return;
        }

        if self.next_shot < ctx.time {
            let target = ctx
                .scene()
                .members(HitGroup::Player)
                .next()
                .map(|(_, e)| e.pos);
            if let Some(target) = target {
                let shot = Projectile::actor(
                    entity.pos,
                    target - entity.pos,
                    HitGroup::Player.mask(),
                    ctx.time,
                );
                ctx.spawn(shot, Some(HitGroup::MonsterShot));
            }
            self.next_shot = ctx.time + SWARM_FIRE_INTERVAL;
        }
    }

    /// A player shot reached the swarm: damage the first child it touches
    fn collide_entity(
        &mut self,
        entity: &mut Entity,
        other: &Entity,
        _dir: Vec3,
        ctx: &mut StepContext<'_>,
    ) {
        if self.is_dying() {
            return;
        }
        let Some(child) = entity
            .children
            .iter_mut()
            .find(|c| !c.entity.dead && c.entity.contact(other).is_some())
        else {
            return;
        };
        let brain = child
            .entity
            .sprites
            .first()
            .is_some_and(|s| s.index == sprites::BRAIN);
        child.damage(ctx);
        if brain {
            log::debug!("Swarm brain destroyed at {:?}", entity.pos);
            self.shed_at = Some(ctx.time + SWARM_DEATH_DELAY);
        }
    }
}

/// Swarm core, sits at the swarm centre
#[derive(Debug, Clone, Copy)]
pub struct Brain;

impl Brain {
    pub fn actor() -> Actor {
        let entity = Entity::new(Vec3::ZERO, 0.3).with_sprite(Sprite::new(sprites::BRAIN, 0.3));
        Actor::new(entity, Brain)
    }
}

impl Behavior for Brain {
    fn update(&mut self, entity: &mut Entity, parent_pos: Vec3, _ctx: &mut StepContext<'_>) {
        entity.pos = parent_pos;
    }

    fn damage(&mut self, entity: &mut Entity, ctx: &mut StepContext<'_>) {
        entity.mark_dead();
        let chaff = Chaff::actor(entity, Vec3::ZERO, ctx.time, ctx.rng());
        ctx.spawn(chaff, None);
    }
}

/// Face orbiting the swarm centre on a great circle
#[derive(Debug, Clone)]
pub struct Face {
    u: Vec3,
    v: Vec3,
    phase: f32,
    dist: f32,
}

impl Face {
    pub fn actor(dist: f32, rng: &mut impl Rng) -> Actor {
        let theta = PI * rng.random_range(-1.0f32..1.0);
        let phi = rng.random_range(-1.0f32..1.0).asin();
        let face = Face {
            u: Vec3::new(theta.cos() * phi.cos(), theta.sin() * phi.cos(), phi.sin()),
            v: Vec3::new(-theta.sin(), theta.cos(), 0.0),
            phase: PI * rng.random_range(-1.0f32..1.0),
            dist,
        };
        let index = sprites::FACE + rng.random_range(0..sprites::FACE_VARIANTS);
        let entity = Entity::new(Vec3::ZERO, 0.2).with_sprite(Sprite::new(index, 0.2));
        Actor::new(entity, face)
    }

    fn offset(&self) -> Vec3 {
        (self.u * self.phase.cos() + self.v * self.phase.sin()) * self.dist
    }
}

impl Behavior for Face {
    fn update(&mut self, entity: &mut Entity, parent_pos: Vec3, ctx: &mut StepContext<'_>) {
        self.phase = (self.phase + ctx.dt * 2.0) % TAU;
        entity.pos = parent_pos + self.offset();
    }

    fn damage(&mut self, entity: &mut Entity, ctx: &mut StepContext<'_>) {
        entity.mark_dead();
        // Fly off along the orbit tangent
        let vel = (self.v * self.phase.cos() - self.u * self.phase.sin()) * self.dist * 2.0;
        let chaff = Chaff::actor(entity, vel, ctx.time, ctx.rng());
        ctx.spawn(chaff, None);
    }
}

/// Pedestrian that walks a straight line and turns away from obstacles
#[derive(Debug, Clone)]
pub struct Walker {
    heading: f32,
    stride: f32,
    phase: f32,
}

impl Walker {
    pub fn actor(pos: Vec3, rng: &mut impl Rng) -> Actor {
        let entity = Entity::new(pos, WALKER_RADIUS)
            .with_half_height(WALKER_HALF_HEIGHT)
            .with_body(PhysicsBody::default().stepping())
            .with_sprite(Sprite::new(sprites::PERSON, 0.2));
        Actor::new(
            entity,
            Walker {
                heading: rng.random_range(0.0..TAU),
                stride: 2f32.powf(rng.random_range(-0.2..0.2)),
                phase: 0.0,
            },
        )
    }

    fn turn_to(&mut self, dir: Vec2) {
        if dir.length_squared() > 1e-8 {
            self.heading = dir.y.atan2(dir.x);
        }
    }
}

impl Behavior for Walker {
    fn update(&mut self, entity: &mut Entity, _parent_pos: Vec3, ctx: &mut StepContext<'_>) {
        if let Some(body) = entity.body.as_mut() {
            let walk = Vec2::from_angle(self.heading) * WALKER_SPEED;
            body.vel.x = walk.x;
            body.vel.y = walk.y;
        }
        entity.update_body(self, ctx, HitGroup::Person.mask());

        self.phase = (self.phase + ctx.dt * 4.0 * self.stride) % TAU;
        if let Some(head) = entity.sprites.first_mut() {
            head.offset.z = 0.2 + self.phase.sin().abs() * 0.05;
        }
    }

    fn collide_world(&mut self, _entity: &mut Entity, normal: Vec3, _ctx: &mut StepContext<'_>) {
        if normal.z.abs() < 0.5 {
            let heading = Vec2::from_angle(self.heading);
            let n = normal.truncate();
            self.turn_to(heading - 2.0 * heading.dot(n) * n);
        }
    }

    fn collide_entity(
        &mut self,
        _entity: &mut Entity,
        _other: &Entity,
        dir: Vec3,
        _ctx: &mut StepContext<'_>,
    ) {
        self.turn_to(dir.truncate());
    }
}
