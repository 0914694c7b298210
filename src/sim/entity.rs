//! Entities, their owned children, and the gameplay hook trait
//!
//! An [`Actor`] pairs the plain entity data the core reads and writes with a
//! boxed [`Behavior`] that supplies the per-kind hooks. Children are actors
//! owned by their parent and are updated right after it, recursively.

use std::fmt;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use super::body::PhysicsBody;
use super::groups::HitGroup;
use super::world::StepContext;

new_key_type! {
    /// Generational handle of a top-level entity in a [`super::World`]
    pub struct EntityId;
}

/// Visual attachment carried through to the renderer untouched
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    /// Sprite sheet index
    pub index: u32,
    pub size: f32,
    /// Packed RGBA, see [`pack_color`]
    pub color: u32,
    /// Rotation in degrees
    pub rotate: f32,
    /// Offset from the owning entity's position
    pub offset: Vec3,
}

impl Sprite {
    pub fn new(index: u32, size: f32) -> Self {
        Self {
            index,
            size,
            color: u32::MAX,
            rotate: 0.0,
            offset: Vec3::ZERO,
        }
    }
}

/// Pack normalized RGBA channels into `0xAABBGGRR`
pub fn pack_color(r: f32, g: f32, b: f32, a: f32) -> u32 {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
    channel(r) | channel(g) << 8 | channel(b) << 16 | channel(a) << 24
}

/// Plain entity state
#[derive(Debug)]
pub struct Entity {
    pub pos: Vec3,
    /// Bounding radius; also the vertical half-extent unless `half_height` is set
    pub radius: f32,
    pub half_height: Option<f32>,
    /// Once set the entity is never updated again and goes at the next prune
    pub dead: bool,
    pub sprites: Vec<Sprite>,
    pub children: Vec<Actor>,
    pub body: Option<PhysicsBody>,
    /// Group this entity was spawned into; always `None` for children
    pub hit_group: Option<HitGroup>,
}

impl Entity {
    pub fn new(pos: Vec3, radius: f32) -> Self {
        debug_assert!(radius > 0.0, "entity radius must be positive");
        Self {
            pos,
            radius,
            half_height: None,
            dead: false,
            sprites: Vec::new(),
            children: Vec::new(),
            body: None,
            hit_group: None,
        }
    }

    pub fn with_body(mut self, body: PhysicsBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_sprite(mut self, sprite: Sprite) -> Self {
        self.sprites.push(sprite);
        self
    }

    pub fn with_half_height(mut self, half_height: f32) -> Self {
        self.half_height = Some(half_height);
        self
    }

    pub fn with_child(mut self, child: Actor) -> Self {
        self.children.push(child);
        self
    }

    #[inline]
    pub fn half_height(&self) -> f32 {
        self.half_height.unwrap_or(self.radius)
    }

    /// Height of the bottom of the bounding box
    #[inline]
    pub fn feet(&self) -> f32 {
        self.pos.z - self.half_height()
    }

    pub fn mark_dead(&mut self) {
        self.dead = true;
    }

    pub fn is_composite(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn velocity(&self) -> Vec3 {
        self.body.map_or(Vec3::ZERO, |b| b.vel)
    }

    pub fn set_velocity(&mut self, vel: Vec3) {
        if let Some(body) = self.body.as_mut() {
            body.vel = vel;
        }
    }

    /// Overlap test against another entity
    ///
    /// Rejects on the 3-axis bounding box first, then requires the planar
    /// distance to be under the sum of radii. Returns the planar direction
    /// pointing from `other` toward `self`.
    pub fn contact(&self, other: &Entity) -> Option<Vec3> {
        let delta = self.pos - other.pos;
        let reach = self.radius + other.radius;
        if delta.x.abs() >= reach
            || delta.y.abs() >= reach
            || delta.z.abs() >= self.half_height() + other.half_height()
        {
            return None;
        }
        let planar = Vec2::new(delta.x, delta.y);
        if planar.length_squared() >= reach * reach {
            return None;
        }
        Some(planar.try_normalize().map_or(Vec3::X, |n| n.extend(0.0)))
    }

    /// Visit this entity and its live descendants, parent first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Entity)) {
        if self.dead {
            return;
        }
        visit(self);
        for child in &self.children {
            child.entity.walk(visit);
        }
    }

    /// Remove dead children at every depth
    ///
    /// Uses swap-with-last removal, so surviving children do not keep their
    /// relative order. Returns the number of direct and nested removals.
    pub fn prune_children(&mut self) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.children.len() {
            if self.children[i].entity.dead {
                self.children.swap_remove(i);
                removed += 1;
            } else {
                removed += self.children[i].entity.prune_children();
                i += 1;
            }
        }
        removed
    }
}

/// Per-kind gameplay hooks, all no-ops by default
///
/// Hooks run synchronously inside a step. They may mutate their own entity and
/// spawn through the context but never remove anything from the world directly.
pub trait Behavior {
    /// Called at most once per step, before the entity's children
    fn update(&mut self, entity: &mut Entity, parent_pos: Vec3, ctx: &mut StepContext<'_>) {
        let _ = (entity, parent_pos, ctx);
    }

    /// Terrain contact; `normal` points out of the surface
    fn collide_world(&mut self, entity: &mut Entity, normal: Vec3, ctx: &mut StepContext<'_>) {
        let _ = (entity, normal, ctx);
    }

    /// Overlap with another entity; `dir` points from `other` toward `entity`
    fn collide_entity(
        &mut self,
        entity: &mut Entity,
        other: &Entity,
        dir: Vec3,
        ctx: &mut StepContext<'_>,
    ) {
        let _ = (entity, other, dir, ctx);
    }

    fn damage(&mut self, entity: &mut Entity, ctx: &mut StepContext<'_>) {
        let _ = (entity, ctx);
    }
}

/// Behavior with every hook left at its default
#[derive(Debug, Clone, Copy, Default)]
pub struct Inert;

impl Behavior for Inert {}

/// An entity together with its hooks
pub struct Actor {
    pub entity: Entity,
    pub(crate) behavior: Box<dyn Behavior>,
}

impl Actor {
    pub fn new(entity: Entity, behavior: impl Behavior + 'static) -> Self {
        Self {
            entity,
            behavior: Box::new(behavior),
        }
    }

    /// An actor with no custom hooks
    pub fn inert(entity: Entity) -> Self {
        Self::new(entity, Inert)
    }

    /// Run this actor's update, then its children's, pre-order
    ///
    /// Children appended during this update are first visited next step.
    pub fn update(&mut self, parent_pos: Vec3, ctx: &mut StepContext<'_>) {
        if self.entity.dead {
            return;
        }
        let existing = self.entity.children.len();
        self.behavior.update(&mut self.entity, parent_pos, ctx);
        let pos = self.entity.pos;
        for child in self.entity.children.iter_mut().take(existing) {
            child.update(pos, ctx);
        }
    }

    pub fn damage(&mut self, ctx: &mut StepContext<'_>) {
        self.behavior.damage(&mut self.entity, ctx);
    }

    pub(crate) fn hooks(&mut self) -> (&mut Entity, &mut dyn Behavior) {
        (&mut self.entity, self.behavior.as_mut())
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("entity", &self.entity)
            .finish_non_exhaustive()
    }
}

/// Test `entity` against `other`, descending into `other`'s children
///
/// Composite targets only gate the descent; hooks fire against leaf
/// entities. Stops as soon as `entity` dies.
pub(crate) fn collide_against<B: Behavior + ?Sized>(
    entity: &mut Entity,
    hooks: &mut B,
    other: &Entity,
    ctx: &mut StepContext<'_>,
) {
    if other.dead || entity.dead {
        return;
    }
    let Some(dir) = entity.contact(other) else {
        return;
    };
    if !other.is_composite() {
        hooks.collide_entity(entity, other, dir, ctx);
        return;
    }
    for child in &other.children {
        collide_against(entity, hooks, &child.entity, ctx);
        if entity.dead {
            return;
        }
    }
}
