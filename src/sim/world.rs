//! The world stepper
//!
//! A [`World`] owns every live entity, the hit-group table, the active height
//! field and the seeded RNG for one game session. `step` runs the update sweep
//! and then prunes dead entities; nothing outside observes a half-stepped world.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use slotmap::SlotMap;

use super::entity::{Actor, Behavior, Entity, EntityId, collide_against};
use super::groups::{GroupMask, HitGroup, HitGroups};
use super::terrain::{HeightField, TerrainError};
use super::trace::trace_sphere;
use crate::consts::MAX_FRAME_DT;

/// Entity storage shared read-only with hooks during a step
///
/// The actor being updated is checked out of its slot for the duration of its
/// update, so it never sees itself here.
#[derive(Debug, Default)]
pub struct Scene {
    actors: SlotMap<EntityId, Option<Actor>>,
    groups: HitGroups,
}

impl Scene {
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.actors
            .get(id)
            .and_then(Option::as_ref)
            .map(|a| &a.entity)
    }

    /// Live members of a hit-group that are not currently checked out
    pub fn members(&self, group: HitGroup) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.groups
            .members(group)
            .iter()
            .filter_map(|&id| Some((id, self.entity(id)?)))
            .filter(|(_, e)| !e.dead)
    }

    fn check_out(&mut self, id: EntityId) -> Option<Actor> {
        self.actors.get_mut(id).and_then(Option::take)
    }

    fn check_in(&mut self, id: EntityId, actor: Actor) {
        if let Some(slot) = self.actors.get_mut(id) {
            *slot = Some(actor);
        }
    }

    fn is_gone(&self, id: EntityId) -> bool {
        self.actors
            .get(id)
            .and_then(Option::as_ref)
            .is_none_or(|a| a.entity.dead)
    }
}

/// Entities spawned by hooks, appended to the live list after the current actor
#[derive(Debug, Default)]
pub struct Spawner {
    pending: Vec<(Actor, Option<HitGroup>)>,
}

/// What hooks can see and do during a step
pub struct StepContext<'a> {
    /// Seconds covered by this step
    pub dt: f32,
    /// Level time at the end of this step
    pub time: f32,
    pub terrain: &'a HeightField,
    scene: &'a Scene,
    spawner: &'a mut Spawner,
    rng: &'a mut Pcg32,
}

impl<'a> StepContext<'a> {
    /// Queue a new top-level entity; it is updated later in this same sweep
    pub fn spawn(&mut self, actor: Actor, group: Option<HitGroup>) {
        self.spawner.pending.push((actor, group));
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut *self.rng
    }

    /// Test `entity` against every live member of the groups in `mask`
    ///
    /// Stops scanning as soon as `entity` is marked dead.
    pub fn collide_groups<B: Behavior + ?Sized>(
        &mut self,
        entity: &mut Entity,
        hooks: &mut B,
        mask: GroupMask,
    ) {
        let scene = self.scene;
        for group in mask.iter() {
            for (_, other) in scene.members(group) {
                collide_against(entity, hooks, other, self);
                if entity.dead {
                    return;
                }
            }
        }
    }
}

/// One simulation session
pub struct World {
    scene: Scene,
    /// Top-level update order; grows at the end, shrinks by swap-remove
    live: Vec<EntityId>,
    terrain: HeightField,
    spawner: Spawner,
    rng: Pcg32,
    time: f32,
    last_dt: f32,
}

impl World {
    pub fn new(seed: u64) -> Self {
        log::info!("World created with seed: {}", seed);
        Self {
            scene: Scene::default(),
            live: Vec::new(),
            terrain: HeightField::empty(),
            spawner: Spawner::default(),
            rng: Pcg32::seed_from_u64(seed),
            time: 0.0,
            last_dt: 0.0,
        }
    }

    /// Install the terrain for a newly activated level
    ///
    /// On error the previous height field stays in place.
    pub fn set_height_field(
        &mut self,
        size_x: usize,
        size_y: usize,
        origin_x: i32,
        origin_y: i32,
        heights: Vec<f32>,
    ) -> Result<(), TerrainError> {
        let field = HeightField::new(size_x, size_y, origin_x, origin_y, heights).inspect_err(
            |e| log::warn!("Rejected height field: {}", e),
        )?;
        self.set_terrain(field);
        Ok(())
    }

    pub fn set_terrain(&mut self, field: HeightField) {
        log::info!(
            "Height field active: {:?} cells at origin {:?}",
            field.size(),
            field.origin()
        );
        self.terrain = field;
    }

    pub fn terrain(&self) -> &HeightField {
        &self.terrain
    }

    /// Drop every entity and restart level time, keeping the terrain
    pub fn clear(&mut self) {
        self.scene.actors.clear();
        self.scene.groups.clear();
        self.live.clear();
        self.spawner.pending.clear();
        self.time = 0.0;
    }

    /// Add a top-level entity, optionally registering it in a hit-group
    pub fn spawn(&mut self, mut actor: Actor, group: Option<HitGroup>) -> EntityId {
        actor.entity.hit_group = group;
        let id = self.scene.actors.insert(Some(actor));
        self.live.push(id);
        if let Some(group) = group {
            self.scene.groups.insert(group, id);
        }
        log::trace!("Spawned {:?} in {:?}", id, group);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.scene.entity(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.scene
            .actors
            .get_mut(id)
            .and_then(Option::as_mut)
            .map(|a| &mut a.entity)
    }

    pub fn mark_dead(&mut self, id: EntityId) {
        if let Some(entity) = self.get_mut(id) {
            entity.mark_dead();
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Number of top-level entities, dead ones included until the next prune
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Level time in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Session RNG, for building entities outside a step
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Top-level entities in update order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.live
            .iter()
            .filter_map(|&id| Some((id, self.scene.entity(id)?)))
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// Updates every live entity and its children pre-order, walking the live
    /// list by index so entities spawned mid-sweep are updated in this same
    /// sweep, then prunes.
    pub fn step(&mut self, dt: f32) {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.time += dt;
        self.last_dt = dt;

        let mut i = 0;
        while i < self.live.len() {
            let id = self.live[i];
            i += 1;
            let Some(mut actor) = self.scene.check_out(id) else {
                continue;
            };
            {
                let mut ctx = StepContext {
                    dt,
                    time: self.time,
                    terrain: &self.terrain,
                    scene: &self.scene,
                    spawner: &mut self.spawner,
                    rng: &mut self.rng,
                };
                actor.update(Vec3::ZERO, &mut ctx);
            }
            self.scene.check_in(id, actor);
            self.flush_spawns();
        }

        let removed = self.prune();
        if removed > 0 {
            log::debug!("Pruned {} entities, {} live", removed, self.live.len());
        }
    }

    /// Run entity contacts from every member of `group_a` against `group_b`
    ///
    /// Hooks fire on the group A side only. A group A entity stops scanning
    /// once it dies.
    pub fn test_group_pair(&mut self, group_a: HitGroup, group_b: HitGroup) {
        let members = self.scene.groups.members(group_a).to_vec();
        for id in members {
            let Some(mut actor) = self.scene.check_out(id) else {
                continue;
            };
            if !actor.entity.dead {
                let mut ctx = StepContext {
                    dt: self.last_dt,
                    time: self.time,
                    terrain: &self.terrain,
                    scene: &self.scene,
                    spawner: &mut self.spawner,
                    rng: &mut self.rng,
                };
                let (entity, hooks) = actor.hooks();
                ctx.collide_groups(entity, hooks, group_b.mask());
            }
            self.scene.check_in(id, actor);
        }
        self.flush_spawns();
    }

    /// Remove dead entities from the live list, every children list and every
    /// hit-group list
    ///
    /// Each list is compacted with swap-with-last removal: O(1) per removal,
    /// survivors keep no particular order. Returns the number removed from the
    /// live list and children lists.
    pub fn prune(&mut self) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.live.len() {
            let id = self.live[i];
            if self.scene.is_gone(id) {
                self.live.swap_remove(i);
                self.scene.actors.remove(id);
                removed += 1;
            } else {
                i += 1;
            }
        }

        for actor in self.scene.actors.values_mut().flatten() {
            removed += actor.entity.prune_children();
        }

        let Scene { actors, groups } = &mut self.scene;
        groups.prune(|id| {
            actors
                .get(id)
                .and_then(Option::as_ref)
                .is_none_or(|a| a.entity.dead)
        });
        removed
    }

    /// Nearest live member of `mask` hit by a ray, with its distance
    pub fn trace(
        &self,
        origin: Vec3,
        direction: Vec3,
        length: f32,
        mask: GroupMask,
    ) -> Option<(EntityId, f32)> {
        mask.iter()
            .flat_map(|group| self.scene.members(group))
            .filter_map(|(id, e)| {
                trace_sphere(origin, direction, length, e.pos, e.radius * e.radius)
                    .map(|d| (id, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn flush_spawns(&mut self) {
        for (actor, group) in std::mem::take(&mut self.spawner.pending) {
            self.spawn(actor, group);
        }
    }
}
