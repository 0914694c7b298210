//! Cyber Arcade headless runner
//!
//! Builds a small level, populates it and steps the world for a fixed number of
//! frames, logging what happens. Pass a settings JSON path as the only argument.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::process::ExitCode;

    use cyber_arcade::Settings;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match std::env::args().nth(1) {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    log::info!("Cyber Arcade (headless) starting with {:?}", settings);

    match demo::run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on the web
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec3;
    use rand::Rng;

    use cyber_arcade::Settings;
    use cyber_arcade::renderer::collect_sprites;
    use cyber_arcade::sim::actors::WALKER_HALF_HEIGHT;
    use cyber_arcade::sim::{
        Actor, Entity, FrameClock, GroupMask, HitGroup, Projectile, Swarm, TerrainError, Walker,
        World,
    };

    /// Seconds between player shots
    const FIRE_INTERVAL: f32 = 0.5;

    pub fn run(settings: &Settings) -> Result<(), TerrainError> {
        let mut world = World::new(settings.seed);
        let cells = settings.level_cells();
        let heights: Vec<f32> = (0..cells * cells)
            .map(|_| world.rng().random_range(-0.25f32..0.0))
            .collect();
        world.set_height_field(cells, cells, 0, 0, heights)?;
        let size = cells as f32;

        let mid = size / 2.0;
        let player_pos = Vec3::new(mid, 0.5, 0.5);
        world.spawn(
            Actor::inert(Entity::new(player_pos, 0.5)),
            Some(HitGroup::Player),
        );
        let swarm_pos = Vec3::new(mid, size - 2.5, 1.5);
        let swarm = Swarm::actor(swarm_pos, settings.swarm_size, world.rng());
        let swarm = world.spawn(swarm, Some(HitGroup::Monster));
        for _ in 0..settings.walkers {
            let x = world.rng().random_range(0.5..size - 0.5);
            let y = world.rng().random_range(0.5..size - 0.5);
            let walker = Walker::actor(Vec3::new(x, y, WALKER_HALF_HEIGHT + 0.1), world.rng());
            world.spawn(walker, Some(HitGroup::Person));
        }

        let mut clock = FrameClock::new();
        let mut next_shot = 0.0;
        for frame in 0..settings.frames {
            let dt = clock.tick(f64::from(frame) * settings.frame_ms);

            if world.time() >= next_shot {
                if let Some(target) = world.get(swarm).map(|e| e.pos) {
                    let shot = Projectile::actor(
                        player_pos,
                        target - player_pos,
                        GroupMask::NONE,
                        world.time(),
                    );
                    world.spawn(shot, Some(HitGroup::PlayerShot));
                }
                next_shot = world.time() + FIRE_INTERVAL;
            }

            world.test_group_pair(HitGroup::Monster, HitGroup::PlayerShot);
            world.step(dt);

            if frame % 60 == 0 {
                log::debug!(
                    "t={:.2}s live={} monster shots={}",
                    world.time(),
                    world.len(),
                    world.scene().members(HitGroup::MonsterShot).count()
                );
            }
        }

        log::info!(
            "Simulated {:.2}s: {} entities, {} sprites, swarm {}",
            world.time(),
            world.len(),
            collect_sprites(&world).len(),
            if world.get(swarm).is_some() { "alive" } else { "destroyed" }
        );
        Ok(())
    }
}
