//! Sprite snapshot for the GPU side
//!
//! After a step the renderer reads the world and flattens every visible
//! sprite into a plain instance buffer. Nothing here mutates the simulation.

use bytemuck::{Pod, Zeroable};

use crate::sim::World;

/// One sprite instance, laid out for direct upload
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// World position: entity position plus sprite offset
    pub pos: [f32; 3],
    pub size: f32,
    /// Packed RGBA (`0xAABBGGRR`)
    pub color: u32,
    /// Sprite sheet index
    pub index: u32,
    /// Rotation in degrees
    pub rotate: f32,
}

/// Flatten every live entity's sprites, top-level order then children pre-order
pub fn collect_sprites(world: &World) -> Vec<SpriteInstance> {
    let mut out = Vec::new();
    for (_, root) in world.iter() {
        root.walk(&mut |entity| {
            out.extend(entity.sprites.iter().map(|s| SpriteInstance {
                pos: (entity.pos + s.offset).to_array(),
                size: s.size,
                color: s.color,
                index: s.index,
                rotate: s.rotate,
            }));
        });
    }
    out
}

/// Byte view of an instance buffer
pub fn as_bytes(instances: &[SpriteInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}
