//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
pub mod colors {
    use crate::rgb;

    pub const SKY_TOP: [f32; 4] = rgb(0x0c1020, 1.0);
    pub const SKY_BOTTOM: [f32; 4] = rgb(0x101734, 1.0);
    pub const MENU_SKY_TOP: [f32; 4] = rgb(0x0b1020, 1.0);
    pub const MENU_SKY_BOTTOM: [f32; 4] = rgb(0x121a33, 1.0);
    pub const WAVE: [f32; 4] = rgb(0x4da1ff, 0.18);
    pub const STAR_LAYERS: [[f32; 4]; 3] = [
        rgb(0x95b8ff, 0.25),
        rgb(0xcfe1ff, 0.40),
        rgb(0xffffff, 0.55),
    ];

    pub const GROUND: [f32; 4] = rgb(0x223057, 1.0);
    pub const GROUND_BEVEL: [f32; 4] = rgb(0x2e3e70, 1.0);
    pub const SPIKE: [f32; 4] = rgb(0xa7baff, 1.0);

    pub const PLAYER: [f32; 4] = rgb(0x4da1ff, 1.0);
    pub const PLAYER_FACE: [f32; 4] = rgb(0x0d2440, 1.0);

    pub const PARTICLE_JUMP: [f32; 4] = rgb(0x87c6ff, 1.0);
    pub const PARTICLE_LAND: [f32; 4] = rgb(0x6fb6ff, 1.0);
    pub const PARTICLE_DEATH: [f32; 4] = rgb(0xff8ba7, 1.0);

    pub const BEAT_BAR: [f32; 4] = rgb(0x4da1ff, 0.85);
    pub const DEATH_DIM: [f32; 4] = rgb(0x0f1320, 0.7);
    pub const FADE: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
}
