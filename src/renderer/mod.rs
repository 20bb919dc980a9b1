//! Rendering
//!
//! The game hands one [`FrameSnapshot`] per display frame to a [`RenderSink`].
//! [`build_scene`] turns a snapshot into colored triangles in view space and
//! [`RenderState`] draws them with WebGPU.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::{RenderError, RenderState};
pub use scene::{SceneStyle, build_scene};
pub use vertex::Vertex;

use crate::game::FrameSnapshot;

/// Consumer of the per-frame snapshot
pub trait RenderSink {
    fn present(&mut self, snapshot: &FrameSnapshot<'_>);
}

impl<F> RenderSink for F
where
    F: FnMut(&FrameSnapshot<'_>),
{
    fn present(&mut self, snapshot: &FrameSnapshot<'_>) {
        self(snapshot)
    }
}
