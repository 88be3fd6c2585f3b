//! wgpu render backend.
//!
//! # Invariants
//! - The renderer never mutates scene state; it reads a [`FrameState`] per
//!   frame.
//! - Shader compile/link failures are logged and degrade to skipped draws,
//!   never panics.
//! - GPU resources for meshes and textures are created lazily on first use,
//!   from the render thread only.

pub mod gpu;
pub mod mesh;
pub mod program;
pub mod shaders;
pub mod shadow;
pub mod skybox;
pub mod texture;

pub use gpu::{FrameState, SceneRenderer};
pub use mesh::{GpuMesh, GpuModel};
pub use program::{Program, ProgramSpec};
pub use shadow::ShadowCubemap;
pub use skybox::Skybox;
pub use texture::{TextureCache, TextureUploader, WgpuUploader};
