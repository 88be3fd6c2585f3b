//! Scene-side state for the viewer: camera, lights, and material presets.
//!
//! # Invariants
//! - The camera basis (forward/right/up) is re-orthonormalized on every
//!   orientation update; the view matrix is only refreshed by `Camera::update`.
//! - Light descriptors are plain mutable records; the render loop owns when
//!   they are synced (e.g. the flash light tracks the camera every frame).
//! - Material presets come from a JSON side file; a broken or missing file
//!   degrades to the built-in preset list, never a startup failure.

pub mod camera;
pub mod light;
pub mod material;

pub use camera::{Camera, MoveDirection};
pub use light::{FlashLight, PointLight, SpotLight};
pub use material::{MaterialError, MaterialLibrary, PbrMaterial};
