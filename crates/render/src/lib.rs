//! Backend-agnostic render plumbing.
//!
//! # Invariants
//! - Uniform name resolution goes through a per-program memo: exactly one
//!   layout query per distinct name for the lifetime of a stage (until the
//!   cache is explicitly reset by a re-link).
//! - A name the layout does not declare is memoized as absent and every
//!   setter for it is a silent no-op.
//! - Nothing in this crate touches a GPU; the wgpu backend builds on top and
//!   tests run without a device.

pub mod pacing;
pub mod uniforms;

pub use pacing::{FpsCounter, FrameBudget, FramePacer};
pub use uniforms::{BlockLayout, UniformLayout, UniformSlot, UniformStage};
