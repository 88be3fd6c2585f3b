//! Asset loading for the viewer.
//!
//! All file access funnels through [`AssetDir`], a configured resource
//! directory. Model import and texture decode degrade on failure: a broken
//! asset is logged and yields an empty/placeholder result, never a panic in
//! the render path.

pub mod model;
pub mod texture;

use std::path::{Path, PathBuf};

pub use model::{CpuMesh, Model, Vertex};
pub use texture::{DecodedImage, TextureKind, TextureRef};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("model import error: {0}")]
    Import(String),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
}

/// Resolves relative asset names against a configured base directory.
#[derive(Debug, Clone)]
pub struct AssetDir {
    base: PathBuf,
}

impl AssetDir {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Absolute (or base-relative) path for an asset name.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.base.join(relative)
    }

    /// Read a text asset (shader source, preset file) by name.
    pub fn read_to_string(&self, relative: impl AsRef<Path>) -> Result<String, AssetError> {
        Ok(std::fs::read_to_string(self.resolve(relative))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn resolve_joins_base() {
        let dir = AssetDir::new("/tmp/assets");
        assert_eq!(
            dir.resolve("skybox/right.jpg"),
            PathBuf::from("/tmp/assets/skybox/right.jpg")
        );
    }

    #[test]
    fn read_to_string_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(tmp.path().join("shader.wgsl")).unwrap();
        write!(file, "// wgsl").unwrap();

        let dir = AssetDir::new(tmp.path());
        assert_eq!(dir.read_to_string("shader.wgsl").unwrap(), "// wgsl");
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = AssetDir::new("/tmp/assets");
        assert!(matches!(
            dir.read_to_string("nope.txt"),
            Err(AssetError::Io(_))
        ));
    }
}
