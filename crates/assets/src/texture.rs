use crate::AssetError;
use std::path::{Path, PathBuf};

/// Texture slots recognized by the mesh loader, in the order they are
/// scanned per imported material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Emissive,
    Height,
    Normals,
    Shininess,
    Opacity,
}

impl TextureKind {
    pub const ALL: [TextureKind; 7] = [
        TextureKind::Diffuse,
        TextureKind::Specular,
        TextureKind::Emissive,
        TextureKind::Height,
        TextureKind::Normals,
        TextureKind::Shininess,
        TextureKind::Opacity,
    ];

    /// The name fragment used when composing sampler uniform names.
    pub fn uniform_fragment(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "diffuse",
            TextureKind::Specular => "specular",
            TextureKind::Emissive => "emissive",
            TextureKind::Height => "height",
            TextureKind::Normals => "normals",
            TextureKind::Shininess => "shininess",
            TextureKind::Opacity => "opacity",
        }
    }
}

/// A typed reference to a texture file, keyed by its resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRef {
    pub kind: TextureKind,
    pub path: PathBuf,
}

/// An RGBA8 image ready for GPU upload.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Decode a JPEG/PNG file into RGBA8.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let image = image::open(path.as_ref())?.into_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            pixels: image.into_raw(),
        })
    }

    /// A 1x1 mid-gray stand-in for textures that failed to decode.
    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![128, 128, 128, 255],
        }
    }

    /// Number of mip levels down to 1x1 for this image.
    pub fn mip_level_count(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Full mip chain, level 0 first, each level half the previous.
    ///
    /// wgpu has no mipmap generator, so the chain is produced on the CPU
    /// before upload.
    pub fn mip_chain(&self) -> Vec<DecodedImage> {
        let base = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .expect("pixel buffer matches dimensions");
        let mut levels = vec![self.clone()];
        let (mut w, mut h) = (self.width, self.height);
        while w > 1 || h > 1 {
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            let level = image::imageops::resize(&base, w, h, image::imageops::FilterType::Triangle);
            levels.push(DecodedImage {
                width: w,
                height: h,
                pixels: level.into_raw(),
            });
        }
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_order_is_the_documented_slot_scan_order() {
        assert_eq!(TextureKind::ALL[0], TextureKind::Diffuse);
        assert_eq!(TextureKind::ALL[6], TextureKind::Opacity);
        assert_eq!(TextureKind::Normals.uniform_fragment(), "normals");
    }

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let image = DecodedImage {
            width: 8,
            height: 4,
            pixels: vec![255; 8 * 4 * 4],
        };
        let chain = image.mip_chain();
        let dims: Vec<(u32, u32)> = chain.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(dims, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
        assert_eq!(image.mip_level_count(), 4);
    }

    #[test]
    fn decode_failure_surfaces_as_image_error() {
        assert!(matches!(
            DecodedImage::open("/nonexistent/texture.png"),
            Err(AssetError::Image(_) | AssetError::Io(_))
        ));
    }

    #[test]
    fn placeholder_is_one_pixel() {
        let p = DecodedImage::placeholder();
        assert_eq!((p.width, p.height), (1, 1));
        assert_eq!(p.pixels.len(), 4);
    }
}
