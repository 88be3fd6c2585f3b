use lumen_assets::DecodedImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Destination for decoded images. The production implementation uploads to
/// wgpu; tests count uploads to pin the de-duplication contract.
pub trait TextureUploader {
    type Handle: Clone;

    fn upload(&mut self, image: &DecodedImage, label: &str) -> Self::Handle;
}

/// Path-keyed upload cache: one decode and one GPU upload per distinct
/// texture file, shared across all meshes of a model.
pub struct TextureCache<H> {
    loaded: HashMap<PathBuf, H>,
}

impl<H: Clone> TextureCache<H> {
    pub fn new() -> Self {
        Self {
            loaded: HashMap::new(),
        }
    }

    /// Fetch the handle for a texture file, decoding and uploading only on
    /// the first request for that path. Decode failures are logged and
    /// yield an uploaded 1x1 placeholder so draws stay valid.
    pub fn get_or_upload<U>(&mut self, uploader: &mut U, path: &Path) -> H
    where
        U: TextureUploader<Handle = H>,
    {
        if let Some(handle) = self.loaded.get(path) {
            return handle.clone();
        }
        let image = DecodedImage::open(path).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), "texture decode failed: {err}");
            DecodedImage::placeholder()
        });
        let handle = uploader.upload(&image, &path.display().to_string());
        self.loaded.insert(path.to_path_buf(), handle.clone());
        handle
    }

    /// Number of distinct textures uploaded so far.
    pub fn uploaded_count(&self) -> usize {
        self.loaded.len()
    }
}

impl<H: Clone> Default for TextureCache<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Uploads RGBA8 images with a full CPU-generated mip chain, repeat
/// addressing and linear-mipmap filtering.
pub struct WgpuUploader<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
}

impl TextureUploader for WgpuUploader<'_> {
    type Handle = wgpu::TextureView;

    fn upload(&mut self, image: &DecodedImage, label: &str) -> wgpu::TextureView {
        let mip_level_count = image.mip_level_count();
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, mip) in image.mip_chain().iter().enumerate() {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &mip.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * mip.width),
                    rows_per_image: Some(mip.height),
                },
                wgpu::Extent3d {
                    width: mip.width,
                    height: mip.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

/// Sampler matching the classic loader settings: wrap = repeat,
/// min = linear-mipmap-linear, mag = linear.
pub fn material_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("material_sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct CountingUploader {
        uploads: usize,
    }

    impl TextureUploader for CountingUploader {
        type Handle = usize;

        fn upload(&mut self, _image: &DecodedImage, _label: &str) -> usize {
            self.uploads += 1;
            self.uploads
        }
    }

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let image = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn same_path_uploads_once_and_shares_the_handle() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_png(tmp.path(), "ball.png");

        let mut cache = TextureCache::new();
        let mut uploader = CountingUploader { uploads: 0 };
        let first = cache.get_or_upload(&mut uploader, &path);
        let second = cache.get_or_upload(&mut uploader, &path);

        assert_eq!(uploader.uploads, 1);
        assert_eq!(first, second);
        assert_eq!(cache.uploaded_count(), 1);
    }

    #[test]
    fn distinct_paths_upload_separately() {
        let tmp = tempfile::tempdir().unwrap();
        let a = write_png(tmp.path(), "a.png");
        let b = write_png(tmp.path(), "b.png");

        let mut cache = TextureCache::new();
        let mut uploader = CountingUploader { uploads: 0 };
        cache.get_or_upload(&mut uploader, &a);
        cache.get_or_upload(&mut uploader, &b);

        assert_eq!(uploader.uploads, 2);
    }

    #[test]
    fn unreadable_file_still_yields_a_placeholder_upload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.png");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "not a png").unwrap();

        let mut cache = TextureCache::new();
        let mut uploader = CountingUploader { uploads: 0 };
        cache.get_or_upload(&mut uploader, &path);
        assert_eq!(uploader.uploads, 1);
    }
}
