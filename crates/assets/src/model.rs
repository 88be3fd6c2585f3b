use crate::texture::{TextureKind, TextureRef};
use crate::{AssetDir, AssetError};
use glam::{Vec2, Vec3};
use gltf::buffer;
use std::path::{Path, PathBuf};

/// One interleaved mesh vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

/// CPU-side mesh data: immutable vertex/index lists plus typed texture
/// references. GPU upload happens later, in the render backend.
#[derive(Debug, Clone)]
pub struct CpuMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub textures: Vec<TextureRef>,
}

/// An imported model: a position offset and the meshes gathered from the
/// source scene graph.
///
/// Import failure is not fatal: the model is left with zero meshes (drawing
/// it is a no-op) and the importer's error string is logged.
#[derive(Debug, Clone)]
pub struct Model {
    pub position: Vec3,
    meshes: Vec<CpuMesh>,
    load_finished: bool,
}

impl Model {
    /// Import a glTF asset by name relative to the asset directory.
    pub fn load(assets: &AssetDir, relative: impl AsRef<Path>) -> Self {
        let path = assets.resolve(relative.as_ref());
        let meshes = match import_meshes(&path) {
            Ok(meshes) => {
                tracing::info!(
                    path = %path.display(),
                    mesh_count = meshes.len(),
                    "model imported"
                );
                meshes
            }
            Err(err) => {
                tracing::error!(path = %path.display(), "model import failed: {err}");
                Vec::new()
            }
        };
        Self {
            position: Vec3::ZERO,
            meshes,
            load_finished: true,
        }
    }

    pub fn meshes(&self) -> &[CpuMesh] {
        &self.meshes
    }

    /// True once the import attempt has completed; drawing before this is
    /// a no-op.
    pub fn load_finished(&self) -> bool {
        self.load_finished
    }
}

fn import_meshes(path: &Path) -> Result<Vec<CpuMesh>, AssetError> {
    let gltf = gltf::Gltf::open(path).map_err(|err| AssetError::Import(err.to_string()))?;
    let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

    let mut buffers: Vec<Vec<u8>> = Vec::new();
    for buf in gltf.buffers() {
        match buf.source() {
            buffer::Source::Bin => {
                buffers.push(gltf.blob.clone().unwrap_or_default());
            }
            buffer::Source::Uri(uri) => {
                buffers.push(std::fs::read(dir.join(uri))?);
            }
        }
    }

    let mut meshes = Vec::new();
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| AssetError::Import("no scene in document".into()))?;
    for node in scene.nodes() {
        collect_node(&node, &buffers, &dir, &mut meshes);
    }
    Ok(meshes)
}

/// Depth-first node walk, accumulating meshes in node order.
fn collect_node(node: &gltf::Node, buffers: &[Vec<u8>], dir: &Path, out: &mut Vec<CpuMesh>) {
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            out.push(read_primitive(&primitive, buffers, dir));
        }
    }
    for child in node.children() {
        collect_node(&child, buffers, dir, out);
    }
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[Vec<u8>], dir: &Path) -> CpuMesh {
    let reader = primitive.reader(|buf| buffers.get(buf.index()).map(Vec::as_slice));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .map(Iterator::collect)
        .unwrap_or_default();
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(Iterator::collect)
        .unwrap_or_default();
    let tex_coords: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_default();

    let vertices = (0..positions.len())
        .map(|i| Vertex {
            position: Vec3::from(positions[i]),
            normal: normals.get(i).copied().map(Vec3::from).unwrap_or(Vec3::Y),
            // The V coordinate is flipped on import so image origin matches
            // the sampler convention used by the shaders.
            tex_coords: tex_coords
                .get(i)
                .map(|t| Vec2::new(t[0], 1.0 - t[1]))
                .unwrap_or(Vec2::ZERO),
        })
        .collect();

    let indices = reader
        .read_indices()
        .map(|idx| idx.into_u32().collect())
        .unwrap_or_default();

    CpuMesh {
        vertices,
        indices,
        textures: material_textures(&primitive.material(), dir),
    }
}

/// Scan the fixed texture-slot list for a material and collect file-backed
/// references. Slots glTF does not carry stay empty.
fn material_textures(material: &gltf::Material, dir: &Path) -> Vec<TextureRef> {
    let mut refs = Vec::new();
    for kind in TextureKind::ALL {
        let texture = match kind {
            TextureKind::Diffuse => material
                .pbr_metallic_roughness()
                .base_color_texture()
                .map(|info| info.texture()),
            TextureKind::Specular => material
                .pbr_metallic_roughness()
                .metallic_roughness_texture()
                .map(|info| info.texture()),
            TextureKind::Emissive => material.emissive_texture().map(|info| info.texture()),
            TextureKind::Normals => material.normal_texture().map(|info| info.texture()),
            TextureKind::Height | TextureKind::Shininess | TextureKind::Opacity => None,
        };
        if let Some(texture) = texture {
            if let gltf::image::Source::Uri { uri, .. } = texture.source().source() {
                refs.push(TextureRef {
                    kind,
                    path: normalize(dir.join(uri)),
                });
            }
        }
    }
    refs
}

/// Paths key the texture de-duplication cache, so the same file reached via
/// different relative spellings must resolve identically.
fn normalize(path: PathBuf) -> PathBuf {
    path.components().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_leaves_model_empty_and_finished() {
        let assets = AssetDir::new("/nonexistent");
        let model = Model::load(&assets, "pool-ball/pool-ball.gltf");
        assert!(model.meshes().is_empty());
        assert!(model.load_finished());
    }

    #[test]
    fn malformed_document_degrades_to_zero_meshes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.gltf");
        std::fs::write(&path, "{not json").unwrap();

        let assets = AssetDir::new(tmp.path());
        let model = Model::load(&assets, "broken.gltf");
        assert!(model.meshes().is_empty());
        assert!(model.load_finished());
    }

    #[test]
    fn empty_scene_imports_with_no_meshes() {
        let tmp = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(tmp.path().join("empty.gltf")).unwrap();
        write!(
            file,
            r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[]}}]}}"#
        )
        .unwrap();

        let assets = AssetDir::new(tmp.path());
        let model = Model::load(&assets, "empty.gltf");
        assert!(model.meshes().is_empty());
        assert!(model.load_finished());
    }

    #[test]
    fn model_starts_at_origin() {
        let assets = AssetDir::new("/nonexistent");
        let model = Model::load(&assets, "whatever.gltf");
        assert_eq!(model.position, Vec3::ZERO);
    }
}
