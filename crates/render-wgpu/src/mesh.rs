use crate::program::Program;
use crate::texture::{TextureCache, TextureUploader, WgpuUploader};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use lumen_assets::{CpuMesh, Model, TextureKind, TextureRef};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

const MESH_ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
];

// Position-only consumers (shadow depth pass) reuse the same buffer with a
// truncated attribute list.
const MESH_POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![
    0 => Float32x3,
];

pub fn mesh_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &MESH_ATTRS,
    }
}

pub fn mesh_position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &MESH_POSITION_ATTRS,
    }
}

/// Compose the sampler uniform names for a mesh's texture list:
/// `material.{kind}{n}` with `n` restarting at 1 per texture kind and
/// incrementing per occurrence, so multiple maps of one kind get distinct
/// names. The composed names are shader ABI.
pub fn sampler_uniform_names(textures: &[TextureRef]) -> Vec<String> {
    let mut counts: HashMap<TextureKind, u32> = HashMap::new();
    textures
        .iter()
        .map(|texture| {
            let count = counts.entry(texture.kind).or_insert(0);
            *count += 1;
            format!("material.{}{}", texture.kind.uniform_fragment(), count)
        })
        .collect()
}

/// Bind group layout for the per-mesh material textures: one slot per
/// primary map kind plus the shared sampler.
pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("material_bind_group_layout"),
        entries: &[
            texture_entry(0),
            texture_entry(1),
            texture_entry(2),
            texture_entry(3),
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// GPU-side mesh with an explicit two-phase lifecycle: constructed (CPU data
/// only) → initialized (buffers and textures uploaded). `draw` before
/// `init` is a no-op.
pub struct GpuMesh {
    cpu: CpuMesh,
    sampler_names: Vec<String>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
    material_bind_group: Option<wgpu::BindGroup>,
    initialized: bool,
}

impl GpuMesh {
    pub fn new(cpu: CpuMesh) -> Self {
        let sampler_names = sampler_uniform_names(&cpu.textures);
        Self {
            cpu,
            sampler_names,
            vertex_buffer: None,
            index_buffer: None,
            index_count: 0,
            material_bind_group: None,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Upload vertex/index buffers and resolve textures through the
    /// model-wide cache.
    pub fn init(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        cache: &mut TextureCache<wgpu::TextureView>,
        material_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        placeholder: &wgpu::TextureView,
    ) {
        if self.initialized {
            return;
        }

        let vertices: Vec<MeshVertex> = self
            .cpu
            .vertices
            .iter()
            .map(|v| MeshVertex {
                position: v.position.to_array(),
                normal: v.normal.to_array(),
                tex_coords: v.tex_coords.to_array(),
            })
            .collect();

        // Zero-sized buffers are invalid; an empty mesh stays drawless.
        if !vertices.is_empty() && !self.cpu.indices.is_empty() {
            self.vertex_buffer = Some(device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_vertex_buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                },
            ));
            self.index_buffer = Some(device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_index_buffer"),
                    contents: bytemuck::cast_slice(&self.cpu.indices),
                    usage: wgpu::BufferUsages::INDEX,
                },
            ));
            self.index_count = self.cpu.indices.len() as u32;
        }

        let mut uploader = WgpuUploader { device, queue };
        let mut slots: HashMap<TextureKind, wgpu::TextureView> = HashMap::new();
        for texture in &self.cpu.textures {
            let view = cache.get_or_upload(&mut uploader, &texture.path);
            // First map of each kind fills the fixed slot; extras keep their
            // composed uniform names but have no binding of their own.
            slots.entry(texture.kind).or_insert(view);
        }

        let slot = |kind: TextureKind| slots.get(&kind).unwrap_or(placeholder);
        self.material_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout: material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(slot(TextureKind::Diffuse)),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(slot(TextureKind::Specular)),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(slot(TextureKind::Normals)),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(slot(TextureKind::Emissive)),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }));

        self.initialized = true;
    }

    /// Draw with full material state: sets the composed sampler uniforms on
    /// the program (absent names no-op by design), binds the material group
    /// and issues one indexed draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, program: &mut Program) {
        if !self.initialized {
            return;
        }
        for (unit, name) in self.sampler_names.iter().enumerate() {
            program.set_uniform_u32(name, unit as u32);
        }
        if let Some(bind_group) = &self.material_bind_group {
            pass.set_bind_group(1, bind_group, &[]);
        }
        self.draw_geometry(pass);
    }

    /// Geometry-only draw for depth passes: no material state.
    pub fn draw_geometry(&self, pass: &mut wgpu::RenderPass<'_>) {
        if !self.initialized {
            return;
        }
        let (Some(vertex_buffer), Some(index_buffer)) = (&self.vertex_buffer, &self.index_buffer)
        else {
            return;
        };
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    pub fn sampler_names(&self) -> &[String] {
        &self.sampler_names
    }
}

/// GPU-side model: the imported meshes plus the model-wide texture
/// de-duplication cache.
pub struct GpuModel {
    pub position: Vec3,
    meshes: Vec<GpuMesh>,
    cache: TextureCache<wgpu::TextureView>,
    load_finished: bool,
    initialized: bool,
}

impl GpuModel {
    pub fn from_model(model: &Model) -> Self {
        Self {
            position: model.position,
            meshes: model.meshes().iter().cloned().map(GpuMesh::new).collect(),
            cache: TextureCache::new(),
            load_finished: model.load_finished(),
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Upload every mesh. Runs once; the renderer calls this lazily on the
    /// first frame that draws the model.
    pub fn init(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        placeholder: &wgpu::TextureView,
    ) {
        if self.initialized {
            return;
        }
        for mesh in &mut self.meshes {
            mesh.init(device, queue, &mut self.cache, material_layout, sampler, placeholder);
        }
        self.initialized = true;
        tracing::debug!(
            meshes = self.meshes.len(),
            textures = self.cache.uploaded_count(),
            "model uploaded"
        );
    }

    /// Draw all meshes; a no-op until the import finished and `init` ran.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, program: &mut Program) {
        if !self.load_finished {
            return;
        }
        for mesh in &self.meshes {
            mesh.draw(pass, program);
        }
    }

    pub fn draw_geometry(&self, pass: &mut wgpu::RenderPass<'_>) {
        if !self.load_finished {
            return;
        }
        for mesh in &self.meshes {
            mesh.draw_geometry(pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn texture(kind: TextureKind, path: &str) -> TextureRef {
        TextureRef {
            kind,
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn sampler_names_restart_per_kind() {
        let names = sampler_uniform_names(&[
            texture(TextureKind::Diffuse, "a.png"),
            texture(TextureKind::Diffuse, "b.png"),
            texture(TextureKind::Specular, "c.png"),
            texture(TextureKind::Diffuse, "d.png"),
            texture(TextureKind::Normals, "e.png"),
        ]);
        assert_eq!(
            names,
            vec![
                "material.diffuse1",
                "material.diffuse2",
                "material.specular1",
                "material.diffuse3",
                "material.normals1",
            ]
        );
    }

    #[test]
    fn sampler_names_empty_for_untextured_mesh() {
        assert!(sampler_uniform_names(&[]).is_empty());
    }

    #[test]
    fn gpu_mesh_starts_uninitialized() {
        let mesh = GpuMesh::new(CpuMesh {
            vertices: Vec::new(),
            indices: Vec::new(),
            textures: vec![texture(TextureKind::Diffuse, "a.png")],
        });
        assert!(!mesh.is_initialized());
        assert_eq!(mesh.sampler_names(), ["material.diffuse1"]);
    }
}
