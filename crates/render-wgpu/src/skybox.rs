use crate::program::{Program, ProgramSpec};
use crate::shaders;
use glam::{Mat3, Mat4};
use lumen_assets::{AssetDir, DecodedImage};
use wgpu::util::DeviceExt;

/// Cubemap face files in layer order +X, -X, +Y, -Y, +Z, -Z.
const FACE_FILES: [&str; 6] = [
    "right.jpg",
    "left.jpg",
    "top.jpg",
    "bottom.jpg",
    "front.jpg",
    "back.jpg",
];

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

#[rustfmt::skip]
const SKYBOX_VERTICES: [f32; 108] = [
    -1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,   1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,   1.0,  1.0, -1.0,  -1.0,  1.0, -1.0,

    -1.0, -1.0,  1.0,  -1.0, -1.0, -1.0,  -1.0,  1.0, -1.0,
    -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,  -1.0, -1.0,  1.0,

     1.0, -1.0, -1.0,   1.0, -1.0,  1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,   1.0,  1.0, -1.0,   1.0, -1.0, -1.0,

    -1.0, -1.0,  1.0,  -1.0,  1.0,  1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,   1.0, -1.0,  1.0,  -1.0, -1.0,  1.0,

    -1.0,  1.0, -1.0,   1.0,  1.0, -1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,  -1.0,  1.0,  1.0,  -1.0,  1.0, -1.0,

    -1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,
];

/// Enclosing cubemap cube rendered at the far plane.
///
/// The pipeline's depth compare is LessEqual and the vertex stage pins
/// `z = w`, so the box never z-fights the far plane and everything drawn
/// afterwards wins the depth test.
pub struct Skybox {
    program: Program,
    vertex_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Skybox {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        assets: &AssetDir,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let faces = load_faces(assets);
        let size = faces[0].width;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("skybox_cubemap"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, face) in faces.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                &face.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * face.width),
                    rows_per_image: Some(face.height),
                },
                wgpu::Extent3d {
                    width: face.width,
                    height: face.height,
                    depth_or_array_layers: 1,
                },
            );
        }
        let cube_view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("skybox_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox_texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox_bind_group"),
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&cube_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skybox_vertex_buffer"),
            contents: bytemuck::cast_slice(&SKYBOX_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let mut program = Program::new(
            device,
            ProgramSpec {
                label: "skybox",
                layout: shaders::skybox_block_layout(),
                vertex_buffers: vec![wgpu::VertexBufferLayout {
                    array_stride: 12,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &POSITION_ATTRS,
                }],
                extra_bind_group_layouts: vec![texture_layout],
                color_format: Some(color_format),
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: depth_format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
            },
        );
        program.set_vertex_shader_source(device, shaders::SKYBOX_SHADER);
        program.set_fragment_shader_source(device, shaders::SKYBOX_SHADER);

        Self {
            program,
            vertex_buffer,
            bind_group,
        }
    }

    /// Stage this frame's matrices. The view's translation is stripped so
    /// the box stays centered on the camera.
    pub fn prepare(&mut self, queue: &wgpu::Queue, projection: Mat4, view: Mat4) {
        let rotation_only = Mat4::from_mat3(Mat3::from_mat4(view));
        self.program.set_uniform_mat4("project", projection);
        self.program.set_uniform_mat4("view", rotation_only);
        self.program.flush(queue);
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if !self.program.bind(pass) {
            return;
        }
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..36, 0..1);
    }
}

/// Decode the six face files; any failure falls back to a placeholder set
/// so the renderer keeps a valid cubemap.
fn load_faces(assets: &AssetDir) -> [DecodedImage; 6] {
    let mut faces = Vec::with_capacity(6);
    for file in FACE_FILES {
        match DecodedImage::open(assets.resolve(format!("skybox/{file}"))) {
            Ok(image) => faces.push(image),
            Err(err) => {
                tracing::warn!(face = file, "skybox face failed to load: {err}");
                faces.push(DecodedImage::placeholder());
            }
        }
    }
    let consistent = faces
        .iter()
        .all(|f| f.width == faces[0].width && f.height == faces[0].height && f.width == f.height);
    if !consistent {
        tracing::warn!("skybox faces disagree on dimensions, using placeholders");
        faces = (0..6).map(|_| DecodedImage::placeholder()).collect();
    }
    faces.try_into().expect("exactly six faces")
}
