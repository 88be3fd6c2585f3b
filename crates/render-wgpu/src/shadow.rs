use crate::mesh::{mesh_position_layout, GpuModel};
use crate::program::{Program, ProgramSpec};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

pub const SHADOW_MAP_SIZE: u32 = 1024;
const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [-1.0, -1.0], uv: [0.0, 0.0] },
    QuadVertex { position: [1.0, -1.0], uv: [1.0, 0.0] },
    QuadVertex { position: [-1.0, 1.0], uv: [0.0, 1.0] },
    QuadVertex { position: [1.0, 1.0], uv: [1.0, 1.0] },
];

const QUAD_ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32x2,
];

/// The six cubemap face view directions, in layer order +X, -X, +Y, -Y,
/// +Z, -Z. The up vectors follow the cubemap face orientation convention;
/// getting one wrong flips that face's shadows.
fn face_views(light_pos: Vec3) -> [Mat4; 6] {
    [
        Mat4::look_at_rh(light_pos, light_pos + Vec3::X, Vec3::NEG_Y),
        Mat4::look_at_rh(light_pos, light_pos - Vec3::X, Vec3::NEG_Y),
        Mat4::look_at_rh(light_pos, light_pos + Vec3::Y, Vec3::Z),
        Mat4::look_at_rh(light_pos, light_pos - Vec3::Y, Vec3::NEG_Z),
        Mat4::look_at_rh(light_pos, light_pos + Vec3::Z, Vec3::NEG_Y),
        Mat4::look_at_rh(light_pos, light_pos - Vec3::Z, Vec3::NEG_Y),
    ]
}

/// Omnidirectional shadow map for one point light.
///
/// Two depth cubemaps ping/pong: the depth pass renders normalized light
/// distance into `ping` face by face, then a separable blur copies
/// `ping` into `pong` through a fullscreen quad. The main pass samples the
/// blurred `pong` cubemap.
pub struct ShadowCubemap {
    far_plane: f32,
    ping_face_views: Vec<wgpu::TextureView>,
    pong_face_views: Vec<wgpu::TextureView>,
    pong_cube_view: wgpu::TextureView,
    depth_program: Program,
    blur_program: Program,
    blur_bind_group: wgpu::BindGroup,
    quad_vertex_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
}

impl ShadowCubemap {
    pub fn new(device: &wgpu::Device, far_plane: f32) -> Self {
        let make_cubemap = |label| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: SHADOW_MAP_SIZE,
                    height: SHADOW_MAP_SIZE,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: SHADOW_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };
        let ping = make_cubemap("shadow_ping");
        let pong = make_cubemap("shadow_pong");

        let face_view = |texture: &wgpu::Texture, layer| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_array_layer: layer,
                array_layer_count: Some(1),
                ..Default::default()
            })
        };
        let ping_face_views = (0..6).map(|i| face_view(&ping, i)).collect();
        let pong_face_views = (0..6).map(|i| face_view(&pong, i)).collect();
        let cube_view = |texture: &wgpu::Texture| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                dimension: Some(wgpu::TextureViewDimension::Cube),
                ..Default::default()
            })
        };
        let ping_cube_view = cube_view(&ping);
        let pong_cube_view = cube_view(&pong);

        // Depth sampling without comparison requires a non-filtering sampler.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let mut depth_program = Program::new(
            device,
            ProgramSpec {
                label: "shadow",
                layout: shaders::shadow_block_layout(),
                vertex_buffers: vec![mesh_position_layout()],
                extra_bind_group_layouts: Vec::new(),
                color_format: None,
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: SHADOW_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
            },
        );
        depth_program.set_vertex_shader_source(device, shaders::SHADOW_DEPTH_SHADER);
        depth_program.set_fragment_shader_source(device, shaders::SHADOW_DEPTH_SHADER);

        let source_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_blur_source_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });
        let blur_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_blur_bind_group"),
            layout: &source_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&ping_cube_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let mut blur_program = Program::new(
            device,
            ProgramSpec {
                label: "blurshadow",
                layout: shaders::blur_block_layout(),
                vertex_buffers: vec![wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &QUAD_ATTRS,
                }],
                extra_bind_group_layouts: vec![source_layout],
                color_format: None,
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: SHADOW_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Always,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    ..Default::default()
                },
            },
        );
        blur_program.set_vertex_shader_source(device, shaders::SHADOW_BLUR_SHADER);
        blur_program.set_fragment_shader_source(device, shaders::SHADOW_BLUR_SHADER);

        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shadow_blur_quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            far_plane,
            ping_face_views,
            pong_face_views,
            pong_cube_view,
            depth_program,
            blur_program,
            blur_bind_group,
            quad_vertex_buffer,
            sampler,
        }
    }

    pub fn far_plane(&self) -> f32 {
        self.far_plane
    }

    /// The blurred cubemap sampled by the main pass.
    pub fn shadow_view(&self) -> &wgpu::TextureView {
        &self.pong_cube_view
    }

    pub fn shadow_sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Render the depth cubemap for `light_pos` and blur it.
    ///
    /// Each face is submitted separately: the uniform buffer is rewritten
    /// between faces and queued writes land before the next submission.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        light_pos: Vec3,
        model: &GpuModel,
        model_matrix: Mat4,
    ) {
        let projection =
            Mat4::perspective_rh(90.0_f32.to_radians(), 1.0, 1.0, self.far_plane);

        for (face, view) in face_views(light_pos).iter().enumerate() {
            self.depth_program.set_uniform_mat4("model", model_matrix);
            self.depth_program
                .set_uniform_mat4("shadow_matrix", projection * *view);
            self.depth_program.set_uniform_vec3("lightPos", light_pos);
            self.depth_program.set_uniform_f32("far_plane", self.far_plane);
            self.depth_program.flush(queue);

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("shadow_depth_encoder"),
            });
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("shadow_depth_pass"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.ping_face_views[face],
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    ..Default::default()
                });
                if self.depth_program.bind(&mut pass) {
                    model.draw_geometry(&mut pass);
                }
            }
            queue.submit(std::iter::once(encoder.finish()));
        }

        self.blur(device, queue);
    }

    fn blur(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        for face in 0..6u32 {
            self.blur_program.set_uniform_u32("face_index", face);
            self.blur_program
                .set_uniform_f32("texel", 1.0 / SHADOW_MAP_SIZE as f32);
            self.blur_program.flush(queue);

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("shadow_blur_encoder"),
            });
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("shadow_blur_pass"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.pong_face_views[face as usize],
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    ..Default::default()
                });
                if self.blur_program.bind(&mut pass) {
                    pass.set_bind_group(1, &self.blur_bind_group, &[]);
                    pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
                    pass.draw(0..4, 0..1);
                }
            }
            queue.submit(std::iter::once(encoder.finish()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_views_look_along_each_axis() {
        let views = face_views(Vec3::ZERO);
        // A point on +X should land in front of the +X face camera
        // (negative view-space Z).
        let p = views[0].transform_point3(Vec3::new(5.0, 0.0, 0.0));
        assert!(p.z < 0.0);
        let q = views[3].transform_point3(Vec3::new(0.0, -5.0, 0.0));
        assert!(q.z < 0.0);
    }

    #[test]
    fn quad_covers_clip_space() {
        assert_eq!(QUAD_VERTICES[0].position, [-1.0, -1.0]);
        assert_eq!(QUAD_VERTICES[3].position, [1.0, 1.0]);
    }
}
