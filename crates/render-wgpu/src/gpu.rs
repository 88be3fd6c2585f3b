use crate::mesh::{self, GpuModel};
use crate::program::{Program, ProgramSpec};
use crate::shaders;
use crate::shadow::ShadowCubemap;
use crate::skybox::Skybox;
use crate::texture::{self, TextureUploader, WgpuUploader};
use glam::{Mat4, Vec3};
use lumen_assets::{AssetDir, DecodedImage};
use lumen_scene::{Camera, FlashLight, PbrMaterial, PointLight, SpotLight};
use std::collections::BTreeMap;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;
const SHADOW_FAR_PLANE: f32 = 100.0;
const GIZMO_SCALE: f32 = 0.05;

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

/// Everything the renderer reads for one frame. The renderer never mutates
/// scene state.
pub struct FrameState<'a> {
    pub projection: Mat4,
    pub camera: &'a Camera,
    pub point_light: &'a PointLight,
    pub flash_lights: &'a [FlashLight],
    pub spot_lights: &'a [SpotLight],
    pub material: &'a PbrMaterial,
    pub draw_skybox: bool,
    pub draw_model: bool,
    pub shadows_enabled: bool,
}

/// Unit cube, positions only, for the light gizmo.
fn cube_mesh() -> (Vec<[f32; 3]>, Vec<u16>) {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let vertices = vec![
        [-p, -p,  p], [ p, -p,  p], [ p,  p,  p], [-p,  p,  p],
        [ p, -p, -p], [-p, -p, -p], [-p,  p, -p], [ p,  p, -p],
    ];
    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0,1,2, 2,3,0,       // +Z
        4,5,6, 6,7,4,       // -Z
        1,4,7, 7,2,1,       // +X
        5,0,3, 3,6,5,       // -X
        3,2,7, 7,6,3,       // +Y
        5,4,1, 1,0,5,       // -Y
    ];
    (vertices, indices)
}

/// Scene renderer: owns the programs, the skybox and shadow resources, and
/// the depth-stencil target, and sequences the per-frame passes.
///
/// Pass order is fixed: shadow depth pre-pass (when enabled) → clear →
/// skybox (LessEqual) → model with stencil mark → light gizmo.
pub struct SceneRenderer {
    programs: BTreeMap<String, Program>,
    skybox: Skybox,
    shadow: ShadowCubemap,
    shadow_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    material_sampler: wgpu::Sampler,
    placeholder: wgpu::TextureView,
    gizmo_vertex_buffer: wgpu::Buffer,
    gizmo_index_buffer: wgpu::Buffer,
    gizmo_index_count: u32,
    depth_view: wgpu::TextureView,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        assets: &AssetDir,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let material_layout = mesh::material_bind_group_layout(device);
        let material_sampler = texture::material_sampler(device);
        let placeholder =
            WgpuUploader { device, queue }.upload(&DecodedImage::placeholder(), "placeholder");

        let shadow = ShadowCubemap::new(device, SHADOW_FAR_PLANE);
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_map_layout"),
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
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_map_bind_group"),
            layout: &shadow_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(shadow.shadow_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(shadow.shadow_sampler()),
                },
            ],
        });

        let mut programs = BTreeMap::new();

        // Cook-Torrance pass: stencil marks covered pixels for reuse by
        // outline-style follow-up passes.
        let stencil_face = wgpu::StencilFaceState {
            compare: wgpu::CompareFunction::Always,
            fail_op: wgpu::StencilOperation::Keep,
            depth_fail_op: wgpu::StencilOperation::Keep,
            pass_op: wgpu::StencilOperation::Replace,
        };
        let mut pbr = Program::new(
            device,
            ProgramSpec {
                label: "cook-torrance",
                layout: shaders::pbr_block_layout(),
                vertex_buffers: vec![mesh::mesh_vertex_layout()],
                extra_bind_group_layouts: vec![material_layout.clone(), shadow_layout],
                color_format: Some(surface_format),
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState {
                        front: stencil_face,
                        back: stencil_face,
                        read_mask: 0xFF,
                        write_mask: 0xFF,
                    },
                    bias: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
            },
        );
        // Prefer the on-disk shader sources; fall back to the built-ins so a
        // stripped asset directory still renders.
        pbr.set_vertex_shader(device, assets, "shaders/cook-torrance.wgsl");
        pbr.set_fragment_shader(device, assets, "shaders/cook-torrance.wgsl");
        if !pbr.is_linked() {
            tracing::info!("using built-in cook-torrance shader");
            pbr.set_vertex_shader_source(device, shaders::PBR_SHADER);
            pbr.set_fragment_shader_source(device, shaders::PBR_SHADER);
        }
        programs.insert("cook-torrance".to_string(), pbr);

        let mut gizmo = Program::new(
            device,
            ProgramSpec {
                label: "light",
                layout: shaders::gizmo_block_layout(),
                vertex_buffers: vec![wgpu::VertexBufferLayout {
                    array_stride: 12,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &POSITION_ATTRS,
                }],
                extra_bind_group_layouts: Vec::new(),
                color_format: Some(surface_format),
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
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
        gizmo.set_vertex_shader_source(device, shaders::GIZMO_SHADER);
        gizmo.set_fragment_shader_source(device, shaders::GIZMO_SHADER);
        programs.insert("light".to_string(), gizmo);

        let skybox = Skybox::new(device, queue, assets, surface_format, DEPTH_FORMAT);

        let (cube_vertices, cube_indices) = cube_mesh();
        let gizmo_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gizmo_vertex_buffer"),
            contents: bytemuck::cast_slice(&cube_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let gizmo_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gizmo_index_buffer"),
            contents: bytemuck::cast_slice(&cube_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            programs,
            skybox,
            shadow,
            shadow_bind_group,
            material_layout,
            material_sampler,
            placeholder,
            gizmo_vertex_buffer,
            gizmo_index_buffer,
            gizmo_index_count: cube_indices.len() as u32,
            depth_view: Self::create_depth_target(device, width, height),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_view = Self::create_depth_target(device, width, height);
    }

    /// Render one frame into `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        model: &mut GpuModel,
        frame: &FrameState<'_>,
    ) {
        // Lazy GPU upload on first use, render thread only.
        model.init(
            device,
            queue,
            &self.material_layout,
            &self.material_sampler,
            &self.placeholder,
        );

        let view = frame.camera.view();
        let model_matrix = Mat4::from_translation(model.position);

        if frame.shadows_enabled && frame.point_light.on {
            self.shadow.render(
                device,
                queue,
                frame.point_light.position,
                model,
                model_matrix,
            );
        }

        if let Some(program) = self.programs.get_mut("cook-torrance") {
            program.set_uniform_mat4("project", frame.projection);
            program.set_uniform_mat4("view", view);
            program.set_uniform_mat4("model", model_matrix);
            program.set_uniform_vec3("pointLight.position", frame.point_light.position);
            program.set_uniform_vec3("pointLight.color", frame.point_light.color);
            program.set_uniform_f32("pointLight.intensity", frame.point_light.intensity);
            program.set_uniform_u32("pointLight.on", frame.point_light.on as u32);
            program.set_uniform_f32("far_plane", self.shadow.far_plane());
            program.set_uniform_vec3("viewPos", frame.camera.position());
            program.set_uniform_vec3("albedo", frame.material.albedo);
            program.set_uniform_f32("metallic", frame.material.metallic);
            program.set_uniform_f32("roughness", frame.material.roughness);
            program.set_uniform_f32("ao", frame.material.ao);
            program.set_uniform_u32("shadows_enabled", frame.shadows_enabled as u32);
            program.set_uniform_flash_lights(frame.flash_lights);
            program.set_uniform_spot_lights(frame.spot_lights);
            program.flush(queue);
        }

        if let Some(program) = self.programs.get_mut("light") {
            let gizmo_matrix = Mat4::from_translation(frame.point_light.position)
                * Mat4::from_scale(Vec3::splat(GIZMO_SCALE));
            program.set_uniform_mat4("project", frame.projection);
            program.set_uniform_mat4("view", view);
            program.set_uniform_mat4("model", gizmo_matrix);
            program.set_uniform_vec3(
                "lightColor",
                frame.point_light.color * frame.point_light.intensity,
            );
            program.flush(queue);
        }

        self.skybox.prepare(queue, frame.projection, view);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.5,
                            g: 0.5,
                            b: 0.5,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                ..Default::default()
            });

            // Skybox first, at the far plane.
            if frame.draw_skybox {
                self.skybox.draw(&mut pass);
            }

            // Opaque geometry with stencil marking covered pixels.
            if frame.draw_model {
                if let Some(program) = self.programs.get_mut("cook-torrance") {
                    pass.set_stencil_reference(1);
                    if program.bind(&mut pass) {
                        pass.set_bind_group(2, &self.shadow_bind_group, &[]);
                        model.draw(&mut pass, program);
                    }
                }
            }

            // Light gizmo, skipped when the light is off.
            if frame.point_light.on {
                if let Some(program) = self.programs.get_mut("light") {
                    if program.bind(&mut pass) {
                        pass.set_vertex_buffer(0, self.gizmo_vertex_buffer.slice(..));
                        pass.set_index_buffer(
                            self.gizmo_index_buffer.slice(..),
                            wgpu::IndexFormat::Uint16,
                        );
                        pass.draw_indexed(0..self.gizmo_index_count, 0, 0..1);
                    }
                }
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_target(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("scene_depth_stencil"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gizmo_cube_is_a_closed_index_list() {
        let (vertices, indices) = cube_mesh();
        assert_eq!(vertices.len(), 8);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }
}
