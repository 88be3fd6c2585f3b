use glam::{Mat4, Vec3};
use lumen_assets::AssetDir;
use lumen_render::{BlockLayout, UniformStage};
use lumen_scene::{FlashLight, SpotLight};

/// Fixed pipeline state a [`Program`] links against: everything except the
/// shader stages themselves.
pub struct ProgramSpec {
    pub label: &'static str,
    pub layout: BlockLayout,
    pub vertex_buffers: Vec<wgpu::VertexBufferLayout<'static>>,
    pub extra_bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    pub color_format: Option<wgpu::TextureFormat>,
    pub depth_stencil: Option<wgpu::DepthStencilState>,
    pub primitive: wgpu::PrimitiveState,
}

/// Shader program wrapper: two swappable stages, a re-link per stage set,
/// and typed uniform setters behind a memoized name lookup.
///
/// Failure policy is best-effort: compile and link errors are logged and
/// leave the program unlinked, so `bind` reports false and the caller skips
/// its draws. Nothing here is fatal.
pub struct Program {
    spec: ProgramSpec,
    vertex: Option<wgpu::ShaderModule>,
    fragment: Option<wgpu::ShaderModule>,
    pipeline: Option<wgpu::RenderPipeline>,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    stage: UniformStage,
}

impl Program {
    /// Create an empty program: uniform plumbing is ready, no stages are
    /// attached yet.
    pub fn new(device: &wgpu::Device, spec: ProgramSpec) -> Self {
        use lumen_render::UniformLayout;

        let byte_len = spec.layout.byte_len();
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(spec.label),
            size: byte_len as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(spec.label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(spec.label),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let mut layouts: Vec<&wgpu::BindGroupLayout> = vec![&uniform_layout];
        layouts.extend(spec.extra_bind_group_layouts.iter());
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(spec.label),
            bind_group_layouts: &layouts,
            push_constant_ranges: &[],
        });

        let stage = UniformStage::new(spec.layout.clone());

        Self {
            spec,
            vertex: None,
            fragment: None,
            pipeline: None,
            pipeline_layout,
            uniform_buffer,
            uniform_bind_group,
            stage,
        }
    }

    /// Attach a vertex stage from a source file in the asset directory and
    /// re-link.
    pub fn set_vertex_shader(&mut self, device: &wgpu::Device, assets: &AssetDir, name: &str) {
        match assets.read_to_string(name) {
            Ok(source) => self.set_vertex_shader_source(device, &source),
            Err(err) => {
                tracing::error!(program = self.spec.label, shader = name, "failed to read vertex shader: {err}");
            }
        }
    }

    /// Attach a fragment stage from a source file in the asset directory and
    /// re-link.
    pub fn set_fragment_shader(&mut self, device: &wgpu::Device, assets: &AssetDir, name: &str) {
        match assets.read_to_string(name) {
            Ok(source) => self.set_fragment_shader_source(device, &source),
            Err(err) => {
                tracing::error!(program = self.spec.label, shader = name, "failed to read fragment shader: {err}");
            }
        }
    }

    /// Attach a vertex stage from in-memory WGSL and re-link.
    pub fn set_vertex_shader_source(&mut self, device: &wgpu::Device, source: &str) {
        self.vertex = self.compile(device, "vertex", source);
        self.relink(device);
    }

    /// Attach a fragment stage from in-memory WGSL and re-link.
    pub fn set_fragment_shader_source(&mut self, device: &wgpu::Device, source: &str) {
        self.fragment = self.compile(device, "fragment", source);
        self.relink(device);
    }

    fn compile(&self, device: &wgpu::Device, kind: &str, source: &str) -> Option<wgpu::ShaderModule> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.spec.label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!(
                program = self.spec.label,
                "failed to compile {kind} shader: {err}"
            );
            return None;
        }
        Some(module)
    }

    /// Rebuild the pipeline from the current stages. Runs on every stage
    /// set; with only one stage attached the program stays unlinked.
    fn relink(&mut self, device: &wgpu::Device) {
        self.pipeline = None;
        // The cached name lookups belong to the previous interface.
        self.stage.reset_cache();

        let (Some(vertex), Some(fragment)) = (&self.vertex, &self.fragment) else {
            return;
        };

        let targets = [self.spec.color_format.map(|format| wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(self.spec.label),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: vertex,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &self.spec.vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: fragment,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: if self.spec.color_format.is_some() {
                    &targets
                } else {
                    &[]
                },
            }),
            primitive: self.spec.primitive,
            depth_stencil: self.spec.depth_stencil.clone(),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => {
                tracing::error!(program = self.spec.label, "program link failed: {err}");
            }
            None => {
                tracing::debug!(program = self.spec.label, "program linked");
                self.pipeline = Some(pipeline);
            }
        }
    }

    pub fn is_linked(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Upload the staging block if anything changed since the last flush.
    /// Call before the pass that consumes the uniforms.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if self.stage.take_dirty() {
            queue.write_buffer(&self.uniform_buffer, 0, self.stage.bytes());
        }
    }

    /// Bind the pipeline and uniform bind group; returns false (and binds
    /// nothing) when the program is unlinked so callers skip their draws.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some(pipeline) = &self.pipeline else {
            return false;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        true
    }

    pub fn set_uniform_u32(&mut self, name: &str, value: u32) {
        self.stage.set_u32(name, value);
    }

    pub fn set_uniform_f32(&mut self, name: &str, value: f32) {
        self.stage.set_f32(name, value);
    }

    pub fn set_uniform_vec3(&mut self, name: &str, value: Vec3) {
        self.stage.set_vec3(name, value);
    }

    pub fn set_uniform_mat4(&mut self, name: &str, value: Mat4) {
        self.stage.set_mat4(name, value);
    }

    pub fn set_uniform_spot_lights(&mut self, lights: &[SpotLight]) {
        self.stage.set_spot_lights(lights);
    }

    pub fn set_uniform_flash_lights(&mut self, lights: &[FlashLight]) {
        self.stage.set_flash_lights(lights);
    }
}
